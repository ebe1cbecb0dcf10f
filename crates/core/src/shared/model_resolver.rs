use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::constants::APP_DIR_NAME;

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("failed to create cache directory: {0}")]
    CacheDir(#[source] std::io::Error),
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to write model to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not determine cache directory")]
    NoCacheDir,
}

/// Progress callback: `(bytes_downloaded, total_bytes)`.
/// `total_bytes` is 0 if the server didn't provide Content-Length.
pub type ProgressFn = Box<dyn Fn(u64, u64) + Send>;

/// Resolve a speech model by name.
///
/// Resolution order: an explicit local directory, the user cache, then a
/// download into the cache.
pub fn resolve(
    name: &str,
    url: &str,
    local_dir: Option<&Path>,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    if let Some(path) = local_dir.and_then(|dir| find_in(dir, name)) {
        return Ok(path);
    }

    let cache_dir = model_cache_dir()?;
    if let Some(path) = find_in(&cache_dir, name) {
        return Ok(path);
    }

    log::info!("Downloading {name} into {}", cache_dir.display());
    fs::create_dir_all(&cache_dir).map_err(ModelResolveError::CacheDir)?;
    let dest = cache_dir.join(name);
    download(url, &dest, progress)?;
    Ok(dest)
}

fn find_in(dir: &Path, name: &str) -> Option<PathBuf> {
    let candidate = dir.join(name);
    candidate.is_file().then_some(candidate)
}

/// Platform cache directory for downloaded models, e.g. `~/.cache/Fluency/models/`.
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    dirs::cache_dir()
        .map(|d| d.join(APP_DIR_NAME).join("models"))
        .ok_or(ModelResolveError::NoCacheDir)
}

fn download(url: &str, dest: &Path, progress: Option<ProgressFn>) -> Result<(), ModelResolveError> {
    let download_err = |source| ModelResolveError::Download {
        url: url.to_string(),
        source,
    };

    let response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(download_err)?;
    let total = response.content_length().unwrap_or(0);
    let bytes = response.bytes().map_err(download_err)?;

    // Written beside the destination and renamed so a partial model is never picked up.
    let temp_path = dest.with_extension("part");
    let write_err = |source| ModelResolveError::Write {
        path: temp_path.clone(),
        source,
    };
    let mut file = fs::File::create(&temp_path).map_err(write_err)?;

    let mut downloaded: u64 = 0;
    for chunk in bytes.chunks(1024 * 1024) {
        file.write_all(chunk).map_err(write_err)?;
        downloaded += chunk.len() as u64;
        if let Some(ref cb) = progress {
            cb(downloaded, total);
        }
    }
    file.flush().map_err(write_err)?;
    drop(file);

    fs::rename(&temp_path, dest).map_err(|source| ModelResolveError::Write {
        path: dest.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_prefers_local_dir() {
        let tmp = TempDir::new().unwrap();
        let model = tmp.path().join("ggml-test.bin");
        fs::write(&model, b"fake model").unwrap();

        let resolved = resolve(
            "ggml-test.bin",
            "http://invalid.nonexistent.example.com/model",
            Some(tmp.path()),
            None,
        )
        .unwrap();
        assert_eq!(resolved, model);
    }

    #[test]
    fn test_find_in_ignores_directories() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("model.bin")).unwrap();
        assert!(find_in(tmp.path(), "model.bin").is_none());
    }

    #[test]
    fn test_model_cache_dir_returns_path() {
        let path = model_cache_dir().unwrap();
        assert!(path.to_string_lossy().contains(APP_DIR_NAME));
        assert!(path.ends_with("models"));
    }

    #[test]
    fn test_download_invalid_url_leaves_no_partial_file() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("model.bin");
        let result = download("http://invalid.nonexistent.example.com/model", &dest, None);
        assert!(result.is_err());
        assert!(!dest.exists());
        assert!(!dest.with_extension("part").exists());
    }
}
