use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};

use fluency_core::alignment::domain::discrepancy::TextComparison;
use fluency_core::audio::domain::pitch_shifter::PitchShifter;
use fluency_core::audio::domain::speech_recognizer::SpeechRecognizer;
use fluency_core::audio::infrastructure::soundstretch_pitch_shifter::SoundstretchPitchShifter;
use fluency_core::audio::infrastructure::wav_audio_reader::WavAudioReader;
use fluency_core::audio::infrastructure::wav_audio_writer::WavAudioWriter;
use fluency_core::audio::infrastructure::whisper_recognizer::WhisperRecognizer;
use fluency_core::feedback::infrastructure::cpal_audio_device::CpalAudioDevice;
use fluency_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use fluency_core::pipeline::practice_session::PracticeSession;
use fluency_core::shared::model_resolver;
use fluency_core::shared::settings::Settings;

/// Speech practice with delayed and frequency-shifted auditory feedback.
#[derive(Parser)]
#[command(name = "fluency")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    overrides: Overrides,
}

/// Overrides for the saved settings. Apply to every subcommand.
#[derive(Args)]
struct Overrides {
    /// Feedback delay in milliseconds.
    #[arg(long, global = true)]
    delay_ms: Option<f64>,

    /// Pitch shift for frequency-shifted feedback, in semitones.
    #[arg(long, global = true, allow_negative_numbers = true)]
    fsf_semitones: Option<f64>,

    /// Length of each recorded attempt in seconds.
    #[arg(long, global = true)]
    record_seconds: Option<f64>,

    /// Directory where attempt recordings are written.
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// Whisper ggml model file name (e.g. ggml-base.en.bin).
    #[arg(long, global = true)]
    model: Option<String>,

    /// Look for the model here before the cache.
    #[arg(long, global = true)]
    model_dir: Option<PathBuf>,

    /// Transcription language hint.
    #[arg(long, global = true)]
    language: Option<String>,

    /// Persist the effective settings as the new defaults.
    #[arg(long, global = true)]
    save_settings: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive practice: record, transcribe, compare, retry with feedback.
    Practice {
        /// Sentence to read aloud (prompted for if omitted).
        #[arg(long)]
        reference: Option<String>,
    },
    /// Live delayed auditory feedback until Ctrl+C.
    Monitor,
    /// Pitch-shift a WAV file.
    Shift {
        input: PathBuf,
        output: PathBuf,
        #[arg(allow_negative_numbers = true)]
        semitones: f64,
    },
    /// Compare two sentences word by word, without audio.
    Compare { reference: String, spoken: String },
}

/// Session prompts ("Speak now!") are logged at info, so info shows unless
/// `RUST_LOG` says otherwise.
const DEFAULT_LOG_FILTER: &str = "info";

fn main() {
    logger_builder(env_logger::Env::default()).init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn logger_builder(env: env_logger::Env<'_>) -> env_logger::Builder {
    env_logger::Builder::from_env(env.default_filter_or(DEFAULT_LOG_FILTER))
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let settings = apply_overrides(Settings::load(), &cli.overrides);
    settings.validate()?;

    if cli.overrides.save_settings {
        let path = settings.save()?;
        log::info!("Settings saved to {}", path.display());
    }

    match cli.command {
        Command::Practice { reference } => {
            run_practice(settings, reference, cli.overrides.model_dir.as_deref())
        }
        Command::Monitor => run_monitor(settings),
        Command::Shift {
            input,
            output,
            semitones,
        } => run_shift(&settings, &input, &output, semitones),
        Command::Compare { reference, spoken } => run_compare(&reference, &spoken),
    }
}

fn apply_overrides(mut settings: Settings, overrides: &Overrides) -> Settings {
    if let Some(ms) = overrides.delay_ms {
        settings.daf_delay_ms = ms;
    }
    if let Some(semitones) = overrides.fsf_semitones {
        settings.fsf_semitones = semitones;
    }
    if let Some(seconds) = overrides.record_seconds {
        settings.record_seconds = seconds;
    }
    if let Some(dir) = &overrides.output_dir {
        settings.output_dir = dir.clone();
    }
    if let Some(model) = &overrides.model {
        settings.whisper_model = model.clone();
    }
    if let Some(language) = &overrides.language {
        settings.language = language.clone();
    }
    settings
}

fn run_practice(
    settings: Settings,
    reference: Option<String>,
    model_dir: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let reference = match reference {
        Some(r) => r,
        None => prompt("Enter the sentence you want to practice: ")?,
    };
    if reference.trim().is_empty() {
        return Err("Reference sentence is empty".into());
    }

    let recognizer = build_recognizer(&settings, model_dir)?;
    let mut session = build_session(settings, Some(recognizer))?;

    let mut attempt = 1;
    loop {
        println!("\n--- Attempt {attempt} ---");
        println!("Please read aloud: \"{reference}\"");
        let recording = session.record_attempt(attempt)?;

        println!("Playing back your recording...");
        session.play_recording(&recording)?;

        let spoken = session.transcribe(&recording)?;
        println!("You said: {spoken}");
        let comparison = session.compare(&reference, &spoken)?;
        print_comparison(&comparison);

        if round_outcome(&comparison) == RoundOutcome::Perfect {
            break;
        }

        let mode = prompt("Choose feedback mode (daf / fsf / skip): ")?.to_lowercase();
        let feedback = match mode.as_str() {
            "daf" => Some(session.record_with_daf(attempt)),
            "fsf" => Some(session.pitch_shift_feedback(attempt)),
            _ => {
                println!("Skipping feedback.");
                None
            }
        };
        match feedback {
            Some(Ok(path)) => {
                let spoken = session.transcribe(&path)?;
                println!("With feedback you said: {spoken}");
                print_comparison(&session.compare(&reference, &spoken)?);
            }
            Some(Err(e)) => eprintln!("Feedback round failed: {e}"),
            None => {}
        }

        if !prompt("Try again? (y/n): ")?.eq_ignore_ascii_case("y") {
            break;
        }
        attempt += 1;
    }

    session.finish();
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum RoundOutcome {
    Perfect,
    NeedsPractice,
}

fn round_outcome(comparison: &TextComparison) -> RoundOutcome {
    if comparison.is_perfect_match() {
        RoundOutcome::Perfect
    } else {
        RoundOutcome::NeedsPractice
    }
}

fn run_monitor(settings: Settings) -> Result<(), Box<dyn std::error::Error>> {
    let cancelled = Arc::new(AtomicBool::new(false));
    let flag = cancelled.clone();
    ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))?;

    let mut session = build_session(settings, None)?;
    let ticks = session.monitor(&cancelled)?;
    log::info!("Processed {ticks} frames");
    Ok(())
}

fn run_shift(
    settings: &Settings,
    input: &Path,
    output: &Path,
    semitones: f64,
) -> Result<(), Box<dyn std::error::Error>> {
    let shifter = SoundstretchPitchShifter::new(settings.pitch_shift_command.clone());
    shifter.shift(input, output, semitones)?;
    log::info!("Output written to {}", output.display());
    Ok(())
}

fn run_compare(reference: &str, spoken: &str) -> Result<(), Box<dyn std::error::Error>> {
    let comparison = TextComparison::compare(reference, spoken)?;
    print_comparison(&comparison);
    Ok(())
}

fn build_session(
    settings: Settings,
    recognizer: Option<Box<dyn SpeechRecognizer>>,
) -> Result<PracticeSession, Box<dyn std::error::Error>> {
    let pitch_shifter = SoundstretchPitchShifter::new(settings.pitch_shift_command.clone());
    PracticeSession::new(
        settings,
        Box::new(CpalAudioDevice::new()),
        recognizer,
        Box::new(pitch_shifter),
        Box::new(WavAudioReader),
        Box::new(WavAudioWriter),
        Box::new(StdoutPipelineLogger::new()),
    )
}

fn build_recognizer(
    settings: &Settings,
    model_dir: Option<&Path>,
) -> Result<Box<dyn SpeechRecognizer>, Box<dyn std::error::Error>> {
    log::info!("Resolving model: {}", settings.whisper_model);
    let model_path = model_resolver::resolve(
        &settings.whisper_model,
        &settings.whisper_model_url(),
        model_dir,
        Some(Box::new(download_progress)),
    )?;
    eprintln!();
    Ok(Box::new(WhisperRecognizer::new(&model_path)?))
}

fn print_comparison(comparison: &TextComparison) {
    if comparison.is_perfect_match() {
        println!("Perfect match, well done!");
        return;
    }
    for discrepancy in comparison.discrepancies() {
        println!("{discrepancy}");
    }
    println!(
        "Similarity: {:.0}%",
        comparison.script.similarity() * 100.0
    );
}

/// Print `message` and read one trimmed line. End of input reads as empty.
fn prompt(message: &str) -> io::Result<String> {
    print!("{message}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading speech model... {pct}%");
    } else {
        eprint!("\rDownloading speech model... {downloaded} bytes");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_overrides_replace_loaded_values() {
        let cli = Cli::parse_from([
            "fluency",
            "monitor",
            "--delay-ms",
            "200",
            "--fsf-semitones",
            "-5",
            "--language",
            "es",
        ]);
        let settings = apply_overrides(Settings::default(), &cli.overrides);
        assert_eq!(settings.daf_delay_ms, 200.0);
        assert_eq!(settings.fsf_semitones, -5.0);
        assert_eq!(settings.language, "es");
        assert_eq!(settings.record_seconds, Settings::default().record_seconds);
    }

    #[test]
    fn test_shift_accepts_negative_semitones() {
        let cli = Cli::parse_from(["fluency", "shift", "in.wav", "out.wav", "-3"]);
        match cli.command {
            Command::Shift { semitones, .. } => assert_eq!(semitones, -3.0),
            _ => panic!("expected shift"),
        }
    }

    #[test]
    fn test_default_log_filter_shows_session_prompts() {
        use log::{Level, Log, Metadata};

        let env = env_logger::Env::new().filter("FLUENCY_TEST_LOG_UNSET");
        let logger = logger_builder(env).build();
        let at = |level| {
            Metadata::builder()
                .level(level)
                .target("fluency_core::pipeline::pipeline_logger")
                .build()
        };
        assert!(logger.enabled(&at(Level::Info)));
        assert!(!logger.enabled(&at(Level::Debug)));
    }

    #[rstest]
    #[case::perfect("the quick fox", "The quick fox.", RoundOutcome::Perfect)]
    #[case::missed_word("the quick brown fox", "the quick fox", RoundOutcome::NeedsPractice)]
    #[case::nothing_heard("hello there", "", RoundOutcome::NeedsPractice)]
    fn test_round_outcome(
        #[case] reference: &str,
        #[case] spoken: &str,
        #[case] expected: RoundOutcome,
    ) {
        let comparison = TextComparison::compare(reference, spoken).unwrap();
        assert_eq!(round_outcome(&comparison), expected);
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
