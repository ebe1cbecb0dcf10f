use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditOp {
    Equal,
    /// Words heard that are not in the reference.
    Insert,
    /// Reference words that were not heard.
    Delete,
    Replace,
}

impl EditOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            EditOp::Equal => "equal",
            EditOp::Insert => "insert",
            EditOp::Delete => "delete",
            EditOp::Replace => "replace",
        }
    }
}

impl std::fmt::Display for EditOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One maximal run of an edit script over reference and spoken token indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditRun {
    pub op: EditOp,
    pub reference: Range<usize>,
    pub spoken: Range<usize>,
}

impl EditRun {
    pub fn new(op: EditOp, reference: Range<usize>, spoken: Range<usize>) -> Self {
        Self {
            op,
            reference,
            spoken,
        }
    }
}

/// Ordered runs partitioning both token sequences without gaps or overlaps.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EditScript {
    runs: Vec<EditRun>,
}

impl EditScript {
    pub(crate) fn from_runs(runs: Vec<EditRun>) -> Self {
        Self { runs }
    }

    pub fn runs(&self) -> &[EditRun] {
        &self.runs
    }

    pub fn into_runs(self) -> Vec<EditRun> {
        self.runs
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn is_perfect_match(&self) -> bool {
        self.runs.iter().all(|r| r.op == EditOp::Equal)
    }

    pub fn mismatches(&self) -> impl Iterator<Item = &EditRun> {
        self.runs.iter().filter(|r| r.op != EditOp::Equal)
    }

    /// Matched reference words over reference length; 1.0 for an empty reference.
    pub fn similarity(&self) -> f64 {
        let reference_len: usize = self.runs.iter().map(|r| r.reference.len()).sum();
        if reference_len == 0 {
            return 1.0;
        }
        let matched: usize = self
            .runs
            .iter()
            .filter(|r| r.op == EditOp::Equal)
            .map(|r| r.reference.len())
            .sum();
        matched as f64 / reference_len as f64
    }
}
