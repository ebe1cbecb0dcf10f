use std::fmt;

use super::edit_script::{EditOp, EditScript};
use super::sequence_aligner::{AlignmentError, SequenceAligner};
use super::tokenization::tokenize;

/// A non-equal run rendered back to words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discrepancy {
    pub op: EditOp,
    pub expected: String,
    pub heard: String,
}

impl fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Expected '{}' but heard '{}'", self.expected, self.heard)
    }
}

/// A reference sentence and a transcript, tokenized and aligned.
#[derive(Debug, Clone, PartialEq)]
pub struct TextComparison {
    pub reference: Vec<String>,
    pub spoken: Vec<String>,
    pub script: EditScript,
}

impl TextComparison {
    pub fn compare(reference: &str, spoken: &str) -> Result<Self, AlignmentError> {
        let reference = tokenize(reference);
        let spoken = tokenize(spoken);
        let script = SequenceAligner::align(&reference, &spoken)?;
        Ok(Self {
            reference,
            spoken,
            script,
        })
    }

    pub fn is_perfect_match(&self) -> bool {
        self.script.is_perfect_match()
    }

    pub fn discrepancies(&self) -> Vec<Discrepancy> {
        self.script
            .mismatches()
            .map(|run| Discrepancy {
                op: run.op,
                expected: self.reference[run.reference.clone()].join(" "),
                heard: self.spoken[run.spoken.clone()].join(" "),
            })
            .collect()
    }
}
