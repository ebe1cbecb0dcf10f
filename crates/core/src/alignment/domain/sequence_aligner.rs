use std::ops::Range;

use thiserror::Error;

use super::edit_script::{EditOp, EditRun, EditScript};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AlignmentError {
    #[error("invalid {side} token at index {index}: {token:?} (tokens must be non-empty and contain no whitespace)")]
    InvalidInput {
        side: &'static str,
        index: usize,
        token: String,
    },
}

/// Word-level LCS alignment between a reference sentence and a transcript.
///
/// When several minimal alignments exist, the one matching the earliest
/// reference positions wins, so output is reproducible.
pub struct SequenceAligner;

impl SequenceAligner {
    pub fn align<S: AsRef<str>>(
        reference: &[S],
        spoken: &[S],
    ) -> Result<EditScript, AlignmentError> {
        validate("reference", reference)?;
        validate("spoken", spoken)?;

        let matches = Self::matching_pairs(reference, spoken);
        Ok(EditScript::from_runs(Self::runs_from_matches(
            &matches,
            reference.len(),
            spoken.len(),
        )))
    }

    /// Index pairs of one longest common subsequence, in order.
    fn matching_pairs<S: AsRef<str>>(reference: &[S], spoken: &[S]) -> Vec<(usize, usize)> {
        let (n, m) = (reference.len(), spoken.len());
        let width = m + 1;
        let eq = |i: usize, j: usize| reference[i].as_ref() == spoken[j].as_ref();

        // suffix[i * width + j] = LCS length of reference[i..] and spoken[j..]
        let mut suffix = vec![0u32; (n + 1) * width];
        for i in (0..n).rev() {
            for j in (0..m).rev() {
                suffix[i * width + j] = if eq(i, j) {
                    suffix[(i + 1) * width + j + 1] + 1
                } else {
                    suffix[(i + 1) * width + j].max(suffix[i * width + j + 1])
                };
            }
        }

        let mut pairs = Vec::with_capacity(suffix[0] as usize);
        let (mut i, mut j) = (0, 0);
        while i < n && j < m {
            if eq(i, j) {
                pairs.push((i, j));
                i += 1;
                j += 1;
            } else if suffix[i * width + j + 1] >= suffix[(i + 1) * width + j] {
                // Skipping the spoken word keeps reference[i] available for an earlier match.
                j += 1;
            } else {
                i += 1;
            }
        }
        pairs
    }

    fn runs_from_matches(matches: &[(usize, usize)], n: usize, m: usize) -> Vec<EditRun> {
        let mut runs = Vec::new();
        let (mut i, mut j) = (0, 0);
        let mut k = 0;

        while k < matches.len() {
            let (bi, bj) = matches[k];
            let mut len = 1;
            while k + len < matches.len() && matches[k + len] == (bi + len, bj + len) {
                len += 1;
            }

            push_gap(&mut runs, i..bi, j..bj);
            runs.push(EditRun::new(EditOp::Equal, bi..bi + len, bj..bj + len));

            i = bi + len;
            j = bj + len;
            k += len;
        }
        push_gap(&mut runs, i..n, j..m);
        runs
    }
}

fn push_gap(runs: &mut Vec<EditRun>, reference: Range<usize>, spoken: Range<usize>) {
    let op = match (reference.is_empty(), spoken.is_empty()) {
        (true, true) => return,
        (false, true) => EditOp::Delete,
        (true, false) => EditOp::Insert,
        (false, false) => EditOp::Replace,
    };
    runs.push(EditRun::new(op, reference, spoken));
}

fn validate<S: AsRef<str>>(side: &'static str, tokens: &[S]) -> Result<(), AlignmentError> {
    for (index, token) in tokens.iter().enumerate() {
        let token = token.as_ref();
        if token.is_empty() || token.chars().any(char::is_whitespace) {
            return Err(AlignmentError::InvalidInput {
                side,
                index,
                token: token.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn words(s: &str) -> Vec<&str> {
        s.split_whitespace().collect()
    }

    fn align(reference: &str, spoken: &str) -> Vec<EditRun> {
        SequenceAligner::align(&words(reference), &words(spoken))
            .unwrap()
            .into_runs()
    }

    fn run(op: EditOp, r: Range<usize>, s: Range<usize>) -> EditRun {
        EditRun::new(op, r, s)
    }

    #[test]
    fn test_dropped_word_is_a_delete_between_equal_runs() {
        assert_eq!(
            align("the quick brown fox", "the quick fox"),
            vec![
                run(EditOp::Equal, 0..2, 0..2),
                run(EditOp::Delete, 2..3, 2..2),
                run(EditOp::Equal, 3..4, 2..3),
            ]
        );
    }

    #[test]
    fn test_identical_sequences_yield_single_equal_run() {
        assert_eq!(
            align("she sells sea shells", "she sells sea shells"),
            vec![run(EditOp::Equal, 0..4, 0..4)]
        );
    }

    #[test]
    fn test_substitution_is_replace() {
        assert_eq!(
            align("the red car", "the blue car"),
            vec![
                run(EditOp::Equal, 0..1, 0..1),
                run(EditOp::Replace, 1..2, 1..2),
                run(EditOp::Equal, 2..3, 2..3),
            ]
        );
    }

    #[test]
    fn test_extra_words_are_inserts() {
        assert_eq!(
            align("good morning", "good uh um morning"),
            vec![
                run(EditOp::Equal, 0..1, 0..1),
                run(EditOp::Insert, 1..1, 1..3),
                run(EditOp::Equal, 1..2, 3..4),
            ]
        );
    }

    #[test]
    fn test_uneven_replacement_merges_into_one_run() {
        assert_eq!(
            align("a b c d", "a x y z w d"),
            vec![
                run(EditOp::Equal, 0..1, 0..1),
                run(EditOp::Replace, 1..3, 1..5),
                run(EditOp::Equal, 3..4, 5..6),
            ]
        );
    }

    #[test]
    fn test_tie_prefers_earliest_reference_match() {
        // Either word could be the match; the first reference word wins.
        assert_eq!(
            align("a b", "b a"),
            vec![
                run(EditOp::Insert, 0..0, 0..1),
                run(EditOp::Equal, 0..1, 1..2),
                run(EditOp::Delete, 1..2, 2..2),
            ]
        );
    }

    #[test]
    fn test_repeated_word_matches_first_occurrence() {
        assert_eq!(
            align("go go go", "go"),
            vec![
                run(EditOp::Equal, 0..1, 0..1),
                run(EditOp::Delete, 1..3, 1..1),
            ]
        );
    }

    #[rstest]
    #[case::both_empty("", "", vec![])]
    #[case::nothing_heard("hello world", "", vec![run(EditOp::Delete, 0..2, 0..0)])]
    #[case::no_reference("", "hello", vec![run(EditOp::Insert, 0..0, 0..1)])]
    #[case::nothing_in_common("one two", "three", vec![run(EditOp::Replace, 0..2, 0..1)])]
    fn test_degenerate_inputs(
        #[case] reference: &str,
        #[case] spoken: &str,
        #[case] expected: Vec<EditRun>,
    ) {
        assert_eq!(align(reference, spoken), expected);
    }

    #[rstest]
    #[case::empty_reference_token(vec!["ok", ""], vec!["ok"], "reference", 1)]
    #[case::whitespace_in_spoken(vec!["ok"], vec!["not split"], "spoken", 0)]
    fn test_untokenized_input_is_rejected(
        #[case] reference: Vec<&str>,
        #[case] spoken: Vec<&str>,
        #[case] side: &str,
        #[case] index: usize,
    ) {
        let err = SequenceAligner::align(&reference, &spoken).unwrap_err();
        let AlignmentError::InvalidInput {
            side: got_side,
            index: got_index,
            ..
        } = err;
        assert_eq!(got_side, side);
        assert_eq!(got_index, index);
    }

    /// Small deterministic generator so the partition check covers many shapes.
    fn pseudo_random_sentences(seed: u64, count: usize) -> Vec<Vec<String>> {
        let vocab = ["a", "b", "c", "d", "the", "fox"];
        let mut state = seed;
        let mut next = move || {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (state >> 33) as usize
        };
        (0..count)
            .map(|_| {
                let len = next() % 8;
                (0..len).map(|_| vocab[next() % vocab.len()].to_string()).collect()
            })
            .collect()
    }

    #[test]
    fn test_runs_partition_both_sequences() {
        let sentences = pseudo_random_sentences(42, 60);
        for pair in sentences.chunks(2) {
            let (reference, spoken) = (&pair[0], &pair[1]);
            let script = SequenceAligner::align(reference, spoken).unwrap();

            let rebuilt_ref: Vec<&String> = script
                .runs()
                .iter()
                .flat_map(|r| &reference[r.reference.clone()])
                .collect();
            let rebuilt_spoken: Vec<&String> = script
                .runs()
                .iter()
                .flat_map(|r| &spoken[r.spoken.clone()])
                .collect();
            assert_eq!(rebuilt_ref, reference.iter().collect::<Vec<_>>());
            assert_eq!(rebuilt_spoken, spoken.iter().collect::<Vec<_>>());

            for w in script.runs().windows(2) {
                assert_eq!(w[0].reference.end, w[1].reference.start);
                assert_eq!(w[0].spoken.end, w[1].spoken.start);
                assert!(
                    w[0].op != w[1].op,
                    "adjacent runs share op {:?} for {reference:?} / {spoken:?}",
                    w[0].op
                );
            }

            for r in script.runs() {
                if r.op == EditOp::Equal {
                    assert_eq!(reference[r.reference.clone()], spoken[r.spoken.clone()]);
                }
            }
        }
    }

    #[test]
    fn test_equal_runs_cover_an_lcs() {
        // "a b c b d a b" vs "b d c a b a": LCS length is 4.
        let script =
            SequenceAligner::align(&words("a b c b d a b"), &words("b d c a b a")).unwrap();
        let matched: usize = script
            .runs()
            .iter()
            .filter(|r| r.op == EditOp::Equal)
            .map(|r| r.reference.len())
            .sum();
        assert_eq!(matched, 4);
    }
}
