// Phrase-structure planning: grouping slots into labelled sections.
//
// A progression's form (AABA, ABAB, question-answer, ...) is planned up front
// as a list of contiguous sections. Each slot then carries the label of the
// section it falls in. The plan is metadata for the host (looping,
// highlighting, arrangement); it never influences which chord is chosen.
//
// The mapping is a pure function of (form, slot count).

use crate::config::PhraseStructure;
use serde::{Deserialize, Serialize};

/// Slots per section in through-composed form.
const THROUGH_COMPOSED_SECTION: usize = 4;

/// A contiguous run of slots sharing a section label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhraseSection {
    pub label: char,
    /// First slot of the section.
    pub start: usize,
    /// Number of slots in the section (never zero).
    pub len: usize,
}

/// Plan the sections of a progression of `slot_count` slots.
///
/// Four-part forms split the slots into quarters (slot `i` belongs to
/// quarter `4i / n`), question-answer into halves labelled `Q` and `A`, and
/// through-composed form gives every group of four slots a fresh letter.
pub fn plan_sections(form: PhraseStructure, slot_count: usize) -> Vec<PhraseSection> {
    let (parts, labels): (usize, &[char]) = match form {
        PhraseStructure::Aaba => (4, &['A', 'A', 'B', 'A']),
        PhraseStructure::Abab => (4, &['A', 'B', 'A', 'B']),
        PhraseStructure::Abac => (4, &['A', 'B', 'A', 'C']),
        PhraseStructure::QuestionAnswer => (2, &['Q', 'A']),
        PhraseStructure::ThroughComposed => {
            return (0..slot_count)
                .step_by(THROUGH_COMPOSED_SECTION)
                .enumerate()
                .map(|(n, start)| PhraseSection {
                    label: letter(n),
                    start,
                    len: THROUGH_COMPOSED_SECTION.min(slot_count - start),
                })
                .collect();
        }
    };

    let mut sections: Vec<PhraseSection> = Vec::with_capacity(parts);
    let mut current_part = None;
    for slot in 0..slot_count {
        let part = slot * parts / slot_count;
        if current_part == Some(part) {
            if let Some(section) = sections.last_mut() {
                section.len += 1;
            }
        } else {
            sections.push(PhraseSection {
                label: labels[part],
                start: slot,
                len: 1,
            });
            current_part = Some(part);
        }
    }
    sections
}

/// Section label for each slot.
pub fn phrase_sections(form: PhraseStructure, slot_count: usize) -> Vec<char> {
    let mut labels = Vec::with_capacity(slot_count);
    for section in plan_sections(form, slot_count) {
        labels.extend(std::iter::repeat_n(section.label, section.len));
    }
    labels
}

fn letter(n: usize) -> char {
    (b'A' + (n % 26) as u8) as char
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(form: PhraseStructure, n: usize) -> String {
        phrase_sections(form, n).into_iter().collect()
    }

    #[test]
    fn test_aaba_quarters() {
        assert_eq!(labels(PhraseStructure::Aaba, 8), "AAAABBAA");
        let plan = plan_sections(PhraseStructure::Aaba, 16);
        assert_eq!(plan.len(), 4);
        assert!(plan.iter().all(|s| s.len == 4));
    }

    #[test]
    fn test_abab_and_abac() {
        assert_eq!(labels(PhraseStructure::Abab, 4), "ABAB");
        assert_eq!(labels(PhraseStructure::Abac, 8), "AABBAACC");
    }

    #[test]
    fn test_uneven_split_covers_every_slot() {
        for n in 1..40 {
            for form in PhraseStructure::ALL {
                let plan = plan_sections(form, n);
                let total: usize = plan.iter().map(|s| s.len).sum();
                assert_eq!(total, n, "{form:?} with {n} slots");
                assert_eq!(phrase_sections(form, n).len(), n);
            }
        }
    }

    #[test]
    fn test_question_answer_halves() {
        assert_eq!(labels(PhraseStructure::QuestionAnswer, 6), "QQQAAA");
    }

    #[test]
    fn test_through_composed_new_letter_per_group() {
        assert_eq!(labels(PhraseStructure::ThroughComposed, 10), "AAAABBBBCC");
        let long = phrase_sections(PhraseStructure::ThroughComposed, 4 * 27);
        assert_eq!(long[4 * 26], 'A');
    }

    #[test]
    fn test_short_forms_skip_empty_sections() {
        // Two slots of AABA land in quarters 0 and 2.
        assert_eq!(labels(PhraseStructure::Aaba, 2), "AB");
        assert!(plan_sections(PhraseStructure::Abab, 0).is_empty());
    }
}
