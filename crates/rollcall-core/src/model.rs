//! Checklist model: a fixed section/question structure with tri-state answers.
//!
//! The structure is set once from a [`SectionDef`] slice and never changes for
//! the lifetime of the checklist; only answers move. Snapshots for the status
//! endpoint are produced by [`Checklist::status`].

use serde::{Deserialize, Serialize};

use crate::classify::Decision;

/// Recorded state of a single checklist item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Answer {
    #[default]
    Unanswered,
    Yes,
    No,
}

impl From<Decision> for Answer {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Yes => Answer::Yes,
            Decision::No => Answer::No,
        }
    }
}

/// Static definition of one checklist section.
#[derive(Debug, Clone, Copy)]
pub struct SectionDef {
    pub title: &'static str,
    pub questions: &'static [&'static str],
}

/// One question plus its recorded answer.
#[derive(Debug, Clone)]
pub struct Item {
    question: String,
    answer: Answer,
}

impl Item {
    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn answer(&self) -> Answer {
        self.answer
    }
}

/// A titled run of items.
#[derive(Debug, Clone)]
pub struct Section {
    title: String,
    items: Vec<Item>,
}

impl Section {
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }
}

/// The live checklist: fixed structure, mutable answers.
#[derive(Debug, Clone)]
pub struct Checklist {
    sections: Vec<Section>,
}

impl Checklist {
    /// Build a checklist with every item [`Answer::Unanswered`].
    pub fn new(definition: &[SectionDef]) -> Self {
        let sections = definition
            .iter()
            .map(|def| Section {
                title: def.title.to_string(),
                items: def
                    .questions
                    .iter()
                    .map(|q| Item {
                        question: q.to_string(),
                        answer: Answer::Unanswered,
                    })
                    .collect(),
            })
            .collect();
        Self { sections }
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Total number of items across all sections.
    pub fn item_count(&self) -> usize {
        self.sections.iter().map(|s| s.items.len()).sum()
    }

    /// Replace the answer for one item. A later write for the same item
    /// overwrites the earlier one.
    ///
    /// # Panics
    ///
    /// Panics if `section` or `question` is out of range. Callers index by
    /// iterating the same definition the checklist was built from, so an
    /// out-of-range index is a caller bug, not a runtime condition.
    pub fn set_answer(&mut self, section: usize, question: usize, answer: Answer) {
        self.sections[section].items[question].answer = answer;
    }

    /// Read the answer for one item. Panics on out-of-range indices, same as
    /// [`Checklist::set_answer`].
    pub fn answer(&self, section: usize, question: usize) -> Answer {
        self.sections[section].items[question].answer
    }

    /// Return every item to [`Answer::Unanswered`].
    pub fn reset(&mut self) {
        for section in &mut self.sections {
            for item in &mut section.items {
                item.answer = Answer::Unanswered;
            }
        }
    }

    /// Snapshot the whole checklist in wire shape, sections and questions in
    /// definition order.
    pub fn status(&self) -> Vec<SectionStatus> {
        self.sections
            .iter()
            .map(|section| SectionStatus {
                section: section.title.clone(),
                questions: section
                    .items
                    .iter()
                    .map(|item| QuestionStatus {
                        question: item.question.clone(),
                        yes: item.answer == Answer::Yes,
                        no: item.answer == Answer::No,
                    })
                    .collect(),
            })
            .collect()
    }
}

// ─── Wire types ────────────────────────────────────────────────────────────

/// One section as served by the status endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionStatus {
    pub section: String,
    pub questions: Vec<QuestionStatus>,
}

/// One question as served by the status endpoint. An unanswered item has both
/// flags false; `yes` and `no` are never both true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionStatus {
    pub question: String,
    pub yes: bool,
    pub no: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEF: &[SectionDef] = &[
        SectionDef {
            title: "First",
            questions: &["Q1?", "Q2?"],
        },
        SectionDef {
            title: "Second",
            questions: &["Q3?"],
        },
    ];

    #[test]
    fn new_checklist_is_unanswered() {
        let list = Checklist::new(DEF);
        assert_eq!(list.item_count(), 3);
        assert_eq!(list.answer(0, 0), Answer::Unanswered);
        assert_eq!(list.answer(1, 0), Answer::Unanswered);
    }

    #[test]
    fn set_answer_overwrites() {
        let mut list = Checklist::new(DEF);
        list.set_answer(0, 1, Answer::Yes);
        assert_eq!(list.answer(0, 1), Answer::Yes);
        list.set_answer(0, 1, Answer::No);
        assert_eq!(list.answer(0, 1), Answer::No);
        // Neighbours untouched
        assert_eq!(list.answer(0, 0), Answer::Unanswered);
        assert_eq!(list.answer(1, 0), Answer::Unanswered);
    }

    #[test]
    fn reset_clears_everything() {
        let mut list = Checklist::new(DEF);
        list.set_answer(0, 0, Answer::Yes);
        list.set_answer(1, 0, Answer::No);
        list.reset();
        for section in list.status() {
            for q in section.questions {
                assert!(!q.yes && !q.no);
            }
        }
    }

    #[test]
    fn status_flags_are_exclusive() {
        let mut list = Checklist::new(DEF);
        list.set_answer(0, 0, Answer::Yes);
        list.set_answer(0, 1, Answer::No);
        let status = list.status();
        assert!(status[0].questions[0].yes && !status[0].questions[0].no);
        assert!(!status[0].questions[1].yes && status[0].questions[1].no);
        assert!(!status[1].questions[0].yes && !status[1].questions[0].no);
    }

    #[test]
    fn status_preserves_definition_order() {
        let list = Checklist::new(DEF);
        let status = list.status();
        assert_eq!(status[0].section, "First");
        assert_eq!(status[0].questions[1].question, "Q2?");
        assert_eq!(status[1].section, "Second");
    }

    #[test]
    fn status_serializes_to_wire_shape() {
        let mut list = Checklist::new(DEF);
        list.set_answer(0, 0, Answer::Yes);
        let json = serde_json::to_value(list.status()).unwrap();
        assert_eq!(json[0]["section"], "First");
        assert_eq!(json[0]["questions"][0]["question"], "Q1?");
        assert_eq!(json[0]["questions"][0]["yes"], true);
        assert_eq!(json[0]["questions"][0]["no"], false);
    }

    #[test]
    #[should_panic]
    fn set_answer_out_of_range_panics() {
        let mut list = Checklist::new(DEF);
        list.set_answer(0, 7, Answer::Yes);
    }

    #[test]
    fn decision_maps_to_answer() {
        assert_eq!(Answer::from(Decision::Yes), Answer::Yes);
        assert_eq!(Answer::from(Decision::No), Answer::No);
    }
}
