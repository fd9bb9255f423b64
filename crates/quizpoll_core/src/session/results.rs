//! Render-ready result derivation.
//!
//! Pure functions of question, aggregate and local choice; nothing here is
//! stored.

use crate::model::question::{OptionId, Question, QuestionId, QuestionKind};
use crate::model::vote::Aggregate;

/// Rounded share of `count` in `total`, half rounding up; `0` when `total == 0`.
pub fn percentage(count: u64, total: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    let count = u128::from(count);
    let total = u128::from(total);
    let rounded = (200 * count + total) / (2 * total);
    u32::try_from(rounded).unwrap_or(u32::MAX)
}

/// Correctness feedback shown once the question is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    Correct,
    Incorrect,
}

impl Feedback {
    pub fn message(self) -> &'static str {
        match self {
            Self::Correct => "Great shot! That's correct.",
            Self::Incorrect => "Nice try! Check the correct answer indicated above.",
        }
    }
}

/// Visual emphasis of one option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionMark {
    /// Question not answered yet.
    Neutral,
    SelectedCorrect,
    SelectedIncorrect,
    /// The correct answer, not chosen.
    MissedCorrect,
    Dimmed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionResult {
    pub option_id: OptionId,
    pub text: String,
    pub count: u64,
    pub percentage: u32,
    pub mark: OptionMark,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionResults {
    pub question_id: QuestionId,
    pub prompt: String,
    pub kind: QuestionKind,
    pub total_votes: u64,
    pub options: Vec<OptionResult>,
    /// Local choice; `None` until answered.
    pub selected: Option<OptionId>,
    pub feedback: Option<Feedback>,
}

impl QuestionResults {
    /// Percentages and counts are only shown after the user voted.
    pub fn is_revealed(&self) -> bool {
        self.selected.is_some()
    }
}

/// Derives results for `question` from the cached aggregate and local choice.
pub fn derive_results(
    question: &Question,
    aggregate: &Aggregate,
    selected: Option<&str>,
) -> QuestionResults {
    let total_votes = aggregate.total_for(question);
    let options = question
        .options
        .iter()
        .map(|option| {
            let count = aggregate.count(&option.id);
            OptionResult {
                option_id: option.id.clone(),
                text: option.text.clone(),
                count,
                percentage: percentage(count, total_votes),
                mark: option_mark(question, &option.id, selected),
            }
        })
        .collect();

    QuestionResults {
        question_id: question.id.clone(),
        prompt: question.prompt.clone(),
        kind: question.kind,
        total_votes,
        options,
        selected: selected.map(str::to_string),
        feedback: selected.map(|choice| {
            if question.is_correct(choice) {
                Feedback::Correct
            } else {
                Feedback::Incorrect
            }
        }),
    }
}

fn option_mark(question: &Question, option_id: &str, selected: Option<&str>) -> OptionMark {
    let Some(choice) = selected else {
        return OptionMark::Neutral;
    };
    let is_selected = choice == option_id;
    let is_answer = question.is_correct(option_id);
    match (is_selected, is_answer) {
        (true, true) => OptionMark::SelectedCorrect,
        (true, false) => OptionMark::SelectedIncorrect,
        (false, true) => OptionMark::MissedCorrect,
        (false, false) => OptionMark::Dimmed,
    }
}
