//! Question input model.
//!
//! # Responsibility
//! - Describe the externally supplied question set.
//! - Validate structural consistency before a session starts using it.
//!
//! # Invariants
//! - Option ids are unique within a question.
//! - `correct_answer_id` references one of the question's own options.
//! - Boolean questions carry exactly two options.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Stable identifier of a question.
pub type QuestionId = String;

/// Stable identifier of an answer option, unique within its question.
///
/// The aggregate is keyed by option id alone, so callers that share one
/// store across several question sets must keep option ids globally unique.
pub type OptionId = String;

/// Presentation discriminant for a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionKind {
    #[serde(rename = "multiple-choice")]
    MultipleChoice,
    #[serde(rename = "boolean")]
    Boolean,
}

impl QuestionKind {
    /// Short label shown above the prompt.
    pub fn label(self) -> &'static str {
        match self {
            Self::MultipleChoice => "Multiple Choice",
            Self::Boolean => "True / False",
        }
    }
}

/// One selectable answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub id: OptionId,
    pub text: String,
}

impl AnswerOption {
    pub fn new(id: impl Into<OptionId>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// Question supplied by the caller at load time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: QuestionId,
    /// Serialized as `question` to match the external question-set format.
    #[serde(rename = "question")]
    pub prompt: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub options: Vec<AnswerOption>,
    pub correct_answer_id: OptionId,
}

impl Question {
    /// Returns the option with `option_id`, if it belongs to this question.
    pub fn option(&self, option_id: &str) -> Option<&AnswerOption> {
        self.options.iter().find(|option| option.id == option_id)
    }

    /// Returns whether `option_id` is one of this question's options.
    pub fn has_option(&self, option_id: &str) -> bool {
        self.option(option_id).is_some()
    }

    /// Returns whether `option_id` is the designated correct answer.
    pub fn is_correct(&self, option_id: &str) -> bool {
        self.correct_answer_id == option_id
    }

    /// Checks structural invariants of this question.
    ///
    /// # Errors
    /// - `EmptyQuestionId` / `EmptyOptionId` for blank identifiers.
    /// - `NoOptions` when the option list is empty.
    /// - `DuplicateOptionId` when two options share an id.
    /// - `BooleanOptionCount` when a boolean question does not have two options.
    /// - `UnknownCorrectAnswer` when the correct answer is not one of the options.
    pub fn validate(&self) -> Result<(), QuestionValidationError> {
        if self.id.trim().is_empty() {
            return Err(QuestionValidationError::EmptyQuestionId);
        }
        if self.options.is_empty() {
            return Err(QuestionValidationError::NoOptions {
                question_id: self.id.clone(),
            });
        }

        let mut seen = HashSet::with_capacity(self.options.len());
        for option in &self.options {
            if option.id.trim().is_empty() {
                return Err(QuestionValidationError::EmptyOptionId {
                    question_id: self.id.clone(),
                });
            }
            if !seen.insert(option.id.as_str()) {
                return Err(QuestionValidationError::DuplicateOptionId {
                    question_id: self.id.clone(),
                    option_id: option.id.clone(),
                });
            }
        }

        if self.kind == QuestionKind::Boolean && self.options.len() != 2 {
            return Err(QuestionValidationError::BooleanOptionCount {
                question_id: self.id.clone(),
                actual: self.options.len(),
            });
        }

        if !self.has_option(&self.correct_answer_id) {
            return Err(QuestionValidationError::UnknownCorrectAnswer {
                question_id: self.id.clone(),
                option_id: self.correct_answer_id.clone(),
            });
        }

        Ok(())
    }
}

/// Structural problem found in a question or question set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionValidationError {
    EmptyQuestionId,
    DuplicateQuestionId(QuestionId),
    NoOptions {
        question_id: QuestionId,
    },
    EmptyOptionId {
        question_id: QuestionId,
    },
    DuplicateOptionId {
        question_id: QuestionId,
        option_id: OptionId,
    },
    BooleanOptionCount {
        question_id: QuestionId,
        actual: usize,
    },
    UnknownCorrectAnswer {
        question_id: QuestionId,
        option_id: OptionId,
    },
    Malformed(String),
}

impl Display for QuestionValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyQuestionId => write!(f, "question id cannot be empty"),
            Self::DuplicateQuestionId(id) => write!(f, "duplicate question id `{id}`"),
            Self::NoOptions { question_id } => {
                write!(f, "question `{question_id}` has no options")
            }
            Self::EmptyOptionId { question_id } => {
                write!(f, "question `{question_id}` has an option with an empty id")
            }
            Self::DuplicateOptionId {
                question_id,
                option_id,
            } => write!(
                f,
                "question `{question_id}` declares option `{option_id}` more than once"
            ),
            Self::BooleanOptionCount {
                question_id,
                actual,
            } => write!(
                f,
                "boolean question `{question_id}` must have 2 options, found {actual}"
            ),
            Self::UnknownCorrectAnswer {
                question_id,
                option_id,
            } => write!(
                f,
                "correct answer `{option_id}` is not an option of question `{question_id}`"
            ),
            Self::Malformed(message) => write!(f, "malformed question set: {message}"),
        }
    }
}

impl Error for QuestionValidationError {}

/// Validates a whole question set, including question id uniqueness.
pub fn validate_question_set(questions: &[Question]) -> Result<(), QuestionValidationError> {
    let mut seen = HashSet::with_capacity(questions.len());
    for question in questions {
        question.validate()?;
        if !seen.insert(question.id.as_str()) {
            return Err(QuestionValidationError::DuplicateQuestionId(
                question.id.clone(),
            ));
        }
    }
    Ok(())
}

/// Parses and validates a JSON question set.
///
/// Expected shape: `[{"id", "question", "type", "options": [{"id", "text"}],
/// "correctAnswerId"}]`.
pub fn parse_question_set(json: &str) -> Result<Vec<Question>, QuestionValidationError> {
    let questions: Vec<Question> = serde_json::from_str(json)
        .map_err(|err| QuestionValidationError::Malformed(err.to_string()))?;
    validate_question_set(&questions)?;
    Ok(questions)
}
