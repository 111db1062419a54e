//! Core data types for extracted quizzes.

use serde::{Deserialize, Serialize};

/// Every quiz section found in one descriptor payload, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizDocument {
    pub sections: Vec<QuizSection>,
}

/// A named set of questions attached to one marker of a quiz track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSection {
    /// Value of the `questionSetName` attribute. May be an empty string.
    pub name: Option<String>,
    pub questions: Vec<Question>,
}

/// A single-select multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub prompt: Option<String>,
    pub answers: Vec<String>,
    /// Zero-based offset into `answers`.
    pub correct_answer_index: usize,
}

impl QuizDocument {
    /// Create an empty document.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Total number of questions across all sections.
    pub fn question_count(&self) -> usize {
        self.sections.iter().map(|s| s.questions.len()).sum()
    }
}

impl QuizSection {
    /// Name to show for this section, `None` when absent or empty.
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.is_empty())
    }
}

impl Question {
    /// The correct answer text, if the coded index points at an answer.
    pub fn correct_answer(&self) -> Option<&str> {
        self.answers
            .get(self.correct_answer_index)
            .map(String::as_str)
    }
}

/// Errors that can occur while reading quiz descriptors.
#[derive(thiserror::Error, Debug)]
pub enum QuizError {
    #[error("XML parse error: {0}")]
    Parse(String),

    #[error("Malformed answer code: {0:?}")]
    MalformedAnswerCode(String),
}

/// Convenience result type.
pub type QuizResult<T> = Result<T, QuizError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn question(answers: &[&str], index: usize) -> Question {
        Question {
            prompt: Some("Pick one".to_string()),
            answers: answers.iter().map(|a| a.to_string()).collect(),
            correct_answer_index: index,
        }
    }

    #[test]
    fn test_correct_answer_lookup() {
        let q = question(&["3", "4", "5"], 1);
        assert_eq!(q.correct_answer(), Some("4"));
    }

    #[test]
    fn test_correct_answer_out_of_range() {
        let q = question(&["yes", "no"], 4);
        assert_eq!(q.correct_answer(), None);
    }

    #[test]
    fn test_display_name_ignores_empty() {
        let named = QuizSection {
            name: Some("Quiz 1".to_string()),
            questions: vec![],
        };
        let blank = QuizSection {
            name: Some(String::new()),
            questions: vec![],
        };
        assert_eq!(named.display_name(), Some("Quiz 1"));
        assert_eq!(blank.display_name(), None);
    }

    #[test]
    fn test_question_count() {
        let doc = QuizDocument {
            sections: vec![
                QuizSection {
                    name: None,
                    questions: vec![question(&["a"], 0), question(&["b"], 0)],
                },
                QuizSection {
                    name: None,
                    questions: vec![question(&["c"], 0)],
                },
            ],
        };
        assert_eq!(doc.question_count(), 3);
        assert!(!doc.is_empty());
        assert!(QuizDocument::empty().is_empty());
    }

    #[test]
    fn test_document_serialization() {
        let doc = QuizDocument {
            sections: vec![QuizSection {
                name: Some("Quiz 1".to_string()),
                questions: vec![question(&["3", "4"], 1)],
            }],
        };
        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.contains("\"correct_answer_index\":1"));
        let parsed: QuizDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, doc);
    }

    #[test]
    fn test_error_messages() {
        for err in [
            QuizError::Parse("unclosed element <a>".to_string()),
            QuizError::MalformedAnswerCode("3".to_string()),
        ] {
            let msg = match &err {
                QuizError::Parse(_) => "XML parse error: unclosed element <a>",
                QuizError::MalformedAnswerCode(_) => "Malformed answer code: \"3\"",
            };
            assert_eq!(err.to_string(), msg);
        }
    }
}
