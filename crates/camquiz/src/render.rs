//! Display tree for extracted quizzes, with text and HTML renderers.
//!
//! [`PanelView`] is toolkit-independent: it resolves fallbacks and marks
//! the correct answer, leaving layout to whichever surface shows it.

use serde::Serialize;

use crate::types::{QuizDocument, QuizSection, Question};

/// Title shown for a section whose name is absent or empty.
pub const UNNAMED_SECTION: &str = "Unnamed Section";

/// Prompt shown for a question without a `question` element.
pub const MISSING_PROMPT: &str = "No question found";

/// Everything the side panel shows for one payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelView {
    pub sections: Vec<SectionView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionView {
    pub title: String,
    pub questions: Vec<QuestionView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionView {
    pub prompt: String,
    pub answers: Vec<AnswerView>,
    /// One-based key to press in the player, when the coded index points
    /// at an existing answer.
    pub press_hint: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerView {
    pub text: String,
    pub is_correct: bool,
}

impl PanelView {
    /// Build the display tree for a document.
    pub fn from_document(doc: &QuizDocument) -> Self {
        Self {
            sections: doc.sections.iter().map(SectionView::from_section).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

impl SectionView {
    fn from_section(section: &QuizSection) -> Self {
        Self {
            title: section.display_name().unwrap_or(UNNAMED_SECTION).to_string(),
            questions: section.questions.iter().map(QuestionView::from_question).collect(),
        }
    }
}

impl QuestionView {
    fn from_question(question: &Question) -> Self {
        let answers = question
            .answers
            .iter()
            .enumerate()
            .map(|(idx, text)| AnswerView {
                text: text.clone(),
                is_correct: idx == question.correct_answer_index,
            })
            .collect();

        let press_hint = question
            .correct_answer()
            .map(|_| question.correct_answer_index + 1);

        Self {
            prompt: question
                .prompt
                .as_deref()
                .filter(|p| !p.is_empty())
                .unwrap_or(MISSING_PROMPT)
                .to_string(),
            answers,
            press_hint,
        }
    }
}

/// Plain-text rendering for terminals.
pub fn render_text(view: &PanelView) -> String {
    let mut out = String::new();
    for section in &view.sections {
        out.push_str(&format!("== {} ==\n", section.title));
        for question in &section.questions {
            out.push_str(&format!("\n  Question: {}\n", question.prompt));
            for (idx, answer) in question.answers.iter().enumerate() {
                let mark = if answer.is_correct { "  \u{2713}" } else { "" };
                out.push_str(&format!("    {}. {}{}\n", idx + 1, answer.text, mark));
            }
            if let Some(key) = question.press_hint {
                out.push_str(&format!("  Correct Answer: Press {key}\n"));
            }
        }
        out.push('\n');
    }
    out
}

/// Side-panel HTML fragment. All text is escaped.
pub fn render_html(view: &PanelView) -> String {
    let mut out = String::from("<div id=\"xml-entries\">");
    for section in &view.sections {
        out.push_str("<div class=\"quiz-section\">");
        out.push_str(&format!("<h3>{}</h3>", escape_html(&section.title)));
        for question in &section.questions {
            out.push_str("<div class=\"question\">");
            out.push_str(&format!(
                "<p><strong>Question:</strong> {}</p><ol>",
                escape_html(&question.prompt)
            ));
            for answer in &question.answers {
                if answer.is_correct {
                    out.push_str(&format!(
                        "<li style=\"font-weight: bold;\">{} \u{2713}</li>",
                        escape_html(&answer.text)
                    ));
                } else {
                    out.push_str(&format!("<li>{}</li>", escape_html(&answer.text)));
                }
            }
            out.push_str("</ol>");
            if let Some(key) = question.press_hint {
                out.push_str(&format!(
                    "<p><strong>Correct Answer:</strong> Press {key}</p>"
                ));
            }
            out.push_str("</div>");
        }
        out.push_str("</div>");
    }
    out.push_str("</div>");
    out
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(name: Option<&str>, prompt: Option<&str>, answers: &[&str], index: usize) -> QuizDocument {
        QuizDocument {
            sections: vec![QuizSection {
                name: name.map(String::from),
                questions: vec![Question {
                    prompt: prompt.map(String::from),
                    answers: answers.iter().map(|a| a.to_string()).collect(),
                    correct_answer_index: index,
                }],
            }],
        }
    }

    #[test]
    fn test_marks_correct_answer() {
        let view = PanelView::from_document(&doc(Some("Quiz 1"), Some("2+2?"), &["3", "4", "5"], 1));
        let q = &view.sections[0].questions[0];
        let marks: Vec<bool> = q.answers.iter().map(|a| a.is_correct).collect();
        assert_eq!(marks, vec![false, true, false]);
        assert_eq!(q.press_hint, Some(2));
        assert_eq!(view.sections[0].title, "Quiz 1");
    }

    #[test]
    fn test_fallbacks() {
        let view = PanelView::from_document(&doc(None, None, &["a"], 0));
        assert_eq!(view.sections[0].title, UNNAMED_SECTION);
        assert_eq!(view.sections[0].questions[0].prompt, MISSING_PROMPT);

        let view = PanelView::from_document(&doc(Some(""), Some(""), &["a"], 0));
        assert_eq!(view.sections[0].title, UNNAMED_SECTION);
        assert_eq!(view.sections[0].questions[0].prompt, MISSING_PROMPT);
    }

    #[test]
    fn test_out_of_range_index_marks_nothing() {
        let view = PanelView::from_document(&doc(Some("S"), Some("q"), &["a", "b"], 3));
        let q = &view.sections[0].questions[0];
        assert!(q.answers.iter().all(|a| !a.is_correct));
        assert_eq!(q.press_hint, None);
    }

    #[test]
    fn test_render_text() {
        let view = PanelView::from_document(&doc(Some("Quiz 1"), Some("2+2?"), &["3", "4", "5"], 1));
        let text = render_text(&view);
        assert!(text.contains("== Quiz 1 =="));
        assert!(text.contains("Question: 2+2?"));
        assert!(text.contains("2. 4  \u{2713}"));
        assert!(text.contains("Press 2"));
        assert!(!text.contains("1. 3  \u{2713}"));
    }

    #[test]
    fn test_render_html_escapes() {
        let view = PanelView::from_document(&doc(
            Some("<b>Quiz</b>"),
            Some("1 < 2?"),
            &["<script>x</script>", "no"],
            0,
        ));
        let html = render_html(&view);
        assert!(html.contains("<h3>&lt;b&gt;Quiz&lt;/b&gt;</h3>"));
        assert!(html.contains("1 &lt; 2?"));
        assert!(html.contains("<li style=\"font-weight: bold;\">&lt;script&gt;x&lt;/script&gt; \u{2713}</li>"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("Press 1"));
    }

    #[test]
    fn test_empty_document() {
        let view = PanelView::from_document(&QuizDocument::empty());
        assert!(view.is_empty());
        assert_eq!(render_text(&view), "");
        assert_eq!(render_html(&view), "<div id=\"xml-entries\"></div>");
    }
}
