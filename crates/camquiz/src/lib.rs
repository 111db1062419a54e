//! camquiz — quiz extraction for interactive-video descriptor XML.

pub mod extract;
pub mod render;
pub mod types;
pub mod xml;

pub use extract::{decode_answer_index, extract_quizzes};
pub use render::{render_html, render_text, AnswerView, PanelView, QuestionView, SectionView};
pub use types::*;
pub use xml::{parse_document, XmlElement};
