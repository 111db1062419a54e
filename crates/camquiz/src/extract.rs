//! Quiz extraction from interactive-video descriptor XML.
//!
//! The descriptor is an XMP packet. Quizzes live in a track of type `Quiz`
//! under `xmpDM:Tracks`; each marker of that track carries one question set,
//! and each question set lists its questions under `tscIQ:questions`:
//!
//! ```text
//! xmpDM:Tracks
//! └─ rdf:Description  xmpDM:trackType="Quiz"
//!    └─ xmpDM:markers
//!       └─ rdf:Description  tscIQ:questionSetName="..."
//!          └─ tscIQ:questions
//!             └─ rdf:Description  tscIQ:type="MC"
//!                ├─ tscIQ:question
//!                ├─ tscIQ:answer (repeated)
//!                └─ tscIQ:correctAnswer
//! ```
//!
//! Containers are searched by descendant, since XMP wraps descriptions in
//! `rdf:Bag` / `rdf:Seq` / `rdf:li`.

use crate::types::{QuizDocument, QuizError, QuizResult, QuizSection, Question};
use crate::xml::{parse_document, XmlElement};

/// Namespace URIs used by the descriptor schema.
pub mod ns {
    /// XMP dynamic media.
    pub const DYNAMIC_MEDIA: &str = "http://ns.adobe.com/xmp/1.0/DynamicMedia/";
    /// RDF syntax.
    pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
    /// TechSmith quiz interchange.
    pub const QUIZ: &str = "http://www.techsmith.com/xmp/tscIQ/";
}

/// Track type carrying quiz markers.
pub const QUIZ_TRACK_TYPE: &str = "Quiz";

/// Question type for single-select multiple choice.
pub const MULTIPLE_CHOICE: &str = "MC";

/// Parse a descriptor and extract its quizzes.
///
/// Fails only when `xml` is not well-formed. A document without the
/// expected namespaces or containers yields an empty [`QuizDocument`].
pub fn extract_quizzes(xml: &str) -> QuizResult<QuizDocument> {
    let root = parse_document(xml)?;
    Ok(QuizDocument::from_element(&root))
}

impl QuizDocument {
    /// Extract quizzes from an already parsed descriptor tree.
    pub fn from_element(root: &XmlElement) -> Self {
        let tracks = if root.is(ns::DYNAMIC_MEDIA, "Tracks") {
            Some(root)
        } else {
            root.first_descendant_ns(ns::DYNAMIC_MEDIA, "Tracks")
        };

        let Some(tracks) = tracks else {
            tracing::debug!("descriptor has no xmpDM:Tracks");
            return Self::empty();
        };

        let sections = tracks
            .descendants_ns(ns::RDF, "Description")
            .into_iter()
            .filter(|track| {
                track.attribute_ns(ns::DYNAMIC_MEDIA, "trackType") == Some(QUIZ_TRACK_TYPE)
            })
            .flat_map(quiz_track_sections)
            .collect();

        Self { sections }
    }
}

/// All non-empty question sets of one quiz track.
fn quiz_track_sections(track: &XmlElement) -> Vec<QuizSection> {
    let Some(markers) = track.first_descendant_ns(ns::DYNAMIC_MEDIA, "markers") else {
        return Vec::new();
    };

    markers
        .descendants_ns(ns::RDF, "Description")
        .into_iter()
        .filter_map(extract_section)
        .collect()
}

fn extract_section(marker: &XmlElement) -> Option<QuizSection> {
    let name = marker.attribute_ns(ns::QUIZ, "questionSetName")?;

    let questions: Vec<Question> = marker
        .first_descendant_ns(ns::QUIZ, "questions")
        .map(|container| {
            container
                .descendants_ns(ns::RDF, "Description")
                .into_iter()
                .filter(|q| q.attribute_ns(ns::QUIZ, "type") == Some(MULTIPLE_CHOICE))
                .filter_map(|q| match extract_question(q) {
                    Ok(question) => Some(question),
                    Err(e) => {
                        tracing::debug!(section = name, "skipping question: {e}");
                        None
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    if questions.is_empty() {
        return None;
    }

    Some(QuizSection {
        name: Some(name.to_string()),
        questions,
    })
}

fn extract_question(desc: &XmlElement) -> QuizResult<Question> {
    let prompt = desc
        .first_descendant_ns(ns::QUIZ, "question")
        .map(XmlElement::text_content);

    let answers = desc
        .descendants_ns(ns::QUIZ, "answer")
        .into_iter()
        .map(XmlElement::text_content)
        .collect();

    let raw_code = desc
        .first_descendant_ns(ns::QUIZ, "correctAnswer")
        .map(XmlElement::text_content)
        .unwrap_or_default();

    Ok(Question {
        prompt,
        answers,
        correct_answer_index: decode_answer_index(&raw_code)?,
    })
}

/// Convert a coded correct answer into a zero-based index.
///
/// The schema stores the correct answer as a single set bit
/// (1, 2, 4, 8, ... for answers 0, 1, 2, 3, ...), so the index is the
/// base-2 logarithm of the code. Anything but a positive power of two is
/// rejected.
pub fn decode_answer_index(raw: &str) -> QuizResult<usize> {
    let malformed = || QuizError::MalformedAnswerCode(raw.to_string());

    let code: i64 = raw.trim().parse().map_err(|_| malformed())?;
    if code <= 0 {
        return Err(malformed());
    }

    let code = code as u64;
    if !code.is_power_of_two() {
        return Err(malformed());
    }

    Ok(code.trailing_zeros() as usize)
}
