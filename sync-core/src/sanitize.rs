//! Pre-persist sanitization of completed quiz questions.
//!
//! A completed quiz is stored for history only, so heavy inline media is
//! stripped before it is written into the quiz slice:
//! - fields named in [`HEAVY_MEDIA_FIELDS`] are dropped outright
//! - `passage_image` / `explanation_image` survive only as a remote
//!   reference, a small SVG literal, or a value under [`MAX_FIELD_BYTES`]
//! - any other string field over [`MAX_FIELD_BYTES`] is dropped; an extra
//!   field is dropped whole when a string nested anywhere inside it is

use serde_json::Value;
use studysync_types::Question;

/// Byte ceiling for any persisted string field.
pub const MAX_FIELD_BYTES: usize = 50 * 1024;

/// Largest inline SVG kept in a whitelisted media field.
pub const MAX_SVG_LITERAL_BYTES: usize = 200 * 1024;

/// Extra-field names that always carry inline binary payloads.
pub const HEAVY_MEDIA_FIELDS: &[&str] = &[
    "image_data",
    "imageData",
    "audio_data",
    "audioData",
    "video_data",
    "videoData",
    "base64_image",
    "base64Image",
    "raw_image",
    "rawImage",
    "pdf_data",
    "pdfData",
    "image_blob",
    "imageBlob",
    "attachments",
];

const REMOTE_PREFIXES: &[&str] = &["https://", "http://", "gs://"];
const SVG_PREFIX: &str = "data:image/svg+xml";

/// Whether a media value points at remote storage.
pub fn is_remote_reference(value: &str) -> bool {
    REMOTE_PREFIXES.iter().any(|p| value.starts_with(p))
}

/// Whether a media value is an inline SVG small enough to keep.
pub fn is_small_svg_literal(value: &str) -> bool {
    value.starts_with(SVG_PREFIX) && value.len() <= MAX_SVG_LITERAL_BYTES
}

/// Whether a whitelisted media value may be persisted.
pub fn keep_media(value: &str) -> bool {
    is_remote_reference(value) || is_small_svg_literal(value) || value.len() <= MAX_FIELD_BYTES
}

fn over_ceiling(value: &str) -> bool {
    value.len() > MAX_FIELD_BYTES
}

/// Whether any string inside `value`, at any depth, is over the ceiling.
fn holds_oversized(value: &Value) -> bool {
    match value {
        Value::String(s) => over_ceiling(s),
        Value::Array(items) => items.iter().any(holds_oversized),
        Value::Object(map) => map.values().any(holds_oversized),
        _ => false,
    }
}

fn drop_if_oversized(field: &mut Option<String>, name: &str, dropped: &mut Vec<String>) {
    if field.as_deref().is_some_and(over_ceiling) {
        *field = None;
        dropped.push(name.to_string());
    }
}

fn drop_media_unless_kept(field: &mut Option<String>, name: &str, dropped: &mut Vec<String>) {
    if field.as_deref().is_some_and(|v| !keep_media(v)) {
        *field = None;
        dropped.push(name.to_string());
    }
}

/// Strip heavy fields from a question in place.
///
/// Returns the names of the dropped fields.
pub fn sanitize_question(question: &mut Question) -> Vec<String> {
    let mut dropped = Vec::new();

    drop_if_oversized(&mut question.question_text, "question_text", &mut dropped);
    drop_if_oversized(&mut question.correct_answer, "correct_answer", &mut dropped);
    drop_if_oversized(&mut question.explanation, "explanation", &mut dropped);
    drop_if_oversized(&mut question.category, "category", &mut dropped);
    drop_if_oversized(&mut question.user_answer, "user_answer", &mut dropped);

    drop_media_unless_kept(&mut question.passage_image, "passage_image", &mut dropped);
    drop_media_unless_kept(
        &mut question.explanation_image,
        "explanation_image",
        &mut dropped,
    );

    let before = question.options.len();
    question.options.retain(|opt| !over_ceiling(opt));
    if question.options.len() != before {
        dropped.push("options".to_string());
    }

    question.extra.retain(|name, value| {
        let heavy = HEAVY_MEDIA_FIELDS.contains(&name.as_str());
        if heavy || holds_oversized(value) {
            dropped.push(name.clone());
            false
        } else {
            true
        }
    });

    dropped
}

/// Sanitize every question, returning the total number of dropped fields.
pub fn sanitize_questions(questions: &mut [Question]) -> usize {
    questions
        .iter_mut()
        .map(|q| sanitize_question(q).len())
        .sum()
}
