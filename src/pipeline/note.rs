use serde_json::Value;

use crate::session::GeneratedNote;

/// Parse the raw payload returned by the note-generation service.
///
/// The service may return plain text, bare JSON, or JSON wrapped in a fenced
/// code block. In the fenced case the unfenced inner text becomes the
/// canonical note string. Parsing never fails: anything unparseable degrades
/// to a plain-text note with no structured form.
pub fn parse_note_payload(raw: &str) -> GeneratedNote {
    let trimmed = raw.trim();

    if let Some(inner) = extract_fenced_json(trimmed) {
        if let Some(structured) = parse_structured(inner) {
            return GeneratedNote {
                text: inner.to_string(),
                structured: Some(structured),
            };
        }
        return GeneratedNote::plain(trimmed);
    }

    match parse_structured(trimmed) {
        Some(structured) => GeneratedNote {
            text: trimmed.to_string(),
            structured: Some(structured),
        },
        None => GeneratedNote::plain(trimmed),
    }
}

/// Accept only JSON objects and arrays as a structured note; a payload that
/// happens to parse as a bare scalar is still prose.
fn parse_structured(text: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(text) {
        Ok(value @ (Value::Object(_) | Value::Array(_))) => Some(value),
        _ => None,
    }
}

/// Extract the contents of the first ```json (or untagged ```) fence.
///
/// The fence may appear anywhere in the payload; services routinely preface
/// it with prose like "Here is the note:".
fn extract_fenced_json(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let rest = &text[start + 3..];

    let (tag, body) = match rest.find('\n') {
        Some(pos) => (rest[..pos].trim(), &rest[pos + 1..]),
        None => return None,
    };

    if !tag.is_empty() && !tag.eq_ignore_ascii_case("json") {
        return None;
    }

    let end = body.rfind("```")?;
    Some(body[..end].trim())
}
