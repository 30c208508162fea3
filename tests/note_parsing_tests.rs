// Note payload parsing tests
//
// The generation service may answer with plain text, bare JSON, or JSON in
// a fenced code block. Parsing must never fail; anything unparseable
// degrades to a plain-text note.

use scribe_core::pipeline::parse_note_payload;

#[test]
fn fenced_json_block_yields_structured_note_and_clean_text() {
    let note = parse_note_payload("```json\n{\"subjective\":\"x\"}\n```");

    assert_eq!(note.text, "{\"subjective\":\"x\"}");
    let structured = note.structured.expect("structured form");
    assert_eq!(structured["subjective"], "x");
}

#[test]
fn untagged_fence_is_also_accepted() {
    let note = parse_note_payload("```\n{\"plan\":\"rest\"}\n```");

    assert_eq!(note.text, "{\"plan\":\"rest\"}");
    assert!(note.structured.is_some());
}

#[test]
fn fence_with_surrounding_prose_still_parses() {
    let note = parse_note_payload("  ```json\n{\"assessment\":\"stable\"}\n```  ");
    assert_eq!(note.text, "{\"assessment\":\"stable\"}");
}

#[test]
fn prose_before_the_fence_is_discarded() {
    let note =
        parse_note_payload("Here is the note:\n```json\n{\"plan\":\"increase dose\"}\n```");

    assert_eq!(note.text, "{\"plan\":\"increase dose\"}");
    let structured = note.structured.expect("structured form");
    assert_eq!(structured["plan"], "increase dose");
}

#[test]
fn bare_json_parses_directly() {
    let note = parse_note_payload("{\"objective\":\"bp 120/80\"}");

    assert_eq!(note.text, "{\"objective\":\"bp 120/80\"}");
    assert!(note.structured.is_some());
}

#[test]
fn plain_text_stays_plain() {
    let note = parse_note_payload("Patient seen today for follow-up.");

    assert_eq!(note.text, "Patient seen today for follow-up.");
    assert!(note.structured.is_none());
}

#[test]
fn malformed_fenced_json_degrades_to_plain_text() {
    let raw = "```json\n{\"subjective\": broken\n```";
    let note = parse_note_payload(raw);

    assert_eq!(note.text, raw.trim());
    assert!(note.structured.is_none());
}

#[test]
fn non_json_fence_language_is_treated_as_text() {
    let raw = "```markdown\n# Note\n```";
    let note = parse_note_payload(raw);

    assert!(note.structured.is_none());
    assert_eq!(note.text, raw);
}

#[test]
fn scalar_json_is_not_a_structured_note() {
    let note = parse_note_payload("42");
    assert!(note.structured.is_none());
    assert_eq!(note.text, "42");
}

#[test]
fn unterminated_fence_is_plain_text() {
    let raw = "```json\n{\"subjective\":\"x\"}";
    let note = parse_note_payload(raw);
    assert!(note.structured.is_none());
}
