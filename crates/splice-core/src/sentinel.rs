//! In-band markers that tell the model where the cursor or selection is.

/// Marks the cursor position in a completion prompt.
pub const CURSOR_MARKER: &str = "[CURSOR]";

/// Wraps the selected code in an optimize prompt (same token on both sides).
pub const SELECTION_MARKER: &str = "<CURSOR_SELECTION>";

/// Insert the cursor marker at a byte offset (clamped to the text length).
pub fn mark_cursor(text: &str, offset: usize) -> String {
    let offset = floor_char_boundary(text, offset);
    let mut out = String::with_capacity(text.len() + CURSOR_MARKER.len());
    out.push_str(&text[..offset]);
    out.push_str(CURSOR_MARKER);
    out.push_str(&text[offset..]);
    out
}

/// Wrap the byte span `start..end` with selection markers.
pub fn mark_selection(text: &str, start: usize, end: usize) -> String {
    let start = floor_char_boundary(text, start);
    let end = floor_char_boundary(text, end).max(start);
    let mut out = String::with_capacity(text.len() + SELECTION_MARKER.len() * 2);
    out.push_str(&text[..start]);
    out.push_str(SELECTION_MARKER);
    out.push_str(&text[start..end]);
    out.push_str(SELECTION_MARKER);
    out.push_str(&text[end..]);
    out
}

/// Remove every marker the model may have echoed back.
pub fn strip_markers(text: &str) -> String {
    text.replace(SELECTION_MARKER, "").replace(CURSOR_MARKER, "")
}

fn floor_char_boundary(text: &str, offset: usize) -> usize {
    let mut offset = offset.min(text.len());
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}
