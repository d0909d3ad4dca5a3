//! Inline formatting-marker stripping.
//!
//! Server lines carry two-character formatting escapes: a marker character
//! followed by a single code character. Pattern matching runs on the
//! stripped (canonical) text; the raw text is kept for the display path.

use std::borrow::Cow;

/// Marker character introducing a two-character formatting escape.
pub const FORMAT_MARKER: char = '\u{00a7}';

/// Strip formatting escapes from a line.
///
/// Removal is lossless with respect to plain content: only the marker and
/// its single code character are dropped. A marker at the end of the text
/// with no code character is dropped alone. Marker-free input is returned
/// borrowed, without allocating.
pub fn strip_markup(text: &str) -> Cow<'_, str> {
    if !text.contains(FORMAT_MARKER) {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == FORMAT_MARKER {
            // Swallow the code character too.
            chars.next();
        } else {
            out.push(c);
        }
    }
    Cow::Owned(out)
}
