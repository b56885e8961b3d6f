//! Input sanitization for client-supplied display strings.
//!
//! Usernames and identifier texts arrive from untrusted clients and end up
//! in log lines and console cells, so control characters are stripped and
//! whitespace runs collapsed before anything downstream sees them.
//! Sanitization never gates request success; it only shapes what observers
//! are shown.

/// Maximum visible characters of a username before the tail is elided.
const USERNAME_DISPLAY_LIMIT: usize = 15;

/// Characters kept from a truncated username before the ellipsis.
const USERNAME_TRUNCATED_PREFIX: usize = 12;

/// Sanitizes a username for the `session_connected` notification payload.
///
/// Trims, collapses every whitespace run to a single space, strips control
/// characters, and elides the tail with `...` when the result exceeds 15
/// visible characters.
pub fn clean_username(raw: &str) -> String {
    let cleaned = collapse_whitespace(raw.trim());
    if cleaned.chars().count() > USERNAME_DISPLAY_LIMIT {
        let mut shortened: String = cleaned.chars().take(USERNAME_TRUNCATED_PREFIX).collect();
        shortened.push_str("...");
        shortened
    } else {
        cleaned
    }
}

/// Sanitizes the text of a visual identifier before validation.
///
/// Collapses whitespace runs and strips control characters; length and glyph
/// admissibility are checked by `VisualIdentifier` construction afterwards.
pub fn clean_identifier_text(raw: &str) -> String {
    collapse_whitespace(raw)
}

/// Collapses whitespace runs to single spaces and drops control characters.
fn collapse_whitespace(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut in_whitespace = false;
    for c in input.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                output.push(' ');
            }
            in_whitespace = true;
        } else if !c.is_control() {
            output.push(c);
            in_whitespace = false;
        }
    }
    output
}
