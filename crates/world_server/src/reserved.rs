//! Reserved visual-identifier table.
//!
//! Some `(text, color)` combinations are claimed by the console renderer and
//! can never be handed to a client: the error marker, the session counters
//! drawn in yellow, and (when White is the background color) anything that
//! would be indistinguishable from map tiles or empty cells. Validation is
//! pure; the table is compiled once per world at startup.

use crate::error::ServerError;
use regex::Regex;
use std::collections::HashSet;
use wayfarer_event_system::{ConsoleColor, VisualIdentifier};

/// Per-world table of reserved visual identifiers.
#[derive(Debug)]
pub struct ReservedIdentifiers {
    patterns: Vec<(Regex, ConsoleColor)>,
    /// Tile glyphs present on the map, checked against White identifiers.
    background_glyphs: HashSet<String>,
    /// True when the world's sink renders on a White background.
    white_background: bool,
}

impl ReservedIdentifiers {
    /// Compiles the reserved table for one world.
    ///
    /// # Arguments
    ///
    /// * `white_background` - Whether the world's sink treats White as the
    ///   console background (true for the visualized world)
    /// * `map_glyphs` - Distinct tile glyphs present on the world's map
    pub fn new(
        white_background: bool,
        map_glyphs: HashSet<String>,
    ) -> Result<Self, ServerError> {
        // Partial-match semantics: a Yellow identifier is reserved if its
        // text merely contains a digit or "Hi", not only when it equals one.
        let sources = [("^EE$", ConsoleColor::Red), (r"\d+|Hi", ConsoleColor::Yellow)];
        let mut patterns = Vec::with_capacity(sources.len());
        for (source, color) in sources {
            let regex = Regex::new(source)
                .map_err(|e| ServerError::Internal(format!("Bad reserved pattern {source}: {e}")))?;
            patterns.push((regex, color));
        }
        Ok(Self {
            patterns,
            background_glyphs: map_glyphs,
            white_background,
        })
    }

    /// Returns true if `identifier` is reserved and must be rejected.
    pub fn is_reserved(&self, identifier: &VisualIdentifier) -> bool {
        for (pattern, color) in &self.patterns {
            if *color == identifier.color() && pattern.is_match(identifier.text()) {
                return true;
            }
        }
        if self.white_background && identifier.color() == ConsoleColor::White {
            let text = identifier.text();
            if text.chars().all(|c| c == ' ') {
                return true;
            }
            if self.background_glyphs.contains(text) {
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(white_background: bool) -> ReservedIdentifiers {
        let mut glyphs = HashSet::new();
        glyphs.insert("##".to_string());
        ReservedIdentifiers::new(white_background, glyphs).unwrap()
    }

    fn vid(text: &str, color: ConsoleColor) -> VisualIdentifier {
        VisualIdentifier::new(text, color).unwrap()
    }

    #[test]
    fn error_marker_is_reserved_only_in_red() {
        let table = table(false);
        assert!(table.is_reserved(&vid("EE", ConsoleColor::Red)));
        assert!(!table.is_reserved(&vid("EE", ConsoleColor::Blue)));
        assert!(!table.is_reserved(&vid("E", ConsoleColor::Red)));
    }

    #[test]
    fn yellow_session_counters_are_reserved() {
        let table = table(false);
        assert!(table.is_reserved(&vid("7", ConsoleColor::Yellow)));
        assert!(table.is_reserved(&vid("42", ConsoleColor::Yellow)));
        assert!(table.is_reserved(&vid("Hi", ConsoleColor::Yellow)));
        assert!(!table.is_reserved(&vid("Ho", ConsoleColor::Yellow)));
        assert!(!table.is_reserved(&vid("42", ConsoleColor::Green)));
    }

    #[test]
    fn yellow_reservation_matches_anywhere_in_the_text() {
        let table = table(false);
        assert!(table.is_reserved(&vid("1a", ConsoleColor::Yellow)));
        assert!(table.is_reserved(&vid("a1", ConsoleColor::Yellow)));
        assert!(!table.is_reserved(&vid("ab", ConsoleColor::Yellow)));
        assert!(!table.is_reserved(&vid("1a", ConsoleColor::Blue)));
    }

    #[test]
    fn white_collisions_apply_only_on_white_background() {
        let visualized = table(true);
        assert!(visualized.is_reserved(&vid("##", ConsoleColor::White)));
        assert!(visualized.is_reserved(&vid(" ", ConsoleColor::White)));
        assert!(visualized.is_reserved(&vid("  ", ConsoleColor::White)));
        assert!(!visualized.is_reserved(&vid("##", ConsoleColor::Gray)));
        assert!(!visualized.is_reserved(&vid("ok", ConsoleColor::White)));

        let headless = table(false);
        assert!(!headless.is_reserved(&vid("##", ConsoleColor::White)));
        assert!(!headless.is_reserved(&vid(" ", ConsoleColor::White)));
    }
}
