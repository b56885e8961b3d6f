//! # Core Type Definitions
//!
//! This module contains the fundamental types used throughout the Wayfarer
//! event system: identifiers, grid math, tiles, and the console palette used
//! to render agents.
//!
//! ## Key Types
//!
//! - [`SessionId`] - Opaque, process-unique identifier for a session
//! - [`ClientId`] - Peer identity derived from the remote `ip:port`
//! - [`Vector`] - Integer 2D displacement / position
//! - [`Tile`] - Two-character map glyph
//! - [`VisualIdentifier`] - `(text, color)` pair used for presentation
//!
//! ## Design Principles
//!
//! - **Type Safety**: Wrapper types prevent ID confusion (SessionId vs ClientId)
//! - **Serialization**: All types support JSON serialization for the wire protocol
//! - **Immutability**: Values are cheap to copy and never mutated in place

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Opaque identifier for a session, unique for the process lifetime.
///
/// This is a wrapper around UUID that provides type safety and ensures
/// session IDs cannot be confused with other kinds of IDs in the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Creates a new random session ID using UUID v4.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses a session ID from its string representation.
    ///
    /// # Arguments
    ///
    /// * `s` - A string slice containing a valid UUID
    ///
    /// # Returns
    ///
    /// Returns `Ok(SessionId)` if the string is a valid UUID, otherwise
    /// `Err(uuid::Error)` with details about the parsing failure.
    pub fn from_str(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }
}

impl std::str::FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str(s)
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a connecting client, derived server-side from the peer socket.
///
/// The value is the remote endpoint formatted as `ip:port`. Anything a client
/// may claim about its own identity is ignored; the connection handler always
/// injects this value from the accepted socket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientId(String);

impl ClientId {
    /// Returns the underlying `ip:port` string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<std::net::SocketAddr> for ClientId {
    fn from(addr: std::net::SocketAddr) -> Self {
        Self(addr.to_string())
    }
}

impl From<&str> for ClientId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Grid math
// ============================================================================

/// Integer 2D vector used for both positions and movement deltas.
///
/// Sum and difference are defined component-wise. Positions are grid
/// coordinates with `(0, 0)` at the spawn corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Vector {
    pub x: i64,
    pub y: i64,
}

impl Vector {
    /// The zero vector, which is also the fixed spawn position.
    pub const ZERO: Vector = Vector { x: 0, y: 0 };

    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

impl std::ops::Add for Vector {
    type Output = Vector;

    fn add(self, rhs: Vector) -> Vector {
        Vector::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::AddAssign for Vector {
    fn add_assign(&mut self, rhs: Vector) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl std::ops::Sub for Vector {
    type Output = Vector;

    fn sub(self, rhs: Vector) -> Vector {
        Vector::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::fmt::Display for Vector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// ============================================================================
// Tiles and glyphs
// ============================================================================

/// Returns true if `c` may appear in a tile or visual identifier.
///
/// Admissible glyphs are printable, non-control characters outside the
/// emoji blocks (emoji render double-width on consoles and would break the
/// two-column cell layout).
pub fn is_admissible_glyph(c: char) -> bool {
    if c.is_control() {
        return false;
    }
    let cp = c as u32;
    // Misc symbols / dingbats, the emoji planes, and variation selectors.
    !matches!(cp,
        0x2600..=0x27BF
        | 0x1F000..=0x1FAFF
        | 0xFE00..=0xFE0F
        | 0x200D)
}

/// Errors raised when constructing a [`Tile`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TileError {
    #[error("Tile string must have exactly 2 characters.")]
    Length,
    #[error("Tile contains an inadmissible character.")]
    InadmissibleGlyph,
}

/// A two-character map glyph.
///
/// A grid cell either holds a tile (lethal trap) or nothing. Serialized form
/// on the wire is `{ "str": "<2 chars>" }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "TileWire", into = "TileWire")]
pub struct Tile {
    left: char,
    right: char,
}

impl Tile {
    /// Builds a tile from a two-character string.
    pub fn new(s: &str) -> Result<Self, TileError> {
        let mut chars = s.chars();
        let (left, right) = match (chars.next(), chars.next(), chars.next()) {
            (Some(l), Some(r), None) => (l, r),
            _ => return Err(TileError::Length),
        };
        if !is_admissible_glyph(left) || !is_admissible_glyph(right) {
            return Err(TileError::InadmissibleGlyph);
        }
        Ok(Self { left, right })
    }

    pub fn left(&self) -> char {
        self.left
    }

    pub fn right(&self) -> char {
        self.right
    }
}

impl std::fmt::Display for Tile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.left, self.right)
    }
}

/// Wire representation of a tile: `{ "str": "##" }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileWire {
    #[serde(rename = "str")]
    pub glyphs: String,
}

impl TryFrom<TileWire> for Tile {
    type Error = TileError;

    fn try_from(wire: TileWire) -> Result<Self, TileError> {
        Tile::new(&wire.glyphs)
    }
}

impl From<Tile> for TileWire {
    fn from(tile: Tile) -> Self {
        TileWire {
            glyphs: tile.to_string(),
        }
    }
}

// ============================================================================
// Console palette
// ============================================================================

/// Console color used to render a visual identifier.
///
/// The names mirror the classic 16-color console palette and are serialized
/// verbatim on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConsoleColor {
    Black,
    DarkBlue,
    DarkGreen,
    DarkCyan,
    DarkRed,
    DarkMagenta,
    DarkYellow,
    Gray,
    DarkGray,
    Blue,
    Green,
    Cyan,
    Red,
    Magenta,
    Yellow,
    White,
}

impl std::fmt::Display for ConsoleColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ConsoleColor::Black => "Black",
            ConsoleColor::DarkBlue => "DarkBlue",
            ConsoleColor::DarkGreen => "DarkGreen",
            ConsoleColor::DarkCyan => "DarkCyan",
            ConsoleColor::DarkRed => "DarkRed",
            ConsoleColor::DarkMagenta => "DarkMagenta",
            ConsoleColor::DarkYellow => "DarkYellow",
            ConsoleColor::Gray => "Gray",
            ConsoleColor::DarkGray => "DarkGray",
            ConsoleColor::Blue => "Blue",
            ConsoleColor::Green => "Green",
            ConsoleColor::Cyan => "Cyan",
            ConsoleColor::Red => "Red",
            ConsoleColor::Magenta => "Magenta",
            ConsoleColor::Yellow => "Yellow",
            ConsoleColor::White => "White",
        };
        write!(f, "{name}")
    }
}

// ============================================================================
// Visual identifiers
// ============================================================================

/// Errors raised when constructing a [`VisualIdentifier`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierError {
    #[error("Identifier string can be 2 characters at most.")]
    TooLong,
    #[error("Identifier string must not be empty.")]
    Empty,
    #[error("Identifier contains an inadmissible character.")]
    InadmissibleGlyph,
}

/// Visual identifier rendered for an agent: 1-2 display characters plus a
/// console color.
///
/// Uniqueness among live sessions of a world is enforced by the registry,
/// not here; construction only validates the shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VisualIdentifier {
    text: String,
    color: ConsoleColor,
}

impl VisualIdentifier {
    /// Validates and builds a visual identifier.
    ///
    /// The text must be one or two admissible characters; the caller is
    /// expected to have sanitized whitespace and control characters first.
    pub fn new(text: impl Into<String>, color: ConsoleColor) -> Result<Self, IdentifierError> {
        let text = text.into();
        let count = text.chars().count();
        if count == 0 {
            return Err(IdentifierError::Empty);
        }
        if count > 2 {
            return Err(IdentifierError::TooLong);
        }
        if !text.chars().all(is_admissible_glyph) {
            return Err(IdentifierError::InadmissibleGlyph);
        }
        Ok(Self { text, color })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn color(&self) -> ConsoleColor {
        self.color
    }
}

impl std::fmt::Display for VisualIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "'{}' in {}", self.text, self.color)
    }
}

// ============================================================================
// Death reasons
// ============================================================================

/// Why an agent died. The serialized form is the exact human-readable string
/// reported to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathReason {
    #[serde(rename = "Wandered out of the map")]
    OutOfBounds,
    #[serde(rename = "Stepped on a trap")]
    Trap,
    #[serde(rename = "Inactive for too long")]
    Idle,
}

impl std::fmt::Display for DeathReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            DeathReason::OutOfBounds => "Wandered out of the map",
            DeathReason::Trap => "Stepped on a trap",
            DeathReason::Idle => "Inactive for too long",
        };
        write!(f, "{text}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ids_are_unique() {
        let a = SessionId::new();
        let b = SessionId::new();
        assert_ne!(a, b);
        assert_eq!(SessionId::from_str(&a.to_string()).unwrap(), a);
    }

    #[test]
    fn vector_arithmetic() {
        let a = Vector::new(1, -2);
        let b = Vector::new(3, 4);
        assert_eq!(a + b, Vector::new(4, 2));
        assert_eq!(b - a, Vector::new(2, 6));
        assert_eq!(Vector::ZERO + a, a);
    }

    #[test]
    fn tile_requires_exactly_two_admissible_chars() {
        assert!(Tile::new("##").is_ok());
        assert!(Tile::new("[]").is_ok());
        assert_eq!(Tile::new("#"), Err(TileError::Length));
        assert_eq!(Tile::new("###"), Err(TileError::Length));
        assert_eq!(Tile::new("a\u{0007}"), Err(TileError::InadmissibleGlyph));
        assert_eq!(Tile::new("🙂!"), Err(TileError::InadmissibleGlyph));
    }

    #[test]
    fn tile_serializes_as_str_object() {
        let tile = Tile::new("##").unwrap();
        let json = serde_json::to_string(&tile).unwrap();
        assert_eq!(json, r###"{"str":"##"}"###);
        let back: Tile = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tile);
    }

    #[test]
    fn color_names_round_trip() {
        for (color, name) in [
            (ConsoleColor::DarkMagenta, "\"DarkMagenta\""),
            (ConsoleColor::White, "\"White\""),
            (ConsoleColor::Yellow, "\"Yellow\""),
        ] {
            assert_eq!(serde_json::to_string(&color).unwrap(), name);
            let back: ConsoleColor = serde_json::from_str(name).unwrap();
            assert_eq!(back, color);
        }
        assert!(serde_json::from_str::<ConsoleColor>("\"Pink\"").is_err());
    }

    #[test]
    fn visual_identifier_shape_checks() {
        assert!(VisualIdentifier::new("[]", ConsoleColor::Magenta).is_ok());
        assert!(VisualIdentifier::new("x", ConsoleColor::Blue).is_ok());
        assert_eq!(
            VisualIdentifier::new("abc", ConsoleColor::Blue),
            Err(IdentifierError::TooLong)
        );
        assert_eq!(
            VisualIdentifier::new("", ConsoleColor::Blue),
            Err(IdentifierError::Empty)
        );
    }

    #[test]
    fn death_reason_strings_are_exact() {
        assert_eq!(
            serde_json::to_string(&DeathReason::OutOfBounds).unwrap(),
            "\"Wandered out of the map\""
        );
        assert_eq!(DeathReason::Trap.to_string(), "Stepped on a trap");
        assert_eq!(DeathReason::Idle.to_string(), "Inactive for too long");
    }
}
