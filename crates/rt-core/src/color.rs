//! Console color grammar
//!
//! Child output is rendered in one of the 16 classic console colors. A
//! color spec may be written as:
//!
//! - a name (`red`, `DarkCyan`, `dark-cyan`) or short alias (`dc`, `blk`)
//! - a palette index `0`..=`15`
//! - an SGR foreground code, `ansi:91`
//! - hex, `#f00` or `#ff0000`
//! - a decimal triple, `255,0,0`
//!
//! Hex and triples snap to the nearest palette entry by squared RGB
//! distance; ties go to the entry that comes first in palette order.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The 16-color console palette, in palette index order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConsoleColor {
    Black = 0,
    DarkBlue = 1,
    DarkGreen = 2,
    DarkCyan = 3,
    DarkRed = 4,
    DarkMagenta = 5,
    DarkYellow = 6,
    Gray = 7,
    DarkGray = 8,
    Blue = 9,
    Green = 10,
    Cyan = 11,
    Red = 12,
    Magenta = 13,
    Yellow = 14,
    White = 15,
}

impl ConsoleColor {
    /// All palette entries in index order
    pub const ALL: [ConsoleColor; 16] = [
        ConsoleColor::Black,
        ConsoleColor::DarkBlue,
        ConsoleColor::DarkGreen,
        ConsoleColor::DarkCyan,
        ConsoleColor::DarkRed,
        ConsoleColor::DarkMagenta,
        ConsoleColor::DarkYellow,
        ConsoleColor::Gray,
        ConsoleColor::DarkGray,
        ConsoleColor::Blue,
        ConsoleColor::Green,
        ConsoleColor::Cyan,
        ConsoleColor::Red,
        ConsoleColor::Magenta,
        ConsoleColor::Yellow,
        ConsoleColor::White,
    ];

    /// Palette entry by index
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    /// Reference RGB value of this palette entry
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            ConsoleColor::Black => (0, 0, 0),
            ConsoleColor::DarkBlue => (0, 0, 128),
            ConsoleColor::DarkGreen => (0, 128, 0),
            ConsoleColor::DarkCyan => (0, 128, 128),
            ConsoleColor::DarkRed => (128, 0, 0),
            ConsoleColor::DarkMagenta => (128, 0, 128),
            ConsoleColor::DarkYellow => (128, 128, 0),
            ConsoleColor::Gray => (192, 192, 192),
            ConsoleColor::DarkGray => (128, 128, 128),
            ConsoleColor::Blue => (0, 0, 255),
            ConsoleColor::Green => (0, 255, 0),
            ConsoleColor::Cyan => (0, 255, 255),
            ConsoleColor::Red => (255, 0, 0),
            ConsoleColor::Magenta => (255, 0, 255),
            ConsoleColor::Yellow => (255, 255, 0),
            ConsoleColor::White => (255, 255, 255),
        }
    }

    /// Nearest palette entry to an RGB value
    pub fn nearest(r: u8, g: u8, b: u8) -> Self {
        let mut best = ConsoleColor::Gray;
        let mut best_distance = u32::MAX;
        for candidate in Self::ALL {
            let (cr, cg, cb) = candidate.rgb();
            let dr = i32::from(cr) - i32::from(r);
            let dg = i32::from(cg) - i32::from(g);
            let db = i32::from(cb) - i32::from(b);
            let distance = (dr * dr + dg * dg + db * db) as u32;
            if distance < best_distance {
                best_distance = distance;
                best = candidate;
            }
        }
        best
    }

    /// Palette entry for an SGR foreground code (30-37, 90-97).
    ///
    /// Unknown codes map to gray, the console default.
    pub fn from_sgr(code: u16) -> Self {
        match code {
            30 => ConsoleColor::Black,
            31 => ConsoleColor::DarkRed,
            32 => ConsoleColor::DarkGreen,
            33 => ConsoleColor::DarkYellow,
            34 => ConsoleColor::DarkBlue,
            35 => ConsoleColor::DarkMagenta,
            36 => ConsoleColor::DarkCyan,
            37 => ConsoleColor::Gray,
            90 => ConsoleColor::DarkGray,
            91 => ConsoleColor::Red,
            92 => ConsoleColor::Green,
            93 => ConsoleColor::Yellow,
            94 => ConsoleColor::Blue,
            95 => ConsoleColor::Magenta,
            96 => ConsoleColor::Cyan,
            97 => ConsoleColor::White,
            _ => ConsoleColor::Gray,
        }
    }

    /// Parse a color spec, returning `None` if it is not understood
    pub fn parse(spec: &str) -> Option<Self> {
        let spec = spec.trim();
        if spec.is_empty() {
            return None;
        }

        if let Some(color) = Self::from_name(spec) {
            return Some(color);
        }

        if let Ok(index) = spec.parse::<u8>() {
            return Self::from_index(index);
        }

        if let Some(code) = strip_prefix_ignore_case(spec, "ansi:") {
            if let Ok(code) = code.trim().parse::<u16>() {
                return Some(Self::from_sgr(code));
            }
            return None;
        }

        if let Some(hex) = spec.strip_prefix('#') {
            return parse_hex(hex).map(|(r, g, b)| Self::nearest(r, g, b));
        }

        let parts: Vec<&str> = spec.split(',').collect();
        if let [r, g, b] = parts.as_slice() {
            let r = r.trim().parse::<u8>().ok()?;
            let g = g.trim().parse::<u8>().ok()?;
            let b = b.trim().parse::<u8>().ok()?;
            return Some(Self::nearest(r, g, b));
        }

        None
    }

    /// Parse a color spec, keeping `previous` if it is not understood
    pub fn parse_or(spec: &str, previous: Self) -> Self {
        Self::parse(spec).unwrap_or(previous)
    }

    fn from_name(name: &str) -> Option<Self> {
        let normalized: String = name
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_lowercase();

        let color = match normalized.as_str() {
            "black" | "blk" => ConsoleColor::Black,
            "darkblue" | "db" => ConsoleColor::DarkBlue,
            "darkgreen" | "dg" => ConsoleColor::DarkGreen,
            "darkcyan" | "dc" => ConsoleColor::DarkCyan,
            "darkred" | "dr" => ConsoleColor::DarkRed,
            "darkmagenta" | "dm" => ConsoleColor::DarkMagenta,
            "darkyellow" | "dy" => ConsoleColor::DarkYellow,
            "gray" | "grey" => ConsoleColor::Gray,
            "darkgray" | "darkgrey" => ConsoleColor::DarkGray,
            "blue" => ConsoleColor::Blue,
            "green" => ConsoleColor::Green,
            "cyan" => ConsoleColor::Cyan,
            "red" => ConsoleColor::Red,
            "magenta" => ConsoleColor::Magenta,
            "yellow" => ConsoleColor::Yellow,
            "white" => ConsoleColor::White,
            _ => return None,
        };
        Some(color)
    }
}

impl fmt::Display for ConsoleColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Error returned when a color spec cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized color: {0}")]
pub struct UnknownColor(pub String);

impl FromStr for ConsoleColor {
    type Err = UnknownColor;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| UnknownColor(s.to_string()))
    }
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &s[prefix.len()..])
}

fn parse_hex(hex: &str) -> Option<(u8, u8, u8)> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        6 => Some((
            u8::from_str_radix(&hex[0..2], 16).ok()?,
            u8::from_str_radix(&hex[2..4], 16).ok()?,
            u8::from_str_radix(&hex[4..6], 16).ok()?,
        )),
        3 => {
            let digit = |i: usize| u8::from_str_radix(&hex[i..=i], 16).ok().map(|d| d * 17);
            Some((digit(0)?, digit(1)?, digit(2)?))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equivalent_specs_resolve_to_red() {
        for spec in ["#FF0000", "255,0,0", "red", "ansi:91", "12", "#f00", "RED"] {
            assert_eq!(ConsoleColor::parse(spec), Some(ConsoleColor::Red), "{}", spec);
        }
    }

    #[test]
    fn test_unparseable_falls_back() {
        assert_eq!(
            ConsoleColor::parse_or("chartreuse-ish", ConsoleColor::Cyan),
            ConsoleColor::Cyan
        );
        assert_eq!(ConsoleColor::parse_or("", ConsoleColor::Yellow), ConsoleColor::Yellow);
        assert_eq!(ConsoleColor::parse("ansi:red"), None);
        assert_eq!(ConsoleColor::parse("16"), None);
        assert_eq!(ConsoleColor::parse("#12345"), None);
        assert_eq!(ConsoleColor::parse("256,0,0"), None);
    }

    #[test]
    fn test_aliases_and_spellings() {
        assert_eq!(ConsoleColor::parse("dc"), Some(ConsoleColor::DarkCyan));
        assert_eq!(ConsoleColor::parse("blk"), Some(ConsoleColor::Black));
        assert_eq!(ConsoleColor::parse("dark-grey"), Some(ConsoleColor::DarkGray));
        assert_eq!(ConsoleColor::parse("DarkMagenta"), Some(ConsoleColor::DarkMagenta));
    }

    #[test]
    fn test_sgr_codes() {
        assert_eq!(ConsoleColor::parse("ansi:31"), Some(ConsoleColor::DarkRed));
        assert_eq!(ConsoleColor::parse("ANSI:97"), Some(ConsoleColor::White));
        assert_eq!(ConsoleColor::parse("ansi:1"), Some(ConsoleColor::Gray));
    }

    #[test]
    fn test_nearest_neighbor() {
        assert_eq!(ConsoleColor::parse("#101010"), Some(ConsoleColor::Black));
        assert_eq!(ConsoleColor::parse("200, 200, 200"), Some(ConsoleColor::Gray));
        assert_eq!(ConsoleColor::parse("#000090"), Some(ConsoleColor::DarkBlue));
    }

    #[test]
    fn test_ties_prefer_palette_order() {
        // (64,0,0) is equidistant from Black and DarkRed
        assert_eq!(ConsoleColor::nearest(64, 0, 0), ConsoleColor::Black);
    }

    #[test]
    fn test_index_round_trip() {
        for (i, color) in ConsoleColor::ALL.iter().enumerate() {
            assert_eq!(*color as usize, i);
            assert_eq!(ConsoleColor::from_index(i as u8), Some(*color));
        }
    }
}
