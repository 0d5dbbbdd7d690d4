use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// One of the four directional signals a code is made of
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    #[strum(serialize = "UP")]
    Up,
    #[strum(serialize = "DOWN")]
    Down,
    #[strum(serialize = "LEFT")]
    Left,
    #[strum(serialize = "RIGHT")]
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Compact letter used by the catalog table and the CLI
    pub fn letter(self) -> char {
        match self {
            Direction::Up => 'U',
            Direction::Down => 'D',
            Direction::Left => 'L',
            Direction::Right => 'R',
        }
    }

    pub fn from_letter(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'U' => Some(Direction::Up),
            'D' => Some(Direction::Down),
            'L' => Some(Direction::Left),
            'R' => Some(Direction::Right),
            _ => None,
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            Direction::Up => "↑",
            Direction::Down => "↓",
            Direction::Left => "←",
            Direction::Right => "→",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodeParseError {
    #[error("code must contain at least one direction")]
    Empty,

    #[error("invalid direction letter {letter:?} at position {position}")]
    InvalidLetter { letter: char, position: usize },
}

/// Parse a compact code such as `"UDRL"` into directions
pub fn parse_code(code: &str) -> Result<Vec<Direction>, CodeParseError> {
    let parsed = code
        .chars()
        .filter(|c| !c.is_whitespace())
        .enumerate()
        .map(|(position, letter)| {
            Direction::from_letter(letter).ok_or(CodeParseError::InvalidLetter { letter, position })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if parsed.is_empty() {
        return Err(CodeParseError::Empty);
    }
    Ok(parsed)
}

pub fn format_arrows(code: &[Direction]) -> String {
    code.iter().map(|d| d.arrow()).join(" ")
}

pub fn format_letters(code: &[Direction]) -> String {
    code.iter().map(|d| d.letter()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_roundtrip_for_every_direction() {
        for d in Direction::ALL {
            assert_eq!(Direction::from_letter(d.letter()), Some(d));
        }
        assert_eq!(Direction::from_letter('u'), Some(Direction::Up));
        assert_eq!(Direction::from_letter('x'), None);
    }

    #[test]
    fn parse_code_reads_letters_in_order() {
        let code = parse_code("UDRL").unwrap();
        assert_eq!(
            code,
            vec![
                Direction::Up,
                Direction::Down,
                Direction::Right,
                Direction::Left
            ]
        );
    }

    #[test]
    fn parse_code_rejects_bad_input() {
        assert_eq!(parse_code(""), Err(CodeParseError::Empty));
        assert_eq!(parse_code("  "), Err(CodeParseError::Empty));
        assert_eq!(
            parse_code("UDX"),
            Err(CodeParseError::InvalidLetter {
                letter: 'X',
                position: 2
            })
        );
    }

    #[test]
    fn display_uses_upper_case_names() {
        assert_eq!(Direction::Up.to_string(), "UP");
        assert_eq!(Direction::Right.to_string(), "RIGHT");
    }

    #[test]
    fn formatting_helpers() {
        let code = parse_code("URD").unwrap();
        assert_eq!(format_arrows(&code), "↑ → ↓");
        assert_eq!(format_letters(&code), "URD");
    }

    #[test]
    fn serde_uses_upper_case_names() {
        let json = serde_json::to_string(&Direction::Left).unwrap();
        assert_eq!(json, "\"LEFT\"");
        let back: Direction = serde_json::from_str("\"DOWN\"").unwrap();
        assert_eq!(back, Direction::Down);
    }
}
