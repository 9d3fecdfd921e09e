//! The 3x3 grid of overlay positions.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Overlay position on a 3x3 grid.
///
/// Rows run top, middle, bottom (`0..=2`) and columns run left, middle,
/// right (`0..=2`). The default is bottom-right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Anchor {
    row: u8,
    col: u8,
}

impl Anchor {
    /// Top-left corner.
    pub const TOP_LEFT: Self = Self { row: 0, col: 0 };
    /// Top edge, horizontally centered.
    pub const TOP: Self = Self { row: 0, col: 1 };
    /// Top-right corner.
    pub const TOP_RIGHT: Self = Self { row: 0, col: 2 };
    /// Left edge, vertically centered.
    pub const LEFT: Self = Self { row: 1, col: 0 };
    /// Image center.
    pub const CENTER: Self = Self { row: 1, col: 1 };
    /// Right edge, vertically centered.
    pub const RIGHT: Self = Self { row: 1, col: 2 };
    /// Bottom-left corner.
    pub const BOTTOM_LEFT: Self = Self { row: 2, col: 0 };
    /// Bottom edge, horizontally centered.
    pub const BOTTOM: Self = Self { row: 2, col: 1 };
    /// Bottom-right corner.
    pub const BOTTOM_RIGHT: Self = Self { row: 2, col: 2 };

    /// All nine anchors in row-major order.
    pub const ALL: [Self; 9] = [
        Self::TOP_LEFT,
        Self::TOP,
        Self::TOP_RIGHT,
        Self::LEFT,
        Self::CENTER,
        Self::RIGHT,
        Self::BOTTOM_LEFT,
        Self::BOTTOM,
        Self::BOTTOM_RIGHT,
    ];

    const NAMES: [(&'static str, &'static str); 9] = [
        ("top-left", "tl"),
        ("top", "t"),
        ("top-right", "tr"),
        ("left", "l"),
        ("center", "c"),
        ("right", "r"),
        ("bottom-left", "bl"),
        ("bottom", "b"),
        ("bottom-right", "br"),
    ];

    /// Build an anchor from grid coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAnchor`] if `row` or `col` is greater than 2.
    pub fn new(row: u8, col: u8) -> Result<Self> {
        if row > 2 || col > 2 {
            return Err(Error::InvalidAnchor(format!(
                "row and column must be 0, 1 or 2, got ({row}, {col})"
            )));
        }
        Ok(Self { row, col })
    }

    /// Grid row: 0 top, 1 middle, 2 bottom.
    #[must_use]
    pub fn row(self) -> u8 {
        self.row
    }

    /// Grid column: 0 left, 1 middle, 2 right.
    #[must_use]
    pub fn col(self) -> u8 {
        self.col
    }

    /// Canonical name, e.g. `"bottom-right"`.
    #[must_use]
    pub fn name(self) -> &'static str {
        Self::NAMES[usize::from(self.row * 3 + self.col)].0
    }
}

impl Default for Anchor {
    fn default() -> Self {
        Self::BOTTOM_RIGHT
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Anchor {
    type Err = Error;

    /// Accepts a name (`bottom-right`), a short form (`br`) or `row,col`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase().replace('_', "-");

        if let Some(i) = Self::NAMES
            .iter()
            .position(|&(long, short)| needle == long || needle == short)
        {
            return Ok(Self::ALL[i]);
        }
        if needle == "middle" || needle == "centre" {
            return Ok(Self::CENTER);
        }

        if let Some((row, col)) = needle.split_once(',') {
            let parse = |v: &str| {
                v.trim()
                    .parse::<u8>()
                    .map_err(|_| Error::InvalidAnchor(s.to_string()))
            };
            return Self::new(parse(row)?, parse(col)?);
        }

        Err(Error::InvalidAnchor(s.to_string()))
    }
}
