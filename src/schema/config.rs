//! Configuration types for the treasure environment.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Grid position `(x, y)`. `x` grows to the right, `y` grows downward.
pub type Position = (i32, i32);

/// Square treasure grid with a start position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Side length of the square grid in cells.
    pub size: usize,
    /// Where every agent starts its walk.
    pub start: Position,
    /// Treasure cells. Each must lie inside the grid.
    pub treasures: Vec<Position>,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            size: 7,
            start: (3, 6),
            treasures: vec![(4, 1), (2, 2), (6, 3), (1, 4), (4, 5)],
        }
    }
}

impl EnvironmentConfig {
    /// Load an environment from disk.
    ///
    /// Files ending in `.json` are read as serialized [`EnvironmentConfig`];
    /// anything else is parsed with [`EnvironmentConfig::from_text`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;

        let config = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&contents)?
        } else {
            Self::from_text(&contents)?
        };

        config.validate()?;
        Ok(config)
    }

    /// Parse the line-oriented environment format:
    ///
    /// ```text
    /// 7
    /// (3, 6)
    /// 2
    /// (4, 1)
    /// (2, 2)
    /// ```
    ///
    /// Line 1 is the grid size, line 2 the start position, line 3 the number
    /// of treasures, followed by one position per treasure. Positions accept
    /// parentheses or brackets. Blank lines are skipped.
    pub fn from_text(text: &str) -> Result<Self, ConfigError> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(idx, line)| (idx + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty());

        let (line_no, line) = lines.next().ok_or(ConfigError::UnexpectedEnd {
            expected: "grid size",
        })?;
        let size = parse_count(line_no, line)?;

        let (line_no, line) = lines.next().ok_or(ConfigError::UnexpectedEnd {
            expected: "start position",
        })?;
        let start = parse_position(line_no, line)?;

        let (line_no, line) = lines.next().ok_or(ConfigError::UnexpectedEnd {
            expected: "treasure count",
        })?;
        let count = parse_count(line_no, line)?;

        let mut treasures = Vec::with_capacity(count);
        for _ in 0..count {
            let (line_no, line) = lines.next().ok_or(ConfigError::UnexpectedEnd {
                expected: "treasure position",
            })?;
            treasures.push(parse_position(line_no, line)?);
        }

        Ok(Self {
            size,
            start,
            treasures,
        })
    }

    /// Number of treasures placed on the grid.
    pub fn treasure_count(&self) -> usize {
        self.treasures.len()
    }

    /// Whether `position` lies on the grid.
    pub fn contains(&self, (x, y): Position) -> bool {
        let size = self.size as i64;
        (0..size).contains(&(x as i64)) && (0..size).contains(&(y as i64))
    }

    /// Validate configuration.
    ///
    /// The start position may lie off the grid; such an agent simply never
    /// collects anything until it walks back in.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.size == 0 {
            return Err(ConfigError::InvalidSize);
        }
        if self.treasures.is_empty() {
            return Err(ConfigError::NoTreasures);
        }

        let mut seen = HashSet::with_capacity(self.treasures.len());
        for &(x, y) in &self.treasures {
            if !self.contains((x, y)) {
                return Err(ConfigError::TreasureOutOfBounds {
                    x,
                    y,
                    size: self.size,
                });
            }
            if !seen.insert((x, y)) {
                return Err(ConfigError::DuplicateTreasure { x, y });
            }
        }
        Ok(())
    }
}

fn parse_count(line_no: usize, line: &str) -> Result<usize, ConfigError> {
    line.parse().map_err(|_| ConfigError::Parse {
        line: line_no,
        reason: format!("expected a non-negative integer, found `{}`", line),
    })
}

fn parse_position(line_no: usize, line: &str) -> Result<Position, ConfigError> {
    let invalid = || ConfigError::Parse {
        line: line_no,
        reason: format!("expected a position like `(x, y)`, found `{}`", line),
    };

    let inner = line
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
        .or_else(|| {
            line.strip_prefix('[')
                .and_then(|rest| rest.strip_suffix(']'))
        })
        .unwrap_or(line);

    let mut parts = inner.split(',').map(str::trim);
    let x = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
    let y = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
    if parts.next().is_some() {
        return Err(invalid());
    }
    Ok((x, y))
}

/// Environment loading and validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read environment file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse JSON configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Line {line}: {reason}")]
    Parse { line: usize, reason: String },
    #[error("Unexpected end of file, expected {expected}")]
    UnexpectedEnd { expected: &'static str },
    #[error("Grid size must be non-zero")]
    InvalidSize,
    #[error("At least one treasure is required")]
    NoTreasures,
    #[error("Treasure ({x}, {y}) lies outside the {size}x{size} grid")]
    TreasureOutOfBounds { x: i32, y: i32, size: usize },
    #[error("Treasure ({x}, {y}) is listed more than once")]
    DuplicateTreasure { x: i32, y: i32 },
}
