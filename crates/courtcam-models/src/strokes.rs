//! Stroke statistics reported by the analysis service.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Side of the court, relative to the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Near,
    Far,
}

impl Side {
    pub const ALL: [Side; 2] = [Side::Near, Side::Far];

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Near => "near",
            Side::Far => "far",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Side::Near => "Near",
            Side::Far => "Far",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Stroke classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrokeType {
    Forehand,
    Backhand,
}

impl StrokeType {
    pub const ALL: [StrokeType; 2] = [StrokeType::Forehand, StrokeType::Backhand];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrokeType::Forehand => "forehand",
            StrokeType::Backhand => "backhand",
        }
    }

    fn abbreviation(&self) -> &'static str {
        match self {
            StrokeType::Forehand => "FH",
            StrokeType::Backhand => "BH",
        }
    }
}

impl fmt::Display for StrokeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Nested `side -> stroke -> count` mapping.
///
/// Keys are kept as strings so that sides or stroke types added by the
/// service later still round-trip. Reads of absent entries return zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StrokeCounts(BTreeMap<String, BTreeMap<String, u32>>);

impl StrokeCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count for a side/stroke pair, zero when absent.
    pub fn get(&self, side: Side, stroke: StrokeType) -> u32 {
        self.get_raw(side.as_str(), stroke.as_str())
    }

    /// Count for arbitrary string keys, zero when absent.
    pub fn get_raw(&self, side: &str, stroke: &str) -> u32 {
        self.0
            .get(side)
            .and_then(|strokes| strokes.get(stroke))
            .copied()
            .unwrap_or(0)
    }

    pub fn set(&mut self, side: Side, stroke: StrokeType, count: u32) {
        self.0
            .entry(side.as_str().to_string())
            .or_default()
            .insert(stroke.as_str().to_string(), count);
    }

    pub fn total(&self) -> u32 {
        self.0.values().flat_map(|strokes| strokes.values()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Two-line human summary, used as archive notes.
    ///
    /// ```text
    /// Near - FH: 3, BH: 0
    /// Far - FH: 0, BH: 0
    /// ```
    pub fn summary(&self) -> String {
        Side::ALL
            .iter()
            .map(|side| {
                let counts: Vec<String> = StrokeType::ALL
                    .iter()
                    .map(|stroke| format!("{}: {}", stroke.abbreviation(), self.get(*side, *stroke)))
                    .collect();
                format!("{} - {}", side.label(), counts.join(", "))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
