use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::note::Note;

/// Rhythmic grid, expressed as the note value of one grid step.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum GridSubdivision {
    #[serde(rename = "1/4")]
    Quarter,
    #[default]
    #[serde(rename = "1/8")]
    Eighth,
    #[serde(rename = "1/16")]
    Sixteenth,
    #[serde(rename = "1/32")]
    ThirtySecond,
}

impl GridSubdivision {
    /// Grid steps per beat.
    pub fn divisor(self) -> f64 {
        match self {
            GridSubdivision::Quarter => 1.0,
            GridSubdivision::Eighth => 2.0,
            GridSubdivision::Sixteenth => 4.0,
            GridSubdivision::ThirtySecond => 8.0,
        }
    }

    /// Length of one grid step in seconds.
    pub fn grid_duration(self, tempo_bpm: f64) -> f64 {
        (60.0 / tempo_bpm) / self.divisor()
    }
}

impl FromStr for GridSubdivision {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1/4" => Ok(GridSubdivision::Quarter),
            "1/8" => Ok(GridSubdivision::Eighth),
            "1/16" => Ok(GridSubdivision::Sixteenth),
            "1/32" => Ok(GridSubdivision::ThirtySecond),
            other => Err(AnalysisError::UnknownGrid(other.to_string())),
        }
    }
}

impl fmt::Display for GridSubdivision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GridSubdivision::Quarter => "1/4",
            GridSubdivision::Eighth => "1/8",
            GridSubdivision::Sixteenth => "1/16",
            GridSubdivision::ThirtySecond => "1/32",
        };
        f.write_str(s)
    }
}

// Half-to-even keeps the duration floor (exactly half a step) a fixed point.
fn snap(value: f64, grid: f64) -> f64 {
    (value / grid).round_ties_even() * grid
}

/// Snap note times and durations to the grid. Durations never drop below
/// half a grid step. Pitches and order are untouched.
pub fn quantize(
    notes: &[Note],
    tempo_bpm: f64,
    grid: GridSubdivision,
) -> Result<Vec<Note>, AnalysisError> {
    if !(tempo_bpm > 0.0) || !tempo_bpm.is_finite() {
        log::warn!("refusing to quantize at tempo {}", tempo_bpm);
        return Err(AnalysisError::InvalidTempo(tempo_bpm));
    }
    let step = grid.grid_duration(tempo_bpm);
    let min_duration = step * 0.5;

    Ok(notes
        .iter()
        .map(|note| Note {
            time: snap(note.time, step),
            duration: snap(note.duration, step).max(min_duration),
            ..note.clone()
        })
        .collect())
}
