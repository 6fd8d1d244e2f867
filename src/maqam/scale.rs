use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::maqam::catalog::Catalog;
use crate::maqam::types::MaqamTemplate;
use crate::note::{key_to_midi, Note};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScaleDirection {
    #[default]
    Ascending,
    Descending,
    /// Up to the octave and back down to the root.
    Arch,
}

impl FromStr for ScaleDirection {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ascending" | "up" => Ok(ScaleDirection::Ascending),
            "descending" | "down" => Ok(ScaleDirection::Descending),
            "arch" | "up_down" => Ok(ScaleDirection::Arch),
            _ => Err(AnalysisError::UnknownDirection(s.to_string())),
        }
    }
}

impl fmt::Display for ScaleDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScaleDirection::Ascending => "ascending",
            ScaleDirection::Descending => "descending",
            ScaleDirection::Arch => "arch",
        };
        f.write_str(s)
    }
}

fn degree_order(template: &MaqamTemplate, direction: ScaleDirection) -> Vec<f64> {
    let up = template.intervals.clone();
    match direction {
        ScaleDirection::Ascending => up,
        ScaleDirection::Descending => up.into_iter().rev().collect(),
        ScaleDirection::Arch => {
            let mut path = up.clone();
            path.extend(up.iter().rev().skip(1));
            path
        }
    }
}

/// Lay out a template's degrees on `root_midi` as back-to-back notes of
/// `note_duration` seconds.
pub fn scale_notes(
    template: &MaqamTemplate,
    root_midi: i32,
    note_duration: f64,
    direction: ScaleDirection,
) -> Vec<Note> {
    degree_order(template, direction)
        .into_iter()
        .enumerate()
        .map(|(i, cents)| {
            Note::new(
                i as f64 * note_duration,
                note_duration,
                root_midi as f64 + cents / 100.0,
            )
        })
        .collect()
}

/// Look up `template_id` in the built-in catalog and lay it out from a key
/// name such as "D4" or "Bb3".
pub fn generate_scale(
    template_id: &str,
    key: &str,
    note_duration: f64,
    direction: ScaleDirection,
) -> Result<Vec<Note>, AnalysisError> {
    let template = Catalog::builtin()
        .get(template_id)
        .ok_or_else(|| AnalysisError::UnknownTemplate(template_id.to_string()))?;
    let root_midi = key_to_midi(key)?;
    Ok(scale_notes(template, root_midi, note_duration, direction))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rast_on_d_ascending() {
        let notes = generate_scale("rast", "D4", 0.5, ScaleDirection::Ascending).unwrap();
        assert_eq!(notes.len(), 8);
        assert_eq!(notes[0].pitch, 62.0);
        assert_eq!(notes[2].pitch, 65.5);
        assert_eq!(notes[7].pitch, 74.0);
        assert_eq!(notes[3].time, 1.5);
        assert!(notes.iter().all(|n| n.duration == 0.5));
    }

    #[test]
    fn test_descending_and_arch() {
        let down = generate_scale("hijaz", "C", 0.25, ScaleDirection::Descending).unwrap();
        assert_eq!(down[0].pitch, 72.0);
        assert_eq!(down[7].pitch, 60.0);

        let arch = generate_scale("bayati", "D4", 0.25, ScaleDirection::Arch).unwrap();
        assert_eq!(arch.len(), 15);
        assert_eq!(arch[7].pitch, 74.0);
        assert_eq!(arch[14].pitch, 62.0);
        assert_eq!(arch[14].time, 3.5);
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            generate_scale("nope", "D4", 0.5, ScaleDirection::Ascending),
            Err(AnalysisError::UnknownTemplate("nope".to_string()))
        );
        assert!(matches!(
            generate_scale("rast", "Q4", 0.5, ScaleDirection::Ascending),
            Err(AnalysisError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_direction_parsing() {
        assert_eq!("Descending".parse(), Ok(ScaleDirection::Descending));
        assert_eq!("arch".parse(), Ok(ScaleDirection::Arch));
        assert_eq!(ScaleDirection::Arch.to_string(), "arch");
        assert!("sideways".parse::<ScaleDirection>().is_err());
    }
}
