use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

const DEFAULT_VELOCITY: u8 = 80;

fn default_velocity() -> u8 {
    DEFAULT_VELOCITY
}

/// A detected or edited note. `pitch` is a fractional MIDI number, so a
/// quarter-tone-sharp D4 is 62.5.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Note {
    pub time: f64,
    pub duration: f64,
    pub pitch: f64,
    pub pitch_rounded: i32,
    pub microtonal_offset_cents: f64,
    #[serde(default = "default_velocity")]
    pub velocity: u8,
}

impl Note {
    pub fn new(time: f64, duration: f64, pitch: f64) -> Self {
        let pitch_rounded = pitch.round() as i32;
        Note {
            time,
            duration,
            pitch,
            pitch_rounded,
            microtonal_offset_cents: (pitch - pitch_rounded as f64) * 100.0,
            velocity: DEFAULT_VELOCITY,
        }
    }

    pub fn from_frequency(time: f64, duration: f64, hz: f64) -> Self {
        Note::new(time, duration, freq_to_midi(hz))
    }

    pub fn with_velocity(mut self, velocity: u8) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn frequency(&self) -> f64 {
        midi_to_freq(self.pitch)
    }

    /// Position within the octave in cents (0..1200), built from the rounded
    /// semitone plus the stored offset so that hand-edited offsets are honored.
    pub fn pitch_class_cents(&self) -> f64 {
        (self.pitch_rounded.rem_euclid(12) as f64 * 100.0 + self.microtonal_offset_cents)
            .rem_euclid(1200.0)
    }

    pub fn pitch_class(&self) -> u8 {
        self.pitch_rounded.rem_euclid(12) as u8
    }

    pub fn end(&self) -> f64 {
        self.time + self.duration
    }
}

pub fn freq_to_midi(hz: f64) -> f64 {
    if hz <= 0.0 {
        return 0.0;
    }
    69.0 + 12.0 * (hz / 440.0).log2()
}

pub fn midi_to_freq(midi: f64) -> f64 {
    440.0 * 2.0_f64.powf((midi - 69.0) / 12.0)
}

pub fn pitch_class_name(pc: u8) -> &'static str {
    NOTE_NAMES[(pc % 12) as usize]
}

pub fn midi_from_pitch(step: char, alter: i32, octave: i32) -> Option<i32> {
    let base = match step.to_ascii_uppercase() {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };
    Some((octave + 1) * 12 + base + alter)
}

/// Parse a key like "D4", "Bb3" or "F#" (octave defaults to 4) into MIDI.
pub fn key_to_midi(key: &str) -> Result<i32, AnalysisError> {
    let key = key.trim();
    let mut chars = key.chars();
    let step = chars
        .next()
        .ok_or_else(|| AnalysisError::InvalidKey(key.to_string()))?;
    let rest = chars.as_str();

    let (alter, octave_str) = if let Some(stripped) = rest.strip_prefix('#') {
        (1, stripped)
    } else if let Some(stripped) = rest.strip_prefix('b') {
        (-1, stripped)
    } else {
        (0, rest)
    };

    let octave: i32 = if octave_str.is_empty() {
        4
    } else {
        octave_str
            .parse()
            .map_err(|_| AnalysisError::InvalidKey(key.to_string()))?
    };

    midi_from_pitch(step, alter, octave).ok_or_else(|| AnalysisError::InvalidKey(key.to_string()))
}

/// Stable sort by onset time, the order the maqam detector expects.
pub fn sort_by_time(notes: &mut [Note]) {
    notes.sort_by(|a, b| a.time.total_cmp(&b.time));
}

pub fn is_time_ordered(notes: &[Note]) -> bool {
    notes.windows(2).all(|w| w[0].time <= w[1].time)
}
