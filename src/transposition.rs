use crate::note::Note;

/// Shift every note by `semitones` (fractional values move by quarter tones
/// and finer). Rounded pitch and offset are recomputed; timing and velocity
/// are untouched.
pub fn transpose_notes(notes: &[Note], semitones: f64) -> Vec<Note> {
    notes
        .iter()
        .map(|n| Note::new(n.time, n.duration, n.pitch + semitones).with_velocity(n.velocity))
        .collect()
}
