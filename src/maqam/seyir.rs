//! Melodic-journey analysis: where a line starts, where it climbs to, and
//! which way it mostly moves.

use crate::maqam::types::{Register, RegisterDensity, SeyirProfile, SeyirScores, SeyirType};
use crate::note::Note;

/// Normalized steps smaller than this count as static.
const STEP_EPSILON: f64 = 0.05;
pub const LOW_START: f64 = 0.4;
pub const HIGH_START: f64 = 0.6;
const SYMMETRY_TOLERANCE: f64 = 0.15;
const ARCH_MARGIN: f64 = 0.1;

const SHAPE_WEIGHT: f64 = 0.3;
const STEP_WEIGHT: f64 = 0.4;

pub fn register_of(normalized: f64) -> Register {
    if normalized < LOW_START {
        Register::Lower
    } else if normalized > HIGH_START {
        Register::Upper
    } else {
        Register::Middle
    }
}

fn indicator(cond: bool) -> f64 {
    if cond {
        1.0
    } else {
        0.0
    }
}

/// Duration-weighted mean absolute pitch, folded into the octave. Folding the
/// mean rather than averaging pitch classes keeps the value shift-covariant.
fn dominant_cents(notes: &[Note]) -> f64 {
    let total: f64 = notes.iter().map(|n| n.duration.max(0.0)).sum();
    let mean_pitch = if total > 0.0 {
        notes.iter().map(|n| n.pitch * n.duration.max(0.0)).sum::<f64>() / total
    } else {
        notes.iter().map(|n| n.pitch).sum::<f64>() / notes.len() as f64
    };
    (mean_pitch * 100.0).rem_euclid(1200.0)
}

/// Mean normalized pitch of the notes starting in each third of the timeline.
/// An empty third takes the overall mean.
fn thirds_average(notes: &[Note], normalized: &[f64]) -> [f64; 3] {
    let start = notes[0].time;
    let end = notes.iter().map(Note::end).fold(start, f64::max);
    let span = end - start;
    let overall = normalized.iter().sum::<f64>() / normalized.len() as f64;

    let mut sums = [0.0; 3];
    let mut counts = [0usize; 3];
    for (note, &p) in notes.iter().zip(normalized) {
        let idx = if span > 0.0 {
            (((note.time - start) / span * 3.0).floor().max(0.0) as usize).min(2)
        } else {
            0
        };
        sums[idx] += p;
        counts[idx] += 1;
    }

    let mut out = [overall; 3];
    for i in 0..3 {
        if counts[i] > 0 {
            out[i] = sums[i] / counts[i] as f64;
        }
    }
    out
}

fn contour(normalized: &[f64]) -> Vec<i8> {
    normalized
        .windows(2)
        .map(|w| {
            let delta = w[1] - w[0];
            if delta.abs() < STEP_EPSILON {
                0
            } else if delta > 0.0 {
                1
            } else {
                -1
            }
        })
        .collect()
}

fn classify(scores: &SeyirScores) -> SeyirType {
    let best = scores.ascending.max(scores.descending).max(scores.mixed);
    let leaders = [
        (SeyirType::Ascending, scores.ascending),
        (SeyirType::Descending, scores.descending),
        (SeyirType::Mixed, scores.mixed),
    ]
    .into_iter()
    .filter(|&(_, s)| s == best)
    .map(|(t, _)| t)
    .collect::<Vec<_>>();

    // A tie between directions is itself a sign of a mixed journey
    match leaders.as_slice() {
        [only] => *only,
        _ => SeyirType::Mixed,
    }
}

const EVEN_SCORES: SeyirScores = SeyirScores {
    ascending: 0.33,
    descending: 0.33,
    mixed: 0.34,
};

/// Analyze a time-ordered, non-empty note sequence. Returns `None` only for
/// an empty slice.
pub fn analyze_seyir(notes: &[Note]) -> Option<SeyirProfile> {
    if notes.is_empty() {
        return None;
    }

    let dominant = dominant_cents(notes);
    let min = notes.iter().map(|n| n.pitch).fold(f64::INFINITY, f64::min);
    let max = notes.iter().map(|n| n.pitch).fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    if !(range > 1e-9) {
        // A single sustained pitch has no direction
        return Some(SeyirProfile {
            seyir_type: SeyirType::Mixed,
            type_scores: EVEN_SCORES,
            contour: Vec::new(),
            register_density: RegisterDensity {
                lower: 0.0,
                middle: 1.0,
                upper: 0.0,
            },
            dominant_cents: dominant,
            thirds_average: [0.5; 3],
            start_register: Register::Middle,
        });
    }

    let normalized: Vec<f64> = notes.iter().map(|n| (n.pitch - min) / range).collect();
    let thirds = thirds_average(notes, &normalized);
    let [first, middle, last] = thirds;
    let steps = contour(&normalized);

    let step_count = steps.len().max(1) as f64;
    let rising = steps.iter().filter(|&&s| s > 0).count() as f64 / step_count;
    let falling = steps.iter().filter(|&&s| s < 0).count() as f64 / step_count;

    let ascending = SHAPE_WEIGHT * indicator(first < LOW_START)
        + SHAPE_WEIGHT * indicator(last >= first && last >= middle)
        + STEP_WEIGHT * rising;
    let descending = SHAPE_WEIGHT * indicator(first > HIGH_START)
        + SHAPE_WEIGHT * indicator(last < LOW_START)
        + STEP_WEIGHT * falling;
    let arch = middle - first.max(last) > ARCH_MARGIN || first.min(last) - middle > ARCH_MARGIN;
    let mixed = SHAPE_WEIGHT * indicator((first - last).abs() < SYMMETRY_TOLERANCE)
        + SHAPE_WEIGHT * indicator(arch)
        + STEP_WEIGHT * (1.0 - (rising - falling).abs()) * (rising + falling);

    let sum = ascending + descending + mixed;
    let type_scores = if sum > 0.0 {
        SeyirScores {
            ascending: ascending / sum,
            descending: descending / sum,
            mixed: mixed / sum,
        }
    } else {
        EVEN_SCORES
    };
    let seyir_type = if sum > 0.0 {
        classify(&type_scores)
    } else {
        SeyirType::Mixed
    };

    let n = normalized.len() as f64;
    let lower = normalized.iter().filter(|&&p| p < 1.0 / 3.0).count() as f64 / n;
    let upper = normalized.iter().filter(|&&p| p >= 2.0 / 3.0).count() as f64 / n;

    Some(SeyirProfile {
        seyir_type,
        type_scores,
        contour: steps,
        register_density: RegisterDensity {
            lower,
            middle: 1.0 - lower - upper,
            upper,
        },
        dominant_cents: dominant,
        thirds_average: thirds,
        start_register: register_of(first),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(cents: &[f64]) -> Vec<Note> {
        cents
            .iter()
            .enumerate()
            .map(|(i, &c)| Note::new(i as f64 * 0.5, 0.5, 62.0 + c / 100.0))
            .collect()
    }

    #[test]
    fn test_ascending_scale() {
        let profile = analyze_seyir(&line(&[0.0, 200.0, 350.0, 500.0, 700.0, 900.0, 1050.0, 1200.0]))
            .unwrap();
        assert_eq!(profile.seyir_type, SeyirType::Ascending);
        assert_eq!(profile.contour, vec![1; 7]);
        assert_eq!(profile.start_register, Register::Lower);
        assert!(profile.thirds_average[0] < profile.thirds_average[2]);
        let s = profile.type_scores;
        assert!((s.ascending + s.descending + s.mixed - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_descending_line() {
        let profile = analyze_seyir(&line(&[1200.0, 1100.0, 800.0, 700.0, 500.0, 400.0, 100.0, 0.0]))
            .unwrap();
        assert_eq!(profile.seyir_type, SeyirType::Descending);
        assert_eq!(profile.contour, vec![-1; 7]);
        assert_eq!(profile.start_register, Register::Upper);
    }

    #[test]
    fn test_arch_is_mixed() {
        let up = [0.0, 150.0, 300.0, 500.0, 700.0, 800.0, 1000.0, 1200.0];
        let mut cents = up.to_vec();
        cents.extend(up.iter().rev().skip(1));
        let profile = analyze_seyir(&line(&cents)).unwrap();
        assert_eq!(profile.seyir_type, SeyirType::Mixed);
        assert!(profile.thirds_average[1] > profile.thirds_average[0]);
    }

    #[test]
    fn test_sustained_pitch_is_degenerate_mixed() {
        let profile = analyze_seyir(&line(&[0.0, 0.0, 0.0, 0.0])).unwrap();
        assert_eq!(profile.seyir_type, SeyirType::Mixed);
        assert!(profile.contour.is_empty());
        assert_eq!(profile.type_scores.ascending, 0.33);
        assert_eq!(profile.type_scores.mixed, 0.34);
        assert!((profile.dominant_cents - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_small_steps_are_static() {
        // 3 cents within a 1200 cent range is well under the 5% step threshold
        let profile = analyze_seyir(&line(&[0.0, 3.0, 1200.0, 1197.0])).unwrap();
        assert_eq!(profile.contour, vec![0, 1, 0]);
    }

    #[test]
    fn test_register_density() {
        let profile = analyze_seyir(&line(&[0.0, 100.0, 600.0, 1200.0])).unwrap();
        let d = profile.register_density;
        assert!((d.lower - 0.5).abs() < 1e-9);
        assert!((d.middle - 0.25).abs() < 1e-9);
        assert!((d.upper - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_dominant_is_shift_covariant() {
        let base = line(&[0.0, 200.0, 350.0, 500.0, 700.0]);
        let shifted: Vec<Note> = base
            .iter()
            .map(|n| Note::new(n.time, n.duration, n.pitch + 3.0))
            .collect();
        let a = analyze_seyir(&base).unwrap().dominant_cents;
        let b = analyze_seyir(&shifted).unwrap().dominant_cents;
        assert!(((b - a).rem_euclid(1200.0) - 300.0).abs() < 1e-6);
    }

    #[test]
    fn test_empty_input() {
        assert!(analyze_seyir(&[]).is_none());
    }
}
