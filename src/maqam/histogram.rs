use crate::note::Note;

pub const HISTOGRAM_BINS: usize = 120;
pub const CENTS_PER_BIN: f64 = 1200.0 / HISTOGRAM_BINS as f64;

/// Spread of each note into its neighbors: `0.3 / d` at distance `d`.
const SMOOTHING_RADIUS: usize = 2;
const SMOOTHING_SCALE: f64 = 0.3;

/// Duration-weighted octave histogram at 10-cent resolution, normalized so
/// the tallest bin is 1.0 (all zero for silent input).
#[derive(Clone, Debug, PartialEq)]
pub struct PitchClassHistogram {
    bins: [f64; HISTOGRAM_BINS],
}

pub fn bin_for_cents(cents: f64) -> usize {
    ((cents.rem_euclid(1200.0) / CENTS_PER_BIN).round() as usize) % HISTOGRAM_BINS
}

pub fn bin_center_cents(bin: usize) -> f64 {
    (bin % HISTOGRAM_BINS) as f64 * CENTS_PER_BIN
}

fn offset_bin(bin: usize, offset: isize) -> usize {
    (bin as isize + offset).rem_euclid(HISTOGRAM_BINS as isize) as usize
}

/// Shortest distance around the octave between two cent positions.
pub fn circular_distance(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(1200.0);
    d.min(1200.0 - d)
}

impl PitchClassHistogram {
    pub fn from_notes(notes: &[Note]) -> Self {
        let mut bins = [0.0; HISTOGRAM_BINS];
        if notes.is_empty() {
            return PitchClassHistogram { bins };
        }

        let total_duration: f64 = notes.iter().map(|n| n.duration.max(0.0)).sum();
        let weight_of = |n: &Note| {
            if total_duration > 0.0 {
                n.duration.max(0.0) / total_duration
            } else {
                1.0 / notes.len() as f64
            }
        };

        for note in notes {
            let weight = weight_of(note);
            let center = bin_for_cents(note.pitch_class_cents());
            bins[center] += weight;
            for d in 1..=SMOOTHING_RADIUS {
                let spill = weight * SMOOTHING_SCALE / d as f64;
                bins[offset_bin(center, d as isize)] += spill;
                bins[offset_bin(center, -(d as isize))] += spill;
            }
        }

        let max = bins.iter().cloned().fold(0.0_f64, f64::max);
        if max > 0.0 {
            for b in bins.iter_mut() {
                *b /= max;
            }
        }
        PitchClassHistogram { bins }
    }

    pub fn bins(&self) -> &[f64; HISTOGRAM_BINS] {
        &self.bins
    }

    pub fn value_at(&self, cents: f64) -> f64 {
        self.bins[bin_for_cents(cents)]
    }

    /// Strongest bin within `radius` bins of `cents`.
    pub fn peak_near(&self, cents: f64, radius: usize) -> f64 {
        let center = bin_for_cents(cents);
        (-(radius as isize)..=radius as isize)
            .map(|o| self.bins[offset_bin(center, o)])
            .fold(0.0, f64::max)
    }

    pub fn is_silent(&self) -> bool {
        self.bins.iter().all(|&b| b == 0.0)
    }
}
