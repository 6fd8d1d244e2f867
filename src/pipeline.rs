//! Captured audio to quantized notes and a maqam reading.

use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::maqam::catalog::Catalog;
use crate::maqam::detector::detect_maqam_with;
use crate::maqam::types::DetectionResult;
use crate::note::{freq_to_midi, Note};
use crate::onset::Onsets;
use crate::pitch::PitchDetector;
use crate::quantize::{quantize, GridSubdivision};

pub const DEFAULT_TEMPO_BPM: u32 = 80;
const MIN_TEMPO_BPM: f64 = 40.0;
const MAX_TEMPO_BPM: f64 = 240.0;
const MIN_TEMPO_NOTES: usize = 4;
const MIN_INTERVAL_SECS: f64 = 0.05;
const MAX_INTERVAL_SECS: f64 = 2.0;

const VELOCITY_GAIN: f32 = 3000.0;
const MIN_VELOCITY: f32 = 30.0;
const MAX_VELOCITY: f32 = 127.0;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AnalysisResult {
    pub notes: Vec<Note>,
    pub tempo_bpm: f64,
    /// Length of the analyzed buffer in seconds.
    pub duration_secs: f64,
    pub sample_rate: u32,
    pub maqam: Option<DetectionResult>,
}

fn rms(frame: &[f32]) -> f32 {
    if frame.is_empty() {
        return 0.0;
    }
    (frame.iter().map(|s| s * s).sum::<f32>() / frame.len() as f32).sqrt()
}

fn velocity_from_rms(rms: f32) -> u8 {
    (rms * VELOCITY_GAIN).clamp(MIN_VELOCITY, MAX_VELOCITY) as u8
}

/// One note per onset: pitch from a frame just past the attack, duration up
/// to the next onset. Onsets whose frame is short, unvoiced or outside the
/// playable range are dropped.
pub fn extract_notes(samples: &[f32], sample_rate: u32, config: &AnalysisConfig) -> Vec<Note> {
    if sample_rate == 0 || samples.is_empty() {
        return Vec::new();
    }
    let sr = sample_rate as f32;
    let pc = &config.pipeline;

    let onsets: Vec<f32> = Onsets::new(samples, sample_rate, config.onset.clone()).collect();
    let mut detector = PitchDetector::new(sr, config.pitch.clone());
    let attack_skip = (pc.attack_skip_secs.max(0.0) * sr) as usize;
    let tail = pc.pitch_frame_size * pc.tail_frames;

    let mut notes = Vec::with_capacity(onsets.len());
    for (i, &onset) in onsets.iter().enumerate() {
        let start = (onset * sr) as usize;
        let end = match onsets.get(i + 1) {
            Some(&next) => (next * sr) as usize,
            None => (start + tail).min(samples.len()),
        };

        let frame_start = (start + attack_skip).min(samples.len());
        let frame_end = (frame_start + pc.pitch_frame_size).min(samples.len());
        let frame = &samples[frame_start..frame_end];
        if frame.len() < pc.min_frame_size {
            log::debug!("onset at {:.3}s: frame too short ({} samples)", onset, frame.len());
            continue;
        }

        let hz = match detector.detect(frame) {
            Some(hz) => hz,
            None => {
                log::debug!("onset at {:.3}s: unvoiced", onset);
                continue;
            }
        };
        let midi = freq_to_midi(hz as f64);
        if midi < pc.min_midi || midi > pc.max_midi {
            log::debug!("onset at {:.3}s: pitch {:.2} out of range", onset, midi);
            continue;
        }

        let duration = (end.saturating_sub(start) as f64 / sr as f64).max(pc.min_note_secs);
        notes.push(
            Note::new(onset as f64, duration, midi).with_velocity(velocity_from_rms(rms(frame))),
        );
    }
    notes
}

/// Tempo from the median inter-onset interval, folded by halving or doubling
/// into 40-240 BPM and snapped to a multiple of 4.
pub fn estimate_tempo(notes: &[Note]) -> u32 {
    if notes.len() < MIN_TEMPO_NOTES {
        return DEFAULT_TEMPO_BPM;
    }
    let mut times: Vec<f64> = notes.iter().map(|n| n.time).collect();
    times.sort_by(f64::total_cmp);

    let mut intervals: Vec<f64> = times
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|&d| d > MIN_INTERVAL_SECS && d < MAX_INTERVAL_SECS)
        .collect();
    if intervals.is_empty() {
        return DEFAULT_TEMPO_BPM;
    }
    intervals.sort_by(f64::total_cmp);
    let median = intervals[intervals.len() / 2];
    let bpm = 60.0 / median;

    [0.5, 1.0, 2.0]
        .iter()
        .map(|factor| bpm * factor)
        .find(|c| (MIN_TEMPO_BPM..=MAX_TEMPO_BPM).contains(c))
        .map(|c| ((c / 4.0).round_ties_even() * 4.0).clamp(MIN_TEMPO_BPM, MAX_TEMPO_BPM) as u32)
        .unwrap_or(DEFAULT_TEMPO_BPM)
}

/// Extract, quantize and classify a captured buffer. Without a tempo the
/// estimate from the raw notes is used.
pub fn analyze_audio(
    samples: &[f32],
    sample_rate: u32,
    tempo_bpm: Option<f64>,
    grid: GridSubdivision,
    root_hint: Option<u8>,
    config: &AnalysisConfig,
) -> Result<AnalysisResult, AnalysisError> {
    let raw = extract_notes(samples, sample_rate, config);
    let tempo_bpm = match tempo_bpm {
        Some(t) => t,
        None => estimate_tempo(&raw) as f64,
    };
    let notes = quantize(&raw, tempo_bpm, grid)?;
    let maqam = detect_maqam_with(&notes, root_hint, Catalog::builtin(), &config.scoring);

    let duration_secs = if sample_rate > 0 {
        samples.len() as f64 / sample_rate as f64
    } else {
        0.0
    };
    log::debug!(
        "analyzed {:.2}s: {} notes at {} BPM, maqam {:?}",
        duration_secs,
        notes.len(),
        tempo_bpm,
        maqam.as_ref().map(|m| m.best_match.template_id.as_str())
    );

    Ok(AnalysisResult {
        notes,
        tempo_bpm,
        duration_secs,
        sample_rate,
        maqam,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    const SR: u32 = 44100;

    /// Tones of `tone_secs` separated by `gap_secs` of silence, after a
    /// leading silence of the same gap.
    fn tone_sequence(freqs: &[f32], tone_secs: f32, gap_secs: f32) -> Vec<f32> {
        let sr = SR as f32;
        let mut out = vec![0.0; (gap_secs * sr) as usize];
        for &f in freqs {
            let n = (tone_secs * sr) as usize;
            out.extend((0..n).map(|i| 0.5 * (2.0 * PI * f * i as f32 / sr).sin()));
            out.extend(std::iter::repeat(0.0).take((gap_secs * sr) as usize));
        }
        out
    }

    fn notes_at(times: &[f64]) -> Vec<Note> {
        times.iter().map(|&t| Note::new(t, 0.2, 60.0)).collect()
    }

    #[test]
    fn test_extracts_one_note_per_tone() {
        let freqs = [293.66, 329.63, 359.61, 392.0];
        let samples = tone_sequence(&freqs, 0.4, 0.1);
        let notes = extract_notes(&samples, SR, &AnalysisConfig::default());
        assert_eq!(notes.len(), 4);

        let expected = [62.0, 64.0, 65.5, 67.0];
        for (note, want) in notes.iter().zip(expected) {
            assert!((note.pitch - want).abs() < 0.05, "{} vs {}", note.pitch, want);
            assert!(note.velocity >= 30 && note.velocity <= 127);
        }
        // Onsets land within a frame of each tone start
        for (i, note) in notes.iter().enumerate() {
            let start = 0.1 + i as f64 * 0.5;
            assert!((note.time - start).abs() < 0.03, "onset {} at {}", i, note.time);
        }
        assert!((notes[0].duration - 0.5).abs() < 0.02);
    }

    #[test]
    fn test_out_of_range_pitch_is_dropped() {
        // 40 Hz is below MIDI 36 (65.4 Hz) but inside the tracker's range
        let mut config = AnalysisConfig::default();
        config.pitch.min_hz = 30.0;
        let samples = tone_sequence(&[40.0, 293.66], 0.4, 0.1);
        let notes = extract_notes(&samples, SR, &config);
        assert_eq!(notes.len(), 1);
        assert!((notes[0].pitch - 62.0).abs() < 0.05);
    }

    #[test]
    fn test_silence_and_empty_input() {
        let config = AnalysisConfig::default();
        assert!(extract_notes(&[], SR, &config).is_empty());
        assert!(extract_notes(&vec![0.0; SR as usize], SR, &config).is_empty());
        assert!(extract_notes(&[0.5; 100], 0, &config).is_empty());
    }

    #[test]
    fn test_estimate_tempo_prefers_half_time() {
        // 0.5 s spacing is 120 BPM; the half-time reading is tried first
        let notes = notes_at(&[0.0, 0.5, 1.0, 1.5, 2.0]);
        assert_eq!(estimate_tempo(&notes), 60);
    }

    #[test]
    fn test_estimate_tempo_doubles_slow_pulse() {
        // 1.9 s spacing is 31.6 BPM, too slow until doubled
        let notes = notes_at(&[0.0, 1.9, 3.8, 5.7]);
        assert_eq!(estimate_tempo(&notes), 64);
    }

    #[test]
    fn test_estimate_tempo_snaps_to_multiple_of_four() {
        // 0.35 s is about 171 BPM, halved to 85.7 and snapped to 84
        let notes = notes_at(&[0.0, 0.35, 0.7, 1.05, 1.4]);
        assert_eq!(estimate_tempo(&notes), 84);
    }

    #[test]
    fn test_estimate_tempo_defaults() {
        assert_eq!(estimate_tempo(&notes_at(&[0.0, 0.5, 1.0])), 80);
        // All intervals outside (0.05, 2.0)
        assert_eq!(estimate_tempo(&notes_at(&[0.0, 0.01, 0.02, 5.0])), 80);
    }

    #[test]
    fn test_analyze_audio_rejects_bad_tempo() {
        let samples = tone_sequence(&[293.66], 0.4, 0.1);
        let err = analyze_audio(
            &samples,
            SR,
            Some(0.0),
            GridSubdivision::Eighth,
            None,
            &AnalysisConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err, AnalysisError::InvalidTempo(0.0));
    }

    #[test]
    fn test_analyze_audio_short_phrase_has_no_maqam() {
        let samples = tone_sequence(&[293.66, 329.63], 0.4, 0.1);
        let result = analyze_audio(
            &samples,
            SR,
            Some(120.0),
            GridSubdivision::Sixteenth,
            None,
            &AnalysisConfig::default(),
        )
        .unwrap();
        assert_eq!(result.notes.len(), 2);
        assert!(result.maqam.is_none());
        assert_eq!(result.tempo_bpm, 120.0);
        assert!((result.duration_secs - 1.1).abs() < 1e-3);
    }
}
