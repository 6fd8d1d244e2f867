//! Tunable parameters for every stage of the analysis pipeline.
//!
//! Each struct deserializes with `#[serde(default)]`, so the browser can pass
//! a partial object and inherit the remaining defaults.

use serde::{Deserialize, Serialize};

// Onset detection
pub const ONSET_FRAME_SIZE: usize = 1024;
pub const ONSET_HOP_SIZE: usize = 256;
pub const ONSET_HISTORY_LEN: usize = 10;
pub const ONSET_THRESHOLD_RATIO: f32 = 1.5;
pub const ONSET_MIN_GAP_SECS: f32 = 0.05;

// Pitch estimation
pub const PITCH_MIN_HZ: f32 = 50.0;
pub const PITCH_MAX_HZ: f32 = 2000.0;
pub const YIN_THRESHOLD: f32 = 0.1;

// Maqam scoring
pub const PITCH_CLASS_WEIGHT: f64 = 50.0;
pub const CHARACTERISTIC_WEIGHT: f64 = 20.0;
pub const MAX_OUT_OF_SCALE_PENALTY: f64 = 10.0;
pub const OUT_OF_SCALE_FACTOR: f64 = 5.0;
pub const OUT_OF_SCALE_MIN_BIN: f64 = 0.1;
pub const SEYIR_TYPE_MATCH: f64 = 20.0;
pub const SEYIR_TYPE_MIXED: f64 = 10.0;
pub const SEYIR_TYPE_MISMATCH: f64 = 5.0;
pub const DOMINANT_REGION_BONUS: f64 = 5.0;
pub const START_REGISTER_BONUS: f64 = 3.0;
pub const MAX_CONFIDENCE: f64 = 0.99;
pub const MIN_DETECTION_NOTES: usize = 4;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct OnsetConfig {
    pub frame_size: usize,
    pub hop_size: usize,
    /// Number of previous flux values averaged into the adaptive threshold.
    pub history_len: usize,
    pub threshold_ratio: f32,
    pub min_gap_secs: f32,
}

impl Default for OnsetConfig {
    fn default() -> Self {
        OnsetConfig {
            frame_size: ONSET_FRAME_SIZE,
            hop_size: ONSET_HOP_SIZE,
            history_len: ONSET_HISTORY_LEN,
            threshold_ratio: ONSET_THRESHOLD_RATIO,
            min_gap_secs: ONSET_MIN_GAP_SECS,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct PitchConfig {
    pub min_hz: f32,
    pub max_hz: f32,
    /// Absolute threshold on the cumulative-mean-normalized difference.
    pub threshold: f32,
}

impl Default for PitchConfig {
    fn default() -> Self {
        PitchConfig {
            min_hz: PITCH_MIN_HZ,
            max_hz: PITCH_MAX_HZ,
            threshold: YIN_THRESHOLD,
        }
    }
}

/// Weights of the composite maqam score.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ScoringWeights {
    pub pitch_class: f64,
    pub characteristic: f64,
    pub max_penalty: f64,
    pub penalty_factor: f64,
    /// Histogram bins at or below this value never count as out-of-scale.
    pub penalty_min_bin: f64,
    pub seyir_match: f64,
    pub seyir_mixed: f64,
    pub seyir_mismatch: f64,
    pub dominant_bonus: f64,
    pub start_bonus: f64,
    pub max_confidence: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        ScoringWeights {
            pitch_class: PITCH_CLASS_WEIGHT,
            characteristic: CHARACTERISTIC_WEIGHT,
            max_penalty: MAX_OUT_OF_SCALE_PENALTY,
            penalty_factor: OUT_OF_SCALE_FACTOR,
            penalty_min_bin: OUT_OF_SCALE_MIN_BIN,
            seyir_match: SEYIR_TYPE_MATCH,
            seyir_mixed: SEYIR_TYPE_MIXED,
            seyir_mismatch: SEYIR_TYPE_MISMATCH,
            dominant_bonus: DOMINANT_REGION_BONUS,
            start_bonus: START_REGISTER_BONUS,
            max_confidence: MAX_CONFIDENCE,
        }
    }
}

/// Parameters of the samples-to-notes stage.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub pitch_frame_size: usize,
    /// Frames shorter than this at the end of the buffer are skipped.
    pub min_frame_size: usize,
    /// Offset from the onset to the pitch frame, past the attack transient.
    pub attack_skip_secs: f32,
    /// Length of the final note, in pitch frames, when no onset follows it.
    pub tail_frames: usize,
    pub min_midi: f64,
    pub max_midi: f64,
    pub min_note_secs: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            pitch_frame_size: 2048,
            min_frame_size: 512,
            attack_skip_secs: 0.025,
            tail_frames: 3,
            min_midi: 36.0,
            max_midi: 96.0,
            min_note_secs: 0.05,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    pub onset: OnsetConfig,
    pub pitch: PitchConfig,
    pub scoring: ScoringWeights,
    pub pipeline: PipelineConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_match_constants() {
        let w = ScoringWeights::default();
        assert_eq!(w.pitch_class, 50.0);
        assert_eq!(w.characteristic, 20.0);
        assert_eq!(w.max_penalty, 10.0);
        assert_eq!(w.seyir_match, 20.0);
        assert_eq!(w.max_confidence, 0.99);
    }

    #[test]
    fn test_analysis_config_defaults() {
        let analysis = AnalysisConfig::default();
        assert_eq!(analysis.onset.frame_size, 1024);
        assert_eq!(analysis.onset.hop_size, 256);
        assert_eq!(analysis.pipeline.pitch_frame_size, 2048);
        assert_eq!(analysis.pitch.threshold, 0.1);
    }
}
