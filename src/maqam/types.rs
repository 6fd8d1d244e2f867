use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SeyirType {
    Ascending,
    Descending,
    Mixed,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Register {
    Lower,
    Middle,
    Upper,
}

/// The melodic journey a maqam is expected to follow.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SeyirDescriptor {
    pub seyir_type: SeyirType,
    pub start: Register,
    pub peak: Register,
    /// Cents above the root where the melody tends to dwell.
    pub dominant_region: [f64; 2],
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MaqamTemplate {
    pub id: String,
    pub name: String,
    pub arabic_name: String,
    /// Cents above the root, strictly increasing from 0 to 1200.
    pub intervals: Vec<f64>,
    pub characteristic_intervals: Vec<f64>,
    pub dominant_cents: Option<f64>,
    pub leading_cents: Option<f64>,
    pub seyir: SeyirDescriptor,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct ScoreBreakdown {
    pub pitch_class_score: f64,
    pub characteristic_bonus: f64,
    pub out_of_scale_penalty: f64,
    pub seyir_score: f64,
    pub total: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MaqamMatch {
    pub template_id: String,
    pub name: String,
    pub arabic_name: String,
    /// Pitch class of the tonic, 0 = C.
    pub root: u8,
    pub root_name: String,
    pub score: ScoreBreakdown,
    pub confidence: f64,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct SeyirScores {
    pub ascending: f64,
    pub descending: f64,
    pub mixed: f64,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct RegisterDensity {
    pub lower: f64,
    pub middle: f64,
    pub upper: f64,
}

/// Observed melodic behavior of a note sequence.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SeyirProfile {
    pub seyir_type: SeyirType,
    pub type_scores: SeyirScores,
    /// Step directions between consecutive notes: -1, 0 or +1.
    pub contour: Vec<i8>,
    pub register_density: RegisterDensity,
    /// Duration-weighted mean pitch, reduced to the octave (0..1200 cents).
    pub dominant_cents: f64,
    /// Mean normalized pitch of the first, second and final third.
    pub thirds_average: [f64; 3],
    pub start_register: Register,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DetectionResult {
    pub best_match: MaqamMatch,
    pub alternatives: Vec<MaqamMatch>,
    pub seyir_path: Vec<i8>,
    pub seyir_analysis: SeyirProfile,
}
