pub mod yin;

pub use yin::{detect_pitch, PitchDetector};
