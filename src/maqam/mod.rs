pub mod catalog;
pub mod detector;
pub mod histogram;
pub mod scale;
pub mod seyir;
pub mod types;

pub use catalog::Catalog;
pub use detector::{detect_maqam, detect_maqam_with};
pub use scale::{generate_scale, ScaleDirection};
pub use seyir::analyze_seyir;
pub use types::{DetectionResult, MaqamMatch, MaqamTemplate, SeyirProfile, SeyirType};
