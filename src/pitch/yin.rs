use crate::config::PitchConfig;

/// Reusable YIN pitch tracker. Holds its scratch buffers so repeated calls on
/// frames of the same size do not allocate.
pub struct PitchDetector {
    sample_rate: f32,
    config: PitchConfig,
    diff: Vec<f32>,
    cmnd: Vec<f32>,
}

impl PitchDetector {
    pub fn new(sample_rate: f32, config: PitchConfig) -> Self {
        PitchDetector {
            sample_rate,
            config,
            diff: Vec::new(),
            cmnd: Vec::new(),
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Estimate the fundamental of `frame` in Hz, or `None` for an unvoiced
    /// or too-short frame.
    pub fn detect(&mut self, frame: &[f32]) -> Option<f32> {
        if frame.len() < 2 || self.sample_rate <= 0.0 {
            return None;
        }

        // Lag range from the frequency limits
        let min_lag = (self.sample_rate / self.config.max_hz).ceil().max(1.0) as usize;
        let max_lag = (self.sample_rate / self.config.min_hz).floor() as usize;

        let half_len = frame.len() / 2;
        let max_lag = max_lag.min(half_len);

        if min_lag >= max_lag {
            return None;
        }

        // Difference function
        self.diff.clear();
        self.diff.resize(max_lag + 1, 0.0);
        for tau in 1..=max_lag {
            let mut sum = 0.0f32;
            for j in 0..half_len {
                let d = frame[j] - frame[j + tau];
                sum += d * d;
            }
            self.diff[tau] = sum;
        }

        // Cumulative mean normalized difference function
        self.cmnd.clear();
        self.cmnd.resize(max_lag + 1, 1.0);
        let mut running_sum = 0.0f32;
        for tau in 1..=max_lag {
            running_sum += self.diff[tau];
            if running_sum > 0.0 {
                self.cmnd[tau] = self.diff[tau] * tau as f32 / running_sum;
            }
        }

        // First dip below the absolute threshold, then down to the bottom of
        // that valley so the interpolation sees a true minimum.
        let cmnd = &self.cmnd;
        let mut best_tau = (min_lag..max_lag).find(|&tau| cmnd[tau] < self.config.threshold)?;
        while best_tau + 1 < max_lag && cmnd[best_tau + 1] < cmnd[best_tau] {
            best_tau += 1;
        }

        // Parabolic interpolation for sub-sample accuracy
        let tau_refined = if best_tau > 0 && best_tau < max_lag {
            let alpha = cmnd[best_tau - 1];
            let beta = cmnd[best_tau];
            let gamma = cmnd[best_tau + 1];
            let denom = 2.0 * (2.0 * beta - alpha - gamma);
            if denom.abs() > 1e-10 {
                best_tau as f32 + (alpha - gamma) / denom
            } else {
                best_tau as f32
            }
        } else {
            best_tau as f32
        };

        if tau_refined <= 0.0 {
            return None;
        }

        Some(self.sample_rate / tau_refined)
    }
}

/// One-shot pitch estimate with the default 50–2000 Hz range.
pub fn detect_pitch(frame: &[f32], sample_rate: f32) -> Option<f32> {
    PitchDetector::new(sample_rate, PitchConfig::default()).detect(frame)
}
