//! Energy-change onset detection over a captured sample buffer.
//!
//! Onsets are produced lazily: each call to `next` slides the analysis frame
//! forward until the next onset fires or the buffer runs out.

use std::collections::VecDeque;

use crate::config::OnsetConfig;

/// Iterator over onset times in seconds, ascending and finite.
pub struct Onsets<'a> {
    samples: &'a [f32],
    sample_rate: f32,
    config: OnsetConfig,
    pos: usize,
    history: VecDeque<f32>,
    prev_flux: f32,
    last_onset: Option<f32>,
}

impl<'a> Onsets<'a> {
    pub fn new(samples: &'a [f32], sample_rate: u32, config: OnsetConfig) -> Self {
        Onsets {
            samples,
            sample_rate: sample_rate as f32,
            history: VecDeque::with_capacity(config.history_len),
            config,
            pos: 0,
            prev_flux: 0.0,
            last_onset: None,
        }
    }
}

/// Rectified magnitude flux: summed rises in absolute amplitude across the
/// frame, normalized by its length.
pub fn frame_flux(frame: &[f32]) -> f32 {
    if frame.is_empty() {
        return 0.0;
    }
    let rises: f32 = frame
        .windows(2)
        .map(|w| (w[1].abs() - w[0].abs()).max(0.0))
        .sum();
    rises / frame.len() as f32
}

impl Iterator for Onsets<'_> {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        let frame_size = self.config.frame_size;
        let hop = self.config.hop_size.max(1);
        if self.sample_rate <= 0.0 || frame_size == 0 {
            return None;
        }

        while self.pos + frame_size <= self.samples.len() {
            let start = self.pos;
            self.pos += hop;

            let flux = frame_flux(&self.samples[start..start + frame_size]);
            let time = start as f32 / self.sample_rate;

            // Only judge a frame once the threshold has a full history behind it
            let mut fired = false;
            if self.history.len() >= self.config.history_len && !self.history.is_empty() {
                let mean = self.history.iter().sum::<f32>() / self.history.len() as f32;
                let threshold = mean * self.config.threshold_ratio;
                let gap_ok = self
                    .last_onset
                    .map_or(true, |last| time - last >= self.config.min_gap_secs);
                fired = flux > threshold && flux > self.prev_flux && gap_ok;
            }

            self.history.push_back(flux);
            if self.history.len() > self.config.history_len {
                self.history.pop_front();
            }
            self.prev_flux = flux;

            if fired {
                log::trace!("onset at {:.3}s (flux {:.5})", time, flux);
                self.last_onset = Some(time);
                return Some(time);
            }
        }

        None
    }
}

/// Onsets of `samples` with the default 1024/256 framing.
pub fn detect_onsets(samples: &[f32], sample_rate: u32) -> Onsets<'_> {
    Onsets::new(samples, sample_rate, OnsetConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: u32 = 44100;

    fn silence(secs: f32) -> Vec<f32> {
        vec![0.0; (secs * SR as f32) as usize]
    }

    fn add_click(buf: &mut [f32], at_secs: f32) {
        let idx = (at_secs * SR as f32) as usize;
        // Short decaying burst, like a plectrum attack
        for (k, v) in [1.0f32, -0.8, 0.6, -0.4, 0.2].iter().enumerate() {
            buf[idx + k] += v;
        }
    }

    #[test]
    fn test_silence_has_no_onsets() {
        let buf = silence(1.0);
        assert_eq!(detect_onsets(&buf, SR).count(), 0);
    }

    #[test]
    fn test_empty_buffer() {
        assert_eq!(detect_onsets(&[], SR).count(), 0);
    }

    #[test]
    fn test_no_onsets_before_history_fills() {
        // A click in the second frame: only one frame of history exists
        let mut buf = silence(1.0);
        add_click(&mut buf, 0.01);
        let onsets: Vec<f32> = detect_onsets(&buf, SR).collect();
        assert!(onsets.is_empty(), "got {:?}", onsets);
    }

    #[test]
    fn test_clicks_30ms_apart_give_one_onset() {
        let mut buf = silence(1.0);
        add_click(&mut buf, 0.2);
        add_click(&mut buf, 0.23);
        let onsets: Vec<f32> = detect_onsets(&buf, SR).collect();
        assert_eq!(onsets.len(), 1, "got {:?}", onsets);
        assert!(onsets[0] > 0.17 && onsets[0] <= 0.2, "got {:?}", onsets);
    }

    #[test]
    fn test_clicks_100ms_apart_give_two_onsets() {
        let mut buf = silence(1.0);
        add_click(&mut buf, 0.2);
        add_click(&mut buf, 0.3);
        let onsets: Vec<f32> = detect_onsets(&buf, SR).collect();
        assert_eq!(onsets.len(), 2, "got {:?}", onsets);
        assert!(onsets[1] - onsets[0] >= 0.05);
    }

    #[test]
    fn test_onsets_are_ascending_and_lazy() {
        let mut buf = silence(2.0);
        for i in 0..6 {
            add_click(&mut buf, 0.2 + i as f32 * 0.25);
        }
        let mut iter = detect_onsets(&buf, SR);
        let first = iter.next().expect("first onset");
        let rest: Vec<f32> = iter.collect();
        assert_eq!(rest.len(), 5);
        let mut prev = first;
        for t in rest {
            assert!(t > prev);
            prev = t;
        }
    }

    #[test]
    fn test_frame_flux() {
        assert_eq!(frame_flux(&[]), 0.0);
        // |x| rises 0 -> 0.5 -> 1.0, then falls
        let flux = frame_flux(&[0.0, -0.5, 1.0, 0.2]);
        assert!((flux - 0.25).abs() < 1e-6);
    }
}
