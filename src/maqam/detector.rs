use std::cmp::Ordering;

use crate::config::{ScoringWeights, MIN_DETECTION_NOTES};
use crate::maqam::catalog::Catalog;
use crate::maqam::histogram::{bin_center_cents, circular_distance, PitchClassHistogram};
use crate::maqam::seyir::{analyze_seyir, register_of};
use crate::maqam::types::*;
use crate::note::{is_time_ordered, pitch_class_name, Note};

/// Histogram lookups accept a peak within this many bins (±20 cents).
const MATCH_RADIUS_BINS: usize = 2;
const MATCH_TOLERANCE_CENTS: f64 = 20.0;
/// Dominant region edges are widened by this much on each side.
const DOMINANT_SLACK_CENTS: f64 = 50.0;
const MAX_CANDIDATE_ROOTS: usize = 4;
const MAX_ALTERNATIVES: usize = 2;

/// Tonic candidates: the most heavily weighted pitch classes, with the first
/// and last notes counted twice since melodies tend to open and close on the
/// tonic. Ties keep ascending pitch-class order.
pub fn candidate_roots(notes: &[Note]) -> Vec<u8> {
    let mut weights = [0.0f64; 12];
    let last = notes.len().saturating_sub(1);
    for (i, note) in notes.iter().enumerate() {
        let factor = if i == 0 || i == last { 2.0 } else { 1.0 };
        weights[note.pitch_class() as usize] += note.duration.max(0.0) * factor;
    }

    let mut ranked: Vec<u8> = (0..12u8).filter(|&pc| weights[pc as usize] > 0.0).collect();
    ranked.sort_by(|&a, &b| {
        weights[b as usize]
            .partial_cmp(&weights[a as usize])
            .unwrap_or(Ordering::Equal)
    });
    ranked.truncate(MAX_CANDIDATE_ROOTS);
    if ranked.is_empty() {
        // Every note had zero duration: fall back to the opening note
        if let Some(first) = notes.first() {
            ranked.push(first.pitch_class());
        }
    }
    ranked
}

fn mean_peak(histogram: &PitchClassHistogram, root_cents: f64, intervals: &[f64]) -> f64 {
    if intervals.is_empty() {
        return 0.0;
    }
    intervals
        .iter()
        .map(|&iv| histogram.peak_near(root_cents + iv, MATCH_RADIUS_BINS))
        .sum::<f64>()
        / intervals.len() as f64
}

fn out_of_scale_penalty(
    histogram: &PitchClassHistogram,
    root_cents: f64,
    template: &MaqamTemplate,
    weights: &ScoringWeights,
) -> f64 {
    let mut penalty = 0.0;
    for (bin, &value) in histogram.bins().iter().enumerate() {
        if value <= weights.penalty_min_bin {
            continue;
        }
        let cents = bin_center_cents(bin);
        let in_scale = template.intervals.iter().any(|&iv| {
            circular_distance(cents, root_cents + iv) <= MATCH_TOLERANCE_CENTS + 1e-9
        });
        if !in_scale {
            penalty += value * weights.penalty_factor;
        }
    }
    penalty.min(weights.max_penalty)
}

fn in_dominant_region(dominant_cents: f64, root_cents: f64, region: [f64; 2]) -> bool {
    let rel = (dominant_cents - root_cents).rem_euclid(1200.0);
    let lo = region[0] - DOMINANT_SLACK_CENTS;
    let hi = region[1] + DOMINANT_SLACK_CENTS;
    [rel - 1200.0, rel, rel + 1200.0]
        .iter()
        .any(|&r| r >= lo && r <= hi)
}

fn seyir_score(
    profile: &SeyirProfile,
    root_cents: f64,
    template: &MaqamTemplate,
    weights: &ScoringWeights,
) -> f64 {
    let declared = &template.seyir;
    let mut score = if declared.seyir_type == profile.seyir_type {
        weights.seyir_match
    } else if declared.seyir_type == SeyirType::Mixed || profile.seyir_type == SeyirType::Mixed {
        weights.seyir_mixed
    } else {
        weights.seyir_mismatch
    };

    if in_dominant_region(profile.dominant_cents, root_cents, declared.dominant_region) {
        score += weights.dominant_bonus;
    }

    let observed_start = register_of(profile.thirds_average[0]);
    if observed_start != Register::Middle && observed_start == declared.start {
        score += weights.start_bonus;
    }
    score
}

/// Composite score of one template on one tonic.
pub fn score_template(
    template: &MaqamTemplate,
    root: u8,
    histogram: &PitchClassHistogram,
    profile: &SeyirProfile,
    weights: &ScoringWeights,
) -> ScoreBreakdown {
    let root_cents = (root % 12) as f64 * 100.0;

    let pitch_class_score =
        mean_peak(histogram, root_cents, &template.intervals) * weights.pitch_class;
    let characteristic_bonus =
        (mean_peak(histogram, root_cents, &template.characteristic_intervals)
            * weights.characteristic
            * 2.0)
            .min(weights.characteristic);
    let out_of_scale_penalty = out_of_scale_penalty(histogram, root_cents, template, weights);
    let seyir_score = seyir_score(profile, root_cents, template, weights);

    let total =
        (pitch_class_score + characteristic_bonus - out_of_scale_penalty + seyir_score).max(0.0);

    ScoreBreakdown {
        pitch_class_score,
        characteristic_bonus,
        out_of_scale_penalty,
        seyir_score,
        total,
    }
}

fn to_match(
    template: &MaqamTemplate,
    root: u8,
    score: ScoreBreakdown,
    weights: &ScoringWeights,
) -> MaqamMatch {
    MaqamMatch {
        template_id: template.id.clone(),
        name: template.name.clone(),
        arabic_name: template.arabic_name.clone(),
        root,
        root_name: pitch_class_name(root).to_string(),
        score,
        confidence: (score.total / 100.0).min(weights.max_confidence).max(0.0),
    }
}

/// Score every catalog template on every candidate root and return all of
/// them, best first. Equal totals keep root-candidate then catalog order.
pub fn rank_candidates(
    notes: &[Note],
    root_hint: Option<u8>,
    catalog: &Catalog,
    weights: &ScoringWeights,
) -> Option<(Vec<MaqamMatch>, SeyirProfile)> {
    if notes.len() < MIN_DETECTION_NOTES {
        return None;
    }
    if !is_time_ordered(notes) {
        log::warn!("maqam detection on a note sequence that is not sorted by time");
    }

    let histogram = PitchClassHistogram::from_notes(notes);
    if histogram.is_silent() {
        // Only the seyir term can score; every template still gets a result
        log::debug!("pitch-class histogram is empty");
    }
    let profile = analyze_seyir(notes)?;
    let roots = match root_hint {
        Some(root) => vec![root % 12],
        None => candidate_roots(notes),
    };
    log::debug!(
        "scoring {} templates on roots {:?}, observed seyir {:?}",
        catalog.len(),
        roots,
        profile.seyir_type
    );

    let mut matches: Vec<MaqamMatch> = Vec::with_capacity(roots.len() * catalog.len());
    for &root in &roots {
        for template in catalog.templates() {
            let score = score_template(template, root, &histogram, &profile, weights);
            matches.push(to_match(template, root, score, weights));
        }
    }

    // Stable: ties keep iteration order
    matches.sort_by(|a, b| {
        b.score
            .total
            .partial_cmp(&a.score.total)
            .unwrap_or(Ordering::Equal)
    });
    Some((matches, profile))
}

pub fn detect_maqam_with(
    notes: &[Note],
    root_hint: Option<u8>,
    catalog: &Catalog,
    weights: &ScoringWeights,
) -> Option<DetectionResult> {
    let (ranked, profile) = rank_candidates(notes, root_hint, catalog, weights)?;
    let mut ranked = ranked.into_iter();
    let best_match = ranked.next()?;
    let alternatives: Vec<MaqamMatch> = ranked.take(MAX_ALTERNATIVES).collect();

    log::debug!(
        "best maqam {} on {} (total {:.1}, confidence {:.2})",
        best_match.template_id,
        best_match.root_name,
        best_match.score.total,
        best_match.confidence
    );

    Some(DetectionResult {
        best_match,
        alternatives,
        seyir_path: profile.contour.clone(),
        seyir_analysis: profile,
    })
}

/// Detect the maqam of a time-ordered note sequence against the built-in
/// catalog. `None` when there are fewer than four notes.
pub fn detect_maqam(notes: &[Note], root_hint: Option<u8>) -> Option<DetectionResult> {
    detect_maqam_with(notes, root_hint, Catalog::builtin(), &ScoringWeights::default())
}
