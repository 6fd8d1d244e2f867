use wasm_bindgen::prelude::*;

pub mod config;
pub mod error;
pub mod maqam;
pub mod note;
pub mod onset;
pub mod pipeline;
pub mod pitch;
pub mod quantize;
pub mod transposition;

use config::AnalysisConfig;
use maqam::scale::ScaleDirection;
use note::Note;
use quantize::GridSubdivision;

use std::cell::RefCell;

thread_local! {
    static DETECTOR: RefCell<Option<pitch::PitchDetector>> = RefCell::new(None);
}

fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn notes_from_js(notes_js: JsValue) -> Result<Vec<Note>, JsValue> {
    serde_wasm_bindgen::from_value(notes_js).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Onset times in seconds for a mono buffer.
#[wasm_bindgen]
pub fn detect_onsets(samples: &[f32], sample_rate: u32) -> js_sys::Float64Array {
    let times: Vec<f64> = onset::detect_onsets(samples, sample_rate)
        .map(|t| t as f64)
        .collect();
    js_sys::Float64Array::from(times.as_slice())
}

/// YIN pitch of one frame as Float64Array [hz, fractional_midi, offset_cents],
/// empty when the frame is unvoiced. Reuses a thread-local detector so
/// repeated calls from the capture loop do not allocate.
#[wasm_bindgen]
pub fn detect_pitch(samples: &[f32], sample_rate: f32) -> js_sys::Float64Array {
    let result = DETECTOR.with(|cell| {
        let mut borrow = cell.borrow_mut();
        if borrow.as_ref().map_or(true, |d| d.sample_rate() != sample_rate) {
            *borrow = Some(pitch::PitchDetector::new(
                sample_rate,
                config::PitchConfig::default(),
            ));
        }
        borrow.as_mut().and_then(|detector| detector.detect(samples))
    });

    match result {
        Some(hz) => {
            let note = Note::from_frequency(0.0, 0.0, hz as f64);
            let arr = js_sys::Float64Array::new_with_length(3);
            arr.set_index(0, hz as f64);
            arr.set_index(1, note.pitch);
            arr.set_index(2, note.microtonal_offset_cents);
            arr
        }
        None => js_sys::Float64Array::new_with_length(0),
    }
}

/// Snap note times and durations to a "1/4" .. "1/32" grid.
#[wasm_bindgen]
pub fn quantize_notes(notes_js: JsValue, tempo: f64, grid: &str) -> Result<JsValue, JsValue> {
    let notes = notes_from_js(notes_js)?;
    let grid: GridSubdivision = grid.parse().map_err(|e: error::AnalysisError| {
        JsValue::from_str(&e.to_string())
    })?;
    let quantized =
        quantize::quantize(&notes, tempo, grid).map_err(|e| JsValue::from_str(&e.to_string()))?;
    to_js(&quantized)
}

/// Best maqam with two alternatives, or null for fewer than four notes.
#[wasm_bindgen]
pub fn detect_maqam(notes_js: JsValue, root_hint: Option<u8>) -> Result<JsValue, JsValue> {
    let mut notes = notes_from_js(notes_js)?;
    note::sort_by_time(&mut notes);
    match maqam::detect_maqam(&notes, root_hint) {
        Some(result) => to_js(&result),
        None => Ok(JsValue::NULL),
    }
}

/// Full pass over a captured buffer. `config_js` may be null or a partial
/// `AnalysisConfig` object.
#[wasm_bindgen]
pub fn analyze_audio(
    samples: &[f32],
    sample_rate: u32,
    tempo: Option<f64>,
    grid: &str,
    root_hint: Option<u8>,
    config_js: JsValue,
) -> Result<JsValue, JsValue> {
    let grid: GridSubdivision = grid.parse().map_err(|e: error::AnalysisError| {
        JsValue::from_str(&e.to_string())
    })?;
    let config: AnalysisConfig = if config_js.is_null() || config_js.is_undefined() {
        AnalysisConfig::default()
    } else {
        serde_wasm_bindgen::from_value(config_js)
            .map_err(|e| JsValue::from_str(&e.to_string()))?
    };

    let result = pipeline::analyze_audio(samples, sample_rate, tempo, grid, root_hint, &config)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    to_js(&result)
}

#[wasm_bindgen]
pub fn estimate_tempo(notes_js: JsValue) -> Result<u32, JsValue> {
    let notes = notes_from_js(notes_js)?;
    Ok(pipeline::estimate_tempo(&notes))
}

#[wasm_bindgen]
pub fn transpose_notes(notes_js: JsValue, semitones: f64) -> Result<JsValue, JsValue> {
    let notes = notes_from_js(notes_js)?;
    to_js(&transposition::transpose_notes(&notes, semitones))
}

/// All built-in templates in catalog order.
#[wasm_bindgen]
pub fn get_maqam_catalog() -> Result<JsValue, JsValue> {
    to_js(&maqam::Catalog::builtin().templates())
}

/// Reference line for a template starting on `key` ("D4", "Bb3").
#[wasm_bindgen]
pub fn generate_maqam_scale(
    template_id: &str,
    key: &str,
    note_duration: f64,
    direction: &str,
) -> Result<JsValue, JsValue> {
    let direction: ScaleDirection = direction
        .parse()
        .map_err(|e: error::AnalysisError| JsValue::from_str(&e.to_string()))?;
    let notes = maqam::generate_scale(template_id, key, note_duration, direction)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    to_js(&notes)
}
