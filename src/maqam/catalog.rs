//! Built-in maqam catalog.
//!
//! Templates are declared once, validated on first use, and kept in
//! declaration order. That order is also the tie-break among equal scores.

use std::collections::HashSet;

use once_cell::sync::Lazy;

use crate::error::CatalogError;
use crate::maqam::types::{MaqamTemplate, Register, SeyirDescriptor, SeyirType};

use crate::maqam::types::Register::{Lower, Middle, Upper};
use crate::maqam::types::SeyirType::{Ascending, Descending, Mixed};

/// An immutable, validated set of templates.
#[derive(Debug, Clone)]
pub struct Catalog {
    templates: Vec<MaqamTemplate>,
}

static BUILTIN: Lazy<Catalog> = Lazy::new(|| match Catalog::new(builtin_templates()) {
    Ok(catalog) => catalog,
    Err(e) => panic!("built-in maqam catalog is invalid: {}", e),
});

impl Catalog {
    pub fn new(templates: Vec<MaqamTemplate>) -> Result<Self, CatalogError> {
        if templates.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut seen = HashSet::new();
        for template in &templates {
            if !seen.insert(template.id.as_str()) {
                return Err(CatalogError::DuplicateId(template.id.clone()));
            }
            validate_template(template)?;
        }
        Ok(Catalog { templates })
    }

    pub fn builtin() -> &'static Catalog {
        &BUILTIN
    }

    pub fn templates(&self) -> &[MaqamTemplate] {
        &self.templates
    }

    pub fn get(&self, id: &str) -> Option<&MaqamTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

fn in_octave(cents: f64) -> bool {
    (0.0..=1200.0).contains(&cents)
}

pub fn validate_template(t: &MaqamTemplate) -> Result<(), CatalogError> {
    let id = || t.id.clone();

    if t.intervals.len() < 2 {
        return Err(CatalogError::TooFewIntervals {
            id: id(),
            found: t.intervals.len(),
        });
    }
    let first = t.intervals[0];
    if first != 0.0 {
        return Err(CatalogError::MissingRoot { id: id(), found: first });
    }
    let last = t.intervals[t.intervals.len() - 1];
    if last != 1200.0 {
        return Err(CatalogError::MissingOctave { id: id(), found: last });
    }
    if let Some(index) = t.intervals.windows(2).position(|w| !(w[1] > w[0])) {
        return Err(CatalogError::NotIncreasing { id: id(), index: index + 1 });
    }
    for &cents in &t.characteristic_intervals {
        if !t.intervals.contains(&cents) {
            return Err(CatalogError::CharacteristicNotInScale { id: id(), cents });
        }
    }
    for (field, value) in [("dominant", t.dominant_cents), ("leading tone", t.leading_cents)] {
        if let Some(cents) = value {
            if !in_octave(cents) {
                return Err(CatalogError::OutOfRange { id: id(), field, cents });
            }
        }
    }
    let [lo, hi] = t.seyir.dominant_region;
    if !in_octave(lo) || !in_octave(hi) {
        return Err(CatalogError::OutOfRange {
            id: id(),
            field: "dominant region",
            cents: if in_octave(lo) { hi } else { lo },
        });
    }
    if lo > hi {
        return Err(CatalogError::InvertedRegion { id: id(), lo, hi });
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn template(
    id: &str,
    name: &str,
    arabic_name: &str,
    intervals: [f64; 8],
    characteristic: &[f64],
    dominant: f64,
    leading: f64,
    seyir: (SeyirType, Register, Register, [f64; 2]),
) -> MaqamTemplate {
    let (seyir_type, start, peak, dominant_region) = seyir;
    MaqamTemplate {
        id: id.to_string(),
        name: name.to_string(),
        arabic_name: arabic_name.to_string(),
        intervals: intervals.to_vec(),
        characteristic_intervals: characteristic.to_vec(),
        dominant_cents: Some(dominant),
        leading_cents: Some(leading),
        seyir: SeyirDescriptor {
            seyir_type,
            start,
            peak,
            dominant_region,
        },
    }
}

pub fn builtin_templates() -> Vec<MaqamTemplate> {
    vec![
        template(
            "rast", "Rast", "راست",
            [0.0, 200.0, 350.0, 500.0, 700.0, 900.0, 1050.0, 1200.0],
            &[350.0, 1050.0], 700.0, 1050.0,
            (Ascending, Lower, Upper, [600.0, 800.0]),
        ),
        template(
            "bayati", "Bayati", "بياتي",
            [0.0, 150.0, 300.0, 500.0, 700.0, 800.0, 1000.0, 1200.0],
            &[150.0], 500.0, 1000.0,
            (Mixed, Lower, Middle, [400.0, 600.0]),
        ),
        template(
            "hijaz", "Hijaz", "حجاز",
            [0.0, 100.0, 400.0, 500.0, 700.0, 800.0, 1100.0, 1200.0],
            &[100.0, 400.0], 700.0, 1100.0,
            (Descending, Upper, Upper, [600.0, 800.0]),
        ),
        template(
            "nahawand", "Nahawand", "نهاوند",
            [0.0, 200.0, 300.0, 500.0, 700.0, 800.0, 1100.0, 1200.0],
            &[300.0, 800.0], 700.0, 1100.0,
            (Ascending, Lower, Upper, [600.0, 800.0]),
        ),
        template(
            "saba", "Saba", "صبا",
            [0.0, 150.0, 300.0, 400.0, 700.0, 800.0, 1000.0, 1200.0],
            &[150.0, 400.0], 300.0, 1000.0,
            (Descending, Middle, Middle, [200.0, 450.0]),
        ),
        template(
            "kurd", "Kurd", "كرد",
            [0.0, 100.0, 300.0, 500.0, 700.0, 800.0, 1000.0, 1200.0],
            &[100.0], 500.0, 1000.0,
            (Mixed, Middle, Middle, [400.0, 700.0]),
        ),
        template(
            "sikah", "Sikah", "سيكاه",
            [0.0, 150.0, 350.0, 500.0, 700.0, 850.0, 1050.0, 1200.0],
            &[150.0, 850.0], 500.0, 1050.0,
            (Mixed, Lower, Middle, [300.0, 600.0]),
        ),
        template(
            "ajam", "Ajam", "عجم",
            [0.0, 200.0, 400.0, 500.0, 700.0, 900.0, 1100.0, 1200.0],
            &[400.0, 1100.0], 700.0, 1100.0,
            (Ascending, Lower, Upper, [600.0, 800.0]),
        ),
        template(
            "husseini", "Husseini", "حسيني",
            [0.0, 150.0, 300.0, 500.0, 700.0, 850.0, 1000.0, 1200.0],
            &[150.0, 850.0], 700.0, 1000.0,
            (Descending, Upper, Upper, [600.0, 900.0]),
        ),
        template(
            "ushshaq_masri", "Ushshaq Masri", "عشاق مصري",
            [0.0, 150.0, 300.0, 500.0, 700.0, 900.0, 1000.0, 1200.0],
            &[150.0, 900.0], 700.0, 1000.0,
            (Mixed, Lower, Upper, [500.0, 800.0]),
        ),
        template(
            "suznak", "Suznak", "سوزناك",
            [0.0, 200.0, 350.0, 500.0, 700.0, 800.0, 1100.0, 1200.0],
            &[350.0, 800.0], 700.0, 1100.0,
            (Ascending, Lower, Upper, [600.0, 800.0]),
        ),
        template(
            "nakriz", "Nakriz", "نكريز",
            [0.0, 200.0, 300.0, 600.0, 700.0, 900.0, 1000.0, 1200.0],
            &[300.0, 600.0], 700.0, 1000.0,
            (Ascending, Lower, Middle, [500.0, 800.0]),
        ),
        template(
            "nawa_athar", "Nawa Athar", "نوا أثر",
            [0.0, 200.0, 300.0, 600.0, 700.0, 800.0, 1100.0, 1200.0],
            &[600.0, 1100.0], 700.0, 1100.0,
            (Mixed, Lower, Middle, [500.0, 800.0]),
        ),
        template(
            "jiharkah", "Jiharkah", "جهاركاه",
            [0.0, 200.0, 400.0, 500.0, 700.0, 900.0, 1050.0, 1200.0],
            &[1050.0], 700.0, 1050.0,
            (Ascending, Lower, Upper, [600.0, 800.0]),
        ),
        template(
            "zanjaran", "Zanjaran", "زنجران",
            [0.0, 100.0, 400.0, 500.0, 700.0, 900.0, 1000.0, 1200.0],
            &[100.0, 400.0, 900.0], 700.0, 1000.0,
            (Ascending, Lower, Upper, [600.0, 800.0]),
        ),
        template(
            "saba_zamzam", "Saba Zamzam", "صبا زمزم",
            [0.0, 100.0, 300.0, 400.0, 700.0, 800.0, 1000.0, 1200.0],
            &[100.0, 400.0], 300.0, 1000.0,
            (Descending, Middle, Middle, [200.0, 450.0]),
        ),
        template(
            "hijazkar_kurd", "Hijazkar Kurd", "حجازكار كرد",
            [0.0, 100.0, 300.0, 500.0, 700.0, 800.0, 1100.0, 1200.0],
            &[300.0, 1100.0], 700.0, 1100.0,
            (Descending, Upper, Upper, [600.0, 800.0]),
        ),
    ]
}
