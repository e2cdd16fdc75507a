use crate::models::{ClassifiedItem, ItemCategory, RawItemRecord};
use bigdecimal::{BigDecimal, Zero};

/// Keyword classifier splitting items into sheets and hardware
#[derive(Debug, Clone)]
pub struct ItemClassifier {
    keywords: Vec<String>,
}

impl ItemClassifier {
    /// Keywords are lower-cased; blank entries are ignored
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn classify(&self, raw: RawItemRecord) -> ClassifiedItem {
        classify(raw, &self.keywords)
    }
}

/// True when any keyword occurs in the lower-cased reference or description
pub fn is_hardware(reference: &str, description: &str, keywords: &[String]) -> bool {
    let reference = reference.to_lowercase();
    let description = description.to_lowercase();
    keywords
        .iter()
        .filter(|k| !k.is_empty())
        .any(|k| reference.contains(k.as_str()) || description.contains(k.as_str()))
}

pub fn categorize(reference: &str, description: &str, keywords: &[String]) -> ItemCategory {
    if is_hardware(reference, description, keywords) {
        ItemCategory::Hardware
    } else {
        ItemCategory::Sheet
    }
}

/// (width / 1000) * (depth / 1000), only when both are strictly positive
pub fn sheet_area_m2(width_mm: &BigDecimal, depth_mm: &BigDecimal) -> Option<BigDecimal> {
    if *width_mm <= BigDecimal::zero() || *depth_mm <= BigDecimal::zero() {
        return None;
    }
    Some((width_mm * depth_mm) / BigDecimal::from(1_000_000))
}

pub fn classify(raw: RawItemRecord, keywords: &[String]) -> ClassifiedItem {
    let category = categorize(&raw.reference, &raw.description, keywords);
    let area_m2 = match category {
        ItemCategory::Sheet => sheet_area_m2(&raw.width_mm, &raw.depth_mm),
        ItemCategory::Hardware => None,
    };
    ClassifiedItem {
        raw,
        category,
        area_m2,
    }
}
