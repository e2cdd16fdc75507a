use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Pricing category of an extracted item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemCategory {
    /// Panel material, priced by area
    Sheet,
    /// Fitting, priced per unit
    Hardware,
}

impl ItemCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemCategory::Sheet => "sheet",
            ItemCategory::Hardware => "hardware",
        }
    }
}

impl fmt::Display for ItemCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown item category: {0}")]
pub struct UnknownCategory(pub String);

impl TryFrom<String> for ItemCategory {
    type Error = UnknownCategory;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "sheet" => Ok(ItemCategory::Sheet),
            "hardware" => Ok(ItemCategory::Hardware),
            _ => Err(UnknownCategory(value)),
        }
    }
}

/// One `<Item>` block as found in a Promob export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawItemRecord {
    pub reference: String,
    pub description: String,
    pub width_mm: BigDecimal,
    pub height_mm: BigDecimal,
    pub depth_mm: BigDecimal,
    pub quantity: i32,
    pub material: Option<String>,
    pub model: Option<String>,
    pub thickness: Option<String>,
}

/// Raw item plus its category and sheet area
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedItem {
    pub raw: RawItemRecord,
    pub category: ItemCategory,
    /// Square meters; only for sheets with positive width and depth
    pub area_m2: Option<BigDecimal>,
}
