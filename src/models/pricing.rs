use super::ItemCategory;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Company-level pricing settings (companies)
#[derive(Debug, Clone, Default, FromRow, Serialize, Deserialize)]
pub struct CompanySettings {
    pub id: Uuid,
    pub default_margin_sheet: Option<BigDecimal>,
    pub default_margin_hardware: Option<BigDecimal>,
    pub material_loss_pct: Option<BigDecimal>,
}

/// Price table header (price_tables)
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PriceTable {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Sheet material price per square meter (sheet_prices)
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SheetPrice {
    pub id: Uuid,
    pub price_table_id: Uuid,
    pub material: String,
    pub thickness: String,
    pub price_per_m2: BigDecimal,
}

/// Hardware unit price (hardware_prices)
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct HardwarePrice {
    pub id: Uuid,
    pub price_table_id: Uuid,
    pub reference: String,
    pub unit_price: BigDecimal,
}

/// Markup rule (margin_rules)
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct MarginRule {
    pub id: Uuid,
    pub company_id: Uuid,
    #[sqlx(try_from = "String")]
    pub item_type: ItemCategory,
    /// None applies to every environment
    pub environment: Option<String>,
    pub client_type: Option<String>,
    pub margin_pct: BigDecimal,
    pub created_at: DateTime<Utc>,
}
