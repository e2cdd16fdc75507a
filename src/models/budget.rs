use super::{ClassifiedItem, ItemCategory};
use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Uploaded Promob file record (promob_files)
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PromobFile {
    pub id: Uuid,
    pub company_id: Uuid,
    pub project_id: Uuid,
    pub customer_id: Uuid,
    /// Room name parsed from the upload's file name
    pub environment: String,
    pub storage_path: String,
    pub file_name: String,
}

/// Budget header, unique per (project_id, customer_id)
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Budget {
    pub id: Uuid,
    pub company_id: Uuid,
    pub project_id: Uuid,
    pub customer_id: Uuid,
    pub total_cost: BigDecimal,
    pub total_price: BigDecimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct BudgetTotals {
    pub total_cost: BigDecimal,
    pub total_price: BigDecimal,
}

/// Budget line (budget_items)
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct BudgetLineItem {
    pub id: Uuid,
    pub budget_id: Uuid,
    pub promob_file_id: Uuid,
    pub environment: String,
    pub reference: String,
    pub description: String,
    pub width_mm: BigDecimal,
    pub height_mm: BigDecimal,
    pub depth_mm: BigDecimal,
    pub quantity: i32,
    pub material: Option<String>,
    pub model: Option<String>,
    pub thickness: Option<String>,
    #[sqlx(try_from = "String")]
    pub category: ItemCategory,
    pub area_m2: Option<BigDecimal>,
    pub unit_cost: BigDecimal,
    pub total_cost: BigDecimal,
    pub unit_price: BigDecimal,
    pub total_price: BigDecimal,
    pub no_price: bool,
    pub created_at: DateTime<Utc>,
}

impl BudgetLineItem {
    /// Unpriced line for a classified item; pricing fields start at zero
    pub fn new(budget_id: Uuid, file: &PromobFile, item: &ClassifiedItem) -> Self {
        let raw = &item.raw;
        Self {
            id: Uuid::new_v4(),
            budget_id,
            promob_file_id: file.id,
            environment: file.environment.clone(),
            reference: raw.reference.clone(),
            description: raw.description.clone(),
            width_mm: raw.width_mm.clone(),
            height_mm: raw.height_mm.clone(),
            depth_mm: raw.depth_mm.clone(),
            quantity: raw.quantity,
            material: raw.material.clone(),
            model: raw.model.clone(),
            thickness: raw.thickness.clone(),
            category: item.category,
            area_m2: item.area_m2.clone(),
            unit_cost: BigDecimal::zero(),
            total_cost: BigDecimal::zero(),
            unit_price: BigDecimal::zero(),
            total_price: BigDecimal::zero(),
            no_price: false,
            created_at: Utc::now(),
        }
    }

    pub fn set_unit_cost(&mut self, unit_cost: BigDecimal) {
        self.total_cost = &unit_cost * &BigDecimal::from(self.quantity);
        self.unit_cost = unit_cost;
    }

    pub fn set_unit_price(&mut self, unit_price: BigDecimal) {
        self.total_price = &unit_price * &BigDecimal::from(self.quantity);
        self.unit_price = unit_price;
    }
}

/// Budget with its line items, as served by the read endpoint
#[derive(Debug, Clone, Serialize)]
pub struct BudgetDetail {
    #[serde(flatten)]
    pub budget: Budget,
    pub items: Vec<BudgetLineItem>,
}
