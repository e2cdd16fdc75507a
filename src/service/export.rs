use crate::error::{Error, Result};
use crate::models::BudgetLineItem;
use bigdecimal::BigDecimal;

const HEADER: [&str; 18] = [
    "id", "environment", "reference", "description", "category",
    "width_mm", "height_mm", "depth_mm", "quantity",
    "material", "model", "thickness", "area_m2",
    "unit_cost", "total_cost", "unit_price", "total_price", "no_price",
];

fn option_to_csv(val: &Option<BigDecimal>) -> String {
    val.as_ref().map(|v| v.to_string()).unwrap_or_default()
}

/// Renders budget line items as CSV with a header row
pub fn budget_items_to_csv(items: &[BudgetLineItem]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record(HEADER)?;

    for item in items {
        writer.write_record(&[
            item.id.to_string(),
            item.environment.clone(),
            item.reference.clone(),
            item.description.clone(),
            item.category.to_string(),
            item.width_mm.to_string(),
            item.height_mm.to_string(),
            item.depth_mm.to_string(),
            item.quantity.to_string(),
            item.material.clone().unwrap_or_default(),
            item.model.clone().unwrap_or_default(),
            item.thickness.clone().unwrap_or_default(),
            option_to_csv(&item.area_m2),
            item.unit_cost.to_string(),
            item.total_cost.to_string(),
            item.unit_price.to_string(),
            item.total_price.to_string(),
            item.no_price.to_string(),
        ])?;
    }

    writer.into_inner().map_err(|e| Error::Internal(e.to_string()))
}
