use crate::db::CrmStore;
use crate::error::Result;
use crate::models::{ClassifiedItem, CompanySettings, ItemCategory, PriceTable};
use bigdecimal::BigDecimal;
use std::fmt;

/// Run-wide inputs for cost resolution
#[derive(Debug, Clone)]
pub struct CostContext {
    pub price_table: Option<PriceTable>,
    pub loss_pct: BigDecimal,
}

impl CostContext {
    /// Company loss percentage wins over the configured fallback
    pub fn new(
        price_table: Option<PriceTable>,
        company: Option<&CompanySettings>,
        default_loss_pct: &BigDecimal,
    ) -> Self {
        let loss_pct = company
            .and_then(|c| c.material_loss_pct.clone())
            .unwrap_or_else(|| default_loss_pct.clone());
        Self { price_table, loss_pct }
    }
}

/// Why an item ended up without a price
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnpricedReason {
    NoActiveTable,
    MissingMaterial,
    MissingThickness,
    MissingArea,
    MissingReference,
    NoMatch,
}

impl fmt::Display for UnpricedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            UnpricedReason::NoActiveTable => "no active price table",
            UnpricedReason::MissingMaterial => "missing material",
            UnpricedReason::MissingThickness => "missing thickness",
            UnpricedReason::MissingArea => "no computable area",
            UnpricedReason::MissingReference => "missing reference",
            UnpricedReason::NoMatch => "no price table entry",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CostOutcome {
    Priced(BigDecimal),
    Unpriced(UnpricedReason),
}

/// area * (1 + loss/100) * price_per_m2
pub fn sheet_unit_cost(area_m2: &BigDecimal, loss_pct: &BigDecimal, price_per_m2: &BigDecimal) -> BigDecimal {
    let loss_factor = BigDecimal::from(1) + loss_pct.clone() / BigDecimal::from(100);
    &(area_m2 * &loss_factor) * price_per_m2
}

/// Unit cost of one item against the active price table.
///
/// Missing pricing data is an `Unpriced` outcome; only store failures are errors.
pub async fn resolve_unit_cost(
    store: &dyn CrmStore,
    ctx: &CostContext,
    item: &ClassifiedItem,
) -> Result<CostOutcome> {
    let Some(table) = &ctx.price_table else {
        return Ok(CostOutcome::Unpriced(UnpricedReason::NoActiveTable));
    };

    match item.category {
        ItemCategory::Sheet => {
            let Some(material) = item.raw.material.as_deref() else {
                return Ok(CostOutcome::Unpriced(UnpricedReason::MissingMaterial));
            };
            let Some(thickness) = item.raw.thickness.as_deref() else {
                return Ok(CostOutcome::Unpriced(UnpricedReason::MissingThickness));
            };
            let Some(area) = &item.area_m2 else {
                return Ok(CostOutcome::Unpriced(UnpricedReason::MissingArea));
            };

            Ok(match store.find_sheet_price(table.id, material, thickness).await? {
                Some(price) => CostOutcome::Priced(sheet_unit_cost(area, &ctx.loss_pct, &price.price_per_m2)),
                None => CostOutcome::Unpriced(UnpricedReason::NoMatch),
            })
        }
        ItemCategory::Hardware => {
            if item.raw.reference.is_empty() {
                return Ok(CostOutcome::Unpriced(UnpricedReason::MissingReference));
            }

            Ok(match store.find_hardware_price(table.id, &item.raw.reference).await? {
                Some(price) => CostOutcome::Priced(price.unit_price),
                None => CostOutcome::Unpriced(UnpricedReason::NoMatch),
            })
        }
    }
}
