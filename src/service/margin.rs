use crate::config::PricingConfig;
use crate::db::CrmStore;
use crate::error::Result;
use crate::models::{CompanySettings, ItemCategory, MarginRule};
use bigdecimal::BigDecimal;
use dashmap::DashMap;
use std::cmp::Ordering;
use uuid::Uuid;

/// Per-category markup used when no rule matches
#[derive(Debug, Clone, PartialEq)]
pub struct MarginDefaults {
    pub sheet: BigDecimal,
    pub hardware: BigDecimal,
}

impl MarginDefaults {
    /// Company defaults, falling back to the configured ones
    pub fn resolve(company: Option<&CompanySettings>, pricing: &PricingConfig) -> Self {
        Self {
            sheet: company
                .and_then(|c| c.default_margin_sheet.clone())
                .unwrap_or_else(|| pricing.default_sheet_margin_pct.clone()),
            hardware: company
                .and_then(|c| c.default_margin_hardware.clone())
                .unwrap_or_else(|| pricing.default_hardware_margin_pct.clone()),
        }
    }

    pub fn for_category(&self, category: ItemCategory) -> &BigDecimal {
        match category {
            ItemCategory::Sheet => &self.sheet,
            ItemCategory::Hardware => &self.hardware,
        }
    }
}

/// unit_cost * (1 + margin/100)
pub fn apply_margin(unit_cost: &BigDecimal, margin_pct: &BigDecimal) -> BigDecimal {
    let factor = BigDecimal::from(1) + margin_pct.clone() / BigDecimal::from(100);
    unit_cost * &factor
}

/// Picks the applicable rule among candidate rules of one company.
///
/// A rule applies when its category matches, its environment is the given one
/// or unset, and it has no client-type restriction. Environment-specific rules
/// rank first, then newer rules, then the lower id.
pub fn select_margin_rule<'a, I>(rules: I, category: ItemCategory, environment: &str) -> Option<&'a MarginRule>
where
    I: IntoIterator<Item = &'a MarginRule>,
{
    rules
        .into_iter()
        .filter(|r| r.item_type == category && r.client_type.is_none())
        .filter(|r| r.environment.as_deref().map_or(true, |env| env == environment))
        .min_by(|a, b| rank(a, b))
}

fn rank(a: &MarginRule, b: &MarginRule) -> Ordering {
    a.environment
        .is_none()
        .cmp(&b.environment.is_none())
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// Margin lookups for one ingestion run, memoized per (category, environment)
pub struct MarginResolver {
    company_id: Uuid,
    defaults: MarginDefaults,
    cache: DashMap<(ItemCategory, String), BigDecimal>,
}

impl MarginResolver {
    pub fn new(company_id: Uuid, defaults: MarginDefaults) -> Self {
        Self {
            company_id,
            defaults,
            cache: DashMap::new(),
        }
    }

    pub async fn margin_pct(
        &self,
        store: &dyn CrmStore,
        category: ItemCategory,
        environment: &str,
    ) -> Result<BigDecimal> {
        let key = (category, environment.to_string());
        let cached = self.cache.get(&key).map(|v| v.value().clone());
        if let Some(pct) = cached {
            return Ok(pct);
        }

        let pct = match store.find_margin_rule(self.company_id, category, environment).await? {
            Some(rule) => {
                tracing::debug!(
                    "Margin rule {} ({}%) for {} in {:?}",
                    rule.id, rule.margin_pct, category, rule.environment
                );
                rule.margin_pct
            }
            None => self.defaults.for_category(category).clone(),
        };

        self.cache.insert(key, pct.clone());
        Ok(pct)
    }
}
