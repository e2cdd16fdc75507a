use super::CrmStore;
use crate::error::{Error, Result};
use crate::models::{
    Budget, BudgetLineItem, BudgetTotals, CompanySettings, HardwarePrice, ItemCategory,
    MarginRule, PriceTable, PromobFile, SheetPrice,
};
use crate::service::margin::select_margin_rule;
use async_trait::async_trait;
use bigdecimal::{BigDecimal, Zero};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    files: HashMap<Uuid, PromobFile>,
    companies: HashMap<Uuid, CompanySettings>,
    price_tables: Vec<PriceTable>,
    sheet_prices: Vec<SheetPrice>,
    hardware_prices: Vec<HardwarePrice>,
    margin_rules: Vec<MarginRule>,
    /// Keyed by (project_id, customer_id)
    budgets: HashMap<(Uuid, Uuid), Budget>,
    items: Vec<BudgetLineItem>,
}

/// In-process store with the same lookup semantics as the Postgres one
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add_file(&self, file: PromobFile) {
        self.inner().files.insert(file.id, file);
    }

    pub fn add_company(&self, company: CompanySettings) {
        self.inner().companies.insert(company.id, company);
    }

    pub fn add_price_table(&self, table: PriceTable) {
        self.inner().price_tables.push(table);
    }

    pub fn add_sheet_price(&self, price: SheetPrice) {
        self.inner().sheet_prices.push(price);
    }

    pub fn add_hardware_price(&self, price: HardwarePrice) {
        self.inner().hardware_prices.push(price);
    }

    pub fn add_margin_rule(&self, rule: MarginRule) {
        self.inner().margin_rules.push(rule);
    }

    pub fn budget_count(&self) -> usize {
        self.inner().budgets.len()
    }
}

#[async_trait]
impl CrmStore for MemoryStore {
    async fn get_promob_file(&self, file_id: Uuid) -> Result<Option<PromobFile>> {
        Ok(self.inner().files.get(&file_id).cloned())
    }

    async fn get_company_settings(&self, company_id: Uuid) -> Result<Option<CompanySettings>> {
        Ok(self.inner().companies.get(&company_id).cloned())
    }

    async fn find_active_price_table(&self, company_id: Uuid) -> Result<Option<PriceTable>> {
        Ok(self
            .inner()
            .price_tables
            .iter()
            .filter(|t| t.company_id == company_id && t.is_active)
            .max_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)))
            .cloned())
    }

    async fn find_sheet_price(
        &self,
        price_table_id: Uuid,
        material: &str,
        thickness: &str,
    ) -> Result<Option<SheetPrice>> {
        Ok(self
            .inner()
            .sheet_prices
            .iter()
            .filter(|p| p.price_table_id == price_table_id && p.material == material && p.thickness == thickness)
            .min_by_key(|p| p.id)
            .cloned())
    }

    async fn find_hardware_price(
        &self,
        price_table_id: Uuid,
        reference: &str,
    ) -> Result<Option<HardwarePrice>> {
        Ok(self
            .inner()
            .hardware_prices
            .iter()
            .filter(|p| p.price_table_id == price_table_id && p.reference == reference)
            .min_by_key(|p| p.id)
            .cloned())
    }

    async fn find_margin_rule(
        &self,
        company_id: Uuid,
        category: ItemCategory,
        environment: &str,
    ) -> Result<Option<MarginRule>> {
        let inner = self.inner();
        let company_rules = inner.margin_rules.iter().filter(|r| r.company_id == company_id);
        Ok(select_margin_rule(company_rules, category, environment).cloned())
    }

    async fn upsert_budget(&self, company_id: Uuid, project_id: Uuid, customer_id: Uuid) -> Result<Budget> {
        let mut inner = self.inner();
        let now = Utc::now();
        let budget = inner
            .budgets
            .entry((project_id, customer_id))
            .and_modify(|b| b.updated_at = now)
            .or_insert_with(|| Budget {
                id: Uuid::new_v4(),
                company_id,
                project_id,
                customer_id,
                total_cost: BigDecimal::zero(),
                total_price: BigDecimal::zero(),
                created_at: now,
                updated_at: now,
            });
        Ok(budget.clone())
    }

    async fn insert_line_items(&self, items: &[BudgetLineItem], _chunk_size: usize) -> Result<u64> {
        self.inner().items.extend_from_slice(items);
        Ok(items.len() as u64)
    }

    async fn recompute_budget_totals(&self, budget_id: Uuid) -> Result<BudgetTotals> {
        let mut inner = self.inner();
        let mut totals = BudgetTotals {
            total_cost: BigDecimal::zero(),
            total_price: BigDecimal::zero(),
        };
        for item in inner.items.iter().filter(|i| i.budget_id == budget_id) {
            totals.total_cost += &item.total_cost;
            totals.total_price += &item.total_price;
        }

        let budget = inner
            .budgets
            .values_mut()
            .find(|b| b.id == budget_id)
            .ok_or(Error::BudgetNotFound(budget_id))?;
        budget.total_cost = totals.total_cost.clone();
        budget.total_price = totals.total_price.clone();
        budget.updated_at = Utc::now();
        Ok(totals)
    }

    async fn get_budget(&self, budget_id: Uuid) -> Result<Option<Budget>> {
        Ok(self.inner().budgets.values().find(|b| b.id == budget_id).cloned())
    }

    async fn list_budget_items(&self, budget_id: Uuid) -> Result<Vec<BudgetLineItem>> {
        Ok(self
            .inner()
            .items
            .iter()
            .filter(|i| i.budget_id == budget_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn table(company_id: Uuid, minutes_ago: i64, active: bool) -> PriceTable {
        PriceTable {
            id: Uuid::new_v4(),
            company_id,
            name: format!("Tabela {}", minutes_ago),
            is_active: active,
            created_at: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    #[tokio::test]
    async fn newest_active_table_wins() {
        let store = MemoryStore::new();
        let company = Uuid::new_v4();
        let old = table(company, 60, true);
        let new = table(company, 5, true);
        let inactive = table(company, 1, false);
        store.add_price_table(old);
        store.add_price_table(new.clone());
        store.add_price_table(inactive);

        let found = store.find_active_price_table(company).await.unwrap().unwrap();
        assert_eq!(found.id, new.id);
    }

    #[tokio::test]
    async fn no_active_table_is_none() {
        let store = MemoryStore::new();
        let company = Uuid::new_v4();
        store.add_price_table(table(company, 1, false));
        assert!(store.find_active_price_table(company).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn upsert_keeps_one_budget_per_project_and_customer() {
        let store = MemoryStore::new();
        let (company, project, customer) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

        let first = store.upsert_budget(company, project, customer).await.unwrap();
        let second = store.upsert_budget(company, project, customer).await.unwrap();
        let other = store.upsert_budget(company, project, Uuid::new_v4()).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_ne!(first.id, other.id);
        assert_eq!(store.budget_count(), 2);
    }

    #[tokio::test]
    async fn recompute_on_unknown_budget_fails() {
        let store = MemoryStore::new();
        let err = store.recompute_budget_totals(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, Error::BudgetNotFound(_)));
    }
}
