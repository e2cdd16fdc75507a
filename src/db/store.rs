use crate::error::Result;
use crate::models::{
    Budget, BudgetLineItem, BudgetTotals, CompanySettings, HardwarePrice, ItemCategory,
    MarginRule, PriceTable, PromobFile, SheetPrice,
};
use async_trait::async_trait;
use uuid::Uuid;

/// Relational storage consumed by the ingestion pipeline
#[async_trait]
pub trait CrmStore: Send + Sync {
    async fn get_promob_file(&self, file_id: Uuid) -> Result<Option<PromobFile>>;

    async fn get_company_settings(&self, company_id: Uuid) -> Result<Option<CompanySettings>>;

    /// Most recently created active table when several are active
    async fn find_active_price_table(&self, company_id: Uuid) -> Result<Option<PriceTable>>;

    async fn find_sheet_price(
        &self,
        price_table_id: Uuid,
        material: &str,
        thickness: &str,
    ) -> Result<Option<SheetPrice>>;

    async fn find_hardware_price(
        &self,
        price_table_id: Uuid,
        reference: &str,
    ) -> Result<Option<HardwarePrice>>;

    /// Environment-specific rules win over environment-agnostic ones
    async fn find_margin_rule(
        &self,
        company_id: Uuid,
        category: ItemCategory,
        environment: &str,
    ) -> Result<Option<MarginRule>>;

    /// Returns the single budget for (project, customer), creating it if absent
    async fn upsert_budget(&self, company_id: Uuid, project_id: Uuid, customer_id: Uuid) -> Result<Budget>;

    /// Writes all items in chunks of `chunk_size`, or none of them on failure
    async fn insert_line_items(&self, items: &[BudgetLineItem], chunk_size: usize) -> Result<u64>;

    /// Sums every line item of the budget into its total fields
    async fn recompute_budget_totals(&self, budget_id: Uuid) -> Result<BudgetTotals>;

    async fn get_budget(&self, budget_id: Uuid) -> Result<Option<Budget>>;

    async fn list_budget_items(&self, budget_id: Uuid) -> Result<Vec<BudgetLineItem>>;
}
