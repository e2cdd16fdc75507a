use super::{queries, CrmStore};
use crate::error::{Error, Result};
use crate::models::{
    Budget, BudgetLineItem, BudgetTotals, CompanySettings, HardwarePrice, ItemCategory,
    MarginRule, PriceTable, PromobFile, SheetPrice,
};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

/// Postgres-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CrmStore for PgStore {
    async fn get_promob_file(&self, file_id: Uuid) -> Result<Option<PromobFile>> {
        Ok(queries::get_promob_file(&self.pool, file_id).await?)
    }

    async fn get_company_settings(&self, company_id: Uuid) -> Result<Option<CompanySettings>> {
        Ok(queries::get_company_settings(&self.pool, company_id).await?)
    }

    async fn find_active_price_table(&self, company_id: Uuid) -> Result<Option<PriceTable>> {
        Ok(queries::find_active_price_table(&self.pool, company_id).await?)
    }

    async fn find_sheet_price(
        &self,
        price_table_id: Uuid,
        material: &str,
        thickness: &str,
    ) -> Result<Option<SheetPrice>> {
        Ok(queries::find_sheet_price(&self.pool, price_table_id, material, thickness).await?)
    }

    async fn find_hardware_price(
        &self,
        price_table_id: Uuid,
        reference: &str,
    ) -> Result<Option<HardwarePrice>> {
        Ok(queries::find_hardware_price(&self.pool, price_table_id, reference).await?)
    }

    async fn find_margin_rule(
        &self,
        company_id: Uuid,
        category: ItemCategory,
        environment: &str,
    ) -> Result<Option<MarginRule>> {
        Ok(queries::find_margin_rule(&self.pool, company_id, category, environment).await?)
    }

    async fn upsert_budget(&self, company_id: Uuid, project_id: Uuid, customer_id: Uuid) -> Result<Budget> {
        Ok(queries::upsert_budget(&self.pool, company_id, project_id, customer_id).await?)
    }

    async fn insert_line_items(&self, items: &[BudgetLineItem], chunk_size: usize) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;
        for chunk in items.chunks(chunk_size.max(1)) {
            // Dropping `tx` on error rolls back earlier chunks
            inserted += queries::insert_line_items(&mut *tx, chunk).await?;
        }
        tx.commit().await?;
        Ok(inserted)
    }

    async fn recompute_budget_totals(&self, budget_id: Uuid) -> Result<BudgetTotals> {
        queries::recompute_budget_totals(&self.pool, budget_id)
            .await?
            .ok_or(Error::BudgetNotFound(budget_id))
    }

    async fn get_budget(&self, budget_id: Uuid) -> Result<Option<Budget>> {
        Ok(queries::get_budget(&self.pool, budget_id).await?)
    }

    async fn list_budget_items(&self, budget_id: Uuid) -> Result<Vec<BudgetLineItem>> {
        Ok(queries::list_budget_items(&self.pool, budget_id).await?)
    }
}
