use crate::db::CrmStore;
use crate::error::Result;
use crate::models::{Budget, BudgetLineItem, BudgetTotals, PromobFile};
use uuid::Uuid;

/// The one budget for the file's (project, customer) pair
pub async fn upsert_budget(store: &dyn CrmStore, file: &PromobFile) -> Result<Budget> {
    store
        .upsert_budget(file.company_id, file.project_id, file.customer_id)
        .await
}

/// Inserts the run's line items as a unit, returning how many rows were written.
///
/// A failed run leaves no items behind, so re-uploading the file does not
/// duplicate lines in the budget.
pub async fn persist_items(store: &dyn CrmStore, items: &[BudgetLineItem], chunk_size: usize) -> Result<u64> {
    if items.is_empty() {
        return Ok(0);
    }
    store.insert_line_items(items, chunk_size.max(1)).await
}

/// Recomputes the budget totals from all its line items.
///
/// Totals are a derived cache over the line items, so a failure here is
/// logged and reported as `None` rather than undoing the insert.
pub async fn refresh_totals(store: &dyn CrmStore, budget_id: Uuid) -> Option<BudgetTotals> {
    match store.recompute_budget_totals(budget_id).await {
        Ok(totals) => Some(totals),
        Err(e) => {
            tracing::error!("Budget {}: totals recompute failed: {}", budget_id, e);
            None
        }
    }
}
