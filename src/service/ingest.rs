use crate::config::{IngestConfig, PricingConfig};
use crate::db::CrmStore;
use crate::error::{Error, Result};
use crate::models::{BudgetDetail, BudgetLineItem, BudgetTotals, ClassifiedItem, PromobFile};
use crate::service::aggregator;
use crate::service::classifier::ItemClassifier;
use crate::service::export::budget_items_to_csv;
use crate::service::extractor::extract_items;
use crate::service::margin::{apply_margin, MarginDefaults, MarginResolver};
use crate::service::pricing::{resolve_unit_cost, CostContext, CostOutcome};
use crate::storage::{decode_xml_bytes, ObjectStore};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Result of one file ingestion
#[derive(Debug, Clone, Serialize)]
pub struct IngestOutcome {
    pub budget_id: Uuid,
    pub items_count: usize,
    pub unpriced_count: usize,
    /// None when the totals recompute failed
    pub totals: Option<BudgetTotals>,
}

/// Promob XML ingestion: extract, classify, price, persist, aggregate
pub struct IngestService {
    store: Arc<dyn CrmStore>,
    objects: Arc<dyn ObjectStore>,
    classifier: ItemClassifier,
    pricing: PricingConfig,
    ingest: IngestConfig,
}

impl IngestService {
    pub fn new(
        store: Arc<dyn CrmStore>,
        objects: Arc<dyn ObjectStore>,
        pricing: PricingConfig,
        ingest: IngestConfig,
    ) -> Self {
        Self {
            store,
            objects,
            classifier: ItemClassifier::new(&pricing.hardware_keywords),
            pricing,
            ingest,
        }
    }

    /// Processes one uploaded file within the configured time budget
    pub async fn process_file(&self, file_id: Uuid) -> Result<IngestOutcome> {
        let budget = Duration::from_secs(self.ingest.timeout_secs);
        match tokio::time::timeout(budget, self.run(file_id)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!("Promob file {}: ingestion exceeded {:?}", file_id, budget);
                Err(Error::Timeout(budget))
            }
        }
    }

    async fn run(&self, file_id: Uuid) -> Result<IngestOutcome> {
        let store = self.store.as_ref();

        // Phase 1: file record and contents
        let file = store
            .get_promob_file(file_id)
            .await?
            .ok_or(Error::FileNotFound(file_id))?;
        let bytes = self.objects.download(&file.storage_path).await?;
        let xml = decode_xml_bytes(&bytes);

        tracing::info!(
            "Promob file {} ({}): environment {}, {} bytes",
            file.id, file.file_name, file.environment, bytes.len()
        );

        // Phase 2: extract and classify
        let items: Vec<ClassifiedItem> = extract_items(&xml)
            .map(|raw| self.classifier.classify(raw))
            .collect();
        tracing::info!("Promob file {}: extracted {} items", file.id, items.len());

        // Phase 3: run-wide pricing context
        let company = store.get_company_settings(file.company_id).await?;
        let price_table = store.find_active_price_table(file.company_id).await?;
        if price_table.is_none() {
            tracing::warn!("Company {} has no active price table; items stay unpriced", file.company_id);
        }
        let cost_ctx = CostContext::new(price_table, company.as_ref(), &self.pricing.default_loss_pct);
        let margins = MarginResolver::new(file.company_id, MarginDefaults::resolve(company.as_ref(), &self.pricing));

        // Phase 4: budget and per-item pricing
        let budget = aggregator::upsert_budget(store, &file).await?;

        let pending: Vec<_> = items
            .iter()
            .map(|item| self.price_item(&cost_ctx, &margins, &file, budget.id, item))
            .collect();
        let lines: Vec<BudgetLineItem> = stream::iter(pending)
            .buffered(self.pricing.concurrency.max(1))
            .collect()
            .await;
        let unpriced_count = lines.iter().filter(|l| l.no_price).count();

        // Phase 5: persist in one transaction, then aggregate over every item of the budget
        aggregator::persist_items(store, &lines, self.ingest.insert_chunk_size).await?;
        let totals = aggregator::refresh_totals(store, budget.id).await;

        match &totals {
            Some(t) => tracing::info!(
                "Budget {}: {} items added ({} unpriced), totals cost {} price {}",
                budget.id, lines.len(), unpriced_count, t.total_cost, t.total_price
            ),
            None => tracing::info!(
                "Budget {}: {} items added ({} unpriced), totals not refreshed",
                budget.id, lines.len(), unpriced_count
            ),
        }

        Ok(IngestOutcome {
            budget_id: budget.id,
            items_count: lines.len(),
            unpriced_count,
            totals,
        })
    }

    /// Builds the line item for one classified item.
    ///
    /// Lookup failures are logged and leave the item with whatever pricing it
    /// had reached, so one bad item never aborts the batch.
    async fn price_item(
        &self,
        cost_ctx: &CostContext,
        margins: &MarginResolver,
        file: &PromobFile,
        budget_id: Uuid,
        item: &ClassifiedItem,
    ) -> BudgetLineItem {
        let mut line = BudgetLineItem::new(budget_id, file, item);
        if let Err(e) = self.fill_pricing(&mut line, cost_ctx, margins, item).await {
            tracing::warn!(
                "Promob file {}: pricing failed for item '{}' ({}): {}",
                file.id, item.raw.reference, item.raw.description, e
            );
        }
        line
    }

    async fn fill_pricing(
        &self,
        line: &mut BudgetLineItem,
        cost_ctx: &CostContext,
        margins: &MarginResolver,
        item: &ClassifiedItem,
    ) -> Result<()> {
        let store = self.store.as_ref();

        let unit_cost = match resolve_unit_cost(store, cost_ctx, item).await? {
            CostOutcome::Priced(cost) => cost,
            CostOutcome::Unpriced(reason) => {
                tracing::debug!("Item '{}' ({}) unpriced: {}", item.raw.reference, item.category, reason);
                line.no_price = true;
                return Ok(());
            }
        };
        line.set_unit_cost(unit_cost);

        let margin_pct = margins.margin_pct(store, item.category, &line.environment).await?;
        let unit_price = apply_margin(&line.unit_cost, &margin_pct);
        line.set_unit_price(unit_price);
        Ok(())
    }

    pub async fn budget_detail(&self, budget_id: Uuid) -> Result<BudgetDetail> {
        let budget = self
            .store
            .get_budget(budget_id)
            .await?
            .ok_or(Error::BudgetNotFound(budget_id))?;
        let items = self.store.list_budget_items(budget_id).await?;
        Ok(BudgetDetail { budget, items })
    }

    pub async fn export_budget_csv(&self, budget_id: Uuid) -> Result<Vec<u8>> {
        let detail = self.budget_detail(budget_id).await?;
        budget_items_to_csv(&detail.items)
    }
}
