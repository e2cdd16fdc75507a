#![allow(dead_code)]

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::Utc;
use promob_budget::config::{IngestConfig, PricingConfig};
use promob_budget::models::{
    Budget, BudgetLineItem, BudgetTotals, CompanySettings, HardwarePrice, ItemCategory,
    MarginRule, PriceTable, PromobFile, SheetPrice,
};
use promob_budget::{CrmStore, Error, IngestService, MemoryObjectStore, MemoryStore, ObjectStore, Result};
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Two items: an MDF door and a handle
pub const SCENARIO_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Promob>
  <Items>
    <Item><Referencia>C001</Referencia><Descricao>Porta</Descricao><Largura>600</Largura><Profundidade>500</Profundidade><Material>MDF</Material><Espessura>15mm</Espessura><Quantidade>2</Quantidade></Item>
    <Item><Referencia>FERR-01</Referencia><Descricao>Puxador</Descricao><Quantidade>4</Quantidade></Item>
  </Items>
</Promob>"#;

pub fn dec(s: &str) -> BigDecimal {
    BigDecimal::from_str(s).unwrap()
}

/// Company with an active price table (MDF/15mm at 80 per m², FERR-01 at 5.00)
pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub objects: Arc<MemoryObjectStore>,
    pub company_id: Uuid,
    pub project_id: Uuid,
    pub customer_id: Uuid,
    pub price_table_id: Uuid,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_company(|_| {})
    }

    /// Lets a test set company-level defaults before seeding
    pub fn with_company(configure: impl FnOnce(&mut CompanySettings)) -> Self {
        let store = Arc::new(MemoryStore::new());
        let company_id = Uuid::new_v4();

        let mut company = CompanySettings {
            id: company_id,
            ..Default::default()
        };
        configure(&mut company);
        store.add_company(company);

        let price_table_id = Uuid::new_v4();
        store.add_price_table(PriceTable {
            id: price_table_id,
            company_id,
            name: "Tabela 2026".to_string(),
            is_active: true,
            created_at: Utc::now(),
        });
        store.add_sheet_price(SheetPrice {
            id: Uuid::new_v4(),
            price_table_id,
            material: "MDF".to_string(),
            thickness: "15mm".to_string(),
            price_per_m2: dec("80"),
        });
        store.add_hardware_price(HardwarePrice {
            id: Uuid::new_v4(),
            price_table_id,
            reference: "FERR-01".to_string(),
            unit_price: dec("5.00"),
        });

        Self {
            store,
            objects: Arc::new(MemoryObjectStore::new()),
            company_id,
            project_id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            price_table_id,
        }
    }

    /// Company without any active price table
    pub fn without_price_table() -> Self {
        let store = Arc::new(MemoryStore::new());
        let company_id = Uuid::new_v4();
        store.add_company(CompanySettings {
            id: company_id,
            ..Default::default()
        });
        Self {
            store,
            objects: Arc::new(MemoryObjectStore::new()),
            company_id,
            project_id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            price_table_id: Uuid::nil(),
        }
    }

    pub fn service(&self) -> Arc<IngestService> {
        self.service_with(IngestConfig::default())
    }

    pub fn service_with(&self, ingest: IngestConfig) -> Arc<IngestService> {
        self.service_with_objects(self.objects.clone(), ingest)
    }

    pub fn service_with_objects(&self, objects: Arc<dyn ObjectStore>, ingest: IngestConfig) -> Arc<IngestService> {
        Arc::new(IngestService::new(
            self.store.clone(),
            objects,
            PricingConfig::default(),
            ingest,
        ))
    }

    /// Service over a store that fails on demand, backed by the fixture's data
    pub fn flaky_service(&self) -> (Arc<FlakyStore>, Arc<IngestService>) {
        let flaky = Arc::new(FlakyStore::new(self.store.clone()));
        let service = Arc::new(IngestService::new(
            flaky.clone(),
            self.objects.clone(),
            PricingConfig::default(),
            IngestConfig::default(),
        ));
        (flaky, service)
    }

    /// Registers a file record for the fixture's project/customer and stores its XML
    pub fn upload(&self, environment: &str, xml: &str) -> Uuid {
        self.upload_for(self.customer_id, environment, xml)
    }

    pub fn upload_for(&self, customer_id: Uuid, environment: &str, xml: &str) -> Uuid {
        let file = self.register(customer_id, environment);
        self.objects.put(&file.storage_path, xml);
        file.id
    }

    /// File record without stored contents
    pub fn register(&self, customer_id: Uuid, environment: &str) -> PromobFile {
        let id = Uuid::new_v4();
        let file = PromobFile {
            id,
            company_id: self.company_id,
            project_id: self.project_id,
            customer_id,
            environment: environment.to_string(),
            storage_path: format!("{}/{}/{}.xml", self.project_id, customer_id, id),
            file_name: format!("{}_{}.xml", customer_id, environment),
        };
        self.store.add_file(file.clone());
        file
    }
}

/// Delegates to a `MemoryStore`, failing selected calls like a dropped connection
pub struct FlakyStore {
    inner: Arc<MemoryStore>,
    failing_references: Mutex<HashSet<String>>,
    failing_inserts: AtomicUsize,
    failing_recompute: AtomicBool,
}

impl FlakyStore {
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            failing_references: Mutex::new(HashSet::new()),
            failing_inserts: AtomicUsize::new(0),
            failing_recompute: AtomicBool::new(false),
        }
    }

    pub fn fail_hardware_lookup(&self, reference: &str) {
        self.failing_references.lock().unwrap().insert(reference.to_string());
    }

    /// The next `count` line-item inserts fail
    pub fn fail_inserts(&self, count: usize) {
        self.failing_inserts.store(count, Ordering::SeqCst);
    }

    pub fn fail_recompute(&self, fail: bool) {
        self.failing_recompute.store(fail, Ordering::SeqCst);
    }

    fn connection_reset() -> Error {
        Error::Internal("connection reset".to_string())
    }
}

#[async_trait]
impl CrmStore for FlakyStore {
    async fn get_promob_file(&self, file_id: Uuid) -> Result<Option<PromobFile>> {
        self.inner.get_promob_file(file_id).await
    }

    async fn get_company_settings(&self, company_id: Uuid) -> Result<Option<CompanySettings>> {
        self.inner.get_company_settings(company_id).await
    }

    async fn find_active_price_table(&self, company_id: Uuid) -> Result<Option<PriceTable>> {
        self.inner.find_active_price_table(company_id).await
    }

    async fn find_sheet_price(
        &self,
        price_table_id: Uuid,
        material: &str,
        thickness: &str,
    ) -> Result<Option<SheetPrice>> {
        self.inner.find_sheet_price(price_table_id, material, thickness).await
    }

    async fn find_hardware_price(&self, price_table_id: Uuid, reference: &str) -> Result<Option<HardwarePrice>> {
        if self.failing_references.lock().unwrap().contains(reference) {
            return Err(Self::connection_reset());
        }
        self.inner.find_hardware_price(price_table_id, reference).await
    }

    async fn find_margin_rule(
        &self,
        company_id: Uuid,
        category: ItemCategory,
        environment: &str,
    ) -> Result<Option<MarginRule>> {
        self.inner.find_margin_rule(company_id, category, environment).await
    }

    async fn upsert_budget(&self, company_id: Uuid, project_id: Uuid, customer_id: Uuid) -> Result<Budget> {
        self.inner.upsert_budget(company_id, project_id, customer_id).await
    }

    async fn insert_line_items(&self, items: &[BudgetLineItem], chunk_size: usize) -> Result<u64> {
        let failing = self
            .failing_inserts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(Self::connection_reset());
        }
        self.inner.insert_line_items(items, chunk_size).await
    }

    async fn recompute_budget_totals(&self, budget_id: Uuid) -> Result<BudgetTotals> {
        if self.failing_recompute.load(Ordering::SeqCst) {
            return Err(Self::connection_reset());
        }
        self.inner.recompute_budget_totals(budget_id).await
    }

    async fn get_budget(&self, budget_id: Uuid) -> Result<Option<Budget>> {
        self.inner.get_budget(budget_id).await
    }

    async fn list_budget_items(&self, budget_id: Uuid) -> Result<Vec<BudgetLineItem>> {
        self.inner.list_budget_items(budget_id).await
    }
}
