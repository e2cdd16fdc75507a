pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod service;
pub mod storage;

pub use crate::config::AppConfig;
pub use db::{create_pool, CrmStore, MemoryStore, PgStore};
pub use error::{Error, Result};
pub use service::{IngestOutcome, IngestService};
pub use storage::{LocalObjectStore, MemoryObjectStore, ObjectStore};
