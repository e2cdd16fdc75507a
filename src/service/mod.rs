pub mod aggregator;
pub mod classifier;
pub mod export;
pub mod extractor;
pub mod ingest;
pub mod margin;
pub mod pricing;

pub use classifier::ItemClassifier;
pub use ingest::{IngestOutcome, IngestService};
