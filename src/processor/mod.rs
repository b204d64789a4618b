pub mod alerts;
pub mod ingest;

pub use ingest::{ingest, IngestError};
