//! Query pipeline entry point

pub mod orchestrator;

pub use orchestrator::{QueryConfig, QueryDiagnostics, QueryOptions, QueryOrchestrator, QueryOutcome};
