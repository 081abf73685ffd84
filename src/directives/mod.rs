//! Directive records and the store seam

pub mod models;
pub mod store;

pub use models::{Directive, DirectiveFilter, Severity};
pub use store::{DirectiveStore, InMemoryDirectiveStore};
