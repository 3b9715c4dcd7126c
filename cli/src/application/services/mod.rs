//! Application services — use-cases composed from ports and domain logic.

pub mod ledger;
pub mod orchestrator;
pub mod registry;
