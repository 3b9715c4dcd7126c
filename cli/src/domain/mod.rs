//! Pure domain types and functions — no I/O, no async, no infra imports.

pub mod error;
pub mod ledger;
pub mod paths;
pub mod registry;
