//! Unit test harness.

mod orchestrator_service;
mod supervisor;
