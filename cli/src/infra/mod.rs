//! Infrastructure implementations of the application ports.

pub mod config;
pub mod restic;
pub mod supervisor;
pub mod tools;
