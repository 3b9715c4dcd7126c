//! Application layer — port contracts and use-case services.

pub mod ports;
pub mod services;
