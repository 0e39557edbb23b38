//! Core domain types and logic.

pub mod instrument;
pub mod series;
pub mod position;
pub mod portfolio;
pub mod order;
pub mod ledger;
pub mod strategy;
pub mod signal;
pub mod engine;
pub mod analytics;
pub mod config;
pub mod error;
