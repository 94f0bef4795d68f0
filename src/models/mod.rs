//! Data models for WalletCare entities.
//!
//! This module contains all the data structures exchanged with the
//! WalletCare API and held by the state controller:
//!
//! - `Expense`, `ExpenseDraft`, `Category`: recorded spending events
//! - `AppConfig`, `ConfigPatch`, `Theme`: per-device configuration
//! - `DashboardSummary`, `InvestmentOutlook`: aggregate views
//! - `ChatReply`, `ChatMessage`: assistant conversation
//!
//! Wire names follow the server's Portuguese field names; the Rust
//! identifiers are English.

pub mod config;
pub mod expense;
pub mod insights;

pub use config::{AppConfig, ConfigPatch, Theme};
pub use expense::{Category, Expense, ExpenseDraft};
pub use insights::{
    ChatMessage, ChatReply, ChatSender, DashboardSummary, InvestmentOutlook, SimulationResult,
};
