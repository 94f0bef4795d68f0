//! REST API client module for the WalletCare service.
//!
//! This module provides the `ApiClient` for communicating with the
//! WalletCare API (configuration, expenses, dashboard, assistant chat,
//! reports and investment data), and the `ExpenseApi` trait the state
//! controller is written against so tests can substitute an in-memory
//! gateway.
//!
//! The API is unauthenticated; requests are scoped server-side by the
//! device identity sent with every device-bound call.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;

use anyhow::Result;

use crate::models::{
    AppConfig, ChatReply, ConfigPatch, DashboardSummary, Expense, ExpenseDraft, InvestmentOutlook,
};

/// Gateway to the remote API, as seen by the state controller.
#[allow(async_fn_in_trait)]
pub trait ExpenseApi {
    /// Fetch the configuration scoped to this device.
    async fn fetch_config(&self, device_id: &str) -> Result<AppConfig>;

    /// Apply a partial configuration update; the server performs the merge
    /// and returns the authoritative configuration.
    async fn save_config(&self, device_id: &str, patch: &ConfigPatch) -> Result<AppConfig>;

    /// Fetch the full expense list scoped to this device.
    async fn fetch_expenses(&self, device_id: &str) -> Result<Vec<Expense>>;

    /// Submit an expense draft; returns the canonical record with the
    /// server-assigned id and timestamp.
    async fn save_expense(&self, device_id: &str, draft: &ExpenseDraft) -> Result<Expense>;

    /// Fetch the current-month dashboard aggregates.
    async fn fetch_dashboard(&self) -> Result<DashboardSummary>;

    /// Send a chat message to the assistant.
    async fn send_chat(&self, message: &str) -> Result<ChatReply>;

    /// Download the expense report as PDF bytes.
    async fn fetch_report_pdf(&self) -> Result<Vec<u8>>;

    /// Fetch investment suggestions.
    async fn fetch_investments(&self) -> Result<InvestmentOutlook>;

    /// Delete every expense recorded for this device.
    async fn reset_expenses(&self, device_id: &str) -> Result<()>;
}
