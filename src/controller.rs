//! Application state management for the WalletCare client.
//!
//! This module contains the `AppController`, the single authoritative
//! owner of in-memory state (configuration, expense list, active tab,
//! chat transcript, recording flag). Every state transition goes through
//! it: it mediates all reads/writes against the remote API and drives
//! the dependent view-refresh cascade after each mutating action.
//!
//! Failure policy: network failures are caught here, logged, and turned
//! into a transient toast. State is either replaced wholesale from a
//! successful server response or left at its prior value - never
//! half-applied. A save's refresh cascade runs strictly after the save's
//! success confirmation.

use tracing::{debug, error, info, warn};

use crate::api::ExpenseApi;
use crate::models::{
    AppConfig, ChatMessage, ChatSender, ConfigPatch, DashboardSummary, Expense, ExpenseDraft,
    InvestmentOutlook, SimulationResult,
};
use crate::view::{SpeechCapability, ToastKind, ViewSink};

// ============================================================================
// Constants
// ============================================================================

/// Phrase the user must type to confirm a full expense reset.
pub const RESET_CONFIRMATION_PHRASE: &str = "RESETAR";

/// Canned assistant reply when the chat request fails.
const CHAT_FAILURE_REPLY: &str = "Desculpe, ocorreu um erro. Tente novamente.";

// ============================================================================
// UI State Types
// ============================================================================

/// Main navigation tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Dashboard,
    Reports,
    Investments,
    Settings,
}

impl Tab {
    /// Get the display title for this tab.
    pub fn title(&self) -> &'static str {
        match self {
            Tab::Dashboard => "Dashboard",
            Tab::Reports => "Relatórios",
            Tab::Investments => "Investimentos",
            Tab::Settings => "Configurações",
        }
    }
}

// ============================================================================
// Pure operations
// ============================================================================

/// The reset confirmation matches case-insensitively, nothing else.
pub fn reset_confirmation_valid(text: &str) -> bool {
    text.eq_ignore_ascii_case(RESET_CONFIRMATION_PHRASE)
}

fn round_currency(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Compound-interest projection: `final = principal * (1 + rate)^periods`.
/// Returns `None` when any input is non-positive or non-numeric; results
/// are rounded to currency precision.
pub fn simulate_investment(principal: f64, periods: f64, rate: f64) -> Option<SimulationResult> {
    let valid = |v: f64| v.is_finite() && v > 0.0;
    if !valid(principal) || !valid(periods) || !valid(rate) {
        return None;
    }

    let final_value = principal * (1.0 + rate).powf(periods);
    Some(SimulationResult {
        final_value: round_currency(final_value),
        earnings: round_currency(final_value - principal),
    })
}

// ============================================================================
// Main Controller Struct
// ============================================================================

/// State controller, generic over the API gateway and the view sink so
/// the logic layer runs in tests without a server or a screen.
pub struct AppController<A, V> {
    api: A,
    view: V,
    speech: Box<dyn SpeechCapability>,

    device_id: String,

    // Application state
    pub config: AppConfig,
    pub expenses: Vec<Expense>,
    pub current_tab: Tab,
    pub chat_log: Vec<ChatMessage>,
    pub recording: bool,

    // Latest aggregate snapshots, kept for redundant view refreshes
    pub dashboard: DashboardSummary,
    pub investments: InvestmentOutlook,

    // The unsupported-voice notice is shown only once
    speech_notice_shown: bool,
}

impl<A: ExpenseApi, V: ViewSink> AppController<A, V> {
    pub fn new(api: A, view: V, speech: Box<dyn SpeechCapability>, device_id: String) -> Self {
        Self {
            api,
            view,
            speech,
            device_id,
            config: AppConfig::default(),
            expenses: Vec::new(),
            current_tab: Tab::Dashboard,
            chat_log: Vec::new(),
            recording: false,
            dashboard: DashboardSummary::default(),
            investments: InvestmentOutlook::default(),
            speech_notice_shown: false,
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Load the device configuration, falling back to the safe default on
    /// any failure. Never fails from the caller's perspective.
    pub async fn load_configuration(&mut self) {
        match self.api.fetch_config(&self.device_id).await {
            Ok(config) => {
                debug!(income = config.monthly_income, "Configuration loaded");
                self.config = config;
            }
            Err(e) => {
                warn!(error = %e, "Failed to load configuration, using defaults");
                self.config = AppConfig::default();
            }
        }
    }

    /// Apply a partial configuration update. On success the local copy is
    /// replaced with the server's authoritative response.
    pub async fn save_configuration(&mut self, patch: ConfigPatch) -> bool {
        match self.api.save_config(&self.device_id, &patch).await {
            Ok(config) => {
                self.config = config;
                self.view
                    .toast(ToastKind::Success, "Configuração salva com sucesso!");
                true
            }
            Err(e) => {
                error!(error = %e, "Failed to save configuration");
                self.view.toast(ToastKind::Error, "Erro ao salvar configuração");
                false
            }
        }
    }

    /// Flip the UI theme and persist it like any other configuration
    /// change.
    pub async fn toggle_theme(&mut self) -> bool {
        let patch = ConfigPatch::theme(self.config.theme.toggled());
        self.save_configuration(patch).await
    }

    // =========================================================================
    // Expenses
    // =========================================================================

    /// Fetch the full expense list, replacing the local copy entirely.
    /// On failure the prior state is left untouched and an empty list is
    /// returned.
    pub async fn load_expenses(&mut self) -> Vec<Expense> {
        match self.api.fetch_expenses(&self.device_id).await {
            Ok(expenses) => {
                debug!(count = expenses.len(), "Expenses loaded");
                self.expenses = expenses.clone();
                expenses
            }
            Err(e) => {
                error!(error = %e, "Failed to load expenses");
                Vec::new()
            }
        }
    }

    /// Validate and submit an expense draft. The dashboard refresh cascade
    /// runs only after the server has confirmed the save.
    pub async fn save_expense(&mut self, draft: ExpenseDraft) -> bool {
        if let Err(message) = draft.validate() {
            self.view.toast(ToastKind::Warning, message);
            return false;
        }

        let draft = draft.normalized();
        match self.api.save_expense(&self.device_id, &draft).await {
            Ok(expense) => {
                self.expenses.push(expense);
                self.view
                    .toast(ToastKind::Success, "Gasto registrado com sucesso!");
                self.load_dashboard().await;
                true
            }
            Err(e) => {
                error!(error = %e, "Failed to save expense");
                self.view.toast(ToastKind::Error, "Erro ao salvar gasto");
                false
            }
        }
    }

    /// Delete every expense for this device. Requires the exact
    /// confirmation phrase; on success the local list is cleared and the
    /// dependent views refreshed. Server failures surface their message
    /// verbatim.
    pub async fn reset_all_expenses(&mut self, confirmation: &str) -> bool {
        if !reset_confirmation_valid(confirmation) {
            self.view
                .toast(ToastKind::Warning, "Digite RESETAR para confirmar");
            return false;
        }

        self.view.show_loading();
        let result = self.api.reset_expenses(&self.device_id).await;
        self.view.hide_loading();

        match result {
            Ok(()) => {
                info!("All expenses reset");
                self.expenses.clear();
                self.view
                    .toast(ToastKind::Success, "Todos os gastos foram resetados!");
                self.load_dashboard().await;
                self.view
                    .settings_refreshed(&self.config, &self.expenses);
                true
            }
            Err(e) => {
                error!(error = %e, "Failed to reset expenses");
                self.view
                    .toast(ToastKind::Error, &format!("Erro ao resetar gastos: {}", e));
                false
            }
        }
    }

    // =========================================================================
    // Tabs and view refresh
    // =========================================================================

    /// Switch the active tab and reload its data. Idempotent: re-selecting
    /// the current tab just reloads it.
    pub async fn switch_tab(&mut self, tab: Tab) {
        self.current_tab = tab;
        self.view.tab_changed(tab);
        self.load_tab_data(tab).await;
    }

    async fn load_tab_data(&mut self, tab: Tab) {
        match tab {
            Tab::Dashboard => self.load_dashboard().await,
            Tab::Reports => self.load_reports().await,
            Tab::Investments => self.load_investments().await,
            Tab::Settings => self.load_settings().await,
        }
    }

    /// Refresh the dashboard cards, charts and recent-expense list.
    /// Safe to invoke redundantly.
    pub async fn load_dashboard(&mut self) {
        self.view.show_loading();
        match self.api.fetch_dashboard().await {
            Ok(summary) => {
                self.dashboard = summary;
                self.view.dashboard_refreshed(&self.dashboard);
            }
            Err(e) => {
                error!(error = %e, "Failed to load dashboard");
                self.view
                    .toast(ToastKind::Error, "Erro ao carregar dados do dashboard");
            }
        }
        self.view.hide_loading();
    }

    pub async fn load_reports(&mut self) {
        self.load_expenses().await;
        self.view.reports_refreshed(&self.expenses);
    }

    pub async fn load_investments(&mut self) {
        self.view.show_loading();
        match self.api.fetch_investments().await {
            Ok(outlook) => {
                self.investments = outlook;
                self.view.investments_refreshed(&self.investments);
            }
            Err(e) => {
                error!(error = %e, "Failed to load investments");
                self.view
                    .toast(ToastKind::Error, "Erro ao carregar dados de investimento");
            }
        }
        self.view.hide_loading();
    }

    pub async fn load_settings(&mut self) {
        self.load_configuration().await;
        self.load_expenses().await;
        self.view.settings_refreshed(&self.config, &self.expenses);
    }

    // =========================================================================
    // Assistant chat
    // =========================================================================

    /// Send a chat message to the assistant. When the assistant recorded
    /// an expense from the message, the dashboard is refreshed.
    pub async fn send_chat_message(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        self.append_chat(ChatSender::User, text);

        match self.api.send_chat(text).await {
            Ok(reply) => {
                self.append_chat(ChatSender::Assistant, &reply.reply);
                if reply.expense_detected {
                    debug!("Assistant recorded an expense, refreshing dashboard");
                    self.load_dashboard().await;
                }
            }
            Err(e) => {
                error!(error = %e, "Chat request failed");
                self.append_chat(ChatSender::Assistant, CHAT_FAILURE_REPLY);
            }
        }
    }

    fn append_chat(&mut self, sender: ChatSender, text: &str) {
        let message = ChatMessage {
            sender,
            text: text.to_string(),
        };
        self.view.chat_appended(&message);
        self.chat_log.push(message);
    }

    /// Toggle voice recording. When the capability is absent the feature
    /// stays disabled and the user is notified once.
    pub fn toggle_recording(&mut self) {
        if !self.speech.available() {
            if !self.speech_notice_shown {
                self.view
                    .toast(ToastKind::Warning, "Reconhecimento de voz não suportado");
                self.speech_notice_shown = true;
            }
            return;
        }

        self.recording = !self.recording;
        if self.recording {
            self.view.toast(ToastKind::Success, "Gravando... Fale agora!");
        }
        self.view.recording_changed(self.recording);
    }

    // =========================================================================
    // Reports and investments
    // =========================================================================

    /// Download the PDF report and hand the bytes to the view.
    pub async fn download_report(&mut self) -> bool {
        self.view.show_loading();
        let result = self.api.fetch_report_pdf().await;
        self.view.hide_loading();

        match result {
            Ok(pdf) => {
                self.view.report_ready(&pdf);
                self.view
                    .toast(ToastKind::Success, "Relatório PDF gerado com sucesso!");
                true
            }
            Err(e) => {
                error!(error = %e, "Failed to generate PDF report");
                self.view.toast(ToastKind::Error, "Erro ao gerar relatório PDF");
                false
            }
        }
    }

    /// Run the compound-interest simulation. Pure computation, no network.
    pub fn run_simulation(
        &mut self,
        principal: f64,
        periods: f64,
        rate: f64,
    ) -> Option<SimulationResult> {
        match simulate_investment(principal, periods, rate) {
            Some(result) => {
                self.view.simulation_ready(&result);
                Some(result)
            }
            None => {
                self.view
                    .toast(ToastKind::Warning, "Preencha todos os campos da simulação");
                None
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
