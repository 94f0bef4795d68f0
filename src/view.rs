//! View seam between the state controller and whatever renders it.
//!
//! The controller never touches a screen directly: it reports state
//! changes through `ViewSink` and probes optional device capabilities
//! through `SpeechCapability`. Production wires in a real renderer;
//! tests wire in recording fakes.

use crate::controller::Tab;
use crate::models::{
    AppConfig, Category, ChatMessage, DashboardSummary, Expense, InvestmentOutlook,
    SimulationResult,
};

/// Severity of a transient, auto-dismissing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Warning,
    Error,
}

/// Receiver for view updates driven by the state controller.
///
/// Every method has a no-op default so implementations only bind the
/// surfaces they render. All refresh hooks must be idempotent; the
/// controller may invoke them redundantly.
pub trait ViewSink {
    fn toast(&mut self, kind: ToastKind, message: &str) {
        let _ = (kind, message);
    }

    fn show_loading(&mut self) {}
    fn hide_loading(&mut self) {}

    fn tab_changed(&mut self, tab: Tab) {
        let _ = tab;
    }

    fn dashboard_refreshed(&mut self, summary: &DashboardSummary) {
        let _ = summary;
    }

    fn reports_refreshed(&mut self, expenses: &[Expense]) {
        let _ = expenses;
    }

    fn investments_refreshed(&mut self, outlook: &InvestmentOutlook) {
        let _ = outlook;
    }

    fn settings_refreshed(&mut self, config: &AppConfig, expenses: &[Expense]) {
        let _ = (config, expenses);
    }

    fn chat_appended(&mut self, message: &ChatMessage) {
        let _ = message;
    }

    fn recording_changed(&mut self, recording: bool) {
        let _ = recording;
    }

    fn simulation_ready(&mut self, result: &SimulationResult) {
        let _ = result;
    }

    fn report_ready(&mut self, pdf: &[u8]) {
        let _ = pdf;
    }
}

/// Probe for voice input support. Absence is a first-class state: the
/// controller disables the feature and notifies once instead of failing.
pub trait SpeechCapability {
    fn available(&self) -> bool;
}

/// Capability provider for environments without voice input.
pub struct SpeechUnavailable;

impl SpeechCapability for SpeechUnavailable {
    fn available(&self) -> bool {
        false
    }
}

/// Minimal sink that prints toasts and dashboard summaries to the console.
#[derive(Default)]
pub struct ConsoleView;

impl ViewSink for ConsoleView {
    fn toast(&mut self, kind: ToastKind, message: &str) {
        let prefix = match kind {
            ToastKind::Success => "ok",
            ToastKind::Warning => "aviso",
            ToastKind::Error => "erro",
        };
        println!("[{}] {}", prefix, message);
    }

    fn tab_changed(&mut self, tab: Tab) {
        println!("== {} ==", tab.title());
    }

    fn dashboard_refreshed(&mut self, summary: &DashboardSummary) {
        println!("Total gasto no mês:   R$ {:.2}", summary.total_spent);
        println!("Economia potencial:   R$ {:.2}", summary.potential_savings);
        println!("Renda mensal:         R$ {:.2}", summary.monthly_income);
        for (name, total) in &summary.by_category {
            let label = Category::from_wire(name).map_or(name.as_str(), |c| c.display_name());
            println!("  {}: R$ {:.2}", label, total);
        }
        for expense in summary.recent_expenses() {
            println!(
                "  - {} ({}) R$ {:.2}",
                expense.description,
                expense.category.display_name(),
                expense.amount
            );
        }
    }

    fn investments_refreshed(&mut self, outlook: &InvestmentOutlook) {
        println!("Sobra mensal:         R$ {:.2}", outlook.monthly_surplus);
        println!("Sugestão de aporte:   R$ {:.2}", outlook.suggested_investment);
        for tip in &outlook.tips {
            println!("  * {}", tip);
        }
    }

    fn reports_refreshed(&mut self, expenses: &[Expense]) {
        println!("{} gastos registrados", expenses.len());
        for expense in expenses {
            println!(
                "  - {} ({}) R$ {:.2}",
                expense.description,
                expense.category.display_name(),
                expense.amount
            );
        }
    }

    fn settings_refreshed(&mut self, config: &AppConfig, expenses: &[Expense]) {
        let theme = match config.theme {
            crate::models::Theme::Light => "claro",
            crate::models::Theme::Dark => "dark",
        };
        println!(
            "Renda mensal: R$ {:.2} | Tema: {} | {} gastos",
            config.monthly_income,
            theme,
            expenses.len()
        );
    }

    fn chat_appended(&mut self, message: &ChatMessage) {
        let speaker = match message.sender {
            crate::models::ChatSender::User => "você",
            crate::models::ChatSender::Assistant => "assistente",
        };
        println!("[{}] {}", speaker, message.text);
    }

    fn simulation_ready(&mut self, result: &SimulationResult) {
        println!(
            "Valor final: R$ {:.2} (rendimento R$ {:.2})",
            result.final_value, result.earnings
        );
    }

    fn report_ready(&mut self, pdf: &[u8]) {
        const REPORT_FILE: &str = "relatorio-walletcare.pdf";
        match std::fs::write(REPORT_FILE, pdf) {
            Ok(()) => println!("Relatório salvo em {}", REPORT_FILE),
            Err(e) => println!("[erro] Não foi possível salvar o relatório: {}", e),
        }
    }
}
