use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::Expense;

/// Number of expenses shown in the recent-expenses list.
const RECENT_EXPENSES: usize = 5;

/// Aggregate view of the current month, computed server-side.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardSummary {
    #[serde(rename = "total_gasto", default)]
    pub total_spent: f64,
    #[serde(rename = "economia_potencial", default)]
    pub potential_savings: f64,
    #[serde(rename = "renda_mensal", default)]
    pub monthly_income: f64,
    /// Totals keyed by category wire name.
    #[serde(rename = "gastos_categoria", default)]
    pub by_category: HashMap<String, f64>,
    #[serde(rename = "gastos_mes", default)]
    pub month_expenses: Vec<Expense>,
}

impl DashboardSummary {
    /// Most recent expenses, newest first.
    pub fn recent_expenses(&self) -> Vec<&Expense> {
        self.month_expenses
            .iter()
            .rev()
            .take(RECENT_EXPENSES)
            .collect()
    }
}

/// Investment suggestion derived from income and current-month spending.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvestmentOutlook {
    #[serde(rename = "renda_mensal", default)]
    pub monthly_income: f64,
    #[serde(rename = "gastos_totais", default)]
    pub total_expenses: f64,
    #[serde(rename = "sobra_mensal", default)]
    pub monthly_surplus: f64,
    #[serde(rename = "sugestao_investimento", default)]
    pub suggested_investment: f64,
    #[serde(rename = "dicas", default)]
    pub tips: Vec<String>,
}

/// Assistant reply. When the assistant recognizes an expense in the
/// message, it records it server-side and flags it here.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatReply {
    #[serde(rename = "resposta")]
    pub reply: String,
    #[serde(rename = "gasto_detectado", default)]
    pub expense_detected: bool,
    #[serde(rename = "gasto", default)]
    pub expense: Option<Expense>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatSender {
    User,
    Assistant,
}

/// One entry in the chat transcript.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub sender: ChatSender,
    pub text: String,
}

/// Result of a compound-interest simulation, rounded to currency precision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationResult {
    pub final_value: f64,
    pub earnings: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;

    fn expense(description: &str) -> Expense {
        Expense {
            id: None,
            amount: 10.0,
            category: Category::Other,
            description: description.to_string(),
            is_impulsive: false,
            date: None,
        }
    }

    #[test]
    fn test_recent_expenses_newest_first() {
        let mut summary = DashboardSummary::default();
        for i in 0..7 {
            summary.month_expenses.push(expense(&format!("gasto {}", i)));
        }

        let recent = summary.recent_expenses();
        assert_eq!(recent.len(), 5);
        assert_eq!(recent[0].description, "gasto 6");
        assert_eq!(recent[4].description, "gasto 2");
    }

    #[test]
    fn test_chat_reply_without_expense() {
        let json = r#"{"resposta": "Não consegui identificar um valor", "gasto_detectado": false}"#;
        let reply: ChatReply = serde_json::from_str(json).expect("reply should parse");
        assert!(!reply.expense_detected);
        assert!(reply.expense.is_none());
    }
}
