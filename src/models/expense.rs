use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Expense category, serialized with the server's wire names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "alimentacao")]
    Food,
    #[serde(rename = "jogos")]
    Games,
    #[serde(rename = "bebidas")]
    Drinks,
    #[serde(rename = "entretenimento")]
    Entertainment,
    #[serde(rename = "outros")]
    Other,
    #[serde(rename = "nao_essencial")]
    NonEssential,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Food,
        Category::Games,
        Category::Drinks,
        Category::Entertainment,
        Category::Other,
        Category::NonEssential,
    ];

    /// Name as it appears on the wire and in server-side storage.
    pub fn wire_name(&self) -> &'static str {
        match self {
            Category::Food => "alimentacao",
            Category::Games => "jogos",
            Category::Drinks => "bebidas",
            Category::Entertainment => "entretenimento",
            Category::Other => "outros",
            Category::NonEssential => "nao_essencial",
        }
    }

    /// Human-readable display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Category::Food => "Alimentação",
            Category::Games => "Jogos",
            Category::Drinks => "Bebidas",
            Category::Entertainment => "Entretenimento",
            Category::Other => "Outros",
            Category::NonEssential => "Não Essencial",
        }
    }

    pub fn from_wire(name: &str) -> Option<Self> {
        Category::ALL.iter().copied().find(|c| c.wire_name() == name)
    }
}

/// A recorded spending event. `id` and `date` are assigned by the server;
/// drafts submitted by the user never carry them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(rename = "valor")]
    pub amount: f64,
    #[serde(rename = "categoria")]
    pub category: Category,
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "eh_impulsivo", default)]
    pub is_impulsive: bool,
    #[serde(rename = "data", default)]
    pub date: Option<NaiveDateTime>,
}

/// User-submitted expense before it has been accepted by the server.
#[derive(Debug, Clone, Serialize)]
pub struct ExpenseDraft {
    #[serde(rename = "valor")]
    pub amount: f64,
    #[serde(rename = "categoria")]
    pub category: Option<Category>,
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "eh_impulsivo")]
    pub is_impulsive: bool,
}

impl ExpenseDraft {
    /// Client-side validation run before any network call.
    pub fn validate(&self) -> Result<(), &'static str> {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err("Informe um valor maior que zero");
        }
        if self.category.is_none() {
            return Err("Escolha uma categoria");
        }
        if self.description.trim().is_empty() {
            return Err("Preencha a descrição do gasto");
        }
        Ok(())
    }

    /// An impulsive purchase is filed under the non-essential category
    /// regardless of what the user picked.
    pub fn normalized(mut self) -> Self {
        if self.is_impulsive {
            self.category = Some(Category::NonEssential);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> ExpenseDraft {
        ExpenseDraft {
            amount: 50.0,
            category: Some(Category::Food),
            description: "lunch".to_string(),
            is_impulsive: false,
        }
    }

    #[test]
    fn test_valid_draft_passes() {
        assert!(draft().validate().is_ok());
    }

    #[test]
    fn test_draft_rejects_missing_fields() {
        let mut d = draft();
        d.amount = 0.0;
        assert!(d.validate().is_err());

        let mut d = draft();
        d.amount = f64::NAN;
        assert!(d.validate().is_err());

        let mut d = draft();
        d.category = None;
        assert!(d.validate().is_err());

        let mut d = draft();
        d.description = "   ".to_string();
        assert!(d.validate().is_err());
    }

    #[test]
    fn test_impulsive_draft_refiled_as_non_essential() {
        let mut d = draft();
        d.is_impulsive = true;
        let d = d.normalized();
        assert_eq!(d.category, Some(Category::NonEssential));

        // Non-impulsive drafts keep their category
        let d = draft().normalized();
        assert_eq!(d.category, Some(Category::Food));
    }

    #[test]
    fn test_expense_parses_server_wire_format() {
        let json = r#"{
            "id": 1,
            "valor": 25.5,
            "categoria": "alimentacao",
            "descricao": "Pizza",
            "eh_impulsivo": false,
            "data": "2025-03-14T12:30:05.123456"
        }"#;

        let expense: Expense = serde_json::from_str(json).expect("wire format should parse");
        assert_eq!(expense.id, Some(1));
        assert_eq!(expense.amount, 25.5);
        assert_eq!(expense.category, Category::Food);
        assert_eq!(expense.description, "Pizza");
        assert!(!expense.is_impulsive);
        assert!(expense.date.is_some());
    }

    #[test]
    fn test_category_wire_names() {
        assert_eq!(Category::NonEssential.wire_name(), "nao_essencial");
        assert_eq!(Category::from_wire("jogos"), Some(Category::Games));
        assert_eq!(Category::from_wire("unknown"), None);
    }
}
