use serde::{Deserialize, Serialize};

/// UI theme, serialized with the server's wire names ("claro"/"dark").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Theme {
    #[default]
    #[serde(rename = "claro")]
    Light,
    #[serde(rename = "dark")]
    Dark,
}

impl Theme {
    pub fn toggled(&self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// Per-device configuration. The server owns the authoritative copy; the
/// local value is a cache replaced on load and after every save.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(rename = "primeiro_acesso", default)]
    pub first_access: bool,
    #[serde(rename = "tema", default)]
    pub theme: Theme,
    #[serde(rename = "renda_mensal", default)]
    pub monthly_income: f64,
    #[serde(rename = "meta_mensal", default)]
    pub monthly_goal: f64,
}

impl Default for AppConfig {
    /// Safe fallback used when the configuration cannot be fetched.
    fn default() -> Self {
        Self {
            first_access: false,
            theme: Theme::Light,
            monthly_income: 0.0,
            monthly_goal: 0.0,
        }
    }
}

/// Partial configuration update. Only the populated fields are sent; the
/// server performs the merge and returns the full configuration.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfigPatch {
    #[serde(rename = "primeiro_acesso", skip_serializing_if = "Option::is_none")]
    pub first_access: Option<bool>,
    #[serde(rename = "tema", skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
    #[serde(rename = "renda_mensal", skip_serializing_if = "Option::is_none")]
    pub monthly_income: Option<f64>,
    #[serde(rename = "meta_mensal", skip_serializing_if = "Option::is_none")]
    pub monthly_goal: Option<f64>,
}

impl ConfigPatch {
    pub fn income(value: f64) -> Self {
        Self {
            monthly_income: Some(value),
            ..Default::default()
        }
    }

    pub fn theme(theme: Theme) -> Self {
        Self {
            theme: Some(theme),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_the_safe_fallback() {
        let config = AppConfig::default();
        assert!(!config.first_access);
        assert_eq!(config.theme, Theme::Light);
        assert_eq!(config.monthly_income, 0.0);
    }

    #[test]
    fn test_config_parses_server_wire_format() {
        let json = r#"{"renda_mensal": 3500.0, "primeiro_acesso": true, "tema": "dark", "meta_mensal": 0}"#;
        let config: AppConfig = serde_json::from_str(json).expect("wire format should parse");
        assert!(config.first_access);
        assert_eq!(config.theme, Theme::Dark);
        assert_eq!(config.monthly_income, 3500.0);
    }

    #[test]
    fn test_patch_serializes_only_populated_fields() {
        let patch = ConfigPatch::income(1200.0);
        let value = serde_json::to_value(&patch).expect("patch should serialize");
        let obj = value.as_object().expect("patch is an object");
        assert_eq!(obj.len(), 1);
        assert_eq!(obj["renda_mensal"], 1200.0);
    }

    #[test]
    fn test_theme_toggle() {
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
    }
}
