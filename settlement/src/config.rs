//! Configuration for settlement

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Settlement configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// Ledger (group store) configuration
    pub ledger: ledger_core::Config,

    /// Netting configuration
    pub netting: NettingConfig,

    /// Output configuration
    pub display: DisplayConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "tabsplit".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            ledger: ledger_core::Config::default(),
            netting: NettingConfig::default(),
            display: DisplayConfig::default(),
        }
    }
}

/// Netting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NettingConfig {
    /// Re-apply computed settlements and reject plans that leave residuals
    pub verify_settlements: bool,
}

impl Default for NettingConfig {
    fn default() -> Self {
        Self {
            verify_settlements: true,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Symbol printed in front of amounts
    pub currency_symbol: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            currency_symbol: "$".to_string(),
        }
    }
}

impl DisplayConfig {
    /// Format an amount as `$12.50`, negative amounts as `-$12.50`
    pub fn format_amount(&self, amount: Decimal) -> String {
        let sign = if amount.is_sign_negative() && !amount.is_zero() { "-" } else { "" };
        format!("{}{}{:.2}", sign, self.currency_symbol, amount.abs())
    }

    /// Format a balance with an explicit sign: `+$60.00`, `-$30.00`, `$0.00`
    pub fn format_balance(&self, balance: Decimal) -> String {
        if ledger_core::is_settled(balance) {
            format!("{}{:.2}", self.currency_symbol, Decimal::ZERO)
        } else if balance > Decimal::ZERO {
            format!("+{}", self.format_amount(balance))
        } else {
            self.format_amount(balance)
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        config.ledger.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config {
            ledger: ledger_core::Config::from_env()?,
            ..Config::default()
        };

        if let Ok(symbol) = std::env::var("TABSPLIT_CURRENCY_SYMBOL") {
            config.display.currency_symbol = symbol;
        }

        if let Ok(verify) = std::env::var("TABSPLIT_VERIFY_SETTLEMENTS") {
            config.netting.verify_settlements = verify.parse().map_err(|_| {
                crate::Error::Config(format!(
                    "TABSPLIT_VERIFY_SETTLEMENTS must be true or false, got {}",
                    verify
                ))
            })?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service_name, "tabsplit");
        assert_eq!(config.display.currency_symbol, "$");
        assert!(config.netting.verify_settlements);
    }

    #[test]
    fn test_from_file_nested_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tabsplit.toml");
        std::fs::write(
            &path,
            "[ledger]\ndata_dir = \"/tmp/tabsplit\"\n\n[display]\ncurrency_symbol = \"€\"\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(
            config.ledger.store_path(),
            std::path::PathBuf::from("/tmp/tabsplit/groups.json")
        );
        assert_eq!(config.display.currency_symbol, "€");
        assert!(config.netting.verify_settlements);
    }

    #[test]
    fn test_from_file_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tabsplit.toml");
        std::fs::write(&path, "[display\n").unwrap();

        assert!(matches!(Config::from_file(&path), Err(crate::Error::Config(_))));
    }

    #[test]
    fn test_format_amounts() {
        let display = DisplayConfig::default();
        assert_eq!(display.format_amount(dec!(12.5)), "$12.50");
        assert_eq!(display.format_amount(dec!(-30)), "-$30.00");
        assert_eq!(display.format_balance(dec!(60)), "+$60.00");
        assert_eq!(display.format_balance(dec!(-33.33)), "-$33.33");
        assert_eq!(display.format_balance(dec!(0.01)), "$0.00");
    }
}
