//! Report configuration
//!
//! Every setting has a default, so an empty TOML file (or no file at all)
//! yields the standard A4 report. Lengths are in PDF points.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Environment variable pointing at a TOML configuration file.
pub const CONFIG_ENV_VAR: &str = "CADASTRE_REPORT_CONFIG";

const MM: f64 = 72.0 / 25.4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub title: String,
    /// Static program attribution printed in every footer.
    pub attribution: String,
    pub ground_floor_label: String,
    /// Shown wherever a header field is missing.
    pub placeholder: String,
    pub filename_prefix: String,
    pub page: PageConfig,
    pub typography: Typography,
    pub palette: Palette,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: "INFORME DE INMUEBLES SELECCIONADOS".to_string(),
            attribution: "Sistema de Gestión Catastral - JLA Asociados".to_string(),
            ground_floor_label: "Bajo".to_string(),
            placeholder: "N/A".to_string(),
            filename_prefix: "Informe_Inmuebles".to_string(),
            page: PageConfig::default(),
            typography: Typography::default(),
            palette: Palette::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    pub width: f64,
    pub height: f64,
    pub margin_top: f64,
    pub margin_bottom: f64,
    pub margin_left: f64,
    pub margin_right: f64,
    /// Distance from the bottom edge to the footer rule.
    pub footer_rule_offset: f64,
    /// Distance from the bottom edge to the footer text baseline.
    pub footer_text_offset: f64,
}

impl Default for PageConfig {
    fn default() -> Self {
        // A4 portrait, 20 mm margins
        Self {
            width: 210.0 * MM,
            height: 297.0 * MM,
            margin_top: 20.0 * MM,
            margin_bottom: 20.0 * MM,
            margin_left: 20.0 * MM,
            margin_right: 20.0 * MM,
            footer_rule_offset: 15.0 * MM,
            footer_text_offset: 8.0 * MM,
        }
    }
}

impl PageConfig {
    pub fn printable_width(&self) -> f64 {
        self.width - self.margin_left - self.margin_right
    }

    pub fn printable_height(&self) -> f64 {
        self.height - self.margin_top - self.margin_bottom
    }

    /// Lowest cursor position content may reach.
    pub fn content_bottom(&self) -> f64 {
        self.height - self.margin_bottom
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Typography {
    pub title_size: f64,
    pub heading_size: f64,
    pub section_size: f64,
    pub body_size: f64,
    pub stats_size: f64,
    pub table_size: f64,
    pub table_header_size: f64,
    pub footer_size: f64,
    pub line_spacing: f64,
    pub stats_row_height: f64,
    pub table_row_height: f64,
    pub cell_padding: f64,
    pub section_gap: f64,
}

impl Default for Typography {
    fn default() -> Self {
        Self {
            title_size: 20.0,
            heading_size: 16.0,
            section_size: 14.0,
            body_size: 12.0,
            stats_size: 10.0,
            table_size: 8.0,
            table_header_size: 9.0,
            footer_size: 8.0,
            line_spacing: 1.4,
            stats_row_height: 20.0,
            table_row_height: 16.0,
            cell_padding: 4.0,
            section_gap: 15.0 * MM / 2.0,
        }
    }
}

/// Colors as `#RRGGBB`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub text: String,
    pub heading: String,
    pub rule: String,
    pub table_header_fill: String,
    pub table_header_text: String,
    pub stripe: String,
    pub footer_text: String,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            text: "#282828".to_string(),
            heading: "#3C3C3C".to_string(),
            rule: "#C8C8C8".to_string(),
            table_header_fill: "#4682B4".to_string(),
            table_header_text: "#FFFFFF".to_string(),
            stripe: "#F5F5F5".to_string(),
            footer_text: "#787878".to_string(),
        }
    }
}

impl ReportConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid report config: {}", path.display()))
    }

    /// Parse configuration from a TOML string
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(s).context("Failed to parse TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the file named by [`CONFIG_ENV_VAR`], or fall back to defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) if !path.trim().is_empty() => Self::from_file(path),
            _ => Ok(Self::default()),
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        let page = &self.page;
        if page.printable_width() <= 0.0 || page.printable_height() <= 0.0 {
            anyhow::bail!(
                "Margins leave no printable area on a {}x{} page",
                page.width,
                page.height
            );
        }
        let typo = &self.typography;
        if typo.table_row_height * 2.0 > page.printable_height() {
            anyhow::bail!("Table row height {} is too large", typo.table_row_height);
        }
        Ok(())
    }
}
