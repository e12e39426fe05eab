//! Line counts from an external counter (cloc) and the typed-code ratio.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::utils::command;

const SUM_KEY: &str = "SUM";
const HEADER_KEY: &str = "header";

pub trait LineCounter: Send + Sync {
    fn count(&self, source_path: &str) -> Result<LineCountReport>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageStats {
    #[serde(default)]
    pub n_files: u64,
    #[serde(default)]
    pub blank: u64,
    #[serde(default)]
    pub comment: u64,
    pub code: u64,
}

/// Per-language counts plus the aggregate row.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LineCountReport {
    pub languages: BTreeMap<String, LanguageStats>,
    pub sum: LanguageStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeRatio {
    pub typed_code: u64,
    pub total_code: u64,
    pub ratio: f64,
}

impl LineCountReport {
    pub fn parse(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| Error::response_malformed("line counter", e.to_string()))?;
        let Value::Object(entries) = value else {
            return Err(Error::response_malformed(
                "line counter",
                "expected a JSON object keyed by language",
            ));
        };

        let mut languages = BTreeMap::new();
        let mut sum = None;
        for (name, stats) in entries {
            if name == HEADER_KEY {
                continue;
            }
            let stats: LanguageStats = serde_json::from_value(stats).map_err(|e| {
                Error::response_malformed("line counter", format!("{}: {}", name, e))
            })?;
            if name == SUM_KEY {
                sum = Some(stats);
            } else {
                languages.insert(name, stats);
            }
        }

        let sum = sum.ok_or_else(|| {
            Error::response_malformed("line counter", "missing 'SUM' aggregate")
        })?;
        Ok(Self { languages, sum })
    }

    /// Share of counted code lines written in `typed_language`.
    ///
    /// A language the counter did not report contributes zero lines.
    pub fn code_ratio(&self, typed_language: &str, source_path: &str) -> Result<CodeRatio> {
        let total_code = self.sum.code;
        if total_code == 0 {
            return Err(Error::tool_no_code(source_path));
        }

        let typed_code = self
            .languages
            .get(typed_language)
            .map(|stats| stats.code)
            .unwrap_or(0);

        Ok(CodeRatio {
            typed_code,
            total_code,
            ratio: typed_code as f64 / total_code as f64,
        })
    }
}

/// Runs cloc (or a compatible command) as a subprocess.
pub struct ClocCounter {
    program: String,
    leading_args: Vec<String>,
}

impl ClocCounter {
    pub fn new(program: impl Into<String>, leading_args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            leading_args,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let (program, leading_args) = settings.line_counter_parts();
        Self::new(program, leading_args.to_vec())
    }
}

impl LineCounter for ClocCounter {
    fn count(&self, source_path: &str) -> Result<LineCountReport> {
        let mut args = self.leading_args.clone();
        args.push(source_path.to_string());

        let stdout = command::run_strict(&self.program, &args)?;
        LineCountReport::parse(&stdout)
    }
}
