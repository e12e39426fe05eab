use clap::Args;
use serde::Serialize;

use tsgauge::line_count::{ClocCounter, CodeRatio, LineCountReport, LineCounter};

use super::{CmdResult, GlobalArgs};

#[derive(Args)]
pub struct RatioArgs {}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatioOutput {
    pub source_path: String,
    pub typed_language: String,
    #[serde(flatten)]
    pub ratio: CodeRatio,
    pub counts: LineCountReport,
}

pub fn run(_args: RatioArgs, global: &GlobalArgs) -> CmdResult<RatioOutput> {
    let settings = global.settings()?;
    let source_path = settings.require_source_path()?.to_string();

    let counts = ClocCounter::from_settings(&settings).count(&source_path)?;
    let ratio = counts.code_ratio(&settings.typed_language, &source_path)?;

    Ok((
        RatioOutput {
            source_path,
            typed_language: settings.typed_language,
            ratio,
            counts,
        },
        0,
    ))
}
