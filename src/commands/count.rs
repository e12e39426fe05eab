use clap::Args;
use serde::Serialize;

use tsgauge::conversion::{self, Conversion, FileChangeRecord};
use tsgauge::github::CommitSource;
use tsgauge::report::{self, CommitConversionReport};
use tsgauge::Error;

use super::{CmdResult, GlobalArgs};

#[derive(Args)]
pub struct CountArgs {
    /// Added file path (repeatable). Explicit paths replace the event lookup
    #[arg(long = "added", value_name = "PATH")]
    pub added: Vec<String>,

    /// Removed file path (repeatable)
    #[arg(long = "removed", value_name = "PATH")]
    pub removed: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct PathListCount {
    pub count: usize,
    pub conversions: Vec<Conversion>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum CountOutput {
    PathLists(PathListCount),
    Commit(Box<CommitConversionReport>),
}

pub fn run(args: CountArgs, global: &GlobalArgs) -> CmdResult<CountOutput> {
    if !args.added.is_empty() || !args.removed.is_empty() {
        reject_blank("added", &args.added)?;
        reject_blank("removed", &args.removed)?;

        let changes: Vec<FileChangeRecord> = args
            .removed
            .into_iter()
            .map(FileChangeRecord::removed)
            .chain(args.added.into_iter().map(FileChangeRecord::added))
            .collect();
        let conversions = conversion::find_conversions(&changes);

        return Ok((
            CountOutput::PathLists(PathListCount {
                count: conversions.len(),
                conversions,
            }),
            0,
        ));
    }

    let settings = global.settings()?;
    let event = super::load_event(&settings)?;
    let commits = super::commit_source(&settings)?;

    let output = report::resolve_conversions(
        &event,
        commits.as_ref().map(|client| client as &dyn CommitSource),
    )?;

    Ok((CountOutput::Commit(Box::new(output)), 0))
}

fn reject_blank(field: &str, paths: &[String]) -> tsgauge::Result<()> {
    if paths.iter().any(|path| path.trim().is_empty()) {
        return Err(Error::validation_invalid_argument(
            field,
            "File paths must not be empty",
        ));
    }
    Ok(())
}
