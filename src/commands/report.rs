use clap::Args;

use tsgauge::github::CommitSource;
use tsgauge::line_count::ClocCounter;
use tsgauge::metrics::MetricsClient;
use tsgauge::report::{self, Collaborators, Delivery, ReportOutput, ReportPlan};

use super::{CmdResult, GlobalArgs};

#[derive(Args)]
pub struct ReportArgs {
    /// Build both payloads and print them without posting
    #[arg(long)]
    pub dry_run: bool,
}

pub fn run(args: ReportArgs, global: &GlobalArgs) -> CmdResult<ReportOutput> {
    let settings = global.settings()?;
    let plan = ReportPlan::from_settings(&settings)?;

    let metrics_client = if args.dry_run {
        None
    } else {
        Some(MetricsClient::new(
            &settings.metrics_url,
            settings.require_metrics_api_key()?,
        )?)
    };
    let delivery = match &metrics_client {
        Some(client) => Delivery::Submit(client),
        None => Delivery::DryRun,
    };

    let counter = ClocCounter::from_settings(&settings);
    let commits = super::commit_source(&settings)?;
    let event = super::load_event(&settings);

    let collaborators = Collaborators {
        line_counter: &counter,
        commits: commits.as_ref().map(|client| client as &dyn CommitSource),
        delivery,
    };

    let output = report::run(&plan, &event, &collaborators, chrono::Utc::now().timestamp());
    let exit_code = if output.has_failures() { 1 } else { 0 };

    Ok((output, exit_code))
}
