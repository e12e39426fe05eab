use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{count, ratio, report, GlobalArgs};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "tsgauge")]
#[command(version = VERSION)]
#[command(about = "Report TypeScript migration progress from CI")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Post the typed-code ratio and the files-converted count
    Report(report::ReportArgs),
    /// Count JS to TS conversions without posting
    Count(count::CountArgs),
    /// Measure the typed-code ratio without posting
    Ratio(ratio::RatioArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_tracing();

    let (json_result, exit_code) = commands::run_json(cli.command, &cli.global);

    if let Err(err) = output::print_json_result(json_result) {
        tracing::error!(code = err.code.as_str(), "{}", err.message);
        return std::process::ExitCode::from(1);
    }

    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
