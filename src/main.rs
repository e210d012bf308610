use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser as ClapParser;
use tracing_subscriber::EnvFilter;

use resultplan::driver::{self, DriverOptions};
use resultplan::lower::LowerOpts;

#[derive(ClapParser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Scenario file (JSON object of named call sites)
    scenarios: PathBuf,

    /// Only lower the named scenario
    #[clap(long)]
    only: Option<String>,

    /// Annotate emitted IR with result-plan decisions (implies --comments)
    #[clap(long)]
    trace: bool,

    /// Print instruction comments
    #[clap(long)]
    comments: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut lower = LowerOpts::from_env();
    lower.trace_plans |= args.trace;
    let opts = DriverOptions {
        comments: args.comments || lower.trace_plans,
        lower,
        only: args.only,
    };

    match driver::run_file(&args.scenarios, &opts) {
        Ok(ir) => {
            print!("{ir}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("[ERROR] {e}");
            ExitCode::FAILURE
        }
    }
}
