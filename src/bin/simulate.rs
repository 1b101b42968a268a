//! `simulate <faults.json> <march.json> <output.html>` - simulates the named
//! March test against the fault catalogue and writes an HTML coverage
//! report.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use march_atpg::march::MarchTest;
use march_atpg::parse::{fault_catalogue, march_catalogue};
use march_atpg::report::html::write_report;
use march_atpg::sim::simulator::FaultSimulator;
use march_atpg::tp;

#[derive(Debug, Clone, Parser)]
#[command(about = "Simulate a March test against a fault catalogue and write an HTML coverage report")]
struct Args {
    /// Path to the fault catalogue JSON.
    faults: PathBuf,
    /// Path to the March test catalogue JSON. The first entry is simulated.
    march: PathBuf,
    /// Path the HTML report is written to.
    output: PathBuf,
}

impl Args {
    fn execute(&self) -> march_atpg::error::Result<()> {
        let faults = fault_catalogue::load(&self.faults)?;
        let march_entries = march_catalogue::load(&self.march)?;
        let (_name, test): (String, MarchTest) = march_entries.into_iter().next().ok_or_else(|| {
            march_atpg::error::AtpgError::semantic(self.march.display().to_string(), "catalogue is empty")
        })?;

        let tps = faults.iter().flat_map(tp::generate).collect();
        let sim = FaultSimulator::new(tps);
        let result = sim.simulate(&test);

        let html = write_report(&test, &result);
        std::fs::write(&self.output, html).map_err(|e| {
            march_atpg::error::AtpgError::invariant(format!("failed to write {}: {e}", self.output.display()))
        })?;

        println!("total coverage: {:.1}%", result.total_coverage * 100.0);
        Ok(())
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()))
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    match args.execute() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(e.exit_code() as u8)
        }
    }
}
