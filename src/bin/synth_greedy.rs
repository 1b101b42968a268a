//! `synth-greedy <faults.json>` - synthesises a March test with
//! [`GreedySynthDriver`] and prints it alongside its coverage.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use march_atpg::parse::fault_catalogue;
use march_atpg::policy::SynthConfig;
use march_atpg::sim::simulator::FaultSimulator;
use march_atpg::synth::GreedySynthDriver;
use march_atpg::tp;

#[derive(Debug, Clone, Parser)]
#[command(about = "Synthesise a March test greedily against a fault catalogue")]
struct Args {
    /// Path to the fault catalogue JSON.
    faults: PathBuf,
}

impl Args {
    fn execute(&self) -> march_atpg::error::Result<()> {
        let faults = fault_catalogue::load(&self.faults)?;
        let tps = faults.iter().flat_map(tp::generate).collect();
        let sim = FaultSimulator::new(tps);
        let driver = GreedySynthDriver::new(&sim, SynthConfig::default());
        let (test, result) = driver.run();

        println!("{}", test.to_pattern());
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
