//! `template-sweep <max_ops_per_element> <max_elements> [faults.json]
//! [beam_width] [out.json] [out.html]` - enumerates template shapes and, when
//! a fault catalogue is supplied, binds concrete values with
//! [`BeamTemplateSearcher`].

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use march_atpg::error::AtpgError;
use march_atpg::march::{MarchElement, MarchTest};
use march_atpg::parse::fault_catalogue;
use march_atpg::report::html::write_report;
use march_atpg::sim::simulator::FaultSimulator;
use march_atpg::synth::{BeamTemplateSearcher, TemplateSearch};
use march_atpg::tp;
use serde::Serialize;

#[derive(Debug, Clone, Parser)]
#[command(about = "Enumerate March-test templates and expand the best one against a fault catalogue")]
struct Args {
    /// Maximum operation slots per element.
    max_ops_per_element: usize,
    /// Maximum number of elements in an enumerated sequence.
    max_elements: usize,
    /// Optional fault catalogue JSON; without it only the shapes are listed.
    faults: Option<PathBuf>,
    /// Beam width used when a fault catalogue is supplied.
    beam_width: Option<usize>,
    /// Optional path to write the winning test (and its coverage) as JSON.
    out_json: Option<PathBuf>,
    /// Optional path to write an HTML coverage report.
    out_html: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct SweepOutput {
    pattern: String,
    total_coverage: f64,
    state_coverage: f64,
    sens_coverage: f64,
    detect_coverage: f64,
}

fn shape_pattern(shape: &[march_atpg::synth::ElementTemplate]) -> String {
    let mut test = MarchTest::new("template");
    for elem in shape {
        test.elements.push(MarchElement::new(elem.order));
    }
    test.to_pattern()
}

impl Args {
    fn execute(&self) -> Result<(), AtpgError> {
        let sequences = TemplateSearch::enumerate(self.max_ops_per_element, self.max_elements);
        tracing::debug!(sequence_count = sequences.len(), "enumerated template shapes");

        let Some(faults_path) = &self.faults else {
            for shape in &sequences {
                println!("{}", shape_pattern(shape));
            }
            return Ok(());
        };

        let faults = fault_catalogue::load(faults_path)?;
        let tps = faults.iter().flat_map(tp::generate).collect();
        let sim = FaultSimulator::new(tps);
        let beam_width = self.beam_width.unwrap_or(8);
        let searcher = BeamTemplateSearcher::new(&sim, beam_width);
        let (test, result) = searcher.search(&sequences);

        println!("{}", test.to_pattern());
        println!("total coverage: {:.1}%", result.total_coverage * 100.0);

        if let Some(out_json) = &self.out_json {
            let payload = SweepOutput {
                pattern: test.to_pattern(),
                total_coverage: result.total_coverage,
                state_coverage: result.state_coverage,
                sens_coverage: result.sens_coverage,
                detect_coverage: result.detect_coverage,
            };
            let json = serde_json::to_string_pretty(&payload)
                .map_err(|e| AtpgError::invariant(format!("failed to serialise sweep output: {e}")))?;
            std::fs::write(out_json, json)
                .map_err(|e| AtpgError::invariant(format!("failed to write {}: {e}", out_json.display())))?;
        }
        if let Some(out_html) = &self.out_html {
            let html = write_report(&test, &result);
            std::fs::write(out_html, html)
                .map_err(|e| AtpgError::invariant(format!("failed to write {}: {e}", out_html.display())))?;
        }
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
