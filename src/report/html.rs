/*!
report/html.rs - HTML coverage report writer (C11).

Pure `std::fmt::Write` templating, no templating-engine dependency: a
summary table over `SimulationResult::fault_detail_map` followed by a
per-op table derived from `SimulationResult::op_table`. Faults with
`detect_coverage < 1.0` are labelled under-covered with a distinct CSS
class, per §7.
*/

use std::fmt::Write as _;

use crate::march::MarchTest;
use crate::sim::simulator::SimulationResult;

/// Renders a complete standalone HTML document for `result`, simulated
/// against `test`.
pub fn write_report(test: &MarchTest, result: &SimulationResult) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{}</title>{}</head><body>\n",
        escape(&test.name),
        STYLE
    );
    let _ = writeln!(out, "<h1>{}</h1>", escape(&test.name));
    let _ = writeln!(out, "<pre>{}</pre>", escape(&test.to_pattern()));
    let _ = writeln!(
        out,
        "<p>state coverage: {:.1}% &middot; sensitisation coverage: {:.1}% &middot; detect coverage: {:.1}% &middot; total: {:.1}%</p>",
        result.state_coverage * 100.0,
        result.sens_coverage * 100.0,
        result.detect_coverage * 100.0,
        result.total_coverage * 100.0,
    );

    write_fault_table(&mut out, result);
    write_op_table(&mut out, result);

    out.push_str("</body></html>\n");
    out
}

fn write_fault_table(out: &mut String, result: &SimulationResult) {
    out.push_str("<h2>Fault coverage</h2>\n<table border=\"1\" cellspacing=\"0\" cellpadding=\"4\">\n");
    out.push_str("<tr><th>fault</th><th>detected / total TPs</th><th>coverage</th><th>orientation</th></tr>\n");

    let mut faults: Vec<&crate::sim::simulator::FaultCoverageDetail> = result.fault_detail_map.values().collect();
    faults.sort_by(|a, b| a.fault_id.cmp(&b.fault_id));

    for detail in faults {
        let row_class = if detail.detect_coverage < 1.0 { " class=\"under-covered\"" } else { "" };
        let orientation = if detail.has_two_cell_orientations {
            format!(
                "A&lt;V: {} / A&gt;V: {}",
                if detail.a_lt_v_detected { "hit" } else { "miss" },
                if detail.a_gt_v_detected { "hit" } else { "miss" }
            )
        } else {
            "-".to_string()
        };
        let _ = writeln!(
            out,
            "<tr{row_class}><td>{}</td><td>{}/{}</td><td>{:.0}%</td><td>{}</td></tr>",
            escape(&detail.fault_id),
            detail.detected_tps,
            detail.total_tps,
            detail.detect_coverage * 100.0,
            orientation,
        );
    }
    out.push_str("</table>\n");
}

fn write_op_table(out: &mut String, result: &SimulationResult) {
    out.push_str("<h2>Operation table</h2>\n<table border=\"1\" cellspacing=\"0\" cellpadding=\"4\">\n");
    out.push_str("<tr><th>#</th><th>element</th><th>op</th><th>state hits</th><th>sens hits</th><th>detections</th></tr>\n");

    for (i, ctx) in result.op_table.iter().enumerate() {
        let cover = &result.cover_lists[i];
        let _ = writeln!(
            out,
            "<tr><td>{i}</td><td>{}.{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            ctx.elem_index,
            ctx.index_within_elem,
            escape(&ctx.op.to_token()),
            cover.state_cover.len(),
            cover.sens_cover.len(),
            cover.det_cover.len(),
        );
    }
    out.push_str("</table>\n");
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

const STYLE: &str = "<style>\
table { border-collapse: collapse; margin-bottom: 2em; }\
th, td { text-align: left; }\
tr.under-covered { background: #fdd; }\
</style>";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault::{CellScope, Category, Fault};
    use crate::sim::simulator::FaultSimulator;

    fn sa0_fault() -> Fault {
        Fault {
            id: "SA0".to_string(),
            category: Category::EitherReadOrCompute,
            cell_scope: CellScope::SingleCell,
            primitives: vec![crate::fault::parse_primitive("t", "<0;-/1/->").unwrap()],
        }
    }

    #[test]
    fn renders_a_fault_table_row_per_fault() {
        let tps = crate::tp::generate(&sa0_fault());
        let sim = FaultSimulator::new(tps);
        let test = MarchTest::parse_pattern("t", "MATS+", "a(W0);a(R0,W1);d(R1,W0)").unwrap();
        let result = sim.simulate(&test);

        let html = write_report(&test, &result);
        assert!(html.contains("<table"));
        assert!(html.contains("SA0"));
        assert!(html.contains("MATS+"));
    }

    #[test]
    fn under_covered_faults_get_the_distinct_css_class() {
        let tps = crate::tp::generate(&sa0_fault());
        let sim = FaultSimulator::new(tps);
        let test = MarchTest::new("empty");
        let result = sim.simulate(&test);

        let html = write_report(&test, &result);
        assert!(html.contains("class=\"under-covered\""));
    }

    #[test]
    fn escapes_html_special_characters_in_names() {
        let tps = crate::tp::generate(&sa0_fault());
        let sim = FaultSimulator::new(tps);
        let test = MarchTest::new("<script>");
        let result = sim.simulate(&test);

        let html = write_report(&test, &result);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }
}
