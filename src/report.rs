use crate::analysis::AnalysisSummary;
use std::fmt::Write;

/// Render a textual summary of a finished run.
#[must_use]
pub fn render_summary(summary: &AnalysisSummary) -> String {
    let result = &summary.result;
    let mut output = String::new();

    writeln!(
        &mut output,
        "{} test (magnitude = {:.1}) on {} members",
        result.kind, result.magnitude, summary.member_count
    )
    .expect("writing to string cannot fail");

    let verdict = if result.survived { "SURVIVED" } else { "FAILED" };
    writeln!(
        &mut output,
        "Result: {verdict} after {} steps ({:?})",
        result.steps, result.termination
    )
    .expect("writing to string cannot fail");

    if result.failed_members.is_empty() {
        output.push_str("Failed members: none\n");
    } else {
        let ids: Vec<String> = result
            .failed_members
            .iter()
            .map(|member| member.index().to_string())
            .collect();
        writeln!(&mut output, "Failed members: {}", ids.join(", "))
            .expect("writing to string cannot fail");
    }

    writeln!(&mut output, "Max deflection: {:.2}", result.max_deflection)
        .expect("writing to string cannot fail");

    // Goals are only scored here; the simulation ignores them.
    let triangles = match summary.target_triangles {
        Some(target) => format!("{} (target {target})", result.triangle_count),
        None => result.triangle_count.to_string(),
    };
    writeln!(&mut output, "Triangles: {triangles}").expect("writing to string cannot fail");

    let height = match summary.target_height {
        Some(target) => format!("{:.1} (target {target:.1})", summary.structure_height),
        None => format!("{:.1}", summary.structure_height),
    };
    writeln!(&mut output, "Height: {height}").expect("writing to string cannot fail");

    output
}
