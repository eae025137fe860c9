//! Team-vs-league insight sentences.
//!
//! Compares a team's pass/run conversion probabilities against the league
//! baseline for the same down and distance, and reports the larger deviation
//! as a readable sentence.

use super::estimator::ScenarioComparison;

/// Threshold below which a deviation is reported as "close to league average".
const NOTEWORTHY_DIFF: f64 = 0.01;

/// Build an insight sentence from team and league scenario comparisons
/// computed for the same (down, distance) pair.
///
/// Whichever of the pass/run deviations is larger in magnitude gets
/// reported; the pass deviation wins exact ties.
pub fn generate_insight(
    team_scenarios: &ScenarioComparison,
    league_scenarios: &ScenarioComparison,
    team_name: &str,
) -> String {
    let pass_diff = team_scenarios.pass.probability - league_scenarios.pass.probability;
    let run_diff = team_scenarios.run.probability - league_scenarios.run.probability;

    // Run is chosen only when strictly larger
    let (verb, diff) = if run_diff.abs() > pass_diff.abs() {
        ("running", run_diff)
    } else {
        ("passing", pass_diff)
    };

    if diff.abs() <= NOTEWORTHY_DIFF {
        return format!("{team_name} performs close to league average in this situation.");
    }

    let points = (diff.abs() * 100.0).round() as i64;
    let comparison = if diff > 0.0 { "better" } else { "worse" };
    let unit = if points == 1 {
        "percentage point"
    } else {
        "percentage points"
    };

    format!("{team_name} is {points} {unit} {comparison} than league average when {verb} in this situation.")
}
