use crate::model::{AccuracyReport, Difficulty};

const COL: usize = 20;
const RULE: &str =
    "======================================    ACCURACY    =====================================";

/// Renders the fixed-width summary table.
pub fn render_table(report: &AccuracyReport) -> String {
    let mut labels: Vec<&str> = Difficulty::ALL.iter().map(|d| d.as_str()).collect();
    labels.push("total");

    let mut counts: Vec<usize> = Difficulty::ALL
        .iter()
        .map(|d| report.tier(*d).total)
        .collect();
    counts.push(report.overall.total);

    let mut scores: Vec<f64> = Difficulty::ALL
        .iter()
        .map(|d| report.tier(*d).accuracy_pct)
        .collect();
    scores.push(report.overall.accuracy_pct);

    let mut out = String::new();
    out.push_str(&format!("{:COL$}", ""));
    for l in &labels {
        out.push_str(&format!(" {:COL$}", l));
    }
    out.push('\n');

    out.push_str(&format!("{:COL$}", "count"));
    for c in &counts {
        out.push_str(&format!(" {:<COL$}", c));
    }
    out.push('\n');

    out.push_str(RULE);
    out.push('\n');

    out.push_str(&format!("{:COL$}", "accuracy"));
    for s in &scores {
        out.push_str(&format!(" {:<COL$.2}", s));
    }
    out.push('\n');
    out
}

pub fn render_outcomes(report: &AccuracyReport) -> String {
    let o = &report.outcomes;
    format!(
        "Outcomes: {} correct, {} incorrect, {} timeout, {} execution error",
        o.correct, o.incorrect, o.timeout, o.execution_error
    )
}

pub fn print_summary(report: &AccuracyReport) {
    print!("{}", render_table(report));
    println!("{}", "=".repeat(RULE.len()));
    println!("{}", render_outcomes(report));
}
