//! Terminal rendering of verification and readiness reports

use console::Style;

use crate::readiness::{Grade, ReadinessReport, Severity};
use crate::verify::VerificationReport;

pub fn print_verification(report: &VerificationReport) {
    println!();
    let line = format!(
        "{}/{} checks passed",
        report.passed(),
        report.items.len()
    );
    if report.all_passed() {
        println!("{}", Style::new().green().bold().apply_to(line));
    } else {
        println!("{}", Style::new().yellow().bold().apply_to(line));
    }
}

pub fn print_readiness(report: &ReadinessReport) {
    let grade = report.grade();
    let style = match grade {
        Grade::Perfect | Grade::Good => Style::new().green().bold(),
        Grade::Acceptable | Grade::NeedsAttention => Style::new().yellow().bold(),
        Grade::NotReady => Style::new().red().bold(),
    };

    println!();
    println!("{}", Style::new().bold().apply_to("Readiness summary"));
    println!(
        "  {} issue(s), {} warning(s), {} check(s) passed",
        report.issues(),
        report.warnings(),
        report.count(Severity::Success)
    );
    println!("  Grade: {}", style.apply_to(grade.as_str()));
    println!("  {}", grade.verdict());
}
