use colored::Colorize;

use crate::pipeline::RunOutcome;

/// One-line result of a run, for the job log.
pub fn render(outcome: &RunOutcome) -> String {
    let status = if outcome.updated {
        "description updated".green().bold()
    } else {
        "dry run, description not written".yellow().bold()
    };
    format!(
        "{} PR {} {} ({} chars)",
        "✔".green(),
        outcome.pull,
        status,
        outcome.description.chars().count()
    )
}

pub fn print(outcome: &RunOutcome) {
    eprintln!("{}", render(outcome));
}
