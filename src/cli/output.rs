//! Output formatting for CLI commands

use crate::session::TrainingResults;

/// Print a section header
pub fn print_section(title: &str) {
    println!("\n{}", "=".repeat(60));
    println!("{title}");
    println!("{}", "=".repeat(60));
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {:20} {}", format!("{key}:"), value);
}

/// Format a fraction as a percentage with one decimal
pub fn percent(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}

pub fn print_results(results: &TrainingResults) {
    let games = results.games();
    let share = |count: usize| {
        if games == 0 {
            0.0
        } else {
            count as f64 / games as f64
        }
    };
    print_kv("Games", &games.to_string());
    print_kv(
        "Wins",
        &format!("{} ({})", results.wins, percent(share(results.wins))),
    );
    print_kv(
        "Draws",
        &format!("{} ({})", results.draws, percent(share(results.draws))),
    );
    print_kv(
        "Losses",
        &format!("{} ({})", results.losses, percent(share(results.losses))),
    );
    if results.truncated > 0 {
        print_kv("Stopped at ply limit", &results.truncated.to_string());
    }
}
