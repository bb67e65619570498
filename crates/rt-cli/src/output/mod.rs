//! Operator-facing status output
//!
//! Short colored status lines for the CLI itself. Child output and
//! orchestrator notices during a run go through the orchestrator's console.

use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

use rt_orchestrator::RunSummary;

/// Print a success message in green with a check mark prefix
pub fn print_success(msg: &str) {
    let mut stdout = std::io::stdout();
    let _ = crossterm::execute!(
        stdout,
        SetForegroundColor(Color::Green),
        Print("✓ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print an error message in red with an X prefix
pub fn print_error(msg: &str) {
    let mut stderr = std::io::stderr();
    let _ = crossterm::execute!(
        stderr,
        SetForegroundColor(Color::Red),
        Print("✗ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print an informational message in cyan with an info symbol prefix
pub fn print_info(msg: &str) {
    let mut stdout = std::io::stdout();
    let _ = crossterm::execute!(
        stdout,
        SetForegroundColor(Color::Cyan),
        Print("ℹ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print the end-of-run summary
pub fn print_summary(summary: &RunSummary) {
    print_info(&format!("Captured {} messages.", summary.messages));

    let line = format!("All children finished. Exiting with code {}.", summary.exit_code);
    if summary.exit_code == 0 {
        print_success(&line);
    } else {
        print_info(&line);
    }
}
