pub mod text;
pub mod json;

use crate::error::Result;
use crate::store::LogEntry;

pub const NO_HISTORY: &str = "No trace history found.";
pub const NO_CHANGES: &str = "No changes detected.";
pub const READ_ERROR: &str = "Error reading trace history.";

/// Renders the outcome of a history lookup. Read failures become the canned
/// error message instead of propagating.
pub fn summarize(last: Result<Option<LogEntry>>) -> String {
    match last {
        Ok(entry) => text::render(entry.as_ref()),
        Err(e) => {
            tracing::warn!(error = %e, "could not read trace history");
            format!("{READ_ERROR}\n")
        }
    }
}

/// Prints items that were skipped while capturing. Only a count unless verbose.
pub fn print_warnings(warnings: &[String], verbose: bool) {
    if warnings.is_empty() {
        return;
    }

    eprintln!();
    if verbose {
        eprintln!("Skipped while capturing:");
        eprintln!("{}", "-".repeat(40));
        for warning in warnings {
            eprintln!("  {warning}");
        }
    } else {
        eprintln!(
            "[note] {} item(s) could not be read and were left out, use --verbose to list them",
            warnings.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn read_failure_renders_canned_message() {
        let err = Error::NoHomeDir;
        assert_eq!(summarize(Err(err)), format!("{READ_ERROR}\n"));
    }

    #[test]
    fn missing_history_renders_no_history() {
        assert_eq!(summarize(Ok(None)), format!("{NO_HISTORY}\n"));
    }
}
