//! Terminal rendering of job states

use colored::*;
use jobwatch_core::domain::job::JobState;

/// Print one state change, as text or as a JSON line
pub fn print_transition(state: &JobState, json: bool) {
    if json {
        match serde_json::to_string(state) {
            Ok(line) => println!("{}", line),
            Err(e) => eprintln!("Failed to serialize state: {}", e),
        }
        return;
    }

    let time = chrono::Local::now().format("%H:%M:%S").to_string();
    println!("{} {}", time.dimmed(), describe(state));
}

/// Print a job result as pretty JSON
pub fn print_result(result: &serde_json::Value) {
    println!("\n{}", "Result:".bold());
    match serde_json::to_string_pretty(result) {
        Ok(pretty) => println!("{}", pretty),
        Err(_) => println!("{}", result),
    }
}

/// Colorize a state for display
fn describe(state: &JobState) -> ColoredString {
    match state {
        JobState::Idle => "idle".dimmed(),
        JobState::Submitting => "submitting...".cyan(),
        JobState::Pending {
            job_id,
            last_known_status,
        } => format!("job {} {}", job_id, last_known_status).yellow(),
        JobState::Completed { .. } => "✓ completed".green(),
        JobState::Failed { error_message } => format!("✗ failed: {}", error_message).red(),
        JobState::Cancelled => "cancelled".dimmed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_pending_includes_status() {
        let state = JobState::Pending {
            job_id: "job-1".to_string(),
            last_known_status: "processing".to_string(),
        };
        assert!(describe(&state).to_string().contains("job job-1 processing"));
    }

    #[test]
    fn test_describe_failed_includes_message() {
        let state = JobState::Failed {
            error_message: "timeout in aggregation".to_string(),
        };
        assert!(describe(&state).to_string().contains("timeout in aggregation"));
    }
}
