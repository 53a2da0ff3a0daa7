//! Output helpers shared by the subcommands.

use crate::model::EngagementState;
use crate::pipeline::RunReport;
use crate::progress::ProgressReceiver;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

static JSON: AtomicBool = AtomicBool::new(false);

/// Switch every subcommand to JSON output.
pub fn set_json(enabled: bool) {
    JSON.store(enabled, Ordering::Relaxed);
}

pub fn is_json() -> bool {
    JSON.load(Ordering::Relaxed)
}

/// Print a value as one line of JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string(value) {
        Ok(line) => println!("{line}"),
        Err(e) => eprintln!("  Error: failed to serialize output: {e}"),
    }
}

/// Print progress events as JSON lines until every sender is dropped.
pub fn spawn_event_printer(mut rx: ProgressReceiver) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => print_json(&event),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    })
}

/// Print the end-of-run summary.
pub fn print_report(report: &RunReport) {
    if is_json() {
        print_json(report);
        return;
    }

    println!();
    println!("Run {}", report.run_id);
    match report.published {
        Some(true) => println!("  Post:        published"),
        Some(false) => println!("  Post:        failed"),
        None => println!("  Post:        skipped"),
    }
    println!("  Listing:     {} entries", report.entries_scanned);
    println!("  Candidates:  {}", report.candidates.len());
    if report.outcomes.is_empty() {
        return;
    }
    println!("  Subscribed:  {}", report.subscribed());
    println!("  Commented:   {}", report.commented());
    for state in [
        EngagementState::AlreadySubscribed,
        EngagementState::Unreachable,
        EngagementState::SubscribeFailed,
        EngagementState::CommentFailed,
        EngagementState::WouldSubscribe,
    ] {
        let n = report.count(state);
        if n > 0 {
            println!("  {:<13}{n}", format!("{}:", capitalize(&state.to_string())));
        }
    }
    println!();
    for outcome in &report.outcomes {
        println!("  [{}] {}", outcome.state, outcome.candidate);
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
