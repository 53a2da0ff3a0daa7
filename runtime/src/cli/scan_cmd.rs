//! `reciprocity scan`: authenticate and list candidates without engaging.

use crate::cli::output;
use crate::cli::run_cmd::{execute, RunFlags};
use anyhow::Result;

pub async fn run(keyword: Option<String>) -> Result<()> {
    let flags = RunFlags {
        keyword,
        no_publish: true,
        dry_run: false,
    };
    let report = execute(flags, true).await?;

    if output::is_json() {
        output::print_json(&report);
        return Ok(());
    }

    println!();
    println!(
        "{} candidate(s) among {} listing entries",
        report.candidates.len(),
        report.entries_scanned
    );
    for (i, candidate) in report.candidates.iter().enumerate() {
        println!("  {:>3}. {candidate}", i + 1);
    }
    Ok(())
}
