//! `reciprocity run`: publish, scan and engage.

use crate::cli::output;
use crate::config::RunConfig;
use crate::forum::SiteProfile;
use crate::pipeline::{self, RunOptions, RunReport};
use crate::progress::{self, Progress};
use anyhow::Result;
use tracing::info;

/// Flags accepted by `run` and `scan`.
#[derive(Debug, Clone, Default)]
pub struct RunFlags {
    pub keyword: Option<String>,
    pub no_publish: bool,
    pub dry_run: bool,
}

/// Execute a full run against the live forum.
pub async fn run(flags: RunFlags) -> Result<()> {
    let report = execute(flags, false).await?;
    output::print_report(&report);
    Ok(())
}

/// Shared by `run` and `scan`: load config, run the pipeline, stream events.
pub(crate) async fn execute(flags: RunFlags, scan_only: bool) -> Result<RunReport> {
    let config = RunConfig::from_env()?;

    let mut options = RunOptions::from_config(&config);
    options.scan_only = scan_only;
    options.dry_run = flags.dry_run;
    if flags.no_publish {
        options.publish = false;
    }
    if let Some(keyword) = flags.keyword.filter(|k| !k.trim().is_empty()) {
        options.keyword = keyword;
    }

    let run_id = uuid::Uuid::new_v4().to_string();
    info!(
        %run_id,
        keyword = %options.keyword,
        publish = options.publish,
        dry_run = options.dry_run,
        scan_only,
        "starting run"
    );

    let (tx, rx) = progress::channel();
    let printer = output::is_json().then(|| output::spawn_event_printer(rx));
    let progress = Progress::new(Some(tx), run_id);

    let result = pipeline::run(config, SiteProfile::tistory(), options, progress).await;

    // The pipeline dropped the last sender; the printer drains and exits.
    if let Some(printer) = printer {
        let _ = printer.await;
    }
    Ok(result?)
}
