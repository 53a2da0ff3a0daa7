// Copyright 2026 Cortex Contributors
// SPDX-License-Identifier: Apache-2.0

//! Run pipeline: authenticate, publish, scan, engage.
//!
//! [`run`] owns the browser for the whole run and releases it on every exit
//! path. [`Pipeline::execute`] drives the stages over any [`Forum`], which is
//! how the integration tests run the full flow without Chromium.

use crate::config::RunConfig;
use crate::content::openai::OpenAiClient;
use crate::content::ContentGenerator;
use crate::engage::Orchestrator;
use crate::error::RunError;
use crate::forum::browser::BrowserForum;
use crate::forum::{Forum, SiteProfile};
use crate::model::{CandidateSet, EngagementOutcome, EngagementState};
use crate::pacing::{Pacer, RandomPacer};
use crate::progress::{Progress, RunEventKind};
use crate::publish::publish;
use crate::renderer::chromium::ChromiumRenderer;
use crate::renderer::Renderer;
use crate::scanner::scan;
use crate::session::{AuthState, Session, SessionGateway};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Per-invocation overrides on top of [`RunConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub publish: bool,
    pub keyword: String,
    /// Read subscription labels only; never click, type or publish.
    pub dry_run: bool,
    /// Stop after the scan.
    pub scan_only: bool,
}

impl RunOptions {
    pub fn from_config(config: &RunConfig) -> Self {
        Self {
            publish: config.publish,
            keyword: config.keyword.clone(),
            dry_run: false,
            scan_only: false,
        }
    }
}

/// Everything a run did, in order.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// `None` when publishing was skipped.
    pub published: Option<bool>,
    pub entries_scanned: usize,
    #[serde(flatten)]
    pub candidates: CandidateSet,
    pub outcomes: Vec<EngagementOutcome>,
}

impl RunReport {
    fn new(run_id: &str) -> Self {
        let now = Utc::now();
        Self {
            run_id: run_id.to_string(),
            started_at: now,
            finished_at: now,
            published: None,
            entries_scanned: 0,
            candidates: CandidateSet::new(),
            outcomes: Vec::new(),
        }
    }

    pub fn subscribed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.subscribed).count()
    }

    pub fn commented(&self) -> usize {
        self.outcomes.iter().filter(|o| o.commented).count()
    }

    /// Number of outcomes that ended in `state`.
    pub fn count(&self, state: EngagementState) -> usize {
        self.outcomes.iter().filter(|o| o.state == state).count()
    }
}

/// Stage driver for one run.
pub struct Pipeline {
    config: RunConfig,
    site: SiteProfile,
    content: ContentGenerator,
    pacer: Arc<dyn Pacer>,
    progress: Progress,
}

impl Pipeline {
    /// A pipeline with the configured text backend and random pacing.
    pub fn new(config: RunConfig, site: SiteProfile, progress: Progress) -> Self {
        let content = match &config.llm {
            Some(llm) => {
                info!(model = %llm.model, "generating text with chat completions");
                ContentGenerator::new(Arc::new(OpenAiClient::new(llm)))
            }
            None => {
                info!("no OPENAI_API_KEY set, using template text");
                ContentGenerator::template()
            }
        };
        let pacer = Arc::new(RandomPacer::new(config.pacing));
        Self {
            config,
            site,
            content,
            pacer,
            progress,
        }
    }

    pub fn with_content(mut self, content: ContentGenerator) -> Self {
        self.content = content;
        self
    }

    pub fn with_pacer(mut self, pacer: Arc<dyn Pacer>) -> Self {
        self.pacer = pacer;
        self
    }

    /// Run every stage over `forum`, closing it before returning.
    pub async fn execute(
        &self,
        forum: Box<dyn Forum>,
        options: &RunOptions,
    ) -> Result<RunReport, RunError> {
        let started = Instant::now();
        let mut session = Session::new(forum, self.config.session_max_age);
        let mut report = RunReport::new(self.progress.run_id());

        let result = self.stages(&mut session, options, &mut report).await;

        if let Err(e) = session.close().await {
            warn!("failed to close browsing context: {e:#}");
        }
        report.finished_at = Utc::now();

        result?;
        self.progress.emit(RunEventKind::RunComplete {
            candidates: report.candidates.len(),
            subscribed: report.subscribed(),
            commented: report.commented(),
            elapsed_ms: started.elapsed().as_millis() as u64,
        });
        Ok(report)
    }

    async fn stages(
        &self,
        session: &mut Session,
        options: &RunOptions,
        report: &mut RunReport,
    ) -> Result<(), RunError> {
        let gateway = SessionGateway::new(self.config.auth.clone());
        let auth = gateway.authenticate(session).await;
        if !auth.success {
            self.progress.emit(RunEventKind::AuthenticationFailed {
                strategy: gateway.strategy_name().to_string(),
                reason: auth.reason.unwrap_or_default(),
            });
            return Err(RunError::AuthenticationFailed {
                strategy: gateway.strategy_name(),
            });
        }
        self.progress.emit(RunEventKind::Authenticated {
            strategy: gateway.strategy_name().to_string(),
        });

        if options.publish && !options.dry_run && !options.scan_only {
            ensure_fresh(session)?;
            let post = self.content.post().await;
            let published = publish(session.forum(), &post, &self.progress).await;
            report.published = Some(published);
            if published {
                self.pacer.delay().await;
            }
        }

        ensure_fresh(session)?;
        let found = scan(
            session.forum(),
            &self.config.self_marker,
            &options.keyword,
            &self.progress,
        )
        .await;
        self.progress.emit(RunEventKind::ScanCompleted {
            entries: found.entries,
            candidates: found.candidates.len(),
        });
        report.entries_scanned = found.entries;
        report.candidates = found.candidates;

        if options.scan_only {
            return Ok(());
        }
        if report.candidates.is_empty() {
            info!(keyword = %options.keyword, "no candidates on the listing");
            return Ok(());
        }

        ensure_fresh(session)?;
        let orchestrator = Orchestrator::new(
            self.content.clone(),
            Arc::clone(&self.pacer),
            self.site.labels.clone(),
        )
        .dry_run(options.dry_run);
        report.outcomes = orchestrator
            .process(session.forum(), &report.candidates, &self.progress)
            .await;

        info!(
            candidates = report.candidates.len(),
            subscribed = report.subscribed(),
            commented = report.commented(),
            "engagement finished"
        );
        Ok(())
    }
}

/// Refuse to start a stage on a session older than its maximum age.
fn ensure_fresh(session: &Session) -> Result<(), RunError> {
    match session.state() {
        AuthState::Expired => {
            let age_mins = session.age().map(|a| a.as_secs() / 60).unwrap_or_default();
            Err(RunError::SessionExpired { age_mins })
        }
        _ => Ok(()),
    }
}

/// Launch Chromium, run the pipeline against the live site, shut Chromium down.
pub async fn run(
    config: RunConfig,
    site: SiteProfile,
    options: RunOptions,
    progress: Progress,
) -> Result<RunReport, RunError> {
    let renderer = ChromiumRenderer::launch(&config.browser)
        .await
        .map_err(RunError::BrowserLaunch)?;

    let result = match renderer.new_context().await {
        Ok(context) => {
            let forum = Box::new(BrowserForum::new(context, site.clone()));
            Pipeline::new(config, site, progress)
                .execute(forum, &options)
                .await
        }
        Err(e) => Err(RunError::BrowserLaunch(e)),
    };

    if let Err(e) = renderer.shutdown().await {
        warn!("failed to shut down Chromium: {e:#}");
    }
    result
}
