// Copyright 2026 Cortex Contributors
// SPDX-License-Identifier: Apache-2.0

//! Engagement orchestrator: subscribe-then-comment, one candidate at a time.
//!
//! Each candidate walks its own state machine:
//!
//! ```text
//! Start -> Navigated -> SubscribeChecked -> AlreadySubscribed
//!                                        -> SubscribePending -> Subscribed -> CommentAttempted -> Done
//! ```
//!
//! Every failure is resolved into that candidate's [`EngagementOutcome`];
//! nothing a single candidate does can stop the loop. The subscription
//! label is read before anything is clicked, so an author that is already
//! subscribed is never subscribed again nor commented on, whatever happened
//! in earlier runs.

use crate::content::ContentGenerator;
use crate::forum::{Forum, SubscriptionLabels};
use crate::model::{Candidate, CandidateSet, EngagementOutcome, EngagementState};
use crate::pacing::Pacer;
use crate::progress::{Progress, RunEventKind};
use anyhow::{anyhow, Result};
use std::sync::Arc;
use tracing::{info, warn};

/// Per-candidate engagement states.
#[derive(Debug)]
enum Step {
    Start,
    Navigated,
    SubscribeChecked { label: String },
    SubscribePending,
    Subscribed,
    CommentAttempted(Result<()>),
    Done(EngagementState),
}

/// Runs the engagement state machine over a candidate set.
pub struct Orchestrator {
    content: ContentGenerator,
    pacer: Arc<dyn Pacer>,
    labels: SubscriptionLabels,
    dry_run: bool,
}

impl Orchestrator {
    pub fn new(content: ContentGenerator, pacer: Arc<dyn Pacer>, labels: SubscriptionLabels) -> Self {
        Self {
            content,
            pacer,
            labels,
            dry_run: false,
        }
    }

    /// Stop each candidate after reading its label: nothing is clicked or typed.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Engage every candidate in order, returning one outcome per candidate.
    pub async fn process(
        &self,
        forum: &mut dyn Forum,
        candidates: &CandidateSet,
        progress: &Progress,
    ) -> Vec<EngagementOutcome> {
        let total = candidates.len();
        let mut outcomes = Vec::with_capacity(total);

        for (i, candidate) in candidates.iter().enumerate() {
            info!(url = %candidate, "engaging candidate {}/{total}", i + 1);
            progress.emit(RunEventKind::CandidateStarted {
                profile_url: candidate.profile_url.clone(),
            });

            let state = self.engage(forum, candidate).await;
            let outcome = EngagementOutcome::new(candidate.clone(), state);
            info!(url = %candidate, %state, "candidate resolved");
            progress.emit(RunEventKind::CandidateResolved {
                outcome: outcome.clone(),
            });
            outcomes.push(outcome);

            // Only a placed comment is followed by a pause, and only when
            // there is another candidate to act on.
            if state == EngagementState::Commented && i + 1 < total {
                self.pacer.delay().await;
            }
        }

        outcomes
    }

    async fn engage(&self, forum: &mut dyn Forum, candidate: &Candidate) -> EngagementState {
        let url = candidate.profile_url.as_str();
        let mut step = Step::Start;

        loop {
            step = match step {
                Step::Start => match forum.open_profile(url).await {
                    Ok(()) => Step::Navigated,
                    Err(e) => {
                        warn!(url, "could not open profile: {e:#}");
                        Step::Done(EngagementState::Unreachable)
                    }
                },

                Step::Navigated => match forum.subscription_label().await {
                    Ok(Some(label)) => Step::SubscribeChecked { label },
                    Ok(None) => {
                        warn!(url, "no subscription control on profile");
                        Step::Done(EngagementState::Unreachable)
                    }
                    Err(e) => {
                        warn!(url, "could not read subscription control: {e:#}");
                        Step::Done(EngagementState::Unreachable)
                    }
                },

                // Anything but the exact "subscribe" label counts as already
                // subscribed: an unknown label must never lead to a click.
                Step::SubscribeChecked { label } => {
                    if label != self.labels.subscribe {
                        info!(url, %label, "already subscribed, skipping");
                        Step::Done(EngagementState::AlreadySubscribed)
                    } else if self.dry_run {
                        Step::Done(EngagementState::WouldSubscribe)
                    } else {
                        Step::SubscribePending
                    }
                }

                Step::SubscribePending => match self.subscribe(forum).await {
                    Ok(()) => {
                        info!(url, "subscribed");
                        Step::Subscribed
                    }
                    Err(e) => {
                        warn!(url, "subscription not confirmed: {e:#}");
                        Step::Done(EngagementState::SubscribeFailed)
                    }
                },

                Step::Subscribed => Step::CommentAttempted(self.comment(forum, url).await),

                Step::CommentAttempted(Ok(())) => {
                    info!(url, "comment posted");
                    Step::Done(EngagementState::Commented)
                }
                Step::CommentAttempted(Err(e)) => {
                    warn!(url, "comment failed: {e:#}");
                    Step::Done(EngagementState::CommentFailed)
                }

                Step::Done(state) => return state,
            };
        }
    }

    async fn subscribe(&self, forum: &mut dyn Forum) -> Result<()> {
        forum.press_subscribe().await?;
        forum.wait_subscription_label(&self.labels.subscribed).await
    }

    /// Return to the listing, find the author's post and comment on it.
    async fn comment(&self, forum: &mut dyn Forum, author_url: &str) -> Result<()> {
        forum.open_listing().await?;
        let index = locate(forum, author_url).await?;
        forum.expand_entry(index).await?;

        // Expanding re-renders the listing; look the post up again.
        let index = locate(forum, author_url).await?;
        let text = self.content.comment().await;
        forum.submit_comment(index, &text).await
    }
}

/// Index of the author's post in a freshly read listing.
async fn locate(forum: &mut dyn Forum, author_url: &str) -> Result<usize> {
    forum
        .read_listing()
        .await?
        .into_iter()
        .find(|entry| entry.author_url.as_deref() == Some(author_url))
        .map(|entry| entry.index)
        .ok_or_else(|| anyhow!("post by {author_url} is no longer on the listing"))
}
