//! Post publisher: submits the solicitation post to the forum.

use crate::forum::Forum;
use crate::model::PostContent;
use crate::progress::{Progress, RunEventKind};
use anyhow::{Context, Result};
use tracing::{info, warn};

/// Publish `post` to the introduction board.
///
/// Returns whether the composer confirmed the submission. Failures are logged,
/// reported with their cause and returned as `false`; they never abort the run.
pub async fn publish(forum: &mut dyn Forum, post: &PostContent, progress: &Progress) -> bool {
    match try_publish(forum, post).await {
        Ok(()) => {
            info!(title = %post.title, "solicitation post published");
            progress.emit(RunEventKind::PostPublished {
                title: post.title.clone(),
            });
            true
        }
        Err(e) => {
            warn!("failed to publish solicitation post: {e:#}");
            progress.emit(RunEventKind::PublishFailed {
                reason: format!("{e:#}"),
            });
            false
        }
    }
}

async fn try_publish(forum: &mut dyn Forum, post: &PostContent) -> Result<()> {
    forum.open_composer().await.context("opening composer")?;
    forum
        .select_intro_category()
        .await
        .context("selecting introduction category")?;
    forum
        .fill_post(&post.title, &post.body)
        .await
        .context("filling post")?;
    forum.submit_post().await.context("submitting post")
}
