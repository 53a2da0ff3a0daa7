//! Randomized pauses between platform actions.

use crate::config::PacingRange;
use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;
use tracing::info;

/// Something that blocks the run between actions.
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn delay(&self);
}

/// Sleeps for a duration drawn uniformly from a [`PacingRange`].
#[derive(Debug, Clone)]
pub struct RandomPacer {
    range: PacingRange,
}

impl RandomPacer {
    pub fn new(range: PacingRange) -> Self {
        Self { range }
    }

    /// Draw the next pause length.
    pub fn draw(&self) -> Duration {
        let PacingRange { min_secs, max_secs } = self.range;
        let secs = if min_secs >= max_secs {
            min_secs
        } else {
            rand::thread_rng().gen_range(min_secs..=max_secs)
        };
        Duration::from_secs(secs)
    }
}

#[async_trait]
impl Pacer for RandomPacer {
    async fn delay(&self) {
        let pause = self.draw();
        info!(secs = pause.as_secs(), "pacing before next action");
        tokio::time::sleep(pause).await;
    }
}
