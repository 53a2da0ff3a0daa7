//! Session gateway: the single authentication gate of a run.
//!
//! A [`Session`] owns the run's only browsing context. The
//! [`SessionGateway`] authenticates it once, by login form or by injected
//! session cookies; there is no retry, and a failed gate aborts the run.

use crate::config::AuthStrategy;
use crate::forum::Forum;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Authentication state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthState {
    Unauthenticated,
    Authenticated,
    /// Authenticated longer ago than the configured maximum age.
    Expired,
}

/// Outcome of an authentication attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthResult {
    pub success: bool,
    /// Why authentication failed, when it did.
    pub reason: Option<String>,
}

/// The run's authenticated browsing context.
pub struct Session {
    forum: Box<dyn Forum>,
    authenticated_at: Option<Instant>,
    max_age: Duration,
}

impl Session {
    pub fn new(forum: Box<dyn Forum>, max_age: Duration) -> Self {
        Self {
            forum,
            authenticated_at: None,
            max_age,
        }
    }

    pub fn state(&self) -> AuthState {
        match self.authenticated_at {
            None => AuthState::Unauthenticated,
            Some(at) if at.elapsed() >= self.max_age => AuthState::Expired,
            Some(_) => AuthState::Authenticated,
        }
    }

    /// Time since authentication succeeded.
    pub fn age(&self) -> Option<Duration> {
        self.authenticated_at.map(|at| at.elapsed())
    }

    /// The browsing context.
    pub fn forum(&mut self) -> &mut dyn Forum {
        self.forum.as_mut()
    }

    /// Close the session and release the browsing context.
    pub async fn close(self) -> Result<()> {
        self.forum.close().await
    }
}

/// Authenticates a [`Session`] with the configured strategy.
pub struct SessionGateway {
    strategy: AuthStrategy,
}

impl SessionGateway {
    pub fn new(strategy: AuthStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Attempt authentication once. Never returns an error: any failure
    /// becomes `success = false` and leaves the session unauthenticated.
    pub async fn authenticate(&self, session: &mut Session) -> AuthResult {
        info!(strategy = self.strategy.name(), "authenticating");
        let forum = session.forum();

        let attempt = match &self.strategy {
            AuthStrategy::Form { identifier, secret } => {
                match forum.submit_login_form(identifier, secret).await {
                    Ok(()) => forum.wait_logged_in().await,
                    Err(e) => Err(e),
                }
            }
            AuthStrategy::Tokens { session, keep } => {
                match forum.inject_session(session, keep).await {
                    Ok(()) => forum.wait_logged_in().await,
                    Err(e) => Err(e),
                }
            }
        };

        match attempt {
            Ok(()) => {
                session.authenticated_at = Some(Instant::now());
                info!("login succeeded");
                AuthResult {
                    success: true,
                    reason: None,
                }
            }
            Err(e) => {
                session.authenticated_at = None;
                warn!(strategy = self.strategy.name(), "login failed: {e:#}");
                AuthResult {
                    success: false,
                    reason: Some(format!("{e:#}")),
                }
            }
        }
    }
}
