//! Error types for configuration and fatal run failures.
//!
//! Everything below the pipeline returns `anyhow::Result`; only the failures
//! that abort a run surface as a typed [`RunError`].

/// Configuration problems found at startup.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting: {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("configuration has {} problem(s):\n  - {}", .0.len(), join_problems(.0))]
    Multiple(Vec<ConfigError>),
}

fn join_problems(problems: &[ConfigError]) -> String {
    problems
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join("\n  - ")
}

impl ConfigError {
    /// Collapse a list of problems into a single error, if there are any.
    pub fn from_problems(mut problems: Vec<ConfigError>) -> Option<ConfigError> {
        match problems.len() {
            0 => None,
            1 => problems.pop(),
            _ => Some(ConfigError::Multiple(problems)),
        }
    }
}

/// Failures that abort the whole run.
#[derive(thiserror::Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to launch browser: {0:#}")]
    BrowserLaunch(anyhow::Error),

    #[error("authentication failed ({strategy}); aborting run")]
    AuthenticationFailed { strategy: &'static str },

    #[error("session expired after {age_mins} minutes; aborting run")]
    SessionExpired { age_mins: u64 },
}
