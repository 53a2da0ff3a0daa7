//! Run configuration resolved from the process environment.
//!
//! Every setting is read once at startup into a [`RunConfig`] which is then
//! passed explicitly to the session gateway, content generator and pacer.
//! [`RunConfig::from_lookup`] reports every missing or malformed setting at
//! once rather than stopping at the first one.

use crate::error::ConfigError;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Keyword used by the forum's reciprocal-subscription convention.
pub const DEFAULT_KEYWORD: &str = "맞구독";

/// Default OpenAI-compatible model.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default OpenAI-compatible endpoint.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// How the session gateway authenticates.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthStrategy {
    /// Submit identifier and secret through the identity provider's form.
    Form { identifier: String, secret: String },
    /// Inject previously obtained session cookies.
    Tokens { session: String, keep: String },
}

impl AuthStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Form { .. } => "form",
            Self::Tokens { .. } => "tokens",
        }
    }
}

impl fmt::Debug for AuthStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Form { identifier, .. } => f
                .debug_struct("Form")
                .field("identifier", identifier)
                .field("secret", &"<redacted>")
                .finish(),
            Self::Tokens { .. } => f
                .debug_struct("Tokens")
                .field("session", &"<redacted>")
                .field("keep", &"<redacted>")
                .finish(),
        }
    }
}

/// Inclusive range, in seconds, for randomized pacing delays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingRange {
    pub min_secs: u64,
    pub max_secs: u64,
}

impl Default for PacingRange {
    fn default() -> Self {
        Self {
            min_secs: 10,
            max_secs: 180,
        }
    }
}

/// Settings for the generative-text service.
#[derive(Clone, PartialEq, Eq)]
pub struct LlmConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Browser launch options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserOptions {
    /// Explicit Chromium binary; discovered automatically when `None`.
    pub chromium_path: Option<PathBuf>,
    pub headless: bool,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            chromium_path: None,
            headless: true,
        }
    }
}

/// Fully validated configuration for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub auth: AuthStrategy,
    /// Substring identifying the operating account's own blog URL.
    pub self_marker: String,
    pub keyword: String,
    pub pacing: PacingRange,
    /// Publish the solicitation post before scanning.
    pub publish: bool,
    /// `None` means template mode.
    pub llm: Option<LlmConfig>,
    pub browser: BrowserOptions,
    pub session_max_age: Duration,
}

impl RunConfig {
    /// Build the configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut problems = Vec::new();

        // Tokens win when both pairs are present: they skip the login form.
        let pairs = [
            (
                "TISTORY_TSSESSION",
                get("TISTORY_TSSESSION"),
                "TISTORY_TSSESSION_KEEP",
                get("TISTORY_TSSESSION_KEEP"),
            ),
            ("TISTORY_ID", get("TISTORY_ID"), "TISTORY_PW", get("TISTORY_PW")),
        ];
        let auth = match &pairs {
            [(_, Some(session), _, Some(keep)), _] => Some(AuthStrategy::Tokens {
                session: session.clone(),
                keep: keep.clone(),
            }),
            [_, (_, Some(identifier), _, Some(secret))] => Some(AuthStrategy::Form {
                identifier: identifier.clone(),
                secret: secret.clone(),
            }),
            [(_, None, _, None), (_, None, _, None)] => {
                problems.push(ConfigError::Missing(
                    "TISTORY_ID/TISTORY_PW or TISTORY_TSSESSION/TISTORY_TSSESSION_KEEP",
                ));
                None
            }
            // Every half-set pair names its missing half.
            _ => {
                for &(first_key, ref first, second_key, ref second) in &pairs {
                    match (first, second) {
                        (Some(_), None) => problems.push(ConfigError::Missing(second_key)),
                        (None, Some(_)) => problems.push(ConfigError::Missing(first_key)),
                        _ => {}
                    }
                }
                None
            }
        };

        let self_marker = get("TISTORY_SELF_MARKER");
        if self_marker.is_none() {
            problems.push(ConfigError::Missing("TISTORY_SELF_MARKER"));
        }

        let keyword = get("GROWTH_KEYWORD").unwrap_or_else(|| DEFAULT_KEYWORD.to_string());

        let defaults = PacingRange::default();
        let min_secs = parse_or(&get, "GROWTH_PACE_MIN_SECS", defaults.min_secs, &mut problems);
        let max_secs = parse_or(&get, "GROWTH_PACE_MAX_SECS", defaults.max_secs, &mut problems);
        if min_secs > max_secs {
            problems.push(ConfigError::Invalid {
                key: "GROWTH_PACE_MIN_SECS",
                reason: format!("{min_secs} exceeds GROWTH_PACE_MAX_SECS ({max_secs})"),
            });
        }

        let publish = parse_bool_or(&get, "GROWTH_PUBLISH", true, &mut problems);
        let headless = parse_bool_or(&get, "GROWTH_HEADLESS", true, &mut problems);
        let max_age_mins = parse_or(&get, "GROWTH_SESSION_MAX_AGE_MINS", 120, &mut problems);
        let session_max_age = match max_age_mins.checked_mul(60) {
            Some(secs) => Duration::from_secs(secs),
            None => {
                problems.push(ConfigError::Invalid {
                    key: "GROWTH_SESSION_MAX_AGE_MINS",
                    reason: format!("{max_age_mins} minutes is too large"),
                });
                Duration::ZERO
            }
        };

        let llm = get("OPENAI_API_KEY").map(|api_key| LlmConfig {
            api_key,
            model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: get("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
        });

        if let Some(err) = ConfigError::from_problems(problems) {
            return Err(err);
        }

        match (auth, self_marker) {
            (Some(auth), Some(self_marker)) => Ok(Self {
                auth,
                self_marker,
                keyword,
                pacing: PacingRange { min_secs, max_secs },
                publish,
                llm,
                browser: BrowserOptions {
                    chromium_path: get("GROWTH_CHROMIUM_PATH").map(PathBuf::from),
                    headless,
                },
                session_max_age,
            }),
            // Unreachable in practice: both `None` cases pushed a problem above.
            _ => Err(ConfigError::Missing("TISTORY_SELF_MARKER")),
        }
    }
}

fn parse_or<G>(get: &G, key: &'static str, default: u64, problems: &mut Vec<ConfigError>) -> u64
where
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            problems.push(ConfigError::Invalid {
                key,
                reason: format!("'{raw}' is not a non-negative integer"),
            });
            default
        }),
    }
}

fn parse_bool_or<G>(
    get: &G,
    key: &'static str,
    default: bool,
    problems: &mut Vec<ConfigError>,
) -> bool
where
    G: Fn(&str) -> Option<String>,
{
    match get(key).map(|v| v.to_ascii_lowercase()) {
        None => default,
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => {
                problems.push(ConfigError::Invalid {
                    key,
                    reason: format!("'{v}' is not a boolean"),
                });
                default
            }
        },
    }
}
