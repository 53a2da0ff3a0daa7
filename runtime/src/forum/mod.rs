//! The target site boundary.
//!
//! [`Forum`] is the seam between the engagement logic and the live site. The
//! browser-backed implementation lives in [`browser`]; tests drive the same
//! logic through in-memory fakes.
//!
//! Everything in [`SiteProfile`] is an external contract: a copy or markup
//! change on the platform breaks detection and must be fixed here, not in
//! the orchestrator.

pub mod browser;
pub mod listing;

use crate::model::ListingEntry;
use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Operations the engagement loop needs from the forum.
///
/// Implementations never cache element references between calls: indices
/// passed to [`Forum::expand_entry`] and [`Forum::submit_comment`] refer to
/// the most recent [`Forum::read_listing`] snapshot and are re-resolved
/// against the live page on every call.
#[async_trait]
pub trait Forum: Send {
    /// Open the login entry point and submit identifier and secret through
    /// the identity provider's form.
    async fn submit_login_form(&mut self, identifier: &str, secret: &str) -> Result<()>;
    /// Clear all cookies, install the two session tokens and reload.
    async fn inject_session(&mut self, session: &str, keep: &str) -> Result<()>;
    /// Wait (bounded) for the logged-in marker.
    async fn wait_logged_in(&mut self) -> Result<()>;

    /// Load the forum listing.
    async fn open_listing(&mut self) -> Result<()>;
    /// Read the currently rendered listing.
    async fn read_listing(&mut self) -> Result<Vec<ListingEntry>>;

    /// Load an author's blog.
    async fn open_profile(&mut self, profile_url: &str) -> Result<()>;
    /// Current label of the subscription control, `None` if there is no control.
    async fn subscription_label(&mut self) -> Result<Option<String>>;
    /// Activate the subscription control.
    async fn press_subscribe(&mut self) -> Result<()>;
    /// Wait (bounded) until the subscription label reads `expected`.
    async fn wait_subscription_label(&mut self, expected: &str) -> Result<()>;

    /// Scroll to and expand the comment area of a listing entry.
    async fn expand_entry(&mut self, index: usize) -> Result<()>;
    /// Type and submit a comment on a listing entry, then wait (bounded)
    /// for the platform to accept it.
    async fn submit_comment(&mut self, index: usize, text: &str) -> Result<()>;

    /// Open the post composer on the forum.
    async fn open_composer(&mut self) -> Result<()>;
    /// Pick the "introduction" category in the composer.
    async fn select_intro_category(&mut self) -> Result<()>;
    /// Fill the composer's title and body.
    async fn fill_post(&mut self, title: &str, body: &str) -> Result<()>;
    /// Submit the composer and wait (bounded) for confirmation.
    async fn submit_post(&mut self) -> Result<()>;

    /// Release the underlying browsing context.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// Labels shown on the subscription control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionLabels {
    /// Shown when the author can be subscribed to.
    pub subscribe: String,
    /// Shown once subscribed.
    pub subscribed: String,
}

impl Default for SubscriptionLabels {
    fn default() -> Self {
        Self {
            subscribe: "구독하기".to_string(),
            subscribed: "구독중".to_string(),
        }
    }
}

/// CSS selectors for every element the runtime touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selectors {
    pub kakao_login: String,
    pub login_id: String,
    pub login_password: String,
    pub login_submit: String,
    pub logged_in_marker: String,

    pub listing_entry: String,
    pub entry_title: String,
    pub entry_author: String,
    pub entry_expand: String,
    pub entry_comment_input: String,
    pub entry_comment_submit: String,

    pub subscription_control: String,
    pub subscription_label: String,

    pub composer_open: String,
    pub composer_intro_category: String,
    pub composer_title: String,
    pub composer_body: String,
    pub composer_submit: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            kakao_login: "a.link_kakao_id".to_string(),
            login_id: "input[name='loginId']".to_string(),
            login_password: "input[name='password']".to_string(),
            login_submit: "button[type='submit']".to_string(),
            logged_in_marker: "a.link_profile".to_string(),

            listing_entry: "ul.list_tistory > li".to_string(),
            entry_title: "span.inner_desc_tit".to_string(),
            entry_author: "a.txt_id".to_string(),
            entry_expand: "button.btn_explain".to_string(),
            entry_comment_input: "textarea.textarea_form".to_string(),
            entry_comment_submit: "button.btn_tistory_type1[type='submit']".to_string(),

            subscription_control: ".btn_subscription".to_string(),
            subscription_label: ".btn_subscription em.txt_state".to_string(),

            composer_open: "button.btn_write".to_string(),
            composer_intro_category: "input[name='category'][value='introduce'] + label"
                .to_string(),
            composer_title: "input.tf_title".to_string(),
            composer_body: "textarea.tf_content".to_string(),
            composer_submit: "div.layer_write button.btn_tistory_type1[type='submit']"
                .to_string(),
        }
    }
}

/// Bounded waits and fixed settle pauses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteTimings {
    pub navigation_timeout: Duration,
    pub element_timeout: Duration,
    pub login_timeout: Duration,
    pub subscribe_timeout: Duration,
    pub comment_timeout: Duration,
    pub publish_timeout: Duration,
    pub poll_interval: Duration,

    pub after_listing_load: Duration,
    pub after_profile_load: Duration,
    pub after_scroll: Duration,
    pub after_expand: Duration,
    pub after_typing: Duration,
    pub after_comment: Duration,
}

impl Default for SiteTimings {
    fn default() -> Self {
        Self {
            navigation_timeout: Duration::from_secs(30),
            element_timeout: Duration::from_secs(10),
            login_timeout: Duration::from_secs(15),
            subscribe_timeout: Duration::from_secs(10),
            comment_timeout: Duration::from_secs(5),
            publish_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_millis(250),

            after_listing_load: Duration::from_secs(5),
            after_profile_load: Duration::from_secs(3),
            after_scroll: Duration::from_secs(1),
            after_expand: Duration::from_secs(2),
            after_typing: Duration::from_secs(1),
            after_comment: Duration::from_secs(3),
        }
    }
}

/// URLs, selectors, labels and cookie names of the target site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteProfile {
    pub home_url: String,
    pub login_url: String,
    pub forum_url: String,
    pub cookie_domain: String,
    pub session_cookie: String,
    pub keep_cookie: String,
    pub selectors: Selectors,
    pub labels: SubscriptionLabels,
    pub timings: SiteTimings,
}

impl SiteProfile {
    /// The Tistory community forum.
    pub fn tistory() -> Self {
        Self {
            home_url: "https://www.tistory.com/".to_string(),
            login_url: "https://www.tistory.com/auth/login".to_string(),
            forum_url: "https://www.tistory.com/community/forum".to_string(),
            cookie_domain: ".tistory.com".to_string(),
            session_cookie: "TSSESSION".to_string(),
            keep_cookie: "TSSESSION_KEEP".to_string(),
            selectors: Selectors::default(),
            labels: SubscriptionLabels::default(),
            timings: SiteTimings::default(),
        }
    }
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self::tistory()
    }
}
