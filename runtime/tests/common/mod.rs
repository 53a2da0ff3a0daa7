//! Scripted in-memory forum shared by the integration tests.

#![allow(dead_code)]

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use reciprocity_runtime::config::RunConfig;
use reciprocity_runtime::content::{ContentGenerator, TextGenerator};
use reciprocity_runtime::forum::{Forum, SiteProfile};
use reciprocity_runtime::model::ListingEntry;
use reciprocity_runtime::pacing::Pacer;
use reciprocity_runtime::pipeline::{Pipeline, RunOptions};
use reciprocity_runtime::progress::Progress;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const SELF_MARKER: &str = "myblog.tistory.com";
pub const KEYWORD: &str = "맞구독";
pub const SUBSCRIBE: &str = "구독하기";
pub const SUBSCRIBED: &str = "구독중";

pub const A: &str = "https://alpha.tistory.com/";
pub const B: &str = "https://myblog.tistory.com/";
pub const C: &str = "https://gamma.tistory.com/";
pub const D: &str = "https://delta.tistory.com/";

/// How one author's profile behaves.
#[derive(Debug, Clone)]
pub struct Profile {
    /// `None` means the page has no subscription control.
    pub label: Option<String>,
    pub loads: bool,
    /// Pressing subscribe flips the label to "subscribed".
    pub subscribe_confirms: bool,
    /// The author's post drops off the listing once subscribed.
    pub vanishes_after_subscribe: bool,
    pub comment_confirms: bool,
}

impl Profile {
    pub fn open() -> Self {
        Self {
            label: Some(SUBSCRIBE.to_string()),
            loads: true,
            subscribe_confirms: true,
            vanishes_after_subscribe: false,
            comment_confirms: true,
        }
    }

    pub fn subscribed() -> Self {
        Self {
            label: Some(SUBSCRIBED.to_string()),
            ..Self::open()
        }
    }

    pub fn unreachable() -> Self {
        Self {
            loads: false,
            ..Self::open()
        }
    }
}

/// Everything the fake saw and how it is scripted to respond.
#[derive(Debug, Default)]
pub struct ForumState {
    pub login_ok: bool,
    pub publish_ok: bool,
    pub listing_fails: bool,
    /// An empty title renders as an entry without one.
    pub listing: Vec<(String, String)>,
    pub profiles: HashMap<String, Profile>,

    pub current_profile: Option<String>,
    pub vanished: HashSet<String>,
    pub calls: Vec<String>,
    pub comments: Vec<(String, String)>,
    pub posts: Vec<(String, String)>,
    pub closed: bool,
}

impl ForumState {
    fn visible_listing(&self) -> Vec<ListingEntry> {
        self.listing
            .iter()
            .filter(|(_, author)| !self.vanished.contains(author))
            .enumerate()
            .map(|(index, (title, author))| ListingEntry {
                index,
                title: (!title.is_empty()).then(|| title.clone()),
                author_url: Some(author.clone()),
            })
            .collect()
    }

    pub fn count_calls(&self, prefix: &str) -> usize {
        self.calls.iter().filter(|c| c.starts_with(prefix)).count()
    }
}

/// A [`Forum`] whose state stays inspectable after it is boxed away.
pub struct FakeForum {
    state: Arc<Mutex<ForumState>>,
}

impl FakeForum {
    pub fn new(state: Arc<Mutex<ForumState>>) -> Self {
        Self { state }
    }

    fn with<T>(&self, f: impl FnOnce(&mut ForumState) -> T) -> T {
        let mut state = self.state.lock().unwrap();
        f(&mut state)
    }
}

#[async_trait]
impl Forum for FakeForum {
    async fn submit_login_form(&mut self, identifier: &str, _secret: &str) -> Result<()> {
        self.with(|s| s.calls.push(format!("login {identifier}")));
        Ok(())
    }

    async fn inject_session(&mut self, _session: &str, _keep: &str) -> Result<()> {
        self.with(|s| s.calls.push("inject_session".to_string()));
        Ok(())
    }

    async fn wait_logged_in(&mut self) -> Result<()> {
        self.with(|s| {
            if s.login_ok {
                Ok(())
            } else {
                Err(anyhow!("timed out after 15000ms waiting for logged-in state"))
            }
        })
    }

    async fn open_listing(&mut self) -> Result<()> {
        self.with(|s| {
            s.calls.push("open_listing".to_string());
            if s.listing_fails {
                bail!("navigation to https://www.tistory.com/community/forum timed out");
            }
            Ok(())
        })
    }

    async fn read_listing(&mut self) -> Result<Vec<ListingEntry>> {
        Ok(self.with(|s| s.visible_listing()))
    }

    async fn open_profile(&mut self, profile_url: &str) -> Result<()> {
        self.with(|s| {
            s.calls.push(format!("open_profile {profile_url}"));
            let loads = s.profiles.get(profile_url).map_or(false, |p| p.loads);
            if !loads {
                s.current_profile = None;
                bail!("navigation to {profile_url} failed");
            }
            s.current_profile = Some(profile_url.to_string());
            Ok(())
        })
    }

    async fn subscription_label(&mut self) -> Result<Option<String>> {
        self.with(|s| {
            let url = s.current_profile.clone().ok_or_else(|| anyhow!("no profile open"))?;
            Ok(s.profiles.get(&url).and_then(|p| p.label.clone()))
        })
    }

    async fn press_subscribe(&mut self) -> Result<()> {
        self.with(|s| {
            let url = s.current_profile.clone().ok_or_else(|| anyhow!("no profile open"))?;
            s.calls.push(format!("press_subscribe {url}"));
            let mut vanish = false;
            if let Some(profile) = s.profiles.get_mut(&url) {
                if profile.subscribe_confirms {
                    profile.label = Some(SUBSCRIBED.to_string());
                    vanish = profile.vanishes_after_subscribe;
                }
            }
            if vanish {
                s.vanished.insert(url);
            }
            Ok(())
        })
    }

    async fn wait_subscription_label(&mut self, expected: &str) -> Result<()> {
        self.with(|s| {
            let url = s.current_profile.clone().ok_or_else(|| anyhow!("no profile open"))?;
            match s.profiles.get(&url).and_then(|p| p.label.as_deref()) {
                Some(label) if label == expected => Ok(()),
                _ => bail!("timed out after 10000ms waiting for label {expected}"),
            }
        })
    }

    async fn expand_entry(&mut self, index: usize) -> Result<()> {
        self.with(|s| {
            s.calls.push(format!("expand_entry {index}"));
            Ok(())
        })
    }

    async fn submit_comment(&mut self, index: usize, text: &str) -> Result<()> {
        self.with(|s| {
            let author = s
                .visible_listing()
                .into_iter()
                .find(|e| e.index == index)
                .and_then(|e| e.author_url)
                .ok_or_else(|| anyhow!("no listing entry at {index}"))?;
            s.calls.push(format!("submit_comment {author}"));
            if !s.profiles.get(&author).map_or(false, |p| p.comment_confirms) {
                bail!("timed out after 5000ms waiting for comment confirmation");
            }
            s.comments.push((author, text.to_string()));
            Ok(())
        })
    }

    async fn open_composer(&mut self) -> Result<()> {
        self.with(|s| s.calls.push("open_composer".to_string()));
        Ok(())
    }

    async fn select_intro_category(&mut self) -> Result<()> {
        Ok(())
    }

    async fn fill_post(&mut self, title: &str, body: &str) -> Result<()> {
        self.with(|s| s.posts.push((title.to_string(), body.to_string())));
        Ok(())
    }

    async fn submit_post(&mut self) -> Result<()> {
        self.with(|s| {
            s.calls.push("submit_post".to_string());
            if s.publish_ok {
                Ok(())
            } else {
                Err(anyhow!("timed out after 10000ms waiting for composer to close"))
            }
        })
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.with(|s| s.closed = true);
        Ok(())
    }
}

/// Counts pauses instead of sleeping.
#[derive(Default)]
pub struct CountingPacer {
    pub delays: AtomicUsize,
}

impl CountingPacer {
    pub fn count(&self) -> usize {
        self.delays.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Pacer for CountingPacer {
    async fn delay(&self) {
        self.delays.fetch_add(1, Ordering::SeqCst);
    }
}

/// Counts generation calls; fails every call when `fail` is set.
pub struct CountingGenerator {
    pub calls: AtomicUsize,
    pub fail: bool,
}

impl CountingGenerator {
    pub fn new(fail: bool) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail,
        }
    }

    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for CountingGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail {
            bail!("connection refused");
        }
        Ok(format!("generated text #{n}"))
    }
}

/// A configuration for the form strategy with every other setting defaulted.
pub fn config() -> RunConfig {
    config_with(&[])
}

pub fn config_with(extra: &[(&str, &str)]) -> RunConfig {
    let mut env: HashMap<String, String> = [
        ("TISTORY_ID", "me@example.com"),
        ("TISTORY_PW", "hunter2"),
        ("TISTORY_SELF_MARKER", SELF_MARKER),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    for (k, v) in extra {
        env.insert(k.to_string(), v.to_string());
    }
    RunConfig::from_lookup(|key| env.get(key).cloned()).unwrap()
}

/// Forum state with the three-post listing used across the scenarios.
pub fn three_post_forum() -> ForumState {
    ForumState {
        login_ok: true,
        publish_ok: true,
        listing: vec![
            ("맞구독 환영".to_string(), A.to_string()),
            ("일상 기록".to_string(), B.to_string()),
            ("맞구독 부탁드려요".to_string(), C.to_string()),
        ],
        ..Default::default()
    }
}

/// Options with publishing off unless a test turns it on.
pub fn options() -> RunOptions {
    RunOptions {
        publish: false,
        keyword: KEYWORD.to_string(),
        dry_run: false,
        scan_only: false,
    }
}

/// A test harness: pipeline plus handles to everything it touches.
pub struct Harness {
    pub state: Arc<Mutex<ForumState>>,
    pub pacer: Arc<CountingPacer>,
    pub generator: Arc<CountingGenerator>,
    pub pipeline: Pipeline,
}

impl Harness {
    pub fn new(state: ForumState) -> Self {
        Self::build(state, config(), CountingGenerator::new(false), Progress::silent())
    }

    pub fn build(
        state: ForumState,
        config: RunConfig,
        generator: CountingGenerator,
        progress: Progress,
    ) -> Self {
        let state = Arc::new(Mutex::new(state));
        let pacer = Arc::new(CountingPacer::default());
        let generator = Arc::new(generator);
        let pipeline = Pipeline::new(config, SiteProfile::tistory(), progress)
            .with_content(ContentGenerator::new(generator.clone()))
            .with_pacer(pacer.clone());
        Self {
            state,
            pacer,
            generator,
            pipeline,
        }
    }

    pub fn forum(&self) -> Box<dyn Forum> {
        Box::new(FakeForum::new(Arc::clone(&self.state)))
    }

    pub fn state(&self) -> std::sync::MutexGuard<'_, ForumState> {
        self.state.lock().unwrap()
    }
}
