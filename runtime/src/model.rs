//! Domain types shared by the scanner, orchestrator and run report.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// One entry of the forum listing as rendered right now.
///
/// Entries are never cached across navigations: `index` is only meaningful
/// for the listing snapshot it was read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingEntry {
    /// Zero-based position in the listing snapshot.
    pub index: usize,
    pub title: Option<String>,
    pub author_url: Option<String>,
}

/// A forum author selected for engagement, keyed by profile URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Candidate {
    pub profile_url: String,
}

impl Candidate {
    pub fn new(profile_url: impl Into<String>) -> Self {
        Self {
            profile_url: profile_url.into(),
        }
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.profile_url)
    }
}

/// Candidates in first-seen order with no duplicate profile URLs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CandidateSet {
    #[serde(rename = "candidates")]
    order: Vec<Candidate>,
    #[serde(skip)]
    seen: HashSet<String>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a candidate; returns `false` if its URL was already present.
    pub fn insert(&mut self, candidate: Candidate) -> bool {
        if !self.seen.insert(candidate.profile_url.clone()) {
            return false;
        }
        self.order.push(candidate);
        true
    }

    pub fn contains(&self, profile_url: &str) -> bool {
        self.seen.contains(profile_url)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.order.iter()
    }
}

impl<'a> IntoIterator for &'a CandidateSet {
    type Item = &'a Candidate;
    type IntoIter = std::slice::Iter<'a, Candidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.order.iter()
    }
}

impl FromIterator<Candidate> for CandidateSet {
    fn from_iter<I: IntoIterator<Item = Candidate>>(iter: I) -> Self {
        let mut set = Self::new();
        for candidate in iter {
            set.insert(candidate);
        }
        set
    }
}

/// Terminal state reached for one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngagementState {
    /// Profile could not be loaded or has no subscription control.
    Unreachable,
    /// Control already read "subscribed"; nothing was done.
    AlreadySubscribed,
    /// Subscribe was attempted but the label never changed.
    SubscribeFailed,
    /// Subscribed, but the comment could not be placed.
    CommentFailed,
    /// Subscribed and commented.
    Commented,
    /// Dry run: the label said a subscription was possible; nothing clicked.
    WouldSubscribe,
}

impl fmt::Display for EngagementState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unreachable => "unreachable",
            Self::AlreadySubscribed => "already subscribed",
            Self::SubscribeFailed => "subscribe failed",
            Self::CommentFailed => "comment failed",
            Self::Commented => "commented",
            Self::WouldSubscribe => "would subscribe",
        };
        f.write_str(s)
    }
}

/// Result of engaging one candidate. Produced exactly once per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementOutcome {
    pub candidate: Candidate,
    pub subscribed: bool,
    pub commented: bool,
    pub state: EngagementState,
}

impl EngagementOutcome {
    pub fn new(candidate: Candidate, state: EngagementState) -> Self {
        let (subscribed, commented) = match state {
            EngagementState::Commented => (true, true),
            EngagementState::CommentFailed => (true, false),
            _ => (false, false),
        };
        Self {
            candidate,
            subscribed,
            commented,
            state,
        }
    }
}

/// Title and body of the solicitation post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostContent {
    pub title: String,
    pub body: String,
}
