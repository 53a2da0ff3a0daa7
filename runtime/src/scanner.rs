//! Forum scanner: turns the latest listing into engagement candidates.

use crate::forum::Forum;
use crate::model::{Candidate, CandidateSet, ListingEntry};
use crate::progress::{Progress, RunEventKind};
use tracing::{info, warn};

/// Result of one scan.
#[derive(Debug, Clone, Default)]
pub struct Scan {
    /// Entries seen on the listing, matching or not.
    pub entries: usize,
    pub candidates: CandidateSet,
}

/// Select candidates from a listing snapshot.
///
/// An entry qualifies when its title contains `keyword` (case-sensitive),
/// its author URL does not contain `self_marker`, and that URL has not been
/// selected already. Entries missing a title or an author are skipped.
pub fn select_candidates(entries: &[ListingEntry], self_marker: &str, keyword: &str) -> CandidateSet {
    let mut candidates = CandidateSet::new();

    for entry in entries {
        let (Some(title), Some(author_url)) = (&entry.title, &entry.author_url) else {
            warn!(
                index = entry.index,
                has_title = entry.title.is_some(),
                has_author = entry.author_url.is_some(),
                "skipping listing entry with missing fields"
            );
            continue;
        };

        if !title.contains(keyword) || author_url.contains(self_marker) {
            continue;
        }
        if candidates.insert(Candidate::new(author_url.clone())) {
            info!(%title, url = %author_url, "found candidate");
        }
    }

    candidates
}

/// Load the forum listing and select candidates from it.
///
/// Never fails: a listing that cannot be loaded or read is logged, reported
/// as a warning event and treated as empty.
pub async fn scan(
    forum: &mut dyn Forum,
    self_marker: &str,
    keyword: &str,
    progress: &Progress,
) -> Scan {
    let loaded = match forum.open_listing().await {
        Ok(()) => forum.read_listing().await,
        Err(e) => Err(e),
    };
    let entries = match loaded {
        Ok(entries) => entries,
        Err(e) => {
            warn!("failed to load forum listing: {e:#}");
            progress.emit(RunEventKind::Warning {
                message: format!("forum listing unavailable: {e:#}"),
            });
            return Scan::default();
        }
    };
    info!(entries = entries.len(), keyword, "scanned forum listing");

    let incomplete = entries
        .iter()
        .filter(|e| e.title.is_none() || e.author_url.is_none())
        .count();
    if incomplete > 0 {
        progress.emit(RunEventKind::Warning {
            message: format!("skipped {incomplete} listing entries without a title or author"),
        });
    }

    Scan {
        entries: entries.len(),
        candidates: select_candidates(&entries, self_marker, keyword),
    }
}
