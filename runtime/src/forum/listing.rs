//! Forum listing extraction from rendered HTML.

use crate::forum::Selectors;
use crate::model::ListingEntry;
use anyhow::{anyhow, Result};
use scraper::{Html, Selector};
use url::Url;

/// Parse every listing entry out of a rendered forum page.
///
/// Entries are returned in document order, which is the same order
/// `document.querySelectorAll` sees, so `index` can address the entry on
/// the live page. A missing title or author leaves that field `None`;
/// deciding what to do with such entries is up to the caller.
pub fn parse_listing(html: &str, page_url: &str, selectors: &Selectors) -> Result<Vec<ListingEntry>> {
    let entry_sel = parse_selector(&selectors.listing_entry)?;
    let title_sel = parse_selector(&selectors.entry_title)?;
    let author_sel = parse_selector(&selectors.entry_author)?;
    let base = Url::parse(page_url).ok();

    let document = Html::parse_document(html);
    let entries = document
        .select(&entry_sel)
        .enumerate()
        .map(|(index, entry)| {
            let title = entry
                .select(&title_sel)
                .next()
                .map(|t| collapse_whitespace(&t.text().collect::<String>()));
            let author_url = entry
                .select(&author_sel)
                .next()
                .and_then(|a| a.value().attr("href"))
                .and_then(|href| resolve_href(base.as_ref(), href));
            ListingEntry {
                index,
                title,
                author_url,
            }
        })
        .collect();

    Ok(entries)
}

fn parse_selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("invalid selector '{css}': {e}"))
}

/// Resolve an author href to an absolute http(s) URL.
fn resolve_href(base: Option<&Url>, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    let url = match base {
        Some(base) => base.join(href).ok()?,
        None => Url::parse(href).ok()?,
    };
    matches!(url.scheme(), "http" | "https").then(|| url.to_string())
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORUM: &str = "https://www.tistory.com/community/forum";

    fn entry(title: &str, href: &str) -> String {
        format!(
            r#"<li>
                <a class="txt_id" href="{href}">author</a>
                <strong><span class="inner_desc_tit">{title}</span></strong>
                <button class="btn_explain">펼치기</button>
            </li>"#
        )
    }

    fn page(items: &[String]) -> String {
        format!(
            r#"<html><body><ul class="list_tistory">{}</ul></body></html>"#,
            items.join("")
        )
    }

    #[test]
    fn test_parse_listing_in_document_order() {
        let html = page(&[
            entry("맞구독 환영", "https://a.tistory.com"),
            entry("일상 기록", "https://b.tistory.com"),
        ]);
        let entries = parse_listing(&html, FORUM, &Selectors::default()).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].index, 0);
        assert_eq!(entries[0].title.as_deref(), Some("맞구독 환영"));
        // Url normalises a bare origin with a trailing slash.
        assert_eq!(entries[0].author_url.as_deref(), Some("https://a.tistory.com/"));
        assert_eq!(entries[1].index, 1);
    }

    #[test]
    fn test_missing_fields_are_none() {
        let html = page(&[
            r#"<li><span class="inner_desc_tit">no author</span></li>"#.to_string(),
            r#"<li><a class="txt_id" href="https://c.tistory.com/">c</a></li>"#.to_string(),
        ]);
        let entries = parse_listing(&html, FORUM, &Selectors::default()).unwrap();

        assert_eq!(entries[0].author_url, None);
        assert_eq!(entries[0].title.as_deref(), Some("no author"));
        assert_eq!(entries[1].title, None);
        assert_eq!(entries[1].author_url.as_deref(), Some("https://c.tistory.com/"));
    }

    #[test]
    fn test_relative_and_non_http_hrefs() {
        let html = page(&[
            entry("맞구독", "/community/profile/123"),
            entry("맞구독", "javascript:void(0)"),
        ]);
        let entries = parse_listing(&html, FORUM, &Selectors::default()).unwrap();

        assert_eq!(
            entries[0].author_url.as_deref(),
            Some("https://www.tistory.com/community/profile/123")
        );
        assert_eq!(entries[1].author_url, None);
    }

    #[test]
    fn test_title_whitespace_collapsed() {
        let html = page(&[entry("  맞구독\n   부탁드려요 ", "https://a.tistory.com/")]);
        let entries = parse_listing(&html, FORUM, &Selectors::default()).unwrap();
        assert_eq!(entries[0].title.as_deref(), Some("맞구독 부탁드려요"));
    }

    #[test]
    fn test_empty_page() {
        let entries =
            parse_listing("<html><body></body></html>", FORUM, &Selectors::default()).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_invalid_selector_is_an_error() {
        let selectors = Selectors {
            listing_entry: "ul >>> li".to_string(),
            ..Selectors::default()
        };
        assert!(parse_listing("<html></html>", FORUM, &selectors).is_err());
    }
}
