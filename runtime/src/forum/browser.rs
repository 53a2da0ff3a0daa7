//! Browser-backed [`Forum`] driving a single [`RenderContext`].

use super::listing::parse_listing;
use super::{Forum, SiteProfile};
use crate::model::ListingEntry;
use crate::renderer::locator::{
    enabled_script, exists_script, gone_script, scroll_into_view_script, text_equals_script,
    text_script, value_empty_script,
};
use crate::renderer::{CookieSpec, Locator, RenderContext};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// The live forum, reached through one browser tab.
pub struct BrowserForum {
    context: Box<dyn RenderContext>,
    site: SiteProfile,
}

impl BrowserForum {
    pub fn new(context: Box<dyn RenderContext>, site: SiteProfile) -> Self {
        Self { context, site }
    }

    async fn goto(&mut self, url: &str) -> Result<()> {
        let timeout_ms = self.site.timings.navigation_timeout.as_millis() as u64;
        let nav = self.context.navigate(url, timeout_ms).await?;
        debug!(url, final_url = %nav.final_url, load_ms = nav.load_time_ms, "navigated");
        Ok(())
    }

    /// Poll a boolean script until it yields `true` or `timeout` passes.
    async fn wait_until(&self, script: &str, timeout: Duration, what: &str) -> Result<()> {
        let poll = self.site.timings.poll_interval;
        let waited = tokio::time::timeout(timeout, async {
            loop {
                match self.context.execute_js(script).await {
                    Ok(serde_json::Value::Bool(true)) => return,
                    Ok(_) => {}
                    Err(e) => debug!(what, "wait check failed: {e:#}"),
                }
                tokio::time::sleep(poll).await;
            }
        })
        .await;

        if waited.is_err() {
            bail!("timed out after {}ms waiting for {what}", timeout.as_millis());
        }
        Ok(())
    }

    async fn wait_for(&self, target: &Locator, timeout: Duration) -> Result<()> {
        self.wait_until(&exists_script(target), timeout, &format!("'{target}'"))
            .await
    }

    async fn settle(&self, pause: Duration) {
        if !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }
    }

    fn entry_part(&self, index: usize, inner: &str) -> Locator {
        Locator::nested(&self.site.selectors.listing_entry, index, inner)
    }
}

#[async_trait]
impl Forum for BrowserForum {
    async fn submit_login_form(&mut self, identifier: &str, secret: &str) -> Result<()> {
        let login_url = self.site.login_url.clone();
        self.goto(&login_url).await?;

        let sel = self.site.selectors.clone();
        let element_timeout = self.site.timings.element_timeout;

        let kakao = Locator::css(&sel.kakao_login);
        self.wait_for(&kakao, element_timeout).await?;
        self.context.click(&kakao).await?;

        let id_input = Locator::css(&sel.login_id);
        self.wait_for(&id_input, element_timeout).await?;
        self.context.type_into(&id_input, identifier).await?;

        let pw_input = Locator::css(&sel.login_password);
        self.wait_for(&pw_input, element_timeout).await?;
        self.context.type_into(&pw_input, secret).await?;

        self.context.click(&Locator::css(&sel.login_submit)).await?;
        Ok(())
    }

    async fn inject_session(&mut self, session: &str, keep: &str) -> Result<()> {
        let home = self.site.home_url.clone();
        self.goto(&home).await?;
        self.context.clear_cookies().await?;

        let cookie = |name: &str, value: &str| CookieSpec {
            name: name.to_string(),
            value: value.to_string(),
            domain: self.site.cookie_domain.clone(),
            path: "/".to_string(),
        };
        let cookies = [
            cookie(&self.site.session_cookie, session),
            cookie(&self.site.keep_cookie, keep),
        ];
        self.context.set_cookies(&cookies).await?;
        self.context.reload().await
    }

    async fn wait_logged_in(&mut self) -> Result<()> {
        let marker = Locator::css(&self.site.selectors.logged_in_marker);
        self.wait_for(&marker, self.site.timings.login_timeout)
            .await
            .context("logged-in marker never appeared")
    }

    async fn open_listing(&mut self) -> Result<()> {
        let forum = self.site.forum_url.clone();
        self.goto(&forum).await?;
        self.settle(self.site.timings.after_listing_load).await;
        Ok(())
    }

    async fn read_listing(&mut self) -> Result<Vec<ListingEntry>> {
        let html = self.context.get_html().await?;
        let page_url = match self.context.get_url().await {
            Ok(url) if !url.is_empty() => url,
            _ => self.site.forum_url.clone(),
        };
        parse_listing(&html, &page_url, &self.site.selectors)
    }

    async fn open_profile(&mut self, profile_url: &str) -> Result<()> {
        self.goto(profile_url).await?;
        self.settle(self.site.timings.after_profile_load).await;
        Ok(())
    }

    async fn subscription_label(&mut self) -> Result<Option<String>> {
        let control = Locator::css(&self.site.selectors.subscription_control);
        if self
            .wait_for(&control, self.site.timings.element_timeout)
            .await
            .is_err()
        {
            return Ok(None);
        }

        let label = Locator::css(&self.site.selectors.subscription_label);
        let read = self.context.execute_js(&text_script(&label)).await?;
        let found = read["found"].as_bool().unwrap_or(false);
        Ok(found.then(|| read["text"].as_str().unwrap_or_default().to_string()))
    }

    async fn press_subscribe(&mut self) -> Result<()> {
        let control = Locator::css(&self.site.selectors.subscription_control);
        self.context.click(&control).await
    }

    async fn wait_subscription_label(&mut self, expected: &str) -> Result<()> {
        let label = Locator::css(&self.site.selectors.subscription_label);
        self.wait_until(
            &text_equals_script(&label, expected),
            self.site.timings.subscribe_timeout,
            &format!("subscription label '{expected}'"),
        )
        .await
    }

    async fn expand_entry(&mut self, index: usize) -> Result<()> {
        let entry = Locator::item(&self.site.selectors.listing_entry, index);
        let scrolled = self.context.execute_js(&scroll_into_view_script(&entry)).await?;
        if scrolled != serde_json::Value::Bool(true) {
            bail!("listing entry {index} is no longer rendered");
        }
        self.settle(self.site.timings.after_scroll).await;

        let expand = self.entry_part(index, &self.site.selectors.entry_expand.clone());
        self.context.click(&expand).await?;
        self.settle(self.site.timings.after_expand).await;
        Ok(())
    }

    async fn submit_comment(&mut self, index: usize, text: &str) -> Result<()> {
        let input = self.entry_part(index, &self.site.selectors.entry_comment_input.clone());
        let submit = self.entry_part(index, &self.site.selectors.entry_comment_submit.clone());
        let timings = self.site.timings.clone();

        self.wait_for(&input, timings.element_timeout).await?;
        self.context.type_into(&input, text).await?;
        self.settle(timings.after_typing).await;

        self.wait_until(
            &enabled_script(&submit),
            timings.comment_timeout,
            "comment submit control",
        )
        .await?;
        self.context.click(&submit).await?;

        // The form resets once the platform accepts the comment.
        self.wait_until(
            &value_empty_script(&input),
            timings.comment_timeout,
            "comment confirmation",
        )
        .await?;
        self.settle(timings.after_comment).await;
        Ok(())
    }

    async fn open_composer(&mut self) -> Result<()> {
        self.open_listing().await?;
        let open = Locator::css(&self.site.selectors.composer_open);
        self.wait_for(&open, self.site.timings.element_timeout).await?;
        self.context.click(&open).await?;
        let title = Locator::css(&self.site.selectors.composer_title);
        self.wait_for(&title, self.site.timings.element_timeout).await
    }

    async fn select_intro_category(&mut self) -> Result<()> {
        let category = Locator::css(&self.site.selectors.composer_intro_category);
        self.wait_for(&category, self.site.timings.element_timeout)
            .await?;
        self.context.click(&category).await
    }

    async fn fill_post(&mut self, title: &str, body: &str) -> Result<()> {
        let title_input = Locator::css(&self.site.selectors.composer_title);
        let body_input = Locator::css(&self.site.selectors.composer_body);
        self.context.type_into(&title_input, title).await?;
        self.settle(self.site.timings.after_typing).await;
        self.context.type_into(&body_input, body).await?;
        self.settle(self.site.timings.after_typing).await;
        Ok(())
    }

    async fn submit_post(&mut self) -> Result<()> {
        let submit = Locator::css(&self.site.selectors.composer_submit);
        self.context.click(&submit).await?;
        // The composer layer closes once the post is accepted.
        let title = Locator::css(&self.site.selectors.composer_title);
        self.wait_until(
            &gone_script(&title),
            self.site.timings.publish_timeout,
            "post confirmation",
        )
        .await
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.context.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forum::SiteTimings;
    use crate::renderer::NavigationResult;
    use std::sync::{Arc, Mutex};

    /// A context whose scripted JS answers come from a queue.
    #[derive(Default)]
    struct ScriptedContext {
        answers: Mutex<Vec<serde_json::Value>>,
        log: Arc<Mutex<Vec<String>>>,
        html: String,
    }

    #[async_trait]
    impl RenderContext for ScriptedContext {
        async fn navigate(&mut self, url: &str, _timeout_ms: u64) -> Result<NavigationResult> {
            self.log.lock().unwrap().push(format!("navigate {url}"));
            Ok(NavigationResult {
                final_url: url.to_string(),
                load_time_ms: 1,
            })
        }
        async fn reload(&mut self) -> Result<()> {
            self.log.lock().unwrap().push("reload".to_string());
            Ok(())
        }
        async fn execute_js(&self, _script: &str) -> Result<serde_json::Value> {
            let mut answers = self.answers.lock().unwrap();
            if answers.is_empty() {
                return Ok(serde_json::Value::Bool(false));
            }
            Ok(answers.remove(0))
        }
        async fn get_html(&self) -> Result<String> {
            Ok(self.html.clone())
        }
        async fn get_url(&self) -> Result<String> {
            Ok("https://www.tistory.com/community/forum".to_string())
        }
        async fn click(&mut self, target: &Locator) -> Result<()> {
            self.log.lock().unwrap().push(format!("click {target}"));
            Ok(())
        }
        async fn type_into(&mut self, target: &Locator, text: &str) -> Result<()> {
            self.log.lock().unwrap().push(format!("type {target} {text}"));
            Ok(())
        }
        async fn clear_cookies(&mut self) -> Result<()> {
            self.log.lock().unwrap().push("clear_cookies".to_string());
            Ok(())
        }
        async fn set_cookies(&mut self, cookies: &[CookieSpec]) -> Result<()> {
            for c in cookies {
                self.log
                    .lock()
                    .unwrap()
                    .push(format!("cookie {}={} @{}", c.name, c.value, c.domain));
            }
            Ok(())
        }
        async fn close(self: Box<Self>) -> Result<()> {
            Ok(())
        }
    }

    fn fast_site() -> SiteProfile {
        let mut site = SiteProfile::tistory();
        site.timings = SiteTimings {
            element_timeout: Duration::from_millis(50),
            login_timeout: Duration::from_millis(50),
            subscribe_timeout: Duration::from_millis(50),
            comment_timeout: Duration::from_millis(50),
            publish_timeout: Duration::from_millis(50),
            poll_interval: Duration::from_millis(5),
            after_listing_load: Duration::ZERO,
            after_profile_load: Duration::ZERO,
            after_scroll: Duration::ZERO,
            after_expand: Duration::ZERO,
            after_typing: Duration::ZERO,
            after_comment: Duration::ZERO,
            ..SiteTimings::default()
        };
        site
    }

    #[tokio::test]
    async fn test_inject_session_clears_then_sets_cookies() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let ctx = ScriptedContext {
            log: Arc::clone(&log),
            ..Default::default()
        };
        let mut forum = BrowserForum::new(Box::new(ctx), fast_site());
        forum.inject_session("s1", "k1").await.unwrap();

        let log = log.lock().unwrap().clone();
        assert_eq!(
            log,
            vec![
                "navigate https://www.tistory.com/".to_string(),
                "clear_cookies".to_string(),
                "cookie TSSESSION=s1 @.tistory.com".to_string(),
                "cookie TSSESSION_KEEP=k1 @.tistory.com".to_string(),
                "reload".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_wait_logged_in_times_out() {
        let mut forum = BrowserForum::new(Box::new(ScriptedContext::default()), fast_site());
        let err = forum.wait_logged_in().await.unwrap_err();
        assert!(format!("{err:#}").contains("timed out"));
    }

    #[tokio::test]
    async fn test_subscription_label_read() {
        let ctx = ScriptedContext {
            answers: Mutex::new(vec![
                serde_json::Value::Bool(true),
                serde_json::json!({ "found": true, "text": "구독중" }),
            ]),
            ..Default::default()
        };
        let mut forum = BrowserForum::new(Box::new(ctx), fast_site());
        assert_eq!(
            forum.subscription_label().await.unwrap().as_deref(),
            Some("구독중")
        );
    }

    #[tokio::test]
    async fn test_missing_subscription_control_is_none() {
        let mut forum = BrowserForum::new(Box::new(ScriptedContext::default()), fast_site());
        assert_eq!(forum.subscription_label().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_submit_comment_targets_entry_by_index() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let ctx = ScriptedContext {
            // input exists, submit enabled, textarea cleared
            answers: Mutex::new(vec![
                serde_json::Value::Bool(true),
                serde_json::Value::Bool(true),
                serde_json::Value::Bool(true),
            ]),
            log: Arc::clone(&log),
            ..Default::default()
        };
        let mut forum = BrowserForum::new(Box::new(ctx), fast_site());
        forum.submit_comment(2, "반갑습니다").await.unwrap();

        let log = log.lock().unwrap().clone();
        assert_eq!(
            log,
            vec![
                "type ul.list_tistory > li[2] textarea.textarea_form 반갑습니다".to_string(),
                "click ul.list_tistory > li[2] button.btn_tistory_type1[type='submit']"
                    .to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_unconfirmed_comment_is_an_error() {
        let ctx = ScriptedContext {
            answers: Mutex::new(vec![
                serde_json::Value::Bool(true),
                serde_json::Value::Bool(true),
            ]),
            ..Default::default()
        };
        let mut forum = BrowserForum::new(Box::new(ctx), fast_site());
        let err = forum.submit_comment(0, "반갑습니다").await.unwrap_err();
        assert!(err.to_string().contains("comment confirmation"));
    }

    #[tokio::test]
    async fn test_read_listing_parses_html() {
        let ctx = ScriptedContext {
            html: r#"<ul class="list_tistory"><li><a class="txt_id" href="https://a.tistory.com/">a</a><span class="inner_desc_tit">맞구독</span></li></ul>"#.to_string(),
            ..Default::default()
        };
        let mut forum = BrowserForum::new(Box::new(ctx), fast_site());
        let entries = forum.read_listing().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].author_url.as_deref(), Some("https://a.tistory.com/"));
    }
}
