//! Post and comment text.
//!
//! [`ContentGenerator::generate`] never fails: any error from the backing
//! [`TextGenerator`] (or the lack of one) resolves to a fixed fallback for
//! the requested kind.

pub mod openai;

use crate::model::PostContent;
use anyhow::{bail, Result};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Capability to turn a prompt into free text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// What to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Title,
    Body,
    Comment,
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Title => write!(f, "title"),
            Self::Body => write!(f, "body"),
            Self::Comment => write!(f, "comment"),
        }
    }
}

const TITLE_PROMPT: &str = "티스토리 커뮤니티 포럼의 '블로그 소개' 게시판에 올릴 글의 제목을 한 줄로 \
작성해 주세요. 경제 초보를 위한 기초 지식을 전달하는 블로그이고, 맞구독을 환영한다는 내용이 \
드러나야 합니다. 제목에는 반드시 '맞구독'이라는 단어를 포함하고, 따옴표나 설명 없이 제목만 \
출력하세요.";

const BODY_PROMPT: &str = "티스토리 커뮤니티 포럼의 '블로그 소개' 게시판에 올릴 글의 본문을 \
작성해 주세요. 경제 초보를 위한 기초 지식을 쉽게 풀어 쓰는 블로그를 소개하고, 맞구독을 \
해 주시면 꼭 답방하여 구독하겠다는 내용을 친근한 말투로 3~4문장 이내로 써 주세요. 본문만 \
출력하세요.";

const COMMENT_PROMPT: &str = "티스토리 포럼에서 맞구독을 요청한 블로거의 글에 남길 짧은 댓글을 \
작성해 주세요. 방금 구독했다는 사실과 함께, 경제 초보를 위한 기초 지식을 전달하는 제 블로그도 \
방문해 달라는 내용을 친근하게 1~2문장으로 써 주세요. 매번 표현을 조금씩 다르게 하고, 댓글만 \
출력하세요.";

const FALLBACK_TITLE: &str = "[맞구독] 경제 초보를 위한 기초 지식 블로그입니다, 맞구독 환영해요";

const FALLBACK_BODY: &str = "안녕하세요! 경제 초보를 위한 기본 지식을 쉽게 풀어 쓰는 블로그를 \
운영하고 있습니다. 맞구독 해 주시면 꼭 답방 가서 구독하겠습니다. 댓글 남겨 주세요 :)";

const FALLBACK_COMMENT: &str =
    "경제 초보를 위한 기본 지식전달을 위한 글을 쓰고있습니다. 맞구독하고 많은 정보 얻어가세요 ~";

impl ContentKind {
    /// Instruction sent to the text generator.
    pub fn prompt(self) -> &'static str {
        match self {
            Self::Title => TITLE_PROMPT,
            Self::Body => BODY_PROMPT,
            Self::Comment => COMMENT_PROMPT,
        }
    }

    /// Text used when generation is unavailable or fails.
    pub fn fallback(self) -> &'static str {
        match self {
            Self::Title => FALLBACK_TITLE,
            Self::Body => FALLBACK_BODY,
            Self::Comment => FALLBACK_COMMENT,
        }
    }
}

/// Produces post and comment text, generatively when a backend is set.
#[derive(Clone, Default)]
pub struct ContentGenerator {
    backend: Option<Arc<dyn TextGenerator>>,
}

impl ContentGenerator {
    /// Generate through `backend`, falling back to templates on failure.
    pub fn new(backend: Arc<dyn TextGenerator>) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    /// Always use the fixed templates.
    pub fn template() -> Self {
        Self { backend: None }
    }

    /// Non-empty text of the requested kind.
    pub async fn generate(&self, kind: ContentKind) -> String {
        let Some(backend) = &self.backend else {
            return kind.fallback().to_string();
        };

        match backend.generate(kind.prompt()).await.and_then(clean) {
            Ok(text) => {
                debug!(%kind, chars = text.chars().count(), "generated text");
                text
            }
            Err(e) => {
                warn!(%kind, "text generation failed, using fallback: {e:#}");
                kind.fallback().to_string()
            }
        }
    }

    /// Title and body for one solicitation post.
    pub async fn post(&self) -> PostContent {
        PostContent {
            title: self.generate(ContentKind::Title).await,
            body: self.generate(ContentKind::Body).await,
        }
    }

    /// A fresh comment for one candidate.
    pub async fn comment(&self) -> String {
        self.generate(ContentKind::Comment).await
    }
}

/// Trim model output and strip quotes wrapped around the whole text.
fn clean(raw: String) -> Result<String> {
    let mut text = raw.trim();
    for (open, close) in [('"', '"'), ('“', '”'), ('\'', '\''), ('「', '」')] {
        if text.chars().count() >= 2 && text.starts_with(open) && text.ends_with(close) {
            text = text[open.len_utf8()..text.len() - close.len_utf8()].trim();
        }
    }
    if text.is_empty() {
        bail!("generator returned empty text");
    }
    Ok(text.to_string())
}
