//! Transcript Builder: turns a comment's ancestor chain into a bounded,
//! ordered context for the model.
//!
//! The transcript is the submission (turn 0), the ancestor comments
//! oldest-first, and the triggering comment last. Rendering produces the
//! thread text embedded in the user prompt; its length never exceeds
//! `max_chars`. When it would, the budget is recovered in this order:
//!
//! 1. the submission self-text is truncated, then cleared,
//! 2. ancestor comments are dropped oldest-first,
//! 3. the triggering comment is truncated (only with a tiny budget),
//! 4. the rendered text is cut from the front as a final guard.

use helperbot_config::TranscriptConfig;
use helperbot_core::error::{ContextError, PlatformError};
use helperbot_core::platform::{Comment, Platform, Submission};
use helperbot_core::text::{TRUNCATION_MARKER, char_len, tail_chars, truncate_with_marker};
use regex_lite::Regex;
use serde::Serialize;
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Quote prefix for comment bodies.
const INDENT: &str = "> ";

/// Shown in place of an empty trigger.
pub const NO_QUESTION: &str = "(no explicit question)";

fn direct_image_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)https?://\S+\.(?:png|jpg|jpeg|gif|webp|bmp)").expect("static regex")
    })
}

fn markdown_image_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)!\[[^\]]*\]\((https?://\S+\.(?:png|jpg|jpeg|gif|webp|bmp))\)").expect("static regex")
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    Submission,
    Comment,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Turn {
    pub role: TurnRole,
    pub author: String,
    pub text: String,
    /// Image URLs found in this turn, in document order
    pub images: Vec<String>,
}

/// An image kept for the model, tagged with the turn it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageRef {
    pub url: String,
    pub turn: usize,
}

/// Thread-level lines rendered above the turns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThreadHeader {
    pub subreddit: String,
    pub submission_url: String,
    pub external_url: Option<String>,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transcript {
    pub header: ThreadHeader,
    /// Submission first, triggering comment last
    pub turns: Vec<Turn>,
    /// Ancestor comments dropped to fit the budget
    pub omitted: usize,
    pub images: Vec<ImageRef>,
    /// The triggering comment with the wake phrase removed
    pub question: String,
    /// Whether anything had to be cut to fit
    pub truncated: bool,
    max_chars: usize,
}

impl Transcript {
    /// The thread as the model sees it. Never longer than `max_chars`.
    pub fn render(&self) -> String {
        let text = self.render_unbounded();
        if char_len(&text) > self.max_chars {
            return tail_chars(&text, self.max_chars);
        }
        text
    }

    fn render_unbounded(&self) -> String {
        let mut parts = vec![
            format!("SUBREDDIT: r/{}", self.header.subreddit),
            format!("SUBMISSION URL: {}", self.header.submission_url),
        ];
        if let Some(url) = &self.header.external_url {
            parts.push(format!("EXTERNAL LINK URL: {url}"));
        }
        parts.push(format!("SUBMISSION TITLE: {}", self.header.title));

        let mut turns = self.turns.iter();
        if let Some(submission) = turns.next()
            && !submission.text.is_empty()
        {
            parts.push(submission.text.clone());
        }
        parts.push("\n---".into());
        if self.omitted > 0 {
            parts.push(format!("[{} earlier comment(s) omitted]\n", self.omitted));
        }
        for turn in turns {
            parts.push(format!("{} wrote:\n{}\n", turn.author, quote(&turn.text)));
        }
        parts.join("\n")
    }

    pub fn image_urls(&self) -> Vec<String> {
        self.images.iter().map(|i| i.url.clone()).collect()
    }

    pub fn rendered_len(&self) -> usize {
        char_len(&self.render_unbounded())
    }
}

fn quote(text: &str) -> String {
    text.lines()
        .map(|line| {
            if line.trim().is_empty() {
                line.to_string()
            } else {
                format!("{INDENT}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Direct image links and Markdown images, first occurrence wins.
pub fn extract_image_urls(text: &str) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    let direct = direct_image_re().find_iter(text).map(|m| m.as_str().to_string());
    let markdown = markdown_image_re()
        .captures_iter(text)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()));
    for url in direct.chain(markdown) {
        if !urls.contains(&url) {
            urls.push(url);
        }
    }
    urls
}

fn is_reddit_media(url: &str) -> bool {
    url.contains("i.redd.it") || url.contains("v.redd.it")
}

fn is_direct_image(url: &str) -> bool {
    direct_image_re()
        .find(url)
        .is_some_and(|m| m.start() == 0 && m.end() == url.len())
}

fn author_name(author: &Option<String>) -> String {
    author.clone().unwrap_or_else(|| "[deleted]".into())
}

fn body_or_empty(body: &str) -> String {
    let body = body.trim();
    if body.is_empty() { "[empty]".into() } else { body.to_string() }
}

pub struct TranscriptBuilder {
    trigger: Regex,
    max_chars: usize,
    max_images: usize,
    max_ancestors: usize,
}

impl TranscriptBuilder {
    pub fn new(trigger: Regex, config: &TranscriptConfig) -> Self {
        Self {
            trigger,
            max_chars: config.max_chars,
            max_images: config.max_images,
            max_ancestors: config.max_ancestors,
        }
    }

    /// Remove the first wake phrase from a comment body.
    pub fn strip_trigger(&self, body: &str) -> String {
        self.trigger.replacen(body, 1, "").trim().to_string()
    }

    /// Resolve the submission and ancestor chain of `trigger` and assemble
    /// the transcript.
    pub async fn build(&self, platform: &dyn Platform, trigger: &Comment) -> Result<Transcript, ContextError> {
        let unavailable = |e: PlatformError| ContextError::ContextUnavailable {
            comment_id: trigger.id.clone(),
            reason: e.to_string(),
        };

        let submission = platform.submission(&trigger.submission_id).await.map_err(unavailable)?;

        let mut chain = Vec::new();
        let mut next = trigger.parent_comment_id().map(str::to_string);
        while let Some(id) = next {
            if chain.len() >= self.max_ancestors {
                warn!(comment_id = %trigger.id, limit = self.max_ancestors, "Ancestor chain cut at limit");
                break;
            }
            let parent = platform.comment(&id).await.map_err(unavailable)?;
            next = parent.parent_comment_id().map(str::to_string);
            chain.push(parent);
        }
        chain.reverse();

        Ok(self.assemble(&submission, &chain, trigger))
    }

    /// Assemble a transcript from already-resolved parts. `ancestors` are
    /// oldest-first and exclude `trigger`.
    pub fn assemble(&self, submission: &Submission, ancestors: &[Comment], trigger: &Comment) -> Transcript {
        let question = self.strip_trigger(&trigger.body);

        let mut turns = Vec::with_capacity(ancestors.len() + 2);
        turns.push(submission_turn(submission));
        for comment in ancestors {
            let text = body_or_empty(&comment.body);
            turns.push(Turn {
                role: TurnRole::Comment,
                author: author_name(&comment.author),
                images: extract_image_urls(&text),
                text,
            });
        }
        turns.push(Turn {
            role: TurnRole::Comment,
            author: author_name(&trigger.author),
            images: extract_image_urls(&trigger.body),
            text: body_or_empty(&question),
        });

        let mut transcript = Transcript {
            header: ThreadHeader {
                subreddit: submission.subreddit.clone(),
                submission_url: format!("https://www.reddit.com{}", submission.permalink),
                external_url: external_link(submission),
                title: submission.title.trim().to_string(),
            },
            turns,
            omitted: 0,
            images: Vec::new(),
            question: if question.is_empty() { NO_QUESTION.into() } else { question },
            truncated: false,
            max_chars: self.max_chars,
        };

        self.fit(&mut transcript);
        transcript.images = self.select_images(&transcript.turns);

        debug!(
            turns = transcript.turns.len(),
            omitted = transcript.omitted,
            chars = transcript.rendered_len(),
            images = transcript.images.len(),
            "Transcript assembled"
        );
        transcript
    }

    fn fit(&self, t: &mut Transcript) {
        let over = |t: &Transcript| t.rendered_len().saturating_sub(self.max_chars);

        let excess = over(t);
        if excess == 0 {
            return;
        }
        t.truncated = true;

        // Submission text: shorten, then clear.
        let selftext_len = char_len(&t.turns[0].text);
        if selftext_len > 0 {
            let keep = selftext_len.saturating_sub(excess);
            if keep > char_len(TRUNCATION_MARKER) {
                t.turns[0].text = truncate_with_marker(&t.turns[0].text, keep);
            } else {
                t.turns[0].text.clear();
            }
        }

        // Ancestors, oldest first. The trigger is always the last turn.
        while over(t) > 0 && t.turns.len() > 2 {
            t.turns.remove(1);
            t.omitted += 1;
        }

        let excess = over(t);
        if excess > 0 {
            let last = t.turns.len() - 1;
            let keep = char_len(&t.turns[last].text).saturating_sub(excess).max(1);
            warn!(chars = keep, "Trigger comment truncated to fit transcript budget");
            t.turns[last].text = truncate_with_marker(&t.turns[last].text, keep);
        }
    }

    /// Images in chronological order, deduplicated, keeping the most recent.
    fn select_images(&self, turns: &[Turn]) -> Vec<ImageRef> {
        let mut all: Vec<ImageRef> = Vec::new();
        for (idx, turn) in turns.iter().enumerate() {
            for url in &turn.images {
                if !all.iter().any(|i| &i.url == url) {
                    all.push(ImageRef { url: url.clone(), turn: idx });
                }
            }
        }
        let skip = all.len().saturating_sub(self.max_images);
        all.split_off(skip)
    }
}

fn external_link(submission: &Submission) -> Option<String> {
    let url = submission.url.as_deref()?.trim();
    (!submission.is_self && !url.is_empty() && !is_direct_image(url) && !is_reddit_media(url))
        .then(|| url.to_string())
}

fn submission_turn(submission: &Submission) -> Turn {
    let mut images = Vec::new();
    if let Some(url) = submission.url.as_deref().map(str::trim).filter(|u| !u.is_empty())
        && (is_direct_image(url) || submission.post_hint.as_deref() == Some("image"))
    {
        images.push(url.to_string());
    }

    let text = if submission.is_self { submission.selftext.trim().to_string() } else { String::new() };
    images.extend(extract_image_urls(&text));
    images.extend(submission.gallery_images.iter().map(|u| u.replace("&amp;", "&")));
    images.dedup();

    Turn {
        role: TurnRole::Submission,
        author: author_name(&submission.author),
        text,
        images,
    }
}
