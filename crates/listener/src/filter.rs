//! Which stream items deserve a reply.

use helperbot_config::{BotConfig, ConfigError};
use helperbot_core::platform::Comment;
use regex_lite::Regex;
use std::collections::HashSet;

/// Why a comment was or was not selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Matched,
    OtherSubreddit,
    NoTrigger,
    OwnComment,
}

#[derive(Debug, Clone)]
pub struct TriggerFilter {
    trigger: Regex,
    /// Lowercased names; `None` watches everything
    subreddits: Option<HashSet<String>>,
    bot_username: String,
}

impl TriggerFilter {
    pub fn new(trigger: Regex, subreddits: &[String], bot_username: impl Into<String>) -> Self {
        let names: HashSet<String> = subreddits
            .iter()
            .map(|s| s.trim().trim_start_matches("r/").to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();
        let subreddits = (!names.is_empty() && !names.contains("all")).then_some(names);
        Self {
            trigger,
            subreddits,
            bot_username: bot_username.into(),
        }
    }

    pub fn from_config(config: &BotConfig, bot_username: impl Into<String>) -> Result<Self, ConfigError> {
        Ok(Self::new(config.trigger_regex()?, &config.subreddits, bot_username))
    }

    pub fn trigger(&self) -> &Regex {
        &self.trigger
    }

    pub fn check(&self, comment: &Comment) -> Verdict {
        if comment
            .author
            .as_deref()
            .is_some_and(|a| a.eq_ignore_ascii_case(&self.bot_username))
        {
            return Verdict::OwnComment;
        }
        if let Some(allowed) = &self.subreddits
            && !allowed.contains(&comment.subreddit.to_lowercase())
        {
            return Verdict::OtherSubreddit;
        }
        if !self.trigger.is_match(&comment.body) {
            return Verdict::NoTrigger;
        }
        Verdict::Matched
    }

    pub fn matches(&self, comment: &Comment) -> bool {
        self.check(comment) == Verdict::Matched
    }
}
