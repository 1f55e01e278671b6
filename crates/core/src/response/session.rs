//! Session-loss phrase matching
//!
//! The WebAPI has no status code for an expired session; the only signal is
//! the wording of the error message, in Chinese or English.

/// Phrases recognised out of the box.
pub const DEFAULT_SESSION_LOST_PHRASES: &[&str] = &[
    "会话信息已丢失",
    "会话已过期",
    "会话失效",
    "登录已过期",
    "登录已失效",
    "请重新登录",
    "session lost",
    "session expired",
    "session invalid",
];

/// Case-insensitive substring matcher over a set of session-loss phrases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLossMatcher {
    phrases: Vec<String>,
}

impl SessionLossMatcher {
    /// Matcher with no phrases; never matches.
    pub fn empty() -> Self {
        Self { phrases: Vec::new() }
    }

    /// Add a phrase. Blank phrases are ignored since they would match every
    /// message.
    pub fn with_phrase(mut self, phrase: impl AsRef<str>) -> Self {
        self.add(phrase);
        self
    }

    /// In-place form of [`Self::with_phrase`]. Phrases are stored lowercased.
    pub fn add(&mut self, phrase: impl AsRef<str>) {
        let phrase = phrase.as_ref().trim().to_lowercase();
        if !phrase.is_empty() && !self.phrases.contains(&phrase) {
            self.phrases.push(phrase);
        }
    }

    /// Normalized phrases, in insertion order.
    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    /// True when `message` contains any phrase, ignoring case.
    pub fn matches(&self, message: &str) -> bool {
        let lower = message.to_lowercase();
        self.phrases.iter().any(|phrase| lower.contains(phrase.as_str()))
    }
}

impl Default for SessionLossMatcher {
    fn default() -> Self {
        DEFAULT_SESSION_LOST_PHRASES.iter().fold(Self::empty(), |m, p| m.with_phrase(p))
    }
}

impl<S: AsRef<str>> Extend<S> for SessionLossMatcher {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for phrase in iter {
            self.add(phrase);
        }
    }
}
