//! Custom emoji shortcodes (`:name:`).
//!
//! Shortcodes are collected with their byte spans first and substituted in
//! a single pass afterwards, so lookups never run against a half-rewritten
//! string.

use std::{collections::HashMap, ops::Range, sync::LazyLock};

use regex::Regex;

use crate::{
    locale::Message,
    misskey::MisskeyApi,
    notify::{Notices, Notifier},
    quote::QuoteError,
    render::Style,
};

static SHORTCODE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":([A-Za-z0-9_]+):").expect("shortcode pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortcode<'a> {
    pub name: &'a str,
    /// Span of the whole token, colons included.
    pub span: Range<usize>,
}

/// Finds every shortcode in `text`, left to right. Neighbours may share a
/// colon, as in `:a:b:`, so each search resumes on the closing colon of the
/// previous match.
pub fn scan(text: &str) -> Vec<Shortcode<'_>> {
    let mut found = Vec::new();
    let mut at = 0;

    while let Some(caps) = SHORTCODE_PATTERN.captures_at(text, at) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        found.push(Shortcode {
            name: name.as_str(),
            span: whole.range(),
        });
        at = whole.end() - 1;
    }

    found
}

/// Replaces every scanned shortcode that has an entry in `images`. A
/// shortcode whose opening colon was already consumed by a replaced
/// neighbour stays as written.
pub fn substitute(text: &str, found: &[Shortcode<'_>], images: &HashMap<&str, String>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for code in found {
        if code.span.start < last {
            continue;
        }
        let Some(image) = images.get(code.name) else {
            continue;
        };
        out.push_str(&text[last..code.span.start]);
        out.push_str(image);
        last = code.span.end;
    }
    out.push_str(&text[last..]);

    out
}

/// Looks up every distinct shortcode in `text` on `domain` and inlines the
/// ones that resolve. Unresolved shortcodes stay as written.
pub async fn resolve_emojis<A, N>(
    api: &A,
    domain: &str,
    text: &str,
    style: Style,
    notices: &Notices<'_, N>,
) -> String
where
    A: MisskeyApi + ?Sized,
    N: Notifier + ?Sized,
{
    let found = scan(text);
    let mut images: HashMap<&str, String> = HashMap::new();
    let mut failed: Vec<&str> = Vec::new();

    for code in &found {
        if images.contains_key(code.name) || failed.contains(&code.name) {
            continue;
        }

        match api.emoji_url(domain, code.name).await {
            Ok(url) => {
                images.insert(code.name, style.icon(code.name, &url));
            }
            Err(e) => {
                let err = QuoteError::EmojiNotFound(code.name.to_owned());
                tracing::warn!(domain, error = %err, cause = %e, "emoji lookup failed");
                notices.warn(Message::EmojiCannotBeFetched(code.name));
                failed.push(code.name);
            }
        }
    }

    substitute(text, &found, &images)
}
