//! Turns note URLs into quoted blocks.
//!
//! Each URL goes through lookup, rendering and emoji resolution on its own;
//! a failure drops that one URL and the rest of the batch carries on.

use futures::future::{join_all, BoxFuture, FutureExt};
use thiserror::Error;

use crate::{
    config::{Account, ConfigError},
    emoji::resolve_emojis,
    locale::{Locale, Message},
    matcher::match_note_url,
    misskey::{MisskeyApi, MisskeyError},
    note::PostReference,
    notify::{Notices, Notifier},
    render::{render, Style},
};

/// How many renotes deep a quote may nest.
pub const MAX_RENOTE_DEPTH: usize = 4;

#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("not a note URL: {0}")]
    MalformedUrl(String),
    #[error("could not reach {url}: {source}")]
    NetworkFailure {
        url: String,
        #[source]
        source: MisskeyError,
    },
    #[error("{url} was rejected: {source}")]
    RemoteRejected {
        url: String,
        #[source]
        source: MisskeyError,
    },
    #[error("emoji :{0}: could not be resolved")]
    EmojiNotFound(String),
    #[error("renote {id} was not followed: {reason}")]
    RecursionFailure { id: String, reason: Recursion },
}

/// Why a renote chain was cut short.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Recursion {
    #[error("it is already part of this quote")]
    Cycle,
    #[error("it is nested more than {} renotes deep", MAX_RENOTE_DEPTH)]
    TooDeep,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedQuote {
    pub source_url: String,
    pub markup: String,
}

pub struct QuoteComposer<'a, A: ?Sized, N: ?Sized> {
    api: &'a A,
    account: &'a Account,
    style: Style,
    notices: Notices<'a, N>,
}

impl QuoteError {
    fn from_fetch(url: &str, source: MisskeyError) -> Self {
        let url = url.to_owned();
        match source {
            MisskeyError::Http(_) => Self::NetworkFailure { url, source },
            _ => Self::RemoteRejected { url, source },
        }
    }
}

impl<'a, A, N> QuoteComposer<'a, A, N>
where
    A: MisskeyApi + ?Sized,
    N: Notifier + ?Sized,
{
    /// Fails when `account` cannot be used, before anything is fetched.
    pub fn new(
        api: &'a A,
        account: &'a Account,
        locale: Locale,
        notifier: &'a N,
    ) -> Result<Self, ConfigError> {
        account.ensure_usable()?;

        Ok(Self {
            api,
            account,
            style: Style {
                dialect: account.embed_format,
                locale,
            },
            notices: Notices::new(locale, notifier),
        })
    }

    /// Quotes every note URL in `urls`. Unrecognized or unreachable URLs are
    /// reported and left out; the rest keep their input order.
    pub async fn quote_urls(&self, urls: &[&str]) -> Vec<RenderedQuote> {
        let references: Vec<PostReference> = urls
            .iter()
            .filter_map(|url| {
                match match_note_url(url).ok_or_else(|| QuoteError::MalformedUrl(url.to_string())) {
                    Ok(reference) => Some(reference),
                    Err(e) => {
                        tracing::warn!(error = %e, "skipping url");
                        self.notices.warn(Message::UrlIsNotCorrect(url));
                        None
                    }
                }
            })
            .collect();

        let jobs = references.iter().map(|r| self.quote_one(r));
        let mut quotes: Vec<RenderedQuote> = join_all(jobs).await.into_iter().flatten().collect();

        // Keep neighbouring quotes apart.
        if let Some((_, rest)) = quotes.split_last_mut() {
            for quote in rest {
                quote.markup.push('\n');
            }
        }

        quotes
    }

    async fn quote_one(&self, reference: &PostReference) -> Option<RenderedQuote> {
        match self.quote(reference).await {
            Ok(quote) => Some(quote),
            Err(e) => {
                tracing::warn!(url = %reference.source_url, error = %e, "note cannot be quoted");
                self.notices
                    .warn(Message::NoteCannotBeQuoted(&reference.source_url));
                None
            }
        }
    }

    /// Quotes a single note, renotes and emoji included.
    pub async fn quote(&self, reference: &PostReference) -> Result<RenderedQuote, QuoteError> {
        let body = self.quote_note(reference, Vec::new()).await?;
        let body = resolve_emojis(
            self.api,
            &reference.domain,
            &body,
            self.style,
            &self.notices,
        )
        .await;

        Ok(RenderedQuote {
            source_url: reference.source_url.clone(),
            markup: format!("\n{body}\n"),
        })
    }

    /// `chain` holds the ids of the notes that (transitively) renoted this one.
    fn quote_note<'s>(
        &'s self,
        reference: &'s PostReference,
        chain: Vec<String>,
    ) -> BoxFuture<'s, Result<String, QuoteError>> {
        async move {
            let cut = if chain.contains(&reference.post_id) {
                Some(Recursion::Cycle)
            } else if chain.len() > MAX_RENOTE_DEPTH {
                Some(Recursion::TooDeep)
            } else {
                None
            };
            if let Some(reason) = cut {
                return Err(QuoteError::RecursionFailure {
                    id: reference.post_id.clone(),
                    reason,
                });
            }

            let token = self
                .account
                .token
                .as_deref()
                .filter(|_| reference.domain == self.account.domain);

            let post = self
                .api
                .fetch_note(reference, token)
                .await
                .map_err(|e| QuoteError::from_fetch(&reference.source_url, e))?;

            tracing::debug!(
                url = %reference.source_url,
                id = %post.id,
                attachments = post.attachments.len(),
                renote = post.reshared.is_some(),
                "note fetched"
            );

            let renote = match &post.reshared {
                Some(renoted) => {
                    let mut chain = chain;
                    chain.push(reference.post_id.clone());

                    match self.quote_note(renoted, chain).await {
                        Ok(quoted) => Some(quoted),
                        Err(e) => {
                            tracing::warn!(renote = %renoted.post_id, error = %e, "renote cannot be quoted");
                            self.notices
                                .warn(Message::RenoteCannotBeQuoted(&renoted.post_id));
                            None
                        }
                    }
                }
                None => None,
            };

            Ok(render(
                &post,
                &reference.source_url,
                renote.as_deref(),
                self.style,
            ))
        }
        .boxed()
    }
}

/// Replaces each quoted URL in `line` with its markup, left to right.
pub fn substitute_quotes(line: &str, quotes: &[RenderedQuote]) -> String {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;

    for quote in quotes {
        let Some(at) = rest.find(&quote.source_url) else {
            continue;
        };
        out.push_str(&rest[..at]);
        out.push_str(&quote.markup);
        rest = &rest[at + quote.source_url.len()..];
    }
    out.push_str(rest);

    out
}
