//! Posting a line of text as a new note.

use std::sync::LazyLock;

use futures::future::join_all;
use regex::Regex;
use thiserror::Error;

use crate::{
    config::{Account, ConfigError},
    locale::{Locale, Message},
    misskey::{MisskeyClient, MisskeyError},
    notify::{Notices, Notifier},
    vault::Vault,
};

/// Wiki-style embeds: `![[file.png]]`.
static EMBED_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[\[(.*?)]]").expect("embed pattern is valid"));

static REMOTE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(data:|https?://)").expect("remote pattern is valid"));

#[derive(Debug, Error)]
pub enum PostError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Misskey(#[from] MisskeyError),
}

pub struct Poster<'a, N: ?Sized> {
    client: &'a MisskeyClient,
    account: &'a Account,
    token: &'a str,
    vault: &'a Vault,
    notices: Notices<'a, N>,
}

/// Local files embedded in `line`. Remote and inline-data targets are left
/// alone.
pub fn embedded_files(line: &str) -> Vec<&str> {
    EMBED_PATTERN
        .captures_iter(line)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|name| !REMOTE_PATTERN.is_match(name))
        .collect()
}

/// Removes every embed, uploaded or not.
pub fn strip_embeds(line: &str) -> String {
    EMBED_PATTERN.replace_all(line, "").into_owned()
}

impl<'a, N: Notifier + ?Sized> Poster<'a, N> {
    pub fn new(
        client: &'a MisskeyClient,
        account: &'a Account,
        vault: &'a Vault,
        locale: Locale,
        notifier: &'a N,
    ) -> Result<Self, ConfigError> {
        let token = account.ensure_usable()?;

        Ok(Self {
            client,
            account,
            token,
            vault,
            notices: Notices::new(locale, notifier),
        })
    }

    async fn upload_one(&self, name: &str) -> Option<String> {
        let file = match self.vault.read(name) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(name, error = %e, "embedded file cannot be read");
                self.notices.warn(Message::FileNotFound(name));
                return None;
            }
        };

        if !self.account.allows_upload(&file.extension) {
            self.notices.warn(Message::FileTypeNotAllowed(name));
            return None;
        }

        let upload_name = if self.account.hide_file_names {
            let stamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
            match file.extension.as_str() {
                "" => stamp,
                ext => format!("{stamp}.{ext}"),
            }
        } else {
            file.name
        };

        self.notices.info(Message::UploadingFile(name));
        match self
            .client
            .upload_file(&self.account.domain, self.token, upload_name, file.content)
            .send()
            .await
        {
            Ok(id) => {
                self.notices.success(Message::FileUploaded(name));
                Some(id)
            }
            Err(e) => {
                tracing::warn!(name, error = %e, "upload failed");
                self.notices
                    .error(Message::FileCannotBeUploaded(&e.to_string()));
                None
            }
        }
    }

    /// Uploads every local embed in `line` concurrently and returns the
    /// drive ids of the ones that made it, in embed order.
    pub async fn upload_files(&self, line: &str) -> Vec<String> {
        let jobs = embedded_files(line)
            .into_iter()
            .map(|name| self.upload_one(name));

        join_all(jobs).await.into_iter().flatten().collect()
    }

    /// Posts `line` with its attachments. Returns the new note's id.
    pub async fn post_line(&self, line: &str) -> Result<String, PostError> {
        self.notices.info(Message::PostingNote);

        let file_ids = self.upload_files(line).await;
        let text = self.account.wrap_text(&strip_embeds(line));

        let res = self
            .client
            .create_note(&self.account.domain, self.token)
            .text(text)
            .visibility(self.account.visibility)
            .file_ids(file_ids)
            .send()
            .await;

        match res {
            Ok(id) => {
                tracing::info!(id = %id, "note created");
                self.notices.success(Message::NoteSent);
                Ok(id)
            }
            Err(e) => {
                self.notices.error(Message::NoteCannotBeSent(&e.to_string()));
                Err(e.into())
            }
        }
    }
}
