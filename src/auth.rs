//! MiAuth: the browser-approval flow that hands out access tokens.

use std::time::Duration;

use thiserror::Error;
use tokio::time;

use crate::misskey::{MisskeyClient, MisskeyError};

pub const APP_NAME: &str = "misskeyfop";
pub const PERMISSIONS: &str = "write:notes,write:drive";
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);
/// Two minutes at the default interval.
pub const MAX_POLLS: u32 = 24;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authorization was not approved in time")]
    TimedOut,
}

pub struct MiAuth<'a> {
    client: &'a MisskeyClient,
    domain: &'a str,
    session: String,
    interval: Duration,
    max_polls: u32,
}

impl<'a> MiAuth<'a> {
    pub fn new(client: &'a MisskeyClient, domain: &'a str) -> Self {
        Self {
            client,
            domain,
            session: uuid::Uuid::new_v4().simple().to_string(),
            interval: POLL_INTERVAL,
            max_polls: MAX_POLLS,
        }
    }

    pub fn session(&self) -> &str {
        &self.session
    }

    /// Page the user opens to approve the session.
    pub fn url(&self) -> String {
        format!(
            "{}/miauth/{}?name={APP_NAME}&permission={PERMISSIONS}",
            self.client.base_url(self.domain),
            self.session
        )
    }

    #[cfg(test)]
    pub fn polling(mut self, interval: Duration, max_polls: u32) -> Self {
        self.interval = interval;
        self.max_polls = max_polls;
        self
    }

    /// Polls until the session is approved. Failed checks are retried.
    pub async fn wait_for_token(&self) -> Result<String, AuthError> {
        for attempt in 1..=self.max_polls {
            time::sleep(self.interval).await;

            match self.check().await {
                Ok(Some(token)) => return Ok(token),
                Ok(None) => tracing::debug!(attempt, "session not approved yet"),
                Err(e) => tracing::warn!(attempt, error = %e, "miauth check failed"),
            }
        }

        Err(AuthError::TimedOut)
    }

    async fn check(&self) -> Result<Option<String>, MisskeyError> {
        self.client
            .check_miauth(self.domain, &self.session)
            .send()
            .await
    }
}
