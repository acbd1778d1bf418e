use std::{
    fs::{self, File},
    io::BufReader,
    path::Path,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::locale::Locale;

#[derive(Serialize, Deserialize, Default, Debug, Clone)]
pub struct Config {
    #[serde(default)]
    pub locale: Locale,
    #[serde(default)]
    pub accounts: Vec<Account>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Account {
    pub selected: bool,
    pub memo: String,
    /// Host of the account's instance, e.g. `misskey.io`.
    pub domain: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub visibility: Visibility,
    pub embed_format: EmbedDialect,
    /// Extensions (without dot) that may be uploaded to the drive.
    pub upload_allowed: Vec<String>,
    /// Prepended to every posted note. A literal `\n` is a newline.
    pub prev_text: String,
    /// Appended to every posted note. A literal `\n` is a newline.
    pub post_text: String,
    pub hide_file_names: bool,
}

/// Note visibility. `specified` is not supported.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Home,
    Followers,
}

/// Markup family used when quoting notes.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbedDialect {
    Markdown,
    #[default]
    Html,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to open config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Scheme(#[from] serde_yaml::Error),
    #[error("no account is configured")]
    NoAccount,
    #[error("domain is not set")]
    MissingDomain,
    #[error("access token is not set")]
    MissingToken,
}

const DEFAULT_UPLOAD_ALLOWED: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "svg", "mp3", "webm", "wav", "m4a", "ogg", "3gp", "flac",
    "mp4", "ogv",
];

impl Default for Account {
    fn default() -> Self {
        Self {
            selected: false,
            memo: String::new(),
            domain: String::new(),
            token: None,
            visibility: Visibility::default(),
            embed_format: EmbedDialect::default(),
            upload_allowed: DEFAULT_UPLOAD_ALLOWED
                .iter()
                .map(|s| s.to_string())
                .collect(),
            prev_text: String::new(),
            post_text: String::new(),
            hide_file_names: false,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let file = BufReader::new(File::open(path)?);
        let cfg: Config = serde_yaml::from_reader(file)?;

        tracing::debug!(
            path = %path.display(),
            accounts = cfg.accounts.len(),
            "configuration loaded"
        );

        Ok(cfg)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let data = serde_yaml::to_string(self)?;
        fs::write(path, data)?;

        Ok(())
    }

    /// The selected account, or the first one when none is marked.
    pub fn selected_account(&self) -> Option<&Account> {
        self.accounts
            .iter()
            .find(|a| a.selected)
            .or_else(|| self.accounts.first())
    }

    pub fn selected_account_mut(&mut self) -> Option<&mut Account> {
        let idx = self.accounts.iter().position(|a| a.selected).unwrap_or(0);
        self.accounts.get_mut(idx)
    }
}

impl Account {
    /// Checks the one precondition every remote command shares.
    pub fn ensure_usable(&self) -> Result<&str, ConfigError> {
        if self.domain.is_empty() {
            return Err(ConfigError::MissingDomain);
        }
        match self.token.as_deref() {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(ConfigError::MissingToken),
        }
    }

    pub fn allows_upload(&self, extension: &str) -> bool {
        self.upload_allowed
            .iter()
            .any(|e| e.eq_ignore_ascii_case(extension))
    }

    /// Wraps `text` with the configured prefix and suffix.
    pub fn wrap_text(&self, text: &str) -> String {
        format!(
            "{}{}{}",
            self.prev_text.replace("\\n", "\n"),
            text,
            self.post_text.replace("\\n", "\n")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
locale: ja
accounts:
  - domain: misskey.io
    token: abc
  - domain: example.social
    token: def
    selected: true
    embed_format: markdown
    visibility: home
    prev_text: "from cli\\n"
"#;

    #[test]
    fn parses_accounts_with_defaults() {
        let cfg: Config = serde_yaml::from_str(SAMPLE).unwrap();
        assert_eq!(cfg.locale, Locale::Ja);
        assert_eq!(cfg.accounts.len(), 2);

        let first = &cfg.accounts[0];
        assert_eq!(first.visibility, Visibility::Public);
        assert_eq!(first.embed_format, EmbedDialect::Html);
        assert!(first.allows_upload("PNG"));
        assert!(!first.allows_upload("exe"));
    }

    #[test]
    fn selected_account_prefers_flag() {
        let cfg: Config = serde_yaml::from_str(SAMPLE).unwrap();
        let account = cfg.selected_account().unwrap();
        assert_eq!(account.domain, "example.social");
        assert_eq!(account.embed_format, EmbedDialect::Markdown);
        assert_eq!(account.visibility, Visibility::Home);
    }

    #[test]
    fn selected_account_falls_back_to_first() {
        let cfg = Config {
            locale: Locale::En,
            accounts: vec![
                Account {
                    domain: "a.example".into(),
                    ..Default::default()
                },
                Account {
                    domain: "b.example".into(),
                    ..Default::default()
                },
            ],
        };
        assert_eq!(cfg.selected_account().unwrap().domain, "a.example");
        assert!(Config::default().selected_account().is_none());
    }

    #[test]
    fn rejects_unknown_embed_format() {
        let res: Result<Config, _> =
            serde_yaml::from_str("accounts:\n  - domain: x\n    embed_format: bbcode\n");
        assert!(res.is_err());
    }

    #[test]
    fn ensure_usable_requires_domain_and_token() {
        let mut account = Account::default();
        assert!(matches!(
            account.ensure_usable(),
            Err(ConfigError::MissingDomain)
        ));

        account.domain = "misskey.io".into();
        assert!(matches!(
            account.ensure_usable(),
            Err(ConfigError::MissingToken)
        ));

        account.token = Some(String::new());
        assert!(matches!(
            account.ensure_usable(),
            Err(ConfigError::MissingToken)
        ));

        account.token = Some("tok".into());
        assert_eq!(account.ensure_usable().unwrap(), "tok");
    }

    #[test]
    fn wrap_text_expands_escaped_newlines() {
        let cfg: Config = serde_yaml::from_str(SAMPLE).unwrap();
        let account = cfg.selected_account().unwrap();
        assert_eq!(account.wrap_text("hello"), "from cli\nhello");
    }

    #[test]
    fn save_round_trips_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.yml");

        let mut cfg: Config = serde_yaml::from_str(SAMPLE).unwrap();
        cfg.selected_account_mut().unwrap().token = Some("fresh".into());
        cfg.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(
            loaded.selected_account().unwrap().token.as_deref(),
            Some("fresh")
        );
    }
}
