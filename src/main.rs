use std::{
    io,
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::{Parser, Subcommand};
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{
    auth::{AuthError, MiAuth},
    config::{Config, ConfigError},
    editor::{FileLine, LineSource, StdioLine},
    locale::Message,
    matcher::extract_urls,
    misskey::{MisskeyClient, MisskeyError},
    notify::{Notices, TracingNotifier},
    post::{PostError, Poster},
    quote::{substitute_quotes, QuoteComposer},
    vault::Vault,
};

mod auth;
mod config;
mod editor;
mod emoji;
mod locale;
mod matcher;
mod misskey;
mod note;
mod notify;
mod post;
mod quote;
mod render;
mod vault;

#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Path to configuration file.
    #[arg(long, default_value = ".misskeyfop.yml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replace note URLs in a line with quotes of those notes.
    Quote(LineArgs),
    /// Post a line as a new note, uploading embedded files.
    Post {
        #[command(flatten)]
        line: LineArgs,

        /// Directory that `![[file]]` embeds are resolved against.
        #[arg(long, default_value = ".")]
        vault: PathBuf,
    },
    /// Obtain an access token for the selected account.
    Auth,
}

#[derive(clap::Args)]
struct LineArgs {
    /// File to edit in place. Uses stdin and stdout when omitted.
    #[arg(long, requires = "line")]
    file: Option<PathBuf>,

    /// Line of `--file` to work on, counted from 1.
    #[arg(long, requires = "file")]
    line: Option<usize>,
}

#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Misskey(#[from] MisskeyError),
    #[error(transparent)]
    Post(#[from] PostError),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl LineArgs {
    fn source(self) -> Box<dyn LineSource> {
        match (self.file, self.line) {
            (Some(path), Some(line)) => Box::new(FileLine { path, line }),
            _ => Box::new(StdioLine),
        }
    }
}

// Lookups for one line run as cooperative tasks on a single thread.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let Args { config, command } = Args::parse();

    let cfg = match Config::load(&config) {
        Ok(v) => v,
        Err(e) => {
            tracing::error!(path = %config.display(), error = %e, "failed to load config");
            return ExitCode::FAILURE;
        }
    };

    let res = match command {
        Command::Quote(line) => quote(&cfg, line).await,
        Command::Post { line, vault } => post(&cfg, line, vault).await,
        Command::Auth => auth(cfg, &config).await,
    };

    match res {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            ExitCode::FAILURE
        }
    }
}

async fn quote(cfg: &Config, line: LineArgs) -> Result<(), AppError> {
    let account = cfg.selected_account().ok_or(ConfigError::NoAccount)?;
    let client = MisskeyClient::new()?;
    let notifier = TracingNotifier;
    let notices = Notices::new(cfg.locale, &notifier);
    let composer = QuoteComposer::new(&client, account, cfg.locale, &notifier)?;

    let mut source = line.source();
    let text = source.get_line()?;
    let urls = extract_urls(&text);

    notices.info(Message::CollectingNotes);
    let quotes = composer.quote_urls(&urls).await;

    source.set_line(&substitute_quotes(&text, &quotes))?;
    if !quotes.is_empty() {
        notices.success(Message::NoteQuoted);
    }

    Ok(())
}

async fn post(cfg: &Config, line: LineArgs, vault: PathBuf) -> Result<(), AppError> {
    let account = cfg.selected_account().ok_or(ConfigError::NoAccount)?;
    let client = MisskeyClient::new()?;
    let vault = Vault::new(vault);
    let notifier = TracingNotifier;
    let poster = Poster::new(&client, account, &vault, cfg.locale, &notifier)?;

    let text = line.source().get_line()?;
    poster.post_line(&text).await?;

    Ok(())
}

async fn auth(mut cfg: Config, path: &Path) -> Result<(), AppError> {
    let domain = cfg
        .selected_account()
        .ok_or(ConfigError::NoAccount)?
        .domain
        .clone();
    if domain.is_empty() {
        return Err(ConfigError::MissingDomain.into());
    }

    let client = MisskeyClient::new()?;
    let notifier = TracingNotifier;
    let notices = Notices::new(cfg.locale, &notifier);

    let miauth = MiAuth::new(&client, &domain);
    tracing::debug!(domain = %domain, session = miauth.session(), "miauth session started");
    notices.info(Message::OpenAuthUrl(&miauth.url()));

    let token = match miauth.wait_for_token().await {
        Ok(t) => t,
        Err(e) => {
            notices.error(Message::AuthTimedOut);
            return Err(e.into());
        }
    };

    if let Some(account) = cfg.selected_account_mut() {
        account.token = Some(token);
    }
    cfg.save(path)?;
    notices.success(Message::TokenSaved);

    Ok(())
}
