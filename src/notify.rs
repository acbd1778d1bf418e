//! User-visible notices.
//!
//! The quoting and posting pipelines never print anything themselves; they
//! hand every warning or result to a [`Notifier`] and move on.

use crate::locale::{Locale, Message};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Localizes [`Message`]s before handing them to a [`Notifier`].
pub struct Notices<'a, N: ?Sized> {
    pub locale: Locale,
    pub sink: &'a N,
}

impl<'a, N: Notifier + ?Sized> Notices<'a, N> {
    pub fn new(locale: Locale, sink: &'a N) -> Self {
        Self { locale, sink }
    }

    pub fn send(&self, level: NoticeLevel, msg: Message<'_>) {
        self.sink.notify(Notice {
            level,
            message: self.locale.message(msg),
        });
    }

    pub fn info(&self, msg: Message<'_>) {
        self.send(NoticeLevel::Info, msg)
    }

    pub fn success(&self, msg: Message<'_>) {
        self.send(NoticeLevel::Success, msg)
    }

    pub fn warn(&self, msg: Message<'_>) {
        self.send(NoticeLevel::Warning, msg)
    }

    pub fn error(&self, msg: Message<'_>) {
        self.send(NoticeLevel::Error, msg)
    }
}

/// Forwards notices to the `tracing` subscriber.
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, Notice { level, message }: Notice) {
        match level {
            NoticeLevel::Info => tracing::info!("{message}"),
            NoticeLevel::Success => tracing::info!(success = true, "{message}"),
            NoticeLevel::Warning => tracing::warn!("{message}"),
            NoticeLevel::Error => tracing::error!("{message}"),
        }
    }
}

#[cfg(test)]
pub mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Keeps every notice for later assertions.
    #[derive(Default)]
    pub struct RecordingNotifier {
        notices: Mutex<Vec<Notice>>,
    }

    impl RecordingNotifier {
        pub fn notices(&self) -> Vec<Notice> {
            self.notices.lock().unwrap().clone()
        }

        pub fn warnings(&self) -> Vec<String> {
            self.notices()
                .into_iter()
                .filter(|n| matches!(n.level, NoticeLevel::Warning | NoticeLevel::Error))
                .map(|n| n.message)
                .collect()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, notice: Notice) {
            self.notices.lock().unwrap().push(notice);
        }
    }
}
