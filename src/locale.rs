//! User-visible strings.

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Ja,
}

/// Every message the tool shows to the user.
#[derive(Debug, Clone, Copy)]
pub enum Message<'a> {
    CollectingNotes,
    NoteQuoted,
    UrlIsNotCorrect(&'a str),
    NoteCannotBeQuoted(&'a str),
    RenoteCannotBeQuoted(&'a str),
    EmojiCannotBeFetched(&'a str),
    PostingNote,
    NoteSent,
    NoteCannotBeSent(&'a str),
    UploadingFile(&'a str),
    FileUploaded(&'a str),
    FileCannotBeUploaded(&'a str),
    FileNotFound(&'a str),
    FileTypeNotAllowed(&'a str),
    OpenAuthUrl(&'a str),
    TokenSaved,
    AuthTimedOut,
}

impl Locale {
    pub fn message(self, msg: Message<'_>) -> String {
        use Message::*;

        match self {
            Self::En => match msg {
                CollectingNotes => "Collecting notes...".into(),
                NoteQuoted => "Notes quoted.".into(),
                UrlIsNotCorrect(url) => format!("Not a note URL: {url}"),
                NoteCannotBeQuoted(url) => format!("Note could not be quoted: {url}"),
                RenoteCannotBeQuoted(id) => format!("Renote could not be quoted: {id}"),
                EmojiCannotBeFetched(name) => format!("Emoji could not be fetched: {name}"),
                PostingNote => "Posting to Misskey...".into(),
                NoteSent => "Note sent.".into(),
                NoteCannotBeSent(e) => format!("Note could not be sent: {e}"),
                UploadingFile(name) => format!("Uploading {name}..."),
                FileUploaded(name) => format!("Uploaded {name}."),
                FileCannotBeUploaded(e) => format!("File could not be uploaded: {e}"),
                FileNotFound(name) => format!("File not found: {name}"),
                FileTypeNotAllowed(name) => format!("This file type is not allowed: {name}"),
                OpenAuthUrl(url) => format!("Open this URL to authorize: {url}"),
                TokenSaved => "Access token saved.".into(),
                AuthTimedOut => "Authorization timed out.".into(),
            },
            Self::Ja => match msg {
                CollectingNotes => "ノートを取得しています...".into(),
                NoteQuoted => "ノートを引用しました。".into(),
                UrlIsNotCorrect(url) => format!("ノートのURLではありません: {url}"),
                NoteCannotBeQuoted(url) => format!("ノートを引用できませんでした: {url}"),
                RenoteCannotBeQuoted(id) => format!("リノートを引用できませんでした: {id}"),
                EmojiCannotBeFetched(name) => format!("絵文字を取得できませんでした: {name}"),
                PostingNote => "Misskeyへ投稿しています...".into(),
                NoteSent => "ノートを送信しました。".into(),
                NoteCannotBeSent(e) => format!("ノートを送信できませんでした: {e}"),
                UploadingFile(name) => format!("{name} をアップロードしています..."),
                FileUploaded(name) => format!("{name} をアップロードしました。"),
                FileCannotBeUploaded(e) => format!("ファイルをアップロードできませんでした: {e}"),
                FileNotFound(name) => format!("ファイルが見つかりません: {name}"),
                FileTypeNotAllowed(name) => {
                    format!("このファイル形式はアップロードできません: {name}")
                }
                OpenAuthUrl(url) => format!("このURLを開いて認証してください: {url}"),
                TokenSaved => "アクセストークンを保存しました。".into(),
                AuthTimedOut => "認証がタイムアウトしました。".into(),
            },
        }
    }

    /// Label of the link back to a quoted note.
    pub fn open_original(self, username: &str) -> String {
        match self {
            Self::En => format!("Open @{username}'s note"),
            Self::Ja => format!("@{username} のノートを開く"),
        }
    }
}
