use std::fmt::{Display, Write};

use crate::{
    config::EmbedDialect,
    locale::Locale,
    note::{Attachment, MediaKind, RemotePost},
};

/// Display width of avatars and custom emoji.
pub const ICON_SIZE: u32 = 20;

/// Marks the nested block of a renoted note.
pub const RENOTE_LABEL: &str = "RN:";

/// Escapes text for use inside an HTML attribute.
pub struct ProtectedString<'a>(pub &'a str);

impl<'a> Display for ProtectedString<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for c in self.0.chars() {
            match c {
                '&' => f.write_str("&amp;")?,
                '>' => f.write_str("&gt;")?,
                '<' => f.write_str("&lt;")?,
                '"' => f.write_str("&quot;")?,
                _ => f.write_char(c)?,
            }
        }

        Ok(())
    }
}

/// Settings that shape a rendered quote.
#[derive(Debug, Clone, Copy)]
pub struct Style {
    pub dialect: EmbedDialect,
    pub locale: Locale,
}

impl Style {
    /// Inline image at icon size.
    pub fn icon(&self, alt: &str, url: &str) -> String {
        match self.dialect {
            EmbedDialect::Markdown => format!("![{alt}|{ICON_SIZE}]({url})"),
            EmbedDialect::Html => format!(
                "<img src=\"{url}\" alt=\"{}\" width=\"{ICON_SIZE}\">",
                ProtectedString(alt)
            ),
        }
    }

    // Markdown ignores the media kind on purpose.
    fn attachment(&self, out: &mut String, Attachment { url, name, kind }: &Attachment) {
        let _ = match (self.dialect, kind) {
            (EmbedDialect::Markdown, _) => writeln!(out, "![{name}]({url})"),
            (EmbedDialect::Html, MediaKind::Image) => {
                writeln!(out, "<img src=\"{url}\" alt=\"{}\">", ProtectedString(name))
            }
            (EmbedDialect::Html, MediaKind::Video) => {
                writeln!(out, "<video controls><source src=\"{url}\"></video>")
            }
            (EmbedDialect::Html, MediaKind::Audio) => {
                writeln!(out, "<audio controls src=\"{url}\"></audio>")
            }
            (EmbedDialect::Html, MediaKind::Other) => writeln!(out, "[{name}]({url})"),
        };
    }
}

/// Prefixes every line with a block-quote marker.
pub fn blockquote(text: &str) -> String {
    text.split('\n')
        .map(|line| format!("> {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Renders `post` as a block quote.
///
/// `renote` is the already quoted block of the renoted note, if it could be
/// resolved. Emoji shortcodes are left as they are.
pub fn render(post: &RemotePost, source_url: &str, renote: Option<&str>, style: Style) -> String {
    let mut note = match &post.text {
        Some(text) => format!("{text}\n"),
        None => String::new(),
    };

    for file in &post.attachments {
        style.attachment(&mut note, file);
    }

    if let Some(renote) = renote.filter(|r| !r.trim().is_empty()) {
        note.push_str(RENOTE_LABEL);
        note.push('\n');
        note.push_str(renote.trim_matches('\n'));
        note.push('\n');
    }

    note.push('\n');

    let author = &post.author;
    if let Some(avatar) = author.avatar() {
        note.push_str(&style.icon(&author.username, avatar));
    }
    let _ = write!(
        note,
        " {}[{}]({source_url})",
        author.display_name.as_deref().unwrap_or_default(),
        style.locale.open_original(&author.username),
    );

    blockquote(&note)
}
