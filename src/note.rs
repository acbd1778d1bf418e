use serde::Deserialize;

/// A note URL split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostReference {
    pub domain: String,
    pub post_id: String,
    pub source_url: String,
}

/// A note as the quoting pipeline sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct RemotePost {
    pub id: String,
    /// Text body. May be absent for media-only notes
    pub text: Option<String>,
    pub attachments: Vec<Attachment>,
    pub author: Author,
    pub reshared: Option<PostReference>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub url: String,
    pub name: String,
    pub kind: MediaKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
    Audio,
    Other,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Author {
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NoteResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    files: Option<Vec<DriveFileResponse>>,
    #[serde(default)]
    renote: Option<RenoteResponse>,
    #[serde(default)]
    user: Option<UserResponse>,
}
#[derive(Deserialize)]
struct DriveFileResponse {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    r#type: Option<String>,
}
#[derive(Deserialize)]
struct RenoteResponse {
    #[serde(default)]
    id: Option<String>,
}
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserResponse {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    avatar_url: Option<String>,
}

impl MediaKind {
    /// Classifies a MIME type by its top-level part.
    pub fn from_mime(mime: &str) -> Self {
        if mime.starts_with("image") {
            Self::Image
        } else if mime.starts_with("video") {
            Self::Video
        } else if mime.starts_with("audio") {
            Self::Audio
        } else {
            Self::Other
        }
    }
}

impl PostReference {
    pub fn new(domain: &str, post_id: &str) -> Self {
        Self {
            domain: domain.to_owned(),
            post_id: post_id.to_owned(),
            source_url: format!("https://{domain}/notes/{post_id}"),
        }
    }
}

impl Author {
    /// Avatar to show, if any. Generated identicons don't count.
    pub fn avatar(&self) -> Option<&str> {
        let url = self.avatar_url.as_deref()?;
        let parsed = reqwest::Url::parse(url).ok()?;
        let first = parsed.path_segments()?.next().unwrap_or_default();

        (first != "identicon").then_some(url)
    }
}

impl NoteResponse {
    /// Missing fields become empty content rather than errors.
    pub(crate) fn into_post(self, reference: &PostReference) -> RemotePost {
        let attachments = self
            .files
            .unwrap_or_default()
            .into_iter()
            .filter_map(|f| {
                let url = f.url?;
                Some(Attachment {
                    kind: f
                        .r#type
                        .as_deref()
                        .map(MediaKind::from_mime)
                        .unwrap_or(MediaKind::Other),
                    name: f.name.unwrap_or_default(),
                    url,
                })
            })
            .collect();

        let author = self
            .user
            .map(|u| Author {
                username: u.username.unwrap_or_default(),
                display_name: u.name.filter(|n| !n.is_empty()),
                avatar_url: u.avatar_url,
            })
            .unwrap_or_default();

        RemotePost {
            id: self.id.unwrap_or_else(|| reference.post_id.clone()),
            text: self.text.filter(|t| !t.is_empty()),
            attachments,
            author,
            reshared: self
                .renote
                .and_then(|r| r.id)
                .map(|id| PostReference::new(&reference.domain, &id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> PostReference {
        PostReference::new("misskey.io", "abc")
    }

    #[test]
    fn converts_full_response() {
        let raw = r#"{
            "id": "abc",
            "text": "hello :smile:",
            "files": [
                {"name": "cat.png", "url": "https://s3/cat.png", "type": "image/png"},
                {"name": "clip.mp4", "url": "https://s3/clip.mp4", "type": "video/mp4"},
                {"name": "doc.pdf", "url": "https://s3/doc.pdf", "type": "application/pdf"}
            ],
            "renote": {"id": "xyz"},
            "user": {"username": "alice", "name": "Alice", "avatarUrl": "https://s3/a.webp"}
        }"#;
        let res: NoteResponse = serde_json::from_str(raw).unwrap();
        let post = res.into_post(&reference());

        assert_eq!(post.id, "abc");
        assert_eq!(post.text.as_deref(), Some("hello :smile:"));
        assert_eq!(
            post.attachments.iter().map(|a| a.kind).collect::<Vec<_>>(),
            vec![MediaKind::Image, MediaKind::Video, MediaKind::Other]
        );
        assert_eq!(post.author.display_name.as_deref(), Some("Alice"));
        assert_eq!(
            post.reshared,
            Some(PostReference {
                domain: "misskey.io".into(),
                post_id: "xyz".into(),
                source_url: "https://misskey.io/notes/xyz".into(),
            })
        );
    }

    #[test]
    fn nulls_and_missing_fields_are_empty() {
        let raw = r#"{"text": null, "files": null, "renote": null,
                      "user": {"username": "bob", "name": null}}"#;
        let res: NoteResponse = serde_json::from_str(raw).unwrap();
        let post = res.into_post(&reference());

        assert_eq!(post.id, "abc");
        assert_eq!(post.text, None);
        assert!(post.attachments.is_empty());
        assert_eq!(post.author.username, "bob");
        assert_eq!(post.author.display_name, None);
        assert_eq!(post.author.avatar(), None);
        assert_eq!(post.reshared, None);
    }

    #[test]
    fn identicon_avatar_is_hidden() {
        let author = Author {
            username: "carol".into(),
            display_name: None,
            avatar_url: Some("https://misskey.io/identicon/carol@misskey.io".into()),
        };
        assert_eq!(author.avatar(), None);

        let author = Author {
            avatar_url: Some("https://misskey.io/proxy/identicon.webp".into()),
            ..author
        };
        assert_eq!(
            author.avatar(),
            Some("https://misskey.io/proxy/identicon.webp")
        );
    }

    #[test]
    fn media_kind_from_mime() {
        assert_eq!(MediaKind::from_mime("audio/ogg"), MediaKind::Audio);
        assert_eq!(MediaKind::from_mime("image/webp"), MediaKind::Image);
        assert_eq!(MediaKind::from_mime(""), MediaKind::Other);
    }
}
