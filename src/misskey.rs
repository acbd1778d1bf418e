use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    redirect::Policy,
    Client, Response, StatusCode,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

use crate::{
    config::Visibility,
    note::{NoteResponse, PostReference, RemotePost},
};

/// Misskey HTTP API client. One instance serves every host.
pub struct MisskeyClient {
    client: Client,
    scheme: String,
}

#[derive(Debug, Error)]
pub enum MisskeyError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Scheme(#[from] serde_json::Error),
    #[error("server answered {0}")]
    Status(StatusCode),
    #[error("API returned error {code}: {message}")]
    Api {
        status: StatusCode,
        code: String,
        message: String,
    },
    #[error("API did not return any usable content")]
    Content,
}

/// The two lookups quoting needs.
#[async_trait]
pub trait MisskeyApi: Send + Sync {
    async fn fetch_note(
        &self,
        reference: &PostReference,
        token: Option<&str>,
    ) -> Result<RemotePost, MisskeyError>;

    async fn emoji_url(&self, domain: &str, name: &str) -> Result<String, MisskeyError>;
}

pub struct ShowNote<'a> {
    client: &'a MisskeyClient,
    reference: &'a PostReference,
    token: Option<&'a str>,
}
pub struct GetEmoji<'a> {
    client: &'a MisskeyClient,
    domain: &'a str,
    name: &'a str,
}
pub struct CreateNote<'a> {
    client: &'a MisskeyClient,
    domain: &'a str,
    token: &'a str,
    text: String,
    visibility: Visibility,
    file_ids: Vec<String>,
}
pub struct UploadFile<'a> {
    client: &'a MisskeyClient,
    domain: &'a str,
    token: &'a str,
    file_name: String,
    content: Vec<u8>,
}
pub struct CheckMiAuth<'a> {
    client: &'a MisskeyClient,
    domain: &'a str,
    session: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ShowNoteBody<'a> {
    note_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    i: Option<&'a str>,
}
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateNoteBody<'a> {
    i: &'a str,
    text: &'a str,
    visibility: Visibility,
    // An empty list is rejected by the server.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    file_ids: &'a Vec<String>,
}

#[derive(Deserialize)]
struct EmojiResponse {
    #[serde(default)]
    url: Option<String>,
}
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateNoteResponse {
    created_note: CreatedNote,
}
#[derive(Deserialize)]
struct CreatedNote {
    id: String,
}
#[derive(Deserialize)]
struct DriveFileResponse {
    id: String,
}
#[derive(Deserialize)]
struct MiAuthResponse {
    ok: bool,
    #[serde(default)]
    token: Option<String>,
}
#[derive(Deserialize)]
struct ErrorResponse {
    error: ApiError,
}
#[derive(Deserialize)]
struct ApiError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

impl MisskeyClient {
    pub fn new() -> Result<Self, MisskeyError> {
        Self::with_scheme("https")
    }

    /// Redirects are never followed: only a plain 200 counts as an answer.
    pub fn with_scheme(scheme: &str) -> Result<Self, MisskeyError> {
        let client = Client::builder().redirect(Policy::none()).build()?;

        Ok(Self {
            client,
            scheme: scheme.to_owned(),
        })
    }

    pub fn base_url(&self, domain: &str) -> String {
        format!("{}://{domain}", self.scheme)
    }

    fn endpoint(&self, domain: &str, path: &str) -> String {
        format!("{}/api/{path}", self.base_url(domain))
    }

    pub fn show_note<'a>(&'a self, reference: &'a PostReference) -> ShowNote<'a> {
        ShowNote {
            client: self,
            reference,
            token: None,
        }
    }

    pub fn emoji<'a>(&'a self, domain: &'a str, name: &'a str) -> GetEmoji<'a> {
        GetEmoji {
            client: self,
            domain,
            name,
        }
    }

    pub fn create_note<'a>(&'a self, domain: &'a str, token: &'a str) -> CreateNote<'a> {
        CreateNote {
            client: self,
            domain,
            token,
            text: String::new(),
            visibility: Visibility::default(),
            file_ids: Vec::new(),
        }
    }

    pub fn upload_file<'a>(
        &'a self,
        domain: &'a str,
        token: &'a str,
        file_name: String,
        content: Vec<u8>,
    ) -> UploadFile<'a> {
        UploadFile {
            client: self,
            domain,
            token,
            file_name,
            content,
        }
    }

    pub fn check_miauth<'a>(&'a self, domain: &'a str, session: &'a str) -> CheckMiAuth<'a> {
        CheckMiAuth {
            client: self,
            domain,
            session,
        }
    }
}

/// Accepts exactly 200; anything else is reported with the server's error
/// object when it sent one.
async fn read_json<T: DeserializeOwned>(res: Response) -> Result<T, MisskeyError> {
    let status = res.status();
    let body = res.text().await?;

    if status != StatusCode::OK {
        return Err(match serde_json::from_str::<ErrorResponse>(&body) {
            Ok(ErrorResponse { error }) => MisskeyError::Api {
                status,
                code: error.code,
                message: error.message,
            },
            Err(_) => MisskeyError::Status(status),
        });
    }

    Ok(serde_json::from_str(&body)?)
}

impl<'a> ShowNote<'a> {
    /// Only pass the caller's own token when the note lives on the caller's
    /// own host.
    pub fn token(mut self, token: Option<&'a str>) -> Self {
        self.token = token;
        self
    }

    pub async fn send(self) -> Result<RemotePost, MisskeyError> {
        let res = self
            .client
            .client
            .post(self.client.endpoint(&self.reference.domain, "notes/show"))
            .json(&ShowNoteBody {
                note_id: &self.reference.post_id,
                i: self.token,
            })
            .send()
            .await?;

        let raw: NoteResponse = read_json(res).await?;

        Ok(raw.into_post(self.reference))
    }
}

impl<'a> GetEmoji<'a> {
    pub async fn send(self) -> Result<String, MisskeyError> {
        let res = self
            .client
            .client
            .get(self.client.endpoint(self.domain, "emoji"))
            .query(&[("name", self.name)])
            .send()
            .await?;

        let raw: EmojiResponse = read_json(res).await?;

        raw.url.filter(|u| !u.is_empty()).ok_or(MisskeyError::Content)
    }
}

impl<'a> CreateNote<'a> {
    pub fn text(mut self, text: String) -> Self {
        self.text = text;
        self
    }

    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn file_ids(mut self, file_ids: Vec<String>) -> Self {
        self.file_ids = file_ids;
        self
    }

    /// Returns the id of the created note.
    pub async fn send(self) -> Result<String, MisskeyError> {
        let res = self
            .client
            .client
            .post(self.client.endpoint(self.domain, "notes/create"))
            .json(&CreateNoteBody {
                i: self.token,
                text: &self.text,
                visibility: self.visibility,
                file_ids: &self.file_ids,
            })
            .send()
            .await?;

        let raw: CreateNoteResponse = read_json(res).await?;

        Ok(raw.created_note.id)
    }
}

impl<'a> UploadFile<'a> {
    /// Returns the drive file id.
    pub async fn send(self) -> Result<String, MisskeyError> {
        let part = Part::bytes(self.content)
            .file_name(self.file_name)
            .mime_str("application/octet-stream")?;
        let form = Form::new().text("i", self.token.to_owned()).part("file", part);

        let res = self
            .client
            .client
            .post(self.client.endpoint(self.domain, "drive/files/create"))
            .multipart(form)
            .send()
            .await?;

        let raw: DriveFileResponse = read_json(res).await?;

        Ok(raw.id)
    }
}

impl<'a> CheckMiAuth<'a> {
    /// `Ok(None)` while the user has not approved the session yet.
    pub async fn send(self) -> Result<Option<String>, MisskeyError> {
        let res = self
            .client
            .client
            .post(self.client.endpoint(
                self.domain,
                &format!("miauth/{}/check", self.session),
            ))
            .send()
            .await?;

        let raw: MiAuthResponse = read_json(res).await?;

        Ok(raw.token.filter(|_| raw.ok))
    }
}

#[async_trait]
impl MisskeyApi for MisskeyClient {
    async fn fetch_note(
        &self,
        reference: &PostReference,
        token: Option<&str>,
    ) -> Result<RemotePost, MisskeyError> {
        self.show_note(reference)
            .token(token)
            .send()
            .await
    }

    async fn emoji_url(&self, domain: &str, name: &str) -> Result<String, MisskeyError> {
        self.emoji(domain, name).send().await
    }
}
