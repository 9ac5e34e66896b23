use super::client::DriveClient;
use super::permission::{Permission, PermissionType, Role};
use crate::error::{Error, Result};
use crate::resource::{bind, unbind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;
use std::str::FromStr;

const TYPE_PREFIX: &str = "application/vnd.google-apps.";

/// Google Drive application file types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileType {
    Audio,
    Document,
    Drawing,
    File,
    Folder,
    Form,
    FusionTable,
    Map,
    Photo,
    Presentation,
    Script,
    Sites,
    Spreadsheet,
    #[default]
    Unknown,
    Video,
}

impl FileType {
    pub const ALL: [FileType; 15] = [
        FileType::Audio,
        FileType::Document,
        FileType::Drawing,
        FileType::File,
        FileType::Folder,
        FileType::Form,
        FileType::FusionTable,
        FileType::Map,
        FileType::Photo,
        FileType::Presentation,
        FileType::Script,
        FileType::Sites,
        FileType::Spreadsheet,
        FileType::Unknown,
        FileType::Video,
    ];

    /// The suffix after `application/vnd.google-apps.`.
    pub fn suffix(&self) -> &'static str {
        match self {
            FileType::Audio => "audio",
            FileType::Document => "document",
            FileType::Drawing => "drawing",
            FileType::File => "file",
            FileType::Folder => "folder",
            FileType::Form => "form",
            FileType::FusionTable => "fusiontable",
            FileType::Map => "map",
            FileType::Photo => "photo",
            FileType::Presentation => "presentation",
            FileType::Script => "script",
            FileType::Sites => "sites",
            FileType::Spreadsheet => "spreadsheet",
            FileType::Unknown => "unknown",
            FileType::Video => "video",
        }
    }

    pub fn mime_type(&self) -> String {
        format!("{}{}", TYPE_PREFIX, self.suffix())
    }
}

impl FromStr for FileType {
    type Err = Error;

    /// Accepts `document` or `application/vnd.google-apps.document`, in any
    /// case.
    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_lowercase();
        let suffix = lower.strip_prefix(TYPE_PREFIX).unwrap_or(&lower);

        FileType::ALL
            .into_iter()
            .find(|kind| kind.suffix() == suffix)
            .ok_or_else(|| Error::InvalidArgument(format!("unsupported Drive file type '{}'", s)))
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.mime_type())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct FileData {
    id: Option<String>,
    name: Option<String>,
    mime_type: Option<String>,
    description: Option<String>,
    #[serde(default)]
    parents: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    permissions: Vec<Value>,
    web_view_link: Option<String>,
    // RFC 3339 text as sent, so `serialize` returns it unchanged.
    created_time: Option<String>,
    modified_time: Option<String>,
    trashed: Option<bool>,
}

/// A Drive file.
#[derive(Debug, Clone)]
pub struct File {
    data: FileData,
    client: Option<DriveClient>,
}

impl File {
    /// A new local file description, not yet known to Drive.
    pub fn new(name: &str, kind: &str) -> Result<Self> {
        let mut file = Self {
            data: FileData {
                name: Some(name.to_string()),
                ..Default::default()
            },
            client: None,
        };
        file.set_type(kind)?;
        Ok(file)
    }

    /// Bind a file resource returned by the API.
    pub fn from_existing(raw: Value, client: Option<DriveClient>) -> Result<Self> {
        Ok(Self {
            data: bind(raw)?,
            client,
        })
    }

    pub fn id(&self) -> Option<&str> {
        self.data.id.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.data.name.as_deref()
    }

    pub fn set_name(&mut self, name: &str) {
        self.data.name = Some(name.to_string());
    }

    /// Full mime type, e.g. `application/vnd.google-apps.document`.
    pub fn mime_type(&self) -> Option<&str> {
        self.data.mime_type.as_deref()
    }

    /// The Drive application type, if the mime type is one.
    pub fn file_type(&self) -> Option<FileType> {
        self.data
            .mime_type
            .as_deref()
            .filter(|mime| mime.starts_with(TYPE_PREFIX))
            .and_then(|mime| mime.parse().ok())
    }

    pub fn set_type(&mut self, kind: &str) -> Result<()> {
        let kind: FileType = kind.parse()?;
        self.data.mime_type = Some(kind.mime_type());
        Ok(())
    }

    pub fn parents(&self) -> &[String] {
        &self.data.parents
    }

    pub fn set_parents(&mut self, parents: Vec<String>) {
        self.data.parents = parents;
    }

    pub fn description(&self) -> Option<&str> {
        self.data.description.as_deref()
    }

    pub fn set_description(&mut self, description: &str) {
        self.data.description = Some(description.to_string());
    }

    pub fn web_view_link(&self) -> Option<&str> {
        self.data.web_view_link.as_deref()
    }

    pub fn created_time(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(self.data.created_time.as_deref())
    }

    pub fn modified_time(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(self.data.modified_time.as_deref())
    }

    pub fn trashed(&self) -> bool {
        self.data.trashed.unwrap_or(false)
    }

    /// Permissions included in the file payload. Empty when the caller may
    /// not share the file or the field was not requested.
    pub fn permissions(&self) -> Result<Vec<Permission>> {
        self.data
            .permissions
            .iter()
            .map(|raw| Permission::from_existing(raw.clone(), self.id()))
            .collect()
    }

    /// The file as a camelCase API payload.
    pub fn serialize(&self) -> Result<Value> {
        unbind(&self.data)
    }

    /// Metadata sent when copying: the writable fields only.
    pub(crate) fn copy_body(&self) -> Value {
        let mut body = json!({});
        if let Some(name) = &self.data.name {
            body["name"] = json!(name);
        }
        if let Some(mime) = &self.data.mime_type {
            body["mimeType"] = json!(mime);
        }
        if let Some(description) = &self.data.description {
            body["description"] = json!(description);
        }
        if !self.data.parents.is_empty() {
            body["parents"] = json!(self.data.parents);
        }
        body
    }

    fn attached(&self) -> Result<(&DriveClient, &str)> {
        let client = self.client.as_ref().ok_or_else(|| {
            Error::InvalidArgument("file is not attached to a Drive client".to_string())
        })?;
        let id = self
            .id()
            .ok_or_else(|| Error::InvalidArgument("file has no id yet".to_string()))?;
        Ok((client, id))
    }

    /// Copy this file. The copy is named `"<name> | COPY"` unless `name` is
    /// given, and keeps this file's parents unless `parents` is non-empty.
    pub async fn copy(&self, name: Option<&str>, parents: &[String]) -> Result<File> {
        let (client, id) = self.attached()?;

        let mut new = self.clone();
        let default_name = format!("{} | COPY", self.name().unwrap_or_default());
        new.set_name(name.unwrap_or(default_name.as_str()));
        if !parents.is_empty() {
            new.set_parents(parents.to_vec());
        }

        client.copy_file(id, Some(&new)).await
    }

    /// Share this file with a user.
    pub async fn add_permission(&self, email: &str, role: Role) -> Result<Permission> {
        let (client, id) = self.attached()?;
        let permission = Permission::new(email, role, PermissionType::User)?;

        let mut created = client.create_permission(id, &permission, None, false).await?;
        if created.email().is_none() {
            created.set_email(email)?;
        }
        created.attach(id);

        Ok(created)
    }
}

fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|time| time.with_timezone(&Utc))
}
