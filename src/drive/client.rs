use super::{About, DriveOperations, File, FileType, Permission};
use crate::auth::{Access, Authorizer, Connector, authorize, https_connector};
use crate::config::{Credentials, scope_url};
use crate::error::{Error, Result};
use crate::resource::{to_api, to_raw};
use async_trait::async_trait;
use google_drive3::DriveHub;
use google_drive3::common::NoToken;
use hyper_util::client::legacy::Client;
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, instrument};

const DEFAULT_SCOPE: &str = "https://www.googleapis.com/auth/drive";

// Fixed page size for file listings; no pagination.
const PAGE_SIZE: i32 = 100;

const FILE_FIELDS: &str = "*";
const COPY_FIELDS: &str = "id, name, mimeType, parents, webViewLink";
const LIST_FIELDS: &str = "files(id, name, mimeType, parents)";
const ABOUT_FIELDS: &str = "user";

/// Drive v3 backed by the generated hub.
pub struct GoogleDrive {
    hub: DriveHub<Connector>,
    access: Access,
}

impl GoogleDrive {
    #[instrument(name = "Connecting to Google Drive", skip_all)]
    pub async fn connect(credentials: &Credentials) -> Result<Self> {
        let authorizer = Authorizer::from_credentials(credentials).await?;
        let client = Client::builder(hyper_util::rt::TokioExecutor::new()).build(https_connector()?);

        let access = authorizer.access(DEFAULT_SCOPE);
        let hub = match authorizer {
            Authorizer::ApiKey(_) => DriveHub::new(client, NoToken),
            Authorizer::ServiceAccount { auth, .. } => DriveHub::new(client, auth),
        };

        Ok(Self { hub, access })
    }
}

#[async_trait]
impl DriveOperations for GoogleDrive {
    async fn get_file(&self, file_id: &str, fields: &str) -> Result<Value> {
        let (_, file) = authorize!(self.hub.files().get(file_id), self.access)
            .param("fields", fields)
            .supports_all_drives(true)
            .doit()
            .await?;
        to_raw(&file)
    }

    async fn copy_file(&self, file_id: &str, body: &Value, fields: &str) -> Result<Value> {
        let request: google_drive3::api::File = to_api(body.clone())?;
        let (_, file) = authorize!(self.hub.files().copy(request, file_id), self.access)
            .param("fields", fields)
            .supports_all_drives(true)
            .doit()
            .await?;
        to_raw(&file)
    }

    async fn list_files(
        &self,
        query: Option<&str>,
        page_size: i32,
        fields: &str,
    ) -> Result<Value> {
        let mut call = authorize!(self.hub.files().list(), self.access)
            .page_size(page_size)
            .param("fields", fields);
        if let Some(query) = query {
            call = call.q(query);
        }
        let (_, list) = call.doit().await?;
        to_raw(&list)
    }

    async fn create_permission(
        &self,
        file_id: &str,
        body: &Value,
        email_message: Option<&str>,
        send_notification: bool,
    ) -> Result<Value> {
        let request: google_drive3::api::Permission = to_api(body.clone())?;
        let mut call = authorize!(self.hub.permissions().create(request, file_id), self.access)
            .send_notification_email(send_notification);
        if let Some(message) = email_message {
            call = call.email_message(message);
        }
        let (_, permission) = call.doit().await?;
        to_raw(&permission)
    }

    async fn get_about(&self, fields: &str) -> Result<Value> {
        let (_, about) = authorize!(self.hub.about().get(), self.access)
            .param("fields", fields)
            .doit()
            .await?;
        to_raw(&about)
    }
}

/// Drive facade returning [`File`], [`Permission`] and [`About`] objects.
#[derive(Clone)]
pub struct DriveClient {
    api: Arc<dyn DriveOperations>,
}

impl fmt::Debug for DriveClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriveClient").finish_non_exhaustive()
    }
}

impl DriveClient {
    pub fn new(api: impl DriveOperations + 'static) -> Self {
        Self { api: Arc::new(api) }
    }

    pub async fn connect(credentials: &Credentials) -> Result<Self> {
        Ok(Self::new(GoogleDrive::connect(credentials).await?))
    }

    pub async fn from_api_key(api_key: &str) -> Result<Self> {
        Self::connect(&Credentials::ApiKey(api_key.to_string())).await
    }

    pub async fn from_service_account(
        key_path: impl Into<PathBuf>,
        delegated_user: Option<&str>,
        scopes: &[&str],
    ) -> Result<Self> {
        Self::connect(&Credentials::ServiceAccount {
            key_path: key_path.into(),
            delegated_user: delegated_user.map(str::to_string),
            scopes: scopes.iter().map(|s| scope_url(s)).collect(),
        })
        .await
    }

    #[instrument(name = "Fetching file", skip(self))]
    pub async fn get_file(&self, file_id: &str) -> Result<File> {
        let raw = self.api.get_file(file_id, FILE_FIELDS).await?;
        File::from_existing(raw, Some(self.clone()))
    }

    /// Copy a file. Without `body` the source file's own metadata is reused.
    #[instrument(name = "Copying file", skip(self, body))]
    pub async fn copy_file(&self, file_id: &str, body: Option<&File>) -> Result<File> {
        let body = match body {
            Some(file) => file.copy_body(),
            None => {
                let raw = self.api.get_file(file_id, FILE_FIELDS).await?;
                File::from_existing(raw, None)?.copy_body()
            }
        };

        let raw = self.api.copy_file(file_id, &body, COPY_FIELDS).await?;
        let file = File::from_existing(raw, Some(self.clone()))?;
        debug!(id = ?file.id(), "Copied file");

        Ok(file)
    }

    /// List up to one page of files, optionally of a single Drive type.
    #[instrument(name = "Listing files", skip(self))]
    pub async fn list_files(&self, kind: Option<FileType>, fields: &[&str]) -> Result<Vec<File>> {
        let query = kind.map(|kind| format!("mimeType='{}'", kind.mime_type()));
        let fields = match fields {
            [] => LIST_FIELDS.to_string(),
            fields => fields.join(", "),
        };

        let mut raw = self
            .api
            .list_files(query.as_deref(), PAGE_SIZE, &fields)
            .await?;

        match raw.get_mut("files").map(Value::take) {
            Some(Value::Array(files)) => files
                .into_iter()
                .map(|file| File::from_existing(file, Some(self.clone())))
                .collect(),
            Some(other) => Err(Error::Payload(format!(
                "expected a list of files, got {}",
                other
            ))),
            None => Ok(Vec::new()),
        }
    }

    #[instrument(name = "Creating permission", skip(self, permission, message))]
    pub async fn create_permission(
        &self,
        file_id: &str,
        permission: &Permission,
        message: Option<&str>,
        notify: bool,
    ) -> Result<Permission> {
        let body = permission.create_body()?;
        let raw = self
            .api
            .create_permission(file_id, &body, message, notify)
            .await?;
        Permission::from_existing(raw, Some(file_id))
    }

    #[instrument(name = "Fetching about", skip(self))]
    pub async fn get_about(&self) -> Result<About> {
        let raw = self.api.get_about(ABOUT_FIELDS).await?;
        About::from_existing(raw)
    }
}

#[cfg(test)]
pub(crate) mod test_helpers {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    pub(crate) fn mock_file() -> Value {
        json!({
            "kind": "drive#file",
            "id": "abc123",
            "name": "Test File",
            "mimeType": "application/vnd.google-apps.document",
            "parents": ["p1", "p2", "p3"],
            "createdTime": "2024-11-23T10:00:00.000Z",
            "permissions": [
                {"id": "perm1", "type": "user", "role": "owner", "emailAddress": "owner@example.com"},
                {"id": "anyoneWithLink", "type": "anyone", "role": "reader"}
            ]
        })
    }

    /// Canned Drive responses, recording the bodies it receives.
    #[derive(Clone, Default)]
    pub(crate) struct MockDrive {
        pub copies: Arc<Mutex<Vec<Value>>>,
        pub permissions: Arc<Mutex<Vec<Value>>>,
        pub queries: Arc<Mutex<Vec<Option<String>>>>,
    }

    #[async_trait]
    impl DriveOperations for MockDrive {
        async fn get_file(&self, _file_id: &str, _fields: &str) -> Result<Value> {
            Ok(mock_file())
        }

        async fn copy_file(&self, _file_id: &str, body: &Value, _fields: &str) -> Result<Value> {
            self.copies.lock().unwrap().push(body.clone());
            let mut copy = body.clone();
            copy["id"] = json!("copy456");
            Ok(copy)
        }

        async fn list_files(
            &self,
            query: Option<&str>,
            _page_size: i32,
            _fields: &str,
        ) -> Result<Value> {
            self.queries.lock().unwrap().push(query.map(str::to_string));
            Ok(json!({"files": [
                {"id": "f1", "name": "One", "mimeType": "application/vnd.google-apps.spreadsheet"},
                {"id": "f2", "name": "Two", "mimeType": "application/vnd.google-apps.spreadsheet"}
            ]}))
        }

        async fn create_permission(
            &self,
            _file_id: &str,
            body: &Value,
            _email_message: Option<&str>,
            _send_notification: bool,
        ) -> Result<Value> {
            self.permissions.lock().unwrap().push(body.clone());
            Ok(json!({
                "kind": "drive#permission",
                "id": "abc123",
                "type": body["type"],
                "role": body["role"]
            }))
        }

        async fn get_about(&self, _fields: &str) -> Result<Value> {
            Ok(json!({"user": {
                "displayName": "Test User",
                "emailAddress": "test@gmail.com",
                "permissionId": "1234"
            }}))
        }
    }
}
