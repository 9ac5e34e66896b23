mod about;
mod client;
mod file;
mod permission;

pub use about::About;
pub use client::{DriveClient, GoogleDrive};
pub use file::{File, FileType};
pub use permission::{Permission, PermissionType, Role};

use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Raw Drive v3 calls. Every method returns the response body as camelCase
/// JSON.
#[async_trait]
pub trait DriveOperations: Send + Sync {
    async fn get_file(&self, file_id: &str, fields: &str) -> Result<Value>;

    async fn copy_file(&self, file_id: &str, body: &Value, fields: &str) -> Result<Value>;

    async fn list_files(
        &self,
        query: Option<&str>,
        page_size: i32,
        fields: &str,
    ) -> Result<Value>;

    async fn create_permission(
        &self,
        file_id: &str,
        body: &Value,
        email_message: Option<&str>,
        send_notification: bool,
    ) -> Result<Value>;

    async fn get_about(&self, fields: &str) -> Result<Value>;
}
