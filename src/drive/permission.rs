use crate::error::{Error, Result};
use crate::resource::{bind, unbind};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Access level granted by a permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    #[default]
    Reader,
    Commenter,
    Writer,
    /// Content manager on a shared drive.
    FileOrganizer,
    /// Manager of a shared drive.
    Organizer,
    Owner,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Reader => "reader",
            Role::Commenter => "commenter",
            Role::Writer => "writer",
            Role::FileOrganizer => "fileOrganizer",
            Role::Organizer => "organizer",
            Role::Owner => "owner",
        }
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "reader" => Ok(Role::Reader),
            "commenter" => Ok(Role::Commenter),
            "writer" => Ok(Role::Writer),
            "fileOrganizer" => Ok(Role::FileOrganizer),
            "organizer" => Ok(Role::Organizer),
            "owner" => Ok(Role::Owner),
            other => Err(Error::InvalidArgument(format!(
                "unknown permission role '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of principal a permission applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionType {
    #[default]
    User,
    Group,
    Domain,
    Anyone,
}

impl PermissionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionType::User => "user",
            PermissionType::Group => "group",
            PermissionType::Domain => "domain",
            PermissionType::Anyone => "anyone",
        }
    }
}

impl FromStr for PermissionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "user" => Ok(PermissionType::User),
            "group" => Ok(PermissionType::Group),
            "domain" => Ok(PermissionType::Domain),
            "anyone" => Ok(PermissionType::Anyone),
            other => Err(Error::InvalidArgument(format!(
                "unknown permission type '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for PermissionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Fields as they arrive from the API, after snake-casing.
#[derive(Debug, Default, Deserialize)]
struct PermissionData {
    id: Option<String>,
    role: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    email_address: Option<String>,
    domain: Option<String>,
    allow_file_discovery: Option<bool>,
    display_name: Option<String>,
}

// The writable subset sent when creating a permission.
#[derive(Debug, Serialize)]
struct PermissionBody<'a> {
    role: Role,
    #[serde(rename = "type")]
    kind: PermissionType,
    email_address: Option<&'a str>,
    domain: Option<&'a str>,
    allow_file_discovery: Option<bool>,
}

/// A Drive file permission.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Permission {
    id: Option<String>,
    file_id: Option<String>,
    role: Role,
    kind: PermissionType,
    email: Option<String>,
    domain: Option<String>,
    allow_file_discovery: Option<bool>,
    display_name: Option<String>,
}

impl Permission {
    /// A new, not yet created permission for `email`.
    pub fn new(email: &str, role: Role, kind: PermissionType) -> Result<Self> {
        let mut permission = Self {
            role,
            kind,
            ..Default::default()
        };
        permission.set_email(email)?;
        Ok(permission)
    }

    /// Bind a permission returned by the API.
    pub fn from_existing(raw: Value, file_id: Option<&str>) -> Result<Self> {
        let data: PermissionData = bind(raw)?;

        Ok(Self {
            id: data.id,
            file_id: file_id.map(str::to_string),
            role: data.role.as_deref().map(str::parse).transpose()?.unwrap_or_default(),
            kind: data.kind.as_deref().map(str::parse).transpose()?.unwrap_or_default(),
            email: data.email_address,
            domain: data.domain,
            allow_file_discovery: data.allow_file_discovery,
            display_name: data.display_name,
        })
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Id of the file this permission belongs to, when known.
    pub fn file_id(&self) -> Option<&str> {
        self.file_id.as_deref()
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn set_role(&mut self, role: &str) -> Result<()> {
        self.role = role.parse()?;
        Ok(())
    }

    pub fn permission_type(&self) -> PermissionType {
        self.kind
    }

    pub fn set_type(&mut self, kind: &str) -> Result<()> {
        self.kind = kind.parse()?;
        Ok(())
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Set the email address; it must contain exactly one `@` with text on
    /// both sides.
    pub fn set_email(&mut self, email: &str) -> Result<()> {
        let mut parts = email.split('@');
        let valid = matches!(
            (parts.next(), parts.next(), parts.next()),
            (Some(local), Some(host), None) if !local.is_empty() && !host.is_empty()
        );
        if !valid {
            return Err(Error::InvalidArgument(format!(
                "invalid email address '{}'",
                email
            )));
        }
        self.email = Some(email.to_string());
        Ok(())
    }

    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    pub fn set_domain(&mut self, domain: &str) {
        self.domain = Some(domain.to_string());
    }

    pub fn allow_file_discovery(&self) -> Option<bool> {
        self.allow_file_discovery
    }

    pub fn set_allow_file_discovery(&mut self, allow: bool) {
        self.allow_file_discovery = Some(allow);
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub(crate) fn attach(&mut self, file_id: &str) {
        self.file_id = Some(file_id.to_string());
    }

    /// Request body for creating this permission, limited to the writable
    /// fields.
    pub fn create_body(&self) -> Result<Value> {
        unbind(&PermissionBody {
            role: self.role,
            kind: self.kind,
            email_address: self.email.as_deref(),
            domain: self.domain.as_deref(),
            allow_file_discovery: self.allow_file_discovery,
        })
    }
}
