use crate::error::Result;
use crate::resource::bind;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Default, Deserialize)]
struct AboutData {
    #[serde(default)]
    user: UserData,
}

#[derive(Debug, Default, Deserialize)]
struct UserData {
    display_name: Option<String>,
    email_address: Option<String>,
    permission_id: Option<String>,
}

/// The authenticated Drive user.
#[derive(Debug, Clone, PartialEq)]
pub struct About {
    name: Option<String>,
    email: Option<String>,
    permission_id: Option<String>,
}

impl About {
    pub fn from_existing(raw: Value) -> Result<Self> {
        let data: AboutData = bind(raw)?;
        Ok(Self {
            name: data.user.display_name,
            email: data.user.email_address,
            permission_id: data.user.permission_id,
        })
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn permission_id(&self) -> Option<&str> {
        self.permission_id.as_deref()
    }
}
