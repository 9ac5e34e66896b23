use crate::config::Credentials;
use crate::error::{Error, Result};
use hyper_util::client::legacy::connect::HttpConnector;
use std::path::Path;
use tracing::{debug, instrument};
use yup_oauth2::{
    ServiceAccountAuthenticator, authenticator::Authenticator, hyper_rustls::HttpsConnector,
};

pub(crate) type Connector = HttpsConnector<HttpConnector>;

type AuthType = Authenticator<Connector>;

/// How a hub authorizes its requests.
pub(crate) enum Authorizer {
    /// Sent as the `key` query parameter; no bearer token.
    ApiKey(String),
    ServiceAccount { auth: AuthType, scopes: Vec<String> },
}

/// Per-request authorization applied to every call builder.
#[derive(Debug, Clone)]
pub(crate) struct Access {
    pub(crate) api_key: Option<String>,
    pub(crate) scopes: Vec<String>,
}

impl Authorizer {
    #[instrument(name = "Authorizing", skip_all)]
    pub(crate) async fn from_credentials(credentials: &Credentials) -> Result<Self> {
        match credentials {
            Credentials::ApiKey(key) => {
                if key.is_empty() {
                    return Err(Error::MissingCredential("API key is empty".to_string()));
                }
                Ok(Self::ApiKey(key.clone()))
            }
            Credentials::ServiceAccount {
                key_path,
                delegated_user,
                scopes,
            } => {
                let auth = from_service_account(key_path, delegated_user.as_deref()).await?;
                Ok(Self::ServiceAccount {
                    auth,
                    scopes: scopes.clone(),
                })
            }
        }
    }

    /// Request authorization, falling back to `default_scope` when no
    /// scopes were configured.
    pub(crate) fn access(&self, default_scope: &str) -> Access {
        match self {
            Self::ApiKey(key) => Access {
                api_key: Some(key.clone()),
                scopes: vec![default_scope.to_string()],
            },
            Self::ServiceAccount { scopes, .. } if !scopes.is_empty() => Access {
                api_key: None,
                scopes: scopes.clone(),
            },
            Self::ServiceAccount { .. } => Access {
                api_key: None,
                scopes: vec![default_scope.to_string()],
            },
        }
    }
}

impl Access {
    /// Authorize a plain REST request: the `key` parameter for an API key,
    /// otherwise a bearer token for the configured scopes.
    pub(crate) async fn apply(
        &self,
        request: reqwest::RequestBuilder,
        authorizer: &Authorizer,
    ) -> Result<reqwest::RequestBuilder> {
        match authorizer {
            Authorizer::ApiKey(key) => Ok(request.query(&[("key", key.as_str())])),
            Authorizer::ServiceAccount { auth, .. } => {
                let token = auth
                    .token(self.scopes.as_slice())
                    .await
                    .map_err(|e| Error::Auth(format!("Failed to get access token: {}", e)))?;
                let token = token
                    .token()
                    .ok_or_else(|| Error::Auth("Access token is empty".to_string()))?;
                Ok(request.bearer_auth(token))
            }
        }
    }
}

async fn from_service_account(key_path: &Path, delegated_user: Option<&str>) -> Result<AuthType> {
    let key = yup_oauth2::read_service_account_key(key_path)
        .await
        .map_err(|e| {
            Error::MissingCredential(format!(
                "Failed to read service account key {:?}: {}",
                key_path, e
            ))
        })?;

    let mut builder = ServiceAccountAuthenticator::builder(key);
    if let Some(user) = delegated_user {
        debug!(user, "Delegating service account");
        builder = builder.subject(user.to_string());
    }

    builder
        .build()
        .await
        .map_err(|e| Error::Auth(format!("Failed to build authenticator: {}", e)))
}

/// HTTPS connector shared by the hubs.
pub(crate) fn https_connector() -> Result<Connector> {
    Ok(hyper_rustls::HttpsConnectorBuilder::new()
        .with_native_roots()?
        .https_or_http()
        .enable_http1()
        .build())
}

/// Apply an [`Access`] to a generated call builder.
macro_rules! authorize {
    ($call:expr, $access:expr) => {{
        let access = &$access;
        let mut call = $call.add_scopes(&access.scopes);
        if let Some(key) = &access.api_key {
            call = call.param("key", key.as_str());
        }
        call
    }};
}

pub(crate) use authorize;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_api_key_is_missing() {
        let result = Authorizer::from_credentials(&Credentials::ApiKey(String::new())).await;
        assert!(matches!(result, Err(Error::MissingCredential(_))));
    }

    #[tokio::test]
    async fn test_api_key_access_uses_default_scope() {
        let auth = Authorizer::from_credentials(&Credentials::ApiKey("k".to_string()))
            .await
            .unwrap();
        let access = auth.access("https://www.googleapis.com/auth/drive");
        assert_eq!(access.api_key.as_deref(), Some("k"));
        assert_eq!(access.scopes, vec!["https://www.googleapis.com/auth/drive"]);
    }

    #[tokio::test]
    async fn test_api_key_goes_in_query() {
        let auth = Authorizer::from_credentials(&Credentials::ApiKey("k".to_string()))
            .await
            .unwrap();
        let access = auth.access("https://www.googleapis.com/auth/presentations");

        let client = reqwest::Client::new();
        let request = access
            .apply(client.get("https://slides.googleapis.com/v1/presentations/p1"), &auth)
            .await
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(request.url().query(), Some("key=k"));
        assert!(request.headers().get("authorization").is_none());
    }

    #[tokio::test]
    async fn test_unreadable_service_account_key() {
        let dir = tempfile::tempdir().unwrap();
        let credentials = Credentials::ServiceAccount {
            key_path: dir.path().join("missing.json"),
            delegated_user: None,
            scopes: vec![],
        };
        let result = Authorizer::from_credentials(&credentials).await;
        assert!(matches!(result, Err(Error::MissingCredential(_))));
    }
}
