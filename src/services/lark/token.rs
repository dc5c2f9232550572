use std::fmt;
use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::services::lark::{
    client::{LarkTransport, UpstreamRequest, is_success},
    error::{LarkError, LarkResult},
    paths,
};

/// Registered application identity (`app_id` + `app_secret`).
#[derive(Clone)]
pub struct AppCredentials {
    app_id: String,
    app_secret: String,
}

impl AppCredentials {
    /// Both parts must be present and non-blank.
    pub fn from_parts(app_id: Option<&str>, app_secret: Option<&str>) -> LarkResult<Self> {
        let app_id = required(app_id, "LARK_APP_ID")?;
        let app_secret = required(app_secret, "LARK_APP_SECRET")?;
        Ok(Self { app_id, app_secret })
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }
}

impl fmt::Debug for AppCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppCredentials")
            .field("app_id", &self.app_id)
            .field("app_secret", &"<redacted>")
            .finish()
    }
}

fn required(value: Option<&str>, key: &'static str) -> LarkResult<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or(LarkError::Configuration(key))
}

/// Application-level bearer token. Used for a single exchange and dropped.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerCredential(String);

impl BearerCredential {
    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerCredential(<redacted>)")
    }
}

/// Obtains `app_access_token`s from the internal-app auth endpoint.
///
/// Tokens are not cached: every call performs one upstream exchange.
#[derive(Clone)]
pub struct TokenProvider {
    transport: Arc<dyn LarkTransport>,
    app_id: Option<String>,
    app_secret: Option<String>,
}

impl fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenProvider")
            .field("transport", &self.transport.backend_name())
            .field("app_id", &self.app_id)
            .finish()
    }
}

impl TokenProvider {
    pub fn new(
        transport: Arc<dyn LarkTransport>,
        app_id: Option<String>,
        app_secret: Option<String>,
    ) -> Self {
        Self {
            transport,
            app_id,
            app_secret,
        }
    }

    /// Fails with `Configuration` when the app id or secret is unset.
    pub fn credentials(&self) -> LarkResult<AppCredentials> {
        AppCredentials::from_parts(self.app_id.as_deref(), self.app_secret.as_deref())
    }

    pub async fn get_access_token(&self) -> LarkResult<BearerCredential> {
        let credentials = self.credentials()?;

        let request = UpstreamRequest::post(paths::APP_ACCESS_TOKEN).json(json!({
            "app_id": credentials.app_id,
            "app_secret": credentials.app_secret,
        }));

        let payload = self.transport.send(request).await.map_err(|e| {
            warn!(error = %e, "app access token request failed");
            LarkError::UpstreamAuth {
                payload: e.into_payload(),
            }
        })?;

        match extract_token(&payload) {
            Some(token) => {
                debug!(app_id = %credentials.app_id, "obtained app access token");
                Ok(BearerCredential(token))
            }
            None => {
                warn!(%payload, "app access token rejected by upstream");
                Err(LarkError::UpstreamAuth { payload })
            }
        }
    }
}

fn extract_token(payload: &Value) -> Option<String> {
    if !is_success(payload) {
        return None;
    }
    payload
        .get("app_access_token")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::lark::client::{HttpMethod, TransportError};
    use crate::services::lark::testutil::ScriptedTransport;

    fn provider(transport: &Arc<ScriptedTransport>) -> TokenProvider {
        TokenProvider::new(
            transport.clone(),
            Some("cli_test".into()),
            Some("secret".into()),
        )
    }

    #[tokio::test]
    async fn returns_token_and_posts_credentials() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push(
            paths::APP_ACCESS_TOKEN,
            json!({ "code": 0, "msg": "ok", "app_access_token": "a-123", "expire": 7200 }),
        );

        let token = provider(&transport).get_access_token().await.unwrap();
        assert_eq!(token.secret(), "a-123");

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, HttpMethod::Post);
        assert_eq!(requests[0].bearer, None);
        assert_eq!(
            requests[0].body,
            Some(json!({ "app_id": "cli_test", "app_secret": "secret" }))
        );
    }

    #[tokio::test]
    async fn every_call_hits_upstream() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push(paths::APP_ACCESS_TOKEN, json!({ "code": 0, "app_access_token": "a" }));
        transport.push(paths::APP_ACCESS_TOKEN, json!({ "code": 0, "app_access_token": "b" }));

        let p = provider(&transport);
        assert_eq!(p.get_access_token().await.unwrap().secret(), "a");
        assert_eq!(p.get_access_token().await.unwrap().secret(), "b");
        assert_eq!(transport.calls(paths::APP_ACCESS_TOKEN), 2);
    }

    #[tokio::test]
    async fn missing_identity_fails_before_any_request() {
        let transport = Arc::new(ScriptedTransport::new());

        let no_id = TokenProvider::new(transport.clone(), None, Some("secret".into()));
        assert!(matches!(
            no_id.get_access_token().await,
            Err(LarkError::Configuration("LARK_APP_ID"))
        ));

        let blank_secret = TokenProvider::new(transport.clone(), Some("cli".into()), Some("  ".into()));
        assert!(matches!(
            blank_secret.get_access_token().await,
            Err(LarkError::Configuration("LARK_APP_SECRET"))
        ));

        assert_eq!(transport.total_calls(), 0);
    }

    #[tokio::test]
    async fn non_zero_code_carries_raw_payload() {
        let transport = Arc::new(ScriptedTransport::new());
        let rejected = json!({ "code": 99991663, "msg": "app access token invalid" });
        transport.push(paths::APP_ACCESS_TOKEN, rejected.clone());

        match provider(&transport).get_access_token().await {
            Err(LarkError::UpstreamAuth { payload }) => assert_eq!(payload, rejected),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn transport_timeout_is_an_auth_failure() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_err(paths::APP_ACCESS_TOKEN, TransportError::Timeout);

        let err = provider(&transport).get_access_token().await.unwrap_err();
        assert!(matches!(err, LarkError::UpstreamAuth { .. }));
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn success_code_without_token_is_rejected() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push(paths::APP_ACCESS_TOKEN, json!({ "code": 0, "app_access_token": "" }));

        assert!(matches!(
            provider(&transport).get_access_token().await,
            Err(LarkError::UpstreamAuth { .. })
        ));
    }

    #[test]
    fn credentials_debug_hides_secret() {
        let creds = AppCredentials::from_parts(Some("cli"), Some("s3cr3t")).unwrap();
        assert!(!format!("{creds:?}").contains("s3cr3t"));
    }
}
