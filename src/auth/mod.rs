//! Basic-credential request authorizer.
//!
//! Takes an API Gateway token-authorizer event carrying
//! `Basic base64(username:password)` and returns an IAM policy allowing or
//! denying the invocation. Every path that is not an exact credential match
//! ends in `Deny`; internal failures included.

use std::collections::BTreeMap;
use std::time::Duration;

use base64::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::AuthConfig;

pub const POLICY_VERSION: &str = "2012-10-17";
pub const INVOKE_ACTION: &str = "execute-api:Invoke";

const PRINCIPAL_USER: &str = "user";
const PRINCIPAL_UNAUTHORIZED: &str = "unauthorized";

/// Why a request was denied.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Authorization header is missing")]
    MissingToken,

    #[error("Unsupported authorization scheme")]
    UnsupportedScheme,

    #[error("Malformed credential: {0}")]
    MalformedToken(&'static str),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Authorizer credentials are not configured")]
    NotConfigured,
}

impl AuthError {
    /// Context reason and HTTP status reported to the caller.
    fn reason(&self) -> (&'static str, u16) {
        match self {
            AuthError::MissingToken
            | AuthError::UnsupportedScheme
            | AuthError::MalformedToken(_) => ("Invalid token", 401),
            AuthError::InvalidCredentials => ("Invalid credentials", 403),
            AuthError::NotConfigured => ("Internal Server Error", 500),
        }
    }

    fn principal(&self) -> &'static str {
        match self {
            AuthError::NotConfigured => PRINCIPAL_UNAUTHORIZED,
            _ => PRINCIPAL_USER,
        }
    }
}

/// Inbound token-authorizer event.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenAuthorizerEvent {
    #[serde(rename = "type", default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub authorization_token: Option<String>,
    #[serde(default)]
    pub method_arn: String,
}

impl TokenAuthorizerEvent {
    pub fn new(token: Option<&str>, method_arn: impl Into<String>) -> Self {
        Self {
            event_type: Some("TOKEN".to_string()),
            authorization_token: token.map(str::to_string),
            method_arn: method_arn.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Effect {
    Allow,
    Deny,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Statement {
    pub action: String,
    pub effect: Effect,
    pub resource: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    pub version: String,
    pub statement: Vec<Statement>,
}

/// Policy returned to API Gateway.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizerResponse {
    pub principal_id: String,
    pub policy_document: PolicyDocument,
    pub context: BTreeMap<String, Value>,
}

impl AuthorizerResponse {
    fn new(
        principal_id: &str,
        effect: Effect,
        resource: &str,
        context: BTreeMap<String, Value>,
    ) -> Self {
        Self {
            principal_id: principal_id.to_string(),
            policy_document: PolicyDocument {
                version: POLICY_VERSION.to_string(),
                statement: vec![Statement {
                    action: INVOKE_ACTION.to_string(),
                    effect,
                    resource: resource.to_string(),
                }],
            },
            context,
        }
    }

    pub fn effect(&self) -> Effect {
        self.policy_document
            .statement
            .first()
            .map_or(Effect::Deny, |s| s.effect)
    }

    pub fn is_allowed(&self) -> bool {
        self.effect() == Effect::Allow
    }
}

/// Decoded `username:password` pair.
#[derive(Debug, PartialEq, Eq)]
struct Credentials {
    username: String,
    password: String,
}

/// Parse `Basic <base64(username:password)>`. The password is everything
/// after the first `:`.
fn parse_basic(header: &str) -> Result<Credentials, AuthError> {
    let (scheme, token) = header.split_once(' ').ok_or(AuthError::UnsupportedScheme)?;
    if scheme != "Basic" {
        return Err(AuthError::UnsupportedScheme);
    }
    if token.is_empty() {
        return Err(AuthError::MalformedToken("empty token"));
    }

    let decoded = BASE64_STANDARD
        .decode(token)
        .map_err(|_| AuthError::MalformedToken("not base64"))?;
    let decoded = String::from_utf8(decoded).map_err(|_| AuthError::MalformedToken("not UTF-8"))?;
    let (username, password) = decoded
        .split_once(':')
        .ok_or(AuthError::MalformedToken("missing ':' separator"))?;

    Ok(Credentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}

/// Compares basic credentials against the configured pair.
pub struct BasicAuthorizer {
    config: AuthConfig,
}

impl BasicAuthorizer {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// How long API Gateway may cache a decision.
    pub fn result_ttl(&self) -> Duration {
        Duration::from_secs(u64::from(self.config.result_ttl_secs))
    }

    pub fn authorize(&self, event: &TokenAuthorizerEvent) -> AuthorizerResponse {
        let resource = event.method_arn.as_str();

        match self.evaluate(event) {
            Ok(username) => {
                info!(username = %username, "Authorized");
                let context = BTreeMap::from([("username".to_string(), Value::from(username))]);
                AuthorizerResponse::new(PRINCIPAL_USER, Effect::Allow, resource, context)
            }
            Err(e) => {
                let (reason, status) = e.reason();
                warn!(error = %e, status, "Denied");
                let context = BTreeMap::from([
                    ("error".to_string(), Value::from(reason)),
                    ("statusCode".to_string(), Value::from(status)),
                ]);
                AuthorizerResponse::new(e.principal(), Effect::Deny, resource, context)
            }
        }
    }

    fn evaluate(&self, event: &TokenAuthorizerEvent) -> Result<String, AuthError> {
        if !self.config.is_configured() {
            return Err(AuthError::NotConfigured);
        }

        let header = event
            .authorization_token
            .as_deref()
            .filter(|h| !h.is_empty())
            .ok_or(AuthError::MissingToken)?;
        let credentials = parse_basic(header)?;

        let username_ok = credentials
            .username
            .as_bytes()
            .ct_eq(self.config.username.as_bytes());
        let password_ok = credentials
            .password
            .as_bytes()
            .ct_eq(self.config.password.as_bytes());

        if bool::from(username_ok & password_ok) {
            Ok(credentials.username)
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }
}
