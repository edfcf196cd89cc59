//! Basic authorizer step definitions.

use base64::prelude::*;
use catalog_import::auth::{AuthorizerResponse, BasicAuthorizer, Effect, TokenAuthorizerEvent};
use catalog_import::config::AuthConfig;
use cucumber::{given, then, when, World};

const METHOD_ARN: &str = "arn:aws:execute-api:eu-west-1:000000000000:api/dev/GET/import";

/// Test context for authorizer scenarios.
#[derive(Debug, World)]
#[world(init = Self::new)]
pub struct AuthorizerWorld {
    config: AuthConfig,
    response: Option<AuthorizerResponse>,
}

impl AuthorizerWorld {
    fn new() -> Self {
        Self {
            config: AuthConfig::default(),
            response: None,
        }
    }

    fn send(&mut self, header: Option<&str>) {
        let authorizer = BasicAuthorizer::new(self.config.clone());
        self.response = Some(authorizer.authorize(&TokenAuthorizerEvent::new(header, METHOD_ARN)));
    }

    fn response(&self) -> &AuthorizerResponse {
        self.response.as_ref().expect("no request sent")
    }
}

#[given(expr = "the authorizer expects username {string} and password {string}")]
async fn given_credentials(world: &mut AuthorizerWorld, username: String, password: String) {
    world.config = AuthConfig::new(username, password);
}

#[given("the authorizer has no credentials configured")]
async fn given_unconfigured(world: &mut AuthorizerWorld) {
    world.config = AuthConfig::default();
}

#[when(expr = "a request arrives with basic credentials {string}")]
async fn when_basic(world: &mut AuthorizerWorld, credentials: String) {
    let header = format!("Basic {}", BASE64_STANDARD.encode(credentials));
    world.send(Some(header.as_str()));
}

#[when(expr = "a request arrives with header {string}")]
async fn when_header(world: &mut AuthorizerWorld, header: String) {
    world.send(Some(header.as_str()));
}

#[when("a request arrives without a header")]
async fn when_no_header(world: &mut AuthorizerWorld) {
    world.send(None);
}

#[then("the request is allowed")]
async fn then_allowed(world: &mut AuthorizerWorld) {
    assert_eq!(world.response().effect(), Effect::Allow);
    assert_eq!(world.response().policy_document.statement[0].resource, METHOD_ARN);
}

#[then(expr = "the context username is {string}")]
async fn then_username(world: &mut AuthorizerWorld, username: String) {
    assert_eq!(world.response().context["username"], username.as_str());
}

#[then(expr = "the request is denied with {string} and status {int}")]
async fn then_denied(world: &mut AuthorizerWorld, reason: String, status: u16) {
    let response = world.response();
    assert_eq!(response.effect(), Effect::Deny);
    assert_eq!(response.context["error"], reason.as_str());
    assert_eq!(response.context["statusCode"], status);
}
