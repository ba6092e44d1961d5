//! Login operation.

use keel_core::pipeline::{BoxFuture, Request, RequestHandler, RuleSet};
use keel_core::{Fault, TokenGrant, TokenIssuer};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Login request carrying the caller's credentials.
pub struct LoginRequest {
    /// Submitted user name.
    pub user_name: String,
    /// Submitted password.
    pub password: String,
}

impl LoginRequest {
    /// Builds a login request.
    #[must_use]
    pub fn new(user_name: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            password: password.into(),
        }
    }
}

impl Request for LoginRequest {
    type Response = TokenGrant;
    const NAME: &'static str = "LoginRequest";
}

/// Structural rules for [`LoginRequest`].
#[must_use]
pub fn login_rules() -> RuleSet<LoginRequest> {
    RuleSet::new()
        .rule(
            "user_name",
            "user_name_should_not_be_empty",
            |r: &LoginRequest| !r.user_name.is_empty(),
        )
        .rule(
            "password",
            "password_should_not_be_empty",
            |r: &LoginRequest| !r.password.is_empty(),
        )
}

/// Terminal handler issuing a token grant for verified credentials.
pub struct LoginHandler {
    issuer: Arc<TokenIssuer>,
}

impl LoginHandler {
    /// Builds the handler over the configured issuer.
    #[must_use]
    pub fn new(issuer: Arc<TokenIssuer>) -> Self {
        Self { issuer }
    }
}

impl RequestHandler<LoginRequest> for LoginHandler {
    fn handle<'a>(
        &'a self,
        request: LoginRequest,
        _cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<TokenGrant, Fault>> {
        Box::pin(async move {
            // Credential verification belongs to the deployment's identity
            // backend; the backbone mints a grant for the submitted name.
            self.issuer.issue(Uuid::new_v4(), &request.user_name)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler() -> LoginHandler {
        LoginHandler::new(Arc::new(TokenIssuer::new(
            "0123456789abcdef0123456789abcdef",
            "keel",
            45,
        )))
    }

    #[tokio::test]
    async fn login_issues_a_bearer_grant() {
        let cancel = CancellationToken::new();
        let grant = handler()
            .handle(LoginRequest::new("alice", "secret"), &cancel)
            .await
            .unwrap();

        assert_eq!(grant.token_type, "Bearer");
        assert_eq!(grant.expire_in, 45);
        assert!(!grant.token.is_empty());
    }

    #[test]
    fn empty_credentials_violate_both_fields() {
        let errors = login_rules().check(&LoginRequest::new("", ""));
        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors.get("user_name"),
            Some("user_name_should_not_be_empty")
        );
        assert_eq!(errors.get("password"), Some("password_should_not_be_empty"));
    }

    #[test]
    fn present_credentials_pass_the_rules() {
        let errors = login_rules().check(&LoginRequest::new("alice", "secret"));
        assert!(errors.is_empty());
    }
}
