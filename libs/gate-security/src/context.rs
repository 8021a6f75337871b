//! Request-scoped session state.
//!
//! `SessionContext` is an explicit value passed from the gate to the
//! operation handler. It is created after authentication succeeds, discarded
//! at the end of the request, and never shared across requests: every request
//! re-authenticates. Its token is set if and only if authentication
//! succeeded, which the builder enforces by construction.

use crate::access::AuthorizationGrant;
use crate::identity::User;
use crate::token::AuthToken;

/// Fallback locale when the client sends no usable language header.
pub const DEFAULT_LOCALE: &str = "en-US";

/// Resolve the session locale from an `Accept-Language` header value.
///
/// Takes the first (highest-precedence) language tag, falling back to
/// [`DEFAULT_LOCALE`].
#[must_use]
pub fn resolve_locale(accept_language: Option<&str>) -> String {
    accept_language
        .and_then(|v| v.split(',').next())
        .map(|tag| tag.split(';').next().unwrap_or(tag).trim())
        .filter(|tag| !tag.is_empty())
        .map_or_else(|| DEFAULT_LOCALE.to_owned(), str::to_owned)
}

/// Per-request session state bound by the gate.
#[derive(Debug, Clone)]
pub struct SessionContext {
    token: AuthToken,
    user: User,
    locale: String,
    grant: Option<AuthorizationGrant>,
}

impl SessionContext {
    #[must_use]
    pub fn builder() -> SessionContextBuilder {
        SessionContextBuilder::default()
    }

    #[must_use]
    pub fn token(&self) -> &AuthToken {
        &self.token
    }

    /// The resolved directory record of the authenticated caller.
    #[must_use]
    pub fn user(&self) -> &User {
        &self.user
    }

    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user.uid
    }

    #[must_use]
    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// The current authorization grant, if `authorize` has run for this
    /// request.
    #[must_use]
    pub fn grant(&self) -> Option<&AuthorizationGrant> {
        self.grant.as_ref()
    }

    pub fn bind_grant(&mut self, grant: AuthorizationGrant) {
        self.grant = Some(grant);
    }
}

#[derive(Default)]
pub struct SessionContextBuilder {
    token: Option<AuthToken>,
    user: Option<User>,
    locale: Option<String>,
}

impl SessionContextBuilder {
    #[must_use]
    pub fn token(mut self, token: AuthToken) -> Self {
        self.token = Some(token);
        self
    }

    /// Bind the caller's resolved directory record.
    #[must_use]
    pub fn user(mut self, user: User) -> Self {
        self.user = Some(user);
        self
    }

    #[must_use]
    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    /// Build the session.
    ///
    /// Returns `None` unless both the token and the user record were bound;
    /// a session without an authenticated identity must not exist.
    #[must_use]
    pub fn build(self) -> Option<SessionContext> {
        Some(SessionContext {
            token: self.token?,
            user: self.user?,
            locale: self.locale.unwrap_or_else(|| DEFAULT_LOCALE.to_owned()),
            grant: None,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::{DEFAULT_LOCALE, SessionContext, resolve_locale};
    use crate::identity::User;
    use crate::token::{AuthToken, claims};

    #[test]
    fn locale_takes_first_tag_and_strips_quality() {
        assert_eq!(resolve_locale(Some("de-DE;q=0.9, en;q=0.8")), "de-DE");
        assert_eq!(resolve_locale(Some("fr")), "fr");
    }

    #[test]
    fn locale_falls_back_to_default() {
        assert_eq!(resolve_locale(None), DEFAULT_LOCALE);
        assert_eq!(resolve_locale(Some("  ")), DEFAULT_LOCALE);
    }

    #[test]
    fn session_requires_token_and_user_record() {
        let token = AuthToken::new().with_claim(claims::UID, "admin");
        let user = User {
            full_name: "Administrator".to_owned(),
            ..User::named("admin")
        };

        assert!(SessionContext::builder().token(token.clone()).build().is_none());
        assert!(SessionContext::builder().user(user.clone()).build().is_none());

        let session = SessionContext::builder()
            .token(token)
            .user(user)
            .build()
            .unwrap();
        assert_eq!(session.user_id(), "admin");
        assert_eq!(session.user().full_name, "Administrator");
        assert_eq!(session.locale(), DEFAULT_LOCALE);
        assert!(session.grant().is_none());
    }
}
