//! The request gate: identity resolution and the authorization decision.

use std::sync::Arc;

use admin_gate_sdk::{AuditOutcome, AuthnPluginClient, AuthzPluginClient, DirectoryClient};
use gate_security::{
    AuthorizationGrant, DenyReason, SessionContext, UNIDENTIFIED_SUBJECT, resolve_locale,
};
use tracing::instrument;

use crate::config::GateConfig;
use crate::domain::audit::AuditLogger;
use crate::domain::error::GateError;
use crate::domain::request::AdminRequest;

/// The per-request gate.
///
/// Every failure branch of [`Gate::authenticate`] writes exactly one
/// `AUTH_FAIL` record before returning; the success path writes exactly one
/// `AUTH_SUCCESS` after the session is bound. That symmetry is the core
/// contract of this type — no path may exit silently.
pub struct Gate {
    authn: Arc<dyn AuthnPluginClient>,
    authz: Arc<dyn AuthzPluginClient>,
    directory: Arc<dyn DirectoryClient>,
    audit: AuditLogger,
    config: GateConfig,
}

impl Gate {
    #[must_use]
    pub fn new(
        authn: Arc<dyn AuthnPluginClient>,
        authz: Arc<dyn AuthzPluginClient>,
        directory: Arc<dyn DirectoryClient>,
        audit: AuditLogger,
        config: GateConfig,
    ) -> Self {
        Self {
            authn,
            authz,
            directory,
            audit,
            config,
        }
    }

    #[must_use]
    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    #[must_use]
    pub fn config(&self) -> GateConfig {
        self.config
    }

    /// Resolve the request's credential into a bound session. The caller's
    /// directory record travels with the session, so handlers never re-query
    /// the directory for their own identity.
    ///
    /// # Errors
    ///
    /// `AuthenticationFailed` on every failure branch: missing/malformed
    /// credential, verification rejection, a token without a user-id claim,
    /// or a failed user lookup. Each branch audits first.
    #[instrument(skip_all, fields(scheme = %self.config.auth_scheme))]
    pub async fn authenticate(&self, req: &AdminRequest) -> Result<SessionContext, GateError> {
        let scheme = self.config.auth_scheme;

        let credential = match req.credential(scheme) {
            Ok(credential) => credential,
            Err(e) => {
                tracing::debug!(error = %e, "credential extraction failed");
                self.audit.auth_fail(UNIDENTIFIED_SUBJECT, scheme);
                return Err(GateError::AuthenticationFailed);
            }
        };
        let subject = credential.partial_subject().to_owned();

        let token = match self.authn.verify(&credential).await {
            Ok(token) => token,
            Err(e) => {
                tracing::debug!(error = %e, "credential verification rejected");
                self.audit.auth_fail(&subject, scheme);
                return Err(GateError::AuthenticationFailed);
            }
        };

        // A token without an identity claim is an authentication failure,
        // not a success.
        let Some(uid) = token.user_id().map(str::to_owned) else {
            tracing::warn!("verifier returned a token without a user-id claim");
            self.audit.auth_fail(&subject, scheme);
            return Err(GateError::AuthenticationFailed);
        };

        let user = match self.directory.get_user(&uid).await {
            Ok(user) => user,
            Err(e) => {
                tracing::debug!(uid = %uid, error = %e, "user lookup failed");
                self.audit.auth_fail(uid.trim(), scheme);
                return Err(GateError::AuthenticationFailed);
            }
        };

        let locale = resolve_locale(req.accept_language());
        let Some(session) = SessionContext::builder()
            .token(token)
            .user(user)
            .locale(locale)
            .build()
        else {
            self.audit.auth_fail(&uid, scheme);
            return Err(GateError::AuthenticationFailed);
        };

        self.audit.auth_success(session.user_id(), scheme);
        Ok(session)
    }

    /// Decide whether the session's identity may perform
    /// `(resource, operation)`.
    ///
    /// Emits `AUTHZ_SUCCESS` + `ROLE_ASSUME` success (with the subject's
    /// group set) on grant, `AUTHZ_FAIL` + `ROLE_ASSUME` failure on deny or
    /// evaluation error. Callers must treat `Err` as deny and must not run
    /// the mutation.
    ///
    /// # Errors
    ///
    /// The `DenyReason` from the policy backend.
    #[instrument(skip(self, session), fields(subject = %session.user_id(), resource, operation))]
    pub async fn authorize(
        &self,
        session: &mut SessionContext,
        resource: &str,
        operation: &str,
    ) -> Result<AuthorizationGrant, DenyReason> {
        let authz_mgr = self.config.authz_scheme.as_str();
        match self.authz.evaluate(session.token(), resource, operation).await {
            Ok(grant) => {
                let groups = self
                    .directory
                    .find_groups(session.user_id())
                    .await
                    .unwrap_or_default();
                self.audit.authz_success(
                    session.user_id(),
                    authz_mgr,
                    grant.resource(),
                    grant.operation(),
                );
                self.audit
                    .role_assume(session.user_id(), AuditOutcome::Success, &groups);
                session.bind_grant(grant.clone());
                Ok(grant)
            }
            Err(reason) => {
                tracing::debug!(reason = %reason, "authorization denied");
                self.audit
                    .authz_fail(session.user_id(), authz_mgr, resource, operation);
                self.audit
                    .role_assume(session.user_id(), AuditOutcome::Failure, &[]);
                Err(reason)
            }
        }
    }
}

impl std::fmt::Debug for Gate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gate")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
