#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Pipeline tests: authenticate, authorize, dispatch, and the audit records
//! each path must emit.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use admin_gate::{
    AdminRequest, AuditLogger, DispatchOutcome, Gate, GateConfig, OperationEntry,
    OperationHandler, OperationTable, OpType, params,
};
use admin_gate_sdk::models::{Group, User};
use admin_gate_sdk::{AuditEventKind, AuditOutcome, AuditTrail, AuthnError, AuthnPluginClient};
use async_trait::async_trait;
use basic_acl_plugin::{AclRule, BasicAclPluginConfig};
use gate_security::{
    AuthScheme, AuthToken, Credential, OperationResult, PeerCertificate, SessionContext,
};
use mem_directory_plugin::MemDirectory;
use secrecy::SecretString;
use static_authn_plugin::{CertMapping, StaticAuthnPluginConfig, UserEntry};

const ADMIN_AUTH: &str = "Basic YWRtaW46bGV0bWVpbg==";
const BAD_AUTH: &str = "Basic YWRtaW46d3JvbmdwYXNz";

/// Handler double that counts invocations.
#[derive(Default)]
struct CountingHandler {
    calls: AtomicUsize,
}

#[async_trait]
impl OperationHandler for CountingHandler {
    async fn handle(&self, session: &SessionContext, _req: &AdminRequest) -> OperationResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        OperationResult::success()
            .with_param("subject", session.user_id())
            .with_param("fullName", &session.user().full_name)
    }
}

/// Verifier double that accepts any credential but binds no identity claim.
struct ClaimlessVerifier;

#[async_trait]
impl AuthnPluginClient for ClaimlessVerifier {
    async fn verify(&self, _credential: &Credential) -> Result<AuthToken, AuthnError> {
        Ok(AuthToken::new())
    }
}

struct Harness {
    gate: Gate,
    table: OperationTable,
    handler: Arc<CountingHandler>,
    trail: Arc<AuditTrail>,
}

fn assemble(config: GateConfig, authn: Arc<dyn AuthnPluginClient>) -> Harness {
    let directory = Arc::new(MemDirectory::new());
    directory.seed(
        [
            User {
                full_name: "Certificate Administrator".to_owned(),
                ..User::named("admin")
            },
            User::named("mallory"),
        ],
        [Group {
            name: "Administrators".to_owned(),
            description: String::new(),
            members: vec!["admin".to_owned()],
        }],
    );

    let authz = Arc::new(basic_acl_plugin::Service::new(
        BasicAclPluginConfig {
            rules: vec![AclRule {
                resource: "certServer.test".to_owned(),
                operation: "read".to_owned(),
                groups: vec!["Administrators".to_owned()],
            }],
        },
        directory.clone(),
    ));

    let trail = Arc::new(AuditTrail::new());
    let audit = AuditLogger::new(trail.clone());

    let handler = Arc::new(CountingHandler::default());
    let table = OperationTable::new("test").operation(
        "status",
        OpType::Read,
        OperationEntry::new("certServer.test", "read", false, handler.clone()),
    );

    let gate = Gate::new(authn, authz, directory, audit, config);

    Harness {
        gate,
        table,
        handler,
        trail,
    }
}

fn harness_with(config: GateConfig) -> Harness {
    let authn = Arc::new(static_authn_plugin::Service::from_config(
        &StaticAuthnPluginConfig {
            users: vec![
                UserEntry {
                    uid: "admin".to_owned(),
                    password: SecretString::from("letmein".to_owned()),
                },
                UserEntry {
                    uid: "mallory".to_owned(),
                    password: SecretString::from("letmein".to_owned()),
                },
                UserEntry {
                    uid: "phantom".to_owned(),
                    password: SecretString::from("letmein".to_owned()),
                },
            ],
            cert_mappings: vec![CertMapping {
                subject_dn: "CN=Admin,O=Example".to_owned(),
                uid: "admin".to_owned(),
            }],
        },
    ));
    assemble(config, authn)
}

fn harness() -> Harness {
    harness_with(GateConfig::default())
}

fn request(auth: &str) -> AdminRequest {
    AdminRequest::new()
        .with_authorization(auth)
        .with_param(params::OP_TYPE, "OP_READ")
        .with_param(params::OP_SCOPE, "status")
}

fn kinds(trail: &AuditTrail) -> Vec<AuditEventKind> {
    trail.records().iter().map(|r| r.kind()).collect()
}

#[tokio::test]
async fn authorized_request_runs_the_handler_and_audits_in_order() {
    let h = harness();
    let outcome = h.table.dispatch(&h.gate, &request(ADMIN_AUTH)).await;

    let DispatchOutcome::Completed(result) = outcome else {
        panic!("expected a completed dispatch");
    };
    assert_eq!(result.param("subject"), Some("admin"));
    // The resolved directory record rides along in the session; the handler
    // reads it without another directory round trip.
    assert_eq!(result.param("fullName"), Some("Certificate Administrator"));
    assert_eq!(h.handler.calls.load(Ordering::SeqCst), 1);

    assert_eq!(
        kinds(&h.trail),
        vec![
            AuditEventKind::AuthSuccess,
            AuditEventKind::AuthzSuccess,
            AuditEventKind::RoleAssume,
        ]
    );
    let role = h.trail.last().unwrap();
    assert_eq!(role.outcome(), AuditOutcome::Success);
    assert_eq!(role.param("Groups"), Some("Administrators"));
}

#[tokio::test]
async fn wrong_password_is_rejected_before_authorization() {
    let h = harness();
    let outcome = h.table.dispatch(&h.gate, &request(BAD_AUTH)).await;

    assert!(matches!(outcome, DispatchOutcome::Unauthenticated(_)));
    assert_eq!(h.handler.calls.load(Ordering::SeqCst), 0);
    assert_eq!(kinds(&h.trail), vec![AuditEventKind::AuthFail]);
    assert_eq!(h.trail.last().unwrap().param("AuthMgr"), Some("passwdUserDBAuthMgr"));
}

#[tokio::test]
async fn missing_credential_audits_the_unidentified_subject() {
    let h = harness();
    let req = AdminRequest::new()
        .with_param(params::OP_TYPE, "OP_READ")
        .with_param(params::OP_SCOPE, "status");
    let outcome = h.table.dispatch(&h.gate, &req).await;

    assert!(matches!(outcome, DispatchOutcome::Unauthenticated(_)));
    let record = h.trail.last().unwrap();
    assert_eq!(record.kind(), AuditEventKind::AuthFail);
    assert_eq!(record.subject(), "unidentified");
}

#[tokio::test]
async fn claimless_token_is_an_authentication_failure() {
    // A verifier that accepts the credential but omits the user-id claim
    // must not produce a session.
    let h = assemble(GateConfig::default(), Arc::new(ClaimlessVerifier));
    let outcome = h.table.dispatch(&h.gate, &request(ADMIN_AUTH)).await;

    assert!(matches!(outcome, DispatchOutcome::Unauthenticated(_)));
    assert_eq!(h.handler.calls.load(Ordering::SeqCst), 0);
    assert_eq!(kinds(&h.trail), vec![AuditEventKind::AuthFail]);
    assert_eq!(h.trail.last().unwrap().subject(), "admin");
}

#[tokio::test]
async fn verified_but_undirectoried_user_fails_authentication() {
    // "phantom" has a password entry but no directory record.
    let h = harness();
    let outcome = h
        .table
        .dispatch(&h.gate, &request("Basic cGhhbnRvbTpsZXRtZWlu"))
        .await;

    assert!(matches!(outcome, DispatchOutcome::Unauthenticated(_)));
    assert_eq!(kinds(&h.trail), vec![AuditEventKind::AuthFail]);
    assert_eq!(h.trail.last().unwrap().subject(), "phantom");
}

#[tokio::test]
async fn denied_subject_never_reaches_the_handler() {
    // mallory authenticates but is in no granted group.
    let h = harness();
    let outcome = h
        .table
        .dispatch(&h.gate, &request("Basic bWFsbG9yeTpsZXRtZWlu"))
        .await;

    let DispatchOutcome::Completed(result) = outcome else {
        panic!("a denial is a completed dispatch with an embedded error");
    };
    assert!(result.message().is_some());
    assert_eq!(h.handler.calls.load(Ordering::SeqCst), 0);

    assert_eq!(
        kinds(&h.trail),
        vec![
            AuditEventKind::AuthSuccess,
            AuditEventKind::AuthzFail,
            AuditEventKind::RoleAssume,
        ]
    );
    let role = h.trail.last().unwrap();
    assert_eq!(role.outcome(), AuditOutcome::Failure);
    assert_eq!(role.param("Groups"), Some(""));
}

#[tokio::test]
async fn certificate_scheme_maps_the_leaf_subject() {
    let h = harness_with(GateConfig {
        auth_scheme: AuthScheme::CertUserDb,
        ..GateConfig::default()
    });
    let req = AdminRequest::new()
        .with_peer_chain(vec![PeerCertificate {
            der: vec![0x30],
            subject_dn: "CN=Admin,O=Example".to_owned(),
        }])
        .with_param(params::OP_TYPE, "OP_READ")
        .with_param(params::OP_SCOPE, "status");

    let outcome = h.table.dispatch(&h.gate, &req).await;
    let DispatchOutcome::Completed(result) = outcome else {
        panic!("expected a completed dispatch");
    };
    assert_eq!(result.param("subject"), Some("admin"));
    assert_eq!(
        h.trail.records()[0].param("AuthMgr"),
        Some("certUserDBAuthMgr")
    );
}

#[tokio::test]
async fn unknown_scope_or_op_type_is_a_structured_error() {
    let h = harness();

    let req = AdminRequest::new()
        .with_authorization(ADMIN_AUTH)
        .with_param(params::OP_TYPE, "OP_READ");
    let outcome = h.table.dispatch(&h.gate, &req).await;
    let DispatchOutcome::Completed(result) = outcome else {
        panic!("expected a completed dispatch");
    };
    assert!(result.message().unwrap().contains("missing operation"));

    // Duplicate routing parameters keep the first occurrence.
    let req = request(ADMIN_AUTH).with_param(params::OP_SCOPE, "ignored");
    let outcome = h.table.dispatch(&h.gate, &req).await;
    assert!(matches!(outcome, DispatchOutcome::Completed(_)));

    // Unregistered scope.
    let req = AdminRequest::new()
        .with_authorization(ADMIN_AUTH)
        .with_param(params::OP_TYPE, "OP_READ")
        .with_param(params::OP_SCOPE, "nonesuch");
    let outcome = h.table.dispatch(&h.gate, &req).await;
    let DispatchOutcome::Completed(result) = outcome else {
        panic!("expected a completed dispatch");
    };
    assert!(result.message().unwrap().contains("unknown operation"));
    assert_eq!(h.handler.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn every_terminal_path_audits_exactly_once_per_dispatch() {
    let h = harness();

    h.table.dispatch(&h.gate, &request(ADMIN_AUTH)).await;
    let after_success = h.trail.records().len();
    assert_eq!(after_success, 3);

    h.table.dispatch(&h.gate, &request(BAD_AUTH)).await;
    assert_eq!(h.trail.records().len(), after_success + 1);

    h.table
        .dispatch(&h.gate, &request("Basic bWFsbG9yeTpsZXRtZWlu"))
        .await;
    assert_eq!(h.trail.records().len(), after_success + 4);
}
