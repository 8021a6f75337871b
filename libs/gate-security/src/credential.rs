//! Transport-level credentials.
//!
//! Extraction is pure: a `Credential` is pulled out of the inbound request
//! without interpreting it. Verification (password checks, certificate
//! mapping) belongs to the authentication plugin behind the gate.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use secrecy::SecretString;
use thiserror::Error;

/// Subject identifier recorded in audit entries when no identity could be
/// recovered from the request.
pub const UNIDENTIFIED_SUBJECT: &str = "unidentified";

/// Authentication scheme, selected by configuration at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthScheme {
    /// TLS client-certificate authentication.
    CertUserDb,
    /// HTTP Basic (uid/password) authentication.
    BasicAuth,
}

impl AuthScheme {
    /// Stable scheme identifier used in audit records and plugin lookups.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AuthScheme::CertUserDb => "certUserDBAuthMgr",
            AuthScheme::BasicAuth => "passwdUserDBAuthMgr",
        }
    }
}

impl std::fmt::Display for AuthScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One certificate of the peer chain as handed over by the TLS front.
///
/// The front terminates TLS and has already validated the chain; it forwards
/// the raw DER together with the subject DN it extracted. This layer never
/// parses DER itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerCertificate {
    pub der: Vec<u8>,
    pub subject_dn: String,
}

/// Errors from credential extraction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialError {
    /// Certificate scheme: the transport presented no peer chain.
    #[error("no client certificate presented")]
    NoCredential,

    /// Basic scheme: the `Authorization` header is missing or unparsable.
    #[error("malformed authorization header")]
    MalformedCredential,
}

/// An opaque credential bag, one per request, never persisted.
#[derive(Debug, Clone)]
pub enum Credential {
    /// Peer certificate chain, leaf first.
    Certificate { chain: Vec<PeerCertificate> },
    /// Uid and password from a Basic `Authorization` header.
    Basic { uid: String, password: SecretString },
}

impl Credential {
    /// Build a certificate credential from the transport's peer chain.
    ///
    /// # Errors
    ///
    /// `NoCredential` if the chain is absent or empty.
    pub fn from_peer_chain(chain: Vec<PeerCertificate>) -> Result<Self, CredentialError> {
        if chain.is_empty() {
            return Err(CredentialError::NoCredential);
        }
        Ok(Credential::Certificate { chain })
    }

    /// Parse a Basic `Authorization` header value.
    ///
    /// The base64 payload is the segment after the last space; it decodes to
    /// `uid:password`, split on the first `:`.
    ///
    /// # Errors
    ///
    /// `MalformedCredential` if the header is absent, not base64, not UTF-8,
    /// or carries no `:` separator.
    pub fn from_basic_header(header: Option<&str>) -> Result<Self, CredentialError> {
        let header = header.ok_or(CredentialError::MalformedCredential)?;
        let payload = header.rsplit(' ').next().unwrap_or(header);
        let decoded = BASE64
            .decode(payload.trim())
            .map_err(|_| CredentialError::MalformedCredential)?;
        let decoded = String::from_utf8(decoded).map_err(|_| CredentialError::MalformedCredential)?;
        let (uid, password) = decoded
            .split_once(':')
            .ok_or(CredentialError::MalformedCredential)?;
        Ok(Credential::Basic {
            uid: uid.to_owned(),
            password: SecretString::from(password.to_owned()),
        })
    }

    /// The scheme this credential belongs to.
    #[must_use]
    pub fn scheme(&self) -> AuthScheme {
        match self {
            Credential::Certificate { .. } => AuthScheme::CertUserDb,
            Credential::Basic { .. } => AuthScheme::BasicAuth,
        }
    }

    /// Best-known subject identifier for audit tagging: the trimmed leaf
    /// subject DN or the trimmed uid, else [`UNIDENTIFIED_SUBJECT`].
    #[must_use]
    pub fn partial_subject(&self) -> &str {
        let subject = match self {
            Credential::Certificate { chain } => {
                chain.first().map_or("", |c| c.subject_dn.trim())
            }
            Credential::Basic { uid, .. } => uid.trim(),
        };
        if subject.is_empty() {
            UNIDENTIFIED_SUBJECT
        } else {
            subject
        }
    }
}
