//! Configuration for the static authentication plugin.

use secrecy::SecretString;
use serde::Deserialize;

/// Plugin configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StaticAuthnPluginConfig {
    /// Uid/password entries for the Basic scheme.
    pub users: Vec<UserEntry>,

    /// Subject-DN to uid mappings for the certificate scheme.
    pub cert_mappings: Vec<CertMapping>,
}

/// One Basic-scheme account.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserEntry {
    pub uid: String,
    /// Wrapped so `Debug` redacts the value.
    pub password: SecretString,
}

/// Maps a certificate subject DN to a directory uid.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CertMapping {
    pub subject_dn: String,
    pub uid: String,
}
