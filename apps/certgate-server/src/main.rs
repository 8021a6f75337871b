//! CertGate administrative server.
//!
//! Wires the gate, the plugins, and the admin facilities together from a
//! JSON configuration file and serves the admin surface over HTTP. TLS
//! termination is expected in front of this process; the front forwards the
//! validated peer chain when certificate authentication is configured.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use admin_gate::{AuditLogger, Gate, GateConfig, TracingAuditSink, admin_router};
use admin_gate_sdk::models::{Group, User};
use anyhow::Context;
use basic_acl_plugin::BasicAclPluginConfig;
use clap::Parser;
use config_store::{CommitError, CommitSink, ConfigStore};
use log_admin::{ConfigParam, LogAdmin, LogPluginDescriptor, LogPluginRegistry};
use mem_directory_plugin::MemDirectory;
use serde::Deserialize;
use static_authn_plugin::StaticAuthnPluginConfig;
use usrgrp_admin::UsrGrpAdmin;

#[derive(Parser)]
#[command(name = "certgate-server", about = "CertGate administrative server")]
struct Cli {
    /// Path to the JSON server configuration.
    #[arg(long, default_value = "certgate.json")]
    config: PathBuf,

    /// Listen address of the admin surface.
    #[arg(long, default_value = "127.0.0.1:8443")]
    listen: SocketAddr,

    /// Persist committed configuration to this file (in-memory when absent).
    #[arg(long)]
    state: Option<PathBuf>,
}

/// Directory seed entry; certificates are bound at runtime, not seeded.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SeedUser {
    uid: String,
    fullname: String,
    email: String,
    phone: String,
    state: String,
}

impl SeedUser {
    fn into_user(self) -> User {
        User {
            uid: self.uid,
            full_name: self.fullname,
            email: self.email,
            phone: self.phone,
            state: self.state,
            certificates: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct DirectorySeed {
    users: Vec<SeedUser>,
    groups: Vec<Group>,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ServerConfig {
    gate: GateConfig,
    authn: StaticAuthnPluginConfig,
    acl: BasicAclPluginConfig,
    directory: DirectorySeed,
    /// Groups subject to multi-role enforcement.
    enforced_groups: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            gate: GateConfig::default(),
            authn: StaticAuthnPluginConfig::default(),
            acl: BasicAclPluginConfig::default(),
            directory: DirectorySeed::default(),
            enforced_groups: vec!["Administrators".to_owned(), "Auditors".to_owned()],
        }
    }
}

/// Commit sink writing the flattened tree as `key=value` lines.
struct FileSink {
    path: PathBuf,
}

impl CommitSink for FileSink {
    fn persist(&self, entries: &[(String, String)], create_backup: bool) -> Result<(), CommitError> {
        if create_backup && self.path.exists() {
            let backup = self.path.with_extension("bak");
            std::fs::copy(&self.path, &backup).map_err(|e| CommitError(e.to_string()))?;
        }
        let mut out = String::new();
        for (name, value) in entries {
            out.push_str(name);
            out.push('=');
            out.push_str(value);
            out.push('\n');
        }
        std::fs::write(&self.path, out).map_err(|e| CommitError(e.to_string()))
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

fn builtin_log_plugins(registry: &LogPluginRegistry) -> anyhow::Result<()> {
    let rolling = LogPluginDescriptor::new("RollingLogFile", "rolling-file")
        .with_param(param("fileName", "string;logs/system;target file path")?)
        .with_param(param("level", "integer;3;log verbosity")?)
        .with_param(param("maxFileSize", "integer;2000;rotation threshold in KB")?);
    anyhow::ensure!(registry.register_plugin(rolling), "duplicate builtin plugin");
    Ok(())
}

fn param(name: &str, spec: &str) -> anyhow::Result<ConfigParam> {
    ConfigParam::parse(name, spec).map_err(|e| anyhow::anyhow!(e))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let raw = std::fs::read_to_string(&cli.config)
        .with_context(|| format!("reading {}", cli.config.display()))?;
    let cfg: ServerConfig = serde_json::from_str(&raw).context("parsing server configuration")?;

    let directory = Arc::new(MemDirectory::new());
    directory.seed(
        cfg.directory.users.into_iter().map(SeedUser::into_user),
        cfg.directory.groups,
    );

    let authn = Arc::new(static_authn_plugin::Service::from_config(&cfg.authn));
    let authz = Arc::new(basic_acl_plugin::Service::new(cfg.acl, directory.clone()));
    let audit = AuditLogger::new(Arc::new(TracingAuditSink));

    let store = match &cli.state {
        Some(path) => ConfigStore::new(Arc::new(FileSink { path: path.clone() })),
        None => ConfigStore::in_memory(),
    };

    let registry = Arc::new(LogPluginRegistry::new());
    builtin_log_plugins(&registry)?;

    let log = Arc::new(LogAdmin::new(registry, store, audit.clone()));
    let usrgrp = Arc::new(UsrGrpAdmin::new(
        directory.clone(),
        audit.clone(),
        cfg.enforced_groups,
    ));

    let gate = Arc::new(Gate::new(authn, authz, directory, audit, cfg.gate));
    let app = admin_router(gate, vec![Arc::new(log.table()), Arc::new(usrgrp.table())]);

    let listener = tokio::net::TcpListener::bind(cli.listen)
        .await
        .with_context(|| format!("binding {}", cli.listen))?;
    tracing::info!(addr = %cli.listen, "admin surface listening");
    axum::serve(listener, app)
        .await
        .context("serving admin surface")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::ServerConfig;

    #[test]
    fn minimal_configuration_parses_with_defaults() {
        let cfg: ServerConfig = serde_json::from_str(
            r#"{
                "authn": {"users": [{"uid": "admin", "password": "letmein"}]},
                "acl": {"rules": [
                    {"resource": "certServer", "operation": "modify",
                     "groups": ["Administrators"]}
                ]},
                "directory": {
                    "users": [{"uid": "admin", "fullname": "Administrator"}],
                    "groups": [{"name": "Administrators", "description": "",
                                "members": ["admin"]}]
                }
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.directory.users[0].uid, "admin");
        assert_eq!(cfg.enforced_groups, ["Administrators", "Auditors"]);
    }
}
