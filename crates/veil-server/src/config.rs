//! Server configuration: CLI flags with environment fallbacks, resolved into
//! one immutable value at startup.

use crate::error::{ServerError, ServerResult};
use clap::Parser;
use veil_proto::ClientId;

/// veil-server — VLESS-over-WebSocket bridge
///
/// Every flag can also be supplied through the process environment, matching
/// the deployment convention of the surrounding infrastructure.
#[derive(Parser, Debug)]
#[command(name = "veil-server", version, about = "VLESS-over-WebSocket bridge server")]
pub struct Cli {
    /// Client identifier (UUID form)
    #[arg(long, env = "UUID", default_value = "7bd180e8-1142-4387-93f5-03e8d750a896")]
    pub uuid: String,

    /// Public domain used in generated subscription descriptors
    #[arg(long, env = "DOMAIN", default_value = "dataopen.wasmer.app")]
    pub domain: String,

    /// Path serving the base64 subscription descriptor
    #[arg(long, env = "SUB_PATH", default_value = "sub")]
    pub sub_path: String,

    /// Node name appended to the subscription descriptor
    #[arg(long, env = "NAME", default_value = "MyNode")]
    pub name: String,

    /// Secret WebSocket upgrade path (defaults to the first 8 characters
    /// of the identifier)
    #[arg(long, env = "WSPATH")]
    pub ws_path: Option<String>,

    /// Listen port
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// Resolved server configuration. Built once in `main`, shared read-only.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The 16-byte identity every session must present.
    pub client_id: ClientId,
    /// Public domain placed in generated descriptors.
    pub domain: String,
    /// Node display name for the descriptor fragment.
    pub node_name: String,
    /// Subscription path, without leading slash.
    pub sub_path: String,
    /// Secret WebSocket path, without leading slash.
    pub ws_path: String,
    /// Listen port.
    pub port: u16,
}

impl ServerConfig {
    /// Validate and resolve the CLI/environment values.
    pub fn from_cli(cli: &Cli) -> ServerResult<Self> {
        let client_id: ClientId = cli
            .uuid
            .parse()
            .map_err(|e| ServerError::Config(format!("invalid UUID: {e}")))?;

        let sub_path = normalize_path(&cli.sub_path);
        let ws_path = match &cli.ws_path {
            Some(p) => normalize_path(p),
            None => cli.uuid.chars().take(8).collect(),
        };

        if ws_path.is_empty() {
            return Err(ServerError::Config("WebSocket path must not be empty".into()));
        }
        if sub_path.is_empty() {
            return Err(ServerError::Config("subscription path must not be empty".into()));
        }
        // Both are router routes; they cannot share a path.
        if ws_path == sub_path {
            return Err(ServerError::Config(format!(
                "WebSocket path and subscription path collide: /{ws_path}"
            )));
        }

        Ok(Self {
            client_id,
            domain: cli.domain.clone(),
            node_name: cli.name.clone(),
            sub_path,
            ws_path,
            port: cli.port,
        })
    }
}

fn normalize_path(p: &str) -> String {
    p.trim_start_matches('/').to_string()
}
