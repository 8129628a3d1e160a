//! Subscription descriptor generation: a `vless://` connection URL for this
//! node, base64-encoded the way subscription clients expect.

use crate::config::ServerConfig;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

/// The connection URL advertised for this node. TLS terminates at the
/// fronting infrastructure, so port and security parameters are fixed.
pub fn connection_url(config: &ServerConfig) -> String {
    format!(
        "vless://{id}@{domain}:443?encryption=none&security=tls&sni={domain}&fp=chrome&type=ws&host={domain}&path=%2F{path}#{name}",
        id = config.client_id,
        domain = config.domain,
        path = config.ws_path,
        name = config.node_name,
    )
}

/// Plain-text subscription body: base64 of the URL plus a trailing newline.
pub fn subscription_body(config: &ServerConfig) -> String {
    let mut body = BASE64.encode(connection_url(config));
    body.push('\n');
    body
}
