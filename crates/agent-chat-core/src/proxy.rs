//! The local MCP proxy the user must start before chatting.

use crate::credentials::Credentials;

pub const DEFAULT_PROXY_URL: &str = "https://mcp.turkishtechlab.com/mcp";
pub const DEFAULT_PROXY_PORT: u16 = 8088;

/// The command shown on the instructions screen, with the user's proxy
/// credentials filled in.
pub fn proxy_command(credentials: &Credentials, proxy_url: &str, port: u16) -> String {
    format!(
        "npx -y mcp-remote {} --username {} --password {} --stdio-host 0.0.0.0 --stdio-port {}",
        proxy_url,
        credentials.proxy_user(),
        credentials.proxy_password(),
        port
    )
}

/// Lines the proxy prints once it is up.
pub fn expected_proxy_output(port: u16) -> [String; 2] {
    [
        "Proxy established successfully".to_string(),
        format!("Listening on 0.0.0.0:{}", port),
    ]
}
