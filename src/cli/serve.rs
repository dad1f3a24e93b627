// src/cli/serve.rs
// Serve command

use anyhow::Result;

use crate::config::CopycatConfig;

pub async fn run_serve(mut config: CopycatConfig, host: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }
    crate::server::run(&config).await
}
