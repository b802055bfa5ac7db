use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use mesh_convert::server::{self, ServerArgs, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ServerArgs::parse();

    let filter = if args.verbose {
        EnvFilter::new("mesh_convert=debug")
    } else {
        EnvFilter::new("mesh_convert=info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config: ServerConfig = args.into();
    let listen = config.listen;

    server::serve(config)
        .await
        .with_context(|| format!("mesh-convert-server failed on {listen}"))
}
