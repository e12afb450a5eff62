use anyhow::Result;
use rca_cli::{build_engine, cli, execute, GlobalOptions, Request};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("RCA_LOG_JSON").is_ok_and(|v| matches!(v.as_str(), "1" | "true"));

    // stdout carries the command output
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let matches = cli().get_matches();
    let options = GlobalOptions::from_matches(&matches);
    let request = Request::from_matches(&matches)?;

    let engine = build_engine(&options)?;
    let output = execute(&engine, request).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
