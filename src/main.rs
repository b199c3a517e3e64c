use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use color_eyre::Result;
use tracing_subscriber::EnvFilter;

use jiraview::config::Settings;
use jiraview::jira::JiraService;
use jiraview::routes;

#[derive(Parser, Debug)]
#[command(name = "jiraview")]
#[command(about = "A same-origin Jira issue viewer and attachment proxy")]
#[command(version)]
struct Args {
  /// Address to listen on
  #[arg(short, long, default_value = "127.0.0.1:8000")]
  bind: SocketAddr,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let settings = Settings::from_env()?;

  tracing_subscriber::fmt()
    .json()
    .with_env_filter(
      EnvFilter::try_new(&settings.log_level).unwrap_or_else(|_| EnvFilter::new("info")),
    )
    .init();

  let service = Arc::new(JiraService::new(&settings)?);
  let app = routes::router(service);

  let listener = tokio::net::TcpListener::bind(args.bind).await?;
  tracing::info!(addr = %args.bind, "Listening");
  axum::serve(listener, app).await?;

  Ok(())
}
