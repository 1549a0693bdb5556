use std::sync::Arc;
use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use article_pipeline::{
    config::Config,
    api::routes::create_router,
    pipeline::{Pipeline, RunOptions},
    AppState,
};

#[derive(Parser)]
#[command(name = "article-pipeline", about = "Turns keywords into sourced long-form articles")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API (default)
    Serve,
    /// Process keyword files from the keywords directory in a loop
    Watch,
    /// Generate one article and exit
    Run {
        keyword: String,
        /// Directory under the sources root holding local documents
        #[arg(long)]
        source_dir: Option<String>,
        /// Skip web search and use local documents only
        #[arg(long)]
        no_web_search: bool,
        /// Synthesis model override
        #[arg(long)]
        model: Option<String>,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("article_pipeline=info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Arc::new(Config::load().context("failed to load configuration")?);
    init_tracing();

    let pipeline =
        Arc::new(Pipeline::from_config(config.clone()).context("failed to build pipeline")?);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let server_addr = config.server_addr;
            let app_state = AppState { pipeline };

            // Build the router with routes
            let app = create_router(app_state);

            let listener = TcpListener::bind(server_addr)
                .await
                .with_context(|| format!("failed to bind {}", server_addr))?;

            info!("Listening on {}", server_addr);
            axum::serve(listener, app).await?;
        }
        Command::Watch => pipeline.watch().await,
        Command::Run {
            keyword,
            source_dir,
            no_web_search,
            model,
        } => {
            let report = pipeline
                .run(&RunOptions {
                    keyword,
                    source_dir,
                    web_search: !no_web_search,
                    model,
                })
                .await?;
            info!(
                path = %report.output_path.display(),
                input_tokens = report.usage.input_tokens,
                output_tokens = report.usage.output_tokens,
                cost = %format!("{:.4}", report.usage.cost),
                "Article written"
            );
        }
    }

    Ok(())
}
