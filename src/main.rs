use anyhow::{Context, Result};
use clap::Parser;
use pdf_summarizer::{
    api, config, extraction::PdfTextExtractor, logging, processing::ProcessingService,
    summarization, upload::UploadStore,
};
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(
    name = "pdf-summarizer",
    about = "HTTP service that summarizes uploaded PDF documents"
)]
struct Cli {
    /// Port to listen on (overrides `PORT`).
    #[arg(long)]
    port: Option<u16>,
    /// Directory for in-flight uploads (overrides `UPLOAD_DIR`).
    #[arg(long)]
    upload_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = config::load_config().context("failed to load configuration")?;
    logging::init_tracing();

    if let Some(port) = cli.port {
        config.server_port = port;
    }
    if let Some(upload_dir) = cli.upload_dir {
        config.upload_dir = upload_dir;
    }
    tracing::debug!(
        base_url = %config.openai_base_url,
        model = %config.summarization_model,
        upload_dir = %config.upload_dir.display(),
        max_upload_bytes = config.max_upload_bytes,
        "Loaded configuration"
    );

    let uploads = UploadStore::new(&config.upload_dir, config.max_upload_bytes);
    uploads.ensure_dir().await.with_context(|| {
        format!(
            "failed to create upload directory {}",
            uploads.dir().display()
        )
    })?;
    tracing::info!(upload_dir = %uploads.dir().display(), "Upload directory ready");

    let summarizer = summarization::build_summarization_client(&config)
        .context("failed to initialize summarization client")?;
    let service = ProcessingService::new(Arc::new(PdfTextExtractor::new()), summarizer, uploads);
    let app = api::create_router(Arc::new(service));

    let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, config.server_port))
        .await
        .with_context(|| format!("failed to bind port {}", config.server_port))?;
    tracing::info!("Server started on port {}", config.server_port);

    axum::serve(listener, app)
        .await
        .context("HTTP server terminated unexpectedly")?;
    Ok(())
}
