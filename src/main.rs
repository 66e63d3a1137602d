use anyhow::{Context, Result};
use clap::Parser;
use pca_squeeze::cli::{Args, Commands, ServiceArgs};
use pca_squeeze::constants::SUCCESS_PREFIX;
use pca_squeeze::utils::{create_progress_spinner, print_workflow_summary};
use pca_squeeze::{
    error, info, logger, verbose, Completion, CompressionWorkflowController,
    HttpCompressionService, ResourceLifecycleManager, SelectedFile, ServiceConfig, Session,
};
use std::path::Path;
use tokio::io::BufReader;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logger::init(args.quiet, args.verbose);

    match args.command {
        Commands::Compress {
            input,
            k,
            output,
            service,
        } => compress_once(&input, k, &output, service).await,
        Commands::Session { service } => run_session(service).await,
        Commands::Health { api_url } => check_health(api_url).await,
    }
}

fn build_controller(service: &ServiceArgs) -> Result<CompressionWorkflowController> {
    let resources = if service.temp_files {
        ResourceLifecycleManager::temp_files().context("Failed to create temporary directory")?
    } else {
        ResourceLifecycleManager::in_memory()
    };
    Ok(CompressionWorkflowController::new(resources))
}

fn build_service(api_url: Option<String>) -> Result<HttpCompressionService> {
    let config = match api_url {
        Some(url) => ServiceConfig::new(Some(url))?,
        None => ServiceConfig::from_env()?,
    };
    verbose!("Compression service: {}", config.base_url);
    Ok(HttpCompressionService::new(config)?)
}

async fn compress_once(input: &Path, k: u32, output: &Path, args: ServiceArgs) -> Result<()> {
    info!("🗜️  Compressing image: {:?}", input);
    info!("📁 Output: {:?}", output);

    let service = build_service(args.api_url.clone())?;
    let mut controller = build_controller(&args)?;

    let file = SelectedFile::from_path(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    controller.select_file(Some(file))?;

    let spinner = create_progress_spinner(&format!("Compressing with k={}...", k));
    let completion = controller.compress(&service, k).await;
    spinner.finish_and_clear();

    match completion? {
        Completion::Succeeded { .. } => {
            print_workflow_summary(&controller);
            let path = controller
                .save_result(output)
                .context("Failed to save compressed image")?;
            info!("{} Saved {}", SUCCESS_PREFIX, path.display());
            Ok(())
        }
        Completion::Failed { message } => {
            error!("{}", message);
            anyhow::bail!("compression failed")
        }
        Completion::Stale => anyhow::bail!("compression result was superseded"),
    }
}

async fn run_session(args: ServiceArgs) -> Result<()> {
    let service = build_service(args.api_url.clone())?;
    let controller = build_controller(&args)?;

    let mut session = Session::new(controller, Box::new(service));
    session
        .run(BufReader::new(tokio::io::stdin()))
        .await
        .context("Session aborted")?;
    Ok(())
}

async fn check_health(api_url: Option<String>) -> Result<()> {
    let service = build_service(api_url)?;
    info!("🔗 Checking {}", service.config().health_url());

    let body = service
        .health()
        .await
        .context("Compression service is not healthy")?;
    info!("{} {}", SUCCESS_PREFIX, body.trim());
    Ok(())
}
