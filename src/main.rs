use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use refactor_bot::actors::{RouterActor, WorkerActor};
use refactor_bot::config::{AppConfig, RepoStore, TokenStore};
use refactor_bot::git::{CommitIdentity, GitCli};
use refactor_bot::github::GithubClient;
use refactor_bot::pipeline::{Pipeline, PipelineConfig};
use refactor_bot::runtime::{Registry, RegistryConfig};
use refactor_bot::server::{AppState, build_router};
use refactor_bot::transform::OllamaTransform;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "refactor_bot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    std::fs::create_dir_all(&config.work_dir)?;
    std::fs::create_dir_all(&config.archive_dir)?;

    let tokens = Arc::new(TokenStore::open(&config.config_dir));
    let repos = Arc::new(RepoStore::open(&config.config_dir));

    let pipeline = Arc::new(Pipeline::new(
        Arc::new(GitCli::new(
            &config.work_dir,
            CommitIdentity {
                name: config.bot_name.clone(),
                email: config.bot_email.clone(),
            },
            Arc::clone(&tokens),
        )),
        Arc::new(OllamaTransform::new(&config.ollama_model)),
        Arc::new(GithubClient::new(Arc::clone(&tokens))),
        PipelineConfig {
            base_branch: config.base_branch.clone(),
            branch_prefix: config.branch_prefix.clone(),
            archive_dir: config.archive_dir.clone(),
        },
    ));

    let registry_config = RegistryConfig {
        idle_timeout: config.idle_timeout,
        ..RegistryConfig::default()
    };
    let shutdown = tokio_util::sync::CancellationToken::new();

    let workers = Arc::new(Registry::with_shutdown(
        registry_config.clone(),
        shutdown.clone(),
        move |_key| WorkerActor::new(Arc::clone(&pipeline)),
    ));
    let routers = {
        let workers = Arc::clone(&workers);
        Arc::new(Registry::with_shutdown(
            registry_config,
            shutdown.clone(),
            move |_key| RouterActor::new(Arc::clone(&workers)),
        ))
    };

    let state = AppState::new(
        routers,
        tokens,
        repos,
        config.webhook_secret.as_ref().map(|s| s.clone().into_bytes()),
    );
    let app = build_router(state);

    tracing::info!(addr = %config.listen_addr, "listening");
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown requested");
            shutdown.cancel();
        })
        .await?;

    Ok(())
}
