use std::sync::Arc;

use anyhow::Context;

use emertrix_onboarding::config::ServiceConfig;
use emertrix_onboarding::onboarding::routes::cors_layer;
use emertrix_onboarding::onboarding::{
    AccountProvisioner, HttpProvisioner, OnboardingRouteState, onboarding_routes,
};
use emertrix_onboarding::store::{LibSqlBackend, OnboardingStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = ServiceConfig::from_env().context("Invalid configuration")?;

    eprintln!("Emertrix onboarding v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   API: http://0.0.0.0:{}/api/onboarding", config.port);
    eprintln!("   Step policy: {:?}", config.wizard.step_policy);

    // ── Database ─────────────────────────────────────────────────────────
    let db = Arc::new(
        LibSqlBackend::new_local(&config.db_path)
            .await
            .with_context(|| format!("Failed to open database at {}", config.db_path.display()))?,
    );
    eprintln!("   Database: {}", config.db_path.display());

    match db.prune_older_than(config.draft_retention_days).await {
        Ok(0) => {}
        Ok(pruned) => eprintln!("   Pruned {pruned} abandoned drafts"),
        Err(e) => tracing::warn!("Draft pruning failed: {}", e),
    }
    match db.list_scopes().await {
        Ok(scopes) => eprintln!("   Open drafts: {}", scopes.len()),
        Err(e) => tracing::warn!("Failed to count open drafts: {}", e),
    }

    // ── Provisioning ────────────────────────────────────────────────────
    let provisioner: Option<Arc<dyn AccountProvisioner>> = match &config.provision_url {
        Some(url) => {
            eprintln!("   Provisioning: {url}");
            Some(Arc::new(HttpProvisioner::new(url)))
        }
        None => {
            eprintln!("   Provisioning: disabled");
            None
        }
    };

    // ── HTTP ─────────────────────────────────────────────────────────────
    let store: Arc<dyn OnboardingStore> = db;
    let app = onboarding_routes(OnboardingRouteState {
        store,
        config: config.wizard,
        provisioner,
    })
    .layer(cors_layer(config.cors_origin.as_deref())?);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .with_context(|| format!("Failed to bind port {}", config.port))?;
    tracing::info!(port = config.port, "Onboarding server started");
    axum::serve(listener, app).await?;

    Ok(())
}
