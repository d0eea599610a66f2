//! agegate daemon — entry point for running the verification service.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use agegate_nullables::{NullAgeDetector, NullBankGateway, NullIdentityProvider, NullTextExtractor};
use agegate_rpc::server::{build_router, AppState};
use agegate_rpc::ServiceConfig;
use agegate_store::company::{CompanyInfo, CompanyStore};
use agegate_store::shop::{ShopInfo, ShopStore};
use agegate_store_memory::MemoryStore;
use agegate_types::{CompanyId, ShopId, SystemClock};
use agegate_verification::capture::AgeDetector;
use agegate_verification::document::TextExtractor;
use agegate_verification::method::{AdapterDeps, MethodRegistry};
use agegate_verification::redirect::{HttpIdentityProvider, IdentityProvider};
use agegate_verification::{
    CrossDeviceAdapter, DocumentOcrAdapter, LiveCaptureAdapter, RedirectIdentityAdapter,
    RevalidationAdapter, SessionManager,
};
use agegate_wallet::{BankStatementGateway, HttpBankGateway, ReconciliationWorker, TopUpService};
use clap::Parser;

#[derive(Parser)]
#[command(name = "agegate-daemon", about = "Age verification and wallet reconciliation service")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings are
    /// used as the base; CLI flags and env vars override them.
    #[arg(long, env = "AGEGATE_CONFIG")]
    config: Option<PathBuf>,

    /// HTTP port.
    #[arg(long, env = "AGEGATE_PORT")]
    port: Option<u16>,

    /// Address to bind the HTTP server to.
    #[arg(long, env = "AGEGATE_BIND")]
    bind: Option<String>,

    /// Seed a demo shop and company so the service is usable out of the
    /// box with the nullable capabilities.
    #[arg(long, env = "AGEGATE_DEMO")]
    demo: bool,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "AGEGATE_LOG_LEVEL")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let file_config: Option<ServiceConfig> = match &cli.config {
        Some(path) => match ServiceConfig::from_toml_file(&path.display().to_string()) {
            Ok(cfg) => Some(cfg),
            Err(e) => {
                eprintln!("failed to load config {}: {e}, using defaults", path.display());
                None
            }
        },
        None => None,
    };

    let mut config = file_config.unwrap_or_default();
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(bind) = cli.bind {
        config.bind_addr = bind;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }

    agegate_utils::init_tracing(&config.log_level, &config.log_format);
    tracing::info!(
        port = config.port,
        demo = cli.demo,
        identity_provider = config.identity_provider.is_some(),
        bank_feed = config.bank_feed.is_some(),
        "starting agegate service"
    );

    let store = Arc::new(MemoryStore::new());
    if cli.demo {
        seed_demo_data(&store)?;
    }

    let clock = Arc::new(SystemClock);
    let params = config.params.clone();

    let sessions = Arc::new(SessionManager::new(
        store.clone(),
        store.clone(),
        clock.clone(),
        params.clone(),
    ));
    let deps = AdapterDeps {
        shops: store.clone(),
        records: store.clone(),
        sessions: sessions.clone(),
        clock: clock.clone(),
        params: params.clone(),
    };

    let provider: Arc<dyn IdentityProvider> = match &config.identity_provider {
        Some(settings) => Arc::new(HttpIdentityProvider::new(settings.clone())),
        None => Arc::new(NullIdentityProvider::adult()),
    };
    let extractor: Arc<dyn TextExtractor> = if cli.demo {
        Arc::new(NullTextExtractor::returning("born 15.03.1990"))
    } else {
        Arc::new(NullTextExtractor::failing("no OCR engine configured"))
    };
    // Raw frames need a server-side detector; clients normally run the
    // detector locally and submit detections. Demo mode estimates a fixed
    // adult age so the full flow can be exercised.
    let detector: Arc<dyn AgeDetector> = if cli.demo {
        Arc::new(NullAgeDetector::steady(30.0))
    } else {
        Arc::new(NullAgeDetector::scripted(Vec::new()))
    };
    let gateway: Arc<dyn BankStatementGateway> = match &config.bank_feed {
        Some(feed) => Arc::new(HttpBankGateway::new(feed.base_url.clone(), feed.token.clone())),
        None => Arc::new(NullBankGateway::new()),
    };

    let mut registry = MethodRegistry::new();
    registry.register(Arc::new(RedirectIdentityAdapter::new(
        deps.clone(),
        provider,
        config.identity_provider.clone(),
    )));
    registry.register(Arc::new(DocumentOcrAdapter::new(deps.clone(), extractor)));
    registry.register(Arc::new(LiveCaptureAdapter::new(deps.clone(), detector)));
    registry.register(Arc::new(RevalidationAdapter::new(deps.clone())));
    registry.register(Arc::new(CrossDeviceAdapter::new(
        deps.clone(),
        config.public_base_url.clone(),
    )));

    let topup = Arc::new(TopUpService::new(
        store.clone(),
        store.clone(),
        clock.clone(),
    ));
    let worker = Arc::new(ReconciliationWorker::new(
        gateway,
        store.clone(),
        clock.clone(),
        params,
    ));

    // Scheduled sweep; on-demand reconciles through the API are safe to
    // overlap with it.
    let sweep_worker = worker.clone();
    let sweep_interval = config.sweep_interval_secs.max(1);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(sweep_interval));
        loop {
            interval.tick().await;
            match sweep_worker.sweep().await {
                Ok(outcome) => {
                    if outcome.settled > 0 || outcome.failed > 0 {
                        tracing::info!(
                            settled = outcome.settled,
                            still_pending = outcome.still_pending,
                            failed = outcome.failed,
                            "reconciliation sweep finished"
                        );
                    }
                }
                Err(e) => tracing::warn!(error = %e, "reconciliation sweep failed"),
            }
        }
    });

    let state = AppState {
        sessions,
        registry: Arc::new(registry),
        shops: store.clone(),
        records: store,
        topup,
        worker,
    };
    let router = build_router(state);

    let addr = format!("{}:{}", config.bind_addr, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("agegate daemon exited cleanly");
    Ok(())
}

fn seed_demo_data(store: &MemoryStore) -> anyhow::Result<()> {
    store.put_company(&CompanyInfo {
        id: CompanyId::new("demo-company"),
        name: "Demo Merchant s.r.o.".into(),
    })?;
    store.put_shop(&ShopInfo {
        id: ShopId::new("demo-shop"),
        company: CompanyId::new("demo-company"),
        name: "Demo Shop".into(),
        active: true,
    })?;
    tracing::info!("seeded demo shop 'demo-shop' and company 'demo-company'");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutdown signal received");
}
