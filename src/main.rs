use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use sqlx::migrate::Migrator;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clarity_finance::config::Config;
use clarity_finance::db;
use clarity_finance::demo::DemoDataService;
use clarity_finance::plaid::PlaidClient;
use clarity_finance::supabase::SupabaseAuthClient;
use clarity_finance::{AppState, create_app};

#[derive(Parser)]
#[command(name = "clarity-finance")]
#[command(about = "Clarity Finance - banking data gateway and transaction API", long_about = None)]
struct Cli {
    /// Port to listen on (overrides SERVER_PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Env file to load before reading configuration
    #[arg(long, value_name = "PATH")]
    env_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.env_file {
        dotenvy::from_path(path)?;
    }

    let mut config = Config::from_env()?;
    if let Some(port) = cli.port {
        config.server_port = port;
    }

    // Setup logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Database pool
    let pool = db::create_pool(&config).await?;

    // Run migrations
    let migrator = Migrator::new(Path::new("./migrations")).await?;
    migrator.run(&pool).await?;
    tracing::info!("Database migrations completed");

    // Upstream clients
    let plaid = PlaidClient::new(
        config.plaid_env.base_url().to_string(),
        config.plaid_client_id.clone(),
        config.plaid_secret.clone(),
    );
    tracing::info!("Plaid client initialized for the {} environment", config.plaid_env);

    let supabase = SupabaseAuthClient::new(
        config.supabase_url.clone(),
        config.supabase_anon_key.clone(),
    );

    let demo = DemoDataService::load()?;

    if config.test_mode {
        tracing::warn!("TEST_MODE is enabled: auth and rate limiting are bypassed");
    }

    let server_port = config.server_port;
    let state = AppState {
        db: pool,
        plaid,
        supabase,
        demo,
        config: Arc::new(config),
    };
    let app = create_app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], server_port));
    tracing::info!("listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
