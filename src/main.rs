use anyhow::Context;
use levplan::market::MarketContextBuilder;
use levplan::{api, config::Config, HttpLendingGateway, LeveragePlanner, MarketContext};
use std::net::SocketAddr;
use std::sync::Arc;

fn build_context(config: &Config) -> anyhow::Result<MarketContext> {
    let spec = config
        .load_market_spec()
        .with_context(|| format!("loading market catalogue {}", config.market_config_path))?;
    let gateway = Arc::new(HttpLendingGateway::new(config.lending_gateway_url.clone()));
    let context = MarketContextBuilder::from_spec(&spec)?
        .with_oracle(gateway.clone())
        .with_lending_pool(gateway.clone())
        .with_pool_reader(gateway)
        .build()?;
    Ok(context)
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let port = config.port;

    let context = match build_context(&config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to build market context: {:#}", e);
            std::process::exit(1);
        }
    };
    tracing::info!(
        "Loaded {} assets from {}",
        context.assets().count(),
        config.market_config_path
    );

    let planner = Arc::new(LeveragePlanner::new(
        Arc::new(context),
        config.planner_settings(),
    ));

    // Create router
    let app = api::create_router(api::AppState::new(planner));

    // Bind to address
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Server listening on {}", addr);

    // Run server
    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}
