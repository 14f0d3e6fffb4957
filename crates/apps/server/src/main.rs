use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use routes::gateway::{InMemoryGateway, PersistenceGateway};
use routes::{Principal, Role};
use rotatur_server::config::Config;
use rotatur_server::nominatim::Nominatim;
use rotatur_server::osrm::OsrmRouter;
use rotatur_server::supabase::SupabaseGateway;
use rotatur_server::{app, AppState};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Config::parse();
    let settings = config.settings()?;
    let client = config.http_client()?;

    let places = Arc::new(Nominatim::new(client.clone(), config.nominatim_url.clone()));
    let routing = Arc::new(OsrmRouter::new(
        client.clone(),
        config.osrm_url.clone(),
        config.osrm_profile.clone(),
    ));

    let gateway: Arc<dyn PersistenceGateway> = match &config.supabase_url {
        Some(url) => {
            info!("persisting routes to {url}");
            Arc::new(SupabaseGateway::new(
                client,
                url.clone(),
                config.supabase_anon_key.clone(),
            ))
        }
        None => {
            warn!("SUPABASE_URL not set; routes are kept in memory");
            let mut gateway = InMemoryGateway::new();
            if let Some(token) = &config.dev_token {
                let admin = Principal {
                    user_id: "dev".to_string(),
                    role: Role::Admin,
                };
                gateway = gateway.with_session(token.clone(), admin);
            }
            Arc::new(gateway)
        }
    };

    let sweep_every = settings.draft_ttl.min(Duration::from_secs(60));
    let state = AppState::new(gateway, places.clone(), places, routing, settings);
    let _sweeper = state.sessions.spawn_sweeper(sweep_every);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!("rotatur listening on http://{}", config.addr);
    axum::serve(listener, app(state)).await?;
    Ok(())
}
