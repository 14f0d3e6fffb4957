use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use foundation::math::{CoordinateError, LatLng};
use routes::deep_link::TravelMode;
use routes::{OverviewConfig, SurfaceConfig, Viewport, FOCUS_ZOOM};
use url::Url;

use crate::Settings;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "RotaTur route authoring API")]
pub struct Config {
    /// Listen address
    #[arg(long, env = "ROTATUR_ADDR", default_value = "127.0.0.1:9200")]
    pub addr: SocketAddr,

    /// Backend project URL; routes are kept in memory when unset
    #[arg(long, env = "SUPABASE_URL")]
    pub supabase_url: Option<Url>,

    #[arg(long, env = "SUPABASE_ANON_KEY", default_value = "", hide_env_values = true)]
    pub supabase_anon_key: String,

    /// Bearer token accepted as an admin by the in-memory backend
    #[arg(long, env = "ROTATUR_DEV_TOKEN", hide_env_values = true)]
    pub dev_token: Option<String>,

    #[arg(long, env = "OSRM_URL", default_value = "https://router.project-osrm.org")]
    pub osrm_url: Url,

    #[arg(long, env = "OSRM_PROFILE", default_value = "driving")]
    pub osrm_profile: String,

    #[arg(
        long,
        env = "NOMINATIM_URL",
        default_value = "https://nominatim.openstreetmap.org"
    )]
    pub nominatim_url: Url,

    /// Comma-separated country codes for place search; empty for worldwide
    #[arg(long, env = "ROTATUR_SEARCH_REGION", default_value = "br")]
    pub search_region: String,

    #[arg(long, env = "ROTATUR_SEARCH_LIMIT", default_value_t = 5)]
    pub search_limit: usize,

    /// Bound on every external call, in milliseconds
    #[arg(long, env = "ROTATUR_TIMEOUT_MS", default_value_t = 5000)]
    pub timeout_ms: u64,

    #[arg(
        long,
        env = "ROTATUR_DEFAULT_LAT",
        default_value_t = -15.7801,
        allow_hyphen_values = true
    )]
    pub default_lat: f64,

    #[arg(
        long,
        env = "ROTATUR_DEFAULT_LNG",
        default_value_t = -47.9292,
        allow_hyphen_values = true
    )]
    pub default_lng: f64,

    #[arg(long, env = "ROTATUR_DEFAULT_ZOOM", default_value_t = 4.0)]
    pub default_zoom: f64,

    /// driving, walking, bicycling or transit
    #[arg(long, env = "ROTATUR_TRAVEL_MODE")]
    pub travel_mode: Option<TravelMode>,

    /// Seconds an untouched draft stays open before it is discarded
    #[arg(
        long,
        env = "ROTATUR_DRAFT_TTL_SECS",
        default_value_t = 1800,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub draft_ttl_secs: u64,

    #[arg(
        long,
        env = "ROTATUR_USER_AGENT",
        default_value = concat!("rotatur/", env!("CARGO_PKG_VERSION"))
    )]
    pub user_agent: String,
}

impl Config {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn draft_ttl(&self) -> Duration {
        Duration::from_secs(self.draft_ttl_secs)
    }

    pub fn search_region(&self) -> Option<String> {
        let region = self.search_region.trim();
        (!region.is_empty()).then(|| region.to_string())
    }

    pub fn default_viewport(&self) -> Result<Viewport, CoordinateError> {
        let center = LatLng::new(self.default_lat, self.default_lng)?;
        Ok(Viewport::new(center, self.default_zoom))
    }

    pub fn settings(&self) -> Result<Settings, CoordinateError> {
        let default_viewport = self.default_viewport()?;
        Ok(Settings {
            surface: SurfaceConfig {
                default_viewport,
                focus_zoom: FOCUS_ZOOM,
                search_region: self.search_region(),
                search_limit: self.search_limit,
                lookup_timeout: self.timeout(),
            },
            overview: OverviewConfig {
                default_viewport,
                travel_mode: self.travel_mode,
            },
            draft_ttl: self.draft_ttl(),
        })
    }

    /// Shared outbound client. Nominatim rejects requests without a user agent.
    pub fn http_client(&self) -> reqwest::Result<reqwest::Client> {
        reqwest::Client::builder()
            .user_agent(self.user_agent.clone())
            .timeout(self.timeout())
            .build()
    }
}
