use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use gameday_advisor::config::{LoggingSettings, Settings};
use gameday_advisor::core::SearchOrchestrator;
use gameday_advisor::providers::{
    CalendarProvider, FixtureCalendarProvider, FixtureTicketProvider, SeatGeekProvider, TicketProvider,
};
use gameday_advisor::routes::{self, handle_json_payload_error, handle_query_payload_error, AppState};
use gameday_advisor::services::{
    BoundedCache, InMemoryStore, PostgresStore, RateLimiter, Store, TokenCipher,
};

/// Initialize logging from LOG_LEVEL / LOG_FORMAT, falling back to settings
fn init_tracing(logging: &LoggingSettings) {
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| logging.level.clone());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| logging.format.clone());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if log_format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.compact().init();
    }
}

fn startup_error(what: &str, err: impl std::fmt::Display) -> std::io::Error {
    error!("{}: {}", what, err);
    std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", what, err))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let loaded = Settings::load();
    init_tracing(&loaded.as_ref().map(|s| s.logging.clone()).unwrap_or_default());

    info!("Starting Gameday Advisor...");

    let settings = loaded.map_err(|e| startup_error("Configuration error", e))?;

    info!("Configuration loaded successfully");

    // Persistence: PostgreSQL when configured, otherwise process memory
    let store: Arc<dyn Store> = match settings.database.url.as_deref().filter(|u| !u.is_empty()) {
        Some(url) => {
            let postgres = PostgresStore::from_settings(
                url,
                settings.database.max_connections,
                settings.database.min_connections,
                settings.database.acquire_timeout_secs,
                settings.database.idle_timeout_secs,
            )
            .await
            .map_err(|e| startup_error("PostgreSQL connection error", e))?;
            info!("PostgreSQL store initialized");
            Arc::new(postgres)
        }
        None => {
            info!("No database configured, using in-memory store");
            Arc::new(InMemoryStore::new())
        }
    };

    let cipher = match settings.security.token_key.as_deref().filter(|k| !k.is_empty()) {
        Some(key) => Some(Arc::new(
            TokenCipher::from_base64_key(key).map_err(|e| startup_error("Token key error", e))?,
        )),
        None => {
            tracing::warn!("No token encryption key configured, calendar connections are disabled");
            None
        }
    };

    let fixtures_dir = Path::new(&settings.providers.fixtures_dir);

    let tickets: Arc<dyn TicketProvider> = match settings.providers.seatgeek_credentials() {
        Some((client_id, client_secret)) if settings.providers.use_seatgeek() => Arc::new(
            SeatGeekProvider::new(client_id, client_secret, settings.providers.timeout())
                .map_err(|e| startup_error("SeatGeek client error", e))?,
        ),
        _ => Arc::new(
            FixtureTicketProvider::from_path(fixtures_dir.join("games.json"))
                .map_err(|e| startup_error("Schedule fixture error", e))?,
        ),
    };

    let calendar: Arc<dyn CalendarProvider> = Arc::new(
        FixtureCalendarProvider::from_path(fixtures_dir.join("freebusy.json"))
            .map_err(|e| startup_error("Free/busy fixture error", e))?,
    );

    info!("Ticket provider: {}, calendar provider: {}", tickets.name(), calendar.name());

    let weights = settings.scoring_weights();
    let orchestrator = Arc::new(SearchOrchestrator::new(
        store.clone(),
        calendar,
        tickets,
        Arc::new(BoundedCache::new(settings.cache.games_ttl_secs)),
        Arc::new(BoundedCache::new(settings.cache.tickets_ttl_secs)),
        Arc::new(RateLimiter::new()),
        weights,
        settings.search_options(),
    ));

    info!("Search orchestrator initialized with weights: {:?}", weights);

    // Build application state
    let app_state = AppState {
        store,
        orchestrator,
        cipher,
        default_user_id: settings.search.default_user_id.clone(),
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);
    let origins = settings.cors.origin_list();

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allow_any_method()
            .allow_any_header()
            .supports_credentials();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
