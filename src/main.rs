mod api;
mod dao;
mod model;
mod service;

use std::fs::OpenOptions;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use crate::api::endpoints::configure_services;
use crate::api::middleware::timing_middleware;
use crate::api::state::AppState;
use crate::dao::consumption::FuelConsumptionDao;
use crate::dao::memory::InMemoryStore;
use crate::dao::store::ConsumptionStore;
use crate::model::apperror::{ApplicationError, ErrorType};
use crate::model::config::{ApplicationArguments, Config, DatabaseType, HttpsConfig, LoggingConfig};
use crate::service::consumption::FuelConsumptionService;

use actix_web::middleware::from_fn;
use actix_web::{App, HttpServer, web};
use actix_web_prom::{PrometheusMetrics, PrometheusMetricsBuilder};
use clap::Parser;
use prometheus::IntGauge;
use rustls::pki_types::PrivateKeyDer;
use rustls::{ServerConfig, SupportedProtocolVersion};
use rustls_pemfile::{certs, pkcs8_private_keys};
use sqlx::{Pool, Postgres, pool};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/**
 * Starts the fuel consumption api.
 */
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let args = ApplicationArguments::parse();

    let config = get_config(&args.config_file)?;

    init_tracing(&config.logging)?;

    let prometheus = PrometheusMetricsBuilder::new("")
        .endpoint("/metrics")
        .mask_unmatched_patterns("UNKNOWN")
        .build()
        .map_err(|err| std::io::Error::other(format!("Failed to create Prometheus metrics: {err}")))?;

    let consumption_store = get_consumption_store(&config, &prometheus).await?;
    let state = web::Data::new(AppState::new(FuelConsumptionService::new(consumption_store)));
    let max_payload_size = config.server.max_payload_size;

    let server_init = HttpServer::new(move || {
        App::new()
            .wrap(prometheus.clone())
            .wrap(from_fn(timing_middleware))
            .app_data(state.clone())
            .app_data(web::PayloadConfig::new(max_payload_size))
            .configure(configure_services)
    });

    let server_init = if let Some(http_port) = &config.server.http_port { server_init.bind(("127.0.0.1", *http_port))? } else { server_init };
    let server_init = if let Some(https_config) = &config.server.https_config {
        let ssl_builder = ssl_builder(https_config).map_err(|err| std::io::Error::other(format!("Failed to create SSL/TLS configuration: {err}")))?;
        server_init.bind_rustls_0_23("127.0.0.1:".to_string() + &https_config.port.to_string(), ssl_builder).map_err(|err| std::io::Error::other(format!("Failed to bind HTTPS server: {err}")))?
    } else {
        server_init
    };

    info!("Starting fuel consumption api with {} workers", config.server.workers);
    server_init.workers(config.server.workers).run().await
}

/**
 * Initializes logging for the application.
 *
 * #Arguments
 * `logging_config`: Output and format settings. Directives fall back to `RUST_LOG` when empty.
 *
 * #Returns
 * A `Result` indicating success or failure.
 */
fn init_tracing(logging_config: &LoggingConfig) -> Result<(), std::io::Error> {
    let env_filter = if logging_config.directives.is_empty() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(logging_config.directives.join(",")).map_err(|err| std::io::Error::other(format!("Failed to parse logging directives: {err}")))?
    };

    let writer = match &logging_config.logfile {
        Some(logfile) => {
            let file = OpenOptions::new().create(true).append(true).open(logfile).map_err(|err| std::io::Error::other(format!("Failed to open log file {logfile}: {err}")))?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(std::io::stdout),
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_target(logging_config.target)
        .with_thread_ids(logging_config.thread_ids)
        .with_thread_names(logging_config.thread_names)
        .with_line_number(logging_config.line_number)
        .with_level(logging_config.level)
        .with_ansi(logging_config.ansi)
        .with_file(logging_config.file);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|err| std::io::Error::other(format!("Failed to initialize logging: {err}")))?;

    Ok(())
}

/**
 * Creates the fuel consumption store selected in the database configuration.
 *
 * For `PostgreSQL` the connection pool is created, migrations are applied when enabled and
 * the pool gauges are registered with Prometheus.
 *
 * #Arguments
 * `config`: The application configuration.
 * `prometheus`: The Prometheus metrics instance to register pool gauges with.
 *
 * #Returns
 * A `Result` containing the store or an `std::io::Error` if the database is unavailable.
 */
async fn get_consumption_store(config: &Config, prometheus: &PrometheusMetrics) -> Result<ConsumptionStore, std::io::Error> {
    match &config.database.db_type {
        DatabaseType::Postgresql { connection_string, max_connections, min_connections, acquire_timeout, acquire_slow_threshold, idle_timeout, max_lifetime, run_migrations } => {
            let connection_pool: Pool<Postgres> = pool::PoolOptions::new()
                .max_connections(*max_connections)
                .min_connections(*min_connections)
                .acquire_timeout(Duration::from_millis(*acquire_timeout))
                .acquire_slow_threshold(Duration::from_millis(*acquire_slow_threshold))
                .idle_timeout(Duration::from_millis(*idle_timeout))
                .max_lifetime(Duration::from_millis(*max_lifetime))
                .connect(connection_string.as_str())
                .await
                .map_err(|err| std::io::Error::other(format!("Failed to create database pool: {err}")))?;

            if *run_migrations {
                sqlx::migrate!("./sqlx-postgresql-migration/migrations")
                    .run(&connection_pool)
                    .await
                    .map_err(|err| std::io::Error::other(format!("Failed to run database migrations: {err}")))?;
                info!("Database migrations applied");
            }

            let max_connections_gauge = IntGauge::new("max_connections", "Connection pool maximum").map_err(|err| std::io::Error::other(format!("Failed to create max_connections gauge: {err}")))?;
            let min_connections_gauge = IntGauge::new("min_connections", "Connection pool minimum").map_err(|err| std::io::Error::other(format!("Failed to create min_connections gauge: {err}")))?;
            let active_connections_gauge = IntGauge::new("active_connections", "Connection pool active").map_err(|err| std::io::Error::other(format!("Failed to create active_connections gauge: {err}")))?;
            let idle_connections_gauge = IntGauge::new("idle_connections", "Connection pool idle").map_err(|err| std::io::Error::other(format!("Failed to create idle_connections gauge: {err}")))?;
            register_prometheus_metrics(prometheus, &max_connections_gauge)?;
            register_prometheus_metrics(prometheus, &min_connections_gauge)?;
            register_prometheus_metrics(prometheus, &active_connections_gauge)?;
            register_prometheus_metrics(prometheus, &idle_connections_gauge)?;

            gather_db_metrics(max_connections_gauge, min_connections_gauge, active_connections_gauge, idle_connections_gauge, connection_pool.clone());

            Ok(ConsumptionStore::Postgresql { consumption_dao: FuelConsumptionDao::new(), connection_pool })
        }
        DatabaseType::InMemory => {
            info!("Using in-memory fuel consumption store");
            Ok(ConsumptionStore::InMemory(InMemoryStore::new()))
        }
    }
}

/**
 * Registers custom Prometheus metrics.
 *
 * #Arguments
 * `prometheus_metrics`: The Prometheus metrics instance to register the gauge with.
 * `gauge`: The gauge to register.
 */
fn register_prometheus_metrics(prometheus_metrics: &PrometheusMetrics, gauge: &IntGauge) -> Result<(), std::io::Error> {
    prometheus_metrics.registry.register(Box::new(gauge.clone())).map_err(|err| std::io::Error::other(format!("Failed to register Prometheus gauge: {err}")))?;
    Ok(())
}

/**
 * Refreshes the connection pool gauges every second in a separate thread.
 */
fn gather_db_metrics(max_connections_gauge: IntGauge, min_connections_gauge: IntGauge, active_connections_gauge: IntGauge, idle_connections_gauge: IntGauge, connection_pool: Pool<Postgres>) {
    thread::spawn(move || {
        loop {
            max_connections_gauge.set(i64::from(connection_pool.options().get_max_connections()));
            min_connections_gauge.set(i64::from(connection_pool.options().get_min_connections()));
            active_connections_gauge.set(i64::from(connection_pool.size()));
            #[allow(clippy::cast_possible_wrap)]
            idle_connections_gauge.set(connection_pool.num_idle() as i64);
            thread::sleep(Duration::from_secs(1));
        }
    });
}

/**
 * Initializes the SSL/TLS configuration for the server.
 *
 * #Arguments
 * `https_config`: The HTTPS configuration containing the certificate and private key files.
 *
 * #Returns
 * A `Result` containing the initialized `ServerConfig` or an `ApplicationError` if initialization fails.
 */
fn ssl_builder(https_config: &HttpsConfig) -> Result<ServerConfig, ApplicationError> {
    let cert_file = &mut std::io::BufReader::new(
        std::fs::File::open(&https_config.certificate_file).map_err(|err| ApplicationError::new(ErrorType::Initialization, format!("Failed to read certificate file: {err}")))?,
    );
    let key_file = &mut std::io::BufReader::new(
        std::fs::File::open(&https_config.private_key_file).map_err(|err| ApplicationError::new(ErrorType::Initialization, format!("Failed to read private key file: {err}")))?,
    );
    let cert_chain = certs(cert_file).collect::<Result<Vec<_>, _>>().map_err(|err| ApplicationError::new(ErrorType::Initialization, format!("Failed to convert certificate to der: {err}")))?;
    let private_key = pkcs8_private_keys(key_file)
        .map(|key| key.map(PrivateKeyDer::Pkcs8))
        .next()
        .ok_or_else(|| ApplicationError::new(ErrorType::Initialization, "No private key found in private key file".to_string()))?
        .map_err(|err| ApplicationError::new(ErrorType::Initialization, format!("Failed to convert private key to der: {err}")))?;
    let config = ServerConfig::builder_with_protocol_versions(&get_protocol_versions())
        .with_no_client_auth()
        .with_single_cert(cert_chain, private_key)
        .map_err(|err| ApplicationError::new(ErrorType::Initialization, format!("Failed to create server config: {err}")))?;
    Ok(config)
}

/**
 * Returns the supported TLS protocol versions.
 */
fn get_protocol_versions() -> Vec<&'static SupportedProtocolVersion> {
    vec![&rustls::version::TLS13]
}

/**
 * Reads the configuration from the specified file.
 *
 * #Arguments
 * `config_file`: The path to the configuration file.
 *
 * #Returns
 * A `Result` containing the parsed `Config` or an `std::io::Error` if reading or parsing fails.
*/
fn get_config(config_file: &str) -> Result<Config, std::io::Error> {
    let config_str: String = std::fs::read_to_string(config_file).map_err(|err| std::io::Error::other(format!("Failed to read config file: {err}")))?;
    let config: Config = toml::from_str(&config_str).map_err(|err| std::io::Error::other(format!("Failed to parse config file: {err}")))?;
    Ok(config)
}
