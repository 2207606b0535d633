use std::{fs::OpenOptions, net::SocketAddr, process::ExitCode, sync::Arc};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware,
};
use axum_server::Handle;
use clap::Parser;
use tower_http::trace::TraceLayer;

#[cfg(debug_assertions)]
use tower_livereload::LiveReloadLayer;

use tracing_subscriber::{Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use finance_tracker::{
    AppState, Config, ConnectionSettings, StoreUri, build_router, graceful_shutdown,
    logging_middleware,
    stores::{MongoConnector, MongoTransactionStore, SQLiteTransactionStore, TransactionStore},
};

#[tokio::main]
async fn main() -> ExitCode {
    // Values in `.env.local` take precedence since dotenvy never overrides a
    // variable that is already set.
    for env_file in [".env.local", ".env"] {
        if let Err(error) = dotenvy::from_filename(env_file)
            && !error.not_found()
        {
            eprintln!("Could not load {env_file}: {error}");
        }
    }

    let config = Config::parse();

    setup_logging(&config.log_path);

    let store_uri = match config.store_uri() {
        Ok(store_uri) => store_uri,
        Err(error) => {
            tracing::error!("Invalid configuration: {error}");
            return ExitCode::FAILURE;
        }
    };

    let addr = SocketAddr::from((config.host, config.port));

    match store_uri {
        StoreUri::MongoDb(uri) => {
            let settings = ConnectionSettings::default();
            tracing::info!(
                "Using MongoDB database \"{}\" ({settings})",
                config.database_name
            );
            let connector = MongoConnector::new(&uri, &config.database_name, settings);
            serve(addr, MongoTransactionStore::new(connector)).await
        }
        StoreUri::SQLite(path) => {
            tracing::info!("Using SQLite database {path}");
            serve(addr, SQLiteTransactionStore::new(&path)).await
        }
    }
}

async fn serve<T>(addr: SocketAddr, transaction_store: T) -> ExitCode
where
    T: TransactionStore,
{
    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = add_tracing_layer(
        build_router(AppState::new(transaction_store))
            .layer(middleware::from_fn(logging_middleware)),
    );

    #[cfg(debug_assertions)]
    let router = router.layer(LiveReloadLayer::new());

    tracing::info!("HTTP server listening on {}", addr);
    if let Err(error) = axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
    {
        tracing::error!("Server stopped with an error: {error}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn setup_logging(log_path: &str) {
    let stdout_log = tracing_subscriber::fmt::layer().pretty();

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .expect("Could not create log file");

    let debug_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(Arc::new(log_file));

    tracing_subscriber::registry()
        .with(
            stdout_log
                .with_filter(filter::LevelFilter::INFO)
                .and_then(debug_log)
                .with_filter(filter::LevelFilter::DEBUG),
        )
        .init();
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // By default, `TraceLayer` will log 5xx responses but we're doing our specific
        // logging of errors so disable that
        .on_failure(());

    router.layer(tracing_layer)
}
