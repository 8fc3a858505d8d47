use actix_web::{web, App, HttpResponse, HttpServer};
use anyhow::Context;
use docrepo::config::Config;
use docrepo::middleware::{json_error_handler, ErrorHandler};
use docrepo::modules::{health, users};
use docrepo::users::UserRepository;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("docrepo={},actix_web=info", config.app.log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting docrepo");
    tracing::info!("Environment: {}", config.app.env);
    tracing::info!("Server binding to: {}", config.server.bind_address());

    let client = config
        .database
        .create_client()
        .await
        .context("Failed to create MongoDB client")?;

    tracing::info!(
        "MongoDB client initialized (database {}, max pool {})",
        config.database.name,
        config.database.max_pool_size
    );

    let user_repository = UserRepository::new(
        client.clone(),
        &config.database.name,
        config.repository.options(),
    );
    if let Err(e) = user_repository.ensure_indexes().await {
        tracing::warn!("Could not ensure user indexes: {}", e);
    }

    let bind_address = config.server.bind_address();
    let server = HttpServer::new(move || {
        App::new()
            .wrap(ErrorHandler)
            .wrap(TracingLogger::default())
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(web::Data::new(client.clone()))
            .app_data(web::Data::new(user_repository.clone()))
            .configure(health::configure)
            .configure(users::controllers::configure::<UserRepository>)
            .route("/", web::get().to(index))
    })
    .workers(config.server.workers)
    .bind(&bind_address)?
    .run();

    tracing::info!("Server started at http://{}", bind_address);

    server.await?;
    Ok(())
}

async fn index() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "service": "docrepo",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}
