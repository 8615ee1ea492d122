use chrono::Utc;
use library_management::{
    adapters::{
        channel::LoggingChannel,
        postgres::{
            PostgresBookRepository, PostgresBorrowRepository, PostgresNotificationRepository,
            PostgresReservationRepository, PostgresUserRepository,
        },
    },
    api::{AppState, create_router},
    application::{ServiceDependencies, user},
    config::{AppConfig, DEVELOPMENT_JWT_SECRET},
};
use std::{error::Error, sync::Arc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // .env is optional
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("library_management={},tower_http=debug", config.logging.level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if config.auth.jwt_secret == DEVELOPMENT_JWT_SECRET {
        tracing::warn!("JWT secret is not configured; using the development secret");
    }

    // Initialize database connection pool
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    // Initialize adapters
    let service_deps = ServiceDependencies {
        book_repository: Arc::new(PostgresBookRepository::new(pool.clone())),
        borrow_repository: Arc::new(PostgresBorrowRepository::new(pool.clone())),
        reservation_repository: Arc::new(PostgresReservationRepository::new(pool.clone())),
        notification_repository: Arc::new(PostgresNotificationRepository::new(pool.clone())),
        user_repository: Arc::new(PostgresUserRepository::new(pool)),
        notification_channel: Arc::new(LoggingChannel::new()),
    };

    if let (Some(email), Some(password)) = (&config.auth.admin_email, &config.auth.admin_password)
    {
        let admin = user::ensure_admin(
            &service_deps,
            email,
            &config.auth.admin_name,
            password,
            Utc::now(),
        )
        .await?;
        tracing::info!(user_id = %admin.id, "Administrator account ready");
    }

    // Create application state
    let app_state = Arc::new(AppState {
        service_deps,
        auth: config.auth.clone(),
    });

    let app = create_router(app_state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
