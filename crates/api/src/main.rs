use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use eduportal_api::auth::password::hash_password;
use eduportal_api::config::{AdminBootstrap, ServerConfig};
use eduportal_api::router::build_app_router;
use eduportal_api::services::gateway::RazorpayClient;
use eduportal_api::services::storage::S3Storage;
use eduportal_api::state::AppState;
use eduportal_core::roles::ROLE_ADMIN;
use eduportal_db::models::user::NewUser;
use eduportal_db::repositories::UserRepo;
use eduportal_db::DbPool;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "eduportal_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = eduportal_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    eduportal_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    eduportal_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    if let Some(admin) = AdminBootstrap::from_env() {
        ensure_admin(&pool, &admin).await;
    }

    // --- External services ---
    let storage = S3Storage::from_config(&config.storage).await;
    tracing::info!(bucket = %config.storage.bucket, "Object storage configured");

    let gateway = RazorpayClient::new(&config.razorpay);

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        storage: Arc::new(storage),
        gateway: Arc::new(gateway),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// Create the bootstrap admin, or promote an existing account with that email.
async fn ensure_admin(pool: &DbPool, admin: &AdminBootstrap) {
    let existing = UserRepo::find_by_email(pool, &admin.email)
        .await
        .expect("Failed to look up bootstrap admin");

    match existing {
        Some(user) if user.role == ROLE_ADMIN => {
            tracing::debug!(user_id = user.id, "Bootstrap admin already present");
        }
        Some(user) => {
            UserRepo::set_role(pool, user.id, ROLE_ADMIN)
                .await
                .expect("Failed to promote bootstrap admin");
            tracing::info!(user_id = user.id, "Promoted existing user to admin");
        }
        None => {
            let password_hash =
                hash_password(&admin.password).expect("Failed to hash bootstrap admin password");
            let user = UserRepo::create(
                pool,
                &NewUser {
                    name: "Administrator".into(),
                    email: admin.email.trim().to_lowercase(),
                    password_hash,
                    role: ROLE_ADMIN.into(),
                },
            )
            .await
            .expect("Failed to create bootstrap admin");
            tracing::info!(user_id = user.id, "Bootstrap admin created");
        }
    }
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, pm2).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
