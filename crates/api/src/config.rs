use std::str::FromStr;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the database URL and JWT secret have defaults suitable
/// for local development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Largest accepted request body in bytes; sized for multipart uploads.
    pub max_upload_bytes: usize,
    pub jwt: JwtConfig,
    pub razorpay: RazorpayConfig,
    pub storage: StorageConfig,
    pub deploy: DeployConfig,
}

/// Payment gateway credentials.
#[derive(Debug, Clone)]
pub struct RazorpayConfig {
    /// Public key id, echoed to clients so the checkout widget can open.
    pub key_id: String,
    /// Secret used for API basic auth and checkout signature verification.
    pub key_secret: String,
    /// Secret used to verify webhook deliveries.
    pub webhook_secret: String,
    pub base_url: String,
}

/// S3-compatible object storage settings.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint for MinIO / R2 / Spaces. Enables path-style addressing.
    pub endpoint: Option<String>,
    /// Static credentials. When absent the default AWS provider chain is used.
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    /// Base URL for public object links (e.g. a CDN in front of the bucket).
    pub public_base_url: Option<String>,
    /// Lifetime of presigned download URLs in seconds.
    pub presign_secs: u64,
}

/// Deployment hook settings. The hook is disabled when `secret` is unset.
#[derive(Debug, Clone)]
pub struct DeployConfig {
    pub secret: Option<String>,
    pub dir: String,
    pub command: String,
}

/// Default shell command run by the deployment hook.
pub const DEFAULT_DEPLOY_COMMAND: &str = "git pull && npm run build && pm2 restart all";

/// Default upload limit: 50 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                                          |
    /// |----------------------------|--------------------------------------------------|
    /// | `HOST`                     | `0.0.0.0`                                        |
    /// | `PORT`                     | `3000`                                           |
    /// | `CORS_ORIGINS`             | `http://localhost:3000`                          |
    /// | `REQUEST_TIMEOUT_SECS`     | `30`                                             |
    /// | `MAX_UPLOAD_BYTES`         | `52428800`                                       |
    /// | `RAZORPAY_KEY_ID`          | empty                                            |
    /// | `RAZORPAY_KEY_SECRET`      | empty                                            |
    /// | `RAZORPAY_WEBHOOK_SECRET`  | empty                                            |
    /// | `RAZORPAY_BASE_URL`        | `https://api.razorpay.com`                       |
    /// | `S3_BUCKET`                | `eduportal`                                      |
    /// | `S3_REGION`                | `ap-south-1`                                     |
    /// | `S3_ENDPOINT`              | none                                             |
    /// | `S3_ACCESS_KEY_ID`         | none                                             |
    /// | `S3_SECRET_ACCESS_KEY`     | none                                             |
    /// | `S3_PUBLIC_BASE_URL`       | none                                             |
    /// | `S3_PRESIGN_SECS`          | `900`                                            |
    /// | `DEPLOY_SECRET`            | none (hook disabled)                             |
    /// | `DEPLOY_DIR`               | `.`                                              |
    /// | `DEPLOY_COMMAND`           | `git pull && npm run build && pm2 restart all`   |
    /// | `JWT_SECRET`               | required                                         |
    /// | `JWT_ACCESS_EXPIRY_MINS`   | `60`                                             |
    /// | `JWT_REFRESH_EXPIRY_DAYS`  | `7`                                              |
    ///
    /// # Panics
    ///
    /// Panics when `JWT_SECRET` is missing and on unparseable numeric values,
    /// so misconfiguration fails fast.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = env_parse("PORT", 3000);

        let cors_origins = parse_origins(
            &std::env::var("CORS_ORIGINS").unwrap_or_else(|_| "http://localhost:3000".into()),
        );

        let request_timeout_secs: u64 = env_parse("REQUEST_TIMEOUT_SECS", 30);
        let max_upload_bytes: usize = env_parse("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES);

        let razorpay = RazorpayConfig {
            key_id: std::env::var("RAZORPAY_KEY_ID").unwrap_or_default(),
            key_secret: std::env::var("RAZORPAY_KEY_SECRET").unwrap_or_default(),
            webhook_secret: std::env::var("RAZORPAY_WEBHOOK_SECRET").unwrap_or_default(),
            base_url: std::env::var("RAZORPAY_BASE_URL")
                .unwrap_or_else(|_| "https://api.razorpay.com".into()),
        };
        if razorpay.key_secret.is_empty() {
            tracing::warn!("RAZORPAY_KEY_SECRET is not set; paid checkouts will fail");
        }

        let storage = StorageConfig {
            bucket: std::env::var("S3_BUCKET").unwrap_or_else(|_| "eduportal".into()),
            region: std::env::var("S3_REGION").unwrap_or_else(|_| "ap-south-1".into()),
            endpoint: env_opt("S3_ENDPOINT"),
            access_key_id: env_opt("S3_ACCESS_KEY_ID"),
            secret_access_key: env_opt("S3_SECRET_ACCESS_KEY"),
            public_base_url: env_opt("S3_PUBLIC_BASE_URL"),
            presign_secs: env_parse("S3_PRESIGN_SECS", 900),
        };

        let deploy = DeployConfig {
            secret: env_opt("DEPLOY_SECRET"),
            dir: std::env::var("DEPLOY_DIR").unwrap_or_else(|_| ".".into()),
            command: std::env::var("DEPLOY_COMMAND")
                .unwrap_or_else(|_| DEFAULT_DEPLOY_COMMAND.into()),
        };

        let jwt = JwtConfig {
            secret: env_opt("JWT_SECRET").expect("JWT_SECRET must be set"),
            access_ttl_mins: env_parse("JWT_ACCESS_EXPIRY_MINS", 60),
            refresh_ttl_days: env_parse("JWT_REFRESH_EXPIRY_DAYS", 7),
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            max_upload_bytes,
            jwt,
            razorpay,
            storage,
            deploy,
        }
    }
}

/// Admin account ensured at startup when both `ADMIN_EMAIL` and
/// `ADMIN_PASSWORD` are set.
#[derive(Debug, Clone)]
pub struct AdminBootstrap {
    pub email: String,
    pub password: String,
}

impl AdminBootstrap {
    pub fn from_env() -> Option<Self> {
        Some(Self {
            email: env_opt("ADMIN_EMAIL")?,
            password: env_opt("ADMIN_PASSWORD")?,
        })
    }
}

/// Split a comma-separated origin list, dropping blanks.
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Read a non-empty env var.
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Parse an env var, falling back to `default` when unset.
fn env_parse<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("{key} must be a valid {}: {e}", std::any::type_name::<T>())),
        Err(_) => default,
    }
}
