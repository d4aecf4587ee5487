//! CLI argument parsing, validation, and startup helpers.

use crate::ServerConfig;
use crate::db::{Database, Role};
use crate::password;
use clap::Parser;
use rand::Rng;
use std::time::Duration;
use tracing::{error, info};

const MIN_JWT_SECRET_LENGTH: usize = 32;

const ADMIN_EMAIL: &str = "admin@test.com";
const ADMIN_NICKNAME: &str = "superadmin";

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "Gatehouse",
    about = "Stateless JWT authentication with rotating refresh sessions"
)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "7310")]
    pub port: u16,

    /// Path to SQLite database file
    #[arg(short, long, default_value = "gatehouse.db")]
    pub database: String,

    /// Path to file containing the JWT signing secret. Prefer using JWT_SECRET env var instead
    #[arg(long)]
    pub jwt_secret_file: Option<String>,

    /// Access token validity in seconds
    #[arg(long, env = "ACCESS_TOKEN_TTL_SECS", default_value = "1800",
        value_parser = clap::value_parser!(u64).range(1..))]
    pub access_token_ttl_secs: u64,

    /// Refresh token validity in seconds
    #[arg(long, env = "REFRESH_TOKEN_TTL_SECS", default_value = "1209600",
        value_parser = clap::value_parser!(u64).range(1..))]
    pub refresh_token_ttl_secs: u64,

    /// Do not set the Secure attribute on the refresh cookie (local HTTP development only)
    #[arg(long)]
    pub insecure_cookies: bool,

    /// Seed the admin account on startup if it does not exist
    #[arg(long)]
    pub seed_admin: bool,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Load JWT secret from environment variable or file.
/// Returns None and logs an error if the secret cannot be loaded.
pub fn load_jwt_secret(jwt_secret_file: Option<&str>) -> Option<String> {
    let secret = if let Ok(secret) = std::env::var("JWT_SECRET") {
        // Clear the environment variable to prevent leaking
        // SAFETY: We're single-threaded at this point during startup,
        // and no other code is reading this environment variable.
        unsafe { std::env::remove_var("JWT_SECRET") };
        secret
    } else if let Some(path) = jwt_secret_file {
        match std::fs::read_to_string(path) {
            Ok(content) => content.trim().to_string(),
            Err(e) => {
                error!(path = %path, error = %e, "Failed to read JWT secret file");
                return None;
            }
        }
    } else {
        error!(
            "JWT secret is required. Set JWT_SECRET environment variable (recommended) or use --jwt-secret-file"
        );
        return None;
    };

    if secret.len() < MIN_JWT_SECRET_LENGTH {
        error!(
            "JWT secret is shorter than {} characters. Use a longer secret",
            MIN_JWT_SECRET_LENGTH
        );
        return None;
    }

    Some(secret)
}

/// Open the database, logging errors if it fails.
pub async fn open_database(path: &str) -> Option<Database> {
    match Database::open(path).await {
        Ok(db) => {
            info!(path = %path, "Database opened");
            Some(db)
        }
        Err(e) => {
            error!(path = %path, error = %e, "Failed to open database");
            None
        }
    }
}

/// Handle the --seed-admin flag: create the admin account if it is missing.
/// The password comes from SEED_ADMIN_PASSWORD, or is generated and printed
/// once.
pub async fn handle_seed_admin(db: &Database) {
    match db.members().exists_by_email(ADMIN_EMAIL).await {
        Ok(true) => {
            info!(email = ADMIN_EMAIL, "Admin account already exists");
        }
        Ok(false) => {
            let (admin_password, generated) = match std::env::var("SEED_ADMIN_PASSWORD") {
                Ok(p) if !p.is_empty() => (p, false),
                _ => (generate_password(), true),
            };

            let hash = match password::hash(&admin_password) {
                Ok(hash) => hash,
                Err(e) => {
                    error!(error = %e, "Failed to hash admin password");
                    std::process::exit(1);
                }
            };

            match db
                .members()
                .create(ADMIN_EMAIL, &hash, ADMIN_NICKNAME, Role::Admin)
                .await
            {
                Ok(_) => {
                    println!();
                    println!("Admin account created: {}", ADMIN_EMAIL);
                    if generated {
                        println!("Generated password: {}", admin_password);
                    }
                    println!();
                }
                Err(e) => {
                    error!(error = %e, "Failed to create admin account");
                    std::process::exit(1);
                }
            }
        }
        Err(e) => {
            error!(error = %e, "Failed to check for existing admin");
            std::process::exit(1);
        }
    }
}

fn generate_password() -> String {
    rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(24)
        .map(char::from)
        .collect()
}

/// Build ServerConfig from validated arguments.
pub fn build_config(db: Database, jwt_secret: String, args: &Args) -> ServerConfig {
    ServerConfig {
        db,
        jwt_secret: jwt_secret.into_bytes(),
        access_token_ttl: Duration::from_secs(args.access_token_ttl_secs),
        refresh_token_ttl: Duration::from_secs(args.refresh_token_ttl_secs),
        secure_cookies: !args.insecure_cookies,
    }
}
