use anyhow::{Context, Result};
use clap::Parser;
use std::{env, path::PathBuf};

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub public_dir: PathBuf,
    pub database_url: String,
    pub max_upload_bytes: usize,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Clients CRUD API")]
pub struct Args {
    /// Host to bind to (overrides CLIENTS_API_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides CLIENTS_API_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory served as static assets; uploads land in `tmp/` beneath it
    /// (overrides CLIENTS_API_PUBLIC_DIR)
    #[arg(long)]
    pub public_dir: Option<PathBuf>,

    /// Database URL (overrides CLIENTS_API_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Largest accepted image upload in bytes (overrides CLIENTS_API_MAX_UPLOAD_BYTES)
    #[arg(long)]
    pub max_upload_bytes: Option<usize>,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        let args = Args::parse();

        // --- Environment fallback ---
        let env_host = env::var("CLIENTS_API_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = parse_env("CLIENTS_API_PORT", 3000u16)?;
        let env_public =
            env::var("CLIENTS_API_PUBLIC_DIR").unwrap_or_else(|_| "./public".into());
        let env_db = env::var("CLIENTS_API_DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./data/clients.db".into());
        let env_max_upload = parse_env("CLIENTS_API_MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?;

        // --- Merge ---
        let cfg = Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            public_dir: args.public_dir.unwrap_or_else(|| env_public.into()),
            database_url: args.database_url.unwrap_or(env_db),
            max_upload_bytes: args.max_upload_bytes.unwrap_or(env_max_upload),
        };

        Ok((cfg, args.migrate))
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_env<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => value
            .parse::<T>()
            .with_context(|| format!("parsing {} value `{}`", name, value)),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(err).with_context(|| format!("reading {}", name)),
    }
}
