use crate::{
    app::{assets::AssetBase, remote::{AppRemote, RemoteAuth}},
    config::Config,
    session::{ErrorBoundary, Orchestrator, SessionOptions},
};
use anyhow::{Context, Result};
use homedir::my_home;

/// Builds the configured pieces of the application from env and config.
pub struct AppFactory;

impl AppFactory {
    /// Get application paths, creating the base directory
    pub fn get_paths() -> Result<AppPaths> {
        let base_path = Self::get_base_path()?;

        std::fs::create_dir_all(&base_path)
            .context("Failed to create application base directory")?;

        Ok(AppPaths { base_path })
    }

    /// Load the config and apply a remote address override, if any
    pub fn create_config(paths: &AppPaths, remote: Option<&str>) -> Result<Config> {
        let mut config = Config::load_with(&paths.base_path)?;

        if let Some(remote) = remote.map(str::trim).filter(|r| !r.is_empty()) {
            tracing::info!("Using remote override: {}", remote);
            config.remote_addr = remote.to_string();
            config.validate()?;
        }

        Ok(config)
    }

    fn get_base_path() -> Result<String> {
        if let Ok(base_path) = std::env::var("NEXUS_BASE_PATH") {
            return Ok(base_path);
        }

        let home = my_home()
            .context("Could not determine home directory")?
            .context("Home directory path is empty")?;
        Ok(format!("{}/.local/share/nexus", home.to_string_lossy()))
    }

    pub fn create_backend(config: &Config) -> Result<AppRemote> {
        let auth = Self::parse_auth();
        let remote = AppRemote::new(
            &config.remote_addr,
            config.top_k,
            auth,
            config.request_timeout(),
        )?;

        tracing::info!("Using search service: {}", remote.remote_addr());
        Ok(remote)
    }

    pub fn create_assets(config: &Config) -> Result<AssetBase> {
        AssetBase::new(&config.remote_addr, &config.asset_base)
    }

    pub fn create_orchestrator<E: ErrorBoundary>(
        config: &Config,
        boundary: E,
    ) -> Result<Orchestrator<AppRemote, E>> {
        let backend = Self::create_backend(config)?;
        Ok(Orchestrator::new(
            backend,
            boundary,
            SessionOptions::from(config),
        ))
    }

    /// Bearer token wins over basic auth when both are set
    fn parse_auth() -> RemoteAuth {
        if let Some(token) = Self::parse_bearer_token() {
            return RemoteAuth::Bearer(token);
        }

        match std::env::var("NEXUS_BASIC_AUTH") {
            Ok(ba) => parse_basic_auth(&ba),
            Err(_) => RemoteAuth::None,
        }
    }

    fn parse_bearer_token() -> Option<String> {
        std::env::var("NEXUS_AUTH_TOKEN")
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    }
}

fn parse_basic_auth(value: &str) -> RemoteAuth {
    let parts: Vec<_> = value.splitn(2, ':').collect();
    match parts.as_slice() {
        [username] if !username.is_empty() => RemoteAuth::Basic(username.to_string(), None),
        [username, password] if !username.is_empty() => {
            RemoteAuth::Basic(username.to_string(), Some(password.to_string()))
        }
        _ => {
            tracing::warn!(
                "Invalid NEXUS_BASIC_AUTH format. Expected 'username' or 'username:password'"
            );
            RemoteAuth::None
        }
    }
}

/// Application paths structure
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub base_path: String,
}
