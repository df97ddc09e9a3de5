use crate::{
    session::history::HISTORY_CAPACITY,
    storage::{self, StorageManager},
};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

const CONFIG_FILE: &str = "config.yaml";

/// Address of the search service when nothing else is configured.
const DEFAULT_REMOTE_ADDR: &str = "http://127.0.0.1:8000";
/// Path on the remote where result images are served from.
const DEFAULT_ASSET_BASE: &str = "/wikipedia_scrape/images/";
const DEFAULT_TOP_K: u16 = 5;
/// Blend weight of the refinement text against the previous embedding.
const DEFAULT_REFINE_ALPHA: f32 = 0.6;
/// Minimum time a faded result set stays visible during refinement.
const DEFAULT_FADE_DELAY_MS: u64 = 300;
const DEFAULT_HISTORY_LIMIT: usize = 5;
const DEFAULT_PREVIEW_CHARS: usize = 280;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default = "default_remote_addr")]
    pub remote_addr: String,

    /// Base path for image results, joined with the remote address.
    #[serde(default = "default_asset_base")]
    pub asset_base: String,

    /// Number of hits requested per modality.
    #[serde(default = "default_top_k")]
    pub top_k: u16,

    #[serde(default = "default_refine_alpha")]
    pub refine_alpha: f32,

    #[serde(default = "default_fade_delay_ms")]
    pub fade_delay_ms: u64,

    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Characters of result body shown before truncation.
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,

    /// 0 disables the timeout.
    #[serde(default)]
    pub request_timeout_secs: u64,

    #[serde(skip_serializing, skip_deserializing)]
    base_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            remote_addr: default_remote_addr(),
            asset_base: default_asset_base(),
            top_k: DEFAULT_TOP_K,
            refine_alpha: DEFAULT_REFINE_ALPHA,
            fade_delay_ms: DEFAULT_FADE_DELAY_MS,
            history_limit: DEFAULT_HISTORY_LIMIT,
            preview_chars: DEFAULT_PREVIEW_CHARS,
            request_timeout_secs: 0,
            base_path: String::new(),
        }
    }
}

fn default_remote_addr() -> String {
    DEFAULT_REMOTE_ADDR.to_string()
}

fn default_asset_base() -> String {
    DEFAULT_ASSET_BASE.to_string()
}

fn default_top_k() -> u16 {
    DEFAULT_TOP_K
}

fn default_refine_alpha() -> f32 {
    DEFAULT_REFINE_ALPHA
}

fn default_fade_delay_ms() -> u64 {
    DEFAULT_FADE_DELAY_MS
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

fn default_preview_chars() -> usize {
    DEFAULT_PREVIEW_CHARS
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        let addr = url::Url::parse(&self.remote_addr)
            .with_context(|| format!("remote_addr is not a valid url: {:?}", self.remote_addr))?;
        if !matches!(addr.scheme(), "http" | "https") {
            bail!("remote_addr must be an http(s) url, got {:?}", self.remote_addr);
        }

        if !self.asset_base.starts_with('/') {
            bail!("asset_base must start with '/', got {:?}", self.asset_base);
        }

        if !(1..=100).contains(&self.top_k) {
            bail!("top_k must be between 1 and 100, got {}", self.top_k);
        }

        if !(0.0..=1.0).contains(&self.refine_alpha) {
            bail!(
                "refine_alpha must be between 0.0 and 1.0, got {}",
                self.refine_alpha
            );
        }

        if !(1..=HISTORY_CAPACITY).contains(&self.history_limit) {
            bail!(
                "history_limit must be between 1 and {HISTORY_CAPACITY}, got {}",
                self.history_limit
            );
        }

        if self.preview_chars == 0 {
            bail!("preview_chars must be greater than 0");
        }

        Ok(())
    }

    pub fn load_with(base_path: &str) -> anyhow::Result<Self> {
        let store = storage::BackendLocal::new(base_path)
            .with_context(|| format!("failed to open config directory {base_path}"))?;

        // create new if does not exist
        if !store.exists(CONFIG_FILE) {
            store.write(
                CONFIG_FILE,
                serde_yml::to_string(&Self::default())?.as_bytes(),
            )?;
        }

        let config_str = String::from_utf8(store.read(CONFIG_FILE)?)
            .context("config file is not valid utf8")?;
        let mut config: Self = serde_yml::from_str(&config_str).context("config is malformed")?;

        config.base_path = base_path.to_string();

        config.validate()?;

        // resave in case config version needs an upgrade
        if config_str != serde_yml::to_string(&config)? {
            config.save()?;
        }

        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let store = storage::BackendLocal::new(&self.base_path)?;

        let config_str = serde_yml::to_string(&self)?;
        store.write(CONFIG_FILE, config_str.as_bytes())?;
        Ok(())
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn fade_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.fade_delay_ms)
    }

    pub fn request_timeout(&self) -> Option<std::time::Duration> {
        (self.request_timeout_secs > 0)
            .then(|| std::time::Duration::from_secs(self.request_timeout_secs))
    }
}
