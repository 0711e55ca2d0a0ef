//! Configuration types for Page Magic.
//!
//! This module provides the [`Config`] struct which groups renderer, animation
//! and backend settings. Configuration is persisted as TOML (typically at
//! `~/.config/pagemagic/config.toml` on Unix systems). Every field has a
//! default, so a partial or empty file is valid.
//!
//! # Sections
//!
//! - `[render]`: markdown dialect and sanitizer allow-lists
//! - `[animation]`: reveal pacing, granularity and diff baseline
//! - `[api]`: backend URL, token and polling cadence
//!
//! Durations are stored as milliseconds.
//!
//! # Example
//!
//! ```ignore
//! use pagemagic_core::config::Config;
//!
//! let config = Config::load()?.with_env_overrides();
//! let renderer = MarkdownRenderer::new(config.render.clone());
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::api::{API_TOKEN_ENV, API_URL_ENV};
use crate::error::{PageMagicError, Result};
use crate::version::BaselinePolicy;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Markdown dialect and sanitizer allow-lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Enable GitHub-flavoured extensions (tables, strikethrough, autolinks, task lists)
    pub gfm: bool,
    /// Render single newlines as `<br>`
    pub hard_breaks: bool,
    /// Tags kept in block mode
    pub block_tags: Vec<String>,
    /// Tags kept in inline mode
    pub inline_tags: Vec<String>,
    /// Attributes kept on allowed tags
    pub attributes: Vec<String>,
    /// URL schemes allowed in `href`/`src`; relative URLs always pass
    pub url_schemes: Vec<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            gfm: true,
            hard_breaks: false,
            block_tags: strings(&[
                "p", "div", "span", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "li",
                "blockquote", "pre", "code", "em", "strong", "b", "i", "u", "a", "br", "hr",
                "table", "thead", "tbody", "tr", "th", "td", "img", "figure", "figcaption",
            ]),
            inline_tags: strings(&["em", "strong", "b", "i", "code"]),
            attributes: strings(&[
                "href", "title", "alt", "src", "width", "height", "class", "id",
            ]),
            url_schemes: strings(&["http", "https", "mailto"]),
        }
    }
}

/// Granularity of a typewriter reveal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RevealUnit {
    /// One character per tick
    Character,
    /// One word (or whitespace/punctuation token) per tick
    Word,
    /// Whole segment after a pseudo-random delay
    Segment,
}

/// Pacing of the content-evolution replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Pause between preparing a run and the first reveal
    pub settle_delay_ms: u64,
    /// Delay per unit for meta fields
    pub meta_tick_ms: u64,
    /// Delay per unit for body content (character/word units)
    pub content_tick_ms: u64,
    /// How long removed meta text stays visible struck through
    pub strike_hold_ms: u64,
    /// Lower bound of the per-segment delay for segment units
    pub segment_delay_min_ms: u64,
    /// Upper bound of the per-segment delay for segment units
    pub segment_delay_max_ms: u64,
    /// Reveal granularity for title, meta description and metas
    pub meta_unit: RevealUnit,
    /// Reveal granularity for body content
    pub content_unit: RevealUnit,
    /// Seed for segment delay jitter
    pub seed: u64,
    /// Which version every diff is computed against
    pub baseline: BaselinePolicy,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 300,
            meta_tick_ms: 50,
            content_tick_ms: 20,
            strike_hold_ms: 600,
            segment_delay_min_ms: 80,
            segment_delay_max_ms: 240,
            meta_unit: RevealUnit::Character,
            content_unit: RevealUnit::Segment,
            seed: 0x5eed,
            baseline: BaselinePolicy::Original,
        }
    }
}

impl AnimationConfig {
    /// Settle delay as a [`Duration`].
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Meta tick as a [`Duration`].
    pub fn meta_tick(&self) -> Duration {
        Duration::from_millis(self.meta_tick_ms)
    }

    /// Content tick as a [`Duration`].
    pub fn content_tick(&self) -> Duration {
        Duration::from_millis(self.content_tick_ms)
    }

    /// Strike hold as a [`Duration`].
    pub fn strike_hold(&self) -> Duration {
        Duration::from_millis(self.strike_hold_ms)
    }

    /// Segment delay bounds, ordered even if configured backwards.
    pub fn segment_delay_range_ms(&self) -> (u64, u64) {
        let (a, b) = (self.segment_delay_min_ms, self.segment_delay_max_ms);
        (a.min(b), a.max(b))
    }
}

/// Backend connection and polling settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the REST backend (e.g. "https://api.example.com/v1")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Bearer token for authenticated calls
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Interval between job status polls
    pub poll_interval_ms: u64,
    /// Upper bound on polls for a single job
    pub max_polls: u32,
    /// Request timeout
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            token: None,
            poll_interval_ms: 2000,
            max_polls: 900,
            timeout_secs: 30,
        }
    }
}

impl ApiConfig {
    /// Poll interval as a [`Duration`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// `Config` groups every user-configurable part of Page Magic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Markdown renderer settings
    pub render: RenderConfig,
    /// Replay pacing
    pub animation: AnimationConfig,
    /// Backend access
    pub api: ApiConfig,
}

impl Config {
    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| PageMagicError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save config to a specific path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents).map_err(|e| PageMagicError::FileWrite {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(())
    }

    /// Load config from a path, returning defaults if it is missing or invalid.
    pub fn load_from_or_default(path: &Path) -> Self {
        match Self::load_from(path) {
            Ok(config) => config,
            Err(e) => {
                log::debug!("Using default config ({})", e);
                Self::default()
            }
        }
    }

    /// Apply `PAGEMAGIC_API_URL` / `PAGEMAGIC_API_TOKEN` from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply API overrides from an arbitrary variable lookup.
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(API_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.api.base_url = Some(url.trim_end_matches('/').to_string());
        }
        if let Some(token) = lookup(API_TOKEN_ENV).filter(|v| !v.trim().is_empty()) {
            self.api.token = Some(token);
        }
        self
    }
}

// ============================================================================
// Native-only implementation (not available in WASM)
// ============================================================================

#[cfg(not(target_arch = "wasm32"))]
impl Config {
    /// Get the config file path (~/.config/pagemagic/config.toml)
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("pagemagic").join("config.toml"))
    }

    /// Load config from default location, or return default if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::config_path()
            && path.exists()
        {
            return Self::load_from(&path);
        }

        Ok(Config::default())
    }

    /// Save config to default location
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path().ok_or(PageMagicError::NoConfigDir)?;
        self.save_to(&path)
    }
}
