//! User configuration.
//!
//! Looked up at `--config`, then `$BOOKMARK_SAMPLER_CONFIG`, then
//! `<config dir>/bookmark-sampler/config.toml`. Only an explicitly named file
//! has to exist.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "BOOKMARK_SAMPLER_CONFIG";
const APP_DIR: &str = "bookmark-sampler";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Browser `Bookmarks` file to read.
    pub bookmarks_path: Option<PathBuf>,

    /// Where the navigator state is kept between runs.
    pub state_path: Option<PathBuf>,

    /// Open sampled URLs in the browser (otherwise just print them).
    pub open_urls: bool,

    /// Poll interval for the bookmarks file watcher in the shell.
    pub watch_poll_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bookmarks_path: None,
            state_path: None,
            open_urls: true,
            watch_poll_ms: 500,
        }
    }
}

impl Config {
    /// Load from `explicit`, or from the env/default location when `None`.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        if let Some(path) = env::var_os(CONFIG_ENV) {
            return Self::from_file(Path::new(&path));
        }

        match default_config_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// `override_path`, then the configured path, then the first browser
    /// profile found on this machine.
    pub fn resolve_bookmarks_path(&self, override_path: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = override_path.or(self.bookmarks_path.as_deref()) {
            return Ok(path.to_path_buf());
        }

        browser_bookmark_candidates()
            .into_iter()
            .find(|p| p.is_file())
            .ok_or_else(|| {
                anyhow!("no browser bookmarks file found; pass --bookmarks <file> or set bookmarks_path in the config")
            })
    }

    pub fn resolve_state_path(&self, override_path: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = override_path.or(self.state_path.as_deref()) {
            return Ok(path.to_path_buf());
        }

        let data_dir = dirs::data_dir().context("Could not find data directory")?;
        Ok(data_dir.join(APP_DIR).join("state.json"))
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
}

/// Default-profile `Bookmarks` files of the common Chromium-family browsers.
fn browser_bookmark_candidates() -> Vec<PathBuf> {
    const PROFILES: &[&str] = &[
        // Linux, under the XDG config dir.
        "microsoft-edge/Default/Bookmarks",
        "google-chrome/Default/Bookmarks",
        "chromium/Default/Bookmarks",
        "BraveSoftware/Brave-Browser/Default/Bookmarks",
        // macOS, under Application Support.
        "Microsoft Edge/Default/Bookmarks",
        "Google/Chrome/Default/Bookmarks",
        "Chromium/Default/Bookmarks",
        // Windows, under the local app data dir.
        "Microsoft/Edge/User Data/Default/Bookmarks",
        "Google/Chrome/User Data/Default/Bookmarks",
        "BraveSoftware/Brave-Browser/User Data/Default/Bookmarks",
    ];

    let mut bases = Vec::new();
    bases.extend(dirs::config_dir());
    bases.extend(dirs::data_local_dir());

    let mut out = Vec::new();
    for base in &bases {
        for rel in PROFILES {
            let candidate = base.join(rel);
            if !out.contains(&candidate) {
                out.push(candidate);
            }
        }
    }
    out
}
