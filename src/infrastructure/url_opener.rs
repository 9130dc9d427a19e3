use crate::domain::traits::UrlOpener;
use anyhow::{Context, Result};

/// Hands URLs to the platform opener, which routes them to the default
/// browser. Whether the new tab takes focus is up to the browser.
pub struct SystemOpener;

impl UrlOpener for SystemOpener {
    fn open_in_background(&self, url: &str) -> Result<()> {
        open::that_detached(url).with_context(|| format!("launching browser for {url}"))
    }
}

/// Prints each URL instead of opening it; stderr when stdout carries events.
pub struct PrintOpener {
    pub to_stderr: bool,
}

impl UrlOpener for PrintOpener {
    fn open_in_background(&self, url: &str) -> Result<()> {
        if self.to_stderr {
            eprintln!("{url}");
        } else {
            println!("{url}");
        }
        Ok(())
    }
}
