//! Where the dashboard files come from.

mod directory;
#[cfg(test)]
pub mod fake;
mod remote;
mod table;

use async_trait::async_trait;
use reqwest::Url;

pub use self::{
    directory::Directory,
    remote::Remote,
    table::{RawRow, parse_table},
};
use crate::prelude::*;

#[async_trait(?Send)]
pub trait Fetch {
    /// Fetch the text of a file by its path relative to the data root.
    async fn fetch_text(&self, path: &str) -> Result<String>;

    /// Fetch and parse a CSV file.
    async fn load(&self, path: &str) -> Result<Vec<RawRow>> {
        let text = self.fetch_text(path).await?;
        let rows = parse_table(&text).with_context(|| format!("failed to parse `{path}`"))?;
        debug!(path, n_rows = rows.len(), "loaded");
        Ok(rows)
    }

    /// Load a file which may legitimately be missing: any failure means «absent».
    async fn load_optional(&self, path: &str) -> Option<Vec<RawRow>> {
        match self.load(path).await {
            Ok(rows) => Some(rows),
            Err(error) => {
                debug!(path, "optional file is unavailable: {error:#}");
                None
            }
        }
    }
}

/// Open the data root: an `http(s)://` base URL or a local directory.
pub fn open(location: &str) -> Result<Box<dyn Fetch>> {
    if location.starts_with("http://") || location.starts_with("https://") {
        let base_url = Url::parse(location).with_context(|| format!("invalid URL `{location}`"))?;
        Ok(Box::new(Remote::new(base_url)?))
    } else {
        Ok(Box::new(Directory::new(location)))
    }
}
