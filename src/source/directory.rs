use std::path::PathBuf;

use async_trait::async_trait;

use crate::{prelude::*, source::Fetch};

/// Local data directory.
pub struct Directory(PathBuf);

impl Directory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self(root.into())
    }
}

#[async_trait(?Send)]
impl Fetch for Directory {
    #[instrument(skip_all, fields(path = path))]
    async fn fetch_text(&self, path: &str) -> Result<String> {
        let full_path = self.0.join(path);
        tokio::fs::read_to_string(&full_path)
            .await
            .with_context(|| format!("failed to read `{}`", full_path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn load_ok() -> Result {
        let root = tempfile::tempdir()?;
        std::fs::create_dir(root.path().join("output"))?;
        std::fs::write(
            root.path().join("output/Load_forecast_24h.csv"),
            "Datetime,Load_Forecast\n2024-01-01 00:00,10\n",
        )?;

        let rows = Directory::new(root.path()).load("output/Load_forecast_24h.csv").await?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("Load_Forecast"), Some("10"));
        Ok(())
    }

    #[tokio::test]
    async fn missing_file_fails() -> Result {
        let root = tempfile::tempdir()?;
        let directory = Directory::new(root.path());
        assert!(directory.load("missing.csv").await.is_err());
        assert!(directory.load_optional("missing.csv").await.is_none());
        Ok(())
    }
}
