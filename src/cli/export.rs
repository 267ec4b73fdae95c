use std::path::PathBuf;

use clap::Parser;

use crate::{
    cli::data::DataArgs,
    core::{observation::normalize, window::select},
    export::to_csv,
    prelude::*,
};

#[derive(Parser)]
pub struct ExportArgs {
    #[clap(flatten)]
    data: DataArgs,

    /// Output file, prints to stdout when omitted.
    #[clap(long)]
    to: Option<PathBuf>,
}

impl ExportArgs {
    /// Export the rows between `--start` and `--end`, inclusive.
    ///
    /// An omitted or unparseable bound leaves that side open.
    #[instrument(skip_all, fields(data = %self.data.location))]
    pub async fn run(self) -> Result {
        let rows = self.data.open()?.load(&self.data.primary_file).await?;
        let observations = normalize(&rows);
        let selected = select(
            &observations,
            self.data.start.as_deref().unwrap_or_default(),
            self.data.end.as_deref().unwrap_or_default(),
        );
        let csv = to_csv(&selected)?;
        match self.to {
            Some(path) => {
                tokio::fs::write(&path, csv)
                    .await
                    .with_context(|| format!("failed to write `{}`", path.display()))?;
                info!(path = %path.display(), n_rows = selected.len(), "exported");
            }
            None => println!("{csv}"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn export_between_labels() -> Result {
        let root = tempfile::tempdir()?;
        std::fs::write(
            root.path().join("primary.csv"),
            "Datetime,Load_MW\n2024-01-01 00:00,10\n2024-01-01 01:00,12\nbroken,1\n",
        )?;
        let data = root.path().display().to_string();
        let to = root.path().join("window.csv").display().to_string();
        let args = ExportArgs::try_parse_from([
            "export",
            "--data",
            data.as_str(),
            "--primary-file",
            "primary.csv",
            "--start",
            "2024-01-01 00:00",
            "--end",
            "2024-01-01 00:30",
            "--to",
            to.as_str(),
        ])?;
        args.run().await?;
        let exported = std::fs::read_to_string(&to)?;
        assert_eq!(exported.lines().count(), 2);
        assert!(exported.ends_with("\n2024-01-01 00:00,10,,,,,"));
        Ok(())
    }
}
