//! Command execution
//!
//! [`Admin`] resolves the command line against the command table and runs
//! the selected action. Storage is created lazily, so `help` and argument
//! errors never need storage configuration.

use anyhow::{Context, Result};
use clap::ArgMatches;
use dyndns53_core::BlobStore;
use std::io::Write;
use std::path::Path;
use tracing::{Instrument, info, info_span};

use crate::commands::{self, Action, CommandSpec};

/// Builds the credential database store on first use
pub type StorageFactory =
    Box<dyn Fn() -> dyndns53_core::Result<Box<dyn BlobStore>> + Send + Sync>;

/// How a command line finished
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The command ran
    Success,
    /// The command line was rejected; the message says why
    Usage(String),
}

/// Administration command runner
pub struct Admin {
    storage: StorageFactory,
}

impl std::fmt::Debug for Admin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Admin").finish_non_exhaustive()
    }
}

impl Admin {
    /// Create a runner using `storage` to reach the database
    pub fn new<F>(storage: F) -> Self
    where
        F: Fn() -> dyndns53_core::Result<Box<dyn BlobStore>> + Send + Sync + 'static,
    {
        Self {
            storage: Box::new(storage),
        }
    }

    /// Run the command line `args` (without the program name)
    ///
    /// Command output (help text, downloaded data) is written to `out`.
    /// Usage problems are returned as [`Outcome::Usage`]; configuration,
    /// storage and I/O failures as errors.
    pub async fn run<S: AsRef<str>>(&self, args: &[S], out: &mut dyn Write) -> Result<Outcome> {
        let Some(name) = args.first().map(AsRef::as_ref) else {
            out.write_all(commands::general_help().as_bytes())?;
            return Ok(Outcome::Success);
        };

        let Some(spec) = commands::find(name) else {
            return Ok(Outcome::Usage(commands::unknown_command(name)));
        };

        let argv = std::iter::once(commands::PROGRAM).chain(args.iter().map(AsRef::as_ref));
        let matches = match commands::command_tree().try_get_matches_from(argv) {
            Ok(matches) => matches,
            Err(_) => return Ok(Outcome::Usage(spec.usage())),
        };
        let Some((_, sub)) = matches.subcommand() else {
            return Ok(Outcome::Usage(spec.usage()));
        };

        let span = info_span!("command", name = spec.name);
        self.execute(spec, sub, out).instrument(span).await
    }

    async fn execute(
        &self,
        spec: &CommandSpec,
        matches: &ArgMatches,
        out: &mut dyn Write,
    ) -> Result<Outcome> {
        let arg = |index: usize| {
            spec.args
                .get(index)
                .and_then(|a| matches.get_one::<String>(a.name))
                .map(String::as_str)
        };

        match spec.action {
            Action::Help => help(arg(0), out),
            Action::UploadDatabase => {
                let input = arg(0).context("input file is required")?;
                self.upload(Path::new(input)).await?;
                Ok(Outcome::Success)
            }
            Action::DownloadDatabase => {
                self.download(arg(0).map(Path::new), out).await?;
                Ok(Outcome::Success)
            }
        }
    }

    fn store(&self) -> Result<Box<dyn BlobStore>> {
        (self.storage)().context("Failed to configure database storage")
    }

    async fn upload(&self, input: &Path) -> Result<()> {
        let data = tokio::fs::read(input)
            .await
            .with_context(|| format!("Failed to read {}", input.display()))?;

        let store = self.store()?;
        store
            .store(&data)
            .await
            .with_context(|| format!("Failed to upload to {}", store.location()))?;

        info!("Uploaded {} bytes to {}", data.len(), store.location());
        Ok(())
    }

    async fn download(&self, output: Option<&Path>, out: &mut dyn Write) -> Result<()> {
        let store = self.store()?;
        let data = store
            .fetch()
            .await
            .with_context(|| format!("Failed to download from {}", store.location()))?;

        match output {
            Some(path) => {
                tokio::fs::write(path, &data)
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                info!("Downloaded {} bytes to {}", data.len(), path.display());
            }
            None => {
                out.write_all(&data)?;
                out.flush()?;
            }
        }
        Ok(())
    }
}

fn help(topic: Option<&str>, out: &mut dyn Write) -> Result<Outcome> {
    let text = match topic {
        None => commands::general_help(),
        Some(name) => match commands::find(name) {
            Some(spec) => spec.help(),
            None => format!("{}\n", commands::unknown_command(name)),
        },
    };
    out.write_all(text.as_bytes())?;
    Ok(Outcome::Success)
}
