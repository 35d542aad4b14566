// # dyndns53 - credential database administration
//
// ```bash
// dyndns53 upload-database hosts.csv
// dyndns53 download-database > hosts.csv
// ```
//
// Storage is configured through the same environment variables as the
// daemon (`DYNDNS_STORAGE`, `DYNDNS_BUCKET`, `DYNDNS_DATABASE`,
// `DYNDNS_DATABASE_PATH`, `AWS_*`). Logs go to stderr at `warn` unless
// `DYNDNS_LOG_LEVEL` says otherwise; stdout carries only command output.

use dyndns53_admin::{Admin, Outcome};
use dyndns53_core::config::{ENV_LOG_LEVEL, env_lookup, parse_log_level};
use dyndns53_core::{BackendRegistry, BlobStore, StorageConfig, TracedBlobStore};
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Process exit codes
#[derive(Debug, Clone, Copy)]
enum AdminExitCode {
    /// Command completed
    Success = 0,
    /// Usage, configuration or runtime failure
    Failure = 1,
}

impl From<AdminExitCode> for ExitCode {
    fn from(code: AdminExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    let log_level = match env_lookup(ENV_LOG_LEVEL).filter(|v| !v.trim().is_empty()) {
        Some(level) => match parse_log_level(&level) {
            Ok(level) => level,
            Err(e) => {
                eprintln!("{}", e);
                return AdminExitCode::Failure.into();
            }
        },
        None => Level::WARN,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return AdminExitCode::Failure.into();
    }

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to create tokio runtime: {}", e);
            return AdminExitCode::Failure.into();
        }
    };

    let registry = BackendRegistry::with_builtins();
    #[cfg(feature = "aws")]
    dyndns53_aws::register(&registry);

    let admin = Admin::new(move || {
        let config = StorageConfig::from_env()?;
        let store = registry.create_blob_store(&config)?;
        let traced: Box<dyn BlobStore> = Box::new(TracedBlobStore::new(store));
        Ok(traced)
    });

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut stdout = std::io::stdout();

    match rt.block_on(admin.run(args.as_slice(), &mut stdout)) {
        Ok(Outcome::Success) => AdminExitCode::Success.into(),
        Ok(Outcome::Usage(message)) => {
            eprintln!("{}", message);
            AdminExitCode::Failure.into()
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            AdminExitCode::Failure.into()
        }
    }
}
