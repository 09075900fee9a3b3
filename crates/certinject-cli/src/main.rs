use std::{fs, path::PathBuf, time::Duration};

use clap::Parser;
use color_eyre::{eyre::eyre, Result};

use certinject_core::{clean, inject, resolve_store, store::DirStore, CleanSummary};

mod cli;

use cli::{Cli, Command};

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let store_root = resolve_store_root(cli.store_root.clone())?;
    let store = DirStore::new(&store_root);

    match &cli.command {
        Command::Init => {
            let resolved = resolve_store(&cli.physical_store, &cli.logical_store)?;
            store.create_container(resolved.hive, &resolved.key_path)?;
            emit(&cli, &format!("initialized store {resolved}"), || {
                serde_json::json!({ "status": "ok", "store": resolved.to_string() })
            });
        }
        Command::Inject { cert } => {
            let der = fs::read(cert)
                .map_err(|err| eyre!("couldn't read certificate {}: {err}", cert.display()))?;
            let fingerprint = inject(&store, &der, &cli.physical_store, &cli.logical_store)?;
            emit(&cli, &format!("injected certificate {fingerprint}"), || {
                serde_json::json!({ "status": "ok", "fingerprint": fingerprint })
            });
        }
        Command::Clean { expire_period } => {
            let summary = clean(
                &store,
                &cli.physical_store,
                &cli.logical_store,
                Duration::from_secs(*expire_period),
            )?;
            emit(&cli, &describe_clean(&summary), || {
                serde_json::json!({ "status": "ok", "summary": summary })
            });
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = format!("certinject_core={level},certinject_cli={level}");
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn resolve_store_root(flag: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(root) = flag {
        return Ok(root);
    }
    let home = dirs_next::home_dir().ok_or_else(|| eyre!("unable to determine home directory"))?;
    Ok(home.join(".certinject").join("store"))
}

fn describe_clean(summary: &CleanSummary) -> String {
    let mut line = format!(
        "scanned {} entries: deleted {}, fresh {}, not ours {}",
        summary.scanned, summary.deleted, summary.skipped_fresh, summary.skipped_unmarked
    );
    if !summary.errors.is_empty() {
        line.push_str(&format!(", {} errors", summary.errors.len()));
        for err in &summary.errors {
            line.push_str(&format!("\n  {}: {}", err.entry, err.error));
        }
    }
    line
}

fn emit(cli: &Cli, human: &str, json: impl FnOnce() -> serde_json::Value) {
    if cli.json {
        println!("{}", json());
    } else if !cli.quiet {
        println!("{human}");
    }
}
