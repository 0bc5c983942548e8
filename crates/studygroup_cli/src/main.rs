//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `studygroup_core` linkage and store bootstrap from the shell.
//! - Keep output deterministic for quick local sanity checks.

use std::process::ExitCode;
use studygroup_core::db::migrations::current_version;
use studygroup_core::db::open_db;
use studygroup_core::{core_version, init_logging, ping, CoreConfig, SqliteStore};

fn main() -> ExitCode {
    let config = match CoreConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("studygroup config error: {err}");
            return ExitCode::FAILURE;
        }
    };

    if let Some(log_dir) = config.log_dir.as_deref() {
        if let Err(err) = init_logging(config.log_level, log_dir) {
            eprintln!("studygroup logging disabled: {err}");
        }
    }

    println!("studygroup_core ping={}", ping());
    println!("studygroup_core version={}", core_version());

    let conn = match open_db(&config.db_path) {
        Ok(conn) => conn,
        Err(err) => {
            eprintln!("studygroup db open failed path={} error={err}", config.db_path.display());
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = SqliteStore::try_new(&conn) {
        eprintln!("studygroup store not ready: {err}");
        return ExitCode::FAILURE;
    }

    match current_version(&conn) {
        Ok(version) => {
            println!("studygroup_core db={} schema_version={version}", config.db_path.display());
            log::info!("event=cli_probe module=cli status=ok schema_version={version}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("studygroup schema probe failed: {err}");
            ExitCode::FAILURE
        }
    }
}
