mod aggregate;
mod auth;
mod config;
mod export;
mod filter;
mod logging;
mod models;
mod remote;
mod run;
mod storage;
mod sync;
mod ui;

use anyhow::Result;

use crate::config::Config;
use crate::remote::SqliteRemote;
use crate::storage::LocalStore;
use crate::sync::Tracker;

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let config = Config::load()?;
    if let Err(e) = logging::init(&config) {
        eprintln!("Warning: logging disabled: {e:#}");
    }
    tracing::info!(
        local = %config.local_db.display(),
        remote = %config.remote_db.display(),
        "starting financepro"
    );

    let local = LocalStore::open(&config.local_db)?;
    let remote = SqliteRemote::open(&config.remote_db, config.bcrypt_cost);
    if !remote.is_available() {
        tracing::warn!(
            remote = %config.remote_db.display(),
            "cloud store unreachable, starting in local mode"
        );
    }
    let mut tracker = Tracker::open(local, remote);

    match args.len() {
        1 => run::as_tui(&mut tracker),
        2.. => run::as_cli(&args, &mut tracker),
        _ => {
            eprintln!("Usage: financepro [command]");
            Ok(())
        }
    }
}
