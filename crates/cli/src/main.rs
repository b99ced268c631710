//! # citybits - interactive shell
//!
//! A REPL over the citybits write path. Reads commands from stdin, runs them
//! against the [`engine::Engine`], and prints `OK` / `ERR ...` to stdout. All
//! storage logic lives in the engine; this binary only parses and reports.
//!
//! ## Commands
//!
//! ```text
//! PUT zone type x y value   Insert or update a key (value must be non-zero)
//! DEL zone type x y         Delete a key (writes a tombstone)
//! GET zone type x y         Memtable lookup (prints value, "(tombstone)" or "(nil)")
//! FLUSH [path]              Write the memtable to an SSTable
//! SYNC                      Force the WAL to stable storage
//! STATS                     Print engine debug info
//! EXIT / QUIT               Shut down (syncs the WAL)
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] crate for the `CITYBITS_*` environment variables.
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `warn`).

mod command;

use anyhow::Result;
use command::{Command, USAGE};
use config::Config;
use engine::Engine;
use std::io::{self, BufRead, Write};
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    let cfg = Config::from_env();
    let mut engine = Engine::open(&cfg)?;

    println!(
        "citybits started (wal={}, sst_dir={}, wal_batch={}B)",
        cfg.wal_path.display(),
        cfg.sst_dir.display(),
        cfg.wal_batch_bytes
    );
    println!("{}", USAGE);
    print!("> ");
    io::stdout().flush().ok();

    let stdin = io::stdin();

    for line in stdin.lock().lines() {
        let line = line?;
        match command::parse(&line) {
            Ok(Some(Command::Exit)) => break,
            Ok(Some(cmd)) => execute(&mut engine, cmd),
            Ok(None) => {}
            Err(e) => println!("ERR {:#}", e),
        }

        print!("> ");
        io::stdout().flush().ok();
    }

    match engine.close() {
        Ok(()) => println!("bye"),
        Err(e) => {
            tracing::error!(error = %format!("{:#}", e), "shutdown sync failed");
            println!("ERR shutdown: {:#}", e);
        }
    }
    Ok(())
}

fn execute(engine: &mut Engine, cmd: Command) {
    match cmd {
        Command::Put(key, value) => report(engine.put(key, value)),
        Command::Del(key) => report(engine.delete(key)),
        Command::Get(key) => match engine.get(&key) {
            Some(v) if v.is_tombstone() => println!("(tombstone)"),
            Some(v) => println!("{}", v),
            None => println!("(nil)"),
        },
        Command::Flush(path) => {
            let entries = engine.memtable().len();
            let res = match path {
                Some(p) => engine.flush_to_sstable(&p).map(|_| p),
                None => engine.flush(),
            };
            match res {
                Ok(p) => println!("OK ({} entries -> {})", entries, p.display()),
                Err(e) => println!("ERR flush failed: {:#}", e),
            }
        }
        Command::Sync => report(engine.sync()),
        Command::Stats => println!("{:?}", engine),
        Command::Exit => {}
    }
}

fn report(res: Result<()>) {
    match res {
        Ok(()) => println!("OK"),
        Err(e) => println!("ERR {:#}", e),
    }
}
