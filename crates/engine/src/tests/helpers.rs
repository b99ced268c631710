use crate::Engine;
use config::Config;
use std::fs;
use std::path::Path;

pub fn open_in(dir: &Path, wal_batch_bytes: usize) -> Engine {
    let cfg = Config::default()
        .with_wal_path(dir.join("citybits.wal"))
        .with_sst_dir(dir.join("sst"))
        .with_wal_batch_bytes(wal_batch_bytes);
    Engine::open(&cfg).unwrap()
}

pub fn count_sst_files(dir: &Path) -> usize {
    fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|s| s.to_str())
                .map(|ext| ext == "sst")
                .unwrap_or(false)
        })
        .count()
}
