//! File loading for the CLI: JSON (optionally zstd-compressed) and CSV bars

use anyhow::{Context, Result};
use ltp_scoring::{Bar, ScoringConfig};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

fn is_zstd(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext == "zst")
}

/// Read a JSON document; `*.zst` files are decompressed first
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;

    let bytes = if is_zstd(path) {
        let decoded = zstd::decode_all(&raw[..])
            .with_context(|| format!("Failed to decompress {:?}", path))?;
        debug!("Decompressed {:?}: {} → {} bytes", path, raw.len(), decoded.len());
        decoded
    } else {
        raw
    };

    serde_json::from_slice(&bytes).with_context(|| format!("Failed to parse JSON in {:?}", path))
}

/// Write pretty JSON to `path` (zstd level 3 for `*.zst`), or stdout when `None`
pub fn write_json<T: Serialize>(value: &T, path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        println!("{}", serde_json::to_string_pretty(value)?);
        return Ok(());
    };

    let json = serde_json::to_vec_pretty(value)?;
    let bytes = if is_zstd(path) {
        zstd::encode_all(&json[..], 3)?
    } else {
        json
    };
    std::fs::write(path, bytes).with_context(|| format!("Failed to write {:?}", path))?;
    info!("Wrote {:?}", path);
    Ok(())
}

/// Load bars from a CSV with a header row:
/// `timestamp,open,high,low,close,volume` (RFC 3339 timestamps)
pub fn load_bars_csv(path: &Path) -> Result<Vec<Bar>> {
    let mut reader = csv::Reader::from_path(path).with_context(|| format!("Failed to open {:?}", path))?;

    let bars = reader
        .deserialize::<Bar>()
        .enumerate()
        .map(|(i, row)| row.with_context(|| format!("Bad bar on line {} of {:?}", i + 2, path)))
        .collect::<Result<Vec<Bar>>>()?;

    info!("Loaded {} bars from {:?}", bars.len(), path);
    Ok(bars)
}

/// Effective scoring config: defaults, overridden by the JSON file if given
pub fn load_config(path: Option<&Path>) -> Result<ScoringConfig> {
    let Some(path) = path else {
        return Ok(ScoringConfig::default());
    };

    let json = std::fs::read_to_string(path).with_context(|| format!("Failed to read config {:?}", path))?;
    let config = ScoringConfig::from_json_str(&json).with_context(|| format!("Invalid config {:?}", path))?;
    info!("Loaded scoring config from {:?}", path);
    Ok(config)
}
