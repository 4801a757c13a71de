//! YAML persistence for configuration files (profiler thresholds and domain
//! pattern libraries).

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

pub fn from_str<T: DeserializeOwned>(input: &str) -> Result<T> {
    Ok(serde_yaml::from_str(input)?)
}

pub fn load_from_path<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("Opening YAML file {path:?}"))?;
    from_str(&raw).with_context(|| format!("Parsing YAML file {path:?}"))
}

pub fn to_string<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_yaml::to_string(value)?)
}

pub fn save_to_path<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    let serialized = to_string(data)?;
    fs::write(path, serialized).with_context(|| format!("Creating YAML file {path:?}"))
}
