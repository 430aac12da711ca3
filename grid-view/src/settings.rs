//! Configuration, catalog and date-seed sources for the viewer.
//!
//! Both files are optional: a missing or unreadable file falls back to the
//! built-in defaults with a log line, never an error dialog.

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use grid_core::{
    catalog::{ContentUnit, UnitStatus},
    config::Config,
};
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

/// Environment variable naming the JSON configuration file.
pub const CONFIG_ENV: &str = "DEEPGRID_CONFIG";
/// Environment variable naming the JSON catalog file.
pub const CATALOG_ENV: &str = "DEEPGRID_CATALOG";

const DEFAULT_CONFIG_FILE: &str = "deepgrid.json";

pub fn config_path() -> PathBuf {
    env::var_os(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// Reads a config file, clamping out-of-range values.
pub fn read_config(path: &Path) -> Result<Config> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let raw: Config = serde_json::from_str(&text)
        .with_context(|| format!("parsing config {}", path.display()))?;
    let cfg = raw.clone().sanitized();
    if cfg != raw {
        warn!(path = %path.display(), "config values out of range were clamped");
    }
    Ok(cfg)
}

/// Loads the configuration, or the defaults if there is none.
pub fn load_config() -> Config {
    let path = config_path();
    if !path.exists() {
        debug!(path = %path.display(), "no config file, using defaults");
        return Config::default();
    }
    match read_config(&path) {
        Ok(cfg) => {
            info!(path = %path.display(), "loaded config");
            cfg
        }
        Err(e) => {
            warn!(error = format!("{e:#}"), "falling back to default config");
            Config::default()
        }
    }
}

pub fn read_catalog(path: &Path) -> Result<Vec<ContentUnit>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading catalog {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing catalog {}", path.display()))
}

/// Loads the catalog named by [`CATALOG_ENV`], else the sample catalog.
pub fn load_catalog() -> Vec<ContentUnit> {
    let Some(path) = env::var_os(CATALOG_ENV).map(PathBuf::from) else {
        return sample_catalog();
    };
    match read_catalog(&path) {
        Ok(units) => {
            info!(path = %path.display(), units = units.len(), "loaded catalog");
            units
        }
        Err(e) => {
            warn!(error = format!("{e:#}"), "falling back to sample catalog");
            sample_catalog()
        }
    }
}

const SCENES: [&str; 6] = ["tidepool", "orchard", "foundry", "archive", "aurora", "market"];
const MECHANISMS: [&str; 7] = [
    "feedback", "diffusion", "selection", "drift", "symbiosis", "erosion", "resonance",
];
const SUBJECTS: [&str; 10] = [
    "Lantern", "Spindle", "Harbor", "Lattice", "Ember", "Canopy", "Signal", "Quarry", "Meridian",
    "Thicket",
];

/// Generated catalog used when no catalog file is configured.
pub fn sample_catalog() -> Vec<ContentUnit> {
    let mut units = Vec::with_capacity(SCENES.len() * SUBJECTS.len());
    for (s, scene) in SCENES.iter().enumerate() {
        for (k, subject) in SUBJECTS.iter().enumerate() {
            let primary = MECHANISMS[(s + k) % MECHANISMS.len()];
            let secondary = MECHANISMS[(s * 3 + k * 2 + 1) % MECHANISMS.len()];
            let mut mechanisms = vec![primary.to_string()];
            if secondary != primary {
                mechanisms.push(secondary.to_string());
            }
            units.push(ContentUnit {
                id: format!("{scene}-{}", subject.to_lowercase()),
                title: format!("The {subject} of the {scene}"),
                summary: format!("A {scene} study of {primary} and {secondary}."),
                scene: scene.to_string(),
                mechanisms,
                status: if (s + k) % 13 == 12 {
                    UnitStatus::Draft
                } else {
                    UnitStatus::Live
                },
            });
        }
    }
    units
}

/// Calendar day as `YYYYMMDD`, the date part of every layer seed.
pub fn date_seed(date: NaiveDate) -> u32 {
    date.year().max(0) as u32 * 10_000 + date.month() * 100 + date.day()
}
