// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of SolarION.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! Geohash-based spatial cache.
//!
//! Nearby sites share upstream responses: a lookup scans the query cell and
//! its 8 neighbours (precision 5 ≈ 4.9 km cell edge), verifies the true
//! distance with the haversine formula and returns the closest entry inside
//! the configured radius. `get`/`set` never fail — any I/O or codec problem
//! degrades to a miss.

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

pub const DEFAULT_PRECISION: usize = 5;
pub const DEFAULT_RADIUS_KM: f64 = 15.0;
pub const DEFAULT_TTL_DAYS: u64 = 30;

/// Great-circle distance between two coordinates in kilometres.
pub fn haversine_distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (lat1_rad, lon1_rad) = (lat1.to_radians(), lon1.to_radians());
    let (lat2_rad, lon2_rad) = (lat2.to_radians(), lon2.to_radians());
    let dlat = lat2_rad - lat1_rad;
    let dlon = lon2_rad - lon1_rad;
    let a = (dlat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * a.sqrt().asin() * 6371.0
}

/// Stored entry: self-describing so the reader can verify the distance to
/// the coordinate the data was actually produced at.
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    lat: f64,
    lon: f64,
    geohash: String,
    /// ISO 8601 write time, informational (TTL uses the file mtime)
    timestamp: String,
    params: BTreeMap<String, String>,
    data: serde_json::Value,
}

/// Cache statistics for the maintenance surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub total_files: usize,
    pub total_size_mb: f64,
    pub precision: usize,
    pub radius_km: f64,
    pub ttl_days: u64,
}

/// Spatial cache over normalised weather frames and POA series.
#[derive(Debug, Clone)]
pub struct GeohashCache {
    dir: PathBuf,
    precision: usize,
    radius_km: f64,
    ttl: Duration,
}

impl GeohashCache {
    pub fn new(dir: impl Into<PathBuf>, precision: usize, radius_km: f64, ttl_days: u64) -> Self {
        let dir = dir.into();
        if let Err(e) = std::fs::create_dir_all(&dir) {
            warn!("Could not create cache directory {:?}: {}", dir, e);
        }
        info!(
            "GeohashCache initialized: precision={}, radius={}km, ttl={}days",
            precision, radius_km, ttl_days
        );
        Self {
            dir,
            precision,
            radius_km,
            ttl: Duration::from_secs(ttl_days * 24 * 3600),
        }
    }

    pub fn with_defaults(dir: impl Into<PathBuf>) -> Self {
        Self::new(dir, DEFAULT_PRECISION, DEFAULT_RADIUS_KM, DEFAULT_TTL_DAYS)
    }

    /// Key format `pvgis:{geohash}:{k1_v1}:{k2_v2}:…` with sorted params.
    fn cache_key(geohash: &str, params: &BTreeMap<String, String>) -> String {
        let mut parts = vec!["pvgis".to_owned(), geohash.to_owned()];
        for (k, v) in params {
            parts.push(format!("{k}_{v}"));
        }
        parts.join(":")
    }

    fn file_for_key(&self, key: &str) -> PathBuf {
        let digest = md5::compute(key.as_bytes());
        self.dir.join(format!("geohash_{digest:x}.json"))
    }

    /// TTL check; expired files are deleted on discovery. A reader racing
    /// the delete simply sees a miss.
    fn is_valid(&self, path: &Path) -> bool {
        let Ok(meta) = std::fs::metadata(path) else {
            return false;
        };
        let age = meta
            .modified()
            .ok()
            .and_then(|m| SystemTime::now().duration_since(m).ok())
            .unwrap_or_default();
        if age > self.ttl {
            debug!("Cache expired: {:?}", path);
            if let Err(e) = std::fs::remove_file(path) {
                warn!("Could not remove expired cache file {:?}: {}", path, e);
            }
            return false;
        }
        true
    }

    /// Looks up the closest cached entry within the radius. Never fails.
    pub fn get<T: DeserializeOwned>(
        &self,
        lat: f64,
        lon: f64,
        params: &BTreeMap<String, String>,
    ) -> Option<T> {
        let center = encode_geohash(lat, lon, self.precision)?;
        let cells = neighbor_cells(&center);
        debug!("Searching cache in {} cells for ({lat}, {lon})", cells.len());

        let mut closest: Option<(f64, CacheEntry)> = None;
        for cell in &cells {
            let path = self.file_for_key(&Self::cache_key(cell, params));
            if !self.is_valid(&path) {
                continue;
            }
            let entry: CacheEntry = match std::fs::read(&path)
                .map_err(anyhow::Error::from)
                .and_then(|bytes| serde_json::from_slice(&bytes).map_err(anyhow::Error::from))
            {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Error reading cache file {:?}: {}", path, e);
                    continue;
                }
            };
            let distance = haversine_distance_km(lat, lon, entry.lat, entry.lon);
            debug!("Found cache in cell {}: distance={:.2}km", cell, distance);
            if distance <= self.radius_km
                && closest.as_ref().is_none_or(|(best, _)| distance < *best)
            {
                closest = Some((distance, entry));
            }
        }

        match closest {
            Some((distance, entry)) => {
                info!(
                    "Cache HIT: data at {:.2}km from target ({lat}, {lon})",
                    distance
                );
                serde_json::from_value(entry.data).ok()
            }
            None => {
                debug!(
                    "Cache MISS: nothing within {}km of ({lat}, {lon})",
                    self.radius_km
                );
                None
            }
        }
    }

    /// Stores an entry under the coordinate it was produced at. Writes go
    /// through a temp file and an atomic rename so concurrent writers leave
    /// one winner and readers never observe a partial file. Never fails.
    pub fn set<T: Serialize>(
        &self,
        lat: f64,
        lon: f64,
        data: &T,
        params: &BTreeMap<String, String>,
    ) -> bool {
        let Some(geohash) = encode_geohash(lat, lon, self.precision) else {
            warn!("Could not encode geohash for ({lat}, {lon})");
            return false;
        };
        let data = match serde_json::to_value(data) {
            Ok(v) => v,
            Err(e) => {
                warn!("Error serializing cache payload: {}", e);
                return false;
            }
        };
        let entry = CacheEntry {
            lat,
            lon,
            geohash: geohash.clone(),
            timestamp: Utc::now().to_rfc3339(),
            params: params.clone(),
            data,
        };
        let path = self.file_for_key(&Self::cache_key(&geohash, params));

        let written = (|| -> anyhow::Result<()> {
            let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
            serde_json::to_writer(&mut tmp, &entry)?;
            tmp.flush()?;
            tmp.persist(&path)?;
            Ok(())
        })();

        match written {
            Ok(()) => {
                info!("Cache SET: saved data for ({lat}, {lon}) in cell {geohash}");
                true
            }
            Err(e) => {
                warn!("Error writing cache file {:?}: {}", path, e);
                false
            }
        }
    }

    pub fn stats(&self) -> CacheStats {
        let files = self.cache_files();
        let total_size: u64 = files
            .iter()
            .filter_map(|p| std::fs::metadata(p).ok())
            .map(|m| m.len())
            .sum();
        CacheStats {
            total_files: files.len(),
            total_size_mb: total_size as f64 / (1024.0 * 1024.0),
            precision: self.precision,
            radius_km: self.radius_km,
            ttl_days: self.ttl.as_secs() / (24 * 3600),
        }
    }

    /// Deletes expired entries; returns how many were removed.
    pub fn clear_expired(&self) -> usize {
        let before = self.cache_files().len();
        for path in self.cache_files() {
            let _ = self.is_valid(&path);
        }
        before.saturating_sub(self.cache_files().len())
    }

    /// Deletes every entry; returns how many were removed.
    pub fn clear_all(&self) -> usize {
        let mut removed = 0;
        for path in self.cache_files() {
            match std::fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => warn!("Could not remove {:?}: {}", path, e),
            }
        }
        info!("Cleared geohash cache: {} files removed", removed);
        removed
    }

    fn cache_files(&self) -> Vec<PathBuf> {
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("geohash_") && n.ends_with(".json"))
            })
            .collect()
    }
}

/// Encodes a coordinate at the given precision; None when out of range.
pub fn encode_geohash(lat: f64, lon: f64, precision: usize) -> Option<String> {
    geohash::encode(geohash::Coord { x: lon, y: lat }, precision).ok()
}

/// Decodes a geohash back to its cell-centre coordinate (lat, lon).
pub fn decode_geohash(hash: &str) -> Option<(f64, f64)> {
    geohash::decode(hash).ok().map(|(c, _, _)| (c.y, c.x))
}

/// Centre cell plus its 8 neighbours (3×3 grid).
fn neighbor_cells(center: &str) -> Vec<String> {
    match geohash::neighbors(center) {
        Ok(n) => vec![
            center.to_owned(),
            n.n,
            n.ne,
            n.e,
            n.se,
            n.s,
            n.sw,
            n.w,
            n.nw,
        ],
        Err(e) => {
            warn!("Error getting neighbors for {}: {}", center, e);
            vec![center.to_owned()]
        }
    }
}
