//! Loads a [`CatalogSnapshot`] from disk. The metadata store itself (CRUD,
//! the editor UI) is an external collaborator per spec §3; this is the
//! narrowest possible bridge from "a file on disk" to the `Catalog` trait.

use std::fs;
use std::path::Path;

use anyhow::Context;
use elevata_catalog_model::CatalogSnapshot;

pub fn load_catalog_snapshot(path: &str) -> anyhow::Result<CatalogSnapshot> {
    let raw = fs::read_to_string(Path::new(path)).with_context(|| format!("reading catalog snapshot from {path}"))?;
    let snapshot: CatalogSnapshot = serde_json::from_str(&raw).with_context(|| format!("parsing catalog snapshot at {path}"))?;
    Ok(snapshot)
}
