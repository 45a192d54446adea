use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use super::entity::DomainEntity;

pub fn load_entities(path: &Path) -> Result<Vec<DomainEntity>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read entity file {}", path.display()))?;
    let entities = parse_entities(&raw)
        .with_context(|| format!("failed to parse entity file {}", path.display()))?;
    info!(path = %path.display(), count = entities.len(), "loaded domain entities");
    Ok(entities)
}

/// Accepts either a bare JSON array of entities or an object carrying an
/// `entities` array. Entries that do not deserialize are skipped.
pub fn parse_entities(raw: &str) -> Result<Vec<DomainEntity>> {
    let parsed: Value = serde_json::from_str(raw).context("invalid JSON in entity data")?;

    let items = match parsed {
        Value::Array(items) => items,
        Value::Object(mut object) => match object.remove("entities") {
            Some(Value::Array(items)) => items,
            _ => return Err(anyhow!("entity object has no `entities` array")),
        },
        _ => return Err(anyhow!("entity data must be an array or an object")),
    };

    let mut entities = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match DomainEntity::deserialize(item) {
            Ok(entity) => entities.push(entity),
            Err(error) => warn!(index, %error, "skipping malformed entity"),
        }
    }

    Ok(entities)
}
