use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value as JsonValue;
use tracing::debug;

use crate::config::RegistryConfig;
use crate::definition::{Definition, Update};
use crate::error::{RegistryError, Result};
use crate::value::Value;

/// Catalog of the reference vehicle, tagged at load time.
const REFERENCE_CATALOG: &str = include_str!("../catalog/vehicle.json");

/// Untagged catalog: group -> variable name -> default value.
pub type Catalog = BTreeMap<String, BTreeMap<String, Value>>;

/// Immutable catalog of control variables, indexed by tag and by name.
///
/// Built once at startup and shared as `Arc<Registry>`; there is no way to
/// mutate it afterwards.
#[derive(Debug)]
pub struct Registry {
    by_tag: Vec<Arc<Definition>>,
    by_name: HashMap<String, HashMap<String, u32>>,
}

impl Registry {
    /// Build from explicit definitions.
    ///
    /// Tags must be exactly `0..n` (in any order) and `(group, name)` pairs
    /// must be unique.
    pub fn from_definitions(definitions: Vec<Definition>) -> Result<Self> {
        let count = definitions.len();
        let mut slots: Vec<Option<Arc<Definition>>> = vec![None; count];
        let mut by_name: HashMap<String, HashMap<String, u32>> = HashMap::new();

        for definition in definitions {
            if definition.zero_value.kind() != definition.kind {
                return Err(RegistryError::InvalidCatalog(format!(
                    "'{}' default value is not {}",
                    definition.path(),
                    definition.kind
                )));
            }

            let index = definition.tag as usize;
            if index >= count {
                return Err(RegistryError::InvalidCatalog(format!(
                    "tag {} of '{}' is outside the dense range 0..{count}",
                    definition.tag,
                    definition.path()
                )));
            }
            if slots[index].is_some() {
                return Err(RegistryError::InvalidCatalog(format!(
                    "tag {} assigned twice",
                    definition.tag
                )));
            }

            let names = by_name.entry(definition.group.clone()).or_default();
            if names.insert(definition.name.clone(), definition.tag).is_some() {
                return Err(RegistryError::InvalidCatalog(format!(
                    "duplicate variable '{}'",
                    definition.path()
                )));
            }

            slots[index] = Some(Arc::new(definition));
        }

        // Every slot is filled: `count` distinct tags all below `count`.
        let by_tag = slots.into_iter().flatten().collect();
        Ok(Self { by_tag, by_name })
    }

    /// Build from an untagged catalog.
    ///
    /// Tags are assigned from zero walking groups, then names, in byte order.
    pub fn from_catalog(catalog: &Catalog) -> Result<Self> {
        let mut definitions = Vec::new();
        let mut tag = 0u32;
        for (group, vars) in catalog {
            for (name, zero) in vars {
                definitions.push(Definition::new(tag, group.clone(), name.clone(), *zero));
                tag += 1;
            }
        }
        Self::from_definitions(definitions)
    }

    /// Parse a JSON catalog (`{"group": {"name": default, ...}, ...}`).
    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::from_json_str_with_config(json, RegistryConfig::default())
    }

    /// Parse a JSON catalog with explicit limits.
    pub fn from_json_str_with_config(json: &str, config: RegistryConfig) -> Result<Self> {
        let root: JsonValue = serde_json::from_str(json)?;
        let catalog = parse_catalog(&root)?;

        let count: usize = catalog.values().map(BTreeMap::len).sum();
        if count > config.max_variables {
            return Err(RegistryError::InvalidCatalog(format!(
                "variable count exceeds configured max ({}): {count}",
                config.max_variables
            )));
        }

        let registry = Self::from_catalog(&catalog)?;
        debug!(variables = registry.len(), "catalog loaded");
        Ok(registry)
    }

    /// Load a JSON catalog file.
    pub fn from_path(path: &Path) -> Result<Self> {
        Self::from_path_with_config(path, RegistryConfig::default())
    }

    /// Load a JSON catalog file with explicit limits.
    pub fn from_path_with_config(path: &Path, config: RegistryConfig) -> Result<Self> {
        let file = std::fs::File::open(path)
            .map_err(|err| RegistryError::LoadFailed(format!("{}: {err}", path.display())))?;
        let metadata = file
            .metadata()
            .map_err(|err| RegistryError::LoadFailed(err.to_string()))?;
        if !metadata.is_file() {
            return Err(RegistryError::LoadFailed(format!(
                "not a regular file: {}",
                path.display()
            )));
        }
        if metadata.len() > config.max_catalog_size as u64 {
            return Err(RegistryError::LoadFailed(format!(
                "catalog file too large ({} bytes): {}",
                metadata.len(),
                path.display()
            )));
        }

        let read_limit = u64::try_from(config.max_catalog_size.saturating_add(1)).unwrap_or(u64::MAX);
        let mut content = String::new();
        file.take(read_limit)
            .read_to_string(&mut content)
            .map_err(|err| {
                RegistryError::LoadFailed(format!("failed reading {}: {err}", path.display()))
            })?;
        if content.len() > config.max_catalog_size {
            return Err(RegistryError::LoadFailed(format!(
                "catalog file too large while reading: {}",
                path.display()
            )));
        }

        Self::from_json_str_with_config(&content, config)
    }

    /// The catalog compiled into this binary for the reference vehicle.
    pub fn reference() -> Self {
        match Self::from_json_str(REFERENCE_CATALOG) {
            Ok(registry) => registry,
            Err(err) => panic!("embedded reference catalog is invalid: {err}"),
        }
    }

    pub fn lookup_by_name(&self, group: &str, name: &str) -> Result<&Arc<Definition>> {
        self.by_name
            .get(group)
            .and_then(|names| names.get(name))
            .map(|tag| &self.by_tag[*tag as usize])
            .ok_or_else(|| RegistryError::NotFound {
                group: group.to_string(),
                name: name.to_string(),
            })
    }

    /// Resolve a wire tag. Negative and out-of-range tags are unknown.
    pub fn lookup_by_tag(&self, tag: i64) -> Result<&Arc<Definition>> {
        usize::try_from(tag)
            .ok()
            .and_then(|index| self.by_tag.get(index))
            .ok_or(RegistryError::UnknownTag(tag))
    }

    /// Look up `group.name` and bind `value` to it.
    pub fn bind(&self, group: &str, name: &str, value: Option<Value>) -> Result<Update> {
        let definition = self.lookup_by_name(group, name)?;
        Update::bind(Arc::clone(definition), value)
    }

    /// Definitions in tag order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Definition>> {
        self.by_tag.iter()
    }

    /// Group names, sorted.
    pub fn groups(&self) -> Vec<&str> {
        let mut groups: Vec<&str> = self.by_name.keys().map(String::as_str).collect();
        groups.sort_unstable();
        groups
    }

    pub fn len(&self) -> usize {
        self.by_tag.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_tag.is_empty()
    }
}

fn parse_catalog(root: &JsonValue) -> Result<Catalog> {
    let groups = root
        .as_object()
        .ok_or_else(|| RegistryError::InvalidCatalog("top level must be an object".into()))?;

    let mut catalog = Catalog::new();
    for (group, vars) in groups {
        let vars = vars.as_object().ok_or_else(|| {
            RegistryError::InvalidCatalog(format!("group '{group}' must be an object"))
        })?;
        let entry = catalog.entry(group.clone()).or_default();
        for (name, default) in vars {
            entry.insert(name.clone(), parse_default(group, name, default)?);
        }
    }
    Ok(catalog)
}

fn parse_default(group: &str, name: &str, default: &JsonValue) -> Result<Value> {
    let invalid = || {
        RegistryError::InvalidCatalog(format!(
            "'{group}.{name}' default must be an int32, a float, or a bool"
        ))
    };

    match default {
        JsonValue::Bool(v) => Ok(Value::Bool(*v)),
        JsonValue::Number(n) if n.is_i64() || n.is_u64() => n
            .as_i64()
            .and_then(|v| i32::try_from(v).ok())
            .map(Value::Int)
            .ok_or_else(invalid),
        JsonValue::Number(n) => n.as_f64().map(Value::Float).ok_or_else(invalid),
        _ => Err(invalid()),
    }
}
