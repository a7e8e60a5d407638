//! Raw flow definitions and the sources they are read from.
//!
//! A [`FlowSource`] maps a flow name to its raw, unmerged definition. The
//! loader resolves inheritance and validation on top of it, so sources only
//! need to find and parse documents.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::FlowError;

/// Flow definition exactly as written, before inheritance is applied.
///
/// Every field is optional here so that a child definition can override only
/// the parts of its parent it cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawFlow {
    pub name: Option<String>,
    pub description: Option<String>,
    pub stages: Option<BTreeMap<String, RawStage>>,
    pub inherits: Option<String>,
    pub dead_ends: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawStage {
    pub description: Option<String>,
    pub next: Option<String>,
    pub fail: Option<String>,
    pub workers: Option<RawWorkers>,
    pub requires: Option<Vec<String>>,
    pub terminal: Option<bool>,
    pub skip: Option<bool>,
}

/// `workers:` is either a plain list or a map keyed by required class.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RawWorkers {
    List(Vec<String>),
    ByClass(BTreeMap<String, Vec<String>>),
}

impl RawFlow {
    /// Parse a single YAML document.
    ///
    /// Keys the loader does not know are ignored with a warning.
    pub fn from_yaml(name: &str, yaml: &str) -> Result<Self, FlowError> {
        let parse_err = |e: serde_yaml_ng::Error| FlowError::Parse {
            name: name.to_string(),
            message: e.to_string(),
        };
        let doc: serde_yaml_ng::Value = serde_yaml_ng::from_str(yaml).map_err(parse_err)?;
        for key in unknown_keys(&doc) {
            log::warn!("flow '{}': ignoring unknown key '{}'", name, key);
        }
        serde_yaml_ng::from_value(doc).map_err(parse_err)
    }

    /// Name of the parent flow, if this definition inherits from one.
    pub fn parent(&self) -> Option<&str> {
        self.inherits.as_deref().filter(|p| !p.is_empty())
    }
}

const TOP_KEYS: &[&str] = &["name", "description", "stages", "inherits", "dead_ends"];
const STAGE_KEYS: &[&str] = &["description", "next", "fail", "workers", "requires", "terminal", "skip"];

/// Dotted paths of keys outside the definition schema, e.g. `stages.open.notes`.
fn unknown_keys(doc: &serde_yaml_ng::Value) -> Vec<String> {
    let mut unknown = Vec::new();
    let Some(top) = doc.as_mapping() else {
        return unknown;
    };
    for (key, value) in top {
        let Some(key) = key.as_str() else {
            continue;
        };
        if !TOP_KEYS.contains(&key) {
            unknown.push(key.to_string());
            continue;
        }
        if key != "stages" {
            continue;
        }
        let Some(stages) = value.as_mapping() else {
            continue;
        };
        for (stage_name, stage) in stages {
            let (Some(stage_name), Some(stage)) = (stage_name.as_str(), stage.as_mapping()) else {
                continue;
            };
            for field in stage.keys().filter_map(|k| k.as_str()) {
                if !STAGE_KEYS.contains(&field) {
                    unknown.push(format!("stages.{}.{}", stage_name, field));
                }
            }
        }
    }
    unknown
}

/// Lookup contract between the loader and wherever definitions live.
pub trait FlowSource {
    /// Fetch the raw definition registered under `name`.
    ///
    /// Returns `Ok(None)` when no such definition exists; the loader turns
    /// that into [`FlowError::NotFound`].
    fn fetch(&self, name: &str) -> Result<Option<RawFlow>, FlowError>;

    /// Every flow name this source can serve, sorted.
    fn names(&self) -> Result<Vec<String>, FlowError>;
}

/// A directory of `<name>.yaml` files.
///
/// A leading underscore marks an abstract base flow (`_base.yaml` is served
/// as `base`). A plain `<name>.yaml` wins when both spellings exist.
#[derive(Debug, Clone)]
pub struct DirSource {
    dir: PathBuf,
}

impl DirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> Option<PathBuf> {
        [format!("{}.yaml", name), format!("_{}.yaml", name)]
            .into_iter()
            .map(|file| self.dir.join(file))
            .find(|path| path.is_file())
    }
}

impl FlowSource for DirSource {
    fn fetch(&self, name: &str) -> Result<Option<RawFlow>, FlowError> {
        let Some(path) = self.path_for(name) else {
            log::debug!("no definition for flow '{}' in {}", name, self.dir.display());
            return Ok(None);
        };
        let content = std::fs::read_to_string(&path).map_err(|source| FlowError::Io {
            name: name.to_string(),
            source,
        })?;
        RawFlow::from_yaml(name, &content).map(Some)
    }

    fn names(&self) -> Result<Vec<String>, FlowError> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }
        let io_err = |source| FlowError::Io {
            name: self.dir.display().to_string(),
            source,
        };
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("yaml") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.strip_prefix('_').unwrap_or(stem).to_string());
            }
        }
        names.sort();
        names.dedup();
        Ok(names)
    }
}

/// Named YAML documents held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    documents: BTreeMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the document served for `name`.
    pub fn with(mut self, name: &str, yaml: &str) -> Self {
        self.insert(name, yaml);
        self
    }

    pub fn insert(&mut self, name: &str, yaml: &str) {
        self.documents.insert(name.to_string(), yaml.to_string());
    }
}

impl FlowSource for MemorySource {
    fn fetch(&self, name: &str) -> Result<Option<RawFlow>, FlowError> {
        self.documents
            .get(name)
            .map(|yaml| RawFlow::from_yaml(name, yaml))
            .transpose()
    }

    fn names(&self) -> Result<Vec<String>, FlowError> {
        Ok(self.documents.keys().cloned().collect())
    }
}

impl<S: FlowSource + ?Sized> FlowSource for &S {
    fn fetch(&self, name: &str) -> Result<Option<RawFlow>, FlowError> {
        (**self).fetch(name)
    }

    fn names(&self) -> Result<Vec<String>, FlowError> {
        (**self).names()
    }
}
