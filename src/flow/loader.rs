use std::collections::BTreeMap;

use super::source::{RawFlow, RawStage, RawWorkers};
use super::{Flow, FlowError, FlowSource, Stage, WorkersRule};

/// Builds validated [`Flow`]s from a [`FlowSource`].
///
/// Loading is stateless: each call re-reads the source, resolves the
/// `inherits` chain and validates the merged result. Callers that load the
/// same flow repeatedly may cache the returned value.
///
/// # Inheritance
///
/// A child definition is laid over its (already resolved) parent:
/// - top-level fields set in the child replace the parent's
/// - stages present in both are merged field by field, so a child that only
///   sets `workers` keeps the parent's `next`, `fail`, `terminal`, ...
/// - parent-only stages are kept, child-only stages are added
///
/// # Example
///
/// ```no_run
/// use flowledger::flow::{DirSource, FlowLoader};
///
/// let loader = FlowLoader::new(DirSource::new("flows"));
/// let flow = loader.load("hotfix").unwrap();
/// assert_eq!(flow.next_status("in_progress", true), Some("closed"));
/// ```
#[derive(Debug, Clone)]
pub struct FlowLoader<S> {
    source: S,
}

impl<S: FlowSource> FlowLoader<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Load, merge and validate the flow registered under `name`.
    pub fn load(&self, name: &str) -> Result<Flow, FlowError> {
        let raw = self
            .source
            .fetch(name)?
            .ok_or_else(|| FlowError::NotFound(name.to_string()))?;

        let mut chain = vec![name.to_string()];
        let merged = self.resolve_inheritance(raw, &mut chain)?;
        validate(&merged, name)?;

        let flow = build(merged);
        log::debug!(
            "loaded flow '{}' ({} stages) via {}",
            flow.name(),
            flow.stages().len(),
            chain.join(" <- ")
        );
        Ok(flow)
    }

    /// Names of every flow the source can serve.
    pub fn list_names(&self) -> Result<Vec<String>, FlowError> {
        self.source.names()
    }

    /// Merge `raw` over its ancestors. `chain` holds the names currently
    /// being resolved; meeting one of them again is an inheritance cycle.
    fn resolve_inheritance(
        &self,
        raw: RawFlow,
        chain: &mut Vec<String>,
    ) -> Result<RawFlow, FlowError> {
        let Some(parent_name) = raw.parent().map(str::to_string) else {
            return Ok(raw);
        };

        if chain.contains(&parent_name) {
            return Err(FlowError::validation(
                &chain[0],
                format!(
                    "inheritance cycle: {} -> {}",
                    chain.join(" -> "),
                    parent_name
                ),
            ));
        }

        let parent_raw = self
            .source
            .fetch(&parent_name)?
            .ok_or_else(|| FlowError::NotFound(parent_name.clone()))?;

        log::debug!("flow '{}' inherits from '{}'", chain[chain.len() - 1], parent_name);
        chain.push(parent_name);
        let parent = self.resolve_inheritance(parent_raw, chain)?;
        Ok(overlay(parent, raw))
    }
}

/// Lay `child` over an already resolved `parent`.
fn overlay(parent: RawFlow, child: RawFlow) -> RawFlow {
    RawFlow {
        name: child.name.or(parent.name),
        description: child.description.or(parent.description),
        stages: Some(merge_stages(
            parent.stages.unwrap_or_default(),
            child.stages.unwrap_or_default(),
        )),
        inherits: None,
        dead_ends: child.dead_ends.or(parent.dead_ends),
    }
}

fn merge_stages(
    mut base: BTreeMap<String, RawStage>,
    overrides: BTreeMap<String, RawStage>,
) -> BTreeMap<String, RawStage> {
    for (name, child) in overrides {
        let merged = match base.remove(&name) {
            Some(parent) => merge_stage(parent, child),
            None => child,
        };
        base.insert(name, merged);
    }
    base
}

fn merge_stage(parent: RawStage, child: RawStage) -> RawStage {
    RawStage {
        description: child.description.or(parent.description),
        next: child.next.or(parent.next),
        fail: child.fail.or(parent.fail),
        workers: child.workers.or(parent.workers),
        requires: child.requires.or(parent.requires),
        terminal: child.terminal.or(parent.terminal),
        skip: child.skip.or(parent.skip),
    }
}

/// Structural checks on a merged definition. Stops at the first fault.
fn validate(raw: &RawFlow, name: &str) -> Result<(), FlowError> {
    let mut missing = Vec::new();
    if raw.name.is_none() {
        missing.push("name");
    }
    if raw.description.is_none() {
        missing.push("description");
    }
    if raw.stages.is_none() {
        missing.push("stages");
    }
    if !missing.is_empty() {
        return Err(FlowError::validation(
            name,
            format!("missing required keys: {}", missing.join(", ")),
        ));
    }

    let stages = match &raw.stages {
        Some(stages) if !stages.is_empty() => stages,
        _ => return Err(FlowError::validation(name, "flow has no stages")),
    };

    for (stage_name, stage) in stages {
        let terminal = stage.terminal.unwrap_or(false);
        let skip = stage.skip.unwrap_or(false);
        if !terminal && !skip && stage.next.is_none() {
            return Err(FlowError::validation(
                name,
                format!("stage '{}' is not terminal and must have 'next'", stage_name),
            ));
        }
    }

    Ok(())
}

/// Turn a validated definition into a [`Flow`].
fn build(raw: RawFlow) -> Flow {
    let stages = raw
        .stages
        .unwrap_or_default()
        .into_iter()
        .map(|(name, cfg)| {
            let stage = build_stage(name.clone(), cfg);
            (name, stage)
        })
        .collect();

    Flow::new(
        raw.name.unwrap_or_default(),
        raw.description.unwrap_or_default(),
        stages,
        raw.dead_ends.unwrap_or_default(),
    )
}

fn build_stage(name: String, cfg: RawStage) -> Stage {
    Stage {
        name,
        description: cfg.description.unwrap_or_default(),
        next: cfg.next,
        fail: cfg.fail,
        workers: cfg.workers.map(WorkersRule::from),
        requires: cfg.requires.unwrap_or_default(),
        terminal: cfg.terminal.unwrap_or(false),
        skip: cfg.skip.unwrap_or(false),
    }
}

impl From<RawWorkers> for WorkersRule {
    fn from(raw: RawWorkers) -> Self {
        match raw {
            RawWorkers::List(classes) => WorkersRule::FlatList(classes),
            RawWorkers::ByClass(mut classes) => {
                let default = classes.remove("default");
                WorkersRule::ByRequiredClass { classes, default }
            }
        }
    }
}
