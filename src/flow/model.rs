use std::collections::BTreeMap;

/// Which worker classes may pick up a task once it reaches a stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkersRule {
    /// The same classes regardless of the task's own required class.
    FlatList(Vec<String>),
    /// Classes keyed by the task's required class, with an optional fallback
    /// used when the required class has no entry of its own.
    ByRequiredClass {
        classes: BTreeMap<String, Vec<String>>,
        default: Option<Vec<String>>,
    },
}

/// One node of a flow graph; a status a task can occupy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub name: String,
    pub description: String,
    pub next: Option<String>,
    pub fail: Option<String>,
    pub workers: Option<WorkersRule>,
    /// Preconditions for entering this stage. Not enforced here.
    pub requires: Vec<String>,
    pub terminal: bool,
    pub skip: bool,
}

/// A fully merged and validated flow.
///
/// Flows are only produced by [`FlowLoader`](super::FlowLoader), so every
/// stage that is neither terminal nor skipped is guaranteed to have a `next`
/// edge. Once built a flow is never mutated; share it freely across threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flow {
    name: String,
    description: String,
    stages: BTreeMap<String, Stage>,
    dead_ends: Vec<String>,
}

impl Flow {
    pub(crate) fn new(
        name: String,
        description: String,
        stages: BTreeMap<String, Stage>,
        dead_ends: Vec<String>,
    ) -> Self {
        let mut unique = Vec::with_capacity(dead_ends.len());
        for dead_end in dead_ends {
            if !unique.contains(&dead_end) {
                unique.push(dead_end);
            }
        }
        Self {
            name,
            description,
            stages,
            dead_ends: unique,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn stages(&self) -> &BTreeMap<String, Stage> {
        &self.stages
    }

    pub fn stage(&self, name: &str) -> Option<&Stage> {
        self.stages.get(name)
    }

    /// Targets reachable from every non-terminal stage, in declaration order.
    pub fn dead_ends(&self) -> &[String] {
        &self.dead_ends
    }
}

/// Result of a routing query: where the task goes and who may work it there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub to_status: String,
    /// `None` means the destination carries no class restriction and the
    /// current assignee keeps the task.
    pub eligible_classes: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage(name: &str) -> Stage {
        Stage {
            name: name.to_string(),
            description: String::new(),
            next: None,
            fail: None,
            workers: None,
            requires: Vec::new(),
            terminal: true,
            skip: false,
        }
    }

    #[test]
    fn test_dead_ends_deduplicated_in_order() {
        let mut stages = BTreeMap::new();
        stages.insert("done".to_string(), stage("done"));
        let flow = Flow::new(
            "f".to_string(),
            String::new(),
            stages,
            vec!["stale".to_string(), "abandoned".to_string(), "stale".to_string()],
        );
        assert_eq!(flow.dead_ends(), ["stale".to_string(), "abandoned".to_string()]);
    }

    #[test]
    fn test_flow_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Flow>();
    }
}
