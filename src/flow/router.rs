//! Routing queries over a loaded flow.
//!
//! Every query here is total: unknown stage names produce `None`, an empty
//! collection or `false`, never an error.

use std::collections::{BTreeSet, HashSet};

use super::{Flow, Transition, WorkersRule};

impl Flow {
    /// Follow `skip` stages from `name` until a resting stage is reached.
    ///
    /// Names that are not stages of this flow are returned unchanged. A skip
    /// stage without `next`, or a skip chain that loops, resolves to `None`.
    pub fn resolve_skip<'a>(&'a self, name: &'a str) -> Option<&'a str> {
        let mut seen = HashSet::new();
        let mut current = name;
        loop {
            if !seen.insert(current) {
                return None;
            }
            match self.stage(current) {
                Some(stage) if stage.skip => current = stage.next.as_deref()?,
                _ => return Some(current),
            }
        }
    }

    /// Status a task moves to from `current` on success (`passed`) or failure.
    pub fn next_status(&self, current: &str, passed: bool) -> Option<&str> {
        let stage = self.stage(current).filter(|s| !s.terminal)?;
        let target = if passed {
            stage.next.as_deref()
        } else {
            stage.fail.as_deref()
        }?;
        self.resolve_skip(target)
    }

    /// Worker classes eligible at `status` for a task requiring `class_required`.
    ///
    /// `None` means no restriction applies and the current assignee continues.
    pub fn workers_for(&self, status: &str, class_required: &str) -> Option<&[String]> {
        match self.stage(status)?.workers.as_ref()? {
            WorkersRule::FlatList(classes) => Some(classes.as_slice()),
            WorkersRule::ByRequiredClass { classes, default } => classes
                .get(class_required)
                .or(default.as_ref())
                .map(Vec::as_slice),
        }
    }

    /// Preconditions for moving into `status`.
    pub fn requires(&self, status: &str) -> &[String] {
        self.stage(status)
            .map(|s| s.requires.as_slice())
            .unwrap_or(&[])
    }

    /// Every status reachable from `current` without being irregular.
    ///
    /// Success edges are skip-resolved; the `fail` edge is reported as
    /// declared. Dead ends are always included for non-terminal stages.
    pub fn valid_transitions(&self, current: &str) -> BTreeSet<&str> {
        let Some(stage) = self.stage(current).filter(|s| !s.terminal) else {
            return BTreeSet::new();
        };

        let mut targets: BTreeSet<&str> = self.dead_ends().iter().map(String::as_str).collect();
        if let Some(next) = stage.next.as_deref().and_then(|n| self.resolve_skip(n)) {
            targets.insert(next);
        }
        if let Some(fail) = stage.fail.as_deref() {
            targets.insert(fail);
        }
        targets
    }

    /// Route a task in one call: destination plus who may work it there.
    pub fn transition(
        &self,
        current: &str,
        class_required: &str,
        passed: bool,
    ) -> Option<Transition> {
        let to_status = self.next_status(current, passed)?;
        Some(Transition {
            to_status: to_status.to_string(),
            eligible_classes: self
                .workers_for(to_status, class_required)
                .map(<[String]>::to_vec),
        })
    }

    pub fn is_terminal(&self, status: &str) -> bool {
        self.stage(status).map(|s| s.terminal).unwrap_or(false)
    }
}
