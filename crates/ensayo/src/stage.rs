//! Stage dependency contract.
//!
//! A pipeline is a set of stages — independently-launched portions of the
//! suite — with declared predecessor dependencies (create-group before
//! activate-payment, and so on). The external runner owns process
//! scheduling; this module owns the declaration, its validation, and the
//! ordering guarantee the artifact store depends on: a stage only starts
//! after every stage it depends on has finished and persisted.

use crate::result::{EnsayoError, EnsayoResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Default wall-clock budget for one stage (60 seconds)
pub const DEFAULT_STAGE_TIMEOUT_MS: u64 = 60_000;

/// One dependency-ordered stage of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSpec {
    /// Stage name, unique within the plan
    pub name: String,
    /// Names of stages that must complete before this one starts
    pub depends_on: Vec<String>,
    /// Pattern selecting the test files/specs belonging to this stage
    pub test_match: String,
    /// Tags for filtered runs (smoke, regression, ...)
    pub tags: Vec<String>,
    /// Wall-clock budget; exceeding it is a hard abort, not a retry
    pub timeout_ms: u64,
}

impl StageSpec {
    /// Create a stage running the specs matched by `test_match`.
    #[must_use]
    pub fn new(name: impl Into<String>, test_match: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            depends_on: Vec::new(),
            test_match: test_match.into(),
            tags: Vec::new(),
            timeout_ms: DEFAULT_STAGE_TIMEOUT_MS,
        }
    }

    /// Declare a predecessor that must complete first.
    #[must_use]
    pub fn with_dependency(mut self, name: impl Into<String>) -> Self {
        self.depends_on.push(name.into());
        self
    }

    /// Attach a tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Override the wall-clock budget.
    #[must_use]
    pub const fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}

/// Terminal result of one stage run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageOutcome {
    /// All specs in the stage passed
    Passed,
    /// At least one spec failed or the stage budget was exceeded
    Failed {
        /// Named failure reason for reporting
        reason: String,
    },
    /// The stage declined to run — e.g. a capability probe found no
    /// eligible entity. Not a failure.
    Skipped {
        /// Why the stage was skipped
        reason: String,
    },
}

impl StageOutcome {
    /// Whether stages depending on this one may start. Only a failure
    /// blocks dependents; a skip is expected control flow.
    #[must_use]
    pub const fn allows_dependents(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }
}

/// A validated, dependency-ordered set of stages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StagePlan {
    stages: Vec<StageSpec>,
}

impl StagePlan {
    /// Create an empty plan.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a stage.
    #[must_use]
    pub fn with_stage(mut self, stage: StageSpec) -> Self {
        self.stages.push(stage);
        self
    }

    /// Build a linear pipeline: each stage depends on the one before it.
    #[must_use]
    pub fn chain(stages: impl IntoIterator<Item = StageSpec>) -> Self {
        let mut plan = Self::new();
        let mut previous: Option<String> = None;
        for mut stage in stages {
            if let Some(prev) = previous.take() {
                stage.depends_on.push(prev);
            }
            previous = Some(stage.name.clone());
            plan.stages.push(stage);
        }
        plan
    }

    /// All stages in declaration order.
    #[must_use]
    pub fn stages(&self) -> &[StageSpec] {
        &self.stages
    }

    /// Look up a stage by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&StageSpec> {
        self.stages.iter().find(|s| s.name == name)
    }

    /// Number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether the plan has no stages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Reject duplicate names, unknown or self dependencies.
    fn validate_references(&self) -> EnsayoResult<()> {
        let mut names = HashSet::new();
        for stage in &self.stages {
            if !names.insert(stage.name.as_str()) {
                return Err(EnsayoError::InvalidPlan {
                    message: format!("duplicate stage name `{}`", stage.name),
                });
            }
        }

        for stage in &self.stages {
            for dep in &stage.depends_on {
                if dep == &stage.name {
                    return Err(EnsayoError::InvalidPlan {
                        message: format!("stage `{}` depends on itself", stage.name),
                    });
                }
                if !names.contains(dep.as_str()) {
                    return Err(EnsayoError::InvalidPlan {
                        message: format!(
                            "stage `{}` depends on unknown stage `{dep}`",
                            stage.name
                        ),
                    });
                }
            }
        }
        Ok(())
    }

    /// Full validation: references plus acyclicity.
    pub fn validate(&self) -> EnsayoResult<()> {
        self.execution_order().map(|_| ())
    }

    /// A sequential order satisfying every dependency, deterministic for a
    /// given plan: among runnable stages, declaration order wins.
    ///
    /// # Errors
    ///
    /// [`EnsayoError::InvalidPlan`] for duplicate names, unknown
    /// dependencies, or dependency cycles.
    pub fn execution_order(&self) -> EnsayoResult<Vec<&str>> {
        self.validate_references()?;

        let mut order: Vec<&str> = Vec::with_capacity(self.stages.len());
        let mut emitted: HashSet<&str> = HashSet::new();

        while order.len() < self.stages.len() {
            let next = self.stages.iter().find(|stage| {
                !emitted.contains(stage.name.as_str())
                    && stage
                        .depends_on
                        .iter()
                        .all(|dep| emitted.contains(dep.as_str()))
            });

            match next {
                Some(stage) => {
                    emitted.insert(stage.name.as_str());
                    order.push(stage.name.as_str());
                }
                None => {
                    let stuck: Vec<&str> = self
                        .stages
                        .iter()
                        .map(|s| s.name.as_str())
                        .filter(|name| !emitted.contains(name))
                        .collect();
                    return Err(EnsayoError::InvalidPlan {
                        message: format!("dependency cycle among stages: {}", stuck.join(", ")),
                    });
                }
            }
        }

        Ok(order)
    }

    /// Whether `stage` may start given the outcomes recorded so far: every
    /// dependency must have finished with an outcome that allows
    /// dependents.
    ///
    /// # Errors
    ///
    /// [`EnsayoError::InvalidPlan`] if the stage is not part of this plan.
    pub fn ready_to_run(
        &self,
        stage: &str,
        outcomes: &BTreeMap<String, StageOutcome>,
    ) -> EnsayoResult<bool> {
        let spec = self.get(stage).ok_or_else(|| EnsayoError::InvalidPlan {
            message: format!("unknown stage `{stage}`"),
        })?;

        Ok(spec.depends_on.iter().all(|dep| {
            outcomes
                .get(dep)
                .is_some_and(StageOutcome::allows_dependents)
        }))
    }
}
