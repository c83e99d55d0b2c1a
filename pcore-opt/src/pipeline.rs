//! Component G: the ground pruning pipeline. Owns the task, its mutex-group
//! list and mutex-pair index, an ordered pruner sequence, and the shared
//! `rm_fact`/`rm_op` scratch sets pruners contribute to.
//!
//! `PipelineBuilder` registers pruners under a caller-chosen label with
//! duplicate-label rejection, and a `complete_help` listing documents what
//! is configured. The label is independent of `Pruner::name()`, so the same
//! pruner kind can be scheduled more than once in a pipeline (e.g.
//! `irrelevance` run again after a later pass frees up more deletions) by
//! registering it under two different labels.
use crate::pruners::Pruner;
use pcore_types::mutex_ground::{MutexGroups, MutexPairs};
use pcore_types::strips::StripsTask;
use pcore_utils::{PlanError, PlanResult};
use std::collections::HashSet;
use std::fmt::Write as _;
use std::time::Instant;

#[derive(Clone, Copy, Debug, Default)]
pub struct PrunerSpec {
    pub time_limit_in_s: Option<f64>,
    pub excess_mem: Option<u64>,
}

struct Registered {
    label: String,
    pruner: Box<dyn Pruner>,
    spec: PrunerSpec,
}

#[derive(Default)]
pub struct PipelineBuilder {
    pruners: Vec<Registered>,
    names: HashSet<String>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a pruner to run, in insertion order, when the pipeline
    /// executes, under `label`. Fails if another pruner is already
    /// registered under that label. `label` is independent of
    /// `Pruner::name()`, so scheduling the same pruner kind twice (e.g. to
    /// run `irrelevance` again after a later pass) just needs two distinct
    /// labels, such as `"irrelevance"` and `"irrelevance-2"`.
    pub fn register_pruner(
        &mut self,
        label: impl Into<String>,
        pruner: Box<dyn Pruner>,
        spec: PrunerSpec,
    ) -> PlanResult<&mut Self> {
        let label = label.into();
        if !self.names.insert(label.clone()) {
            return Err(PlanError::already_registered(label));
        }
        self.pruners.push(Registered {
            label,
            pruner,
            spec,
        });
        Ok(self)
    }

    /// A human-readable listing of every configured pruner and its
    /// resource-limit defaults.
    pub fn complete_help(&self) -> String {
        let mut out = String::with_capacity(256);
        out.push_str("Pruners:\n");
        for r in &self.pruners {
            writeln!(
                out,
                "- {} ({}): {} (time_limit_in_s: {:?}, excess_mem: {:?})",
                r.label,
                r.pruner.name(),
                r.pruner.help(),
                r.spec.time_limit_in_s,
                r.spec.excess_mem
            )
            .unwrap();
        }
        out
    }

    pub fn build(self, task: StripsTask, mutex_groups: MutexGroups) -> Pipeline {
        let mutex_pairs = MutexPairs::from_mutex_groups(&mutex_groups);
        Pipeline {
            task,
            mutex_groups,
            mutex_pairs,
            pruners: self.pruners,
            rm_fact: HashSet::new(),
            rm_op: HashSet::new(),
        }
    }
}

pub struct Pipeline {
    task: StripsTask,
    mutex_groups: MutexGroups,
    mutex_pairs: MutexPairs,
    pruners: Vec<Registered>,
    rm_fact: HashSet<pcore_types::strips::FactId>,
    rm_op: HashSet<pcore_types::strips::OpId>,
}

impl Pipeline {
    pub fn task(&self) -> &StripsTask {
        &self.task
    }

    pub fn mutex_groups(&self) -> &MutexGroups {
        &self.mutex_groups
    }

    pub fn mutex_pairs(&self) -> &MutexPairs {
        &self.mutex_pairs
    }

    pub fn into_task(self) -> StripsTask {
        self.task
    }

    /// Runs every registered pruner in order. A pruner signaling failure
    /// aborts the pipeline immediately, leaving the task in whatever state
    /// the prior (successful) flushes left it in.
    pub fn run(&mut self) -> PlanResult<()> {
        for i in 0..self.pruners.len() {
            if self.pruners[i].pruner.requires_flush_before() {
                self.apply_prune_strips();
            }
            let label = self.pruners[i].label.clone();
            let time_limit = self.pruners[i].spec.time_limit_in_s;
            let excess_mem = self.pruners[i].spec.excess_mem;
            let start = Instant::now();
            let result = self.pruners[i].pruner.run(
                &mut self.task,
                &self.mutex_groups,
                &self.mutex_pairs,
                &mut self.rm_fact,
                &mut self.rm_op,
                time_limit,
                excess_mem,
            );
            match result {
                Ok(()) => {
                    log::info!("{label}: {}ms", start.elapsed().as_millis());
                }
                Err(e) => {
                    log::warn!("{label}: aborting pipeline: {e}");
                    return Err(e);
                }
            }
        }
        self.apply_prune_strips();
        Ok(())
    }

    /// `applyPruneStrips`: skips when both scratch sets are empty; else
    /// compacts the task, re-projects the mutex-pair index and mutex-group
    /// contents through the resulting id map, recomputes the exactly-one/
    /// goal flags, and empties the scratch sets.
    fn apply_prune_strips(&mut self) {
        if self.rm_fact.is_empty() && self.rm_op.is_empty() {
            return;
        }
        let report = self.task.reduce(&self.rm_fact, &self.rm_op);
        self.mutex_pairs.reduce(&report.fact_map);
        self.mutex_groups.reduce(&report.fact_map);
        self.mutex_groups.set_exactly_one(&self.task);
        self.mutex_groups.set_goal(&self.task);
        self.rm_fact.clear();
        self.rm_op.clear();
    }
}
