//! The pruner framework: a trait implemented both by passes fully derivable
//! from the data model alone (irrelevance, dtg-unreachable, fam-group
//! dead-end, dedup) and by documented stubs for the external collaborators
//! (h², h³) whose actual search lives outside this core.
pub mod dedup;
pub mod fam_group;
pub mod h2;

use crate::analysis::{dtg, irrelevance};
use pcore_types::mutex_ground::{MutexGroups, MutexPairs};
use pcore_types::strips::{FactId, OpId, StripsTask};
use pcore_utils::PlanResult;
use std::collections::HashSet;

/// A single chainable pruning pass. `run` reads the current task/mutex
/// state and contributes to the pipeline's shared `rm_fact`/`rm_op` scratch
/// sets — except `Dedup`, which rewrites the operator list directly (its
/// contract calls for an in-place rewrite rather than a removal set).
pub trait Pruner {
    fn name(&self) -> &str;

    fn help(&self) -> &str {
        ""
    }

    /// Whether the pipeline must flush `rm_fact`/`rm_op` through
    /// `apply_prune_strips` immediately before this pruner runs, so the
    /// mutex groups it reads already reflect prior removals.
    fn requires_flush_before(&self) -> bool {
        false
    }

    #[allow(clippy::too_many_arguments)]
    fn run(
        &self,
        task: &mut StripsTask,
        mutex_groups: &MutexGroups,
        mutex_pairs: &MutexPairs,
        rm_fact: &mut HashSet<FactId>,
        rm_op: &mut HashSet<OpId>,
        time_limit_in_s: Option<f64>,
        excess_mem: Option<u64>,
    ) -> PlanResult<()>;
}

/// Backward goal-regression irrelevance, wired to `analysis::irrelevance`.
pub struct Irrelevance;

impl Pruner for Irrelevance {
    fn name(&self) -> &str {
        "irrelevance"
    }

    fn help(&self) -> &str {
        "backward goal-regression: mark facts/operators unreachable from the goal"
    }

    fn run(
        &self,
        task: &mut StripsTask,
        _mutex_groups: &MutexGroups,
        _mutex_pairs: &MutexPairs,
        rm_fact: &mut HashSet<FactId>,
        rm_op: &mut HashSet<OpId>,
        _time_limit_in_s: Option<f64>,
        _excess_mem: Option<u64>,
    ) -> PlanResult<()> {
        if task.has_cond_eff() {
            log::info!("irrelevance: skipped, task has conditional effects");
            return Ok(());
        }
        let outcome = irrelevance::analyze(task, rm_fact, rm_op)?;
        rm_fact.extend(outcome.irrelevant_facts);
        rm_fact.extend(outcome.static_facts);
        rm_op.extend(outcome.irrelevant_ops);
        Ok(())
    }
}

/// Per-mutex-group DTG reachability, wired to `analysis::dtg`. Requires a
/// flush immediately beforehand so the mutex groups it walks already
/// reflect any removals queued by earlier pruners.
pub struct DtgUnreachable;

impl Pruner for DtgUnreachable {
    fn name(&self) -> &str {
        "dtg-unreachable"
    }

    fn help(&self) -> &str {
        "per-mutex-group forward BFS from the initial member"
    }

    fn requires_flush_before(&self) -> bool {
        true
    }

    fn run(
        &self,
        task: &mut StripsTask,
        mutex_groups: &MutexGroups,
        _mutex_pairs: &MutexPairs,
        rm_fact: &mut HashSet<FactId>,
        rm_op: &mut HashSet<OpId>,
        _time_limit_in_s: Option<f64>,
        _excess_mem: Option<u64>,
    ) -> PlanResult<()> {
        if task.has_cond_eff() {
            log::info!("dtg-unreachable: skipped, task has conditional effects");
            return Ok(());
        }
        let outcome = dtg::find_unreachable(task, mutex_groups);
        rm_fact.extend(outcome.unreachable_facts);
        rm_op.extend(outcome.unreachable_ops);
        Ok(())
    }
}
