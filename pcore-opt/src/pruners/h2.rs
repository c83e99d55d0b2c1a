//! h²/h³ are external collaborators in the source material: delete-relaxed
//! heuristic searches too large to re-derive here. These stubs carry the
//! trait contract (name, help text, failure propagation) so the pipeline's
//! control flow — including abort-on-failure — is exercised end-to-end
//! without requiring the actual solver.
use super::Pruner;
use pcore_types::mutex_ground::{MutexGroups, MutexPairs};
use pcore_types::strips::{FactId, OpId, StripsTask};
use pcore_utils::{PlanError, PlanResult};
use std::collections::HashSet;

pub struct H2Forward;

impl Pruner for H2Forward {
    fn name(&self) -> &str {
        "h2-forward"
    }

    fn help(&self) -> &str {
        "forward h² delete-relaxation reachability (external collaborator, unimplemented)"
    }

    fn run(
        &self,
        task: &mut StripsTask,
        _mutex_groups: &MutexGroups,
        _mutex_pairs: &MutexPairs,
        _rm_fact: &mut HashSet<FactId>,
        _rm_op: &mut HashSet<OpId>,
        _time_limit_in_s: Option<f64>,
        _excess_mem: Option<u64>,
    ) -> PlanResult<()> {
        if task.has_cond_eff() {
            log::info!("h2-forward: skipped, task has conditional effects");
            return Ok(());
        }
        Err(PlanError::unsupported(
            self.name(),
            "h2 forward reachability is an external collaborator, not implemented in this core",
        ))
    }
}

/// Promotes mutex groups to exactly-one form internally before running
/// forward/backward h². Stubbed for the same reason as `H2Forward`.
pub struct H2ForwardBackward;

impl Pruner for H2ForwardBackward {
    fn name(&self) -> &str {
        "h2-fw-bw"
    }

    fn help(&self) -> &str {
        "h² forward+backward over promoted exactly-one mutex groups (external collaborator, unimplemented)"
    }

    fn run(
        &self,
        task: &mut StripsTask,
        _mutex_groups: &MutexGroups,
        _mutex_pairs: &MutexPairs,
        _rm_fact: &mut HashSet<FactId>,
        _rm_op: &mut HashSet<OpId>,
        _time_limit_in_s: Option<f64>,
        _excess_mem: Option<u64>,
    ) -> PlanResult<()> {
        if task.has_cond_eff() {
            log::info!("h2-fw-bw: skipped, task has conditional effects");
            return Ok(());
        }
        Err(PlanError::upstream(
            self.name(),
            "h2 fw/bw requires mutex-group promotion followed by an external solver pass",
        ))
    }
}

pub struct H3;

impl Pruner for H3 {
    fn name(&self) -> &str {
        "h3"
    }

    fn help(&self) -> &str {
        "h³ pairwise-mutex-aware delete relaxation (external collaborator, unimplemented)"
    }

    fn run(
        &self,
        task: &mut StripsTask,
        _mutex_groups: &MutexGroups,
        _mutex_pairs: &MutexPairs,
        _rm_fact: &mut HashSet<FactId>,
        _rm_op: &mut HashSet<OpId>,
        _time_limit_in_s: Option<f64>,
        excess_mem: Option<u64>,
    ) -> PlanResult<()> {
        if task.has_cond_eff() {
            log::info!("h3: skipped, task has conditional effects");
            return Ok(());
        }
        let _ = excess_mem;
        Err(PlanError::unsupported(
            self.name(),
            "h3 is an external collaborator, not implemented in this core",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet as HSet;

    #[test]
    fn h2_forward_reports_upstream_unsupported() {
        let mut task = StripsTask::new(vec![], vec![], HSet::new(), HSet::new());
        let groups = MutexGroups::new(vec![]);
        let pairs = MutexPairs::from_mutex_groups(&groups);
        let mut rm_fact = HSet::new();
        let mut rm_op = HSet::new();
        let err = H2Forward
            .run(&mut task, &groups, &pairs, &mut rm_fact, &mut rm_op, None, None)
            .unwrap_err();
        assert!(matches!(err, PlanError::Unsupported { .. }));
    }
}
