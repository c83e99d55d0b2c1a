//! Operator dedup: structurally identical operators (same cost, pre,
//! add-effects, delete-effects and conditional effects) collapse to the
//! first one seen. Unlike the other pruners this rewrites the operator
//! list directly through `task.reduce` rather than contributing to
//! `rm_op` — its contract is an in-place rewrite, not a removal set.
use super::Pruner;
use pcore_types::mutex_ground::{MutexGroups, MutexPairs};
use pcore_types::strips::{FactId, OpId, StripsTask};
use pcore_utils::PlanResult;
use std::collections::HashSet;

pub struct Dedup;

impl Pruner for Dedup {
    fn name(&self) -> &str {
        "dedup"
    }

    fn help(&self) -> &str {
        "collapse structurally identical operators"
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
        let mut seen: Vec<(
            i64,
            HashSet<FactId>,
            HashSet<FactId>,
            HashSet<FactId>,
            Vec<pcore_types::strips::ConditionalEffect>,
        )> = Vec::new();
        let mut dup_ops = HashSet::new();
        for (idx, op) in task.operators().iter().enumerate() {
            let sig = (
                op.cost,
                op.pre.clone(),
                op.add_eff.clone(),
                op.del_eff.clone(),
                op.cond_effects.clone(),
            );
            if seen.contains(&sig) {
                dup_ops.insert(OpId(idx as u32));
            } else {
                seen.push(sig);
            }
        }
        if !dup_ops.is_empty() {
            log::debug!("dedup: removing {} duplicate operator(s)", dup_ops.len());
            task.reduce(&HashSet::new(), &dup_ops);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcore_types::strips::{Fact, Operator};
    use pcore_utils::Id;

    #[test]
    fn structurally_identical_operators_collapse() {
        let facts = vec![Fact {
            name: Id::from("p"),
            neg_of: None,
        }];
        let make_op = |name: &str| Operator {
            name: Id::from(name),
            cost: 1,
            pre: HashSet::new(),
            add_eff: [FactId(0)].into_iter().collect(),
            del_eff: HashSet::new(),
            cond_effects: vec![],
        };
        let mut task = StripsTask::new(
            facts,
            vec![make_op("a"), make_op("b")],
            HashSet::new(),
            HashSet::new(),
        );
        let groups = MutexGroups::new(vec![]);
        let pairs = MutexPairs::from_mutex_groups(&groups);
        let mut rm_fact = HashSet::new();
        let mut rm_op = HashSet::new();
        Dedup
            .run(&mut task, &groups, &pairs, &mut rm_fact, &mut rm_op, None, None)
            .unwrap();
        assert_eq!(task.operators().len(), 1);
    }
}
