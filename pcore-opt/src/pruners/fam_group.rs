//! FAM-group dead-end pruner: an operator whose precondition requires two
//! facts that are mutually exclusive can never fire, under any task.
use super::Pruner;
use itertools::Itertools;
use pcore_types::mutex_ground::{MutexGroups, MutexPairs};
use pcore_types::strips::{FactId, OpId, StripsTask};
use pcore_utils::PlanResult;
use std::collections::HashSet;

pub struct FamGroupDeadEnd;

impl Pruner for FamGroupDeadEnd {
    fn name(&self) -> &str {
        "fam-group-dead-end"
    }

    fn help(&self) -> &str {
        "drop operators whose precondition requires two mutually-exclusive facts"
    }

    fn run(
        &self,
        task: &mut StripsTask,
        _mutex_groups: &MutexGroups,
        mutex_pairs: &MutexPairs,
        _rm_fact: &mut HashSet<FactId>,
        rm_op: &mut HashSet<OpId>,
        _time_limit_in_s: Option<f64>,
        _excess_mem: Option<u64>,
    ) -> PlanResult<()> {
        for (idx, op) in task.operators().iter().enumerate() {
            let conflicts = op
                .pre
                .iter()
                .tuple_combinations()
                .any(|(&f, &g)| mutex_pairs.is_mutex(f, g));
            if conflicts {
                rm_op.insert(OpId(idx as u32));
            }
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
    fn operator_requiring_two_mutex_facts_is_dropped() {
        let facts = vec![
            Fact {
                name: Id::from("a"),
                neg_of: None,
            },
            Fact {
                name: Id::from("b"),
                neg_of: None,
            },
        ];
        let (a, b) = (FactId(0), FactId(1));
        let op = Operator {
            name: Id::from("impossible"),
            cost: 1,
            pre: [a, b].into_iter().collect(),
            add_eff: HashSet::new(),
            del_eff: HashSet::new(),
            cond_effects: vec![],
        };
        let mut task = StripsTask::new(facts, vec![op], HashSet::new(), HashSet::new());
        let groups = MutexGroups::new(vec![pcore_types::mutex_ground::MutexGroup::new(
            [a, b].into_iter().collect(),
        )]);
        let pairs = MutexPairs::from_mutex_groups(&groups);

        let mut rm_fact = HashSet::new();
        let mut rm_op = HashSet::new();
        FamGroupDeadEnd
            .run(&mut task, &groups, &pairs, &mut rm_fact, &mut rm_op, None, None)
            .unwrap();
        assert!(rm_op.contains(&OpId(0)));
    }
}
