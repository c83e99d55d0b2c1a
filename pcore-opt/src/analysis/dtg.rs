//! Component D: per-mutex-group domain-transition-graph reachability.
//!
//! A thin `petgraph` wrapper over fact ids.
use pcore_types::mutex_ground::{MutexGroup, MutexGroups};
use pcore_types::strips::{FactId, OpId, StripsTask};
use petgraph::graphmap::DiGraphMap;
use petgraph::visit::Bfs;
use std::collections::HashSet;

#[derive(Default, Debug)]
pub struct DtgOutcome {
    pub unreachable_facts: HashSet<FactId>,
    pub unreachable_ops: HashSet<OpId>,
}

/// Builds the implicit transition graph for a single mutex group and
/// returns (operators found unreachable while building it, the graph
/// itself). An operator with `|pre ∩ group| >= 2` cannot fire (the group
/// can't be in two states at once) and is reported unreachable with no
/// edge contributed.
fn build_graph(task: &StripsTask, group: &MutexGroup) -> (DiGraphMap<FactId, ()>, HashSet<OpId>) {
    let mut graph: DiGraphMap<FactId, ()> = DiGraphMap::new();
    for &f in &group.facts {
        graph.add_node(f);
    }
    let mut unreachable_ops = HashSet::new();

    for (idx, op) in task.operators().iter().enumerate() {
        let op_id = OpId(idx as u32);
        for &t in &op.add_eff {
            if !group.facts.contains(&t) {
                continue;
            }
            let s: Vec<FactId> = op
                .pre
                .iter()
                .copied()
                .filter(|f| group.facts.contains(f))
                .collect();
            match s.len() {
                0 => {
                    // Universal edge: this operator's add effect on `t` does
                    // not depend on the group's current member, so every
                    // member can transition to `t`.
                    for &m in &group.facts {
                        if m != t {
                            graph.add_edge(m, t, ());
                        }
                    }
                }
                1 => {
                    let from = s[0];
                    if from != t {
                        graph.add_edge(from, t, ());
                    }
                    // from == t is a self-loop: no new edge.
                }
                _ => {
                    unreachable_ops.insert(op_id);
                }
            }
        }
    }

    (graph, unreachable_ops)
}

/// Runs forward BFS from `group`'s unique initial member and reports the
/// group's unreached facts, plus every operator whose precondition or
/// add-effects mention one of them. Groups whose initial-state intersection
/// is not exactly one fact are skipped (the initial fact is ambiguous).
fn reachable_in_group(task: &StripsTask, group: &MutexGroup) -> Option<DtgOutcome> {
    let init_members: Vec<FactId> = group
        .facts
        .iter()
        .copied()
        .filter(|f| task.init().contains(f))
        .collect();
    if init_members.len() != 1 {
        return None;
    }
    let f0 = init_members[0];

    let (graph, mut unreachable_ops) = build_graph(task, group);

    let mut reached = HashSet::new();
    let mut bfs = Bfs::new(&graph, f0);
    while let Some(node) = bfs.next(&graph) {
        reached.insert(node);
    }

    let mut unreachable_facts = HashSet::new();
    for &m in &group.facts {
        if !reached.contains(&m) {
            unreachable_facts.insert(m);
        }
    }

    for (idx, op) in task.operators().iter().enumerate() {
        let op_id = OpId(idx as u32);
        let touches_unreachable = op
            .pre
            .iter()
            .chain(op.add_eff.iter())
            .any(|f| unreachable_facts.contains(f));
        if touches_unreachable {
            unreachable_ops.insert(op_id);
        }
    }

    Some(DtgOutcome {
        unreachable_facts,
        unreachable_ops,
    })
}

/// Drives the per-group analysis and unions the results. Total: no failure
/// mode.
pub fn find_unreachable(task: &StripsTask, groups: &MutexGroups) -> DtgOutcome {
    let mut out = DtgOutcome::default();
    for group in groups.groups() {
        if let Some(group_out) = reachable_in_group(task, group) {
            out.unreachable_facts.extend(group_out.unreachable_facts);
            out.unreachable_ops.extend(group_out.unreachable_ops);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcore_types::strips::{Fact, Operator};
    use pcore_utils::Id;

    /// S3: group {a,b,c,d}, init a, a->b, b->c, nothing touches d.
    #[test]
    fn unreachable_member_and_its_dependent_operator_are_reported() {
        let facts: Vec<Fact> = ["a", "b", "c", "d"]
            .iter()
            .map(|n| Fact {
                name: Id::from(*n),
                neg_of: None,
            })
            .collect();
        let a = FactId(0);
        let b = FactId(1);
        let c = FactId(2);
        let d = FactId(3);
        let op_ab = Operator {
            name: Id::from("a_to_b"),
            cost: 1,
            pre: [a].into_iter().collect(),
            add_eff: [b].into_iter().collect(),
            del_eff: [a].into_iter().collect(),
            cond_effects: vec![],
        };
        let op_bc = Operator {
            name: Id::from("b_to_c"),
            cost: 1,
            pre: [b].into_iter().collect(),
            add_eff: [c].into_iter().collect(),
            del_eff: [b].into_iter().collect(),
            cond_effects: vec![],
        };
        let op_needs_d = Operator {
            name: Id::from("needs_d"),
            cost: 1,
            pre: [d].into_iter().collect(),
            add_eff: HashSet::new(),
            del_eff: HashSet::new(),
            cond_effects: vec![],
        };
        let task = StripsTask::new(
            facts,
            vec![op_ab, op_bc, op_needs_d],
            [a].into_iter().collect(),
            HashSet::new(),
        );
        let groups = MutexGroups::new(vec![MutexGroup::new(
            [a, b, c, d].into_iter().collect(),
        )]);

        let outcome = find_unreachable(&task, &groups);
        assert!(outcome.unreachable_facts.contains(&d));
        assert!(!outcome.unreachable_facts.contains(&a));
        assert!(!outcome.unreachable_facts.contains(&b));
        assert!(!outcome.unreachable_facts.contains(&c));
        assert!(outcome.unreachable_ops.contains(&OpId(2)));
    }

    #[test]
    fn ambiguous_initial_member_skips_the_group() {
        let facts: Vec<Fact> = ["a", "b"]
            .iter()
            .map(|n| Fact {
                name: Id::from(*n),
                neg_of: None,
            })
            .collect();
        let task = StripsTask::new(
            facts,
            vec![],
            [FactId(0), FactId(1)].into_iter().collect(),
            HashSet::new(),
        );
        let groups = MutexGroups::new(vec![MutexGroup::new(
            [FactId(0), FactId(1)].into_iter().collect(),
        )]);
        let outcome = find_unreachable(&task, &groups);
        assert!(outcome.unreachable_facts.is_empty());
    }
}
