//! Component E: backward goal-regression irrelevance analysis, plus static-
//! fact detection.
use pcore_types::fdr::{FdrTask, VarId};
use pcore_types::strips::{FactId, OpId, StripsTask};
use pcore_utils::{PlanError, PlanResult};
use std::collections::{HashMap, HashSet};

#[derive(Default, Debug)]
pub struct IrrelevanceOutcome {
    pub irrelevant_facts: HashSet<FactId>,
    pub irrelevant_ops: HashSet<OpId>,
    /// Facts never appearing in any add/del effect, present in the initial
    /// state — always true, reported alongside (not instead of) irrelevance.
    pub static_facts: HashSet<FactId>,
}

/// Backward regression from the goal. Fails (rather than produce an
/// unsound result) when the task has conditional effects, which this
/// analysis does not support.
pub fn analyze(
    task: &StripsTask,
    pre_irrelevant_facts: &HashSet<FactId>,
    pre_irrelevant_ops: &HashSet<OpId>,
) -> PlanResult<IrrelevanceOutcome> {
    if task.has_cond_eff() {
        return Err(PlanError::unsupported(
            "irrelevance",
            "task has conditional effects",
        ));
    }

    let n_facts = task.facts().len();
    let n_ops = task.operators().len();
    // 0 = unmarked, 1 = skip (pre-marked irrelevant input), -1 = needed.
    let mut fact_mark = vec![0i8; n_facts];
    let mut op_mark = vec![0i8; n_ops];
    for &f in pre_irrelevant_facts {
        fact_mark[f.index()] = 1;
    }
    for &o in pre_irrelevant_ops {
        op_mark[o.index()] = 1;
    }

    let mut static_facts = HashSet::new();
    for (idx, _fact) in task.facts().iter().enumerate() {
        let fid = FactId(idx as u32);
        let never_add = task.xref().add_ops(fid).is_empty();
        let never_del = task.xref().del_ops(fid).is_empty();
        if never_add && never_del && task.init().contains(&fid) {
            static_facts.insert(fid);
        }
    }

    let mut worklist: Vec<FactId> = Vec::new();
    let mut in_worklist: HashSet<FactId> = HashSet::new();
    for &g in task.goal() {
        if fact_mark[g.index()] != 1 {
            fact_mark[g.index()] = -1;
            if in_worklist.insert(g) {
                worklist.push(g);
            }
        }
    }

    while let Some(f) = worklist.pop() {
        in_worklist.remove(&f);
        let ops: Vec<OpId> = task
            .xref()
            .add_ops(f)
            .iter()
            .chain(task.xref().del_ops(f).iter())
            .copied()
            .collect();
        for op_id in ops {
            if op_mark[op_id.index()] != 0 {
                continue;
            }
            op_mark[op_id.index()] = -1;
            for &p in &task.operator(op_id).pre {
                if fact_mark[p.index()] == 0 {
                    fact_mark[p.index()] = -1;
                    if in_worklist.insert(p) {
                        worklist.push(p);
                    }
                }
            }
        }
    }

    let irrelevant_facts = (0..n_facts)
        .filter(|&i| fact_mark[i] == 0)
        .map(|i| FactId(i as u32))
        .collect();
    let irrelevant_ops = (0..n_ops)
        .filter(|&i| op_mark[i] == 0)
        .map(|i| OpId(i as u32))
        .collect();

    Ok(IrrelevanceOutcome {
        irrelevant_facts,
        irrelevant_ops,
        static_facts,
    })
}

/// The FDR variant: identical shape, operating on variables instead of
/// facts, using a precomputed `variable -> operator` index built from
/// effect supports (any operator whose effect touches the variable).
pub fn analyze_fdr(task: &FdrTask) -> PlanResult<HashSet<VarId>> {
    for op in &task.operators {
        if op.has_cond_effects() {
            return Err(PlanError::unsupported(
                "irrelevance-fdr",
                "task has conditional effects",
            ));
        }
    }

    let n_vars = task.variables.len();
    let mut var_to_ops: HashMap<VarId, Vec<usize>> = HashMap::new();
    for (idx, op) in task.operators.iter().enumerate() {
        for &(v, _) in &op.eff {
            var_to_ops.entry(v).or_default().push(idx);
        }
    }

    let mut mark = vec![0i8; n_vars];
    let mut worklist: Vec<VarId> = Vec::new();
    let mut in_worklist = HashSet::new();
    for &(v, _) in &task.goal {
        if mark[v.index()] == 0 {
            mark[v.index()] = -1;
            if in_worklist.insert(v) {
                worklist.push(v);
            }
        }
    }

    while let Some(v) = worklist.pop() {
        in_worklist.remove(&v);
        if let Some(ops) = var_to_ops.get(&v) {
            for &op_idx in ops {
                for &(p, _) in &task.operators[op_idx].pre {
                    if mark[p.index()] == 0 {
                        mark[p.index()] = -1;
                        if in_worklist.insert(p) {
                            worklist.push(p);
                        }
                    }
                }
            }
        }
    }

    Ok((0..n_vars)
        .filter(|&i| mark[i] == 0)
        .map(|i| VarId(i as u32))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcore_types::strips::{Fact, Operator};
    use pcore_utils::Id;

    /// S4: `sunny` is in init, never added/deleted, not in goal — static
    /// and irrelevant.
    #[test]
    fn static_fact_not_reachable_from_goal_is_irrelevant() {
        let facts = vec![
            Fact {
                name: Id::from("sunny"),
                neg_of: None,
            },
            Fact {
                name: Id::from("at_goal"),
                neg_of: None,
            },
        ];
        let sunny = FactId(0);
        let at_goal = FactId(1);
        let op = Operator {
            name: Id::from("achieve"),
            cost: 1,
            pre: HashSet::new(),
            add_eff: [at_goal].into_iter().collect(),
            del_eff: HashSet::new(),
            cond_effects: vec![],
        };
        let task = StripsTask::new(
            facts,
            vec![op],
            [sunny].into_iter().collect(),
            [at_goal].into_iter().collect(),
        );
        let out = analyze(&task, &HashSet::new(), &HashSet::new()).unwrap();
        assert!(out.static_facts.contains(&sunny));
        assert!(out.irrelevant_facts.contains(&sunny));
        assert!(!out.irrelevant_facts.contains(&at_goal));
    }

    #[test]
    fn conditional_effects_are_rejected() {
        use pcore_types::strips::ConditionalEffect;
        let facts = vec![Fact {
            name: Id::from("p"),
            neg_of: None,
        }];
        let op = Operator {
            name: Id::from("op"),
            cost: 1,
            pre: HashSet::new(),
            add_eff: HashSet::new(),
            del_eff: HashSet::new(),
            cond_effects: vec![ConditionalEffect::default()],
        };
        let task = StripsTask::new(facts, vec![op], HashSet::new(), HashSet::new());
        assert!(analyze(&task, &HashSet::new(), &HashSet::new()).is_err());
    }

    #[test]
    fn goal_fact_and_its_producers_are_relevant() {
        let facts = vec![
            Fact {
                name: Id::from("p"),
                neg_of: None,
            },
            Fact {
                name: Id::from("q"),
                neg_of: None,
            },
        ];
        let p = FactId(0);
        let q = FactId(1);
        let op = Operator {
            name: Id::from("make_q"),
            cost: 1,
            pre: [p].into_iter().collect(),
            add_eff: [q].into_iter().collect(),
            del_eff: HashSet::new(),
            cond_effects: vec![],
        };
        let task = StripsTask::new(
            facts,
            vec![op],
            [p].into_iter().collect(),
            [q].into_iter().collect(),
        );
        let out = analyze(&task, &HashSet::new(), &HashSet::new()).unwrap();
        assert!(!out.irrelevant_facts.contains(&p));
        assert!(!out.irrelevant_facts.contains(&q));
        assert!(!out.irrelevant_ops.contains(&OpId(0)));
    }
}
