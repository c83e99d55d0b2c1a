//! The ground STRIPS task: facts indexed by contiguous integer id, operators
//! over fact-id sets, and the fact cross-reference index the pruning
//! pipeline relies on.
use pcore_utils::Id;
use std::collections::{HashMap, HashSet};

#[derive(Clone, Copy, Hash, PartialEq, Eq, Debug, PartialOrd, Ord)]
pub struct FactId(pub u32);

#[derive(Clone, Copy, Hash, PartialEq, Eq, Debug, PartialOrd, Ord)]
pub struct OpId(pub u32);

impl FactId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl OpId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug)]
pub struct Fact {
    pub name: Id,
    /// The fact id of the binary-pair negation, if one has been established.
    pub neg_of: Option<FactId>,
}

/// A conditional effect: fires only when `cond` holds, in which case it
/// contributes `add`/`del` to the successor state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConditionalEffect {
    pub cond: HashSet<FactId>,
    pub add: HashSet<FactId>,
    pub del: HashSet<FactId>,
}

#[derive(Clone, Debug)]
pub struct Operator {
    pub name: Id,
    pub cost: i64,
    pub pre: HashSet<FactId>,
    pub add_eff: HashSet<FactId>,
    pub del_eff: HashSet<FactId>,
    pub cond_effects: Vec<ConditionalEffect>,
}

impl Operator {
    pub fn has_cond_effects(&self) -> bool {
        !self.cond_effects.is_empty()
    }
}

/// Per-fact index of the operators that mention it in each role.
#[derive(Default, Clone)]
pub struct CrossRef {
    pre_ops: Vec<HashSet<OpId>>,
    add_ops: Vec<HashSet<OpId>>,
    del_ops: Vec<HashSet<OpId>>,
}

impl CrossRef {
    pub fn pre_ops(&self, f: FactId) -> &HashSet<OpId> {
        &self.pre_ops[f.index()]
    }

    pub fn add_ops(&self, f: FactId) -> &HashSet<OpId> {
        &self.add_ops[f.index()]
    }

    pub fn del_ops(&self, f: FactId) -> &HashSet<OpId> {
        &self.del_ops[f.index()]
    }
}

/// The outcome of a `reduce` call: the surviving old-id -> new-id maps, used
/// to re-project mutex groups and the mutex-pair index.
pub struct ReduceReport {
    pub fact_map: HashMap<FactId, FactId>,
    pub op_map: HashMap<OpId, OpId>,
}

#[derive(Clone)]
pub struct StripsTask {
    facts: Vec<Fact>,
    operators: Vec<Operator>,
    init: HashSet<FactId>,
    goal: HashSet<FactId>,
    has_cond_eff: bool,
    goal_is_unreachable: bool,
    xref: CrossRef,
}

fn remap_set(set: &HashSet<FactId>, map: &HashMap<FactId, FactId>) -> HashSet<FactId> {
    set.iter().filter_map(|f| map.get(f).copied()).collect()
}

impl StripsTask {
    pub fn new(
        facts: Vec<Fact>,
        operators: Vec<Operator>,
        init: HashSet<FactId>,
        goal: HashSet<FactId>,
    ) -> Self {
        let has_cond_eff = operators.iter().any(|op| op.has_cond_effects());
        let mut task = Self {
            facts,
            operators,
            init,
            goal,
            has_cond_eff,
            goal_is_unreachable: false,
            xref: CrossRef::default(),
        };
        task.rebuild_xref();
        task
    }

    pub fn facts(&self) -> &[Fact] {
        &self.facts
    }

    pub fn fact(&self, id: FactId) -> &Fact {
        &self.facts[id.index()]
    }

    pub fn fact_ids(&self) -> impl Iterator<Item = FactId> {
        (0..self.facts.len() as u32).map(FactId)
    }

    pub fn operators(&self) -> &[Operator] {
        &self.operators
    }

    pub fn operator(&self, id: OpId) -> &Operator {
        &self.operators[id.index()]
    }

    pub fn op_ids(&self) -> impl Iterator<Item = OpId> {
        (0..self.operators.len() as u32).map(OpId)
    }

    pub fn init(&self) -> &HashSet<FactId> {
        &self.init
    }

    pub fn goal(&self) -> &HashSet<FactId> {
        &self.goal
    }

    pub fn has_cond_eff(&self) -> bool {
        self.has_cond_eff
    }

    pub fn goal_is_unreachable(&self) -> bool {
        self.goal_is_unreachable
    }

    pub fn set_goal_is_unreachable(&mut self, v: bool) {
        self.goal_is_unreachable = v;
    }

    pub fn xref(&self) -> &CrossRef {
        &self.xref
    }

    pub fn facts_mut(&mut self) -> &mut [Fact] {
        &mut self.facts
    }

    pub fn operators_mut(&mut self) -> &mut [Operator] {
        &mut self.operators
    }

    /// Appends a new fact, returning its id. The only sanctioned way to grow
    /// a task outside of import — used by mutex-group promotion to
    /// synthesize none-of-those and binary-encoding facts.
    pub fn add_fact(&mut self, fact: Fact) -> FactId {
        let id = FactId(self.facts.len() as u32);
        self.facts.push(fact);
        self.xref.pre_ops.push(HashSet::new());
        self.xref.add_ops.push(HashSet::new());
        self.xref.del_ops.push(HashSet::new());
        id
    }

    pub fn add_to_init(&mut self, f: FactId) {
        self.init.insert(f);
    }

    /// Re-derives the cross-reference index after direct mutation through
    /// `operators_mut`/`add_fact`. Promotion calls this once its edits for a
    /// group are complete.
    pub fn rebuild_xref(&mut self) {
        let n = self.facts.len();
        let mut pre_ops = vec![HashSet::new(); n];
        let mut add_ops = vec![HashSet::new(); n];
        let mut del_ops = vec![HashSet::new(); n];
        for (idx, op) in self.operators.iter().enumerate() {
            let id = OpId(idx as u32);
            for &f in &op.pre {
                pre_ops[f.index()].insert(id);
            }
            for &f in &op.add_eff {
                add_ops[f.index()].insert(id);
            }
            for &f in &op.del_eff {
                del_ops[f.index()].insert(id);
            }
        }
        self.xref = CrossRef {
            pre_ops,
            add_ops,
            del_ops,
        };
    }

    /// Compacts fact/operator ids contiguously after removing `del_facts`
    /// and `del_ops`, remapping every reference (including `neg_of` links
    /// and conditional-effect triggers) and rebuilding the cross-reference
    /// index. `reduce(∅, ∅)` is a no-op.
    pub fn reduce(
        &mut self,
        del_facts: &HashSet<FactId>,
        del_ops: &HashSet<OpId>,
    ) -> ReduceReport {
        let mut fact_map = HashMap::new();
        let mut new_facts = Vec::new();
        for (old_idx, fact) in self.facts.iter().enumerate() {
            let old_id = FactId(old_idx as u32);
            if del_facts.contains(&old_id) {
                continue;
            }
            let new_id = FactId(new_facts.len() as u32);
            fact_map.insert(old_id, new_id);
            new_facts.push(fact.clone());
        }
        for f in new_facts.iter_mut() {
            f.neg_of = f.neg_of.and_then(|old| fact_map.get(&old).copied());
        }

        let mut op_map = HashMap::new();
        let mut new_ops = Vec::new();
        for (old_idx, op) in self.operators.iter().enumerate() {
            let old_id = OpId(old_idx as u32);
            if del_ops.contains(&old_id) {
                continue;
            }
            let new_id = OpId(new_ops.len() as u32);
            op_map.insert(old_id, new_id);
            let mut op = op.clone();
            op.pre = remap_set(&op.pre, &fact_map);
            op.add_eff = remap_set(&op.add_eff, &fact_map);
            op.del_eff = remap_set(&op.del_eff, &fact_map);
            for ce in &mut op.cond_effects {
                ce.cond = remap_set(&ce.cond, &fact_map);
                ce.add = remap_set(&ce.add, &fact_map);
                ce.del = remap_set(&ce.del, &fact_map);
            }
            new_ops.push(op);
        }

        self.facts = new_facts;
        self.operators = new_ops;
        self.init = remap_set(&self.init, &fact_map);
        self.goal = remap_set(&self.goal, &fact_map);
        self.has_cond_eff = self.operators.iter().any(|op| op.has_cond_effects());
        self.rebuild_xref();

        ReduceReport { fact_map, op_map }
    }

    /// Asserted invariants; a violation is a core bug, not a recoverable
    /// input error, hence `debug_assert!` rather than a `Result`.
    pub fn check_invariants(&self) {
        for op in &self.operators {
            debug_assert!(
                op.add_eff.is_disjoint(&op.del_eff),
                "operator `{}` has overlapping add/del effects",
                op.name
            );
        }
        for (idx, fact) in self.facts.iter().enumerate() {
            if let Some(neg) = fact.neg_of {
                let back = self.facts[neg.index()].neg_of;
                debug_assert_eq!(
                    back,
                    Some(FactId(idx as u32)),
                    "neg_of link from `{}` is not symmetric",
                    fact.name
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_fact_task() -> StripsTask {
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
        let ops = vec![Operator {
            name: Id::from("op"),
            cost: 1,
            pre: [FactId(0)].into_iter().collect(),
            add_eff: [FactId(1)].into_iter().collect(),
            del_eff: [FactId(0)].into_iter().collect(),
            cond_effects: vec![],
        }];
        StripsTask::new(
            facts,
            ops,
            [FactId(0)].into_iter().collect(),
            [FactId(1)].into_iter().collect(),
        )
    }

    #[test]
    fn reduce_empty_is_no_op() {
        let mut task = two_fact_task();
        let names_before: Vec<_> = task.facts().iter().map(|f| f.name).collect();
        let report = task.reduce(&HashSet::new(), &HashSet::new());
        assert_eq!(report.fact_map.len(), 2);
        let names_after: Vec<_> = task.facts().iter().map(|f| f.name).collect();
        assert_eq!(names_before, names_after);
    }

    #[test]
    fn reduce_compacts_ids_contiguously() {
        let mut task = two_fact_task();
        let report = task.reduce(&[FactId(0)].into_iter().collect(), &HashSet::new());
        assert_eq!(task.facts().len(), 1);
        assert_eq!(task.fact(FactId(0)).name, Id::from("b"));
        assert_eq!(report.fact_map.get(&FactId(1)), Some(&FactId(0)));
        // The operator referenced the removed fact in pre/del but was not
        // itself in del_ops, so it survives with those sets now empty.
        assert_eq!(task.operators().len(), 1);
        assert!(task.operator(OpId(0)).pre.is_empty());
        assert!(task.operator(OpId(0)).del_eff.is_empty());
    }

    #[test]
    fn cross_reference_reflects_operator_roles() {
        let task = two_fact_task();
        assert!(task.xref().pre_ops(FactId(0)).contains(&OpId(0)));
        assert!(task.xref().add_ops(FactId(1)).contains(&OpId(0)));
        assert!(task.xref().del_ops(FactId(0)).contains(&OpId(0)));
    }
}
