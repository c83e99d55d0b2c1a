//! The finite-domain-representation (FDR) task: variables with small typed
//! value domains instead of propositions, each value carrying a globally
//! unique fact id shared with the STRIPS world.
use crate::strips::FactId;
use pcore_utils::Id;

#[derive(Clone, Copy, Hash, PartialEq, Eq, Debug, PartialOrd, Ord)]
pub struct VarId(pub u32);

impl VarId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// `(variable, value-index)` pair, as used in partial-state
/// preconditions/goals and full-state effects.
pub type Assignment = (VarId, usize);

#[derive(Clone, Debug)]
pub struct FdrVariable {
    pub name: Id,
    /// One global fact id per value in the domain, in FDR import order.
    pub domain: Vec<FactId>,
}

impl FdrVariable {
    pub fn global_id(&self, value: usize) -> FactId {
        self.domain[value]
    }

    pub fn domain_size(&self) -> usize {
        self.domain.len()
    }
}

#[derive(Clone, Debug, Default)]
pub struct FdrConditionalEffect {
    pub cond: Vec<Assignment>,
    pub eff: Vec<Assignment>,
}

#[derive(Clone, Debug)]
pub struct FdrOperator {
    pub name: Id,
    pub cost: i64,
    pub pre: Vec<Assignment>,
    pub eff: Vec<Assignment>,
    pub cond_effects: Vec<FdrConditionalEffect>,
}

impl FdrOperator {
    pub fn has_cond_effects(&self) -> bool {
        !self.cond_effects.is_empty()
    }

    pub fn pre_value(&self, var: VarId) -> Option<usize> {
        self.pre
            .iter()
            .find(|(v, _)| *v == var)
            .map(|(_, val)| *val)
    }
}

#[derive(Clone, Debug)]
pub struct FdrTask {
    pub variables: Vec<FdrVariable>,
    pub operators: Vec<FdrOperator>,
    /// One value index per variable; `init[var.index()]` is the initial
    /// value of `var`.
    pub init: Vec<usize>,
    pub goal: Vec<Assignment>,
}

impl FdrTask {
    pub fn variable(&self, v: VarId) -> &FdrVariable {
        &self.variables[v.index()]
    }

    pub fn var_ids(&self) -> impl Iterator<Item = VarId> {
        (0..self.variables.len() as u32).map(VarId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pre_value_looks_up_by_variable() {
        let op = FdrOperator {
            name: Id::from("op"),
            cost: 1,
            pre: vec![(VarId(0), 2)],
            eff: vec![(VarId(0), 3)],
            cond_effects: vec![],
        };
        assert_eq!(op.pre_value(VarId(0)), Some(2));
        assert_eq!(op.pre_value(VarId(1)), None);
    }
}
