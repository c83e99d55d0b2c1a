use crate::formula::Formula;
use crate::param::ParamList;
use pcore_utils::Id;

/// A lifted (first-order, parameter-bearing) action schema.
///
/// The effect formula may mix add/delete atoms and `when(cond => eff)`
/// conditional-effect nodes; the compile-in engine treats each `when`'s
/// `cond` as an additional precondition site alongside the top-level
/// precondition.
#[derive(Clone, Debug)]
pub struct Action {
    pub name: Id,
    pub params: ParamList,
    pub precondition: Formula,
    pub effect: Formula,
}

impl Action {
    pub fn new(
        name: Id,
        params: ParamList,
        precondition: Formula,
        effect: Formula,
    ) -> Self {
        Self {
            name,
            params,
            precondition,
            effect,
        }
    }

    /// `true` iff `effect` contains at least one `when(cond => eff)` node.
    pub fn has_conditional_effects(&self) -> bool {
        let mut found = false;
        crate::formula::for_each_when(&self.effect, &mut |_, _| found = true);
        found
    }
}
