use crate::atom::Atom;
use crate::param::{ParamList, ParamSlot};

/// A lifted mutex group: a parameter list plus an ordered sequence of
/// positive "count atoms", at most one of which holds for any fixed binding
/// of the group's free (non-counted) parameters.
#[derive(Clone, Debug)]
pub struct LiftedMutexGroup {
    pub params: ParamList,
    pub count_atoms: Vec<Atom>,
}

impl LiftedMutexGroup {
    pub fn new(params: ParamList, count_atoms: Vec<Atom>) -> Self {
        Self {
            params,
            count_atoms,
        }
    }

    /// A clone that treats every instantiation of the group's counted
    /// parameters as a distinct member: counted slots are duplicated (one
    /// copy per occurrence they're referenced from across the count atoms)
    /// so that the search in the compile-in engine can pick two *distinct*
    /// instantiations of the same counted parameter independently.
    ///
    /// Produced fresh by the group-preparation step before each compile-in
    /// call and discarded afterward; never cached.
    pub fn double_counted(&self) -> LiftedMutexGroup {
        let counted: Vec<usize> = self.params.counted_indices().collect();
        if counted.is_empty() {
            return self.clone();
        }

        // Append one duplicate slot per counted parameter.
        let mut slots: Vec<ParamSlot> =
            (0..self.params.len()).map(|i| self.params.slot(i)).collect();
        let mut remap = std::collections::HashMap::new();
        for &idx in &counted {
            let dup_idx = slots.len();
            slots.push(self.params.slot(idx));
            remap.insert(idx, dup_idx);
        }
        let new_params = ParamList::new(slots);

        // For every count atom that mentions a counted parameter, add a
        // structural duplicate rebound to the duplicated slots. Callers
        // searching for "two distinct count atoms" can then pick the
        // original and the duplicate of the *same* textual atom, which is
        // exactly what "every instantiation of counted params is a distinct
        // member" means when there is only one syntactic count atom but an
        // unbounded family of ground instances.
        let mut count_atoms = self.count_atoms.clone();
        let extra: Vec<Atom> = self
            .count_atoms
            .iter()
            .filter(|a| {
                a.args.iter().any(|arg| {
                    matches!(arg, crate::param::Arg::Param(p) if counted.contains(p))
                })
            })
            .map(|a| {
                let mut dup = a.clone();
                for arg in &mut dup.args {
                    if let crate::param::Arg::Param(p) = arg {
                        if let Some(&new_p) = remap.get(p) {
                            *p = new_p;
                        }
                    }
                }
                dup
            })
            .collect();
        count_atoms.extend(extra);

        LiftedMutexGroup {
            params: new_params,
            count_atoms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::Arg;
    use crate::predicate::Predicate;
    use crate::types::TypeCatalogue;
    use pcore_utils::Id;

    #[test]
    fn double_counted_is_identity_when_nothing_counted() {
        let mut cat = TypeCatalogue::new();
        let object = cat.declare_type(Id::from("object"), None);
        let params = ParamList::new(vec![ParamSlot::new(object), ParamSlot::new(object)]);
        let p = Predicate::new(Id::from("at"), 2);
        let atoms = vec![Atom::new(p, vec![Arg::Param(0), Arg::Param(1)])];
        let group = LiftedMutexGroup::new(params, atoms);
        let doubled = group.double_counted();
        assert_eq!(doubled.params.len(), group.params.len());
    }
}
