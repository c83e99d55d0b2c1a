//! The typed first-order unifier (component A): first-order unification of
//! parametric atoms under a type lattice, materializing equality/inequality
//! conditions.
//!
//! Merging is the classic union-find-free "rename everywhere" unifier: a
//! variable merge rewrites every slot carrying either identity to a single
//! canonical identity, across both sides' slot arrays. This is appropriate
//! because parameter lists here are short (tens of entries at most), which
//! keeps `equal` a plain derived comparison on the canonical maps.
use crate::atom::Atom;
use crate::formula::{for_each_atom, new_and, new_atom, new_bool, new_or, Formula};
use crate::param::{Arg, ParamList};
use crate::predicate::Predicate;
use crate::types::{ObjectId, TypeCatalogue, TypeId};
use itertools::Itertools;

/// Unification failed: predicate mismatch, an empty common type, a type
/// mismatch between a variable and an object, or two mismatched objects.
/// This is expected control flow, not a core error — callers always work on
/// a clone and simply discard it on failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Incompatible;

pub type UnifyResult<T> = Result<T, Incompatible>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotValue {
    Object(ObjectId),
    /// An integer variable identity plus the most specific type known for
    /// it so far. A slot that has never been merged carries a variable
    /// identity unique to itself — that is how "unbound" is represented.
    Var { id: u32, ty: TypeId },
}

fn values_identical(a: SlotValue, b: SlotValue) -> bool {
    match (a, b) {
        (SlotValue::Object(x), SlotValue::Object(y)) => x == y,
        (SlotValue::Var { id: i1, ty: t1 }, SlotValue::Var { id: i2, ty: t2 }) => {
            i1 == i2 && t1 == t2
        }
        _ => false,
    }
}

/// Side 0 conventionally indexes the action's parameters, side 1 the mutex
/// group's.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    A = 0,
    B = 1,
}

#[derive(Clone)]
pub struct UnificationState<'c> {
    cat: &'c TypeCatalogue,
    params: [ParamList; 2],
    slots: [Vec<SlotValue>; 2],
    next_var: u32,
}

impl<'c> UnificationState<'c> {
    /// Allocates a fresh state where every parameter slot of both sides is
    /// unbound and assigned a unique fresh variable identity.
    pub fn init(cat: &'c TypeCatalogue, params_a: ParamList, params_b: ParamList) -> Self {
        let mut next_var = 0u32;
        let fresh = |params: &ParamList, next_var: &mut u32| {
            let mut slots = Vec::with_capacity(params.len());
            for (_, slot) in params.iter() {
                slots.push(SlotValue::Var {
                    id: *next_var,
                    ty: slot.ty,
                });
                *next_var += 1;
            }
            slots
        };
        let slots_a = fresh(&params_a, &mut next_var);
        let slots_b = fresh(&params_b, &mut next_var);
        Self {
            cat,
            params: [params_a, params_b],
            slots: [slots_a, slots_b],
            next_var,
        }
    }

    /// Deep-copies the mapping (the catalogue reference is shared, as it is
    /// caller-owned, read-only context).
    pub fn copy(&self) -> Self {
        self.clone()
    }

    fn resolve(&self, side: usize, arg: Arg) -> SlotValue {
        match arg {
            Arg::Object(o) => SlotValue::Object(o),
            Arg::Param(i) => self.slots[side][i],
        }
    }

    fn rewrite_var(&mut self, old_id: u32, new_val: SlotValue) {
        for side_slots in &mut self.slots {
            for slot in side_slots.iter_mut() {
                if let SlotValue::Var { id, .. } = slot {
                    if *id == old_id {
                        *slot = new_val;
                    }
                }
            }
        }
    }

    fn merge(
        &mut self,
        side_a: usize,
        arg_a: Arg,
        side_b: usize,
        arg_b: Arg,
    ) -> UnifyResult<()> {
        let va = self.resolve(side_a, arg_a);
        let vb = self.resolve(side_b, arg_b);
        match (va, vb) {
            (SlotValue::Object(oa), SlotValue::Object(ob)) => {
                if oa == ob {
                    Ok(())
                } else {
                    Err(Incompatible)
                }
            }
            (SlotValue::Object(o), SlotValue::Var { id, ty })
            | (SlotValue::Var { id, ty }, SlotValue::Object(o)) => {
                if !self.cat.object_has_type(ty, o) {
                    return Err(Incompatible);
                }
                self.rewrite_var(id, SlotValue::Object(o));
                Ok(())
            }
            (SlotValue::Var { id: id1, ty: ty1 }, SlotValue::Var { id: id2, ty: ty2 }) => {
                if id1 == id2 {
                    return Ok(());
                }
                let common = self.cat.most_specific(ty1, ty2).ok_or(Incompatible)?;
                if self.cat.is_unsatisfiable(common) {
                    return Err(Incompatible);
                }
                let canonical = id1.min(id2);
                let new_val = SlotValue::Var {
                    id: canonical,
                    ty: common,
                };
                self.rewrite_var(id1, new_val);
                self.rewrite_var(id2, new_val);
                Ok(())
            }
        }
    }

    /// Attempts to extend the state so that `atom_a` (under the action's
    /// parameters, side 0) equals `atom_b` (under the mutex group's
    /// parameters, side 1).
    pub fn unify(&mut self, atom_a: &Atom, atom_b: &Atom) -> UnifyResult<()> {
        if atom_a.predicate != atom_b.predicate {
            return Err(Incompatible);
        }
        for i in 0..atom_a.args.len() {
            self.merge(0, atom_a.args[i], 1, atom_b.args[i])?;
        }
        Ok(())
    }

    /// Scans `cond` for positive atoms of `eq_pred` and unifies the two
    /// argument slots (both interpreted under `side`'s own parameter list)
    /// accordingly. A `None` condition is a no-op.
    pub fn apply_equality(
        &mut self,
        side: Side,
        eq_pred: Predicate,
        cond: Option<&Formula>,
    ) -> UnifyResult<()> {
        let Some(cond) = cond else {
            return Ok(());
        };
        let side = side as usize;
        let mut atoms = Vec::new();
        for_each_atom(cond, &mut |a| atoms.push(a.clone()));
        for a in atoms {
            if a.predicate == eq_pred && !a.negated {
                self.merge(side, a.args[0], side, a.args[1])?;
            }
        }
        Ok(())
    }

    /// `true` iff every negated `eq_pred` atom in `cond` names two parameter
    /// slots whose current values are not pairwise identical.
    pub fn check_inequality(
        &self,
        side: Side,
        eq_pred: Predicate,
        cond: Option<&Formula>,
    ) -> bool {
        let Some(cond) = cond else {
            return true;
        };
        let side = side as usize;
        let mut atoms = Vec::new();
        for_each_atom(cond, &mut |a| atoms.push(a.clone()));
        atoms
            .iter()
            .filter(|a| a.predicate == eq_pred && a.negated)
            .all(|a| {
                let va = self.resolve(side, a.args[0]);
                let vb = self.resolve(side, a.args[1]);
                !values_identical(va, vb)
            })
    }

    /// A purely syntactic check (not a satisfiability query): `true` iff at
    /// least one argument position's resolved value differs between the two
    /// atoms.
    pub fn atoms_differ(
        &self,
        side_a: Side,
        atom_a: &Atom,
        side_b: Side,
        atom_b: &Atom,
    ) -> bool {
        if atom_a.args.len() != atom_b.args.len() {
            return true;
        }
        let (side_a, side_b) = (side_a as usize, side_b as usize);
        for i in 0..atom_a.args.len() {
            let va = self.resolve(side_a, atom_a.args[i]);
            let vb = self.resolve(side_b, atom_b.args[i]);
            if !values_identical(va, vb) {
                return true;
            }
        }
        false
    }

    /// `true` iff the two argument positions (both interpreted under
    /// `side`) can never denote the same value under the current map —
    /// fixed to different objects, an object outside a bound variable's
    /// type, or two variables whose current types are disjoint. Used by the
    /// compile-in engine to short-circuit `condAtomsNotEqual` disjuncts that
    /// are already known true.
    pub fn args_incompatible(&self, side: Side, a: Arg, b: Arg) -> bool {
        let side = side as usize;
        match (self.resolve(side, a), self.resolve(side, b)) {
            (SlotValue::Object(o1), SlotValue::Object(o2)) => o1 != o2,
            (SlotValue::Object(o), SlotValue::Var { ty, .. })
            | (SlotValue::Var { ty, .. }, SlotValue::Object(o)) => {
                !self.cat.object_has_type(ty, o)
            }
            (SlotValue::Var { id: id1, ty: ty1 }, SlotValue::Var { id: id2, ty: ty2 }) => {
                id1 != id2 && self.cat.are_disjoint(ty1, ty2)
            }
        }
    }

    /// Structural equality of the two maps; requires identical
    /// parameter-list identities.
    pub fn equal(&self, other: &Self) -> bool {
        self.params == other.params && self.slots == other.slots
    }

    /// Materializes the unifier as a condition formula over one side's
    /// parameters. Returns `true` when no constraint fires.
    pub fn to_cond(&self, side: Side, eq_pred: Predicate) -> Formula {
        let side = side as usize;
        let n = self.params[side].len();
        let mut conjuncts = Vec::new();

        for i in 0..n {
            match self.slots[side][i] {
                SlotValue::Object(o) => {
                    conjuncts.push(new_atom(Atom::new(
                        eq_pred,
                        vec![Arg::Param(i), Arg::Object(o)],
                    )));
                }
                SlotValue::Var { ty, .. } => {
                    let declared = self.params[side].slot(i).ty;
                    if ty != declared {
                        let disjuncts: Vec<Formula> = self
                            .cat
                            .objects_of_type(ty)
                            .iter()
                            .map(|&o| {
                                new_atom(Atom::new(
                                    eq_pred,
                                    vec![Arg::Param(i), Arg::Object(o)],
                                ))
                            })
                            .collect();
                        conjuncts.push(new_or(disjuncts));
                    }
                }
            }
        }
        for (i, j) in (0..n).tuple_combinations() {
            if let (SlotValue::Var { id: id_i, .. }, SlotValue::Var { id: id_j, .. }) =
                (self.slots[side][i], self.slots[side][j])
            {
                if id_i == id_j {
                    conjuncts.push(new_atom(Atom::new(
                        eq_pred,
                        vec![Arg::Param(i), Arg::Param(j)],
                    )));
                }
            }
        }

        if conjuncts.is_empty() {
            new_bool(true)
        } else {
            new_and(conjuncts)
        }
    }

    /// Re-freshens the variable identities of every slot flagged
    /// `is_counted_var` on both sides, resetting them to unbound. Used to
    /// treat counted mutex-group parameters as unrestricted after the rest
    /// of the unifier has been fixed.
    pub fn reset_counted_vars(&mut self) {
        for side in 0..2 {
            let counted: Vec<usize> = self.params[side].counted_indices().collect();
            for idx in counted {
                let ty = self.params[side].slot(idx).ty;
                self.slots[side][idx] = SlotValue::Var {
                    id: self.next_var,
                    ty,
                };
                self.next_var += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::ParamSlot;
    use pcore_utils::Id;

    fn truck_location_catalogue() -> (TypeCatalogue, TypeId, TypeId, ObjectId, ObjectId, ObjectId) {
        let mut cat = TypeCatalogue::new();
        let object = cat.declare_type(Id::from("object"), None);
        let truck = cat.declare_type(Id::from("truck"), Some(object));
        let location = cat.declare_type(Id::from("location"), Some(object));
        let truck1 = cat.declare_object(Id::from("truck1"), truck);
        let depot = cat.declare_object(Id::from("depot"), location);
        let store = cat.declare_object(Id::from("store"), location);
        (cat, truck, location, truck1, depot, store)
    }

    #[test]
    fn unify_two_object_arguments_succeeds_when_equal() {
        let (cat, truck, location, truck1, depot, _store) = truck_location_catalogue();
        let at = Predicate::new(Id::from("at"), 2);
        let params_a = ParamList::new(vec![ParamSlot::new(truck), ParamSlot::new(location)]);
        let params_b = params_a.clone();
        let mut u = UnificationState::init(&cat, params_a, params_b);
        let a1 = Atom::new(at, vec![Arg::Object(truck1), Arg::Object(depot)]);
        let a2 = Atom::new(at, vec![Arg::Param(0), Arg::Param(1)]);
        assert!(u.unify(&a1, &a2).is_ok());
    }

    #[test]
    fn unify_incompatible_objects_fails_and_is_idempotent_on_retry() {
        let (cat, truck, location, truck1, depot, store) = truck_location_catalogue();
        let at = Predicate::new(Id::from("at"), 2);
        let params = ParamList::new(vec![ParamSlot::new(truck), ParamSlot::new(location)]);
        let u0 = UnificationState::init(&cat, params.clone(), params);
        let a1 = Atom::new(at, vec![Arg::Object(truck1), Arg::Object(depot)]);
        let a2 = Atom::new(at, vec![Arg::Object(truck1), Arg::Object(store)]);

        let mut attempt1 = u0.copy();
        assert_eq!(attempt1.unify(&a1, &a2), Err(Incompatible));

        // property 1: unifier idempotence — retrying on a fresh clone fails
        // again identically.
        let mut attempt2 = u0.copy();
        assert_eq!(attempt2.unify(&a1, &a2), Err(Incompatible));
    }

    #[test]
    fn unify_merges_two_parameters_into_one_variable_identity() {
        let (cat, truck, location, _truck1, _depot, _store) = truck_location_catalogue();
        let at = Predicate::new(Id::from("at"), 2);
        let params_a = ParamList::new(vec![ParamSlot::new(truck), ParamSlot::new(location)]);
        let params_b = ParamList::new(vec![ParamSlot::new(truck), ParamSlot::new(location)]);
        let mut u = UnificationState::init(&cat, params_a, params_b);
        let a_side = Atom::new(at, vec![Arg::Param(0), Arg::Param(1)]);
        let b_side = Atom::new(at, vec![Arg::Param(0), Arg::Param(1)]);
        u.unify(&a_side, &b_side).unwrap();

        let eq_pred = Predicate::eq();
        let cond = u.to_cond(Side::A, eq_pred);
        // Both argument positions on side A should now be equated with the
        // corresponding side-B parameters via a shared variable identity.
        assert!(!matches!(cond.as_ref(), crate::formula::FormulaNode::Bool(true)));
    }

    #[test]
    fn reset_counted_vars_only_touches_counted_slots() {
        let (cat, truck, _location, _t, _d, _s) = truck_location_catalogue();
        let params_a = ParamList::new(vec![ParamSlot::counted(truck)]);
        let params_b = ParamList::new(vec![ParamSlot::new(truck)]);
        let mut u = UnificationState::init(&cat, params_a, params_b);
        let before = u.copy();
        u.reset_counted_vars();
        assert!(!u.equal(&before));
    }
}
