//! Component C: the typed-unifier-driven compile-in engine. Strengthens
//! action preconditions (and conditional-effect triggers) so that firing
//! the action can no longer violate a mutex group or strand it in a
//! dead-end, per (action, mutex-group) pair.
use pcore_types::atom::Atom;
use pcore_types::formula::{self, new_and, new_atom, new_bool, new_or, new_when, Formula, FormulaNode};
use pcore_types::lifted_task::LiftedTask;
use pcore_types::mutex_group::LiftedMutexGroup;
use pcore_types::param::{Arg, ParamList};
use pcore_types::predicate::Predicate;
use pcore_types::types::TypeCatalogue;
use pcore_types::unifier::{Side, UnificationState};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompileInOutcome {
    Failed,
    Unchanged,
    Strengthened,
}

impl From<CompileInOutcome> for i32 {
    fn from(outcome: CompileInOutcome) -> i32 {
        match outcome {
            CompileInOutcome::Failed => -1,
            CompileInOutcome::Unchanged => 0,
            CompileInOutcome::Strengthened => 1,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct CompileInOptions {
    pub prune_mutex: bool,
    pub prune_dead_end: bool,
}

/// Splits a formula tree's top-level literals into positive (add) and
/// negative (delete) atoms, stopping at `When` boundaries — those are
/// separate precondition sites, handled by the caller.
fn flatten_effect_literals(f: &Formula, add: &mut Vec<Atom>, del: &mut Vec<Atom>) {
    match f.as_ref() {
        FormulaNode::Atom(a) => {
            if a.negated {
                del.push(a.clone());
            } else {
                add.push(a.clone());
            }
        }
        FormulaNode::And(children) | FormulaNode::Or(children) => {
            for c in children {
                flatten_effect_literals(c, add, del);
            }
        }
        FormulaNode::Bool(_) | FormulaNode::When { .. } => {}
    }
}

/// Collects every positive atom reachable at the top level of a precondition
/// formula (again stopping at `When` boundaries, which do not occur in
/// well-formed preconditions but are tolerated defensively).
fn flatten_precondition_literals(f: &Formula, out: &mut Vec<Atom>) {
    match f.as_ref() {
        FormulaNode::Atom(a) => {
            if !a.negated {
                out.push(a.clone());
            }
        }
        FormulaNode::And(children) | FormulaNode::Or(children) => {
            for c in children {
                flatten_precondition_literals(c, out);
            }
        }
        FormulaNode::Bool(_) | FormulaNode::When { .. } => {}
    }
}

/// The `(cond, eff)` pairs of every top-level `When` node in an effect tree,
/// in the same pre-order as `rebuild_effect_with_new_when_conds` consumes.
fn top_level_when_nodes(effect: &Formula) -> Vec<(Formula, Formula)> {
    match effect.as_ref() {
        FormulaNode::When { cond, eff } => vec![(cond.clone(), eff.clone())],
        FormulaNode::And(children) | FormulaNode::Or(children) => {
            children.iter().flat_map(top_level_when_nodes).collect()
        }
        FormulaNode::Atom(_) | FormulaNode::Bool(_) => Vec::new(),
    }
}

/// Rebuilds an effect tree with each top-level `When`'s `cond` replaced by
/// the corresponding entry of `new_conds`, consumed in `top_level_when_nodes`
/// order.
fn rebuild_effect_with_new_when_conds(effect: &Formula, new_conds: &[Formula]) -> Formula {
    fn go(f: &Formula, new_conds: &[Formula], idx: &mut usize) -> Formula {
        match f.as_ref() {
            FormulaNode::When { eff, .. } => {
                let nc = new_conds[*idx].clone();
                *idx += 1;
                new_when(nc, eff.clone())
            }
            FormulaNode::And(children) => {
                new_and(children.iter().map(|c| go(c, new_conds, idx)).collect())
            }
            FormulaNode::Or(children) => {
                new_or(children.iter().map(|c| go(c, new_conds, idx)).collect())
            }
            FormulaNode::Atom(_) | FormulaNode::Bool(_) => f.clone(),
        }
    }
    let mut idx = 0;
    go(effect, new_conds, &mut idx)
}

/// A single disjunct of `condAtomsNotEqual` for one argument position,
/// purely syntactic: identical param indices or identical objects can never
/// differ (`false`); differing objects always differ (`true`); otherwise a
/// negated `eq_pred` atom, canonically oriented (smaller param index first;
/// the parameter side occupies argument 0 when the other side is an object).
fn arg_not_equal_disjunct(a: Arg, b: Arg) -> Formula {
    match (a, b) {
        (Arg::Object(o1), Arg::Object(o2)) => new_bool(o1 != o2),
        (Arg::Param(p1), Arg::Param(p2)) => {
            if p1 == p2 {
                new_bool(false)
            } else {
                let (lo, hi) = if p1 <= p2 { (p1, p2) } else { (p2, p1) };
                new_atom(Atom::negated(
                    Predicate::eq(),
                    vec![Arg::Param(lo), Arg::Param(hi)],
                ))
            }
        }
        (Arg::Param(p), Arg::Object(o)) | (Arg::Object(o), Arg::Param(p)) => new_atom(
            Atom::negated(Predicate::eq(), vec![Arg::Param(p), Arg::Object(o)]),
        ),
    }
}

/// `condAtomsNotEqual`: a disjunction over argument positions expressing
/// that `p1` and `p2` are not argument-wise equal. A position whose current
/// unifier values are already incompatible short-circuits that disjunct to
/// `true`, which `simplify` then collapses the whole disjunction to.
fn cond_atoms_not_equal(u: &UnificationState, side: Side, p1: &Atom, p2: &Atom) -> Formula {
    let mut disjuncts = Vec::with_capacity(p1.args.len());
    for i in 0..p1.args.len() {
        let (a, b) = (p1.args[i], p2.args[i]);
        if u.args_incompatible(side, a, b) {
            disjuncts.push(new_bool(true));
        } else {
            disjuncts.push(arg_not_equal_disjunct(a, b));
        }
    }
    new_or(disjuncts)
}

/// The mutex-compile-in witness search: two distinct positive literals in
/// `literals`, unified against two distinct count atoms of `group`, produce
/// a witness `U ∧ D` to be forbidden. Returns one accumulated formula per
/// witness found.
///
/// `own_from` is the index in `literals` where the site's own literals
/// begin (0 for the top-level precondition site, where every literal is the
/// site's own). At a conditional-effect trigger site, `literals` is the
/// trigger's own atoms appended to the action's top-level precondition
/// atoms, and `own_from` marks that boundary: at least one of the two
/// literals in a candidate pair must come from the trigger's own atoms
/// (index `>= own_from`), so this search never draws both literals purely
/// from the top-level precondition — that pairing is already covered by the
/// separate top-level-only call.
fn mutex_witnesses_for_site(
    cat: &TypeCatalogue,
    action_params: &ParamList,
    literals: &[Atom],
    own_from: usize,
    cond: &Formula,
    group: &LiftedMutexGroup,
) -> Vec<Formula> {
    let eq_pred = Predicate::eq();
    let mut out = Vec::new();
    for i in 0..literals.len() {
        for j in 0..literals.len() {
            if i == j {
                continue;
            }
            if i < own_from && j < own_from {
                continue;
            }
            let p1 = &literals[i];
            let p2 = &literals[j];
            for gi in 0..group.count_atoms.len() {
                for gj in 0..group.count_atoms.len() {
                    if gi == gj {
                        continue;
                    }
                    let g1 = &group.count_atoms[gi];
                    let g2 = &group.count_atoms[gj];
                    let mut u =
                        UnificationState::init(cat, action_params.clone(), group.params.clone());
                    if u.unify(p1, g1).is_err() {
                        continue;
                    }
                    if u.unify(p2, g2).is_err() {
                        continue;
                    }
                    if u.apply_equality(Side::A, eq_pred, Some(cond)).is_err() {
                        continue;
                    }
                    if !u.check_inequality(Side::A, eq_pred, Some(cond)) {
                        continue;
                    }
                    if !u.atoms_differ(Side::A, p1, Side::A, p2) {
                        // Already forced syntactically identical: only one
                        // instantiated count atom, not two.
                        continue;
                    }
                    let d = formula::simplify(&cond_atoms_not_equal(&u, Side::A, p1, p2));
                    if matches!(d.as_ref(), FormulaNode::Bool(false)) {
                        continue;
                    }
                    let u_cond = u.to_cond(Side::A, eq_pred);
                    out.push(new_and(vec![u_cond, d]));
                }
            }
        }
    }
    out
}

/// The dead-end-compile-in witness search: chains the four nested searches
/// from the component design (goal atom, delete literal, precondition
/// literal, add-effect exhaustion) and returns one accumulated formula per
/// surviving witness.
#[allow(clippy::too_many_arguments)]
fn dead_end_witnesses_for_site(
    cat: &TypeCatalogue,
    action_params: &ParamList,
    precondition_literals: &[Atom],
    precondition_cond: &Formula,
    add_effects: &[Atom],
    del_effects: &[Atom],
    group: &LiftedMutexGroup,
    goal_atoms: &[Atom],
) -> Vec<Formula> {
    let eq_pred = Predicate::eq();
    let mut out = Vec::new();

    for gamma in goal_atoms {
        for gi in 0..group.count_atoms.len() {
            let g_goal = &group.count_atoms[gi];
            let mut u0 =
                UnificationState::init(cat, action_params.clone(), group.params.clone());
            if u0.unify(gamma, g_goal).is_err() {
                continue;
            }

            for d in del_effects {
                for gj in 0..group.count_atoms.len() {
                    let g_del = &group.count_atoms[gj];
                    let mut u1 = u0.copy();
                    if u1.unify(d, g_del).is_err() {
                        continue;
                    }

                    for p in precondition_literals {
                        let mut u2 = u1.copy();
                        if u2.unify(p, g_del).is_err() {
                            continue;
                        }
                        if u2
                            .apply_equality(Side::A, eq_pred, Some(precondition_cond))
                            .is_err()
                        {
                            continue;
                        }
                        if !u2.check_inequality(Side::A, eq_pred, Some(precondition_cond)) {
                            continue;
                        }

                        let del_cond = formula::simplify(&u2.to_cond(Side::A, eq_pred));
                        let mut discarded = false;
                        let mut add_neg_conds = Vec::new();
                        'adds: for alpha in add_effects {
                            for gk in 0..group.count_atoms.len() {
                                if gk == gj {
                                    continue;
                                }
                                let m = &group.count_atoms[gk];
                                let mut u3 = u2.copy();
                                if u3.unify(alpha, m).is_err() {
                                    continue;
                                }
                                if u3.equal(&u2) {
                                    discarded = true;
                                    break 'adds;
                                }
                                let ext_cond = formula::simplify(&u3.to_cond(Side::A, eq_pred));
                                if formula::is_entailed(&del_cond, &ext_cond) {
                                    discarded = true;
                                    break 'adds;
                                }
                                add_neg_conds.push(formula::negate(&ext_cond));
                            }
                        }
                        if discarded {
                            continue;
                        }

                        let mut conjuncts = vec![del_cond];
                        conjuncts.extend(add_neg_conds);
                        let witness = formula::simplify(&new_and(conjuncts));
                        let witness = formula::normalize(&witness);
                        let witness = formula::simplify(&witness);
                        out.push(witness);
                    }
                }
            }
        }
    }

    out
}

fn dedup_formulas(items: Vec<Formula>) -> Vec<Formula> {
    let mut out: Vec<Formula> = Vec::with_capacity(items.len());
    for f in items {
        if !out.iter().any(|g| formula::equal(g, &f)) {
            out.push(f);
        }
    }
    out
}

/// Turns the accumulated witness list for one site into `¬w₁ ∧ ¬w₂ ∧ …`
/// appended to `original`, double-simplified around the normalization pass.
/// Returns the (possibly unchanged) formula plus whether anything was added.
fn merge_into_precondition(original: &Formula, witnesses: Vec<Formula>) -> (Formula, bool) {
    let witnesses = dedup_formulas(witnesses);
    if witnesses.is_empty() {
        return (original.clone(), false);
    }
    let mut conjuncts = vec![original.clone()];
    conjuncts.extend(witnesses.iter().map(formula::negate));
    let combined = formula::simplify(&new_and(conjuncts));
    let combined = formula::normalize(&combined);
    let combined = formula::simplify(&combined);
    (combined, true)
}

fn process_action(
    cat: &TypeCatalogue,
    action: &mut pcore_types::action::Action,
    group: &LiftedMutexGroup,
    goal_atoms: &[Atom],
    opts: CompileInOptions,
) -> bool {
    let dgroup = group.double_counted();
    let mut changed = false;

    let mut top_add = Vec::new();
    let mut top_del = Vec::new();
    flatten_effect_literals(&action.effect, &mut top_add, &mut top_del);
    let mut top_pre_atoms = Vec::new();
    flatten_precondition_literals(&action.precondition, &mut top_pre_atoms);

    let mut top_witnesses = Vec::new();
    if opts.prune_mutex {
        top_witnesses.extend(mutex_witnesses_for_site(
            cat,
            &action.params,
            &top_pre_atoms,
            0,
            &action.precondition,
            &dgroup,
        ));
    }
    if opts.prune_dead_end {
        top_witnesses.extend(dead_end_witnesses_for_site(
            cat,
            &action.params,
            &top_pre_atoms,
            &action.precondition,
            &top_add,
            &top_del,
            &dgroup,
            goal_atoms,
        ));
    }
    let (new_top_pre, top_changed) = merge_into_precondition(&action.precondition, top_witnesses);
    if top_changed {
        action.precondition = new_top_pre;
        changed = true;
    }

    let when_nodes = top_level_when_nodes(&action.effect);
    if !when_nodes.is_empty() {
        let mut new_conds = Vec::with_capacity(when_nodes.len());
        for (cond, eff) in &when_nodes {
            let combined_cond = new_and(vec![action.precondition.clone(), cond.clone()]);
            let mut combined_pre_atoms = top_pre_atoms.clone();
            let own_from = combined_pre_atoms.len();
            flatten_precondition_literals(cond, &mut combined_pre_atoms);
            let mut site_add = Vec::new();
            let mut site_del = Vec::new();
            flatten_effect_literals(eff, &mut site_add, &mut site_del);

            let mut witnesses = Vec::new();
            if opts.prune_mutex {
                witnesses.extend(mutex_witnesses_for_site(
                    cat,
                    &action.params,
                    &combined_pre_atoms,
                    own_from,
                    &combined_cond,
                    &dgroup,
                ));
            }
            if opts.prune_dead_end {
                witnesses.extend(dead_end_witnesses_for_site(
                    cat,
                    &action.params,
                    &combined_pre_atoms,
                    &combined_cond,
                    &site_add,
                    &site_del,
                    &dgroup,
                    goal_atoms,
                ));
            }
            let (new_cond, site_changed) = merge_into_precondition(cond, witnesses);
            if site_changed {
                changed = true;
            }
            new_conds.push(new_cond);
        }
        action.effect = rebuild_effect_with_new_when_conds(&action.effect, &new_conds);
    }

    changed
}

/// Strengthens every action's precondition (and conditional-effect
/// triggers) against every mutex group in `mgroups`. Mutates `task` in
/// place. The caller must re-run global task normalization after a
/// `Strengthened` result.
pub fn compile_in_lifted_mgroups(
    cat: &TypeCatalogue,
    task: &mut LiftedTask,
    mgroups: &[LiftedMutexGroup],
    opts: CompileInOptions,
) -> CompileInOutcome {
    if !opts.prune_mutex && !opts.prune_dead_end {
        return CompileInOutcome::Unchanged;
    }
    let goal_atoms = task.goal_atoms.clone();
    let mut changed = false;
    for action in task.actions.iter_mut() {
        for group in mgroups {
            if process_action(cat, action, group, &goal_atoms, opts) {
                changed = true;
            }
        }
    }
    if changed {
        CompileInOutcome::Strengthened
    } else {
        CompileInOutcome::Unchanged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcore_types::action::Action;
    use pcore_types::atom::Atom;
    use pcore_types::param::{ParamList, ParamSlot};
    use pcore_types::types::TypeCatalogue;
    use pcore_utils::Id;

    #[test]
    fn arg_not_equal_disjunct_is_false_for_identical_params() {
        let f = arg_not_equal_disjunct(Arg::Param(2), Arg::Param(2));
        assert!(matches!(f.as_ref(), FormulaNode::Bool(false)));
    }

    #[test]
    fn arg_not_equal_disjunct_orients_smaller_param_first() {
        let f = arg_not_equal_disjunct(Arg::Param(3), Arg::Param(1));
        if let FormulaNode::Atom(a) = f.as_ref() {
            assert_eq!(a.args, vec![Arg::Param(1), Arg::Param(3)]);
            assert!(a.negated);
        } else {
            panic!("expected an atom");
        }
    }

    #[test]
    fn dedup_formulas_removes_structural_duplicates() {
        let p = Predicate::new(Id::from("p"), 1);
        let a = new_atom(Atom::new(p, vec![Arg::Param(0)]));
        let b = new_atom(Atom::new(p, vec![Arg::Param(0)]));
        let deduped = dedup_formulas(vec![a, b]);
        assert_eq!(deduped.len(), 1);
    }

    /// S2 (dead-end compile-in): goal `at(truck1, depot)`, action `vanish(?t)`
    /// with `pre = at(?t,?l)`, `eff = del at(?t,?l)` and no add effect, under
    /// the mutex group `{at(?t,?l1), at(?t,?l2)}`. Expected: the precondition
    /// gains `?t ≠ truck1`.
    #[test]
    fn dead_end_compile_in_forbids_vanishing_the_goal_truck() {
        let mut cat = TypeCatalogue::new();
        let object = cat.declare_type(Id::from("object"), None);
        let truck = cat.declare_type(Id::from("truck"), Some(object));
        let location = cat.declare_type(Id::from("location"), Some(object));
        let truck1 = cat.declare_object(Id::from("truck1"), truck);
        let depot = cat.declare_object(Id::from("depot"), location);
        let _store = cat.declare_object(Id::from("store"), location);

        let at = Predicate::new(Id::from("at"), 2);
        let group_params = ParamList::new(vec![
            ParamSlot::new(truck),
            ParamSlot::new(location),
            ParamSlot::new(location),
        ]);
        let group = LiftedMutexGroup::new(
            group_params,
            vec![
                Atom::new(at, vec![Arg::Param(0), Arg::Param(1)]),
                Atom::new(at, vec![Arg::Param(0), Arg::Param(2)]),
            ],
        );

        let vanish_params = ParamList::new(vec![ParamSlot::new(truck), ParamSlot::new(location)]);
        let pre = new_atom(Atom::new(at, vec![Arg::Param(0), Arg::Param(1)]));
        let eff = new_atom(Atom::negated(at, vec![Arg::Param(0), Arg::Param(1)]));
        let vanish = Action::new(Id::from("vanish"), vanish_params, pre, eff);

        let goal_atoms = vec![Atom::new(at, vec![Arg::Object(truck1), Arg::Object(depot)])];
        let mut task = LiftedTask::new(vec![vanish], goal_atoms);

        let outcome = compile_in_lifted_mgroups(
            &cat,
            &mut task,
            &[group],
            CompileInOptions {
                prune_mutex: false,
                prune_dead_end: true,
            },
        );
        assert_eq!(outcome, CompileInOutcome::Strengthened);

        let mut found_ne_truck1 = false;
        formula::for_each_atom(&task.actions[0].precondition, &mut |a| {
            if a.predicate.is_eq() && a.negated {
                let has_truck1 = a.args.iter().any(|arg| *arg == Arg::Object(truck1));
                let has_param0 = a.args.iter().any(|arg| *arg == Arg::Param(0));
                if has_truck1 && has_param0 {
                    found_ne_truck1 = true;
                }
            }
        });
        assert!(found_ne_truck1, "expected a `?t != truck1` guard in the strengthened precondition");
    }

    #[test]
    fn compile_in_is_unchanged_with_both_prunings_disabled() {
        let (cat, truck, location, _truck1) = {
            let mut cat = TypeCatalogue::new();
            let object = cat.declare_type(Id::from("object"), None);
            let truck = cat.declare_type(Id::from("truck"), Some(object));
            let location = cat.declare_type(Id::from("location"), Some(object));
            let truck1 = cat.declare_object(Id::from("truck1"), truck);
            (cat, truck, location, truck1)
        };
        let at = Predicate::new(Id::from("at"), 2);
        let params = ParamList::new(vec![ParamSlot::new(truck), ParamSlot::new(location)]);
        let action = Action::new(
            Id::from("noop"),
            params,
            new_bool(true),
            new_atom(Atom::new(at, vec![Arg::Param(0), Arg::Param(1)])),
        );
        let mut task = LiftedTask::new(vec![action], vec![]);
        let outcome = compile_in_lifted_mgroups(
            &cat,
            &mut task,
            &[],
            CompileInOptions {
                prune_mutex: false,
                prune_dead_end: false,
            },
        );
        assert_eq!(outcome, CompileInOutcome::Unchanged);
    }
}
