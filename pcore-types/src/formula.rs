//! The condition-formula kernel (component B): a quantifier-free tree of
//! and/or junctions, literals and `when(cond => eff)` nodes, with
//! construction, simplification, normalization, negation, structural
//! equality, entailment and atom/when iteration.
//!
//! The physical layout is deliberately simple (an `Rc`-linked tagged enum):
//! the contract, not the layout, is what callers depend on. Every rewrite
//! produces fresh nodes; siblings never alias into each other's subtrees.
use crate::atom::Atom;
use std::rc::Rc;

pub type Formula = Rc<FormulaNode>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormulaNode {
    And(Vec<Formula>),
    Or(Vec<Formula>),
    Atom(Atom),
    Bool(bool),
    When { cond: Formula, eff: Formula },
}

pub fn new_and(children: Vec<Formula>) -> Formula {
    Rc::new(FormulaNode::And(children))
}

pub fn new_and_empty() -> Formula {
    new_and(Vec::new())
}

pub fn new_or(children: Vec<Formula>) -> Formula {
    Rc::new(FormulaNode::Or(children))
}

pub fn new_or_empty() -> Formula {
    new_or(Vec::new())
}

pub fn new_atom(atom: Atom) -> Formula {
    Rc::new(FormulaNode::Atom(atom))
}

pub fn new_bool(b: bool) -> Formula {
    Rc::new(FormulaNode::Bool(b))
}

pub fn new_when(cond: Formula, eff: Formula) -> Formula {
    Rc::new(FormulaNode::When { cond, eff })
}

/// Appends `child` to a junction, producing a fresh node. Panics if `f` is
/// not a junction — callers only ever append to `new_and`/`new_or` results.
pub fn junc_add(f: &Formula, child: Formula) -> Formula {
    match f.as_ref() {
        FormulaNode::And(children) => {
            let mut children = children.clone();
            children.push(child);
            new_and(children)
        }
        FormulaNode::Or(children) => {
            let mut children = children.clone();
            children.push(child);
            new_or(children)
        }
        _ => panic!("junc_add called on a non-junction formula"),
    }
}

pub fn junc_is_empty(f: &Formula) -> bool {
    match f.as_ref() {
        FormulaNode::And(c) | FormulaNode::Or(c) => c.is_empty(),
        _ => false,
    }
}

/// Pushes negation through the tree; double negation cancels by
/// construction (negating an `Atom` flips its flag rather than wrapping it).
pub fn negate(f: &Formula) -> Formula {
    match f.as_ref() {
        FormulaNode::And(children) => {
            new_or(children.iter().map(negate).collect())
        }
        FormulaNode::Or(children) => {
            new_and(children.iter().map(negate).collect())
        }
        FormulaNode::Atom(a) => new_atom(a.negate()),
        FormulaNode::Bool(b) => new_bool(!b),
        FormulaNode::When { cond, eff } => {
            // `when` nodes live in effect formulas, not in the conditions
            // this engine negates; negating only the trigger is the
            // conservative, structure-preserving choice.
            new_when(negate(cond), eff.clone())
        }
    }
}

/// Boolean absorption, constant folding and duplicate removal. Idempotent:
/// `simplify(simplify(f)) == simplify(f)`.
pub fn simplify(f: &Formula) -> Formula {
    match f.as_ref() {
        FormulaNode::And(children) => {
            let mut flat = Vec::with_capacity(children.len());
            for c in children {
                let c = simplify(c);
                match c.as_ref() {
                    FormulaNode::Bool(true) => continue,
                    FormulaNode::Bool(false) => return new_bool(false),
                    FormulaNode::And(inner) => flat.extend(inner.iter().cloned()),
                    _ => flat.push(c),
                }
            }
            dedup(&mut flat);
            if flat.is_empty() {
                new_bool(true)
            } else if flat.len() == 1 {
                flat.into_iter().next().unwrap()
            } else {
                new_and(flat)
            }
        }
        FormulaNode::Or(children) => {
            let mut flat = Vec::with_capacity(children.len());
            for c in children {
                let c = simplify(c);
                match c.as_ref() {
                    FormulaNode::Bool(false) => continue,
                    FormulaNode::Bool(true) => return new_bool(true),
                    FormulaNode::Or(inner) => flat.extend(inner.iter().cloned()),
                    _ => flat.push(c),
                }
            }
            dedup(&mut flat);
            if flat.is_empty() {
                new_bool(false)
            } else if flat.len() == 1 {
                flat.into_iter().next().unwrap()
            } else {
                new_or(flat)
            }
        }
        FormulaNode::When { cond, eff } => new_when(simplify(cond), eff.clone()),
        FormulaNode::Atom(_) | FormulaNode::Bool(_) => f.clone(),
    }
}

fn dedup(children: &mut Vec<Formula>) {
    let mut kept: Vec<Formula> = Vec::with_capacity(children.len());
    for c in children.drain(..) {
        if !kept.iter().any(|k| equal(k, &c)) {
            kept.push(c);
        }
    }
    *children = kept;
}

/// A canonical ordering key used only to make junction children order-
/// independent for structural comparison and printing; it has no semantic
/// meaning beyond that.
fn sort_key(f: &Formula) -> String {
    format!("{f:?}")
}

fn sort_children(children: &mut [Formula]) {
    children.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));
}

/// Canonicalizes a formula into a flattened, sorted AND-of-OR-like shape.
/// `normalize ∘ simplify` is idempotent: normalize always simplifies first,
/// so re-normalizing an already-normal formula is a no-op beyond re-sorting
/// (itself idempotent).
pub fn normalize(f: &Formula) -> Formula {
    let simplified = simplify(f);
    normalize_rec(&simplified)
}

fn normalize_rec(f: &Formula) -> Formula {
    match f.as_ref() {
        FormulaNode::And(children) => {
            let mut children: Vec<Formula> =
                children.iter().map(normalize_rec).collect();
            sort_children(&mut children);
            new_and(children)
        }
        FormulaNode::Or(children) => {
            let mut children: Vec<Formula> =
                children.iter().map(normalize_rec).collect();
            sort_children(&mut children);
            new_or(children)
        }
        FormulaNode::When { cond, eff } => {
            new_when(normalize_rec(cond), eff.clone())
        }
        FormulaNode::Atom(_) | FormulaNode::Bool(_) => f.clone(),
    }
}

/// Structural equality: junction children compare as multisets (order does
/// not matter), everything else recursively.
pub fn equal(f: &Formula, g: &Formula) -> bool {
    match (f.as_ref(), g.as_ref()) {
        (FormulaNode::Atom(a), FormulaNode::Atom(b)) => a == b,
        (FormulaNode::Bool(a), FormulaNode::Bool(b)) => a == b,
        (FormulaNode::And(a), FormulaNode::And(b))
        | (FormulaNode::Or(a), FormulaNode::Or(b)) => multiset_equal(a, b),
        (
            FormulaNode::When { cond: c1, eff: e1 },
            FormulaNode::When { cond: c2, eff: e2 },
        ) => equal(c1, c2) && equal(e1, e2),
        _ => false,
    }
}

fn multiset_equal(a: &[Formula], b: &[Formula]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut used = vec![false; b.len()];
    'outer: for x in a {
        for (i, y) in b.iter().enumerate() {
            if !used[i] && equal(x, y) {
                used[i] = true;
                continue 'outer;
            }
        }
        return false;
    }
    true
}

/// Decides `f ⊨ g` by brute-force truth-table enumeration over the distinct
/// atoms appearing in either formula. Sound and complete for the
/// quantifier-free fragment this kernel produces; the atom count in
/// practice is tiny (a handful of literals per generated condition).
pub fn is_entailed(f: &Formula, g: &Formula) -> bool {
    let mut atoms: Vec<Atom> = Vec::new();
    collect_distinct_atoms(f, &mut atoms);
    collect_distinct_atoms(g, &mut atoms);
    let n = atoms.len();
    if n > 20 {
        log::warn!(
            "is_entailed: {n} distinct atoms, brute-force enumeration may be slow"
        );
    }
    for bits in 0u64..(1u64 << n) {
        let assignment: Vec<bool> =
            (0..n).map(|i| (bits >> i) & 1 == 1).collect();
        if eval(f, &atoms, &assignment) && !eval(g, &atoms, &assignment) {
            return false;
        }
    }
    true
}

fn collect_distinct_atoms(f: &Formula, out: &mut Vec<Atom>) {
    for_each_atom(f, &mut |a| {
        if !out.iter().any(|x| x.same_atom(a)) {
            out.push(a.clone());
        }
    });
}

fn eval(f: &Formula, atoms: &[Atom], assignment: &[bool]) -> bool {
    match f.as_ref() {
        FormulaNode::Bool(b) => *b,
        FormulaNode::Atom(a) => {
            let idx = atoms.iter().position(|x| x.same_atom(a)).unwrap();
            let positive = assignment[idx];
            if a.negated {
                !positive
            } else {
                positive
            }
        }
        FormulaNode::And(children) => {
            children.iter().all(|c| eval(c, atoms, assignment))
        }
        FormulaNode::Or(children) => {
            children.iter().any(|c| eval(c, atoms, assignment))
        }
        // `when` nodes are effect-level, not truth-valued conditions; they
        // do not appear in entailment queries over conditions.
        FormulaNode::When { .. } => true,
    }
}

/// Visits every atom occurring anywhere in the tree, pre-order.
pub fn for_each_atom(f: &Formula, visit: &mut impl FnMut(&Atom)) {
    match f.as_ref() {
        FormulaNode::Atom(a) => visit(a),
        FormulaNode::And(children) | FormulaNode::Or(children) => {
            for c in children {
                for_each_atom(c, visit);
            }
        }
        FormulaNode::Bool(_) => {}
        FormulaNode::When { cond, eff } => {
            for_each_atom(cond, visit);
            for_each_atom(eff, visit);
        }
    }
}

/// Visits every `when(cond => eff)` node occurring anywhere in the tree.
pub fn for_each_when(f: &Formula, visit: &mut impl FnMut(&Formula, &Formula)) {
    match f.as_ref() {
        FormulaNode::When { cond, eff } => {
            visit(cond, eff);
            for_each_when(cond, visit);
            for_each_when(eff, visit);
        }
        FormulaNode::And(children) | FormulaNode::Or(children) => {
            for c in children {
                for_each_when(c, visit);
            }
        }
        FormulaNode::Atom(_) | FormulaNode::Bool(_) => {}
    }
}

/// A cloneable, resumable cursor over the atoms of a formula. Used by the
/// compile-in engine's nested searches, which need to "start a second loop
/// from the position after the current first-loop item" without leaking the
/// formula's physical layout.
#[derive(Clone)]
pub struct AtomCursor {
    atoms: Rc<Vec<Atom>>,
    pos: usize,
}

impl AtomCursor {
    pub fn from_formula(f: &Formula) -> Self {
        let mut atoms = Vec::new();
        for_each_atom(f, &mut |a| atoms.push(a.clone()));
        Self {
            atoms: Rc::new(atoms),
            pos: 0,
        }
    }

    /// A fresh cursor over the same atom sequence, resuming at `pos`.
    pub fn resume_at(&self, pos: usize) -> Self {
        Self {
            atoms: self.atoms.clone(),
            pos,
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }
}

impl Iterator for AtomCursor {
    type Item = Atom;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.atoms.get(self.pos).cloned();
        if item.is_some() {
            self.pos += 1;
        }
        item
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::Arg;
    use crate::predicate::Predicate;
    use pcore_utils::Id;

    fn at() -> Atom {
        Atom::new(Predicate::new(Id::from("at"), 2), vec![Arg::Param(0), Arg::Param(1)])
    }

    #[test]
    fn double_negation_cancels() {
        let f = new_atom(at());
        let nn = negate(&negate(&f));
        assert!(equal(&f, &nn));
    }

    #[test]
    fn simplify_is_idempotent() {
        let f = new_and(vec![new_bool(true), new_atom(at()), new_atom(at())]);
        let once = simplify(&f);
        let twice = simplify(&once);
        assert!(equal(&once, &twice));
        assert!(equal(&once, &new_atom(at())));
    }

    #[test]
    fn normalize_after_simplify_is_idempotent() {
        let f = new_and(vec![new_atom(at()), new_bool(true), new_or(vec![])]);
        let once = normalize(&f);
        let twice = normalize(&once);
        assert!(equal(&once, &twice));
    }

    #[test]
    fn empty_or_is_false_empty_and_is_true() {
        assert!(equal(&simplify(&new_or_empty()), &new_bool(false)));
        assert!(equal(&simplify(&new_and_empty()), &new_bool(true)));
    }

    #[test]
    fn entailment_respects_conjunction() {
        let a = new_atom(at());
        let conj = new_and(vec![a.clone(), new_bool(true)]);
        assert!(is_entailed(&conj, &a));
        assert!(!is_entailed(&a, &new_atom(at().negate())));
    }

    #[test]
    fn when_nodes_compare_effects_structurally_not_by_child_order() {
        let x = new_atom(Atom::new(
            Predicate::new(Id::from("x"), 0),
            vec![],
        ));
        let y = new_atom(Atom::new(
            Predicate::new(Id::from("y"), 0),
            vec![],
        ));
        let cond = new_atom(at());
        let w1 = new_when(cond.clone(), new_and(vec![x.clone(), y.clone()]));
        let w2 = new_when(cond, new_and(vec![y, x]));
        assert!(equal(&w1, &w2));
    }

    #[test]
    fn atom_cursor_resumes_from_saved_position() {
        let f = new_and(vec![new_atom(at()), new_atom(at().negate())]);
        let mut cursor = AtomCursor::from_formula(&f);
        let _first = cursor.next().unwrap();
        let resumed = cursor.resume_at(cursor.position());
        let rest: Vec<_> = resumed.collect();
        assert_eq!(rest.len(), 1);
    }
}
