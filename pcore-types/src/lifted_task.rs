use crate::action::Action;
use crate::atom::Atom;

/// A lifted (first-order) planning task: the action schema set plus the
/// goal, represented as a flat list of ground positive atoms — the shape
/// the compile-in engine's dead-end search consumes directly.
#[derive(Clone, Debug, Default)]
pub struct LiftedTask {
    pub actions: Vec<Action>,
    pub goal_atoms: Vec<Atom>,
}

impl LiftedTask {
    pub fn new(actions: Vec<Action>, goal_atoms: Vec<Atom>) -> Self {
        Self {
            actions,
            goal_atoms,
        }
    }
}
