use crate::param::Arg;
use crate::predicate::Predicate;

/// `predicate(args...)`, possibly negated. Each argument is either a fixed
/// object or a reference into the owning parameter list.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Atom {
    pub predicate: Predicate,
    pub args: Vec<Arg>,
    pub negated: bool,
}

impl Atom {
    pub fn new(predicate: Predicate, args: Vec<Arg>) -> Self {
        debug_assert_eq!(args.len(), predicate.arity);
        Self {
            predicate,
            args,
            negated: false,
        }
    }

    pub fn negated(predicate: Predicate, args: Vec<Arg>) -> Self {
        let mut a = Self::new(predicate, args);
        a.negated = true;
        a
    }

    pub fn negate(&self) -> Self {
        Self {
            predicate: self.predicate,
            args: self.args.clone(),
            negated: !self.negated,
        }
    }

    /// Structural equality ignoring the negation flag.
    pub fn same_atom(&self, other: &Atom) -> bool {
        self.predicate == other.predicate && self.args == other.args
    }
}
