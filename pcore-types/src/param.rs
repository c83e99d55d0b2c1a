use crate::types::TypeId;
use smallvec::SmallVec;

/// One slot in a parameter list: a declared type plus the flag marking
/// "counted" variables used by the mutex compile-in (parameters that are
/// effectively universally quantified and then counted when searching for
/// witnesses).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParamSlot {
    pub ty: TypeId,
    pub is_counted_var: bool,
}

impl ParamSlot {
    pub fn new(ty: TypeId) -> Self {
        Self {
            ty,
            is_counted_var: false,
        }
    }

    pub fn counted(ty: TypeId) -> Self {
        Self {
            ty,
            is_counted_var: true,
        }
    }
}

/// An ordered sequence of parameter slots belonging to an action or a mutex
/// group. Actions and mutex groups rarely carry more than a handful of
/// parameters, so the backing store stays inline for the common case.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParamList {
    slots: SmallVec<[ParamSlot; 4]>,
}

impl ParamList {
    pub fn new(slots: Vec<ParamSlot>) -> Self {
        Self {
            slots: SmallVec::from_vec(slots),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slot(&self, i: usize) -> ParamSlot {
        self.slots[i]
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, ParamSlot)> + '_ {
        self.slots.iter().copied().enumerate()
    }

    pub fn counted_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_counted_var)
            .map(|(i, _)| i)
    }
}

/// A reference to a parameter argument: either a fixed object or a slot in
/// one of the two parameter lists a unifier state is comparing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Arg {
    Object(crate::types::ObjectId),
    Param(usize),
}
