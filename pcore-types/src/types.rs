//! The object/type universe: a subtype tree (each type inherits at most one
//! parent, mirroring "each object belongs to one declared type and inherits
//! its supertypes") plus the fixed set of typed objects.
//!
//! This catalogue is read-only context handed to the core by the caller; the
//! core never adds or removes types/objects, only queries them.
use pcore_utils::Id;
use std::collections::HashMap;

#[derive(Clone, Copy, Hash, PartialEq, Eq, Debug, PartialOrd, Ord)]
pub struct TypeId(u32);

#[derive(Clone, Copy, Hash, PartialEq, Eq, Debug, PartialOrd, Ord)]
pub struct ObjectId(u32);

impl TypeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl ObjectId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

struct TypeEntry {
    name: Id,
    parent: Option<TypeId>,
}

struct ObjectEntry {
    name: Id,
    /// The object's single declared (most specific) type.
    ty: TypeId,
}

/// The typed universe of objects: a subtype tree plus object memberships.
#[derive(Default)]
pub struct TypeCatalogue {
    types: Vec<TypeEntry>,
    type_by_name: HashMap<Id, TypeId>,
    objects: Vec<ObjectEntry>,
    object_by_name: HashMap<Id, ObjectId>,
    /// Cache: for each type, the objects inhabiting it or any of its subtypes.
    objects_of: Vec<Vec<ObjectId>>,
}

impl TypeCatalogue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare_type(&mut self, name: Id, parent: Option<TypeId>) -> TypeId {
        if let Some(&existing) = self.type_by_name.get(&name) {
            return existing;
        }
        let id = TypeId(self.types.len() as u32);
        self.types.push(TypeEntry { name, parent });
        self.type_by_name.insert(name, id);
        self.objects_of.push(Vec::new());
        id
    }

    pub fn declare_object(&mut self, name: Id, ty: TypeId) -> ObjectId {
        let id = ObjectId(self.objects.len() as u32);
        self.objects.push(ObjectEntry { name, ty });
        self.object_by_name.insert(name, id);
        // Every ancestor of `ty` (including `ty` itself) gains this member.
        let mut cur = Some(ty);
        while let Some(t) = cur {
            self.objects_of[t.index()].push(id);
            cur = self.types[t.index()].parent;
        }
        id
    }

    pub fn type_named(&self, name: Id) -> Option<TypeId> {
        self.type_by_name.get(&name).copied()
    }

    pub fn object_named(&self, name: Id) -> Option<ObjectId> {
        self.object_by_name.get(&name).copied()
    }

    pub fn type_name(&self, t: TypeId) -> Id {
        self.types[t.index()].name
    }

    pub fn object_name(&self, o: ObjectId) -> Id {
        self.objects[o.index()].name
    }

    pub fn declared_type_of(&self, o: ObjectId) -> TypeId {
        self.objects[o.index()].ty
    }

    /// `is_subset(t1, t2)`: every inhabitant of `t1` is also an inhabitant of
    /// `t2`, i.e. `t2` is an ancestor of `t1` (or `t1 == t2`).
    pub fn is_subset(&self, t1: TypeId, t2: TypeId) -> bool {
        let mut cur = Some(t1);
        while let Some(t) = cur {
            if t == t2 {
                return true;
            }
            cur = self.types[t.index()].parent;
        }
        false
    }

    /// All objects whose declared type is `t` or a subtype of `t`.
    pub fn objects_of_type(&self, t: TypeId) -> &[ObjectId] {
        &self.objects_of[t.index()]
    }

    pub fn object_has_type(&self, t: TypeId, o: ObjectId) -> bool {
        self.is_subset(self.declared_type_of(o), t)
    }

    /// Two types are disjoint iff neither is an ancestor of the other (this
    /// catalogue is a single-inheritance tree, so that is both necessary and
    /// sufficient).
    pub fn are_disjoint(&self, t1: TypeId, t2: TypeId) -> bool {
        !self.is_subset(t1, t2) && !self.is_subset(t2, t1)
    }

    pub fn count_objects(&self, t: TypeId) -> usize {
        self.objects_of_type(t).len()
    }

    /// The most specific of two types related by subtyping, or `None` if
    /// neither is a subtype of the other.
    pub fn most_specific(&self, t1: TypeId, t2: TypeId) -> Option<TypeId> {
        if self.is_subset(t1, t2) {
            Some(t1)
        } else if self.is_subset(t2, t1) {
            Some(t2)
        } else {
            None
        }
    }

    /// A type with zero inhabitants is unsatisfiable: no unifier may bind a
    /// variable to it.
    pub fn is_unsatisfiable(&self, t: TypeId) -> bool {
        self.count_objects(t) == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (TypeCatalogue, TypeId, TypeId, ObjectId) {
        let mut cat = TypeCatalogue::new();
        let object = cat.declare_type(Id::from("object"), None);
        let truck = cat.declare_type(Id::from("truck"), Some(object));
        let t1 = cat.declare_object(Id::from("truck1"), truck);
        (cat, object, truck, t1)
    }

    #[test]
    fn subtype_of_self_and_ancestor() {
        let (cat, object, truck, _) = setup();
        assert!(cat.is_subset(truck, truck));
        assert!(cat.is_subset(truck, object));
        assert!(!cat.is_subset(object, truck));
    }

    #[test]
    fn objects_of_type_includes_subtype_members() {
        let (cat, object, truck, t1) = setup();
        assert_eq!(cat.objects_of_type(truck), &[t1]);
        assert_eq!(cat.objects_of_type(object), &[t1]);
    }

    #[test]
    fn disjoint_sibling_types() {
        let mut cat = TypeCatalogue::new();
        let object = cat.declare_type(Id::from("object"), None);
        let truck = cat.declare_type(Id::from("truck"), Some(object));
        let location = cat.declare_type(Id::from("location"), Some(object));
        assert!(cat.are_disjoint(truck, location));
        assert!(!cat.are_disjoint(truck, object));
    }

    #[test]
    fn empty_type_is_unsatisfiable() {
        let mut cat = TypeCatalogue::new();
        let object = cat.declare_type(Id::from("object"), None);
        let ghost = cat.declare_type(Id::from("ghost"), Some(object));
        assert!(cat.is_unsatisfiable(ghost));
    }

    #[test]
    fn most_specific_of_unrelated_types_is_none() {
        let mut cat = TypeCatalogue::new();
        let object = cat.declare_type(Id::from("object"), None);
        let truck = cat.declare_type(Id::from("truck"), Some(object));
        let location = cat.declare_type(Id::from("location"), Some(object));
        assert_eq!(cat.most_specific(truck, location), None);
        assert_eq!(cat.most_specific(truck, object), Some(truck));
    }
}
