//! # Planning-task data model
//!
//! Shared types for lifted (first-order) and grounded planning tasks: the
//! typed object universe, predicates and atoms, the condition-formula
//! kernel, lifted actions and mutex groups, the typed unifier, and the
//! ground STRIPS / finite-domain-representation task shapes.
//!
//! This crate owns the data; the algorithms that consume it (lifted
//! mutex-group compile-in, grounded-task pruning) live in `pcore-opt`.
pub mod action;
pub mod atom;
pub mod fdr;
pub mod formula;
pub mod lifted_task;
pub mod mutex_group;
pub mod mutex_ground;
pub mod param;
pub mod predicate;
pub mod strips;
pub mod types;
pub mod unifier;

pub use action::Action;
pub use atom::Atom;
pub use fdr::{Assignment, FdrOperator, FdrTask, FdrVariable, VarId};
pub use formula::{Formula, FormulaNode};
pub use lifted_task::LiftedTask;
pub use mutex_group::LiftedMutexGroup;
pub use mutex_ground::{MutexGroup, MutexGroups, MutexPairs};
pub use param::{Arg, ParamList, ParamSlot};
pub use predicate::Predicate;
pub use strips::{CrossRef, Fact, FactId, OpId, Operator, ReduceReport, StripsTask};
pub use types::{ObjectId, TypeCatalogue, TypeId};
pub use unifier::{Incompatible, Side, UnificationState, UnifyResult};
