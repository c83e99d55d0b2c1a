//! Algorithms over the planning data model in `pcore-types`: lifted
//! mutex-group compile-in (strengthening action preconditions against a
//! first-order invariant before grounding), mutex-group promotion to
//! exactly-one form, and the grounded-task pruning pipeline (backward
//! irrelevance, domain-transition-graph reachability, fam-group dead-ends,
//! operator dedup, and the external h²/h³ collaborators).
pub mod analysis;
pub mod compile_in;
pub mod pipeline;
pub mod promotion;
pub mod pruners;
