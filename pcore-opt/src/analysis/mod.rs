//! Analyses that inform the pruning pipeline without mutating the task.
pub mod dtg;
pub mod irrelevance;
