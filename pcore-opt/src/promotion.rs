//! Component F: convert arbitrary mutex groups into exactly-one form by
//! synthesizing none-of-those facts and repairing the operators and initial
//! state that reference them, plus binary-fact encoding for facts left
//! uncovered by any group. Also provides the FDR → promoted-STRIPS importer.
use pcore_types::fdr::FdrTask;
use pcore_types::mutex_ground::{is_exactly_one, MutexGroup, MutexGroups};
use pcore_types::strips::{ConditionalEffect, Fact, FactId, Operator, StripsTask};
use pcore_utils::Id;
use std::collections::HashSet;

/// Drops any fact from `group` that some operator deletes without also
/// requiring it as a precondition — such a fact cannot be treated as an
/// exactly-one member, since the operator could delete it from a state
/// where it never held.
fn filter_uncovered_deletes(group: &HashSet<FactId>, task: &StripsTask) -> HashSet<FactId> {
    group
        .iter()
        .copied()
        .filter(|&f| {
            !task
                .xref()
                .del_ops(f)
                .iter()
                .any(|&op| !task.operator(op).pre.contains(&f))
        })
        .collect()
}

/// Removes groups of size ≤1 and groups that are a subset of some other
/// kept group, keeping the larger ones (ties broken by input order).
fn drop_trivial_and_dominated(mut groups: Vec<HashSet<FactId>>) -> Vec<HashSet<FactId>> {
    groups.retain(|g| g.len() > 1);
    groups.sort_by(|a, b| b.len().cmp(&a.len()));
    let mut kept: Vec<HashSet<FactId>> = Vec::with_capacity(groups.len());
    'outer: for g in groups {
        for k in &kept {
            if g.is_subset(k) {
                continue 'outer;
            }
        }
        kept.push(g);
    }
    kept
}

fn none_of_those_name(members: &[FactId], task: &StripsTask) -> Id {
    let mut sorted = members.to_vec();
    sorted.sort_by_key(|f| f.index());
    let joined = sorted
        .iter()
        .map(|f| task.fact(*f).name.to_string())
        .collect::<Vec<_>>()
        .join(";");
    Id::new(format!("NOT:{joined}"))
}

/// Synthesizes the none-of-those fact for a group that is not already
/// exactly-one, injecting it into init and into the relevant operators'
/// effects, and returns the group with the new member added.
fn synthesize_none_of_those(task: &mut StripsTask, group: HashSet<FactId>) -> HashSet<FactId> {
    let members: Vec<FactId> = group.iter().copied().collect();
    let name = none_of_those_name(&members, task);
    let n = task.add_fact(Fact { name, neg_of: None });

    let has_init_member = members.iter().any(|&f| task.init().contains(&f));
    for op in task.operators_mut() {
        let deletes_member = op.del_eff.iter().any(|f| group.contains(f));
        let adds_member = op.add_eff.iter().any(|f| group.contains(f));
        if deletes_member && !adds_member {
            op.add_eff.insert(n);
        } else if adds_member && !deletes_member {
            op.del_eff.insert(n);
        }
    }
    if !has_init_member {
        task.add_to_init(n);
    }

    let mut group = group;
    group.insert(n);
    group
}

/// Binary-fact encoding: every fact not covered by `groups` is paired with
/// its `neg_of` counterpart (synthesizing one if absent), operators are
/// adjusted symmetrically, and the pair becomes its own exactly-one group.
fn encode_binary_facts(task: &mut StripsTask, groups: &mut Vec<HashSet<FactId>>) {
    let mut covered: HashSet<FactId> = groups.iter().flatten().copied().collect();
    let all_facts: Vec<FactId> = task.fact_ids().collect();

    for f in all_facts {
        if covered.contains(&f) {
            continue;
        }
        let neg_id = match task.fact(f).neg_of {
            Some(neg) => neg,
            None => {
                let name = Id::new(format!("NOT:{}", task.fact(f).name));
                let n = task.add_fact(Fact {
                    name,
                    neg_of: Some(f),
                });
                task.facts_mut()[f.index()].neg_of = Some(n);
                n
            }
        };

        for op in task.operators_mut() {
            let adds_f = op.add_eff.contains(&f);
            let dels_f = op.del_eff.contains(&f);
            let adds_neg = op.add_eff.contains(&neg_id);
            let dels_neg = op.del_eff.contains(&neg_id);
            if adds_f {
                op.del_eff.insert(neg_id);
            }
            if dels_f {
                op.add_eff.insert(neg_id);
            }
            if adds_neg {
                op.del_eff.insert(f);
            }
            if dels_neg {
                op.add_eff.insert(f);
            }
        }

        if !task.init().contains(&f) && !task.init().contains(&neg_id) {
            task.add_to_init(neg_id);
        }

        groups.push([f, neg_id].into_iter().collect());
        covered.insert(f);
        covered.insert(neg_id);
    }
}

/// A mutex group is a FAM-group (its invariance is self-maintaining) if no
/// operator adds a member without also deleting one. A lightweight
/// structural stand-in for the full first-order FAM test, which the source
/// material treats as an external collaborator (see §6 of the design doc).
fn is_fam_group_structural(facts: &HashSet<FactId>, task: &StripsTask) -> bool {
    task.operators().iter().all(|op| {
        let adds_member = op.add_eff.iter().any(|f| facts.contains(f));
        let deletes_member = op.del_eff.iter().any(|f| facts.contains(f));
        !(adds_member && !deletes_member)
    })
}

/// Converts `raw_groups` into exactly-one form and binary-encodes every
/// remaining fact, mutating `task` in place (new facts, repaired operator
/// effects, repaired initial state) and returning the resulting mutex-group
/// collection. Debug-asserts the post-conditions from the component
/// contract: every group is exactly-one, every group has a unique initial
/// member, and together they cover the whole fact set.
pub fn promote_mgroups(task: &mut StripsTask, raw_groups: Vec<HashSet<FactId>>) -> MutexGroups {
    let prepared: Vec<HashSet<FactId>> = raw_groups
        .into_iter()
        .map(|g| filter_uncovered_deletes(&g, task))
        .collect();
    let kept = drop_trivial_and_dominated(prepared);

    let mut promoted: Vec<HashSet<FactId>> = Vec::with_capacity(kept.len());
    for g in kept {
        if is_exactly_one(&g, task) {
            promoted.push(g);
        } else {
            promoted.push(synthesize_none_of_those(task, g));
        }
    }

    encode_binary_facts(task, &mut promoted);
    task.rebuild_xref();

    let groups: Vec<MutexGroup> = promoted.into_iter().map(MutexGroup::new).collect();
    let mut mgroups = MutexGroups::new(groups);
    mgroups.set_exactly_one(task);
    mgroups.set_goal(task);
    for g in mgroups.groups_mut() {
        g.is_fam_group = is_fam_group_structural(&g.facts, task);
    }

    for g in mgroups.groups() {
        debug_assert!(g.is_exactly_one, "promoted group `{:?}` is not exactly-one", g.facts);
        let init_count = g.facts.iter().filter(|f| task.init().contains(f)).count();
        debug_assert_eq!(init_count, 1, "promoted group lacks a unique initial-state member");
    }
    let covered: HashSet<FactId> = mgroups.groups().iter().flat_map(|g| g.facts.iter().copied()).collect();
    debug_assert_eq!(
        covered.len(),
        task.facts().len(),
        "promoted mutex groups do not cover the entire fact set"
    );

    mgroups
}

/// Imports an FDR task into a promoted STRIPS task: each variable's domain
/// becomes a ready-made exactly-one mutex group, preconditions translate
/// directly, and an effect setting `var=v` deletes the value implied by the
/// operator's own precondition on `var` (if any) or every other value in
/// `var`'s domain otherwise.
pub fn import_fdr(fdr: &FdrTask) -> (StripsTask, MutexGroups) {
    let n_facts = fdr
        .variables
        .iter()
        .flat_map(|v| v.domain.iter())
        .map(|f| f.index() + 1)
        .max()
        .unwrap_or(0);
    let mut facts = vec![
        Fact {
            name: Id::new(""),
            neg_of: None,
        };
        n_facts
    ];
    for var in &fdr.variables {
        for (value, &fid) in var.domain.iter().enumerate() {
            facts[fid.index()] = Fact {
                name: Id::new(format!("{}={value}", var.name)),
                neg_of: None,
            };
        }
    }

    let init: HashSet<FactId> = fdr
        .init
        .iter()
        .enumerate()
        .map(|(var_idx, &value)| fdr.variables[var_idx].global_id(value))
        .collect();
    let goal: HashSet<FactId> = fdr
        .goal
        .iter()
        .map(|&(v, value)| fdr.variable(v).global_id(value))
        .collect();

    let operators: Vec<Operator> = fdr
        .operators
        .iter()
        .map(|fop| {
            let pre: HashSet<FactId> = fop
                .pre
                .iter()
                .map(|&(v, value)| fdr.variable(v).global_id(value))
                .collect();
            let mut add_eff = HashSet::new();
            let mut del_eff = HashSet::new();
            for &(v, value) in &fop.eff {
                let var = fdr.variable(v);
                add_eff.insert(var.global_id(value));
                match fop.pre_value(v) {
                    Some(pv) => {
                        del_eff.insert(var.global_id(pv));
                    }
                    None => {
                        for other in 0..var.domain_size() {
                            if other != value {
                                del_eff.insert(var.global_id(other));
                            }
                        }
                    }
                }
            }
            let cond_effects: Vec<ConditionalEffect> = fop
                .cond_effects
                .iter()
                .map(|ce| {
                    let cond: HashSet<FactId> = ce
                        .cond
                        .iter()
                        .map(|&(v, value)| fdr.variable(v).global_id(value))
                        .collect();
                    let mut add = HashSet::new();
                    let mut del = HashSet::new();
                    for &(v, value) in &ce.eff {
                        let var = fdr.variable(v);
                        add.insert(var.global_id(value));
                        let known = fop.pre_value(v).or_else(|| {
                            ce.cond.iter().find(|&&(cv, _)| cv == v).map(|&(_, cv)| cv)
                        });
                        match known {
                            Some(pv) => {
                                del.insert(var.global_id(pv));
                            }
                            None => {
                                for other in 0..var.domain_size() {
                                    if other != value {
                                        del.insert(var.global_id(other));
                                    }
                                }
                            }
                        }
                    }
                    ConditionalEffect { cond, add, del }
                })
                .collect();
            Operator {
                name: fop.name,
                cost: fop.cost,
                pre,
                add_eff,
                del_eff,
                cond_effects,
            }
        })
        .collect();

    let strips = StripsTask::new(facts, operators, init, goal);

    let groups: Vec<MutexGroup> = fdr
        .variables
        .iter()
        .map(|var| MutexGroup::new(var.domain.iter().copied().collect()))
        .collect();
    let mut mgroups = MutexGroups::new(groups);
    mgroups.set_exactly_one(&strips);
    mgroups.set_goal(&strips);
    for g in mgroups.groups_mut() {
        g.is_fam_group = is_fam_group_structural(&g.facts, &strips);
    }

    (strips, mgroups)
}
