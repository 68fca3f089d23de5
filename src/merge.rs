use crate::{
    diagnostics::{Document, Issue, Partial},
    enabled_list::{Blacklist, ListRecord},
    registry::{ModId, Registry},
};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOptions {
    pub include_ignored: bool,
    pub force_load: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub order: Vec<ModId>,
    pub applied: bool,
    pub enablement_changed: bool,
}

pub fn merge_import(
    import: &[ListRecord],
    current: &[ModId],
    registry: &mut Registry,
    blacklist: &Blacklist,
    options: MergeOptions,
) -> Partial<MergeOutcome> {
    let mut issues = Vec::new();
    let mut remaining: HashSet<ModId> = current.iter().copied().collect();

    if !options.force_load {
        let mut reported = HashSet::new();
        for record in import {
            if !remaining.contains(&record.id) && reported.insert(record.id) {
                issues.push(Issue::NotInOrder {
                    id: record.id,
                    name: record.display_name.clone(),
                });
            }
        }
        if !issues.is_empty() {
            return Partial::new(
                MergeOutcome {
                    order: current.to_vec(),
                    applied: false,
                    enablement_changed: false,
                },
                issues,
            );
        }
    }

    let before: HashSet<ModId> = registry.enabled_ids().into_iter().collect();

    for entity in registry.iter_mut() {
        if blacklist.contains(entity.id) && !options.include_ignored {
            continue;
        }
        entity.enabled = false;
    }

    let mut load_order = Vec::new();
    let mut seen = HashSet::new();
    for record in import {
        let id = record.id;
        if !seen.insert(id) {
            issues.push(Issue::DuplicateInImport {
                id,
                name: record.display_name.clone(),
            });
            continue;
        }
        remaining.remove(&id);
        if !registry.contains(id) {
            issues.push(Issue::UnresolvedReference {
                document: Document::ImportList,
                reference: id.to_string(),
            });
            continue;
        }
        let take = if blacklist.contains(id) {
            options.include_ignored
        } else {
            true
        };
        if take {
            registry.set_enabled(id, true);
            load_order.push(id);
        }
    }

    let mut pinned = Vec::new();
    for &id in current {
        if !remaining.remove(&id) {
            continue;
        }
        if registry.is_enabled(id) {
            pinned.push(id);
        } else {
            load_order.push(id);
        }
    }

    pinned.extend(load_order);
    let after: HashSet<ModId> = registry.enabled_ids().into_iter().collect();

    Partial::new(
        MergeOutcome {
            order: pinned,
            applied: true,
            enablement_changed: before != after,
        },
        issues,
    )
}
