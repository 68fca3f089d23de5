use crate::{
    diagnostics::{Document, Issue, Partial},
    document::json_kind,
    registry::{ModId, Registry},
};
use serde_json::{Map, Value};
use std::cmp::Ordering;

pub const GUI_ORDER_FIELD: &str = "modsOrder";
pub const ENABLED_ORDER_FIELD: &str = "enabled_mods";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

/// Reads `modsOrder`. Any entry that is not a UUID string invalidates the whole
/// document, so the result is either the full order or nothing.
pub fn load_presentation_order(doc: &Map<String, Value>) -> Partial<Vec<ModId>> {
    let entries = match string_list(doc, GUI_ORDER_FIELD, Document::GuiOrder) {
        Ok(entries) => entries,
        Err(issue) => return Partial::new(Vec::new(), vec![issue]),
    };

    let mut order = Vec::with_capacity(entries.len());
    for (position, entry) in entries.iter().enumerate() {
        match ModId::parse(entry) {
            Ok(id) => order.push(id),
            Err(err) => {
                return Partial::new(
                    Vec::new(),
                    vec![Issue::DocumentUnreadable {
                        document: Document::GuiOrder,
                        reason: format!("{GUI_ORDER_FIELD}[{position}] `{entry}` is not a UUID: {err}"),
                    }],
                );
            }
        }
    }
    Partial::clean(order)
}

pub fn apply_enabled_list(doc: &Map<String, Value>, registry: &mut Registry) -> Partial<Vec<ModId>> {
    let entries = match string_list(doc, ENABLED_ORDER_FIELD, Document::EnabledOrder) {
        Ok(entries) => entries,
        Err(issue) => return Partial::new(Vec::new(), vec![issue]),
    };

    let mut applied = Vec::new();
    let mut issues = Vec::new();
    for token in entries {
        match registry.resolve(&token) {
            Some(id) => {
                registry.set_enabled(id, true);
                applied.push(id);
            }
            None => issues.push(Issue::UnresolvedReference {
                document: Document::EnabledOrder,
                reference: token,
            }),
        }
    }
    Partial::new(applied, issues)
}

/// Reads a list-of-strings field. Non-string entries are kept as their JSON
/// text so they surface as unresolved references downstream.
pub fn string_list(
    doc: &Map<String, Value>,
    field: &str,
    document: Document,
) -> Result<Vec<String>, Issue> {
    match doc.get(field) {
        Some(Value::Array(items)) => Ok(items
            .iter()
            .map(|item| match item {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            })
            .collect()),
        Some(other) => Err(Issue::DocumentUnreadable {
            document,
            reason: format!("`{field}` should be an array, found {}", json_kind(other)),
        }),
        None => Err(Issue::DocumentUnreadable {
            document,
            reason: format!("`{field}` is missing"),
        }),
    }
}

pub fn sort_by_display_name(
    order: &mut Vec<ModId>,
    registry: &Registry,
    direction: SortDirection,
) -> Vec<Issue> {
    let mut issues = Vec::new();
    order.retain(|id| {
        let known = registry.contains(*id);
        if !known {
            issues.push(Issue::UnresolvedReference {
                document: Document::GuiOrder,
                reference: id.to_string(),
            });
        }
        known
    });

    order.sort_by(|a, b| {
        let ordering: Ordering = registry.display_name(*a).cmp(registry.display_name(*b));
        match direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
    issues
}

pub fn render_checklist(order: &[ModId], registry: &Registry) -> Partial<Vec<String>> {
    let mut lines = Vec::with_capacity(order.len());
    let mut issues = Vec::new();
    for &id in order {
        match registry.get(id) {
            Some(entity) => {
                let mark = if entity.enabled { "[*]" } else { "[ ]" };
                lines.push(format!("{mark} {}", entity.display_name));
            }
            None => issues.push(Issue::UnresolvedReference {
                document: Document::GuiOrder,
                reference: id.to_string(),
            }),
        }
    }
    Partial::new(lines, issues)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ModEntity;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        let Value::Object(map) = value else {
            panic!("expected object")
        };
        map
    }

    fn id(value: u128) -> ModId {
        ModId::from_u128(value)
    }

    fn registry(names: &[(u128, &str)]) -> Registry {
        let mut registry = Registry::new();
        for (value, name) in names {
            registry.insert(ModEntity::new(id(*value), format!("mod/{value}.mod")).with_name(*name));
        }
        registry
    }

    #[test]
    fn presentation_order_parses_uuids() {
        let doc = object(json!({
            "modsOrder": [id(2).to_string(), id(1).to_string().to_uppercase()],
            "other": true
        }));
        let partial = load_presentation_order(&doc);
        assert!(partial.is_clean());
        assert_eq!(partial.value, vec![id(2), id(1)]);
    }

    #[test]
    fn one_bad_uuid_fails_the_document() {
        let doc = object(json!({ "modsOrder": [id(1).to_string(), "garbage"] }));
        let partial = load_presentation_order(&doc);
        assert!(partial.value.is_empty());
        assert!(matches!(
            partial.issues.as_slice(),
            [Issue::DocumentUnreadable {
                document: Document::GuiOrder,
                ..
            }]
        ));
    }

    #[test]
    fn missing_order_field_fails_the_document() {
        let partial = load_presentation_order(&object(json!({ "mods": [] })));
        assert!(partial.value.is_empty());
        assert_eq!(partial.issues.len(), 1);
    }

    #[test]
    fn enabled_list_resolves_both_token_kinds() {
        let mut registry = registry(&[(1, "One"), (2, "Two"), (3, "Three")]);
        let doc = object(json!({
            "enabled_mods": ["mod/1.mod", id(3).to_string(), "mod/gone.mod"]
        }));
        let partial = apply_enabled_list(&doc, &mut registry);

        assert_eq!(partial.value, vec![id(1), id(3)]);
        assert!(registry.is_enabled(id(1)));
        assert!(!registry.is_enabled(id(2)));
        assert!(registry.is_enabled(id(3)));
        assert_eq!(
            partial.issues,
            vec![Issue::UnresolvedReference {
                document: Document::EnabledOrder,
                reference: "mod/gone.mod".to_string(),
            }]
        );
    }

    #[test]
    fn sort_is_descending_and_stable() {
        let registry = registry(&[
            (1, "Unnamed Mod"),
            (2, "Alpha"),
            (3, "Unnamed Mod"),
            (4, "Zeta"),
            (5, "Unnamed Mod"),
        ]);
        let mut order = vec![id(3), id(2), id(5), id(4), id(1)];
        let issues = sort_by_display_name(&mut order, &registry, SortDirection::Descending);
        assert!(issues.is_empty());
        assert_eq!(order, vec![id(4), id(3), id(5), id(1), id(2)]);

        let mut order = vec![id(5), id(1), id(2), id(3)];
        sort_by_display_name(&mut order, &registry, SortDirection::Ascending);
        assert_eq!(order, vec![id(2), id(5), id(1), id(3)]);
    }

    #[test]
    fn sort_uses_code_point_order() {
        let registry = registry(&[(1, "apple"), (2, "Banana"), (3, "Ähre")]);
        let mut order = vec![id(1), id(2), id(3)];
        sort_by_display_name(&mut order, &registry, SortDirection::Ascending);
        assert_eq!(order, vec![id(2), id(1), id(3)]);
    }

    #[test]
    fn sort_drops_unknown_ids() {
        let registry = registry(&[(1, "One")]);
        let mut order = vec![id(9), id(1)];
        let issues = sort_by_display_name(&mut order, &registry, SortDirection::Descending);
        assert_eq!(order, vec![id(1)]);
        assert_eq!(issues.len(), 1);
    }

    #[test]
    fn checklist_marks_enabled_mods() {
        let mut registry = registry(&[(1, "One"), (2, "Two")]);
        registry.set_enabled(id(2), true);
        let partial = render_checklist(&[id(2), id(1), id(7)], &registry);
        assert_eq!(partial.value, vec!["[*] Two".to_string(), "[ ] One".to_string()]);
        assert_eq!(partial.issues.len(), 1);
    }
}
