use crate::{
    diagnostics::{Document, Issue, Partial},
    order::{ENABLED_ORDER_FIELD, GUI_ORDER_FIELD},
    registry::{ModEntity, ModId, Registry},
};
use serde_json::{Map, Value};
use std::collections::HashSet;

pub fn write_gui_order(doc: &mut Map<String, Value>, order: &[ModId], registry: &Registry) -> Vec<Issue> {
    let tokens = order_tokens(order, registry, Document::GuiOrder, |_| true, |entity| {
        entity.id.to_string()
    });
    replace_field(doc, GUI_ORDER_FIELD, tokens.value);
    tokens.issues
}

pub fn write_enabled_order(
    doc: &mut Map<String, Value>,
    order: &[ModId],
    registry: &Registry,
) -> Vec<Issue> {
    let tokens = order_tokens(
        order,
        registry,
        Document::EnabledOrder,
        |entity| entity.enabled,
        |entity| entity.game_registry_id.clone(),
    );
    replace_field(doc, ENABLED_ORDER_FIELD, tokens.value);
    tokens.issues
}

/// Walks `order` consuming each registry id once. Whatever is still pending
/// afterwards has leaked out of the order and is appended in registry order.
pub fn order_tokens(
    order: &[ModId],
    registry: &Registry,
    document: Document,
    include: impl Fn(&ModEntity) -> bool,
    token: impl Fn(&ModEntity) -> String,
) -> Partial<Vec<String>> {
    let mut pending: HashSet<ModId> = registry.ids().collect();
    let mut tokens = Vec::new();
    let mut issues = Vec::new();

    for &id in order {
        match registry.get(id) {
            Some(entity) if pending.remove(&id) => {
                if include(entity) {
                    tokens.push(token(entity));
                }
            }
            Some(_) => issues.push(Issue::DuplicateInOrder { document, id }),
            None => issues.push(Issue::UnresolvedReference {
                document,
                reference: id.to_string(),
            }),
        }
    }

    for entity in registry.iter() {
        if !pending.contains(&entity.id) || !include(entity) {
            continue;
        }
        issues.push(Issue::LeakedElement {
            document,
            id: entity.id,
            name: entity.display_name.clone(),
        });
        tokens.push(token(entity));
    }

    Partial::new(tokens, issues)
}

fn replace_field(doc: &mut Map<String, Value>, field: &str, tokens: Vec<String>) {
    doc.insert(
        field.to_string(),
        Value::Array(tokens.into_iter().map(Value::String).collect()),
    );
}
