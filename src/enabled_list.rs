use crate::{
    diagnostics::{Document, Issue, Partial},
    registry::{ModId, Numeric, Registry, DEFAULT_DISPLAY_NAME},
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRecord {
    pub display_name: String,
    pub enabled: bool,
    pub id: ModId,
    pub steam_id: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawListRecord {
    id: Option<String>,
    display_name: Option<String>,
    enabled: Option<bool>,
    steam_id: Option<Numeric>,
}

pub fn read_enabled_list(doc: &Map<String, Value>, document: Document) -> Partial<Vec<ListRecord>> {
    let mut records = Vec::new();
    let mut issues = Vec::new();

    for (key, raw) in doc {
        let record: RawListRecord = match serde_json::from_value(raw.clone()) {
            Ok(record) => record,
            Err(err) => {
                issues.push(Issue::MalformedRecord {
                    document,
                    record: key.clone(),
                    reason: err.to_string(),
                });
                continue;
            }
        };
        let Some(value) = record.id else {
            issues.push(Issue::MissingField {
                document,
                record: key.clone(),
                field: "id",
            });
            continue;
        };
        let Ok(id) = ModId::parse(&value) else {
            issues.push(Issue::InvalidIdentifier {
                document,
                record: key.clone(),
                value,
            });
            continue;
        };
        records.push(ListRecord {
            display_name: record
                .display_name
                .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_string()),
            enabled: record.enabled.unwrap_or(true),
            id,
            steam_id: record
                .steam_id
                .and_then(|value| value.as_u64())
                .unwrap_or_default(),
        });
    }

    Partial::new(records, issues)
}

#[derive(Debug, Default, Clone)]
pub struct Blacklist {
    ids: HashSet<ModId>,
}

impl Blacklist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: &[ListRecord]) -> Self {
        Self {
            ids: records.iter().map(|record| record.id).collect(),
        }
    }

    pub fn contains(&self, id: ModId) -> bool {
        self.ids.contains(&id)
    }

    pub fn insert(&mut self, id: ModId) {
        self.ids.insert(id);
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl FromIterator<ModId> for Blacklist {
    fn from_iter<I: IntoIterator<Item = ModId>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct ExportedList {
    pub records: IndexMap<String, ListRecord>,
    pub ignored: Vec<ModId>,
}

pub fn export_enabled_list(
    order: &[ModId],
    registry: &Registry,
    blacklist: &Blacklist,
    include_ignored: bool,
) -> Partial<ExportedList> {
    let mut exported = ExportedList::default();
    let mut issues = Vec::new();

    for &id in order {
        let Some(entity) = registry.get(id) else {
            issues.push(Issue::UnresolvedReference {
                document: Document::ExportList,
                reference: id.to_string(),
            });
            continue;
        };
        if blacklist.contains(id) && !include_ignored {
            exported.ignored.push(id);
            continue;
        }
        if entity.enabled {
            exported.records.insert(
                id.as_u128().to_string(),
                ListRecord {
                    display_name: entity.display_name.clone(),
                    enabled: entity.enabled,
                    id,
                    steam_id: entity.steam_id,
                },
            );
        }
    }

    Partial::new(exported, issues)
}
