use crate::{
    diagnostics::{Document, Issue, Partial},
    document::json_kind,
};
use indexmap::IndexMap;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::{collections::HashMap, fmt, str::FromStr};
use uuid::Uuid;

pub const DEFAULT_DISPLAY_NAME: &str = "Unnamed Mod";
pub const DEFAULT_REQUIRED_VERSION: &str = "0.0.0";
pub const DEFAULT_SOURCE: &str = "none";
pub const DEFAULT_STATUS: &str = "undefined";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModId(Uuid);

impl ModId {
    pub fn parse(value: &str) -> Result<Self, uuid::Error> {
        Uuid::try_parse(value).map(ModId)
    }

    pub fn from_u128(value: u128) -> Self {
        ModId(Uuid::from_u128(value))
    }

    pub fn as_u128(self) -> u128 {
        self.0.as_u128()
    }

    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for ModId {
    fn from(value: Uuid) -> Self {
        ModId(value)
    }
}

impl FromStr for ModId {
    type Err = uuid::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        ModId::parse(value)
    }
}

impl fmt::Display for ModId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModEntity {
    pub id: ModId,
    pub game_registry_id: String,
    pub display_name: String,
    pub required_version: String,
    pub source: String,
    pub status: String,
    pub steam_id: u64,
    pub tags: Vec<String>,
    pub thumbnail_path: String,
    pub thumbnail_url: String,
    pub time_updated: i64,
    pub enabled: bool,
}

impl ModEntity {
    pub fn new(id: ModId, game_registry_id: impl Into<String>) -> Self {
        Self {
            id,
            game_registry_id: game_registry_id.into(),
            display_name: DEFAULT_DISPLAY_NAME.to_string(),
            required_version: DEFAULT_REQUIRED_VERSION.to_string(),
            source: DEFAULT_SOURCE.to_string(),
            status: DEFAULT_STATUS.to_string(),
            steam_id: 0,
            tags: vec![String::new()],
            thumbnail_path: String::new(),
            thumbnail_url: String::new(),
            time_updated: 0,
            enabled: false,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }
}

#[derive(Debug, Default, Clone)]
pub struct IdentifierIndex {
    by_token: HashMap<String, ModId>,
}

impl IdentifierIndex {
    pub fn lookup(&self, token: &str) -> Option<ModId> {
        self.by_token.get(token).copied()
    }

    fn insert(&mut self, token: String, id: ModId) -> Option<ModId> {
        match self.by_token.get(&token) {
            Some(existing) if *existing != id => Some(*existing),
            Some(_) => None,
            None => {
                self.by_token.insert(token, id);
                None
            }
        }
    }

    fn remove_for(&mut self, id: ModId) {
        self.by_token.retain(|_, value| *value != id);
    }

    pub fn len(&self) -> usize {
        self.by_token.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_token.is_empty()
    }
}

#[derive(Debug, Default, Clone)]
pub struct Registry {
    mods: IndexMap<ModId, ModEntity>,
    index: IdentifierIndex,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id already owning the registry token when another mod has it.
    pub fn insert(&mut self, entity: ModEntity) -> Option<ModId> {
        let id = entity.id;
        if self.mods.contains_key(&id) {
            self.index.remove_for(id);
        }
        self.index.insert(id.to_string(), id);
        let clash = self.index.insert(entity.game_registry_id.clone(), id);
        self.mods.insert(id, entity);
        clash
    }

    pub fn resolve(&self, token: &str) -> Option<ModId> {
        if let Some(id) = self.index.lookup(token) {
            return Some(id);
        }
        ModId::parse(token)
            .ok()
            .filter(|id| self.mods.contains_key(id))
    }

    pub fn index(&self) -> &IdentifierIndex {
        &self.index
    }

    pub fn get(&self, id: ModId) -> Option<&ModEntity> {
        self.mods.get(&id)
    }

    pub fn get_mut(&mut self, id: ModId) -> Option<&mut ModEntity> {
        self.mods.get_mut(&id)
    }

    pub fn contains(&self, id: ModId) -> bool {
        self.mods.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModEntity> {
        self.mods.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ModEntity> {
        self.mods.values_mut()
    }

    pub fn ids(&self) -> impl Iterator<Item = ModId> + '_ {
        self.mods.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.mods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mods.is_empty()
    }

    pub fn is_enabled(&self, id: ModId) -> bool {
        self.mods.get(&id).map(|entity| entity.enabled).unwrap_or(false)
    }

    /// Sets the enabled flag, returning whether it changed. `None` when the id
    /// is not in the table.
    pub fn set_enabled(&mut self, id: ModId, enabled: bool) -> Option<bool> {
        let entity = self.mods.get_mut(&id)?;
        let changed = entity.enabled != enabled;
        entity.enabled = enabled;
        Some(changed)
    }

    pub fn enabled_ids(&self) -> Vec<ModId> {
        self.mods
            .values()
            .filter(|entity| entity.enabled)
            .map(|entity| entity.id)
            .collect()
    }

    pub fn display_name(&self, id: ModId) -> &str {
        self.mods
            .get(&id)
            .map(|entity| entity.display_name.as_str())
            .unwrap_or(DEFAULT_DISPLAY_NAME)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum Numeric {
    Number(Number),
    Text(String),
}

impl Numeric {
    pub(crate) fn as_u64(&self) -> Option<u64> {
        match self {
            Numeric::Number(number) => number
                .as_u64()
                .or_else(|| number.as_f64().filter(|value| *value >= 0.0).map(|value| value as u64)),
            Numeric::Text(text) => text.trim().parse().ok(),
        }
    }

    pub(crate) fn as_i64(&self) -> Option<i64> {
        match self {
            Numeric::Number(number) => number
                .as_i64()
                .or_else(|| number.as_f64().map(|value| value as i64)),
            Numeric::Text(text) => text.trim().parse().ok(),
        }
    }

    fn describe(&self) -> String {
        match self {
            Numeric::Number(number) => number.to_string(),
            Numeric::Text(text) => text.clone(),
        }
    }
}

pub fn load_registry(doc: &Map<String, Value>) -> Partial<Registry> {
    let mut registry = Registry::new();
    let mut issues = Vec::new();

    for (key, raw) in doc {
        let Some(record) = raw.as_object() else {
            issues.push(Issue::MalformedRecord {
                document: Document::Registry,
                record: key.clone(),
                reason: format!("expected an object, found {}", json_kind(raw)),
            });
            continue;
        };

        let Some(id) = record_id(key, record.get("id"), &mut issues) else {
            continue;
        };
        if registry.contains(id) {
            issues.push(Issue::DuplicateRecord {
                document: Document::Registry,
                record: key.clone(),
                id,
            });
            continue;
        }

        let game_registry_id = match field::<String>(key, record, "gameRegistryId", &mut issues) {
            Some(value) => value,
            None => {
                if !present(record, "gameRegistryId") {
                    issues.push(Issue::MissingField {
                        document: Document::Registry,
                        record: key.clone(),
                        field: "gameRegistryId",
                    });
                }
                id.to_string()
            }
        };

        let mut entity = ModEntity::new(id, game_registry_id);
        if let Some(value) = field(key, record, "displayName", &mut issues) {
            entity.display_name = value;
        }
        if let Some(value) = field(key, record, "requiredVersion", &mut issues) {
            entity.required_version = value;
        }
        if let Some(value) = field(key, record, "source", &mut issues) {
            entity.source = value;
        }
        if let Some(value) = field(key, record, "status", &mut issues) {
            entity.status = value;
        }
        if let Some(value) = field(key, record, "tags", &mut issues) {
            entity.tags = value;
        }
        if let Some(value) = field(key, record, "thumbnailPath", &mut issues) {
            entity.thumbnail_path = value;
        }
        if let Some(value) = field(key, record, "thumbnailUrl", &mut issues) {
            entity.thumbnail_url = value;
        }
        if let Some(value) = field::<Numeric>(key, record, "steamId", &mut issues) {
            match value.as_u64() {
                Some(parsed) => entity.steam_id = parsed,
                None => issues.push(bad_integer(key, "steamId", &value)),
            }
        }
        if let Some(value) = field::<Numeric>(key, record, "timeUpdated", &mut issues) {
            match value.as_i64() {
                Some(parsed) => entity.time_updated = parsed,
                None => issues.push(bad_integer(key, "timeUpdated", &value)),
            }
        }

        if let Some(owner) = registry.insert(entity) {
            issues.push(Issue::MalformedRecord {
                document: Document::Registry,
                record: key.clone(),
                reason: format!("gameRegistryId already belongs to {owner}"),
            });
        }
    }

    Partial::new(registry, issues)
}

fn present(record: &Map<String, Value>, name: &str) -> bool {
    record.get(name).is_some_and(|value| !value.is_null())
}

fn field<T: DeserializeOwned>(
    key: &str,
    record: &Map<String, Value>,
    name: &str,
    issues: &mut Vec<Issue>,
) -> Option<T> {
    let value = record.get(name).filter(|value| !value.is_null())?;
    match serde_json::from_value(value.clone()) {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            issues.push(Issue::MalformedRecord {
                document: Document::Registry,
                record: key.to_string(),
                reason: format!("{name} is {}, using the default", json_kind(value)),
            });
            None
        }
    }
}

fn record_id(key: &str, id: Option<&Value>, issues: &mut Vec<Issue>) -> Option<ModId> {
    let (value, from_key) = match id {
        Some(Value::String(value)) => (value.as_str(), false),
        None | Some(Value::Null) => {
            issues.push(Issue::MissingField {
                document: Document::Registry,
                record: key.to_string(),
                field: "id",
            });
            (key, true)
        }
        Some(other) => {
            issues.push(Issue::InvalidIdentifier {
                document: Document::Registry,
                record: key.to_string(),
                value: other.to_string(),
            });
            return None;
        }
    };
    match ModId::parse(value) {
        Ok(id) => Some(id),
        Err(_) => {
            issues.push(Issue::InvalidIdentifier {
                document: Document::Registry,
                record: key.to_string(),
                value: if from_key {
                    format!("{value} (record key)")
                } else {
                    value.to_string()
                },
            });
            None
        }
    }
}

fn bad_integer(key: &str, field: &str, value: &Numeric) -> Issue {
    Issue::MalformedRecord {
        document: Document::Registry,
        record: key.to_string(),
        reason: format!("{field} `{}` is not an integer, using 0", value.describe()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ALPHA: &str = "0b5bd7a1-8f5d-4b1e-9a8b-1f0e7c3f6a01";
    const BETA: &str = "4c2f1e0d-3b6a-4d59-8e7f-2a1b0c9d8e02";

    fn doc(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("test document must be an object"),
        }
    }

    #[test]
    fn loads_fields_and_defaults() {
        let registry = load_registry(&doc(json!({
            ALPHA: {
                "id": ALPHA,
                "gameRegistryId": "mod/ugc_1.mod",
                "displayName": "Alpha",
                "steamId": "2401",
                "timeUpdated": 1700000000,
                "tags": ["Gameplay"]
            },
            BETA: { "id": BETA, "gameRegistryId": "mod/beta.mod" }
        })));
        assert!(registry.is_clean());
        let registry = registry.value;

        let alpha = registry.get(ModId::parse(ALPHA).unwrap()).unwrap();
        assert_eq!(alpha.display_name, "Alpha");
        assert_eq!(alpha.steam_id, 2401);
        assert_eq!(alpha.time_updated, 1_700_000_000);
        assert_eq!(alpha.tags, vec!["Gameplay".to_string()]);
        assert!(!alpha.enabled);

        let beta = registry.get(ModId::parse(BETA).unwrap()).unwrap();
        assert_eq!(beta.display_name, DEFAULT_DISPLAY_NAME);
        assert_eq!(beta.required_version, "0.0.0");
        assert_eq!(beta.source, "none");
        assert_eq!(beta.status, "undefined");
        assert_eq!(beta.steam_id, 0);
        assert_eq!(beta.tags, vec![String::new()]);
        assert_eq!(beta.thumbnail_path, "");
        assert_eq!(beta.time_updated, 0);
    }

    #[test]
    fn both_tokens_resolve_to_the_same_entity() {
        let registry = load_registry(&doc(json!({
            ALPHA: { "id": ALPHA, "gameRegistryId": "mod/alpha.mod" },
            BETA: { "id": BETA, "gameRegistryId": "mod/beta.mod" }
        })))
        .value;

        for entity in registry.iter() {
            assert_eq!(
                registry.resolve(&entity.game_registry_id),
                registry.resolve(&entity.id.to_string())
            );
            assert_eq!(registry.resolve(&entity.game_registry_id), Some(entity.id));
        }
        assert_eq!(
            registry.resolve(&ALPHA.to_uppercase()),
            Some(ModId::parse(ALPHA).unwrap())
        );
        assert_eq!(registry.resolve("mod/missing.mod"), None);
    }

    #[test]
    fn bad_id_fails_only_that_record() {
        let partial = load_registry(&doc(json!({
            "broken": { "id": "not-a-uuid", "gameRegistryId": "mod/broken.mod" },
            ALPHA: { "id": ALPHA, "gameRegistryId": "mod/alpha.mod" }
        })));
        assert_eq!(partial.value.len(), 1);
        assert_eq!(
            partial.issues,
            vec![Issue::InvalidIdentifier {
                document: Document::Registry,
                record: "broken".to_string(),
                value: "not-a-uuid".to_string(),
            }]
        );
    }

    #[test]
    fn missing_fields_fall_back() {
        let partial = load_registry(&doc(json!({
            ALPHA: { "gameRegistryId": "mod/alpha.mod" },
            BETA: { "id": BETA }
        })));
        let registry = &partial.value;
        let alpha = ModId::parse(ALPHA).unwrap();
        let beta = ModId::parse(BETA).unwrap();

        assert!(registry.contains(alpha));
        assert_eq!(registry.get(beta).unwrap().game_registry_id, BETA);
        assert_eq!(registry.resolve(BETA), Some(beta));
        assert_eq!(partial.issues.len(), 2);
        assert!(matches!(
            partial.issues[0],
            Issue::MissingField { field: "id", .. }
        ));
        assert!(matches!(
            partial.issues[1],
            Issue::MissingField {
                field: "gameRegistryId",
                ..
            }
        ));
    }

    #[test]
    fn missing_id_with_unusable_key_is_skipped() {
        let partial = load_registry(&doc(json!({
            "42": { "gameRegistryId": "mod/alpha.mod" }
        })));
        assert!(partial.value.is_empty());
        assert!(matches!(partial.issues[1], Issue::InvalidIdentifier { .. }));
    }

    #[test]
    fn duplicate_and_malformed_records_are_reported() {
        let partial = load_registry(&doc(json!({
            "first": { "id": ALPHA, "gameRegistryId": "mod/alpha.mod", "displayName": "First" },
            "second": { "id": ALPHA, "gameRegistryId": "mod/alpha2.mod", "displayName": "Second" },
            "third": "not an object",
            BETA: { "id": BETA, "gameRegistryId": "mod/beta.mod", "steamId": "abc" }
        })));
        let registry = &partial.value;
        let alpha = ModId::parse(ALPHA).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(alpha).unwrap().display_name, "First");
        assert_eq!(registry.resolve("mod/alpha2.mod"), None);
        assert_eq!(
            registry.get(ModId::parse(BETA).unwrap()).unwrap().steam_id,
            0
        );
        assert!(matches!(partial.issues[0], Issue::DuplicateRecord { .. }));
        assert!(matches!(partial.issues[1], Issue::MalformedRecord { .. }));
        assert!(matches!(partial.issues[2], Issue::MalformedRecord { .. }));
    }

    #[test]
    fn mistyped_fields_keep_the_record() {
        let partial = load_registry(&doc(json!({
            ALPHA: { "id": ALPHA, "gameRegistryId": "mod/alpha.mod", "tags": "x", "displayName": 5 },
            BETA: { "id": BETA, "gameRegistryId": ["mod/beta.mod"] }
        })));
        let alpha = partial.value.get(ModId::parse(ALPHA).unwrap()).unwrap();
        assert_eq!(alpha.tags, vec![String::new()]);
        assert_eq!(alpha.display_name, DEFAULT_DISPLAY_NAME);
        assert_eq!(partial.value.resolve("mod/alpha.mod"), Some(alpha.id));

        let beta = ModId::parse(BETA).unwrap();
        assert_eq!(partial.value.get(beta).unwrap().game_registry_id, BETA);
        assert_eq!(partial.issues.len(), 3);
        assert!(partial
            .issues
            .iter()
            .all(|issue| matches!(issue, Issue::MalformedRecord { .. })));
        assert_eq!(
            partial.issues[0],
            Issue::MalformedRecord {
                document: Document::Registry,
                record: ALPHA.to_string(),
                reason: "displayName is a number, using the default".to_string(),
            }
        );
    }

    #[test]
    fn non_string_id_fails_the_record() {
        let partial = load_registry(&doc(json!({
            ALPHA: { "id": 17, "gameRegistryId": "mod/alpha.mod" }
        })));
        assert!(partial.value.is_empty());
        assert!(matches!(
            partial.issues.as_slice(),
            [Issue::InvalidIdentifier { .. }]
        ));
    }

    #[test]
    fn null_fields_take_defaults() {
        let partial = load_registry(&doc(json!({
            ALPHA: { "id": ALPHA, "gameRegistryId": "mod/alpha.mod", "thumbnailUrl": null, "displayName": null }
        })));
        assert!(partial.is_clean());
        let entity = partial.value.get(ModId::parse(ALPHA).unwrap()).unwrap().clone();
        assert_eq!(entity.display_name, DEFAULT_DISPLAY_NAME);
        assert_eq!(entity.thumbnail_url, "");
    }

    #[test]
    fn set_enabled_reports_changes() {
        let mut registry = Registry::new();
        let id = ModId::from_u128(7);
        registry.insert(ModEntity::new(id, "mod/seven.mod"));
        assert_eq!(registry.set_enabled(id, true), Some(true));
        assert_eq!(registry.set_enabled(id, true), Some(false));
        assert_eq!(registry.set_enabled(ModId::from_u128(8), true), None);
        assert_eq!(registry.enabled_ids(), vec![id]);
    }
}
