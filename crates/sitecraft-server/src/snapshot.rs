//! Stored room documents — encode, decode, and activity-shape normalization.
//!
//! A stored room is the [`GameState`] JSON plus a format `version` and a
//! copy of the activity schedule for readers of the file. The schedule in
//! a document is never trusted: on decode it is normalized, compared with
//! the static catalog, and discarded. The catalog always wins.
//!
//! Accepted `activities` shapes: an array, an object keyed by position or
//! id, or absent. Entry fields may use several historical spellings (see
//! [`normalize_activity`]).

use serde::Serialize;
use serde_json::{Map, Value};

use sitecraft_logic::catalog::{Activity, Catalog, Dependency};
use sitecraft_logic::GameState;

use crate::store::StoreError;

/// Version number for stored room documents (increment when format changes).
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize)]
struct StoredRoom<'a> {
    version: u32,
    #[serde(flatten)]
    state: &'a GameState,
    activities: &'a [Activity],
}

/// Pretty-printed stored form of a room.
pub fn encode(state: &GameState, catalog: &Catalog) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&StoredRoom {
        version: SNAPSHOT_VERSION,
        state,
        activities: catalog.activities(),
    })
}

/// Parse a stored room, normalizing and reconciling its activity schedule.
pub fn decode(json: &str, catalog: &Catalog) -> Result<GameState, StoreError> {
    let mut doc: Value = serde_json::from_str(json)?;
    let Some(fields) = doc.as_object_mut() else {
        return Err(StoreError::Malformed("room document is not an object".to_string()));
    };

    let version = fields
        .remove("version")
        .and_then(|v| v.as_u64())
        .map_or(SNAPSHOT_VERSION, |v| u32::try_from(v).unwrap_or(u32::MAX));
    if version > SNAPSHOT_VERSION {
        return Err(StoreError::Version(version));
    }

    let stored = normalize_activities(fields.remove("activities").as_ref());
    let state: GameState = serde_json::from_value(doc)?;
    reconcile(&state.room_code, &stored, catalog);
    Ok(state)
}

/// Log when a stored schedule disagrees with the catalog.
fn reconcile(room_code: &str, stored: &[Activity], catalog: &Catalog) -> bool {
    if stored.is_empty() {
        log::debug!("room {room_code}: no stored activities, using catalog");
        return false;
    }
    let matches = stored == catalog.activities();
    if !matches {
        log::warn!(
            "room {}: stored activities differ from catalog ({} vs {}), using catalog",
            room_code,
            stored.len(),
            catalog.activity_count()
        );
    }
    matches
}

// ── Normalization ──────────────────────────────────────────────────────

/// Any accepted container shape to an ordered list.
pub fn normalize_activities(raw: Option<&Value>) -> Vec<Activity> {
    let entries: Vec<&Value> = match raw {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(Value::Object(map)) => ordered_values(map),
        _ => Vec::new(),
    };
    entries.into_iter().filter_map(normalize_activity).collect()
}

/// Object values ordered by numeric key when keys are positions, else by key.
fn ordered_values(map: &Map<String, Value>) -> Vec<&Value> {
    let mut pairs: Vec<(&String, &Value)> = map.iter().collect();
    pairs.sort_by(|(a, _), (b, _)| {
        let key = |k: &str| (k.parse::<usize>().ok(), k.to_string());
        key(a).cmp(&key(b))
    });
    pairs.into_iter().map(|(_, v)| v).collect()
}

fn first<'a>(entry: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| entry.get(*k).filter(|v| !v.is_null()))
}

fn text(entry: &Map<String, Value>, keys: &[&str]) -> String {
    first(entry, keys)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn number<T: TryFrom<i64> + Default>(entry: &Map<String, Value>, keys: &[&str]) -> T {
    first(entry, keys)
        .and_then(Value::as_i64)
        .and_then(|n| T::try_from(n).ok())
        .unwrap_or_default()
}

/// One stored entry to an [`Activity`], tolerating field aliases:
///
/// | Field | Accepted keys |
/// |-------|---------------|
/// | id | `id`, `code`, `activityId` |
/// | name | `name`, `title`, `activityName` |
/// | base time | `base_time`, `baseTime`, `duration`, `time`, `weeks` |
/// | base cost | `base_cost`, `baseCost`, `cost`, `bpCost` |
/// | workers | `req_workers`, `reqWorkers`, `workers`, `workerReq` |
/// | machines | `req_machines`, `reqMachines`, `machines`, `machineReq` |
/// | dependency | `dep`, `dependency`, `dependencies` |
///
/// A bare-string dependency means finish-to-start on that id. Entries
/// that are not objects are skipped.
pub fn normalize_activity(raw: &Value) -> Option<Activity> {
    let entry = raw.as_object()?;
    Some(Activity {
        id: text(entry, &["id", "code", "activityId"]),
        name: text(entry, &["name", "title", "activityName"]),
        base_time: number(entry, &["base_time", "baseTime", "duration", "time", "weeks"]),
        base_cost: number(entry, &["base_cost", "baseCost", "cost", "bpCost"]),
        req_workers: number(entry, &["req_workers", "reqWorkers", "workers", "workerReq"]),
        req_machines: number(entry, &["req_machines", "reqMachines", "machines", "machineReq"]),
        dep: first(entry, &["dep", "dependency", "dependencies"])
            .map(normalize_dependency)
            .unwrap_or_default(),
    })
}

fn normalize_dependency(raw: &Value) -> Dependency {
    match raw {
        Value::String(id) if !id.is_empty() => Dependency::FinishToStart { on: vec![id.clone()] },
        Value::Object(_) => serde_json::from_value(raw.clone()).unwrap_or_default(),
        _ => Dependency::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;
    use sitecraft_logic::GameConfig;

    fn room(catalog: &Catalog) -> GameState {
        let mut rng = StdRng::seed_from_u64(1);
        GameState::new("ROOM1", "p0", "Host", GameConfig::default(), catalog, &mut rng)
    }

    #[test]
    fn test_encode_decode_keeps_state() {
        let catalog = Catalog::builtin().unwrap();
        let state = room(&catalog);
        let json = encode(&state, &catalog).unwrap();
        assert!(json.contains("\"version\": 1"));
        assert_eq!(decode(&json, &catalog).unwrap(), state);
    }

    #[test]
    fn test_array_and_object_shapes_normalize_equal() {
        let array = json!([
            {"id": "A01", "name": "Setup", "baseTime": 2, "cost": 4, "workers": 2, "machineReq": 1},
            {"code": "A02", "title": "Permits", "duration": 2, "bpCost": 3, "dep": "A01"},
        ]);
        let object = json!({
            "1": {"code": "A02", "title": "Permits", "duration": 2, "bpCost": 3, "dep": "A01"},
            "0": {
                "id": "A01", "name": "Setup", "baseTime": 2, "cost": 4,
                "workers": 2, "machineReq": 1
            },
        });
        let from_array = normalize_activities(Some(&array));
        let from_object = normalize_activities(Some(&object));
        assert_eq!(from_array, from_object);
        assert_eq!(from_array[0].base_cost, 4);
        assert_eq!(from_array[0].req_machines, 1);
        assert_eq!(
            from_array[1].dep,
            Dependency::FinishToStart {
                on: vec!["A01".to_string()]
            }
        );
    }

    #[test]
    fn test_positional_keys_sort_numerically() {
        let object = json!({
            "10": {"id": "K"},
            "2": {"id": "C"},
            "0": {"id": "A"},
        });
        let ids: Vec<_> = normalize_activities(Some(&object))
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec!["A", "C", "K"]);
    }

    #[test]
    fn test_absent_or_odd_shapes_are_empty() {
        assert!(normalize_activities(None).is_empty());
        assert!(normalize_activities(Some(&json!("nope"))).is_empty());
        assert_eq!(normalize_activities(Some(&json!([1, {"id": "A01"}]))).len(), 1);
    }

    #[test]
    fn test_stale_stored_schedule_is_ignored() {
        let catalog = Catalog::builtin().unwrap();
        let state = room(&catalog);
        let mut doc: Value = serde_json::from_str(&encode(&state, &catalog).unwrap()).unwrap();
        doc["activities"] = json!({"0": {"id": "X", "baseTime": 99}});
        let decoded = decode(&doc.to_string(), &catalog).unwrap();
        assert_eq!(decoded, state);
        assert!(!reconcile("ROOM1", &normalize_activities(Some(&doc["activities"])), &catalog));
    }

    #[test]
    fn test_newer_version_rejected() {
        let catalog = Catalog::builtin().unwrap();
        let json = encode(&room(&catalog), &catalog).unwrap();
        let mut doc: Value = serde_json::from_str(&json).unwrap();
        doc["version"] = json!(SNAPSHOT_VERSION + 1);
        assert!(matches!(
            decode(&doc.to_string(), &catalog),
            Err(StoreError::Version(v)) if v == SNAPSHOT_VERSION + 1
        ));
    }

    #[test]
    fn test_not_an_object_is_malformed() {
        let catalog = Catalog::builtin().unwrap();
        assert!(matches!(decode("[]", &catalog), Err(StoreError::Malformed(_))));
        assert!(matches!(decode("{oops", &catalog), Err(StoreError::Json(_))));
    }
}
