use crate::models::RecentTopic;
use crate::util::now_ms;
use serde::{Deserialize, Serialize};

pub(crate) const TOKEN_KEY: &str = "revisa_token";
pub(crate) const RECENT_TOPICS_KEY: &str = "revisa_recent_topics";

pub(crate) fn load_json_from_storage<T: for<'de> Deserialize<'de>>(key: &str) -> Option<T> {
    let storage = web_sys::window().and_then(|w| w.local_storage().ok().flatten())?;
    let json = storage.get_item(key).ok().flatten()?;
    serde_json::from_str(&json).ok()
}

pub(crate) fn save_json_to_storage<T: Serialize>(key: &str, value: &T) {
    if let Ok(json) = serde_json::to_string(value) {
        if let Some(storage) = web_sys::window().and_then(|w| w.local_storage().ok().flatten()) {
            let _ = storage.set_item(key, &json);
        }
    }
}

pub(crate) fn upsert_lru_by_key<T: Clone>(
    mut items: Vec<T>,
    item: T,
    same_key: impl Fn(&T, &T) -> bool,
    max: usize,
) -> Vec<T> {
    items.retain(|x| !same_key(x, &item));
    items.insert(0, item);
    if items.len() > max {
        items.truncate(max);
    }
    items
}

pub(crate) fn load_recent_topics() -> Vec<RecentTopic> {
    load_json_from_storage::<Vec<RecentTopic>>(RECENT_TOPICS_KEY).unwrap_or_default()
}

pub(crate) fn write_recent_topic(id: &str, name: &str) {
    if id.trim().is_empty() {
        return;
    }

    let item = RecentTopic {
        id: id.to_string(),
        name: name.to_string(),
        last_opened_ms: now_ms(),
    };

    let next = upsert_lru_by_key(load_recent_topics(), item, |a, b| a.id == b.id, 10);
    save_json_to_storage(RECENT_TOPICS_KEY, &next);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_lru_moves_existing_to_front() {
        let items = vec!["a", "b", "c"];
        let next = upsert_lru_by_key(items, "b", |a, b| a == b, 10);
        assert_eq!(next, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_upsert_lru_truncates_at_max() {
        let items = vec!["a", "b", "c"];
        let next = upsert_lru_by_key(items, "d", |a, b| a == b, 3);
        assert_eq!(next, vec!["d", "a", "b"]);
    }
}
