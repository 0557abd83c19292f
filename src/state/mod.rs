use crate::api::ApiClient;
use crate::models::{Flashcard, Note, Topic};
use leptos::prelude::*;

#[derive(Clone, Copy)]
pub(crate) struct AppState {
    pub api_client: RwSignal<ApiClient>,

    /// Loaded from backend.
    pub topics: RwSignal<Vec<Topic>>,
    pub topics_loading: RwSignal<bool>,
    pub topics_error: RwSignal<Option<String>>,

    /// Notes for the currently open topic (non-paginated).
    pub notes: RwSignal<Vec<Note>>,
    pub notes_loading: RwSignal<bool>,
    pub notes_error: RwSignal<Option<String>>,

    /// Notes load guards (avoid duplicate loads + ignore stale responses).
    pub notes_request_id: RwSignal<u64>,
    pub notes_last_loaded_topic_id: RwSignal<Option<String>>,

    pub flashcards: RwSignal<Vec<Flashcard>>,
    pub flashcards_loading: RwSignal<bool>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            api_client: RwSignal::new(ApiClient::load_from_storage()),
            topics: RwSignal::new(vec![]),
            topics_loading: RwSignal::new(false),
            topics_error: RwSignal::new(None),
            notes: RwSignal::new(vec![]),
            notes_loading: RwSignal::new(false),
            notes_error: RwSignal::new(None),
            notes_request_id: RwSignal::new(0),
            notes_last_loaded_topic_id: RwSignal::new(None),
            flashcards: RwSignal::new(vec![]),
            flashcards_loading: RwSignal::new(false),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy)]
pub(crate) struct AppContext(pub AppState);
