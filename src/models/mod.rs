use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct Topic {
    pub id: String,
    pub module_id: String,
    pub name: String,
    pub description: String,
    pub created_at: String,
    pub updated_at: String,
}

/// `content` holds the URL of the serialized document tree in blob storage,
/// not the document itself.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct Note {
    pub id: String,
    pub topic_id: String,
    pub title: String,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct Flashcard {
    pub id: String,
    pub topic_id: String,
    pub question: String,
    pub answer: String,
    pub created_at: String,
}

/// AI-proposed card, not yet persisted.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct GeneratedFlashcard {
    pub question: String,
    pub answer: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct RecentTopic {
    pub id: String,
    pub name: String,
    pub last_opened_ms: i64,
}
