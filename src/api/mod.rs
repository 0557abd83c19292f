use crate::models::{Flashcard, GeneratedFlashcard, Note, Topic};
use crate::storage::TOKEN_KEY;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ApiErrorKind {
    Unauthorized,
    Network,
    Http,
    Parse,
}

#[derive(Clone, Debug)]
pub(crate) struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl ApiError {
    fn network(e: reqwest::Error) -> Self {
        Self {
            kind: ApiErrorKind::Network,
            message: e.to_string(),
        }
    }

    fn parse(e: impl std::fmt::Display) -> Self {
        Self {
            kind: ApiErrorKind::Parse,
            message: e.to_string(),
        }
    }

    fn unauthorized() -> Self {
        Self {
            kind: ApiErrorKind::Unauthorized,
            message: "Unauthorized".to_string(),
        }
    }

    fn http(status: reqwest::StatusCode, body: String, ctx: &str) -> Self {
        Self {
            kind: ApiErrorKind::Http,
            message: format!("{ctx} ({status}): {body}"),
        }
    }
}

impl ApiError {
    /// User-facing message; auth failures get a friendlier line than the raw
    /// transport text.
    pub fn display_message(&self) -> String {
        match self.kind {
            ApiErrorKind::Unauthorized => "Sessão expirada. Entre novamente.".to_string(),
            _ => self.message.clone(),
        }
    }
}

pub(crate) type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct EnvConfig {
    pub api_url: String,
}

impl EnvConfig {
    pub fn new() -> Self {
        let default_api_url = "http://localhost:6689".to_string();

        // Deployment injects `window.ENV.API_URL`; fall back to localhost.
        if let Some(window) = web_sys::window() {
            if let Some(env) = window.get("ENV") {
                if !env.is_undefined() && env.is_object() {
                    if let Ok(api_url) = js_sys::Reflect::get(&env, &"API_URL".into()) {
                        if let Some(url_str) = api_url.as_string() {
                            return Self { api_url: url_str };
                        }
                    }
                }
            }
        }

        Self {
            api_url: default_api_url,
        }
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn get_api_url() -> String {
    EnvConfig::new().api_url
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct CreateNoteRequest {
    #[serde(rename = "topic-id")]
    pub topic_id: String,
    pub title: String,
    /// Blob-storage URL of the serialized document tree.
    pub content: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct UpdateNoteRequest {
    #[serde(rename = "note-id")]
    pub note_id: String,
    pub title: String,
    /// Blob-storage URL of the serialized document tree.
    pub content: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct UpsertFlashcardRequest {
    #[serde(rename = "topic-id")]
    pub topic_id: String,

    /// Flashcard id (omit to create).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub question: String,
    pub answer: String,
}

#[derive(Clone)]
pub(crate) struct ApiClient {
    pub(crate) base_url: String,
    pub(crate) token: Option<String>,
}

impl ApiClient {
    #[allow(dead_code)]
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            token: None,
        }
    }

    pub fn load_from_storage() -> Self {
        let base_url = get_api_url();
        let token = leptos::web_sys::window()
            .and_then(|w| w.local_storage().ok().flatten())
            .and_then(|s| s.get_item(TOKEN_KEY).ok().flatten());

        Self { base_url, token }
    }

    fn with_auth_headers(
        mut req: reqwest::RequestBuilder,
        token: Option<String>,
    ) -> reqwest::RequestBuilder {
        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {}", token));
        }
        req
    }

    async fn request_api<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: Option<&impl serde::Serialize>,
    ) -> ApiResult<T> {
        let client = reqwest::Client::new();
        let url = format!("{}{}", self.base_url, path);
        let mut req = client.post(url);
        req = Self::with_auth_headers(req, self.token.clone());

        if let Some(b) = body {
            req = req.json(b);
        }

        let res = req.send().await.map_err(ApiError::network)?;

        if res.status().is_success() {
            res.json().await.map_err(ApiError::parse)
        } else if res.status().as_u16() == 401 {
            Err(ApiError::unauthorized())
        } else {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            Err(ApiError::http(status, body, "Request failed"))
        }
    }

    /* --------------------------- topics ----------------------------- */

    pub(crate) fn parse_topic_list_response(data: serde_json::Value) -> Vec<Topic> {
        let list = data
            .get("topic-list")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();

        let mut out: Vec<Topic> = Vec::with_capacity(list.len());
        for item in list {
            let get_s = |k: &str| item.get(k).and_then(|v| v.as_str()).map(|s| s.to_string());

            let id = get_s("id").unwrap_or_default();
            let name = get_s("name").unwrap_or_default();

            if !id.trim().is_empty() && !name.trim().is_empty() {
                out.push(Topic {
                    id,
                    module_id: get_s("module-id").unwrap_or_default(),
                    name,
                    description: get_s("description").unwrap_or_default(),
                    created_at: get_s("created-at").unwrap_or_default(),
                    updated_at: get_s("updated-at").unwrap_or_default(),
                });
            }
        }

        out
    }

    pub async fn get_topic_list(&self) -> ApiResult<Vec<Topic>> {
        let data: serde_json::Value = self
            .request_api("/revisa/get-topic-list", Some(&serde_json::json!({})))
            .await?;
        Ok(Self::parse_topic_list_response(data))
    }

    pub async fn get_topic(&self, topic_id: &str) -> ApiResult<Option<Topic>> {
        let data: serde_json::Value = self
            .request_api(
                "/revisa/get-topic",
                Some(&serde_json::json!({ "topic-id": topic_id })),
            )
            .await?;
        let wrapped = serde_json::json!({ "topic-list": [data.get("topic").cloned().unwrap_or(data)] });
        Ok(Self::parse_topic_list_response(wrapped).into_iter().next())
    }

    /* ---------------------------- notes ----------------------------- */

    pub(crate) fn parse_note_list_response(data: serde_json::Value) -> Vec<Note> {
        let list = data
            .get("note-list")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();

        let mut out: Vec<Note> = Vec::with_capacity(list.len());
        for item in list {
            let get_s = |k: &str| item.get(k).and_then(|v| v.as_str()).map(|s| s.to_string());

            let id = get_s("id").unwrap_or_default();
            let topic_id = get_s("topic-id").unwrap_or_default();

            if !id.trim().is_empty() && !topic_id.trim().is_empty() {
                out.push(Note {
                    id,
                    topic_id,
                    title: get_s("title").unwrap_or_default(),
                    content: get_s("content").unwrap_or_default(),
                    created_at: get_s("created-at").unwrap_or_default(),
                    updated_at: get_s("updated-at").unwrap_or_default(),
                });
            }
        }

        out
    }

    pub async fn get_note_list(&self, topic_id: &str) -> ApiResult<Vec<Note>> {
        let data: serde_json::Value = self
            .request_api(
                "/revisa/get-note-list",
                Some(&serde_json::json!({ "topic-id": topic_id })),
            )
            .await?;
        Ok(Self::parse_note_list_response(data))
    }

    pub async fn create_note(
        &self,
        topic_id: &str,
        title: &str,
        content_url: &str,
    ) -> ApiResult<Note> {
        let data: serde_json::Value = self
            .request_api(
                "/revisa/new-note",
                Some(&CreateNoteRequest {
                    topic_id: topic_id.to_string(),
                    title: title.to_string(),
                    content: content_url.to_string(),
                }),
            )
            .await?;

        let id = data
            .get("note")
            .and_then(|n| n.get("id"))
            .or_else(|| data.get("note-id"))
            .or_else(|| data.get("id"))
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        if id.trim().is_empty() {
            return Err(ApiError::parse(format!(
                "Create note succeeded but response is missing note id: {}",
                data
            )));
        }

        Ok(Note {
            id,
            topic_id: topic_id.to_string(),
            title: title.to_string(),
            content: content_url.to_string(),
            created_at: String::new(),
            updated_at: String::new(),
        })
    }

    pub async fn update_note(
        &self,
        note_id: &str,
        title: &str,
        content_url: &str,
    ) -> ApiResult<serde_json::Value> {
        self.request_api(
            "/revisa/update-note",
            Some(&UpdateNoteRequest {
                note_id: note_id.to_string(),
                title: title.to_string(),
                content: content_url.to_string(),
            }),
        )
        .await
    }

    pub async fn delete_note(&self, note_id: &str) -> ApiResult<serde_json::Value> {
        self.request_api(
            "/revisa/delete-note",
            Some(&serde_json::json!({ "note-id": note_id })),
        )
        .await
    }

    /* -------------------------- flashcards -------------------------- */

    pub(crate) fn parse_flashcard_list_response(data: serde_json::Value) -> Vec<Flashcard> {
        let list = data
            .get("flashcard-list")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();

        let mut out: Vec<Flashcard> = Vec::with_capacity(list.len());
        for item in list {
            let get_s = |k: &str| item.get(k).and_then(|v| v.as_str()).map(|s| s.to_string());

            let id = get_s("id").unwrap_or_default();
            let question = get_s("question").unwrap_or_default();

            if !id.trim().is_empty() && !question.trim().is_empty() {
                out.push(Flashcard {
                    id,
                    topic_id: get_s("topic-id").unwrap_or_default(),
                    question,
                    answer: get_s("answer").unwrap_or_default(),
                    created_at: get_s("created-at").unwrap_or_default(),
                });
            }
        }

        out
    }

    pub async fn get_flashcard_list(&self, topic_id: &str) -> ApiResult<Vec<Flashcard>> {
        let data: serde_json::Value = self
            .request_api(
                "/revisa/get-flashcard-list",
                Some(&serde_json::json!({ "topic-id": topic_id })),
            )
            .await?;
        Ok(Self::parse_flashcard_list_response(data))
    }

    pub async fn upsert_flashcard(
        &self,
        req_body: UpsertFlashcardRequest,
    ) -> ApiResult<serde_json::Value> {
        self.request_api("/revisa/upsert-flashcard", Some(&req_body))
            .await
    }

    pub async fn delete_flashcard(&self, flashcard_id: &str) -> ApiResult<serde_json::Value> {
        self.request_api(
            "/revisa/delete-flashcard",
            Some(&serde_json::json!({ "flashcard-id": flashcard_id })),
        )
        .await
    }

    /* ------------------------------ AI ------------------------------ */

    pub(crate) fn parse_generated_flashcards(data: serde_json::Value) -> Vec<GeneratedFlashcard> {
        data.get("flashcards")
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| {
                        let question = item.get("question")?.as_str()?.trim().to_string();
                        let answer = item.get("answer")?.as_str()?.trim().to_string();
                        if question.is_empty() || answer.is_empty() {
                            return None;
                        }
                        Some(GeneratedFlashcard { question, answer })
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub async fn generate_flashcards(&self, content: &str) -> ApiResult<Vec<GeneratedFlashcard>> {
        let data: serde_json::Value = self
            .request_api(
                "/ai/generate-flashcards",
                Some(&serde_json::json!({ "content": content })),
            )
            .await?;
        Ok(Self::parse_generated_flashcards(data))
    }

    pub async fn summarize_note(&self, content: &str) -> ApiResult<String> {
        let data: serde_json::Value = self
            .request_api(
                "/ai/summarize-note",
                Some(&serde_json::json!({ "content": content })),
            )
            .await?;
        data.get("summary")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| ApiError::parse("Summary response is missing `summary`"))
    }

    #[allow(dead_code)]
    pub async fn generate_quiz_options(
        &self,
        question: &str,
        answer: &str,
    ) -> ApiResult<Vec<String>> {
        let data: serde_json::Value = self
            .request_api(
                "/ai/generate-quiz-options",
                Some(&serde_json::json!({ "question": question, "answer": answer })),
            )
            .await?;
        Ok(data
            .get("options")
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str())
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default())
    }

    /* --------------------------- storage ---------------------------- */

    /// Uploads raw bytes under the given bucket/key and returns the durable
    /// public URL. Accepts `{"url": ...}` responses; otherwise derives the
    /// canonical public path.
    pub async fn upload_blob(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> ApiResult<String> {
        let client = reqwest::Client::new();
        let url = format!("{}/storage/{}/{}", self.base_url, bucket, key);
        let mut req = client
            .post(url.clone())
            .header("Content-Type", content_type)
            .body(bytes);
        req = Self::with_auth_headers(req, self.token.clone());

        let res = req.send().await.map_err(ApiError::network)?;
        if res.status().as_u16() == 401 {
            return Err(ApiError::unauthorized());
        }
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(ApiError::http(status, body, "Upload failed"));
        }
        let data: serde_json::Value = res.json().await.unwrap_or_default();
        Ok(data
            .get("url")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .unwrap_or(url))
    }

    /// Fetches a JSON document from an absolute URL (note content in blob
    /// storage lives outside the API base).
    pub async fn fetch_json(&self, url: &str) -> ApiResult<serde_json::Value> {
        let client = reqwest::Client::new();
        let res = client.get(url).send().await.map_err(ApiError::network)?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(ApiError::http(status, body, "Fetch failed"));
        }
        res.json().await.map_err(ApiError::parse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_topic_list_skips_entries_without_id_or_name() {
        let data = json!({
            "topic-list": [
                {"id": "t1", "module-id": "m1", "name": "Fotossíntese"},
                {"id": "", "name": "sem id"},
                {"id": "t2", "name": "  "},
                {"name": "sem id nenhum"}
            ]
        });
        let topics = ApiClient::parse_topic_list_response(data);
        assert_eq!(topics.len(), 1);
        assert_eq!(topics[0].id, "t1");
        assert_eq!(topics[0].module_id, "m1");
    }

    #[test]
    fn test_parse_topic_list_tolerates_missing_list() {
        assert!(ApiClient::parse_topic_list_response(json!({})).is_empty());
        assert!(ApiClient::parse_topic_list_response(json!({"topic-list": "nope"})).is_empty());
    }

    #[test]
    fn test_parse_note_list_requires_topic_binding() {
        let data = json!({
            "note-list": [
                {"id": "n1", "topic-id": "t1", "title": "Resumo", "content": "https://blob/x.json"},
                {"id": "n2", "title": "órfã"}
            ]
        });
        let notes = ApiClient::parse_note_list_response(data);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].content, "https://blob/x.json");
    }

    #[test]
    fn test_update_note_request_serializes_kebab_keys() {
        let req = UpdateNoteRequest {
            note_id: "n1".to_string(),
            title: "Resumo revisado".to_string(),
            content: "https://blob/y.json".to_string(),
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value.get("note-id").and_then(|v| v.as_str()), Some("n1"));
        assert!(value.get("note_id").is_none());
        assert_eq!(
            value.get("content").and_then(|v| v.as_str()),
            Some("https://blob/y.json")
        );
    }

    #[test]
    fn test_parse_flashcard_list() {
        let data = json!({
            "flashcard-list": [
                {"id": "f1", "topic-id": "t1", "question": "O que é clorofila?", "answer": "Pigmento"},
                {"id": "f2", "topic-id": "t1", "question": ""}
            ]
        });
        let cards = ApiClient::parse_flashcard_list_response(data);
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].answer, "Pigmento");
    }

    #[test]
    fn test_parse_generated_flashcards_drops_malformed_items() {
        let data = json!({
            "flashcards": [
                {"question": "Q1", "answer": "A1"},
                {"question": "Q2"},
                {"question": " ", "answer": "A3"},
                "texto solto"
            ]
        });
        let cards = ApiClient::parse_generated_flashcards(data);
        assert_eq!(
            cards,
            vec![GeneratedFlashcard {
                question: "Q1".into(),
                answer: "A1".into()
            }]
        );
    }
}
