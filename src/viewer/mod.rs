use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::components::ui::{Alert, AlertVariant, Spinner};
use crate::doc::Doc;
use crate::render::doc_view;
use crate::state::AppContext;

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum ViewerError {
    /// The note record does not point at an HTTP(S) resource.
    InvalidUrl,
    /// The payload arrived but is not a readable document.
    Corrupt,
    Transport(String),
}

impl ViewerError {
    pub fn message(&self) -> String {
        match self {
            ViewerError::InvalidUrl => "Endereço de conteúdo inválido.".to_string(),
            ViewerError::Corrupt => {
                "O conteúdo desta nota está corrompido ou vazio.".to_string()
            }
            ViewerError::Transport(msg) => {
                format!("Não foi possível carregar a nota: {msg}")
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum ViewerPhase {
    Loading,
    Ready(Doc),
    Failed(ViewerError),
}

pub(crate) fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Corrupt means the payload parsed to nothing renderable. This is distinct
/// from a transport failure: the bytes arrived, they just are not a document.
pub(crate) fn classify_document(value: &serde_json::Value) -> Result<Doc, ViewerError> {
    match Doc::from_json(value) {
        Some(doc) if !doc.nodes.is_empty() => Ok(doc),
        _ => Err(ViewerError::Corrupt),
    }
}

/// Read-only renderer for a persisted document tree. One live view per
/// instance: switching `content_url` tears the previous view down before the
/// new fetch starts, and stale responses are discarded by request id.
#[component]
pub(crate) fn NoteViewer(#[prop(into)] content_url: Signal<String>) -> impl IntoView {
    let ctx = expect_context::<AppContext>();
    let phase = RwSignal::new(ViewerPhase::Loading);
    let request_id = StoredValue::new(0u64);

    Effect::new(move |_| {
        let url = content_url.get();
        let id = request_id.with_value(|v| *v) + 1;
        request_id.set_value(id);
        phase.set(ViewerPhase::Loading);

        if !is_http_url(&url) {
            phase.set(ViewerPhase::Failed(ViewerError::InvalidUrl));
            return;
        }

        let api = ctx.0.api_client.get_untracked();
        spawn_local(async move {
            let result = api.fetch_json(&url).await;
            if request_id.with_value(|v| *v) != id {
                return;
            }
            match result {
                Ok(value) => match classify_document(&value) {
                    Ok(doc) => phase.set(ViewerPhase::Ready(doc)),
                    Err(err) => phase.set(ViewerPhase::Failed(err)),
                },
                Err(e) => {
                    phase.set(ViewerPhase::Failed(ViewerError::Transport(e.display_message())))
                }
            }
        });
    });

    on_cleanup(move || {
        // unmount drops interest in any in-flight fetch
        request_id.set_value(u64::MAX);
    });

    view! {
        <div class="min-h-16">
            {move || {
                phase
                    .with(|p| match p {
                        ViewerPhase::Loading => {
                            view! {
                                <div class="flex items-center gap-2 py-4 text-sm text-muted-foreground">
                                    <Spinner />
                                    "Carregando nota..."
                                </div>
                            }
                                .into_any()
                        }
                        ViewerPhase::Failed(err) => {
                            let message = err.message();
                            view! {
                                <Alert variant=AlertVariant::Destructive>
                                    {message}
                                </Alert>
                            }
                                .into_any()
                        }
                        ViewerPhase::Ready(doc) => {
                            view! { <div class="prose-sm max-w-none">{doc_view(doc)}</div> }
                                .into_any()
                        }
                    })
            }}
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_only_http_urls_are_accepted() {
        assert!(is_http_url("https://blob.example.com/a.json"));
        assert!(is_http_url("http://localhost:6689/x"));
        assert!(!is_http_url("ftp://blob/a.json"));
        assert!(!is_http_url("nota.json"));
        assert!(!is_http_url(""));
    }

    #[test]
    fn test_valid_document_is_ready() {
        let value = json!({
            "type": "doc",
            "content": [{"type": "paragraph", "content": [{"type": "text", "text": "ok"}]}]
        });
        let doc = classify_document(&value).unwrap();
        assert_eq!(doc.plain_text(), "ok");
    }

    #[test]
    fn test_garbage_payload_is_corrupt_not_transport() {
        assert_eq!(
            classify_document(&json!({"html": "<p>antigo</p>"})),
            Err(ViewerError::Corrupt)
        );
        // parses as a doc but every node is unknown
        assert_eq!(
            classify_document(&json!({"type": "doc", "content": [{"type": "widget"}]})),
            Err(ViewerError::Corrupt)
        );
    }

    #[test]
    fn test_empty_paragraph_doc_is_still_readable() {
        let value = json!({"type": "doc", "content": [{"type": "paragraph"}]});
        assert!(classify_document(&value).is_ok());
    }
}
