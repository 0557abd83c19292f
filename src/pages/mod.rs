use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::hooks::{use_navigate, use_params};
use leptos_router::params::Params;

use crate::components::ui::{
    Alert, AlertDescription, AlertVariant, Button, ButtonSize, ButtonVariant, Card,
    CardDescription, CardHeader, CardTitle, Dialog, DialogBody, DialogDescription, DialogFooter,
    DialogHeader, DialogTitle, Input, Label, Spinner, Textarea,
};
use crate::doc::Doc;
use crate::editor::RichTextEditor;
use crate::models::{Flashcard, GeneratedFlashcard, Note, Topic};
use crate::state::AppContext;
use crate::storage::{load_recent_topics, write_recent_topic};
use crate::viewer::{classify_document, is_http_url, NoteViewer, ViewerError};

/// Minimum plain-text length before the AI endpoints are worth calling.
const SUMMARY_MIN_CHARS: usize = 50;
const FLASHCARD_MIN_CHARS: usize = 100;

fn load_topics(app: AppContext) {
    if app.0.topics_loading.get_untracked() {
        return;
    }
    app.0.topics_loading.set(true);
    app.0.topics_error.set(None);
    let api = app.0.api_client.get_untracked();
    spawn_local(async move {
        match api.get_topic_list().await {
            Ok(topics) => app.0.topics.set(topics),
            Err(e) => app.0.topics_error.set(Some(e.display_message())),
        }
        app.0.topics_loading.set(false);
    });
}

/// Loads notes and flashcards for a topic. Re-entrant: a newer request
/// invalidates the results of any older one still in flight.
fn load_topic_content(app: AppContext, topic_id: String) {
    if app
        .0
        .notes_last_loaded_topic_id
        .get_untracked()
        .as_deref()
        == Some(topic_id.as_str())
    {
        return;
    }
    app.0
        .notes_last_loaded_topic_id
        .set(Some(topic_id.clone()));

    let request_id = app.0.notes_request_id.get_untracked() + 1;
    app.0.notes_request_id.set(request_id);
    app.0.notes.set(vec![]);
    app.0.flashcards.set(vec![]);
    app.0.notes_loading.set(true);
    app.0.notes_error.set(None);
    app.0.flashcards_loading.set(true);

    let api = app.0.api_client.get_untracked();
    spawn_local(async move {
        let notes = api.get_note_list(&topic_id).await;
        let cards = api.get_flashcard_list(&topic_id).await;
        if app.0.notes_request_id.get_untracked() != request_id {
            return;
        }
        match notes {
            Ok(notes) => app.0.notes.set(notes),
            Err(e) => app.0.notes_error.set(Some(e.display_message())),
        }
        if let Ok(cards) = cards {
            app.0.flashcards.set(cards);
        }
        app.0.notes_loading.set(false);
        app.0.flashcards_loading.set(false);
    });
}

fn reload_flashcards(app: AppContext, topic_id: String) {
    let api = app.0.api_client.get_untracked();
    spawn_local(async move {
        if let Ok(cards) = api.get_flashcard_list(&topic_id).await {
            app.0.flashcards.set(cards);
        }
    });
}

/// Swaps the edited note's record in place, keeping list order.
fn apply_note_update(notes: &mut [Note], id: &str, title: &str, content_url: &str) {
    if let Some(note) = notes.iter_mut().find(|n| n.id == id) {
        note.title = title.to_string();
        note.content = content_url.to_string();
    }
}

/// Pulls the persisted document behind a note and flattens it to plain text
/// for the AI endpoints. Errors come back as display-ready messages.
async fn fetch_note_plain_text(app: AppContext, content_url: String) -> Result<String, String> {
    if !is_http_url(&content_url) {
        return Err(ViewerError::InvalidUrl.message());
    }
    let api = app.0.api_client.get_untracked();
    let value = api
        .fetch_json(&content_url)
        .await
        .map_err(|e| e.display_message())?;
    match classify_document(&value) {
        Ok(doc) => Ok(doc.plain_text()),
        Err(e) => Err(e.message()),
    }
}

#[component]
pub(crate) fn TopicListPage() -> impl IntoView {
    let app = expect_context::<AppContext>();
    let navigate = StoredValue::new(use_navigate());
    let recents = StoredValue::new(load_recent_topics());

    Effect::new(move |_| {
        if app.0.topics.get_untracked().is_empty() {
            load_topics(app);
        }
    });

    view! {
        <div class="mx-auto max-w-3xl space-y-4 px-4 py-8">
            <div class="space-y-1">
                <h1 class="text-xl font-semibold">"Tópicos de estudo"</h1>
                <p class="text-sm text-muted-foreground">
                    "Escolha um tópico para ver notas e flashcards."
                </p>
            </div>

            <Show when=move || !recents.with_value(|r| r.is_empty())>
                <div class="flex flex-wrap items-center gap-2 text-xs">
                    <span class="text-muted-foreground">"Recentes:"</span>
                    {recents
                        .with_value(|r| r.clone())
                        .into_iter()
                        .map(|t| {
                            let href = format!("/topic/{}", t.id);
                            view! {
                                <a
                                    class="rounded-full border px-2 py-0.5 hover:bg-accent/50"
                                    href=href
                                >
                                    {t.name}
                                </a>
                            }
                        })
                        .collect_view()}
                </div>
            </Show>

            <Show when=move || app.0.topics_loading.get()>
                <div class="flex items-center gap-2 py-4 text-sm text-muted-foreground">
                    <Spinner />
                    "Carregando tópicos..."
                </div>
            </Show>

            <Show when=move || app.0.topics_error.get().is_some()>
                <Alert variant=AlertVariant::Destructive>
                    <AlertDescription>
                        {move || app.0.topics_error.get().unwrap_or_default()}
                    </AlertDescription>
                </Alert>
            </Show>

            <Show when=move || {
                !app.0.topics_loading.get() && app.0.topics_error.get().is_none()
                    && app.0.topics.get().is_empty()
            }>
                <div class="text-sm text-muted-foreground">"Nenhum tópico cadastrado."</div>
            </Show>

            <div class="grid gap-3 sm:grid-cols-2">
                {move || {
                    app.0
                        .topics
                        .get()
                        .into_iter()
                        .map(|topic| {
                            let id = topic.id.clone();
                            view! {
                                <Card
                                    class="cursor-pointer transition-colors hover:ring-1 hover:ring-border"
                                    on:click=move |_| {
                                        navigate
                                            .with_value(|nav| {
                                                nav(&format!("/topic/{}", id), Default::default());
                                            });
                                    }
                                >
                                    <CardHeader class="p-4">
                                        <CardTitle class="truncate text-sm">{topic.name.clone()}</CardTitle>
                                        <CardDescription class="line-clamp-2 text-xs">
                                            {topic.description.clone()}
                                        </CardDescription>
                                    </CardHeader>
                                </Card>
                            }
                        })
                        .collect_view()
                }}
            </div>
        </div>
    }
}

#[derive(Params, PartialEq, Clone, Debug)]
pub(crate) struct TopicRouteParams {
    pub id: Option<String>,
}

#[component]
pub(crate) fn TopicPage() -> impl IntoView {
    let app = expect_context::<AppContext>();
    let params = use_params::<TopicRouteParams>();
    let topic_id = move || params.get().ok().and_then(|p| p.id).unwrap_or_default();

    let topic: RwSignal<Option<Topic>> = RwSignal::new(None);

    // Resolve the topic header and kick off content loading per route change.
    Effect::new(move |_| {
        let id = topic_id();
        if id.trim().is_empty() {
            return;
        }
        load_topic_content(app, id.clone());

        let known = app
            .0
            .topics
            .get_untracked()
            .into_iter()
            .find(|t| t.id == id);
        match known {
            Some(t) => {
                write_recent_topic(&t.id, &t.name);
                topic.set(Some(t));
            }
            None => {
                let api = app.0.api_client.get_untracked();
                spawn_local(async move {
                    if let Ok(Some(t)) = api.get_topic(&id).await {
                        write_recent_topic(&t.id, &t.name);
                        topic.set(Some(t));
                    }
                });
            }
        }
    });

    view! {
        <div class="mx-auto max-w-3xl space-y-8 px-4 py-8">
            <div class="space-y-1">
                <a class="text-xs text-muted-foreground hover:text-foreground" href="/">
                    "← Tópicos"
                </a>
                <h1 class="text-xl font-semibold">
                    {move || topic.get().map(|t| t.name).unwrap_or_else(|| "...".to_string())}
                </h1>
                <Show when=move || topic.get().map(|t| !t.description.is_empty()).unwrap_or(false)>
                    <p class="text-sm text-muted-foreground">
                        {move || topic.get().map(|t| t.description).unwrap_or_default()}
                    </p>
                </Show>
            </div>

            <NotesSection topic_id=Signal::derive(topic_id) />
            <FlashcardsSection topic_id=Signal::derive(topic_id) />
        </div>
    }
}

#[component]
fn NotesSection(#[prop(into)] topic_id: Signal<String>) -> impl IntoView {
    let app = expect_context::<AppContext>();
    let open_note_id: RwSignal<Option<String>> = RwSignal::new(None);
    let create_open = RwSignal::new(false);
    let edit_open = RwSignal::new(false);
    let edit_target: RwSignal<Option<Note>> = RwSignal::new(None);
    let delete_target: RwSignal<Option<Note>> = RwSignal::new(None);
    let delete_open = RwSignal::new(false);
    let deleting = RwSignal::new(false);

    let on_confirm_delete = move |_| {
        let Some(note) = delete_target.get_untracked() else {
            return;
        };
        deleting.set(true);
        let api = app.0.api_client.get_untracked();
        spawn_local(async move {
            if api.delete_note(&note.id).await.is_ok() {
                app.0.notes.update(|notes| notes.retain(|n| n.id != note.id));
            }
            deleting.set(false);
            delete_open.set(false);
            delete_target.set(None);
        });
    };

    view! {
        <section class="space-y-3">
            <div class="flex items-center justify-between">
                <h2 class="text-base font-semibold">"Notas"</h2>
                <Button size=ButtonSize::Sm on:click=move |_| create_open.set(true)>
                    "Nova nota"
                </Button>
            </div>

            <Show when=move || app.0.notes_loading.get()>
                <div class="flex items-center gap-2 py-2 text-sm text-muted-foreground">
                    <Spinner />
                    "Carregando notas..."
                </div>
            </Show>

            <Show when=move || app.0.notes_error.get().is_some()>
                <Alert variant=AlertVariant::Destructive>
                    <AlertDescription>
                        {move || app.0.notes_error.get().unwrap_or_default()}
                    </AlertDescription>
                </Alert>
            </Show>

            <Show when=move || {
                !app.0.notes_loading.get() && app.0.notes_error.get().is_none()
                    && app.0.notes.get().is_empty()
            }>
                <div class="text-sm text-muted-foreground">"Nenhuma nota neste tópico."</div>
            </Show>

            <div class="space-y-2">
                {move || {
                    app.0
                        .notes
                        .get()
                        .into_iter()
                        .map(|note| {
                            let note_for_edit = note.clone();
                            let note_for_delete = note.clone();
                            let id = note.id.clone();
                            let id_for_toggle = id.clone();
                            let expanded = Signal::derive(move || {
                                open_note_id.get().as_deref() == Some(id.as_str())
                            });
                            let content = note.content.clone();
                            view! {
                                <div class="rounded-lg border">
                                    <div class="flex items-center justify-between px-4 py-2">
                                        <button
                                            type="button"
                                            class="flex-1 truncate text-left text-sm font-medium"
                                            on:click=move |_| {
                                                open_note_id
                                                    .update(|open| {
                                                        *open = if open.as_deref()
                                                            == Some(id_for_toggle.as_str())
                                                        {
                                                            None
                                                        } else {
                                                            Some(id_for_toggle.clone())
                                                        };
                                                    });
                                            }
                                        >
                                            {note.title.clone()}
                                        </button>
                                        <div class="flex items-center gap-1">
                                            <SummarizeButton content_url=note.content.clone() />
                                            <GenerateFlashcardsButton
                                                topic_id=topic_id
                                                content_url=note.content.clone()
                                            />
                                            <Button
                                                variant=ButtonVariant::Ghost
                                                size=ButtonSize::Sm
                                                on:click=move |_| {
                                                    edit_target.set(Some(note_for_edit.clone()));
                                                    edit_open.set(true);
                                                }
                                            >
                                                "Editar"
                                            </Button>
                                            <Button
                                                variant=ButtonVariant::Ghost
                                                size=ButtonSize::Sm
                                                class="text-destructive"
                                                on:click=move |_| {
                                                    delete_target.set(Some(note_for_delete.clone()));
                                                    delete_open.set(true);
                                                }
                                            >
                                                "Excluir"
                                            </Button>
                                        </div>
                                    </div>
                                    <Show when=move || expanded.get()>
                                        {
                                            let content = content.clone();
                                            view! {
                                                <div class="border-t px-4 py-2">
                                                    <NoteViewer content_url=Signal::derive(move || {
                                                        content.clone()
                                                    }) />
                                                </div>
                                            }
                                        }
                                    </Show>
                                </div>
                            }
                        })
                        .collect_view()
                }}
            </div>

            <CreateNoteDialog open=create_open topic_id=topic_id />
            <EditNoteDialog open=edit_open target=edit_target />

            <Dialog open=delete_open>
                <DialogHeader>
                    <DialogTitle>"Excluir nota"</DialogTitle>
                    <DialogDescription>
                        {move || {
                            delete_target
                                .get()
                                .map(|n| format!("Excluir \"{}\"? Esta ação não pode ser desfeita.", n.title))
                                .unwrap_or_default()
                        }}
                    </DialogDescription>
                </DialogHeader>
                <DialogFooter class="mt-4">
                    <Button
                        variant=ButtonVariant::Outline
                        on:click=move |_| delete_open.set(false)
                    >
                        "Cancelar"
                    </Button>
                    <Button
                        variant=ButtonVariant::Destructive
                        attr:disabled=move || deleting.get()
                        on:click=on_confirm_delete
                    >
                        {move || if deleting.get() { "Excluindo..." } else { "Excluir" }}
                    </Button>
                </DialogFooter>
            </Dialog>
        </section>
    }
}

#[component]
fn CreateNoteDialog(
    #[prop(into)] open: RwSignal<bool>,
    #[prop(into)] topic_id: Signal<String>,
) -> impl IntoView {
    let app = expect_context::<AppContext>();
    let title: RwSignal<String> = RwSignal::new(String::new());
    let draft_json: RwSignal<String> = RwSignal::new(Doc::empty().to_json().to_string());
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let saving = RwSignal::new(false);

    let on_save = move |_| {
        let title_val = title.get_untracked().trim().to_string();
        if title_val.is_empty() {
            error.set(Some("O título é obrigatório.".to_string()));
            return;
        }
        let doc_value = serde_json::from_str::<serde_json::Value>(&draft_json.get_untracked())
            .unwrap_or_else(|_| Doc::empty().to_json());
        let tid = topic_id.get_untracked();

        saving.set(true);
        error.set(None);
        let api = app.0.api_client.get_untracked();
        spawn_local(async move {
            let result = match crate::assets::upload_note_document(&api, &doc_value).await {
                Ok(url) => api.create_note(&tid, &title_val, &url).await,
                Err(e) => Err(e),
            };
            saving.set(false);
            match result {
                Ok(note) => {
                    app.0.notes.update(|notes| notes.insert(0, note));
                    title.set(String::new());
                    draft_json.set(Doc::empty().to_json().to_string());
                    open.set(false);
                }
                Err(e) => error.set(Some(e.display_message())),
            }
        });
    };

    view! {
        <Dialog open=open class="max-w-2xl">
            <DialogHeader>
                <DialogTitle>"Nova nota"</DialogTitle>
            </DialogHeader>
            <DialogBody class="mt-4">
                <div class="flex flex-col gap-1.5">
                    <Label html_for="note_title" class="text-xs">"Título"</Label>
                    <Input id="note_title" bind_value=title placeholder="Título da nota" />
                </div>

                <RichTextEditor on_change=Callback::new(move |json: String| {
                    draft_json.set(json);
                }) />

                <Show when=move || error.get().is_some()>
                    <Alert variant=AlertVariant::Destructive>
                        <AlertDescription>{move || error.get().unwrap_or_default()}</AlertDescription>
                    </Alert>
                </Show>
            </DialogBody>
            <DialogFooter class="mt-4">
                <Button variant=ButtonVariant::Outline on:click=move |_| open.set(false)>
                    "Cancelar"
                </Button>
                <Button attr:disabled=move || saving.get() on:click=on_save>
                    <span class="inline-flex items-center gap-2">
                        <Show when=move || saving.get()>
                            <Spinner />
                        </Show>
                        {move || if saving.get() { "Salvando..." } else { "Salvar" }}
                    </span>
                </Button>
            </DialogFooter>
        </Dialog>
    }
}

/// Edits an existing note: the stored tree is pulled back into the editor and
/// a fresh document blob replaces the old one on save.
#[component]
fn EditNoteDialog(
    #[prop(into)] open: RwSignal<bool>,
    target: RwSignal<Option<Note>>,
) -> impl IntoView {
    let app = expect_context::<AppContext>();
    let title: RwSignal<String> = RwSignal::new(String::new());
    let draft_json: RwSignal<String> = RwSignal::new(String::new());
    let initial: RwSignal<Option<serde_json::Value>> = RwSignal::new(None);
    let load_error: RwSignal<Option<String>> = RwSignal::new(None);
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let saving = RwSignal::new(false);

    // Fetch the stored tree whenever a note enters the dialog. A response for
    // a note that is no longer the target is dropped.
    Effect::new(move |_| {
        let Some(note) = target.get() else {
            return;
        };
        title.set(note.title.clone());
        initial.set(None);
        load_error.set(None);
        error.set(None);
        draft_json.set(String::new());

        if !is_http_url(&note.content) {
            load_error.set(Some(ViewerError::InvalidUrl.message()));
            return;
        }
        let url = note.content.clone();
        let note_id = note.id.clone();
        let api = app.0.api_client.get_untracked();
        spawn_local(async move {
            let result = api.fetch_json(&url).await;
            if target.get_untracked().map(|n| n.id).as_deref() != Some(note_id.as_str()) {
                return;
            }
            match result {
                Ok(value) => match classify_document(&value) {
                    Ok(doc) => {
                        draft_json.set(doc.to_json().to_string());
                        initial.set(Some(doc.to_json()));
                    }
                    Err(e) => load_error.set(Some(e.message())),
                },
                Err(e) => load_error.set(Some(e.display_message())),
            }
        });
    });

    let on_save = move |_| {
        let Some(note) = target.get_untracked() else {
            return;
        };
        let title_val = title.get_untracked().trim().to_string();
        if title_val.is_empty() {
            error.set(Some("O título é obrigatório.".to_string()));
            return;
        }
        let Ok(doc_value) =
            serde_json::from_str::<serde_json::Value>(&draft_json.get_untracked())
        else {
            return;
        };

        saving.set(true);
        error.set(None);
        let api = app.0.api_client.get_untracked();
        spawn_local(async move {
            let result = match crate::assets::upload_note_document(&api, &doc_value).await {
                Ok(url) => api.update_note(&note.id, &title_val, &url).await.map(|_| url),
                Err(e) => Err(e),
            };
            saving.set(false);
            match result {
                Ok(url) => {
                    app.0.notes.update(|notes| {
                        apply_note_update(notes, &note.id, &title_val, &url);
                    });
                    target.set(None);
                    open.set(false);
                }
                Err(e) => error.set(Some(e.display_message())),
            }
        });
    };

    view! {
        <Dialog open=open class="max-w-2xl">
            <DialogHeader>
                <DialogTitle>"Editar anotação"</DialogTitle>
            </DialogHeader>
            <DialogBody class="mt-4">
                <div class="flex flex-col gap-1.5">
                    <Label html_for="edit_note_title" class="text-xs">"Título"</Label>
                    <Input id="edit_note_title" bind_value=title placeholder="Título da nota" />
                </div>

                <Show when=move || load_error.get().is_some()>
                    <Alert variant=AlertVariant::Destructive>
                        <AlertDescription>
                            {move || load_error.get().unwrap_or_default()}
                        </AlertDescription>
                    </Alert>
                </Show>
                <Show when=move || {
                    load_error.get().is_none() && initial.with(|i| i.is_none())
                }>
                    <div class="flex items-center gap-2 py-2 text-sm text-muted-foreground">
                        <Spinner />
                        "Carregando nota..."
                    </div>
                </Show>
                {move || {
                    initial
                        .get()
                        .map(|value| {
                            view! {
                                <RichTextEditor
                                    initial=value
                                    on_change=Callback::new(move |json: String| {
                                        draft_json.set(json);
                                    })
                                />
                            }
                        })
                }}

                <Show when=move || error.get().is_some()>
                    <Alert variant=AlertVariant::Destructive>
                        <AlertDescription>{move || error.get().unwrap_or_default()}</AlertDescription>
                    </Alert>
                </Show>
            </DialogBody>
            <DialogFooter class="mt-4">
                <Button variant=ButtonVariant::Outline on:click=move |_| open.set(false)>
                    "Cancelar"
                </Button>
                <Button
                    attr:disabled=move || saving.get() || initial.with(|i| i.is_none())
                    on:click=on_save
                >
                    <span class="inline-flex items-center gap-2">
                        <Show when=move || saving.get()>
                            <Spinner />
                        </Show>
                        {move || if saving.get() { "Salvando..." } else { "Salvar" }}
                    </span>
                </Button>
            </DialogFooter>
        </Dialog>
    }
}

#[component]
fn SummarizeButton(#[prop(into)] content_url: String) -> impl IntoView {
    let app = expect_context::<AppContext>();
    let open = RwSignal::new(false);
    let loading = RwSignal::new(false);
    let summary: RwSignal<Option<String>> = RwSignal::new(None);
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let content_url = StoredValue::new(content_url);

    let on_summarize = move |_| {
        open.set(true);
        loading.set(true);
        summary.set(None);
        error.set(None);
        let url = content_url.with_value(|u| u.clone());
        spawn_local(async move {
            let result = async {
                let text = fetch_note_plain_text(app, url).await?;
                if text.chars().count() < SUMMARY_MIN_CHARS {
                    return Err(
                        "A nota é muito curta para resumir. Escreva um pouco mais primeiro."
                            .to_string(),
                    );
                }
                let api = app.0.api_client.get_untracked();
                api.summarize_note(&text).await.map_err(|e| e.display_message())
            }
            .await;
            loading.set(false);
            match result {
                Ok(s) => summary.set(Some(s)),
                Err(e) => error.set(Some(e)),
            }
        });
    };

    view! {
        <Button variant=ButtonVariant::Ghost size=ButtonSize::Sm on:click=on_summarize>
            "Resumir"
        </Button>

        <Dialog open=open>
            <DialogHeader>
                <DialogTitle>"Resumo da nota"</DialogTitle>
            </DialogHeader>
            <DialogBody class="mt-4">
                <Show when=move || loading.get()>
                    <div class="flex items-center gap-2 py-2 text-sm text-muted-foreground">
                        <Spinner />
                        "Gerando resumo..."
                    </div>
                </Show>
                <Show when=move || error.get().is_some()>
                    <Alert variant=AlertVariant::Destructive>
                        <AlertDescription>{move || error.get().unwrap_or_default()}</AlertDescription>
                    </Alert>
                </Show>
                <Show when=move || summary.get().is_some()>
                    <p class="whitespace-pre-wrap text-sm leading-relaxed">
                        {move || summary.get().unwrap_or_default()}
                    </p>
                </Show>
            </DialogBody>
            <DialogFooter class="mt-4">
                <Button variant=ButtonVariant::Outline on:click=move |_| open.set(false)>
                    "Fechar"
                </Button>
            </DialogFooter>
        </Dialog>
    }
}

#[component]
fn GenerateFlashcardsButton(
    #[prop(into)] topic_id: Signal<String>,
    #[prop(into)] content_url: String,
) -> impl IntoView {
    let app = expect_context::<AppContext>();
    let open = RwSignal::new(false);
    let loading = RwSignal::new(false);
    let saving = RwSignal::new(false);
    let cards: RwSignal<Vec<GeneratedFlashcard>> = RwSignal::new(vec![]);
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let content_url = StoredValue::new(content_url);

    let on_generate = move |_| {
        open.set(true);
        loading.set(true);
        cards.set(vec![]);
        error.set(None);
        let url = content_url.with_value(|u| u.clone());
        spawn_local(async move {
            let result = async {
                let text = fetch_note_plain_text(app, url).await?;
                if text.chars().count() < FLASHCARD_MIN_CHARS {
                    return Err(
                        "A nota é muito curta para gerar flashcards. Escreva um pouco mais primeiro."
                            .to_string(),
                    );
                }
                let api = app.0.api_client.get_untracked();
                api.generate_flashcards(&text).await.map_err(|e| e.display_message())
            }
            .await;
            loading.set(false);
            match result {
                Ok(generated) if generated.is_empty() => {
                    error.set(Some("Nenhum flashcard foi gerado para esta nota.".to_string()));
                }
                Ok(generated) => cards.set(generated),
                Err(e) => error.set(Some(e)),
            }
        });
    };

    let on_save_all = move |_| {
        let to_save = cards.get_untracked();
        if to_save.is_empty() {
            return;
        }
        let tid = topic_id.get_untracked();
        saving.set(true);
        let api = app.0.api_client.get_untracked();
        spawn_local(async move {
            let mut failed = false;
            for card in to_save {
                let req = crate::api::UpsertFlashcardRequest {
                    topic_id: tid.clone(),
                    id: None,
                    question: card.question,
                    answer: card.answer,
                };
                if api.upsert_flashcard(req).await.is_err() {
                    failed = true;
                }
            }
            saving.set(false);
            if failed {
                error.set(Some("Alguns flashcards não puderam ser salvos.".to_string()));
            } else {
                open.set(false);
            }
            reload_flashcards(app, tid);
        });
    };

    view! {
        <Button variant=ButtonVariant::Ghost size=ButtonSize::Sm on:click=on_generate>
            "Gerar flashcards"
        </Button>

        <Dialog open=open class="max-w-2xl">
            <DialogHeader>
                <DialogTitle>"Flashcards sugeridos"</DialogTitle>
                <DialogDescription>
                    "Revise as sugestões antes de salvar no tópico."
                </DialogDescription>
            </DialogHeader>
            <DialogBody class="mt-4">
                <Show when=move || loading.get()>
                    <div class="flex items-center gap-2 py-2 text-sm text-muted-foreground">
                        <Spinner />
                        "Gerando flashcards..."
                    </div>
                </Show>
                <Show when=move || error.get().is_some()>
                    <Alert variant=AlertVariant::Destructive>
                        <AlertDescription>{move || error.get().unwrap_or_default()}</AlertDescription>
                    </Alert>
                </Show>
                <div class="max-h-80 space-y-2 overflow-y-auto">
                    {move || {
                        cards
                            .get()
                            .into_iter()
                            .enumerate()
                            .map(|(i, card)| {
                                view! {
                                    <div class="rounded-md border p-3">
                                        <div class="flex items-start justify-between gap-2">
                                            <div class="space-y-1">
                                                <div class="text-sm font-medium">{card.question}</div>
                                                <div class="text-sm text-muted-foreground">{card.answer}</div>
                                            </div>
                                            <Button
                                                variant=ButtonVariant::Ghost
                                                size=ButtonSize::Sm
                                                on:click=move |_| {
                                                    cards.update(|c| {
                                                        c.remove(i);
                                                    });
                                                }
                                            >
                                                "Descartar"
                                            </Button>
                                        </div>
                                    </div>
                                }
                            })
                            .collect_view()
                    }}
                </div>
            </DialogBody>
            <DialogFooter class="mt-4">
                <Button variant=ButtonVariant::Outline on:click=move |_| open.set(false)>
                    "Cancelar"
                </Button>
                <Button
                    attr:disabled=move || saving.get() || cards.with(|c| c.is_empty())
                    on:click=on_save_all
                >
                    {move || if saving.get() { "Salvando..." } else { "Salvar todos" }}
                </Button>
            </DialogFooter>
        </Dialog>
    }
}

#[component]
fn FlashcardsSection(#[prop(into)] topic_id: Signal<String>) -> impl IntoView {
    let app = expect_context::<AppContext>();
    let edit_open = RwSignal::new(false);
    let editing_id: RwSignal<Option<String>> = RwSignal::new(None);
    let question: RwSignal<String> = RwSignal::new(String::new());
    let answer: RwSignal<String> = RwSignal::new(String::new());
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let saving = RwSignal::new(false);
    let revealed: RwSignal<Option<String>> = RwSignal::new(None);

    let open_create = move |_| {
        editing_id.set(None);
        question.set(String::new());
        answer.set(String::new());
        error.set(None);
        edit_open.set(true);
    };

    let open_edit = move |card: Flashcard| {
        editing_id.set(Some(card.id));
        question.set(card.question);
        answer.set(card.answer);
        error.set(None);
        edit_open.set(true);
    };

    let on_save = move |_| {
        let q = question.get_untracked().trim().to_string();
        let a = answer.get_untracked().trim().to_string();
        if q.is_empty() || a.is_empty() {
            error.set(Some("Pergunta e resposta são obrigatórias.".to_string()));
            return;
        }
        let req = crate::api::UpsertFlashcardRequest {
            topic_id: topic_id.get_untracked(),
            id: editing_id.get_untracked(),
            question: q,
            answer: a,
        };
        saving.set(true);
        error.set(None);
        let api = app.0.api_client.get_untracked();
        let tid = topic_id.get_untracked();
        spawn_local(async move {
            let result = api.upsert_flashcard(req).await;
            saving.set(false);
            match result {
                Ok(_) => {
                    edit_open.set(false);
                    reload_flashcards(app, tid);
                }
                Err(e) => error.set(Some(e.display_message())),
            }
        });
    };

    let on_delete = move |card_id: String| {
        let api = app.0.api_client.get_untracked();
        let tid = topic_id.get_untracked();
        spawn_local(async move {
            if api.delete_flashcard(&card_id).await.is_ok() {
                reload_flashcards(app, tid);
            }
        });
    };

    view! {
        <section class="space-y-3">
            <div class="flex items-center justify-between">
                <h2 class="text-base font-semibold">"Flashcards"</h2>
                <Button size=ButtonSize::Sm variant=ButtonVariant::Outline on:click=open_create>
                    "Novo flashcard"
                </Button>
            </div>

            <Show when=move || app.0.flashcards_loading.get()>
                <div class="flex items-center gap-2 py-2 text-sm text-muted-foreground">
                    <Spinner />
                    "Carregando flashcards..."
                </div>
            </Show>

            <Show when=move || {
                !app.0.flashcards_loading.get() && app.0.flashcards.get().is_empty()
            }>
                <div class="text-sm text-muted-foreground">"Nenhum flashcard neste tópico."</div>
            </Show>

            <div class="grid gap-2 sm:grid-cols-2">
                {move || {
                    app.0
                        .flashcards
                        .get()
                        .into_iter()
                        .map(|card| {
                            let card_for_edit = card.clone();
                            let id_for_delete = card.id.clone();
                            let id_for_reveal = card.id.clone();
                            let shown = Signal::derive(move || {
                                revealed.get().as_deref() == Some(id_for_reveal.as_str())
                            });
                            let id_for_toggle = card.id.clone();
                            view! {
                                <div class="rounded-md border p-3">
                                    <button
                                        type="button"
                                        class="w-full text-left"
                                        on:click=move |_| {
                                            revealed
                                                .update(|r| {
                                                    *r = if r.as_deref() == Some(id_for_toggle.as_str()) {
                                                        None
                                                    } else {
                                                        Some(id_for_toggle.clone())
                                                    };
                                                });
                                        }
                                    >
                                        <div class="text-sm font-medium">{card.question.clone()}</div>
                                        <div class="mt-1 text-sm text-muted-foreground">
                                            {move || {
                                                if shown.get() {
                                                    card.answer.clone()
                                                } else {
                                                    "Clique para revelar a resposta".to_string()
                                                }
                                            }}
                                        </div>
                                    </button>
                                    <div class="mt-2 flex justify-end gap-1">
                                        <Button
                                            variant=ButtonVariant::Ghost
                                            size=ButtonSize::Sm
                                            on:click=move |_| open_edit(card_for_edit.clone())
                                        >
                                            "Editar"
                                        </Button>
                                        <Button
                                            variant=ButtonVariant::Ghost
                                            size=ButtonSize::Sm
                                            class="text-destructive"
                                            on:click=move |_| on_delete(id_for_delete.clone())
                                        >
                                            "Excluir"
                                        </Button>
                                    </div>
                                </div>
                            }
                        })
                        .collect_view()
                }}
            </div>

            <Dialog open=edit_open>
                <DialogHeader>
                    <DialogTitle>
                        {move || {
                            if editing_id.get().is_some() {
                                "Editar flashcard"
                            } else {
                                "Novo flashcard"
                            }
                        }}
                    </DialogTitle>
                </DialogHeader>
                <DialogBody class="mt-4">
                    <div class="flex flex-col gap-1.5">
                        <Label html_for="fc_question" class="text-xs">"Pergunta"</Label>
                        <Textarea id="fc_question" bind_value=question rows=2 />
                    </div>
                    <div class="flex flex-col gap-1.5">
                        <Label html_for="fc_answer" class="text-xs">"Resposta"</Label>
                        <Textarea id="fc_answer" bind_value=answer rows=3 />
                    </div>
                    <Show when=move || error.get().is_some()>
                        <Alert variant=AlertVariant::Destructive>
                            <AlertDescription>
                                {move || error.get().unwrap_or_default()}
                            </AlertDescription>
                        </Alert>
                    </Show>
                </DialogBody>
                <DialogFooter class="mt-4">
                    <Button variant=ButtonVariant::Outline on:click=move |_| edit_open.set(false)>
                        "Cancelar"
                    </Button>
                    <Button attr:disabled=move || saving.get() on:click=on_save>
                        {move || if saving.get() { "Salvando..." } else { "Salvar" }}
                    </Button>
                </DialogFooter>
            </Dialog>
        </section>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(id: &str, title: &str) -> Note {
        Note {
            id: id.to_string(),
            topic_id: "t1".to_string(),
            title: title.to_string(),
            content: format!("https://blob/{id}.json"),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_note_update_replaces_record_in_place() {
        let mut notes = vec![note("a", "Um"), note("b", "Dois")];
        apply_note_update(&mut notes, "b", "Dois revisado", "https://blob/b2.json");
        assert_eq!(notes[1].title, "Dois revisado");
        assert_eq!(notes[1].content, "https://blob/b2.json");
        assert_eq!(notes[0].title, "Um");
        assert_eq!(
            notes.iter().map(|n| n.id.as_str()).collect::<Vec<_>>(),
            vec!["a", "b"]
        );
    }

    #[test]
    fn test_note_update_ignores_unknown_id() {
        let mut notes = vec![note("a", "Um")];
        apply_note_update(&mut notes, "zz", "outro", "https://blob/z.json");
        assert_eq!(notes[0].title, "Um");
        assert_eq!(notes[0].content, "https://blob/a.json");
    }
}
