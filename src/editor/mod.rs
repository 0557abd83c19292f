use leptos::html;
use leptos::prelude::*;
use leptos::task::spawn_local;
use wasm_bindgen::JsCast;

use crate::assets::{read_file_bytes, upload_image};
use crate::components::hooks::use_random::use_random_id_for;
use crate::doc::pos::{Caret, Selection};
use crate::doc::{char_len, slice_chars, Doc, Inline, Mark, Node};
use crate::engine::{Command, Engine};
use crate::render::{run_style, RunStyle};
use crate::state::AppContext;
use crate::suggest::SuggestionController;
use crate::util::count_label;

pub(crate) mod toolbar;

use toolbar::EditorToolbar;

/// Shared handle between the editing surface and the toolbar.
#[derive(Clone, Copy)]
pub(crate) struct EditorCtx {
    pub engine: RwSignal<Engine>,
    pub on_change: Callback<String>,
    pub error: RwSignal<Option<String>>,
    pub uploading: RwSignal<bool>,
}

impl EditorCtx {
    /// Runs a command; accepted content changes are pushed to the host as the
    /// freshly serialized tree, in acceptance order.
    pub fn apply(&self, cmd: Command) -> bool {
        let accepted = self.engine.try_update(|e| e.apply(&cmd)).unwrap_or(false);
        if accepted {
            self.notify();
        }
        accepted
    }

    pub fn undo(&self) {
        if self.engine.try_update(|e| e.undo()).unwrap_or(false) {
            self.notify();
        }
    }

    pub fn redo(&self) {
        if self.engine.try_update(|e| e.redo()).unwrap_or(false) {
            self.notify();
        }
    }

    /// Selection-only move: no history, no change notification.
    pub fn set_selection(&self, sel: Selection) {
        self.engine.update(|e| e.set_selection(sel));
    }

    fn notify(&self) {
        let json = self.engine.with_untracked(|e| e.to_json().to_string());
        self.on_change.run(json);
    }
}

/// Caret one step left/right, hopping block boundaries.
pub(crate) fn move_horizontal(doc: &Doc, caret: &Caret, forward: bool) -> Caret {
    let len = doc.node_at(&caret.path).and_then(|n| n.text_len()).unwrap_or(0);
    let paths = doc.text_block_paths();
    let at = paths.iter().position(|p| *p == caret.path);
    if forward {
        if caret.offset < len {
            return Caret::new(caret.path.clone(), caret.offset + 1);
        }
        match at {
            Some(i) if i + 1 < paths.len() => Caret::new(paths[i + 1].clone(), 0),
            _ => caret.clone(),
        }
    } else {
        if caret.offset > 0 {
            return Caret::new(caret.path.clone(), caret.offset - 1);
        }
        match at {
            Some(i) if i > 0 => {
                let path = paths[i - 1].clone();
                let len = doc.node_at(&path).and_then(|n| n.text_len()).unwrap_or(0);
                Caret::new(path, len)
            }
            _ => caret.clone(),
        }
    }
}

/// Caret to the previous/next text block, keeping the column where possible.
pub(crate) fn move_vertical(doc: &Doc, caret: &Caret, down: bool) -> Caret {
    let paths = doc.text_block_paths();
    let at = match paths.iter().position(|p| *p == caret.path) {
        Some(i) => i,
        None => return doc.clamp_caret(caret),
    };
    let target = if down {
        if at + 1 >= paths.len() {
            return caret.clone();
        }
        at + 1
    } else {
        if at == 0 {
            return caret.clone();
        }
        at - 1
    };
    let path = paths[target].clone();
    let len = doc.node_at(&path).and_then(|n| n.text_len()).unwrap_or(0);
    Caret::new(path, caret.offset.min(len))
}

/// Folds an upload result into the single thing the editor does next: an
/// insert command on success, one user-facing message on failure.
fn upload_outcome(result: Result<String, String>) -> Result<Command, String> {
    match result {
        Ok(url) => Ok(Command::InsertImage { src: url }),
        Err(msg) => Err(format!("Falha no upload da imagem: {msg}")),
    }
}

/// Keys go to the overlay only while it is visible. An active session whose
/// query matches nothing leaves the keyboard to the surface.
fn overlay_open(suggest: &SuggestionController) -> bool {
    suggest.is_active() && !suggest.items().is_empty()
}

fn caret_marker(caret_id: &str) -> AnyView {
    let id = caret_id.to_string();
    view! {
        <span
            id=id
            class="inline-block h-[1.2em] w-px translate-y-[0.2em] animate-pulse bg-primary"
        ></span>
    }
    .into_any()
}

fn inline_views_with_caret(
    runs: &[Inline],
    caret_offset: Option<usize>,
    caret_id: &str,
) -> Vec<AnyView> {
    let mut out: Vec<AnyView> = Vec::new();
    let mut cursor = 0usize;
    let mut placed = caret_offset.is_none();
    for run in runs {
        let len = char_len(&run.text);
        let RunStyle { mut classes, style, href } = run_style(&run.marks);
        // links stay inert spans while editing; keep the visual treatment
        if href.is_some() {
            classes = format!("text-primary underline underline-offset-2 {classes}");
        }
        let split = caret_offset
            .filter(|o| !placed && *o >= cursor && *o <= cursor + len)
            .map(|o| o - cursor);
        match split {
            Some(split) => {
                let before = slice_chars(&run.text, 0, split);
                let after = slice_chars(&run.text, split, len);
                if !before.is_empty() {
                    let classes = classes.clone();
                    let style = style.clone();
                    out.push(view! { <span class=classes style=style>{before}</span> }.into_any());
                }
                out.push(caret_marker(caret_id));
                placed = true;
                if !after.is_empty() {
                    out.push(view! { <span class=classes style=style>{after}</span> }.into_any());
                }
            }
            None => {
                let text = run.text.clone();
                out.push(view! { <span class=classes style=style>{text}</span> }.into_any());
            }
        }
        cursor += len;
    }
    if !placed {
        out.push(caret_marker(caret_id));
    }
    if runs.is_empty() && caret_offset.is_none() {
        out.push(view! { <br /> }.into_any());
    }
    out
}

fn block_mousedown(ctx: EditorCtx, path: Vec<usize>) -> impl Fn(leptos::ev::MouseEvent) + Clone {
    move |ev: leptos::ev::MouseEvent| {
        ev.stop_propagation();
        let len = ctx
            .engine
            .with_untracked(|e| e.doc().node_at(&path).and_then(|n| n.text_len()))
            .unwrap_or(0);
        ctx.set_selection(Selection::collapsed(Caret::new(path.clone(), len)));
    }
}

fn surface_node_view(
    node: &Node,
    path: Vec<usize>,
    head: &Caret,
    caret_id: &str,
    ctx: EditorCtx,
) -> AnyView {
    let caret_here = (path == head.path).then_some(head.offset);
    match node {
        Node::Paragraph { align, inlines } => {
            let style = match align {
                Some(a) => format!("text-align: {}", a.as_ref()),
                None => String::new(),
            };
            let content = inline_views_with_caret(inlines, caret_here, caret_id);
            view! {
                <p class="my-1 min-h-6 leading-7" style=style on:mousedown=block_mousedown(ctx, path)>
                    {content}
                </p>
            }
            .into_any()
        }
        Node::Heading { level, align, inlines } => {
            let style = match align {
                Some(a) => format!("text-align: {}", a.as_ref()),
                None => String::new(),
            };
            let content = inline_views_with_caret(inlines, caret_here, caret_id);
            let on_down = block_mousedown(ctx, path);
            match level {
                1 => view! { <h1 class="mt-4 mb-2 text-2xl font-bold" style=style on:mousedown=on_down>{content}</h1> }.into_any(),
                2 => view! { <h2 class="mt-3 mb-2 text-xl font-semibold" style=style on:mousedown=on_down>{content}</h2> }.into_any(),
                _ => view! { <h3 class="mt-2 mb-1 text-lg font-semibold" style=style on:mousedown=on_down>{content}</h3> }.into_any(),
            }
        }
        Node::CodeBlock { text } => {
            let content = match caret_here {
                Some(offset) => {
                    let offset = offset.min(char_len(text));
                    let before = slice_chars(text, 0, offset);
                    let after = slice_chars(text, offset, char_len(text));
                    vec![
                        view! { <span>{before}</span> }.into_any(),
                        caret_marker(caret_id),
                        view! { <span>{after}</span> }.into_any(),
                    ]
                }
                None => vec![view! { <span>{text.clone()}</span> }.into_any()],
            };
            view! {
                <pre
                    class="my-2 overflow-x-auto rounded-md bg-muted p-3 font-mono text-sm"
                    on:mousedown=block_mousedown(ctx, path)
                >
                    <code>{content}</code>
                </pre>
            }
            .into_any()
        }
        Node::BulletList { items } => {
            let content = surface_children(items, &path, head, caret_id, ctx);
            view! { <ul class="my-2 list-disc pl-6">{content}</ul> }.into_any()
        }
        Node::OrderedList { items } => {
            let content = surface_children(items, &path, head, caret_id, ctx);
            view! { <ol class="my-2 list-decimal pl-6">{content}</ol> }.into_any()
        }
        Node::ListItem { children } => {
            let content = surface_children(children, &path, head, caret_id, ctx);
            view! { <li>{content}</li> }.into_any()
        }
        Node::Blockquote { children } => {
            let content = surface_children(children, &path, head, caret_id, ctx);
            view! {
                <blockquote class="my-2 border-l-4 border-border pl-4 text-muted-foreground">
                    {content}
                </blockquote>
            }
            .into_any()
        }
        Node::Table { rows } => {
            let content = surface_children(rows, &path, head, caret_id, ctx);
            view! {
                <div class="my-2 overflow-x-auto">
                    <table class="w-full border-collapse text-sm">
                        <tbody>{content}</tbody>
                    </table>
                </div>
            }
            .into_any()
        }
        Node::TableRow { cells } => {
            let content = surface_children(cells, &path, head, caret_id, ctx);
            view! { <tr>{content}</tr> }.into_any()
        }
        Node::TableCell { children } => {
            let content = surface_children(children, &path, head, caret_id, ctx);
            view! { <td class="border border-border p-2 align-top">{content}</td> }.into_any()
        }
        Node::TableHeaderCell { children } => {
            let content = surface_children(children, &path, head, caret_id, ctx);
            view! {
                <th class="border border-border bg-muted p-2 text-left font-semibold">{content}</th>
            }
            .into_any()
        }
        Node::Image { src } => {
            let src = src.clone();
            view! { <img src=src class="my-2 max-w-full rounded-md" /> }.into_any()
        }
        Node::HorizontalRule => view! { <hr class="my-4 border-border" /> }.into_any(),
        Node::MediaEmbed { src } => {
            let src = src.clone();
            view! {
                <div class="my-2 aspect-video">
                    <iframe src=src class="h-full w-full rounded-md" allowfullscreen="true"></iframe>
                </div>
            }
            .into_any()
        }
    }
}

fn surface_children(
    nodes: &[Node],
    parent: &[usize],
    head: &Caret,
    caret_id: &str,
    ctx: EditorCtx,
) -> Vec<AnyView> {
    nodes
        .iter()
        .enumerate()
        .map(|(i, node)| {
            let mut path = parent.to_vec();
            path.push(i);
            surface_node_view(node, path, head, caret_id, ctx)
        })
        .collect()
}

/// Structured document editor: typed tree + command engine, slash-command
/// suggestion overlay, contextual toolbar, asset uploads.
#[component]
pub(crate) fn RichTextEditor(
    #[prop(optional)] initial: Option<serde_json::Value>,
    #[prop(into)] on_change: Callback<String>,
) -> impl IntoView {
    let app = expect_context::<AppContext>();
    let engine = RwSignal::new(Engine::new(initial.as_ref().and_then(Doc::from_json)));
    let ctx = EditorCtx {
        engine,
        on_change,
        error: RwSignal::new(None),
        uploading: RwSignal::new(false),
    };
    provide_context(ctx);

    let suggest = RwSignal::new(SuggestionController::default());
    let caret_id = StoredValue::new(use_random_id_for("caret"));
    let overlay_pos = RwSignal::new((0.0f64, 0.0f64));
    let surface_ref = NodeRef::<html::Div>::new();
    let file_ref = NodeRef::<html::Input>::new();

    // Anchor rect recomputed from the live caret after every update. Measured
    // on the next tick so the marker is mounted.
    Effect::new(move |_| {
        ctx.engine.with(|_| ());
        if !suggest.with(|s| s.is_active()) {
            return;
        }
        let id = caret_id.with_value(|v| v.clone());
        let _ = web_sys::window()
            .unwrap()
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                wasm_bindgen::closure::Closure::once_into_js(move || {
                    if let Some(doc) = web_sys::window().and_then(|w| w.document()) {
                        if let Some(el) = doc.get_element_by_id(&id) {
                            let rect = el.get_bounding_client_rect();
                            overlay_pos.set((rect.left(), rect.bottom() + 4.0));
                        }
                    }
                })
                .as_ref()
                .unchecked_ref(),
                0,
            );
    });

    let refresh_suggestion = move || {
        ctx.engine.with_untracked(|e| {
            let head = e.selection().head.clone();
            suggest.update(|s| s.refresh(e.doc(), &head));
        });
    };

    let focus_surface = move || {
        if let Some(el) = surface_ref.get_untracked() {
            let _ = el.focus();
        }
    };

    let on_keydown = move |ev: leptos::ev::KeyboardEvent| {
        let key = ev.key();
        let ctrl = ev.ctrl_key() || ev.meta_key();

        if suggest.with_untracked(|s| overlay_open(s)) {
            match key.as_str() {
                "ArrowDown" => {
                    ev.prevent_default();
                    suggest.update(|s| s.move_down());
                    return;
                }
                "ArrowUp" => {
                    ev.prevent_default();
                    suggest.update(|s| s.move_up());
                    return;
                }
                "Escape" => {
                    ev.prevent_default();
                    suggest.update(|s| s.cancel());
                    focus_surface();
                    return;
                }
                "Enter" => {
                    ev.prevent_default();
                    let caret = ctx.engine.with_untracked(|e| e.selection().head.clone());
                    let committed = suggest
                        .try_update(|s| s.commit(&caret))
                        .flatten();
                    if let Some((from, to, action)) = committed {
                        ctx.apply(Command::ApplySuggestion { from, to, action });
                    }
                    focus_surface();
                    return;
                }
                _ => {}
            }
        }

        if ctrl {
            match key.as_str() {
                "b" | "B" => {
                    ev.prevent_default();
                    ctx.apply(Command::ToggleMark(Mark::Bold));
                }
                "i" | "I" => {
                    ev.prevent_default();
                    ctx.apply(Command::ToggleMark(Mark::Italic));
                }
                "u" | "U" => {
                    ev.prevent_default();
                    ctx.apply(Command::ToggleMark(Mark::Underline));
                }
                "z" | "Z" => {
                    ev.prevent_default();
                    if ev.shift_key() {
                        ctx.redo();
                    } else {
                        ctx.undo();
                    }
                }
                "y" | "Y" => {
                    ev.prevent_default();
                    ctx.redo();
                }
                _ => {}
            }
            refresh_suggestion();
            return;
        }

        match key.as_str() {
            "Enter" => {
                ev.prevent_default();
                ctx.apply(Command::SplitBlock);
            }
            "Backspace" => {
                ev.prevent_default();
                ctx.apply(Command::DeleteBackward);
            }
            "ArrowLeft" | "ArrowRight" => {
                ev.prevent_default();
                let forward = key == "ArrowRight";
                let extend = ev.shift_key();
                ctx.engine.with_untracked(|e| {
                    let head = move_horizontal(e.doc(), &e.selection().head, forward);
                    let anchor = if extend { e.selection().anchor.clone() } else { head.clone() };
                    ctx.set_selection(Selection { anchor, head });
                });
            }
            "ArrowUp" | "ArrowDown" => {
                ev.prevent_default();
                let down = key == "ArrowDown";
                ctx.engine.with_untracked(|e| {
                    let head = move_vertical(e.doc(), &e.selection().head, down);
                    ctx.set_selection(Selection::collapsed(head));
                });
            }
            k if k.chars().count() == 1 => {
                ev.prevent_default();
                if ctx.apply(Command::InsertText(k.to_string())) {
                    let caret = ctx.engine.with_untracked(|e| e.selection().head.clone());
                    suggest.update(|s| s.on_text_inserted(k, &caret));
                }
            }
            _ => {}
        }
        refresh_suggestion();
    };

    let api = app.0.api_client;
    let on_file_picked = move |ev: leptos::ev::Event| {
        let Some(input) = ev
            .target()
            .and_then(|t| t.dyn_into::<web_sys::HtmlInputElement>().ok())
        else {
            return;
        };
        let Some(file) = input.files().and_then(|fs| fs.get(0)) else {
            return;
        };
        input.set_value("");
        ctx.error.set(None);
        ctx.uploading.set(true);
        let client = api.get_untracked();
        spawn_local(async move {
            let name = file.name();
            let content_type = file.type_();
            let result = match read_file_bytes(&file).await {
                Ok(bytes) => upload_image(&client, &name, bytes, &content_type)
                    .await
                    .map_err(|e| e.display_message()),
                Err(e) => Err(e),
            };
            ctx.uploading.set(false);
            match upload_outcome(result) {
                Ok(cmd) => {
                    ctx.apply(cmd);
                }
                Err(msg) => ctx.error.set(Some(msg)),
            }
        });
    };

    let counts = move || {
        ctx.engine
            .with(|e| count_label(e.doc().word_count(), e.doc().char_count()))
    };

    view! {
        <div class="rounded-lg border bg-background">
            <EditorToolbar file_ref=file_ref />

            <input
                type="file"
                accept="image/*"
                class="hidden"
                node_ref=file_ref
                on:change=on_file_picked
            />

            <div
                class="min-h-[240px] cursor-text px-4 py-2 outline-none focus-visible:ring-1 focus-visible:ring-ring"
                tabindex="0"
                node_ref=surface_ref
                on:keydown=on_keydown
                on:mousedown=move |ev: leptos::ev::MouseEvent| {
                    ev.prevent_default();
                    focus_surface();
                }
            >
                {move || {
                    let id = caret_id.with_value(|v| v.clone());
                    ctx.engine
                        .with(|e| {
                            surface_children(
                                    &e.doc().nodes,
                                    &[],
                                    &e.selection().head,
                                    &id,
                                    ctx,
                                )
                                .into_any()
                        })
                }}
            </div>

            <Show when=move || suggest.with(|s| overlay_open(s))>
                <div
                    class="fixed z-[80] w-56 rounded-md border bg-popover p-1 shadow-md"
                    style=move || {
                        let (left, top) = overlay_pos.get();
                        format!("left: {left}px; top: {top}px;")
                    }
                >
                    {move || {
                        let selected = suggest.with(|s| s.state().map(|st| st.selected).unwrap_or(0));
                        suggest
                            .with(|s| s.items())
                            .into_iter()
                            .enumerate()
                            .map(|(i, entry)| {
                                let active = i == selected;
                                let label = entry.label;
                                let on_down = move |ev: leptos::ev::MouseEvent| {
                                    ev.prevent_default();
                                    ev.stop_propagation();
                                    let caret = ctx
                                        .engine
                                        .with_untracked(|e| e.selection().head.clone());
                                    suggest
                                        .update(|s| {
                                            // pointer choice overrides the keyboard highlight
                                            if let Some((from, to, _)) = s.commit(&caret) {
                                                ctx.apply(Command::ApplySuggestion {
                                                    from,
                                                    to,
                                                    action: entry.action,
                                                });
                                            }
                                        });
                                    focus_surface();
                                };
                                view! {
                                    <button
                                        type="button"
                                        class=format!(
                                            "flex w-full items-center rounded-sm px-2 py-1.5 text-left text-sm {}",
                                            if active {
                                                "bg-accent text-accent-foreground"
                                            } else {
                                                "hover:bg-accent/50"
                                            },
                                        )
                                        on:mousedown=on_down
                                    >
                                        {label}
                                    </button>
                                }
                            })
                            .collect::<Vec<_>>()
                    }}
                </div>
            </Show>

            <Show when=move || ctx.error.with(|e| e.is_some())>
                <div class="border-t px-4 py-2 text-sm text-destructive">
                    {move || ctx.error.get().unwrap_or_default()}
                </div>
            </Show>

            <div class="flex items-center justify-between border-t px-4 py-2 text-xs text-muted-foreground">
                <span>{counts}</span>
                <Show when=move || ctx.uploading.get()>
                    <span>"Enviando imagem..."</span>
                </Show>
            </div>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc::Node;

    fn two_block_doc() -> Doc {
        Doc::from_nodes(vec![Node::paragraph("abc"), Node::paragraph("de")])
    }

    #[test]
    fn test_move_horizontal_hops_block_boundaries() {
        let doc = two_block_doc();
        let end_of_first = Caret::new(vec![0], 3);
        let hopped = move_horizontal(&doc, &end_of_first, true);
        assert_eq!(hopped, Caret::new(vec![1], 0));
        let back = move_horizontal(&doc, &hopped, false);
        assert_eq!(back, end_of_first);
    }

    #[test]
    fn test_move_horizontal_stops_at_document_edges() {
        let doc = two_block_doc();
        let start = Caret::new(vec![0], 0);
        assert_eq!(move_horizontal(&doc, &start, false), start);
        let end = Caret::new(vec![1], 2);
        assert_eq!(move_horizontal(&doc, &end, true), end);
    }

    #[test]
    fn test_move_vertical_clamps_column() {
        let doc = two_block_doc();
        let caret = Caret::new(vec![0], 3);
        let down = move_vertical(&doc, &caret, true);
        assert_eq!(down, Caret::new(vec![1], 2));
        let up = move_vertical(&doc, &down, false);
        assert_eq!(up, Caret::new(vec![0], 2));
    }

    #[test]
    fn test_failed_upload_reports_once_and_inserts_nothing() {
        let outcome = upload_outcome(Err("sem conexão".to_string()));
        let msg = outcome.expect_err("a failed upload never becomes a command");
        assert!(msg.contains("sem conexão"));
    }

    #[test]
    fn test_successful_upload_becomes_an_insert() {
        assert_eq!(
            upload_outcome(Ok("https://blob/img.png".to_string())),
            Ok(Command::InsertImage { src: "https://blob/img.png".to_string() })
        );
    }

    #[test]
    fn test_hidden_overlay_releases_the_keyboard() {
        let mut ctl = SuggestionController::default();
        ctl.on_text_inserted("/", &Caret::new(vec![0], 1));
        assert!(overlay_open(&ctl));
        // query with no catalog hits: session alive, overlay hidden
        let doc = Doc::from_nodes(vec![Node::paragraph("/zz")]);
        ctl.refresh(&doc, &Caret::new(vec![0], 3));
        assert!(ctl.is_active());
        assert!(!overlay_open(&ctl));
    }
}
