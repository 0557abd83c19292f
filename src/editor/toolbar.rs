use icons::{
    AlignCenter, AlignJustify, AlignLeft, AlignRight, Bold, Code, Eraser, Highlighter, Image,
    Italic, Link, List, ListOrdered, Minus, Quote, Redo2, Strikethrough, Table, Underline, Undo2,
    Video,
};
use leptos::html;
use leptos::prelude::*;

use crate::components::ui::{
    Button, ButtonVariant, Dialog, DialogBody, DialogFooter, DialogHeader, DialogTitle, Input,
    Label, Popover, PopoverAlign, PopoverContent, PopoverTrigger, Separator, SeparatorOrientation,
    Tooltip, TooltipContent, TooltipPosition,
};
use crate::doc::{Align, Mark, MarkKind, Node};
use crate::engine::{ActiveBlock, Command};

use super::EditorCtx;

const PALETTE: [&str; 8] = [
    "#000000", "#E03131", "#2F9E44", "#1971C2", "#F08C00", "#A61E4D", "#862E9C", "#C2255C",
];

#[component]
fn ToolbarButton(
    #[prop(into, optional)] active: Signal<bool>,
    #[prop(into, optional)] disabled: Signal<bool>,
    #[prop(into, optional)] title: String,
    #[prop(into)] on_press: Callback<()>,
    children: Children,
) -> impl IntoView {
    let class = move || {
        format!(
            "inline-flex size-8 items-center justify-center rounded-md text-sm transition-colors disabled:pointer-events-none disabled:opacity-50 [&_svg]:size-4 {}",
            if active.get() {
                "bg-accent text-accent-foreground"
            } else {
                "hover:bg-accent/50"
            }
        )
    };
    view! {
        <Tooltip class="my-0">
            <button
                type="button"
                class=class
                disabled=move || disabled.get()
                on:click=move |_| on_press.run(())
            >
                {children()}
            </button>
            <TooltipContent position=TooltipPosition::Bottom>{title}</TooltipContent>
        </Tooltip>
    }
}

fn swatch_button(ctx: EditorCtx, color: &'static str, highlight: bool) -> impl IntoView {
    view! {
        <button
            type="button"
            class="size-6 rounded-sm border border-border"
            style=format!("background-color: {color}")
            data-popover-close=""
            on:click=move |_| {
                let cmd = if highlight {
                    Command::SetHighlight(Some(color.to_string()))
                } else {
                    Command::SetTextColor(Some(color.to_string()))
                };
                ctx.apply(cmd);
            }
        ></button>
    }
}

#[component]
fn ColorPicker(#[prop(optional)] highlight: bool) -> impl IntoView {
    let ctx = expect_context::<EditorCtx>();
    let current = Signal::derive(move || {
        ctx.engine.with(|e| {
            if highlight {
                e.active_highlight()
            } else {
                e.active_text_color()
            }
        })
    });
    let on_custom = move |ev: leptos::ev::Event| {
        let value = event_target_value(&ev);
        let cmd = if highlight {
            Command::SetHighlight(Some(value))
        } else {
            Command::SetTextColor(Some(value))
        };
        ctx.apply(cmd);
    };
    let on_clear = move |_| {
        let cmd = if highlight {
            Command::SetHighlight(None)
        } else {
            Command::SetTextColor(None)
        };
        ctx.apply(cmd);
    };

    view! {
        <Popover align=PopoverAlign::Start>
            <PopoverTrigger class="size-8 border-0 px-0 py-0 [&_svg]:size-4">
                {if highlight {
                    view! { <Highlighter /> }.into_any()
                } else {
                    view! {
                        <span class="flex flex-col items-center">
                            <span class="text-sm leading-none">"A"</span>
                            <span
                                class="h-1 w-4 rounded-sm"
                                style=move || {
                                    format!(
                                        "background-color: {}",
                                        current.get().unwrap_or_else(|| "#000000".into()),
                                    )
                                }
                            ></span>
                        </span>
                    }
                        .into_any()
                }}
            </PopoverTrigger>
            <PopoverContent class="w-[220px] p-3">
                <div class="grid grid-cols-8 gap-1">
                    {PALETTE.iter().map(|c| swatch_button(ctx, c, highlight).into_any()).collect::<Vec<_>>()}
                </div>
                <div class="mt-3 flex items-center justify-between gap-2">
                    <label class="flex items-center gap-2 text-xs text-muted-foreground">
                        "Personalizada"
                        <input type="color" class="size-6 cursor-pointer" on:change=on_custom />
                    </label>
                    <button
                        type="button"
                        class="text-xs text-muted-foreground hover:text-foreground"
                        data-popover-close=""
                        on:click=on_clear
                    >
                        "Limpar"
                    </button>
                </div>
            </PopoverContent>
        </Popover>
    }
}

#[component]
fn LinkEditor() -> impl IntoView {
    let ctx = expect_context::<EditorCtx>();
    let href = RwSignal::new(String::new());

    // Prefill from the link under the caret; engine changes win over stale input.
    Effect::new(move |_| {
        let current = ctx.engine.with(|e| e.link_href_at_selection());
        href.set(current.unwrap_or_default());
    });

    view! {
        <Popover align=PopoverAlign::Start>
            <PopoverTrigger class="size-8 border-0 px-0 py-0 [&_svg]:size-4">
                <Link />
            </PopoverTrigger>
            <PopoverContent class="w-[280px]">
                <div class="flex flex-col gap-2">
                    <Label>"Endereço do link"</Label>
                    <Input bind_value=href placeholder="https://..." />
                    <div class="flex justify-end gap-2">
                        <button
                            type="button"
                            class="rounded-md px-2 py-1 text-sm text-muted-foreground hover:text-foreground"
                            data-popover-close=""
                            on:click=move |_| {
                                ctx.apply(Command::SetLink(None));
                            }
                        >
                            "Remover"
                        </button>
                        <button
                            type="button"
                            class="rounded-md bg-primary px-2 py-1 text-sm text-primary-foreground hover:bg-primary/90"
                            data-popover-close=""
                            on:click=move |_| {
                                let value = href.get_untracked();
                                let value = value.trim().to_string();
                                ctx.apply(Command::SetLink((!value.is_empty()).then_some(value)));
                            }
                        >
                            "Aplicar"
                        </button>
                    </div>
                </div>
            </PopoverContent>
        </Popover>
    }
}

#[component]
fn UrlDialog(
    #[prop(into)] open: RwSignal<bool>,
    #[prop(into)] title: String,
    #[prop(into)] on_submit: Callback<String>,
) -> impl IntoView {
    let url = RwSignal::new(String::new());
    let title = StoredValue::new(title);
    view! {
        <Dialog open=open>
            <DialogHeader>
                <DialogTitle>{title.with_value(|t| t.clone())}</DialogTitle>
            </DialogHeader>
            <DialogBody class="mt-4">
                <Input bind_value=url placeholder="https://..." />
            </DialogBody>
            <DialogFooter class="mt-4">
                <Button variant=ButtonVariant::Outline on:click=move |_| open.set(false)>
                    "Cancelar"
                </Button>
                <Button on:click=move |_| {
                    let value = url.get_untracked().trim().to_string();
                    if !value.is_empty() {
                        on_submit.run(value);
                        url.set(String::new());
                        open.set(false);
                    }
                }>"Inserir"</Button>
            </DialogFooter>
        </Dialog>
    }
}

fn table_action(ctx: EditorCtx, label: &'static str, cmd: Command) -> impl IntoView {
    let cmd = StoredValue::new(cmd);
    view! {
        <button
            type="button"
            class="rounded-md border px-2 py-1 text-xs hover:bg-accent/50"
            on:click=move |_| {
                ctx.apply(cmd.with_value(|c| c.clone()));
            }
        >
            {label}
        </button>
    }
}

#[component]
pub(crate) fn EditorToolbar(file_ref: NodeRef<html::Input>) -> impl IntoView {
    let ctx = expect_context::<EditorCtx>();

    let mark_active = move |kind: MarkKind| {
        Signal::derive(move || ctx.engine.with(|e| e.is_mark_active(kind)))
    };
    let align_active = move |align: Align| {
        Signal::derive(move || ctx.engine.with(|e| e.is_align_active(align)))
    };

    let block_value = move || {
        ctx.engine.with(|e| match e.active_block() {
            ActiveBlock::Heading(1) => "h1",
            ActiveBlock::Heading(2) => "h2",
            ActiveBlock::Heading(_) => "h3",
            ActiveBlock::CodeBlock => "code",
            ActiveBlock::Paragraph => "paragraph",
        })
    };
    let on_block_change = move |ev: leptos::ev::Event| {
        let cmd = match event_target_value(&ev).as_str() {
            "h1" => Command::ToggleHeading(1),
            "h2" => Command::ToggleHeading(2),
            "h3" => Command::ToggleHeading(3),
            "code" => Command::ToggleCodeBlock,
            _ => Command::SetParagraph,
        };
        ctx.apply(cmd);
    };

    let in_table = Signal::derive(move || ctx.engine.with(|e| e.selection_in_table()));

    let image_dialog = RwSignal::new(false);
    let video_dialog = RwSignal::new(false);

    view! {
        <div
            class="flex flex-wrap items-center gap-1 border-b px-2 py-1.5"
            on:mousedown=|ev: leptos::ev::MouseEvent| ev.prevent_default()
        >
            <ToolbarButton
                title="Desfazer"
                disabled=Signal::derive(move || ctx.engine.with(|e| !e.can_undo()))
                on_press=Callback::new(move |_| ctx.undo())
            >
                <Undo2 />
            </ToolbarButton>
            <ToolbarButton
                title="Refazer"
                disabled=Signal::derive(move || ctx.engine.with(|e| !e.can_redo()))
                on_press=Callback::new(move |_| ctx.redo())
            >
                <Redo2 />
            </ToolbarButton>

            <Separator orientation=SeparatorOrientation::Vertical class="mx-1 h-5" />

            <Show
                when=move || !in_table.get()
                fallback=move || {
                    view! {
                        <div class="flex flex-wrap items-center gap-1">
                            {table_action(ctx, "Linha acima", Command::AddRowBefore)}
                            {table_action(ctx, "Linha abaixo", Command::AddRowAfter)}
                            {table_action(ctx, "Apagar linha", Command::DeleteRow)}
                            {table_action(ctx, "Coluna antes", Command::AddColumnBefore)}
                            {table_action(ctx, "Coluna depois", Command::AddColumnAfter)}
                            {table_action(ctx, "Apagar coluna", Command::DeleteColumn)}
                            {table_action(ctx, "Apagar tabela", Command::DeleteTable)}
                        </div>
                    }
                }
            >
                <select
                    class="h-8 rounded-md border bg-background px-1 text-sm"
                    prop:value=block_value
                    on:change=on_block_change
                >
                    <option value="paragraph">"Parágrafo"</option>
                    <option value="h1">"Título 1"</option>
                    <option value="h2">"Título 2"</option>
                    <option value="h3">"Título 3"</option>
                    <option value="code">"Código"</option>
                </select>
            </Show>

            <Separator orientation=SeparatorOrientation::Vertical class="mx-1 h-5" />

            <ToolbarButton
                title="Negrito"
                active=mark_active(MarkKind::Bold)
                on_press=Callback::new(move |_| {
                    ctx.apply(Command::ToggleMark(Mark::Bold));
                })
            >
                <Bold />
            </ToolbarButton>
            <ToolbarButton
                title="Itálico"
                active=mark_active(MarkKind::Italic)
                on_press=Callback::new(move |_| {
                    ctx.apply(Command::ToggleMark(Mark::Italic));
                })
            >
                <Italic />
            </ToolbarButton>
            <ToolbarButton
                title="Sublinhado"
                active=mark_active(MarkKind::Underline)
                on_press=Callback::new(move |_| {
                    ctx.apply(Command::ToggleMark(Mark::Underline));
                })
            >
                <Underline />
            </ToolbarButton>
            <ToolbarButton
                title="Tachado"
                active=mark_active(MarkKind::Strikethrough)
                on_press=Callback::new(move |_| {
                    ctx.apply(Command::ToggleMark(Mark::Strikethrough));
                })
            >
                <Strikethrough />
            </ToolbarButton>
            <ToolbarButton
                title="Limpar formatação"
                on_press=Callback::new(move |_| {
                    ctx.apply(Command::ClearMarks);
                })
            >
                <Eraser />
            </ToolbarButton>

            <ColorPicker />
            <ColorPicker highlight=true />
            <LinkEditor />

            <Separator orientation=SeparatorOrientation::Vertical class="mx-1 h-5" />

            <ToolbarButton
                title="Alinhar à esquerda"
                active=align_active(Align::Left)
                on_press=Callback::new(move |_| {
                    ctx.apply(Command::SetTextAlign(Align::Left));
                })
            >
                <AlignLeft />
            </ToolbarButton>
            <ToolbarButton
                title="Centralizar"
                active=align_active(Align::Center)
                on_press=Callback::new(move |_| {
                    ctx.apply(Command::SetTextAlign(Align::Center));
                })
            >
                <AlignCenter />
            </ToolbarButton>
            <ToolbarButton
                title="Alinhar à direita"
                active=align_active(Align::Right)
                on_press=Callback::new(move |_| {
                    ctx.apply(Command::SetTextAlign(Align::Right));
                })
            >
                <AlignRight />
            </ToolbarButton>
            <ToolbarButton
                title="Justificar"
                active=align_active(Align::Justify)
                on_press=Callback::new(move |_| {
                    ctx.apply(Command::SetTextAlign(Align::Justify));
                })
            >
                <AlignJustify />
            </ToolbarButton>

            <Show when=move || !in_table.get()>
                <Separator orientation=SeparatorOrientation::Vertical class="mx-1 h-5" />

                <ToolbarButton
                    title="Lista"
                    active=Signal::derive(move || {
                        ctx.engine.with(|e| e.is_block_in(|n| matches!(n, Node::BulletList { .. })))
                    })
                    on_press=Callback::new(move |_| {
                        ctx.apply(Command::ToggleBulletList);
                    })
                >
                    <List />
                </ToolbarButton>
                <ToolbarButton
                    title="Lista numerada"
                    active=Signal::derive(move || {
                        ctx.engine
                            .with(|e| e.is_block_in(|n| matches!(n, Node::OrderedList { .. })))
                    })
                    on_press=Callback::new(move |_| {
                        ctx.apply(Command::ToggleOrderedList);
                    })
                >
                    <ListOrdered />
                </ToolbarButton>
                <ToolbarButton
                    title="Citação"
                    active=Signal::derive(move || {
                        ctx.engine
                            .with(|e| e.is_block_in(|n| matches!(n, Node::Blockquote { .. })))
                    })
                    on_press=Callback::new(move |_| {
                        ctx.apply(Command::ToggleBlockquote);
                    })
                >
                    <Quote />
                </ToolbarButton>
                <ToolbarButton
                    title="Bloco de código"
                    active=Signal::derive(move || {
                        ctx.engine.with(|e| e.active_block() == ActiveBlock::CodeBlock)
                    })
                    on_press=Callback::new(move |_| {
                        ctx.apply(Command::ToggleCodeBlock);
                    })
                >
                    <Code />
                </ToolbarButton>

                <Separator orientation=SeparatorOrientation::Vertical class="mx-1 h-5" />

                <ToolbarButton
                    title="Imagem do computador"
                    on_press=Callback::new(move |_| {
                        if let Some(input) = file_ref.get_untracked() {
                            input.click();
                        }
                    })
                >
                    <Image />
                </ToolbarButton>
                <ToolbarButton
                    title="Imagem por URL"
                    on_press=Callback::new(move |_| image_dialog.set(true))
                >
                    <span class="text-[10px] font-semibold">"URL"</span>
                </ToolbarButton>
                <ToolbarButton
                    title="Vídeo"
                    on_press=Callback::new(move |_| video_dialog.set(true))
                >
                    <Video />
                </ToolbarButton>
                <ToolbarButton
                    title="Divisor"
                    on_press=Callback::new(move |_| {
                        ctx.apply(Command::InsertHorizontalRule);
                    })
                >
                    <Minus />
                </ToolbarButton>
                <ToolbarButton
                    title="Tabela 3x3"
                    on_press=Callback::new(move |_| {
                        ctx.apply(Command::InsertTable {
                            rows: 3,
                            cols: 3,
                            with_header_row: true,
                        });
                    })
                >
                    <Table />
                </ToolbarButton>
            </Show>
        </div>

        <UrlDialog
            open=image_dialog
            title="Inserir imagem por URL"
            on_submit=Callback::new(move |src: String| {
                ctx.apply(Command::InsertImage { src });
            })
        />
        <UrlDialog
            open=video_dialog
            title="Inserir vídeo"
            on_submit=Callback::new(move |src: String| {
                ctx.apply(Command::InsertMediaEmbed { src });
            })
        />
    }
}
