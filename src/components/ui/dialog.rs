#![allow(dead_code)]

use icons::X;
use leptos::prelude::*;
use leptos_ui::clx;
use tw_merge::*;

mod components {
    use super::*;
    clx! {DialogBody, div, "flex flex-col gap-4"}
    clx! {DialogHeader, div, "flex flex-col gap-2 text-center sm:text-left"}
    clx! {DialogTitle, h3, "text-lg leading-none font-semibold"}
    clx! {DialogDescription, p, "text-muted-foreground text-sm"}
    clx! {DialogFooter, footer, "flex flex-col-reverse gap-2 sm:flex-row sm:justify-end"}
}

#[allow(unused_imports)]
pub use components::*;

/// Signal-driven modal. The host owns `open`; backdrop click, the close
/// button, and Escape all clear it.
#[component]
pub fn Dialog(
    #[prop(into)] open: RwSignal<bool>,
    #[prop(optional, into)] class: String,
    children: ChildrenFn,
) -> impl IntoView {
    let merged_class = tw_merge!(
        "fixed top-[50%] left-[50%] z-[70] w-full max-w-lg translate-x-[-50%] translate-y-[-50%] rounded-2xl border bg-background p-6 shadow-lg max-h-[85vh] overflow-y-auto",
        class
    );

    let handle = window_event_listener(leptos::ev::keydown, move |ev| {
        if ev.key() == "Escape" && open.get_untracked() {
            open.set(false);
        }
    });
    on_cleanup(move || handle.remove());

    view! {
        <Show when=move || open.get()>
            <div
                class="fixed inset-0 z-[60] bg-black/50"
                data-name="DialogBackdrop"
                on:click=move |_| open.set(false)
            />
            <div
                class=merged_class.clone()
                data-name="DialogContent"
                on:click=|ev: leptos::ev::MouseEvent| ev.stop_propagation()
            >
                <button
                    type="button"
                    class="absolute top-4 right-4 rounded-sm p-1 focus:ring-2 focus:ring-ring focus:outline-none [&_svg:not([class*='size-'])]:size-4"
                    aria-label="Fechar"
                    on:click=move |_| open.set(false)
                >
                    <X />
                </button>

                {children()}
            </div>
        </Show>
    }
}
