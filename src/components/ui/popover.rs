#![allow(dead_code)]

use leptos::prelude::*;
use leptos_ui::clx;
use tw_merge::*;

use crate::components::hooks::use_random::use_random_id;

mod components {
    use super::*;
    clx! {PopoverTitle, h3, "leading-none font-medium", "mb-3"}
    clx! {PopoverDescription, p, "text-muted-foreground text-sm"}
}

#[allow(unused_imports)]
pub use components::*;

#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub enum PopoverAlign {
    Start,
    #[default]
    Center,
}

#[derive(Clone)]
struct PopoverContext {
    anchor_name: String,
    target_id: String,
}

/// CSS anchor-positioned popover; no JS beyond click-to-close for items
/// marked `data-popover-close`.
#[component]
pub fn Popover(
    children: Children,
    #[prop(default = PopoverAlign::default())] align: PopoverAlign,
) -> impl IntoView {
    let popover_id = use_random_id();
    let popover_anchor_name = format!("--anchor_{}", popover_id);
    let popover_target_id = format!("popover_{}", popover_id);

    let (position_styles, transform_origin) = match align {
        PopoverAlign::Start => (
            "left: anchor(left);
                top: anchor(bottom);
                margin-top: 8px;
                @position-try(flip-block) {
                bottom: anchor(top);
                top: auto;
                margin-bottom: 8px;
                margin-top: 0;
                }"
            .to_string(),
            "left top".to_string(),
        ),
        PopoverAlign::Center => (
            "position-area: block-end;".to_string(),
            "center top".to_string(),
        ),
    };

    let ctx = PopoverContext {
        anchor_name: popover_anchor_name.clone(),
        target_id: popover_target_id.clone(),
    };

    view! {
        <leptos::context::Provider value=ctx>
            <style>
                {format!(
                    "
                #{popover_target_id} {{
                position-anchor: {popover_anchor_name};
                inset: auto;
                {position_styles}
                position-try-fallbacks: flip-block;
                position-try-order: most-height;
                position-visibility: anchors-visible;

                &:popover-open {{
                opacity: 1;
                transform: scale(1) translateY(0px);

                @starting-style {{
                opacity: 0;
                transform: scale(0.95) translateY(-2px);
                }}
                }}

                & {{
                transition:
                display 0.2s allow-discrete,
                overlay 0.2s allow-discrete,
                transform 0.15s cubic-bezier(0.16, 1, 0.3, 1),
                opacity 0.15s ease-out;
                opacity: 0;
                transform: scale(0.95) translateY(-2px);
                transform-origin: var(--popover-transform-origin, {transform_origin});
                }}
                }}
                ",
                )}
            </style>

            <div>{children()}</div>
        </leptos::context::Provider>
    }
}

#[component]
pub fn PopoverTrigger(children: Children, #[prop(optional, into)] class: String) -> impl IntoView {
    let ctx = expect_context::<PopoverContext>();
    let button_class = tw_merge!(
        "inline-flex h-9 w-fit items-center justify-center whitespace-nowrap rounded-md px-4 py-2 text-sm font-medium transition-colors focus-visible:outline-hidden focus-visible:ring-1 focus-visible:ring-ring disabled:cursor-not-allowed disabled:opacity-50 border bg-background border-input hover:bg-accent hover:text-accent-foreground",
        class
    );

    view! {
        <button
            class=button_class
            style=format!("anchor-name: {}", ctx.anchor_name)
            popovertarget=ctx.target_id
            tabindex="0"
            type="button"
        >
            {children()}
        </button>
    }
}

#[component]
pub fn PopoverContent(children: Children, #[prop(optional, into)] class: String) -> impl IntoView {
    let ctx = expect_context::<PopoverContext>();
    let class = tw_merge!(
        "overflow-visible relative z-50 p-4 rounded-md border bg-card shadow-md my-[1ch] w-[250px]",
        class
    );

    let target_id = ctx.target_id.clone();

    view! {
        <div class=class id=ctx.target_id.clone() popover="auto">
            {children()}
        </div>

        <script>
            {format!(
                r#"
                (() => {{
                    const p = document.getElementById('{target_id}');
                    if (!p || p.dataset.init) return;
                    p.dataset.init = '1';
                    p.addEventListener('click', e => e.target.closest('[data-popover-close]') && p.hidePopover());
                }})();
                "#,
            )}
        </script>
    }
}
