use leptos::prelude::*;
use leptos_ui::{clx, variants};

mod components {
    use super::*;
    clx! {AlertTitle, h4, "mb-1 font-medium tracking-tight leading-none"}
    clx! {AlertDescription, p, "text-sm [&_p]:leading-relaxed"}
}

#[allow(unused_imports)]
pub use components::*;

variants! {
    Alert {
        base: "relative w-full rounded-lg border px-4 py-3 text-sm [&>svg+div]:translate-y-[-3px] [&>svg]:absolute [&>svg]:left-4 [&>svg]:top-4 [&>svg~*]:pl-7",
        variants: {
            variant: {
                Default: "bg-background text-foreground [&>svg]:text-foreground",
                Destructive: "border-destructive/50 text-destructive [&>svg]:text-destructive"
            },
            // The macro has no variant-only arm that also emits a component;
            // a single empty size keeps the generated markup identical.
            size: {
                Default: ""
            }
        },
        component: {
            element: div
        }
    }
}
