use crate::pages::{TopicListPage, TopicPage};
use crate::state::{AppContext, AppState};
use leptos::prelude::*;
use leptos_router::components::{Route, Router, Routes};
use leptos_router::path;

#[component]
pub fn App() -> impl IntoView {
    provide_context(AppContext(AppState::new()));

    // IMPORTANT:
    // - Leptos CSR requires the `csr` feature on `leptos`.
    // - router hooks require a <Router> context.
    view! {
        <Router>
            <Routes fallback=|| view! { <div class="px-4 py-8 text-xs text-muted-foreground">"Não encontrado"</div> }>
                <Route path=path!("topic/:id") view=TopicPage />
                <Route path=path!("") view=TopicListPage />
            </Routes>
        </Router>
    }
}
