use crate::doc::pos::Caret;
use crate::doc::{char_len, slice_chars, Doc};
use crate::engine::SuggestionAction;

/// Character that opens the suggestion overlay.
pub(crate) const TRIGGER: char = '/';

/// At most this many entries are shown for a query.
pub(crate) const MAX_ITEMS: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct CatalogEntry {
    pub label: &'static str,
    pub action: SuggestionAction,
}

/// Fixed catalog, in display order. Labels follow the product language.
pub(crate) const CATALOG: &[CatalogEntry] = &[
    CatalogEntry { label: "Título 1", action: SuggestionAction::Heading(1) },
    CatalogEntry { label: "Título 2", action: SuggestionAction::Heading(2) },
    CatalogEntry { label: "Lista", action: SuggestionAction::BulletList },
    CatalogEntry { label: "Tabela", action: SuggestionAction::Table },
    CatalogEntry { label: "Citação", action: SuggestionAction::Blockquote },
    CatalogEntry { label: "Divisor", action: SuggestionAction::HorizontalRule },
    CatalogEntry { label: "Código", action: SuggestionAction::CodeBlock },
];

/// Case-insensitive prefix filter over labels, catalog order, capped.
pub(crate) fn filter_catalog(query: &str) -> Vec<CatalogEntry> {
    let query = query.to_lowercase();
    CATALOG
        .iter()
        .filter(|entry| entry.label.to_lowercase().starts_with(&query))
        .take(MAX_ITEMS)
        .copied()
        .collect()
}

/// Overlay state while a trigger is live: where the trigger char sits, the
/// query typed after it, and which filtered entry is highlighted.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct SuggestionState {
    pub trigger: Caret,
    pub query: String,
    pub selected: usize,
}

/// Tracks the suggestion session across engine edits. The host feeds it the
/// caret after every content or selection change; the controller decides
/// whether the session survives.
#[derive(Default)]
pub(crate) struct SuggestionController {
    active: Option<SuggestionState>,
}

impl SuggestionController {
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn state(&self) -> Option<&SuggestionState> {
        self.active.as_ref()
    }

    pub fn items(&self) -> Vec<CatalogEntry> {
        match &self.active {
            Some(state) => filter_catalog(&state.query),
            None => Vec::new(),
        }
    }

    /// Call after text lands in the doc. Opens a session when the inserted
    /// text is the trigger char; whitespace input closes a live one.
    pub fn on_text_inserted(&mut self, inserted: &str, caret_after: &Caret) {
        if self.active.is_none() {
            if inserted == TRIGGER.to_string().as_str() && caret_after.offset >= 1 {
                self.active = Some(SuggestionState {
                    trigger: Caret::new(caret_after.path.clone(), caret_after.offset - 1),
                    query: String::new(),
                    selected: 0,
                });
            }
            return;
        }
        if inserted.chars().any(char::is_whitespace) {
            self.active = None;
        }
    }

    /// Re-derives the query from the doc, or cancels when the caret left the
    /// trigger window. Resets the highlight when the item set changes.
    pub fn refresh(&mut self, doc: &Doc, caret: &Caret) {
        let Some(state) = &mut self.active else {
            return;
        };
        let valid = caret.path == state.trigger.path && caret.offset > state.trigger.offset;
        let text = doc
            .node_at(&state.trigger.path)
            .and_then(|n| n.block_text());
        let query = match (valid, text) {
            (true, Some(text)) if caret.offset <= char_len(&text) => {
                let window = slice_chars(&text, state.trigger.offset, caret.offset);
                let mut chars = window.chars();
                if chars.next() != Some(TRIGGER) {
                    None
                } else {
                    let rest: String = chars.collect();
                    if rest.chars().any(char::is_whitespace) {
                        None
                    } else {
                        Some(rest)
                    }
                }
            }
            _ => None,
        };
        match query {
            Some(query) => {
                if query != state.query {
                    let before = filter_catalog(&state.query);
                    let after = filter_catalog(&query);
                    if before != after {
                        state.selected = 0;
                    }
                    state.query = query;
                }
            }
            None => self.active = None,
        }
    }

    pub fn move_down(&mut self) {
        let len = self.items().len();
        if let Some(state) = &mut self.active {
            if len > 0 {
                state.selected = (state.selected + 1) % len;
            }
        }
    }

    pub fn move_up(&mut self) {
        let len = self.items().len();
        if let Some(state) = &mut self.active {
            if len > 0 {
                state.selected = (state.selected + len - 1) % len;
            }
        }
    }

    pub fn cancel(&mut self) {
        self.active = None;
    }

    /// Closes the session and hands back the replacement range (trigger char
    /// through caret) plus the chosen action. `None` when nothing matches.
    pub fn commit(&mut self, caret: &Caret) -> Option<(Caret, Caret, SuggestionAction)> {
        let state = self.active.take()?;
        let items = filter_catalog(&state.query);
        let entry = items.get(state.selected).or_else(|| items.first())?;
        let action = entry.action;
        if caret.path != state.trigger.path || caret.offset <= state.trigger.offset {
            return None;
        }
        Some((state.trigger.clone(), caret.clone(), action))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc::Node;

    fn doc_with(text: &str) -> Doc {
        Doc::from_nodes(vec![Node::paragraph(text)])
    }

    fn start_session(text_before_caret: &str) -> (SuggestionController, Doc, Caret) {
        // text_before_caret includes the trigger char
        let trigger_at = char_len(text_before_caret) - 1;
        let doc = doc_with(text_before_caret);
        let caret = Caret::new(vec![0], trigger_at + 1);
        let mut ctl = SuggestionController::default();
        ctl.on_text_inserted("/", &caret);
        assert!(ctl.is_active());
        (ctl, doc, caret)
    }

    #[test]
    fn test_trigger_opens_with_empty_query() {
        let (ctl, _, _) = start_session("/");
        assert_eq!(ctl.state().unwrap().query, "");
        assert_eq!(ctl.items().len(), CATALOG.len());
    }

    #[test]
    fn test_prefix_filter_is_case_insensitive_and_ordered() {
        let items = filter_catalog("tí");
        assert_eq!(
            items.iter().map(|i| i.label).collect::<Vec<_>>(),
            vec!["Título 1", "Título 2"]
        );
        let items = filter_catalog("TAB");
        assert_eq!(items[0].label, "Tabela");
        assert!(filter_catalog("xyz").is_empty());
    }

    #[test]
    fn test_filter_grows_query_narrows_results() {
        // narrowing property: results for q2 ⊆ results for q1 when q1 is a prefix of q2
        let broad = filter_catalog("t");
        let narrow = filter_catalog("ta");
        assert!(narrow.iter().all(|e| broad.contains(e)));
        assert!(narrow.len() <= broad.len());
    }

    #[test]
    fn test_refresh_tracks_typed_query() {
        let (mut ctl, _, _) = start_session("/");
        let doc = doc_with("/tab");
        ctl.refresh(&doc, &Caret::new(vec![0], 4));
        assert_eq!(ctl.state().unwrap().query, "tab");
        assert_eq!(ctl.items()[0].label, "Tabela");
    }

    #[test]
    fn test_whitespace_cancels() {
        let (mut ctl, _, caret) = start_session("/");
        ctl.on_text_inserted(" ", &caret);
        assert!(!ctl.is_active());
    }

    #[test]
    fn test_caret_leaving_window_cancels() {
        let (mut ctl, doc, _) = start_session("/");
        // caret moved before the trigger
        ctl.refresh(&doc, &Caret::new(vec![0], 0));
        assert!(!ctl.is_active());

        let (mut ctl, _, _) = start_session("/");
        // caret moved to another block
        let doc = doc_with("/");
        ctl.refresh(&doc, &Caret::new(vec![1], 0));
        assert!(!ctl.is_active());
    }

    #[test]
    fn test_trigger_deletion_cancels() {
        let (mut ctl, _, _) = start_session("/");
        // backspace removed the slash
        let doc = doc_with("");
        ctl.refresh(&doc, &Caret::new(vec![0], 0));
        assert!(!ctl.is_active());
    }

    #[test]
    fn test_arrow_wrap_modulo_filtered_length() {
        let (mut ctl, _, _) = start_session("/");
        let doc = doc_with("/tít");
        ctl.refresh(&doc, &Caret::new(vec![0], 4));
        assert_eq!(ctl.items().len(), 2);
        ctl.move_down();
        assert_eq!(ctl.state().unwrap().selected, 1);
        ctl.move_down();
        assert_eq!(ctl.state().unwrap().selected, 0);
        ctl.move_up();
        assert_eq!(ctl.state().unwrap().selected, 1);
    }

    #[test]
    fn test_selection_resets_when_items_change() {
        let (mut ctl, _, _) = start_session("/");
        ctl.move_down();
        assert_eq!(ctl.state().unwrap().selected, 1);
        let doc = doc_with("/c");
        ctl.refresh(&doc, &Caret::new(vec![0], 2));
        assert_eq!(ctl.state().unwrap().selected, 0);
    }

    #[test]
    fn test_commit_returns_trigger_through_caret_range() {
        let (mut ctl, _, _) = start_session("nota /");
        let doc = doc_with("nota /tab");
        let caret = Caret::new(vec![0], 9);
        ctl.refresh(&doc, &caret);
        let (from, to, action) = ctl.commit(&caret).unwrap();
        assert_eq!(from, Caret::new(vec![0], 5));
        assert_eq!(to, caret);
        assert_eq!(action, SuggestionAction::Table);
        assert!(!ctl.is_active());
    }

    #[test]
    fn test_commit_with_no_match_yields_nothing() {
        let (mut ctl, _, _) = start_session("/");
        let doc = doc_with("/zz");
        let caret = Caret::new(vec![0], 3);
        ctl.refresh(&doc, &caret);
        // refresh keeps the session alive (query just has no hits)
        if ctl.is_active() {
            assert!(ctl.commit(&caret).is_none());
        }
        assert!(!ctl.is_active());
    }

    #[test]
    fn test_cap_is_enforced() {
        assert!(filter_catalog("").len() <= MAX_ITEMS);
    }
}
