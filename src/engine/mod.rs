use std::collections::VecDeque;

use crate::doc::pos::{Caret, Selection};
use crate::doc::{
    char_len, delete_inline_range, edit_inline_range, inline_text, insert_inline_text,
    link_extent_at, marks_at, normalize_inlines, range_has_mark, slice_chars, Align, Doc, Inline,
    Mark, MarkKind, Node,
};

/// Bounded undo depth. Oldest entries are dropped past this.
const HISTORY_LIMIT: usize = 100;

/// Document-wide character cap, enforced at insert time.
pub(crate) const CHAR_LIMIT: usize = 20_000;

/// Block conversion performed when a suggestion entry is committed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SuggestionAction {
    Heading(u8),
    BulletList,
    Blockquote,
    CodeBlock,
    HorizontalRule,
    Table,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Command {
    InsertText(String),
    DeleteRange { from: Caret, to: Caret },
    DeleteBackward,
    SplitBlock,
    ToggleMark(Mark),
    ClearMarks,
    SetTextColor(Option<String>),
    SetHighlight(Option<String>),
    SetLink(Option<String>),
    SetParagraph,
    ToggleHeading(u8),
    SetTextAlign(Align),
    ToggleBulletList,
    ToggleOrderedList,
    ToggleBlockquote,
    ToggleCodeBlock,
    InsertHorizontalRule,
    InsertImage { src: String },
    InsertMediaEmbed { src: String },
    InsertTable { rows: usize, cols: usize, with_header_row: bool },
    AddRowBefore,
    AddRowAfter,
    DeleteRow,
    AddColumnBefore,
    AddColumnAfter,
    DeleteColumn,
    DeleteTable,
    ApplySuggestion { from: Caret, to: Caret, action: SuggestionAction },
}

/// Head-block descriptor for the toolbar.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ActiveBlock {
    Paragraph,
    Heading(u8),
    CodeBlock,
}

#[derive(Clone, Debug, PartialEq)]
struct Snapshot {
    doc: Doc,
    selection: Selection,
}

struct TableCtx {
    table_path: Vec<usize>,
    row: usize,
    col: usize,
}

/// Transactional editing core. `apply` either performs a command fully and
/// returns `true`, or rejects it as a no-op and returns `false` with no
/// history entry. Selection moves bypass history entirely.
pub(crate) struct Engine {
    doc: Doc,
    selection: Selection,
    undo_stack: VecDeque<Snapshot>,
    redo_stack: Vec<Snapshot>,
}

impl Engine {
    pub fn new(initial: Option<Doc>) -> Self {
        let mut doc = initial.unwrap_or_else(Doc::empty);
        doc.ensure_nonempty();
        let selection = Selection::collapsed(doc.first_caret());
        Self {
            doc,
            selection,
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
        }
    }

    pub fn doc(&self) -> &Doc {
        &self.doc
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn to_json(&self) -> serde_json::Value {
        self.doc.to_json()
    }

    /// Pure selection move: clamped, no history, no notification.
    pub fn set_selection(&mut self, sel: Selection) {
        self.selection = self.doc.clamp_selection(&sel);
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo(&mut self) -> bool {
        match self.undo_stack.pop_back() {
            Some(snap) => {
                self.redo_stack.push(self.snapshot());
                self.restore(snap);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.redo_stack.pop() {
            Some(snap) => {
                let prior = self.snapshot();
                self.undo_stack.push_back(prior);
                self.restore(snap);
                true
            }
            None => false,
        }
    }

    pub fn apply(&mut self, cmd: &Command) -> bool {
        let before = self.snapshot();
        if !self.run(cmd) {
            // A partially mutated doc must not leak out of a rejected command.
            self.restore(before);
            return false;
        }
        self.doc.ensure_nonempty();
        self.selection = self.doc.clamp_selection(&self.selection);
        if self.undo_stack.len() == HISTORY_LIMIT {
            self.undo_stack.pop_front();
        }
        self.undo_stack.push_back(before);
        self.redo_stack.clear();
        true
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            doc: self.doc.clone(),
            selection: self.selection.clone(),
        }
    }

    fn restore(&mut self, snap: Snapshot) {
        self.doc = snap.doc;
        self.selection = snap.selection;
    }

    fn run(&mut self, cmd: &Command) -> bool {
        match cmd {
            Command::InsertText(text) => self.insert_text(text),
            Command::DeleteRange { from, to } => self.delete_range(from, to),
            Command::DeleteBackward => self.delete_backward(),
            Command::SplitBlock => self.split_block(),
            Command::ToggleMark(mark) => self.toggle_mark(mark),
            Command::ClearMarks => self.clear_marks(),
            Command::SetTextColor(value) => {
                self.set_value_mark(MarkKind::TextColor, value.clone(), |v| Mark::TextColor {
                    value: v,
                })
            }
            Command::SetHighlight(value) => {
                self.set_value_mark(MarkKind::HighlightColor, value.clone(), |v| {
                    Mark::HighlightColor { value: v }
                })
            }
            Command::SetLink(href) => self.set_link(href.clone()),
            Command::SetParagraph => self.convert_head_block(|node| to_paragraph(node)),
            Command::ToggleHeading(level) => self.toggle_heading(*level),
            Command::SetTextAlign(align) => self.set_text_align(*align),
            Command::ToggleBulletList => self.toggle_list(true),
            Command::ToggleOrderedList => self.toggle_list(false),
            Command::ToggleBlockquote => self.toggle_blockquote(),
            Command::ToggleCodeBlock => self.toggle_code_block(),
            Command::InsertHorizontalRule => self.insert_block_after(Node::HorizontalRule),
            Command::InsertImage { src } => {
                !src.trim().is_empty() && self.insert_block_after(Node::Image { src: src.clone() })
            }
            Command::InsertMediaEmbed { src } => {
                !src.trim().is_empty()
                    && self.insert_block_after(Node::MediaEmbed { src: src.clone() })
            }
            Command::InsertTable { rows, cols, with_header_row } => {
                self.insert_table(*rows, *cols, *with_header_row)
            }
            Command::AddRowBefore => self.add_row(false),
            Command::AddRowAfter => self.add_row(true),
            Command::DeleteRow => self.delete_row(),
            Command::AddColumnBefore => self.add_column(false),
            Command::AddColumnAfter => self.add_column(true),
            Command::DeleteColumn => self.delete_column(),
            Command::DeleteTable => self.delete_table(),
            Command::ApplySuggestion { from, to, action } => {
                self.apply_suggestion(from, to, *action)
            }
        }
    }

    /* ------------------------- text editing ------------------------- */

    fn insert_text(&mut self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        if !self.selection.is_collapsed() {
            let (from, to) = self.selection.ordered();
            if !self.delete_range(&from, &to) {
                return false;
            }
        }
        if self.doc.char_count() + char_len(text) > CHAR_LIMIT {
            return false;
        }
        let caret = self.selection.head.clone();
        let Some(node) = self.doc.node_at_mut(&caret.path) else {
            return false;
        };
        match node {
            Node::CodeBlock { text: code } => {
                let offset = caret.offset.min(char_len(code));
                let mut next = slice_chars(code, 0, offset);
                next.push_str(text);
                next.push_str(&slice_chars(code, offset, char_len(code)));
                *code = next;
            }
            _ => match node.inlines_mut() {
                Some(inlines) => {
                    *inlines = insert_inline_text(inlines, caret.offset, text);
                }
                None => return false,
            },
        }
        let caret = Caret::new(caret.path, caret.offset + char_len(text));
        self.selection = Selection::collapsed(caret);
        true
    }

    /// Deletes `[from, to)`. Cross-block deletion is supported between text
    /// blocks sharing a parent: the intervening siblings are removed and the
    /// boundary blocks merged.
    fn delete_range(&mut self, from: &Caret, to: &Caret) -> bool {
        if from == to {
            return false;
        }
        if from.path == to.path {
            let (start, end) = (from.offset.min(to.offset), from.offset.max(to.offset));
            let Some(node) = self.doc.node_at_mut(&from.path) else {
                return false;
            };
            match node {
                Node::CodeBlock { text } => {
                    let len = char_len(text);
                    let mut next = slice_chars(text, 0, start.min(len));
                    next.push_str(&slice_chars(text, end.min(len), len));
                    *text = next;
                }
                _ => match node.inlines_mut() {
                    Some(inlines) => *inlines = delete_inline_range(inlines, start, end),
                    None => return false,
                },
            }
            self.selection = Selection::collapsed(Caret::new(from.path.clone(), start));
            return true;
        }
        let (from, to) = if from.path < to.path {
            (from.clone(), to.clone())
        } else {
            (to.clone(), from.clone())
        };
        // Same parent only; anything fancier is out of scope for the surface.
        if from.path.len() != to.path.len()
            || from.path[..from.path.len() - 1] != to.path[..to.path.len() - 1]
        {
            return false;
        }
        let from_idx = *from.path.last().unwrap_or(&0);
        let to_idx = *to.path.last().unwrap_or(&0);
        let tail = {
            let Some(to_node) = self.doc.node_at(&to.path) else {
                return false;
            };
            match to_node {
                Node::Paragraph { inlines, .. } | Node::Heading { inlines, .. } => {
                    let text = inline_text(inlines);
                    Tail::Runs(delete_inline_range(inlines, 0, to.offset.min(char_len(&text))))
                }
                Node::CodeBlock { text } => {
                    Tail::Text(slice_chars(text, to.offset.min(char_len(text)), char_len(text)))
                }
                _ => return false,
            }
        };
        {
            let Some(from_node) = self.doc.node_at_mut(&from.path) else {
                return false;
            };
            match (from_node, tail) {
                (Node::CodeBlock { text }, Tail::Text(rest)) => {
                    *text = slice_chars(text, 0, from.offset.min(char_len(text)));
                    text.push_str(&rest);
                }
                (Node::CodeBlock { text }, Tail::Runs(runs)) => {
                    *text = slice_chars(text, 0, from.offset.min(char_len(text)));
                    text.push_str(&inline_text(&runs));
                }
                (node, Tail::Runs(runs)) => match node.inlines_mut() {
                    Some(inlines) => {
                        let mut kept = delete_inline_range(
                            inlines,
                            from.offset,
                            char_len(&inline_text(inlines)),
                        );
                        kept.extend(runs);
                        *inlines = normalize_inlines(kept);
                    }
                    None => return false,
                },
                (node, Tail::Text(rest)) => match node.inlines_mut() {
                    Some(inlines) => {
                        let mut kept = delete_inline_range(
                            inlines,
                            from.offset,
                            char_len(&inline_text(inlines)),
                        );
                        kept.push(Inline::plain(rest));
                        *inlines = normalize_inlines(kept);
                    }
                    None => return false,
                },
            }
        }
        let parent = &from.path[..from.path.len() - 1];
        let removed = if parent.is_empty() {
            self.doc.nodes.drain(from_idx + 1..=to_idx).count()
        } else {
            match self.doc.node_at_mut(parent).and_then(|n| n.children_mut()) {
                Some(children) => children.drain(from_idx + 1..=to_idx).count(),
                None => return false,
            }
        };
        let _ = removed;
        self.selection = Selection::collapsed(from);
        true
    }

    fn delete_backward(&mut self) -> bool {
        if !self.selection.is_collapsed() {
            let (from, to) = self.selection.ordered();
            return self.delete_range(&from, &to);
        }
        let caret = self.selection.head.clone();
        if caret.offset > 0 {
            return self.delete_range(
                &Caret::new(caret.path.clone(), caret.offset - 1),
                &caret,
            );
        }
        // At block start: merge into the previous sibling text block.
        let Some(&idx) = caret.path.last() else {
            return false;
        };
        if idx == 0 {
            return false;
        }
        let mut prev_path = caret.path.clone();
        *prev_path.last_mut().unwrap() = idx - 1;
        let prev_len = match self.doc.node_at(&prev_path).and_then(|n| n.text_len()) {
            Some(len) => len,
            None => return false,
        };
        self.delete_range(&Caret::new(prev_path, prev_len), &caret)
    }

    fn split_block(&mut self) -> bool {
        if !self.selection.is_collapsed() {
            let (from, to) = self.selection.ordered();
            if !self.delete_range(&from, &to) {
                return false;
            }
        }
        let caret = self.selection.head.clone();
        let Some(node) = self.doc.node_at_mut(&caret.path) else {
            return false;
        };
        let (left, right) = match node {
            Node::CodeBlock { .. } => {
                // Enter inside code inserts a newline rather than a new block.
                return self.insert_text("\n");
            }
            Node::Paragraph { align, inlines } => {
                let len = char_len(&inline_text(inlines));
                let left = delete_inline_range(inlines, caret.offset, len);
                let right = delete_inline_range(inlines, 0, caret.offset);
                (
                    Node::Paragraph { align: *align, inlines: left },
                    Node::Paragraph { align: *align, inlines: right },
                )
            }
            Node::Heading { level, align, inlines } => {
                let len = char_len(&inline_text(inlines));
                let left = delete_inline_range(inlines, caret.offset, len);
                let right = delete_inline_range(inlines, 0, caret.offset);
                (
                    Node::Heading { level: *level, align: *align, inlines: left },
                    Node::Paragraph { align: *align, inlines: right },
                )
            }
            _ => return false,
        };
        *node = left;
        let Some(&idx) = caret.path.last() else {
            return false;
        };
        let parent = &caret.path[..caret.path.len() - 1];
        if parent.is_empty() {
            self.doc.nodes.insert(idx + 1, right);
        } else {
            match self.doc.node_at_mut(parent).and_then(|n| n.children_mut()) {
                Some(children) => children.insert(idx + 1, right),
                None => return false,
            }
        }
        let mut new_path = caret.path.clone();
        *new_path.last_mut().unwrap() = idx + 1;
        self.selection = Selection::collapsed(Caret::new(new_path, 0));
        true
    }

    /* --------------------------- marks ------------------------------ */

    /// Calls `f` once per text block intersected by the ordered range, with
    /// the char window covered inside that block.
    fn for_each_block_in_range(
        &mut self,
        from: &Caret,
        to: &Caret,
        f: &mut dyn FnMut(&mut Node, usize, usize),
    ) {
        let paths = self.doc.text_block_paths();
        for path in paths {
            if path < from.path || path > to.path {
                continue;
            }
            let len = match self.doc.node_at(&path).and_then(|n| n.text_len()) {
                Some(len) => len,
                None => continue,
            };
            let start = if path == from.path { from.offset.min(len) } else { 0 };
            let end = if path == to.path { to.offset.min(len) } else { len };
            if start >= end {
                continue;
            }
            if let Some(node) = self.doc.node_at_mut(&path) {
                f(node, start, end);
            }
        }
    }

    fn selection_has_mark(&self, kind: MarkKind) -> bool {
        let (from, to) = self.selection.ordered();
        let mut any = false;
        for path in self.doc.text_block_paths() {
            if path < from.path || path > to.path {
                continue;
            }
            let Some(node) = self.doc.node_at(&path) else { continue };
            let Some(inlines) = node.inlines() else {
                if node.text_len().unwrap_or(0) > 0 {
                    return false; // code blocks never carry marks
                }
                continue;
            };
            let len = char_len(&inline_text(inlines));
            let start = if path == from.path { from.offset.min(len) } else { 0 };
            let end = if path == to.path { to.offset.min(len) } else { len };
            if start >= end {
                continue;
            }
            any = true;
            if !range_has_mark(inlines, start, end, kind) {
                return false;
            }
        }
        any
    }

    fn edit_marks_in_selection(&mut self, f: &dyn Fn(&mut Vec<Mark>)) -> bool {
        if self.selection.is_collapsed() {
            return false;
        }
        let (from, to) = self.selection.ordered();
        let mut touched = false;
        self.for_each_block_in_range(&from.clone(), &to.clone(), &mut |node, start, end| {
            if let Some(inlines) = node.inlines_mut() {
                *inlines = edit_inline_range(inlines, start, end, f);
                touched = true;
            }
        });
        touched
    }

    fn toggle_mark(&mut self, mark: &Mark) -> bool {
        let kind = mark.kind();
        let remove = self.selection_has_mark(kind);
        let mark = mark.clone();
        self.edit_marks_in_selection(&move |marks| {
            marks.retain(|m| m.kind() != kind);
            if !remove {
                marks.push(mark.clone());
            }
        })
    }

    fn clear_marks(&mut self) -> bool {
        self.edit_marks_in_selection(&|marks| marks.clear())
    }

    fn set_value_mark(
        &mut self,
        kind: MarkKind,
        value: Option<String>,
        make: impl Fn(String) -> Mark + 'static,
    ) -> bool {
        self.edit_marks_in_selection(&move |marks| {
            marks.retain(|m| m.kind() != kind);
            if let Some(v) = &value {
                marks.push(make(v.clone()));
            }
        })
    }

    /// Empty/None href clears the link; the affected range is the surrounding
    /// link extent when the selection is collapsed inside one.
    fn set_link(&mut self, href: Option<String>) -> bool {
        let href = href.filter(|h| !h.trim().is_empty());
        let (from, to) = if self.selection.is_collapsed() {
            let caret = self.selection.head.clone();
            let Some(inlines) = self.doc.node_at(&caret.path).and_then(|n| n.inlines()) else {
                return false;
            };
            let Some((start, end, _)) = link_extent_at(inlines, caret.offset) else {
                return false;
            };
            (
                Caret::new(caret.path.clone(), start),
                Caret::new(caret.path, end),
            )
        } else {
            self.selection.ordered()
        };
        let mut touched = false;
        self.for_each_block_in_range(&from, &to, &mut |node, start, end| {
            if let Some(inlines) = node.inlines_mut() {
                let href = href.clone();
                *inlines = edit_inline_range(inlines, start, end, &move |marks| {
                    marks.retain(|m| m.kind() != MarkKind::Link);
                    if let Some(h) = &href {
                        marks.push(Mark::Link { href: h.clone() });
                    }
                });
                touched = true;
            }
        });
        touched
    }

    /* ----------------------- block structure ------------------------ */

    fn convert_head_block(&mut self, f: impl Fn(&Node) -> Option<Node>) -> bool {
        let path = self.selection.head.path.clone();
        let Some(node) = self.doc.node_at_mut(&path) else {
            return false;
        };
        match f(node) {
            Some(next) => {
                *node = next;
                true
            }
            None => false,
        }
    }

    fn toggle_heading(&mut self, level: u8) -> bool {
        if !(1..=3).contains(&level) {
            return false;
        }
        self.convert_head_block(move |node| match node {
            Node::Heading { level: l, align, inlines } if *l == level => Some(Node::Paragraph {
                align: *align,
                inlines: inlines.clone(),
            }),
            Node::Paragraph { align, inlines } | Node::Heading { align, inlines, .. } => {
                Some(Node::Heading {
                    level,
                    align: *align,
                    inlines: inlines.clone(),
                })
            }
            _ => None,
        })
    }

    fn set_text_align(&mut self, align: Align) -> bool {
        let (from, to) = self.selection.ordered();
        let paths = self.doc.text_block_paths();
        let mut touched = false;
        for path in paths {
            if path < from.path || path > to.path {
                continue;
            }
            if let Some(node) = self.doc.node_at_mut(&path) {
                match node {
                    Node::Paragraph { align: a, .. } | Node::Heading { align: a, .. } => {
                        *a = Some(align);
                        touched = true;
                    }
                    _ => {}
                }
            }
        }
        touched
    }

    /// Path of the nearest ancestor (inclusive prefix) matching `pred`.
    fn ancestor_path(&self, path: &[usize], pred: impl Fn(&Node) -> bool) -> Option<Vec<usize>> {
        for end in (1..=path.len()).rev() {
            let prefix = &path[..end];
            if self.doc.node_at(prefix).map(&pred).unwrap_or(false) {
                return Some(prefix.to_vec());
            }
        }
        None
    }

    fn replace_at(&mut self, path: &[usize], nodes: Vec<Node>) -> bool {
        let Some((&idx, parent)) = path.split_last() else {
            return false;
        };
        if parent.is_empty() {
            if idx >= self.doc.nodes.len() {
                return false;
            }
            self.doc.nodes.splice(idx..=idx, nodes);
            true
        } else {
            match self.doc.node_at_mut(parent).and_then(|n| n.children_mut()) {
                Some(children) if idx < children.len() => {
                    children.splice(idx..=idx, nodes);
                    true
                }
                _ => false,
            }
        }
    }

    fn toggle_list(&mut self, bullet: bool) -> bool {
        let head_path = self.selection.head.path.clone();
        let is_list = |n: &Node| matches!(n, Node::BulletList { .. } | Node::OrderedList { .. });
        if let Some(list_path) = self.ancestor_path(&head_path, is_list) {
            let same_kind = matches!(
                (self.doc.node_at(&list_path), bullet),
                (Some(Node::BulletList { .. }), true) | (Some(Node::OrderedList { .. }), false)
            );
            if same_kind {
                // Unwrap: the list becomes its items' blocks, in order.
                let Some(node) = self.doc.node_at(&list_path) else {
                    return false;
                };
                let blocks: Vec<Node> = node
                    .children()
                    .unwrap_or(&[])
                    .iter()
                    .flat_map(|item| item.children().unwrap_or(&[]).to_vec())
                    .collect();
                return self.replace_at(&list_path, blocks);
            }
            // Different kind: swap the list variant in place.
            let Some(node) = self.doc.node_at_mut(&list_path) else {
                return false;
            };
            let items = node.children().unwrap_or(&[]).to_vec();
            *node = if bullet {
                Node::BulletList { items }
            } else {
                Node::OrderedList { items }
            };
            return true;
        }
        let Some(node) = self.doc.node_at(&head_path) else {
            return false;
        };
        if !node.is_text_block() {
            return false;
        }
        let block = node.clone();
        let item = Node::ListItem { children: vec![block] };
        let list = if bullet {
            Node::BulletList { items: vec![item] }
        } else {
            Node::OrderedList { items: vec![item] }
        };
        if !self.replace_at(&head_path, vec![list]) {
            return false;
        }
        let mut path = head_path;
        path.extend_from_slice(&[0, 0]);
        self.selection = Selection::collapsed(Caret::new(path, self.selection.head.offset));
        true
    }

    fn toggle_blockquote(&mut self) -> bool {
        let head_path = self.selection.head.path.clone();
        if let Some(quote_path) =
            self.ancestor_path(&head_path, |n| matches!(n, Node::Blockquote { .. }))
        {
            let Some(node) = self.doc.node_at(&quote_path) else {
                return false;
            };
            let children = node.children().unwrap_or(&[]).to_vec();
            return self.replace_at(&quote_path, children);
        }
        let Some(node) = self.doc.node_at(&head_path) else {
            return false;
        };
        if !node.is_text_block() {
            return false;
        }
        let block = node.clone();
        if !self.replace_at(&head_path, vec![Node::Blockquote { children: vec![block] }]) {
            return false;
        }
        let mut path = head_path;
        path.push(0);
        self.selection = Selection::collapsed(Caret::new(path, self.selection.head.offset));
        true
    }

    fn toggle_code_block(&mut self) -> bool {
        self.convert_head_block(|node| match node {
            Node::CodeBlock { text } => Some(Node::Paragraph {
                align: None,
                inlines: if text.is_empty() {
                    Vec::new()
                } else {
                    vec![Inline::plain(text.clone())]
                },
            }),
            Node::Paragraph { inlines, .. } | Node::Heading { inlines, .. } => {
                Some(Node::CodeBlock { text: inline_text(inlines) })
            }
            _ => None,
        })
    }

    /// Inserts a void/structural block after the head's top-level block and
    /// leaves the caret in the text block that follows it.
    fn insert_block_after(&mut self, node: Node) -> bool {
        let Some(&top) = self.selection.head.path.first() else {
            return false;
        };
        let at = (top + 1).min(self.doc.nodes.len());
        self.doc.nodes.insert(at, node);
        let needs_trailing = !self
            .doc
            .nodes
            .get(at + 1)
            .map(|n| n.is_text_block())
            .unwrap_or(false);
        if needs_trailing {
            self.doc.nodes.insert(at + 1, Node::empty_paragraph());
        }
        self.selection = Selection::collapsed(Caret::new(vec![at + 1], 0));
        true
    }

    /* ---------------------------- tables ---------------------------- */

    fn table_ctx(&self) -> Option<TableCtx> {
        let path = &self.selection.head.path;
        let table_path = self.ancestor_path(path, |n| matches!(n, Node::Table { .. }))?;
        let row = *path.get(table_path.len())?;
        let col = *path.get(table_path.len() + 1)?;
        Some(TableCtx { table_path, row, col })
    }

    pub fn selection_in_table(&self) -> bool {
        self.table_ctx().is_some()
    }

    fn insert_table(&mut self, rows: usize, cols: usize, with_header_row: bool) -> bool {
        if rows == 0 || cols == 0 || self.selection_in_table() {
            return false;
        }
        let cell = |header: bool| {
            let children = vec![Node::empty_paragraph()];
            if header {
                Node::TableHeaderCell { children }
            } else {
                Node::TableCell { children }
            }
        };
        let table_rows: Vec<Node> = (0..rows)
            .map(|r| Node::TableRow {
                cells: (0..cols).map(|_| cell(with_header_row && r == 0)).collect(),
            })
            .collect();
        let Some(&top) = self.selection.head.path.first() else {
            return false;
        };
        let at = (top + 1).min(self.doc.nodes.len());
        self.doc.nodes.insert(at, Node::Table { rows: table_rows });
        self.selection = Selection::collapsed(Caret::new(vec![at, 0, 0, 0], 0));
        true
    }

    fn add_row(&mut self, after: bool) -> bool {
        let Some(ctx) = self.table_ctx() else {
            return false;
        };
        let Some(Node::Table { rows }) = self.doc.node_at_mut(&ctx.table_path) else {
            return false;
        };
        let width = rows
            .get(ctx.row)
            .and_then(|r| r.children())
            .map(|c| c.len())
            .unwrap_or(0);
        if width == 0 {
            return false;
        }
        let new_row = Node::TableRow {
            cells: (0..width)
                .map(|_| Node::TableCell { children: vec![Node::empty_paragraph()] })
                .collect(),
        };
        let at = if after { ctx.row + 1 } else { ctx.row };
        rows.insert(at, new_row);
        true
    }

    fn delete_row(&mut self) -> bool {
        let Some(ctx) = self.table_ctx() else {
            return false;
        };
        let remaining = {
            let Some(Node::Table { rows }) = self.doc.node_at_mut(&ctx.table_path) else {
                return false;
            };
            if ctx.row >= rows.len() {
                return false;
            }
            rows.remove(ctx.row);
            rows.len()
        };
        if remaining == 0 {
            return self.remove_table_at(ctx.table_path);
        }
        true
    }

    fn add_column(&mut self, after: bool) -> bool {
        let Some(ctx) = self.table_ctx() else {
            return false;
        };
        let Some(Node::Table { rows }) = self.doc.node_at_mut(&ctx.table_path) else {
            return false;
        };
        for row in rows.iter_mut() {
            let Some(cells) = row.children_mut() else {
                continue;
            };
            let header = matches!(cells.first(), Some(Node::TableHeaderCell { .. }));
            let children = vec![Node::empty_paragraph()];
            let cell = if header {
                Node::TableHeaderCell { children }
            } else {
                Node::TableCell { children }
            };
            let at = if after { ctx.col + 1 } else { ctx.col };
            cells.insert(at.min(cells.len()), cell);
        }
        true
    }

    fn delete_column(&mut self) -> bool {
        let Some(ctx) = self.table_ctx() else {
            return false;
        };
        let empty = {
            let Some(Node::Table { rows }) = self.doc.node_at_mut(&ctx.table_path) else {
                return false;
            };
            for row in rows.iter_mut() {
                if let Some(cells) = row.children_mut() {
                    if ctx.col < cells.len() {
                        cells.remove(ctx.col);
                    }
                }
            }
            rows.iter()
                .all(|r| r.children().map(|c| c.is_empty()).unwrap_or(true))
        };
        if empty {
            return self.remove_table_at(ctx.table_path);
        }
        true
    }

    fn delete_table(&mut self) -> bool {
        let Some(ctx) = self.table_ctx() else {
            return false;
        };
        self.remove_table_at(ctx.table_path)
    }

    fn remove_table_at(&mut self, table_path: Vec<usize>) -> bool {
        self.replace_at(&table_path, Vec::new())
    }

    /* ------------------------- suggestions -------------------------- */

    /// One-entry composite: converts the block at the trigger position, then
    /// deletes the trigger-through-caret text from the converted block.
    fn apply_suggestion(&mut self, from: &Caret, to: &Caret, action: SuggestionAction) -> bool {
        if from.path != to.path || from.offset >= to.offset {
            return false;
        }
        if !self
            .doc
            .node_at(&from.path)
            .map(|n| n.is_text_block())
            .unwrap_or(false)
        {
            return false;
        }
        self.selection = Selection::collapsed(to.clone());
        match action {
            SuggestionAction::Heading(level) => {
                if !self.toggle_heading(level) {
                    return false;
                }
                self.delete_range(from, to)
            }
            SuggestionAction::CodeBlock => {
                if !self.toggle_code_block() {
                    return false;
                }
                self.delete_range(from, to)
            }
            SuggestionAction::BulletList => {
                if !self.toggle_list(true) {
                    return false;
                }
                let mut path = from.path.clone();
                path.extend_from_slice(&[0, 0]);
                self.delete_range(
                    &Caret::new(path.clone(), from.offset),
                    &Caret::new(path, to.offset),
                )
            }
            SuggestionAction::Blockquote => {
                if !self.toggle_blockquote() {
                    return false;
                }
                let mut path = from.path.clone();
                path.push(0);
                self.delete_range(
                    &Caret::new(path.clone(), from.offset),
                    &Caret::new(path, to.offset),
                )
            }
            SuggestionAction::HorizontalRule => {
                if !self.delete_range(from, to) {
                    return false;
                }
                self.insert_block_after(Node::HorizontalRule)
            }
            SuggestionAction::Table => {
                if !self.delete_range(from, to) {
                    return false;
                }
                self.insert_table(3, 3, true)
            }
        }
    }

    /* --------------------------- queries ---------------------------- */

    pub fn is_mark_active(&self, kind: MarkKind) -> bool {
        if self.selection.is_collapsed() {
            let caret = &self.selection.head;
            return self
                .doc
                .node_at(&caret.path)
                .and_then(|n| n.inlines())
                .map(|inlines| {
                    marks_at(inlines, caret.offset).iter().any(|m| m.kind() == kind)
                })
                .unwrap_or(false);
        }
        self.selection_has_mark(kind)
    }

    pub fn active_block(&self) -> ActiveBlock {
        match self.doc.node_at(&self.selection.head.path) {
            Some(Node::Heading { level, .. }) => ActiveBlock::Heading(*level),
            Some(Node::CodeBlock { .. }) => ActiveBlock::CodeBlock,
            _ => ActiveBlock::Paragraph,
        }
    }

    pub fn is_block_in(&self, pred: impl Fn(&Node) -> bool) -> bool {
        self.ancestor_path(&self.selection.head.path, pred).is_some()
    }

    pub fn is_align_active(&self, align: Align) -> bool {
        match self.doc.node_at(&self.selection.head.path) {
            Some(Node::Paragraph { align: a, .. }) | Some(Node::Heading { align: a, .. }) => {
                a.unwrap_or(Align::Left) == align
            }
            _ => align == Align::Left,
        }
    }

    pub fn link_href_at_selection(&self) -> Option<String> {
        let caret = &self.selection.head;
        let inlines = self.doc.node_at(&caret.path)?.inlines()?;
        link_extent_at(inlines, caret.offset).map(|(_, _, href)| href)
    }

    pub fn active_text_color(&self) -> Option<String> {
        self.active_value_mark(MarkKind::TextColor)
    }

    pub fn active_highlight(&self) -> Option<String> {
        self.active_value_mark(MarkKind::HighlightColor)
    }

    fn active_value_mark(&self, kind: MarkKind) -> Option<String> {
        let caret = &self.selection.head;
        let inlines = self.doc.node_at(&caret.path)?.inlines()?;
        marks_at(inlines, caret.offset)
            .iter()
            .find(|m| m.kind() == kind)
            .and_then(|m| match m {
                Mark::TextColor { value } | Mark::HighlightColor { value } => Some(value.clone()),
                _ => None,
            })
    }
}

enum Tail {
    Runs(Vec<Inline>),
    Text(String),
}

fn to_paragraph(node: &Node) -> Option<Node> {
    match node {
        Node::Paragraph { .. } => None,
        Node::Heading { align, inlines, .. } => Some(Node::Paragraph {
            align: *align,
            inlines: inlines.clone(),
        }),
        Node::CodeBlock { text } => Some(Node::Paragraph {
            align: None,
            inlines: if text.is_empty() {
                Vec::new()
            } else {
                vec![Inline::plain(text.clone())]
            },
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_str(engine: &mut Engine, text: &str) {
        for ch in text.chars() {
            assert!(engine.apply(&Command::InsertText(ch.to_string())));
        }
    }

    fn select(engine: &mut Engine, path: Vec<usize>, from: usize, to: usize) {
        engine.set_selection(Selection {
            anchor: Caret::new(path.clone(), from),
            head: Caret::new(path, to),
        });
    }

    #[test]
    fn test_insert_and_delete_text() {
        let mut engine = Engine::new(None);
        type_str(&mut engine, "olá mundo");
        assert_eq!(engine.doc().plain_text(), "olá mundo");
        assert!(engine.apply(&Command::DeleteRange {
            from: Caret::new(vec![0], 3),
            to: Caret::new(vec![0], 9),
        }));
        assert_eq!(engine.doc().plain_text(), "olá");
        assert_eq!(engine.selection().head, Caret::new(vec![0], 3));
    }

    #[test]
    fn test_undo_redo_restores_doc_and_selection() {
        let mut engine = Engine::new(None);
        type_str(&mut engine, "ab");
        let doc_after = engine.doc().clone();
        let sel_after = engine.selection().clone();
        assert!(engine.undo());
        assert_eq!(engine.doc().plain_text(), "a");
        assert!(engine.redo());
        assert_eq!(engine.doc(), &doc_after);
        assert_eq!(engine.selection(), &sel_after);
    }

    #[test]
    fn test_rejected_command_pushes_no_history() {
        let mut engine = Engine::new(None);
        // collapsed selection: toggling a mark has nothing to act on
        assert!(!engine.apply(&Command::ToggleMark(Mark::Bold)));
        assert!(!engine.can_undo());
        // empty insert
        assert!(!engine.apply(&Command::InsertText(String::new())));
        assert!(!engine.can_undo());
    }

    #[test]
    fn test_history_is_bounded() {
        let mut engine = Engine::new(None);
        for _ in 0..150 {
            assert!(engine.apply(&Command::InsertText("x".into())));
        }
        let mut undone = 0;
        while engine.undo() {
            undone += 1;
        }
        assert_eq!(undone, HISTORY_LIMIT);
        // the oldest 50 inserts are no longer reachable
        assert_eq!(engine.doc().plain_text().chars().count(), 50);
    }

    #[test]
    fn test_redo_cleared_by_new_command() {
        let mut engine = Engine::new(None);
        type_str(&mut engine, "ab");
        assert!(engine.undo());
        assert!(engine.apply(&Command::InsertText("c".into())));
        assert!(!engine.can_redo());
        assert_eq!(engine.doc().plain_text(), "ac");
    }

    #[test]
    fn test_selection_moves_do_not_touch_history() {
        let mut engine = Engine::new(None);
        type_str(&mut engine, "abc");
        let depth_before = {
            let mut n = 0;
            while engine.undo() {
                n += 1;
            }
            while engine.redo() {}
            n
        };
        select(&mut engine, vec![0], 0, 2);
        engine.set_selection(Selection::collapsed(Caret::new(vec![0], 1)));
        let mut depth_after = 0;
        while engine.undo() {
            depth_after += 1;
        }
        assert_eq!(depth_before, depth_after);
    }

    #[test]
    fn test_bold_toggle_is_idempotent_pairwise() {
        let mut engine = Engine::new(None);
        type_str(&mut engine, "palavra chave");
        select(&mut engine, vec![0], 0, 7);
        let before = engine.doc().clone();
        assert!(engine.apply(&Command::ToggleMark(Mark::Bold)));
        assert!(engine.is_mark_active(MarkKind::Bold));
        assert!(engine.apply(&Command::ToggleMark(Mark::Bold)));
        assert_eq!(engine.doc(), &before);
    }

    #[test]
    fn test_mixed_range_toggle_applies_everywhere() {
        let mut engine = Engine::new(None);
        type_str(&mut engine, "abcd");
        select(&mut engine, vec![0], 0, 2);
        assert!(engine.apply(&Command::ToggleMark(Mark::Bold)));
        // half bold: toggling the whole range bolds the rest
        select(&mut engine, vec![0], 0, 4);
        assert!(engine.apply(&Command::ToggleMark(Mark::Bold)));
        assert!(engine.is_mark_active(MarkKind::Bold));
    }

    #[test]
    fn test_color_last_set_wins_and_clear() {
        let mut engine = Engine::new(None);
        type_str(&mut engine, "cor");
        select(&mut engine, vec![0], 0, 3);
        assert!(engine.apply(&Command::SetTextColor(Some("#E03131".into()))));
        assert!(engine.apply(&Command::SetTextColor(Some("#1971C2".into()))));
        select(&mut engine, vec![0], 2, 2);
        assert_eq!(engine.active_text_color().as_deref(), Some("#1971C2"));
        select(&mut engine, vec![0], 0, 3);
        assert!(engine.apply(&Command::SetTextColor(None)));
        select(&mut engine, vec![0], 2, 2);
        assert_eq!(engine.active_text_color(), None);
    }

    #[test]
    fn test_empty_link_clears_full_extent_from_collapsed_caret() {
        let mut engine = Engine::new(None);
        type_str(&mut engine, "ver o site aqui");
        select(&mut engine, vec![0], 4, 10);
        assert!(engine.apply(&Command::SetLink(Some("https://a".into()))));
        // caret in the middle of the link, collapsed
        select(&mut engine, vec![0], 7, 7);
        assert_eq!(engine.link_href_at_selection().as_deref(), Some("https://a"));
        assert!(engine.apply(&Command::SetLink(None)));
        let inlines = engine.doc().node_at(&[0]).unwrap().inlines().unwrap().to_vec();
        assert!(crate::doc::link_extent_at(&inlines, 7).is_none());
        assert_eq!(engine.doc().plain_text(), "ver o site aqui");
    }

    #[test]
    fn test_set_link_rejected_outside_link_when_collapsed() {
        let mut engine = Engine::new(None);
        type_str(&mut engine, "sem link");
        select(&mut engine, vec![0], 2, 2);
        assert!(!engine.apply(&Command::SetLink(Some("https://a".into()))));
        assert!(!engine.can_undo() || engine.doc().plain_text() == "sem link");
    }

    #[test]
    fn test_heading_toggle_and_paragraph() {
        let mut engine = Engine::new(None);
        type_str(&mut engine, "titulo");
        assert!(engine.apply(&Command::ToggleHeading(2)));
        assert_eq!(engine.active_block(), ActiveBlock::Heading(2));
        assert!(engine.apply(&Command::ToggleHeading(2)));
        assert_eq!(engine.active_block(), ActiveBlock::Paragraph);
        assert!(!engine.apply(&Command::ToggleHeading(9)));
    }

    #[test]
    fn test_list_wrap_and_unwrap_round_trip() {
        let mut engine = Engine::new(None);
        type_str(&mut engine, "item");
        assert!(engine.apply(&Command::ToggleBulletList));
        assert!(matches!(engine.doc().nodes[0], Node::BulletList { .. }));
        assert_eq!(engine.selection().head.path, vec![0, 0, 0]);
        // same command from inside the list unwraps it
        assert!(engine.apply(&Command::ToggleBulletList));
        assert!(matches!(engine.doc().nodes[0], Node::Paragraph { .. }));
        assert_eq!(engine.doc().plain_text(), "item");
    }

    #[test]
    fn test_list_kind_swap_in_place() {
        let mut engine = Engine::new(None);
        type_str(&mut engine, "item");
        assert!(engine.apply(&Command::ToggleBulletList));
        assert!(engine.apply(&Command::ToggleOrderedList));
        assert!(matches!(engine.doc().nodes[0], Node::OrderedList { .. }));
        assert_eq!(engine.doc().plain_text(), "item");
    }

    #[test]
    fn test_table_shape_invariant_through_row_and_column_ops() {
        let mut engine = Engine::new(None);
        assert!(engine.apply(&Command::InsertTable { rows: 3, cols: 3, with_header_row: true }));
        assert!(engine.selection_in_table());
        assert!(engine.apply(&Command::AddRowAfter));
        assert!(engine.apply(&Command::AddColumnAfter));
        assert!(engine.apply(&Command::DeleteRow));
        let Node::Table { rows } = &engine.doc().nodes[1] else {
            panic!("table expected");
        };
        assert_eq!(rows.len(), 3);
        let widths: Vec<usize> = rows
            .iter()
            .map(|r| r.children().unwrap().len())
            .collect();
        assert!(widths.iter().all(|w| *w == 4), "ragged rows: {widths:?}");
        // header row preserved
        let Node::TableRow { cells } = &rows[0] else { panic!() };
        assert!(cells.iter().all(|c| matches!(c, Node::TableHeaderCell { .. })));
    }

    #[test]
    fn test_delete_last_row_removes_table() {
        let mut engine = Engine::new(None);
        assert!(engine.apply(&Command::InsertTable { rows: 1, cols: 2, with_header_row: false }));
        assert!(engine.apply(&Command::DeleteRow));
        assert!(!engine.doc().nodes.iter().any(|n| matches!(n, Node::Table { .. })));
        // selection collapsed to a surviving block
        assert!(engine.doc().node_at(&engine.selection().head.path).is_some());
    }

    #[test]
    fn test_table_commands_rejected_outside_table() {
        let mut engine = Engine::new(None);
        type_str(&mut engine, "texto");
        for cmd in [
            Command::AddRowAfter,
            Command::AddRowBefore,
            Command::DeleteRow,
            Command::AddColumnAfter,
            Command::AddColumnBefore,
            Command::DeleteColumn,
            Command::DeleteTable,
        ] {
            assert!(!engine.apply(&cmd), "{cmd:?} should be a no-op outside a table");
        }
    }

    #[test]
    fn test_selection_in_table_follows_caret() {
        let mut engine = Engine::new(None);
        type_str(&mut engine, "fora");
        assert!(!engine.selection_in_table());
        assert!(engine.apply(&Command::InsertTable { rows: 2, cols: 2, with_header_row: false }));
        assert!(engine.selection_in_table());
        engine.set_selection(Selection::collapsed(Caret::new(vec![0], 0)));
        assert!(!engine.selection_in_table());
    }

    #[test]
    fn test_nested_table_insert_rejected() {
        let mut engine = Engine::new(None);
        assert!(engine.apply(&Command::InsertTable { rows: 2, cols: 2, with_header_row: false }));
        assert!(engine.selection_in_table());
        assert!(!engine.apply(&Command::InsertTable { rows: 2, cols: 2, with_header_row: false }));
    }

    #[test]
    fn test_suggestion_tabela_scenario() {
        let mut engine = Engine::new(None);
        type_str(&mut engine, "/tab");
        let from = Caret::new(vec![0], 0);
        let to = Caret::new(vec![0], 4);
        assert!(engine.apply(&Command::ApplySuggestion {
            from,
            to,
            action: SuggestionAction::Table,
        }));
        let Node::Table { rows } = &engine.doc().nodes[1] else {
            panic!("table expected");
        };
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.children().unwrap().len() == 3));
        let Node::TableRow { cells } = &rows[0] else { panic!() };
        assert!(cells.iter().all(|c| matches!(c, Node::TableHeaderCell { .. })));
        // trigger text gone, caret in the first cell
        assert_eq!(engine.doc().plain_text(), "");
        assert_eq!(engine.selection().head.path, vec![1, 0, 0, 0]);
        // single undo restores the typed trigger text
        assert!(engine.undo());
        assert_eq!(engine.doc().plain_text(), "/tab");
    }

    #[test]
    fn test_suggestion_heading_converts_then_strips_trigger() {
        let mut engine = Engine::new(None);
        type_str(&mut engine, "/tít");
        assert!(engine.apply(&Command::ApplySuggestion {
            from: Caret::new(vec![0], 0),
            to: Caret::new(vec![0], 4),
            action: SuggestionAction::Heading(2),
        }));
        assert_eq!(engine.active_block(), ActiveBlock::Heading(2));
        assert_eq!(engine.doc().plain_text(), "");
        assert!(engine.undo());
        assert_eq!(engine.doc().plain_text(), "/tít");
        assert_eq!(engine.active_block(), ActiveBlock::Paragraph);
    }

    #[test]
    fn test_suggestion_list_strips_trigger_inside_item() {
        let mut engine = Engine::new(None);
        type_str(&mut engine, "/lis");
        assert!(engine.apply(&Command::ApplySuggestion {
            from: Caret::new(vec![0], 0),
            to: Caret::new(vec![0], 4),
            action: SuggestionAction::BulletList,
        }));
        assert!(matches!(engine.doc().nodes[0], Node::BulletList { .. }));
        assert_eq!(engine.doc().plain_text(), "");
    }

    #[test]
    fn test_insert_image_requires_src() {
        let mut engine = Engine::new(None);
        let before = engine.doc().clone();
        assert!(!engine.apply(&Command::InsertImage { src: "  ".into() }));
        assert_eq!(engine.doc(), &before);
        assert!(engine.apply(&Command::InsertImage { src: "https://img".into() }));
        assert!(matches!(engine.doc().nodes[1], Node::Image { .. }));
    }

    #[test]
    fn test_char_limit_rejects_overflow() {
        let mut engine = Engine::new(None);
        let big = "x".repeat(CHAR_LIMIT);
        assert!(engine.apply(&Command::InsertText(big)));
        assert!(!engine.apply(&Command::InsertText("y".into())));
        assert_eq!(engine.doc().char_count(), CHAR_LIMIT);
    }

    #[test]
    fn test_split_block_and_backspace_merge() {
        let mut engine = Engine::new(None);
        type_str(&mut engine, "abcd");
        engine.set_selection(Selection::collapsed(Caret::new(vec![0], 2)));
        assert!(engine.apply(&Command::SplitBlock));
        assert_eq!(engine.doc().nodes.len(), 2);
        assert_eq!(engine.selection().head, Caret::new(vec![1], 0));
        assert!(engine.apply(&Command::DeleteBackward));
        assert_eq!(engine.doc().plain_text(), "abcd");
        assert_eq!(engine.doc().nodes.len(), 1);
        assert_eq!(engine.selection().head, Caret::new(vec![0], 2));
    }

    #[test]
    fn test_extended_selection_typing_replaces_range() {
        let mut engine = Engine::new(None);
        type_str(&mut engine, "abcdef");
        select(&mut engine, vec![0], 1, 4);
        assert!(engine.apply(&Command::InsertText("X".into())));
        assert_eq!(engine.doc().plain_text(), "aXef");
    }

    #[test]
    fn test_clear_marks_strips_everything_in_range() {
        let mut engine = Engine::new(None);
        type_str(&mut engine, "abc");
        select(&mut engine, vec![0], 0, 3);
        assert!(engine.apply(&Command::ToggleMark(Mark::Bold)));
        assert!(engine.apply(&Command::SetTextColor(Some("#F08C00".into()))));
        assert!(engine.apply(&Command::ClearMarks));
        let inlines = engine.doc().nodes[0].inlines().unwrap();
        assert!(inlines.iter().all(|r| r.marks.is_empty()));
    }

    #[test]
    fn test_align_applies_to_selected_blocks() {
        let mut engine = Engine::new(None);
        type_str(&mut engine, "um");
        assert!(engine.apply(&Command::SplitBlock));
        type_str(&mut engine, "dois");
        engine.set_selection(Selection {
            anchor: Caret::new(vec![0], 0),
            head: Caret::new(vec![1], 4),
        });
        assert!(engine.apply(&Command::SetTextAlign(Align::Center)));
        assert!(engine.is_align_active(Align::Center));
        engine.set_selection(Selection::collapsed(Caret::new(vec![0], 0)));
        assert!(engine.is_align_active(Align::Center));
    }

    #[test]
    fn test_blockquote_wrap_unwrap() {
        let mut engine = Engine::new(None);
        type_str(&mut engine, "citação");
        assert!(engine.apply(&Command::ToggleBlockquote));
        assert!(matches!(engine.doc().nodes[0], Node::Blockquote { .. }));
        assert!(engine.is_block_in(|n| matches!(n, Node::Blockquote { .. })));
        assert!(engine.apply(&Command::ToggleBlockquote));
        assert!(matches!(engine.doc().nodes[0], Node::Paragraph { .. }));
        assert_eq!(engine.doc().plain_text(), "citação");
    }

    #[test]
    fn test_code_block_round_trip_keeps_text() {
        let mut engine = Engine::new(None);
        type_str(&mut engine, "let x = 1;");
        assert!(engine.apply(&Command::ToggleCodeBlock));
        assert_eq!(engine.active_block(), ActiveBlock::CodeBlock);
        assert!(engine.apply(&Command::ToggleCodeBlock));
        assert_eq!(engine.doc().plain_text(), "let x = 1;");
    }

    #[test]
    fn test_delete_across_sibling_blocks_merges() {
        let mut engine = Engine::new(None);
        type_str(&mut engine, "primeiro");
        assert!(engine.apply(&Command::SplitBlock));
        type_str(&mut engine, "segundo");
        assert!(engine.apply(&Command::DeleteRange {
            from: Caret::new(vec![0], 4),
            to: Caret::new(vec![1], 3),
        }));
        assert_eq!(engine.doc().plain_text(), "primundo");
        assert_eq!(engine.doc().nodes.len(), 1);
        assert_eq!(engine.selection().head, Caret::new(vec![0], 4));
    }
}
