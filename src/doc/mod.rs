use serde_json::{json, Value};
use strum::AsRefStr;

pub(crate) mod pos;

use pos::{Caret, Selection};

/// Inline formatting mark. A run never carries two marks of the same kind;
/// `normalize_inlines` and the engine's mark editing keep that invariant.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Mark {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Link { href: String },
    TextColor { value: String },
    HighlightColor { value: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, AsRefStr)]
pub(crate) enum MarkKind {
    #[strum(serialize = "bold")]
    Bold,
    #[strum(serialize = "italic")]
    Italic,
    #[strum(serialize = "underline")]
    Underline,
    #[strum(serialize = "strikethrough")]
    Strikethrough,
    #[strum(serialize = "link")]
    Link,
    #[strum(serialize = "textColor")]
    TextColor,
    #[strum(serialize = "highlightColor")]
    HighlightColor,
}

impl Mark {
    pub fn kind(&self) -> MarkKind {
        match self {
            Mark::Bold => MarkKind::Bold,
            Mark::Italic => MarkKind::Italic,
            Mark::Underline => MarkKind::Underline,
            Mark::Strikethrough => MarkKind::Strikethrough,
            Mark::Link { .. } => MarkKind::Link,
            Mark::TextColor { .. } => MarkKind::TextColor,
            Mark::HighlightColor { .. } => MarkKind::HighlightColor,
        }
    }

    fn to_json(&self) -> Value {
        match self {
            Mark::Link { href } => json!({"type": "link", "attrs": {"href": href}}),
            Mark::TextColor { value } => json!({"type": "textColor", "attrs": {"value": value}}),
            Mark::HighlightColor { value } => {
                json!({"type": "highlightColor", "attrs": {"value": value}})
            }
            other => json!({"type": other.kind().as_ref()}),
        }
    }

    fn from_json(v: &Value) -> Option<Mark> {
        let tag = v.get("type").and_then(|t| t.as_str())?;
        let attr = |name: &str| {
            v.get("attrs")
                .and_then(|a| a.get(name))
                .and_then(|s| s.as_str())
                .unwrap_or_default()
                .to_string()
        };
        match tag {
            "bold" => Some(Mark::Bold),
            "italic" => Some(Mark::Italic),
            "underline" => Some(Mark::Underline),
            "strikethrough" => Some(Mark::Strikethrough),
            "link" => Some(Mark::Link { href: attr("href") }),
            "textColor" => Some(Mark::TextColor { value: attr("value") }),
            "highlightColor" => Some(Mark::HighlightColor { value: attr("value") }),
            _ => None,
        }
    }
}

/// A run of text sharing one mark set.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Inline {
    pub text: String,
    pub marks: Vec<Mark>,
}

impl Inline {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            marks: Vec::new(),
        }
    }

    pub fn marked(text: impl Into<String>, marks: Vec<Mark>) -> Self {
        Self {
            text: text.into(),
            marks,
        }
    }

    pub fn has_mark(&self, kind: MarkKind) -> bool {
        self.marks.iter().any(|m| m.kind() == kind)
    }

    pub fn mark_of(&self, kind: MarkKind) -> Option<&Mark> {
        self.marks.iter().find(|m| m.kind() == kind)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, AsRefStr)]
pub(crate) enum Align {
    #[strum(serialize = "left")]
    Left,
    #[strum(serialize = "center")]
    Center,
    #[strum(serialize = "right")]
    Right,
    #[strum(serialize = "justify")]
    Justify,
}

impl Align {
    fn parse(s: &str) -> Option<Align> {
        match s {
            "left" => Some(Align::Left),
            "center" => Some(Align::Center),
            "right" => Some(Align::Right),
            "justify" => Some(Align::Justify),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Node {
    Paragraph { align: Option<Align>, inlines: Vec<Inline> },
    Heading { level: u8, align: Option<Align>, inlines: Vec<Inline> },
    BulletList { items: Vec<Node> },
    OrderedList { items: Vec<Node> },
    ListItem { children: Vec<Node> },
    Blockquote { children: Vec<Node> },
    CodeBlock { text: String },
    Table { rows: Vec<Node> },
    TableRow { cells: Vec<Node> },
    TableCell { children: Vec<Node> },
    TableHeaderCell { children: Vec<Node> },
    Image { src: String },
    HorizontalRule,
    MediaEmbed { src: String },
}

impl Node {
    pub fn empty_paragraph() -> Node {
        Node::Paragraph {
            align: None,
            inlines: Vec::new(),
        }
    }

    pub fn paragraph(text: &str) -> Node {
        Node::Paragraph {
            align: None,
            inlines: if text.is_empty() {
                Vec::new()
            } else {
                vec![Inline::plain(text)]
            },
        }
    }

    /// Blocks a caret may sit in.
    pub fn is_text_block(&self) -> bool {
        matches!(
            self,
            Node::Paragraph { .. } | Node::Heading { .. } | Node::CodeBlock { .. }
        )
    }

    pub fn children(&self) -> Option<&[Node]> {
        match self {
            Node::BulletList { items } | Node::OrderedList { items } => Some(items),
            Node::ListItem { children }
            | Node::Blockquote { children }
            | Node::TableCell { children }
            | Node::TableHeaderCell { children } => Some(children),
            Node::Table { rows } => Some(rows),
            Node::TableRow { cells } => Some(cells),
            _ => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::BulletList { items } | Node::OrderedList { items } => Some(items),
            Node::ListItem { children }
            | Node::Blockquote { children }
            | Node::TableCell { children }
            | Node::TableHeaderCell { children } => Some(children),
            Node::Table { rows } => Some(rows),
            Node::TableRow { cells } => Some(cells),
            _ => None,
        }
    }

    pub fn inlines(&self) -> Option<&[Inline]> {
        match self {
            Node::Paragraph { inlines, .. } | Node::Heading { inlines, .. } => Some(inlines),
            _ => None,
        }
    }

    pub fn inlines_mut(&mut self) -> Option<&mut Vec<Inline>> {
        match self {
            Node::Paragraph { inlines, .. } | Node::Heading { inlines, .. } => Some(inlines),
            _ => None,
        }
    }

    /// Concatenated text of a text block.
    pub fn block_text(&self) -> Option<String> {
        match self {
            Node::Paragraph { inlines, .. } | Node::Heading { inlines, .. } => {
                Some(inline_text(inlines))
            }
            Node::CodeBlock { text } => Some(text.clone()),
            _ => None,
        }
    }

    pub fn text_len(&self) -> Option<usize> {
        self.block_text().map(|t| char_len(&t))
    }

    fn to_json(&self) -> Value {
        fn block(tag: &str, attrs: Value, content: Vec<Value>) -> Value {
            let mut obj = json!({"type": tag});
            if attrs.as_object().map(|a| !a.is_empty()).unwrap_or(false) {
                obj["attrs"] = attrs;
            }
            if !content.is_empty() {
                obj["content"] = Value::Array(content);
            }
            obj
        }
        fn inline_content(inlines: &[Inline]) -> Vec<Value> {
            inlines
                .iter()
                .map(|run| {
                    let mut obj = json!({"type": "text", "text": run.text});
                    if !run.marks.is_empty() {
                        obj["marks"] =
                            Value::Array(run.marks.iter().map(|m| m.to_json()).collect());
                    }
                    obj
                })
                .collect()
        }
        fn child_content(children: &[Node]) -> Vec<Value> {
            children.iter().map(|c| c.to_json()).collect()
        }
        fn align_attrs(align: &Option<Align>) -> Value {
            match align {
                Some(a) => json!({"textAlign": a.as_ref()}),
                None => json!({}),
            }
        }
        match self {
            Node::Paragraph { align, inlines } => {
                block("paragraph", align_attrs(align), inline_content(inlines))
            }
            Node::Heading { level, align, inlines } => {
                let mut attrs = json!({"level": level});
                if let Some(a) = align {
                    attrs["textAlign"] = json!(a.as_ref());
                }
                block("heading", attrs, inline_content(inlines))
            }
            Node::BulletList { items } => block("bulletList", json!({}), child_content(items)),
            Node::OrderedList { items } => block("orderedList", json!({}), child_content(items)),
            Node::ListItem { children } => block("listItem", json!({}), child_content(children)),
            Node::Blockquote { children } => {
                block("blockquote", json!({}), child_content(children))
            }
            Node::CodeBlock { text } => {
                let content = if text.is_empty() {
                    Vec::new()
                } else {
                    vec![json!({"type": "text", "text": text})]
                };
                block("codeBlock", json!({}), content)
            }
            Node::Table { rows } => block("table", json!({}), child_content(rows)),
            Node::TableRow { cells } => block("tableRow", json!({}), child_content(cells)),
            Node::TableCell { children } => block("tableCell", json!({}), child_content(children)),
            Node::TableHeaderCell { children } => {
                block("tableHeaderCell", json!({}), child_content(children))
            }
            Node::Image { src } => json!({"type": "image", "attrs": {"src": src}}),
            Node::HorizontalRule => json!({"type": "horizontalRule"}),
            Node::MediaEmbed { src } => json!({"type": "mediaEmbed", "attrs": {"src": src}}),
        }
    }

    fn from_json(v: &Value) -> Option<Node> {
        let tag = v.get("type").and_then(|t| t.as_str())?;
        let attrs = v.get("attrs");
        let content = v.get("content").and_then(|c| c.as_array());
        let src = || {
            attrs
                .and_then(|a| a.get("src"))
                .and_then(|s| s.as_str())
                .unwrap_or_default()
                .to_string()
        };
        let align = attrs
            .and_then(|a| a.get("textAlign"))
            .and_then(|s| s.as_str())
            .and_then(Align::parse);
        let children = |v: &Option<&Vec<Value>>| -> Vec<Node> {
            v.map(|items| items.iter().filter_map(Node::from_json).collect())
                .unwrap_or_default()
        };
        match tag {
            "paragraph" => Some(Node::Paragraph {
                align,
                inlines: parse_inlines(content),
            }),
            "heading" => {
                let level = attrs
                    .and_then(|a| a.get("level"))
                    .and_then(|l| l.as_u64())
                    .unwrap_or(1)
                    .clamp(1, 3) as u8;
                Some(Node::Heading {
                    level,
                    align,
                    inlines: parse_inlines(content),
                })
            }
            "bulletList" => Some(Node::BulletList {
                items: only(children(&content), |n| matches!(n, Node::ListItem { .. })),
            }),
            "orderedList" => Some(Node::OrderedList {
                items: only(children(&content), |n| matches!(n, Node::ListItem { .. })),
            }),
            "listItem" => Some(Node::ListItem {
                children: children(&content),
            }),
            "blockquote" => Some(Node::Blockquote {
                children: children(&content),
            }),
            "codeBlock" => {
                let text = content
                    .map(|items| {
                        items
                            .iter()
                            .filter_map(|i| i.get("text").and_then(|t| t.as_str()))
                            .collect::<Vec<_>>()
                            .concat()
                    })
                    .unwrap_or_default();
                Some(Node::CodeBlock { text })
            }
            "table" => Some(Node::Table {
                rows: only(children(&content), |n| matches!(n, Node::TableRow { .. })),
            }),
            "tableRow" => Some(Node::TableRow {
                cells: only(children(&content), |n| {
                    matches!(n, Node::TableCell { .. } | Node::TableHeaderCell { .. })
                }),
            }),
            "tableCell" => Some(Node::TableCell {
                children: children(&content),
            }),
            "tableHeaderCell" => Some(Node::TableHeaderCell {
                children: children(&content),
            }),
            "image" => Some(Node::Image { src: src() }),
            "horizontalRule" => Some(Node::HorizontalRule),
            "mediaEmbed" => Some(Node::MediaEmbed { src: src() }),
            _ => None,
        }
    }
}

fn only(nodes: Vec<Node>, keep: impl Fn(&Node) -> bool) -> Vec<Node> {
    nodes.into_iter().filter(|n| keep(n)).collect()
}

fn parse_inlines(content: Option<&Vec<Value>>) -> Vec<Inline> {
    let runs = content
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    if item.get("type").and_then(|t| t.as_str()) != Some("text") {
                        return None;
                    }
                    let text = item.get("text").and_then(|t| t.as_str())?.to_string();
                    let marks = item
                        .get("marks")
                        .and_then(|m| m.as_array())
                        .map(|marks| marks.iter().filter_map(Mark::from_json).collect())
                        .unwrap_or_default();
                    Some(Inline::marked(text, dedup_marks(marks)))
                })
                .collect()
        })
        .unwrap_or_default();
    normalize_inlines(runs)
}

/// Keeps the last mark of each kind, preserving first-seen order.
fn dedup_marks(marks: Vec<Mark>) -> Vec<Mark> {
    let mut out: Vec<Mark> = Vec::with_capacity(marks.len());
    for mark in marks {
        if let Some(existing) = out.iter_mut().find(|m| m.kind() == mark.kind()) {
            *existing = mark;
        } else {
            out.push(mark);
        }
    }
    out
}

/// Drops empty runs and merges adjacent runs with identical mark sets.
pub(crate) fn normalize_inlines(runs: Vec<Inline>) -> Vec<Inline> {
    let mut out: Vec<Inline> = Vec::with_capacity(runs.len());
    for run in runs {
        if run.text.is_empty() {
            continue;
        }
        match out.last_mut() {
            Some(prev) if marks_equal(&prev.marks, &run.marks) => prev.text.push_str(&run.text),
            _ => out.push(run),
        }
    }
    out
}

fn marks_equal(a: &[Mark], b: &[Mark]) -> bool {
    a.len() == b.len() && a.iter().all(|m| b.contains(m))
}

pub(crate) fn inline_text(runs: &[Inline]) -> String {
    runs.iter().map(|r| r.text.as_str()).collect()
}

pub(crate) fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn byte_of_char(s: &str, idx: usize) -> usize {
    s.char_indices().nth(idx).map(|(b, _)| b).unwrap_or(s.len())
}

pub(crate) fn slice_chars(s: &str, start: usize, end: usize) -> String {
    let from = byte_of_char(s, start);
    let to = byte_of_char(s, end.max(start));
    s[from..to].to_string()
}

/// Rewrites the mark sets of every character in `[start, end)`, splitting runs
/// at the boundaries. Result is normalized.
pub(crate) fn edit_inline_range(
    runs: &[Inline],
    start: usize,
    end: usize,
    f: &dyn Fn(&mut Vec<Mark>),
) -> Vec<Inline> {
    let mut out: Vec<Inline> = Vec::new();
    let mut offset = 0usize;
    for run in runs {
        let len = char_len(&run.text);
        let run_start = offset;
        let run_end = offset + len;
        offset = run_end;

        let sel_start = start.clamp(run_start, run_end);
        let sel_end = end.clamp(run_start, run_end);
        if sel_start >= sel_end {
            out.push(run.clone());
            continue;
        }
        let before = slice_chars(&run.text, 0, sel_start - run_start);
        let middle = slice_chars(&run.text, sel_start - run_start, sel_end - run_start);
        let after = slice_chars(&run.text, sel_end - run_start, len);
        if !before.is_empty() {
            out.push(Inline::marked(before, run.marks.clone()));
        }
        let mut marks = run.marks.clone();
        f(&mut marks);
        out.push(Inline::marked(middle, dedup_marks(marks)));
        if !after.is_empty() {
            out.push(Inline::marked(after, run.marks.clone()));
        }
    }
    normalize_inlines(out)
}

/// Inserts text at a char offset, inheriting the marks active at the caret.
pub(crate) fn insert_inline_text(runs: &[Inline], offset: usize, text: &str) -> Vec<Inline> {
    if runs.is_empty() {
        return normalize_inlines(vec![Inline::plain(text)]);
    }
    let marks = marks_at(runs, offset).to_vec();
    let mut out: Vec<Inline> = Vec::new();
    let mut cursor = 0usize;
    let mut inserted = false;
    for run in runs {
        let len = char_len(&run.text);
        if !inserted && offset <= cursor + len {
            let split = offset - cursor;
            let before = slice_chars(&run.text, 0, split);
            let after = slice_chars(&run.text, split, len);
            if !before.is_empty() {
                out.push(Inline::marked(before, run.marks.clone()));
            }
            out.push(Inline::marked(text.to_string(), marks.clone()));
            if !after.is_empty() {
                out.push(Inline::marked(after, run.marks.clone()));
            }
            inserted = true;
        } else {
            out.push(run.clone());
        }
        cursor += len;
    }
    if !inserted {
        out.push(Inline::marked(text.to_string(), marks));
    }
    normalize_inlines(out)
}

pub(crate) fn delete_inline_range(runs: &[Inline], start: usize, end: usize) -> Vec<Inline> {
    let mut out: Vec<Inline> = Vec::new();
    let mut offset = 0usize;
    for run in runs {
        let len = char_len(&run.text);
        let run_start = offset;
        let run_end = offset + len;
        offset = run_end;
        let cut_start = start.clamp(run_start, run_end) - run_start;
        let cut_end = end.clamp(run_start, run_end) - run_start;
        if cut_start >= cut_end {
            out.push(run.clone());
            continue;
        }
        let kept = format!(
            "{}{}",
            slice_chars(&run.text, 0, cut_start),
            slice_chars(&run.text, cut_end, len)
        );
        if !kept.is_empty() {
            out.push(Inline::marked(kept, run.marks.clone()));
        }
    }
    normalize_inlines(out)
}

/// Marks active at a caret: those of the character before it, or of the first
/// run when the caret sits at the block start.
pub(crate) fn marks_at(runs: &[Inline], offset: usize) -> &[Mark] {
    if runs.is_empty() {
        return &[];
    }
    let probe = offset.saturating_sub(1);
    let mut cursor = 0usize;
    for run in runs {
        let len = char_len(&run.text);
        if probe < cursor + len {
            return &run.marks;
        }
        cursor += len;
    }
    &runs[runs.len() - 1].marks
}

/// True when every character in `[start, end)` carries a mark of `kind`.
pub(crate) fn range_has_mark(runs: &[Inline], start: usize, end: usize, kind: MarkKind) -> bool {
    if start >= end {
        return false;
    }
    let mut offset = 0usize;
    let mut covered = false;
    for run in runs {
        let len = char_len(&run.text);
        let run_start = offset;
        let run_end = offset + len;
        offset = run_end;
        if start.max(run_start) < end.min(run_end) {
            covered = true;
            if !run.has_mark(kind) {
                return false;
            }
        }
    }
    covered
}

/// The full char extent of the link surrounding `offset`, with its href.
/// Contiguous runs sharing the same href count as one link.
pub(crate) fn link_extent_at(runs: &[Inline], offset: usize) -> Option<(usize, usize, String)> {
    let mut spans: Vec<(usize, usize, String)> = Vec::new();
    let mut cursor = 0usize;
    for run in runs {
        let len = char_len(&run.text);
        if let Some(Mark::Link { href }) = run.mark_of(MarkKind::Link) {
            match spans.last_mut() {
                Some((_, end, prev)) if *end == cursor && prev == href => *end = cursor + len,
                _ => spans.push((cursor, cursor + len, href.clone())),
            }
        }
        cursor += len;
    }
    spans
        .into_iter()
        .find(|(start, end, _)| *start <= offset && offset <= *end)
}

/// An ordered forest of block nodes. Never empty: an editable doc always
/// contains at least one paragraph.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Doc {
    pub nodes: Vec<Node>,
}

impl Doc {
    pub fn empty() -> Doc {
        Doc {
            nodes: vec![Node::empty_paragraph()],
        }
    }

    pub fn from_nodes(nodes: Vec<Node>) -> Doc {
        let mut doc = Doc { nodes };
        doc.ensure_nonempty();
        doc
    }

    pub fn ensure_nonempty(&mut self) {
        if self.nodes.is_empty() {
            self.nodes.push(Node::empty_paragraph());
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "type": "doc",
            "content": self.nodes.iter().map(|n| n.to_json()).collect::<Vec<_>>(),
        })
    }

    /// Lenient parse: unknown node/mark types are skipped, a malformed root is
    /// rejected. Callers decide whether an empty result counts as corrupt.
    pub fn from_json(v: &Value) -> Option<Doc> {
        if v.get("type").and_then(|t| t.as_str()) != Some("doc") {
            return None;
        }
        let nodes = v
            .get("content")
            .and_then(|c| c.as_array())
            .map(|items| items.iter().filter_map(Node::from_json).collect())
            .unwrap_or_default();
        Some(Doc { nodes })
    }

    /// All text leaves joined with single spaces, for AI submission.
    pub fn plain_text(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        fn walk(node: &Node, parts: &mut Vec<String>) {
            if let Some(text) = node.block_text() {
                if !text.is_empty() {
                    parts.push(text);
                }
                return;
            }
            if let Some(children) = node.children() {
                for child in children {
                    walk(child, parts);
                }
            }
        }
        for node in &self.nodes {
            walk(node, &mut parts);
        }
        parts.join(" ")
    }

    pub fn char_count(&self) -> usize {
        let mut total = 0usize;
        fn walk(node: &Node, total: &mut usize) {
            if let Some(len) = node.text_len() {
                *total += len;
                return;
            }
            if let Some(children) = node.children() {
                for child in children {
                    walk(child, total);
                }
            }
        }
        for node in &self.nodes {
            walk(node, &mut total);
        }
        total
    }

    pub fn word_count(&self) -> usize {
        self.plain_text().split_whitespace().count()
    }

    /// True when the doc renders as nothing: only textless paragraphs/headings.
    pub fn is_blank(&self) -> bool {
        self.nodes.iter().all(|n| match n {
            Node::Paragraph { inlines, .. } | Node::Heading { inlines, .. } => {
                inline_text(inlines).is_empty()
            }
            _ => false,
        })
    }

    pub fn node_at(&self, path: &[usize]) -> Option<&Node> {
        let (first, rest) = path.split_first()?;
        let mut node = self.nodes.get(*first)?;
        for idx in rest {
            node = node.children()?.get(*idx)?;
        }
        Some(node)
    }

    pub fn node_at_mut(&mut self, path: &[usize]) -> Option<&mut Node> {
        let (first, rest) = path.split_first()?;
        let mut node = self.nodes.get_mut(*first)?;
        for idx in rest {
            node = node.children_mut()?.get_mut(*idx)?;
        }
        Some(node)
    }

    /// Preorder paths of every text block.
    pub fn text_block_paths(&self) -> Vec<Vec<usize>> {
        let mut paths = Vec::new();
        fn walk(node: &Node, path: &mut Vec<usize>, paths: &mut Vec<Vec<usize>>) {
            if node.is_text_block() {
                paths.push(path.clone());
                return;
            }
            if let Some(children) = node.children() {
                for (i, child) in children.iter().enumerate() {
                    path.push(i);
                    walk(child, path, paths);
                    path.pop();
                }
            }
        }
        for (i, node) in self.nodes.iter().enumerate() {
            let mut path = vec![i];
            walk(node, &mut path, &mut paths);
        }
        paths
    }

    pub fn first_caret(&self) -> Caret {
        self.text_block_paths()
            .into_iter()
            .next()
            .map(|p| Caret::new(p, 0))
            .unwrap_or_else(|| Caret::new(vec![0], 0))
    }

    /// Snaps a caret to the nearest valid position: same block with a clamped
    /// offset when possible, otherwise the closest surviving text block.
    pub fn clamp_caret(&self, caret: &Caret) -> Caret {
        if let Some(node) = self.node_at(&caret.path) {
            if let Some(len) = node.text_len() {
                return Caret::new(caret.path.clone(), caret.offset.min(len));
            }
        }
        let paths = self.text_block_paths();
        if paths.is_empty() {
            return Caret::new(vec![0], 0);
        }
        match paths.iter().rposition(|p| p.as_slice() <= caret.path.as_slice()) {
            Some(i) => {
                let path = paths[i].clone();
                let len = self.node_at(&path).and_then(|n| n.text_len()).unwrap_or(0);
                Caret::new(path, len)
            }
            None => Caret::new(paths[0].clone(), 0),
        }
    }

    pub fn clamp_selection(&self, sel: &Selection) -> Selection {
        Selection {
            anchor: self.clamp_caret(&sel.anchor),
            head: self.clamp_caret(&sel.head),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rich_doc() -> Doc {
        Doc::from_nodes(vec![
            Node::Heading {
                level: 2,
                align: Some(Align::Center),
                inlines: vec![Inline::plain("Fotossíntese")],
            },
            Node::Paragraph {
                align: None,
                inlines: vec![
                    Inline::plain("As plantas usam "),
                    Inline::marked("clorofila", vec![Mark::Bold, Mark::TextColor { value: "#2F9E44".into() }]),
                    Inline::marked(
                        " (ver fonte)",
                        vec![Mark::Link { href: "https://example.com".into() }],
                    ),
                ],
            },
            Node::BulletList {
                items: vec![
                    Node::ListItem { children: vec![Node::paragraph("Fase clara")] },
                    Node::ListItem { children: vec![Node::paragraph("Fase escura")] },
                ],
            },
            Node::Table {
                rows: vec![
                    Node::TableRow {
                        cells: vec![
                            Node::TableHeaderCell { children: vec![Node::paragraph("Etapa")] },
                            Node::TableHeaderCell { children: vec![Node::paragraph("Local")] },
                        ],
                    },
                    Node::TableRow {
                        cells: vec![
                            Node::TableCell { children: vec![Node::paragraph("Clara")] },
                            Node::TableCell { children: vec![Node::paragraph("Tilacoide")] },
                        ],
                    },
                ],
            },
            Node::CodeBlock { text: "6CO2 + 6H2O".into() },
            Node::HorizontalRule,
            Node::Image { src: "https://cdn.example.com/leaf.png".into() },
            Node::MediaEmbed { src: "https://youtu.be/abc".into() },
        ])
    }

    #[test]
    fn test_json_round_trip_is_lossless() {
        let doc = rich_doc();
        let parsed = Doc::from_json(&doc.to_json()).unwrap();
        assert_eq!(parsed, doc);
    }

    #[test]
    fn test_parse_skips_unknown_nodes_and_marks() {
        let v = serde_json::json!({
            "type": "doc",
            "content": [
                {"type": "weirdWidget", "attrs": {"x": 1}},
                {"type": "paragraph", "content": [
                    {"type": "text", "text": "oi", "marks": [
                        {"type": "sparkle"},
                        {"type": "bold"}
                    ]}
                ]}
            ]
        });
        let doc = Doc::from_json(&v).unwrap();
        assert_eq!(doc.nodes.len(), 1);
        assert_eq!(
            doc.nodes[0].inlines().unwrap()[0].marks,
            vec![Mark::Bold]
        );
    }

    #[test]
    fn test_parse_rejects_non_doc_root() {
        assert!(Doc::from_json(&serde_json::json!({"type": "paragraph"})).is_none());
        assert!(Doc::from_json(&serde_json::json!("texto solto")).is_none());
    }

    #[test]
    fn test_normalize_merges_equal_mark_runs_and_drops_empties() {
        let runs = normalize_inlines(vec![
            Inline::marked("a", vec![Mark::Bold]),
            Inline::plain(""),
            Inline::marked("b", vec![Mark::Bold]),
            Inline::plain("c"),
        ]);
        assert_eq!(
            runs,
            vec![Inline::marked("ab", vec![Mark::Bold]), Inline::plain("c")]
        );
    }

    #[test]
    fn test_insert_inherits_marks_of_preceding_char() {
        let runs = vec![
            Inline::plain("ab"),
            Inline::marked("cd", vec![Mark::Italic]),
        ];
        let out = insert_inline_text(&runs, 3, "X");
        assert_eq!(inline_text(&out), "abcXd");
        assert_eq!(
            out,
            vec![
                Inline::plain("ab"),
                Inline::marked("cXd", vec![Mark::Italic]),
            ]
        );
    }

    #[test]
    fn test_edit_range_splits_runs_at_boundaries() {
        let runs = vec![Inline::plain("abcdef")];
        let out = edit_inline_range(&runs, 2, 4, &|marks| marks.push(Mark::Bold));
        assert_eq!(
            out,
            vec![
                Inline::plain("ab"),
                Inline::marked("cd", vec![Mark::Bold]),
                Inline::plain("ef"),
            ]
        );
        assert!(range_has_mark(&out, 2, 4, MarkKind::Bold));
        assert!(!range_has_mark(&out, 1, 4, MarkKind::Bold));
    }

    #[test]
    fn test_delete_range_merges_remainder() {
        let runs = vec![Inline::plain("abc"), Inline::plain("def")];
        let out = delete_inline_range(&runs, 2, 4);
        assert_eq!(out, vec![Inline::plain("abef")]);
    }

    #[test]
    fn test_link_extent_spans_contiguous_same_href_runs() {
        let runs = vec![
            Inline::plain("ir para "),
            Inline::marked("o", vec![Mark::Link { href: "https://a".into() }, Mark::Bold]),
            Inline::marked(" site", vec![Mark::Link { href: "https://a".into() }]),
            Inline::plain(" agora"),
        ];
        let (start, end, href) = link_extent_at(&runs, 10).unwrap();
        assert_eq!((start, end), (8, 14));
        assert_eq!(href, "https://a");
        assert!(link_extent_at(&runs, 16).is_none());
    }

    #[test]
    fn test_plain_text_joins_leaves_with_single_spaces() {
        let text = rich_doc().plain_text();
        assert!(text.starts_with("Fotossíntese As plantas usam clorofila"));
        assert!(text.contains("Fase clara Fase escura Etapa Local"));
        assert!(text.ends_with("6CO2 + 6H2O"));
        assert!(!text.contains("  "));
    }

    #[test]
    fn test_counts() {
        let doc = Doc::from_nodes(vec![Node::paragraph("uma frase curta")]);
        assert_eq!(doc.char_count(), 15);
        assert_eq!(doc.word_count(), 3);
        assert!(Doc::empty().is_blank());
        assert!(!doc.is_blank());
    }

    #[test]
    fn test_clamp_caret_snaps_to_nearest_text_block() {
        let doc = rich_doc();
        // offset past the end of the heading
        let c = doc.clamp_caret(&Caret::new(vec![0], 999));
        assert_eq!(c, Caret::new(vec![0], char_len("Fotossíntese")));
        // path pointing at the horizontal rule falls back to the block before
        let c = doc.clamp_caret(&Caret::new(vec![5], 0));
        assert_eq!(c.path, vec![4]);
        // path past the end of the doc
        let c = doc.clamp_caret(&Caret::new(vec![99], 0));
        assert_eq!(c.path, vec![4]);
    }

    #[test]
    fn test_text_block_paths_preorder() {
        let doc = rich_doc();
        let paths = doc.text_block_paths();
        assert_eq!(paths[0], vec![0]);
        assert_eq!(paths[1], vec![1]);
        assert_eq!(paths[2], vec![2, 0, 0]);
        assert!(paths.contains(&vec![3, 0, 0, 0]));
        assert!(paths.contains(&vec![4]));
    }
}
