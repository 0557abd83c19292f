use leptos::prelude::*;

use crate::doc::{Align, Doc, Inline, Mark, Node};

/// Presentation of one inline run, derived from its marks.
#[derive(Debug, PartialEq, Default)]
pub(crate) struct RunStyle {
    pub classes: String,
    pub style: String,
    pub href: Option<String>,
}

pub(crate) fn run_style(marks: &[Mark]) -> RunStyle {
    let mut classes: Vec<&str> = Vec::new();
    let mut style = String::new();
    let mut href = None;
    for mark in marks {
        match mark {
            Mark::Bold => classes.push("font-bold"),
            Mark::Italic => classes.push("italic"),
            Mark::Underline => classes.push("underline"),
            Mark::Strikethrough => classes.push("line-through"),
            Mark::Link { href: h } => href = Some(h.clone()),
            Mark::TextColor { value } => {
                if !value.is_empty() {
                    style.push_str(&format!("color: {};", value));
                }
            }
            Mark::HighlightColor { value } => {
                if !value.is_empty() {
                    style.push_str(&format!("background-color: {};", value));
                }
            }
        }
    }
    RunStyle {
        classes: classes.join(" "),
        style,
        href,
    }
}

fn align_style(align: &Option<Align>) -> String {
    match align {
        Some(a) => format!("text-align: {}", a.as_ref()),
        None => String::new(),
    }
}

fn inlines_view(runs: &[Inline]) -> AnyView {
    if runs.is_empty() {
        // keep empty blocks selectable/visible
        return view! { <br /> }.into_any();
    }
    runs.iter()
        .map(|run| {
            let RunStyle { classes, style, href } = run_style(&run.marks);
            let text = run.text.clone();
            match href {
                Some(href) => view! {
                    <a
                        href=href
                        target="_blank"
                        rel="noopener noreferrer"
                        class=format!("text-primary underline underline-offset-2 {classes}")
                        style=style
                    >
                        {text}
                    </a>
                }
                .into_any(),
                None => view! { <span class=classes style=style>{text}</span> }.into_any(),
            }
        })
        .collect::<Vec<_>>()
        .into_any()
}

pub(crate) fn node_view(node: &Node) -> AnyView {
    match node {
        Node::Paragraph { align, inlines } => {
            let style = align_style(align);
            let content = inlines_view(inlines);
            view! { <p class="my-1 leading-7" style=style>{content}</p> }.into_any()
        }
        Node::Heading { level, align, inlines } => {
            let style = align_style(align);
            let content = inlines_view(inlines);
            match level {
                1 => view! { <h1 class="mt-4 mb-2 text-2xl font-bold" style=style>{content}</h1> }
                    .into_any(),
                2 => view! { <h2 class="mt-3 mb-2 text-xl font-semibold" style=style>{content}</h2> }
                    .into_any(),
                _ => view! { <h3 class="mt-2 mb-1 text-lg font-semibold" style=style>{content}</h3> }
                    .into_any(),
            }
        }
        Node::BulletList { items } => {
            let content = children_views(items);
            view! { <ul class="my-2 list-disc pl-6">{content}</ul> }.into_any()
        }
        Node::OrderedList { items } => {
            let content = children_views(items);
            view! { <ol class="my-2 list-decimal pl-6">{content}</ol> }.into_any()
        }
        Node::ListItem { children } => {
            let content = children_views(children);
            view! { <li>{content}</li> }.into_any()
        }
        Node::Blockquote { children } => {
            let content = children_views(children);
            view! {
                <blockquote class="my-2 border-l-4 border-border pl-4 text-muted-foreground">
                    {content}
                </blockquote>
            }
            .into_any()
        }
        Node::CodeBlock { text } => {
            let text = text.clone();
            view! {
                <pre class="my-2 overflow-x-auto rounded-md bg-muted p-3 font-mono text-sm">
                    <code>{text}</code>
                </pre>
            }
            .into_any()
        }
        Node::Table { rows } => {
            let content = children_views(rows);
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
            let content = children_views(cells);
            view! { <tr>{content}</tr> }.into_any()
        }
        Node::TableCell { children } => {
            let content = children_views(children);
            view! { <td class="border border-border p-2 align-top">{content}</td> }.into_any()
        }
        Node::TableHeaderCell { children } => {
            let content = children_views(children);
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
                    <iframe
                        src=src
                        class="h-full w-full rounded-md"
                        allowfullscreen="true"
                    ></iframe>
                </div>
            }
            .into_any()
        }
    }
}

fn children_views(nodes: &[Node]) -> Vec<AnyView> {
    nodes.iter().map(node_view).collect()
}

pub(crate) fn doc_view(doc: &Doc) -> AnyView {
    children_views(&doc.nodes).into_any()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_style_combines_classes_and_inline_style() {
        let style = run_style(&[
            Mark::Bold,
            Mark::Strikethrough,
            Mark::TextColor { value: "#E03131".into() },
            Mark::HighlightColor { value: "#FFF3BF".into() },
        ]);
        assert_eq!(style.classes, "font-bold line-through");
        assert!(style.style.contains("color: #E03131;"));
        assert!(style.style.contains("background-color: #FFF3BF;"));
        assert_eq!(style.href, None);
    }

    #[test]
    fn test_run_style_link_and_empty_color_value() {
        let style = run_style(&[
            Mark::Link { href: "https://example.com".into() },
            Mark::TextColor { value: String::new() },
        ]);
        assert_eq!(style.href.as_deref(), Some("https://example.com"));
        assert!(style.style.is_empty());
    }
}
