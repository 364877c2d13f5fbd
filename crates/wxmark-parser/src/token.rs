//! Tokens produced by the extensions
//!
//! All custom syntax ends up as a [`WxToken`] node in the markdown-it tree.
//! Rendering dispatches on the variant, so adding a variant forces a
//! rendering decision at compile time.

use markdown_it::parser::inline::Text;
use markdown_it::{Node, NodeValue, Renderer};

/// A formula, inline (`$x$`) or block (`$$\nx\n$$`)
#[derive(Debug, Clone)]
pub struct MathToken {
    pub text: String,
    /// Written with two dollar signs
    pub display_mode: bool,
    /// Rendered markup, filled in after parsing
    pub html: Option<String>,
}

/// `[^label]`
#[derive(Debug, Clone)]
pub struct FootnoteRef {
    pub label: String,
    /// 1-based number, `None` if the label has no definition
    pub number: Option<usize>,
}

/// `[^label]: content`
#[derive(Debug, Clone)]
pub struct FootnoteDef {
    pub label: String,
    pub content: String,
}

/// `[!type] title` at the head of a blockquote
#[derive(Debug, Clone)]
pub struct Callout {
    pub kind: String,
    pub title: String,
    pub style: String,
    pub icon: String,
}

/// How a link is presented
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkMode {
    /// Link text only (mailto)
    TextOnly,
    /// Ordinary anchor
    Anchor,
    /// `text[n]`
    Numbered(usize),
    /// `text[href]`
    Inline,
}

#[derive(Debug, Clone)]
pub struct LinkToken {
    pub href: String,
    pub mode: LinkMode,
}

#[derive(Debug, Clone)]
pub struct HeadingToken {
    pub level: usize,
    /// Hierarchical number, e.g. `1.2.`
    pub number: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ImageToken {
    pub src: String,
    pub alt: String,
    pub title: Option<String>,
    pub figcaption: bool,
}

/// Custom syntax nodes
#[derive(Debug, Clone)]
pub enum WxToken {
    InlineMath(MathToken),
    BlockMath(MathToken),
    FootnoteRef(FootnoteRef),
    FootnoteDef(FootnoteDef),
    /// `==text==`, children hold the parsed text
    Highlight,
    /// `%%...%%`
    Comment { text: String, block: bool },
    /// `#tag`
    Topic { tag: String },
    /// `[:name|size|color:]`
    Icon { text: String, html: Option<String> },
    /// trailing `^block-id`
    BlockMark { id: String },
    /// Extra blank lines between blocks
    EmptyLine { count: usize },
    Callout(Callout),
    /// `![[target]]`
    Embed { target: String, html: Option<String> },
    /// Embedded note; children are the note's own blocks
    NoteEmbed { id: String, quote: bool },
    Link(LinkToken),
    Heading(HeadingToken),
    /// Fenced or indented code, rendered ahead of time
    Code { html: String },
    Image(ImageToken),
    List { ordered: bool, start: Option<u32> },
    ListItem,
    Rule,
}

impl NodeValue for WxToken {
    fn render(&self, node: &Node, fmt: &mut dyn Renderer) {
        match self {
            WxToken::InlineMath(math) => render_math(math, false, fmt),
            WxToken::BlockMath(math) => {
                fmt.cr();
                render_math(math, true, fmt);
                fmt.cr();
            }
            WxToken::FootnoteRef(reference) => match reference.number {
                Some(n) => {
                    fmt.open(
                        "sup",
                        &[("id", format!("fnref-{}", n)), ("class", "fnref-sup".into())],
                    );
                    fmt.text(&n.to_string());
                    fmt.close("sup");
                }
                None => {
                    fmt.open("sup", &[("class", "fnref-sup".into())]);
                    fmt.text("?");
                    fmt.close("sup");
                }
            },
            WxToken::FootnoteDef(_) | WxToken::Comment { .. } => {}
            WxToken::Highlight => {
                fmt.open("span", &[("class", "note-highlight".into())]);
                fmt.contents(&node.children);
                fmt.close("span");
            }
            WxToken::Topic { tag } => {
                fmt.open(
                    "a",
                    &[
                        ("class", "wx_topic_link".into()),
                        ("data-topic", "1".into()),
                    ],
                );
                fmt.text(&format!("#{}", tag));
                fmt.close("a");
            }
            WxToken::Icon { text, html } => match html {
                Some(html) => fmt.text_raw(html),
                None => fmt.text(&format!("[:{}:]", text)),
            },
            WxToken::BlockMark { id } => {
                fmt.open("span", &[("data-txt", format!("^{}", id))]);
                fmt.close("span");
            }
            WxToken::EmptyLine { count } => {
                fmt.cr();
                for _ in 0..*count {
                    fmt.text_raw("<p><br></p>");
                }
                fmt.cr();
            }
            WxToken::Callout(callout) => render_callout(callout, node, fmt),
            WxToken::Embed { target, html } => {
                fmt.cr();
                match html {
                    Some(html) => fmt.text_raw(html),
                    None => fmt.text(&format!("![[{}]]", target)),
                }
                fmt.cr();
            }
            WxToken::NoteEmbed { id, quote } => {
                let tag = if *quote { "blockquote" } else { "section" };
                fmt.cr();
                fmt.open(
                    tag,
                    &[("class", "note-embed-file".into()), ("id", id.clone())],
                );
                fmt.cr();
                fmt.contents(&node.children);
                fmt.cr();
                fmt.close(tag);
                fmt.cr();
            }
            WxToken::Link(link) => render_link(link, node, fmt),
            WxToken::Heading(heading) => {
                let tag = format!("h{}", heading.level);
                fmt.cr();
                fmt.open(&tag, &node.attrs);
                if let Some(number) = &heading.number {
                    fmt.open("span", &[("class", "heading-number".into())]);
                    fmt.text(number);
                    fmt.close("span");
                    fmt.text(" ");
                }
                fmt.contents(&node.children);
                fmt.close(&tag);
                fmt.cr();
            }
            WxToken::Code { html } => {
                fmt.cr();
                fmt.text_raw(html);
                fmt.cr();
            }
            WxToken::Image(image) => render_image(image, fmt),
            WxToken::List { ordered, start } => {
                let tag = if *ordered { "ol" } else { "ul" };
                let mut attrs = Vec::new();
                if let Some(start) = start.filter(|s| *ordered && *s != 1) {
                    attrs.push(("start", start.to_string()));
                }
                attrs.push(("class", "list-paddingleft-1".to_string()));
                fmt.cr();
                fmt.open(tag, &attrs);
                fmt.cr();
                fmt.contents(&node.children);
                fmt.cr();
                fmt.close(tag);
                fmt.cr();
            }
            WxToken::ListItem => {
                fmt.open("li", &[]);
                fmt.open("section", &[]);
                fmt.open("span", &[("data-leaf", String::new())]);
                fmt.contents(&node.children);
                fmt.close("span");
                fmt.close("section");
                fmt.close("li");
                fmt.cr();
            }
            WxToken::Rule => {
                fmt.cr();
                fmt.text_raw("<hr>");
                fmt.cr();
            }
        }
    }
}

fn render_math(math: &MathToken, block: bool, fmt: &mut dyn Renderer) {
    match &math.html {
        Some(html) => fmt.text_raw(html),
        None if block => fmt.text(&format!("$$\n{}\n$$", math.text)),
        None => fmt.text(&format!("${}$", math.text)),
    }
}

fn render_callout(callout: &Callout, node: &Node, fmt: &mut dyn Renderer) {
    fmt.cr();
    fmt.open(
        "section",
        &[("class", format!("note-callout {}", callout.style))],
    );
    fmt.open("section", &[("class", "note-callout-title-wrap".into())]);
    fmt.open("span", &[("class", "note-callout-icon".into())]);
    fmt.text_raw(&callout.icon);
    fmt.close("span");
    fmt.open("span", &[("class", "note-callout-title".into())]);
    fmt.text(&callout.title);
    fmt.close("span");
    fmt.close("section");
    fmt.open("section", &[("class", "note-callout-content".into())]);
    fmt.contents(&node.children);
    fmt.close("section");
    fmt.close("section");
    fmt.cr();
}

fn render_link(link: &LinkToken, node: &Node, fmt: &mut dyn Renderer) {
    match &link.mode {
        LinkMode::TextOnly => fmt.contents(&node.children),
        LinkMode::Anchor => {
            fmt.open("a", &[("href", link.href.clone())]);
            fmt.contents(&node.children);
            fmt.close("a");
        }
        LinkMode::Numbered(n) => {
            fmt.open("a", &[]);
            fmt.contents(&node.children);
            fmt.open("sup", &[]);
            fmt.text(&format!("[{}]", n));
            fmt.close("sup");
            fmt.close("a");
        }
        LinkMode::Inline => {
            fmt.open("a", &[]);
            fmt.contents(&node.children);
            fmt.text(&format!("[{}]", link.href));
            fmt.close("a");
        }
    }
}

fn render_image(image: &ImageToken, fmt: &mut dyn Renderer) {
    let mut attrs = vec![("src", image.src.clone()), ("alt", image.alt.clone())];
    if let Some(title) = &image.title {
        attrs.push(("title", title.clone()));
    }

    if image.figcaption {
        fmt.open("figure", &[]);
        fmt.self_close("img", &attrs);
        fmt.open("figcaption", &[]);
        fmt.text(&image.alt);
        fmt.close("figcaption");
        fmt.close("figure");
    } else {
        fmt.self_close("img", &attrs);
    }
}

/// Concatenated text content of a subtree
pub fn collect_text(node: &Node) -> String {
    let mut text = String::new();
    if let Some(t) = node.cast::<Text>() {
        text.push_str(&t.content);
    }
    for child in node.children.iter() {
        text.push_str(&collect_text(child));
    }
    text
}
