//! Blockquotes and Obsidian callouts
//!
//! ```text
//! > [!warning]- Optional title
//! > Body
//! ```
//!
//! A blockquote whose first line is a `[!type]` marker becomes a callout
//! box. Everything else stays a plain blockquote.

use markdown_it::parser::core::CoreRule;
use markdown_it::parser::extset::MarkdownItExt;
use markdown_it::plugins::cmark::block::blockquote::Blockquote;
use markdown_it::plugins::cmark::block::paragraph::Paragraph;
use markdown_it::plugins::cmark::inline::newline::{Hardbreak, Softbreak};
use markdown_it::{MarkdownIt, Node};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::context::{in_embed, RenderContext};
use crate::error::RenderResult;
use crate::extension::Extension;
use crate::token::{collect_text, Callout, WxToken};

static CALLOUT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[!([^\]]+)\]([+-])?(.*)$").expect("valid callout regex")
});

const ICON_NOTE: &str = include_str!("../../assets/callouts/note.svg");
const ICON_ABSTRACT: &str = include_str!("../../assets/callouts/abstract.svg");
const ICON_INFO: &str = include_str!("../../assets/callouts/info.svg");
const ICON_TODO: &str = include_str!("../../assets/callouts/todo.svg");
const ICON_TIP: &str = include_str!("../../assets/callouts/tip.svg");
const ICON_SUCCESS: &str = include_str!("../../assets/callouts/success.svg");
const ICON_QUESTION: &str = include_str!("../../assets/callouts/question.svg");
const ICON_WARNING: &str = include_str!("../../assets/callouts/warning.svg");
const ICON_FAILURE: &str = include_str!("../../assets/callouts/failure.svg");
const ICON_DANGER: &str = include_str!("../../assets/callouts/danger.svg");
const ICON_BUG: &str = include_str!("../../assets/callouts/bug.svg");
const ICON_EXAMPLE: &str = include_str!("../../assets/callouts/example.svg");
const ICON_QUOTE: &str = include_str!("../../assets/callouts/quote.svg");

/// Icon and style class of a built-in callout type
pub fn builtin_callout(kind: &str) -> Option<(&'static str, &'static str)> {
    let found = match kind {
        "note" => (ICON_NOTE, "note-callout-note"),
        "info" => (ICON_INFO, "note-callout-note"),
        "todo" => (ICON_TODO, "note-callout-note"),
        "abstract" | "summary" | "tldr" => (ICON_ABSTRACT, "note-callout-abstract"),
        "tip" | "hint" | "important" => (ICON_TIP, "note-callout-abstract"),
        "success" | "check" | "done" => (ICON_SUCCESS, "note-callout-success"),
        "question" | "help" | "faq" => (ICON_QUESTION, "note-callout-question"),
        "warning" | "caution" | "attention" => (ICON_WARNING, "note-callout-question"),
        "failure" | "fail" | "missing" => (ICON_FAILURE, "note-callout-failure"),
        "danger" | "error" => (ICON_DANGER, "note-callout-failure"),
        "bug" => (ICON_BUG, "note-callout-failure"),
        "example" => (ICON_EXAMPLE, "note-callout-example"),
        "quote" | "cite" => (ICON_QUOTE, "note-callout-quote"),
        _ => return None,
    };
    Some(found)
}

/// `warning` -> `Warning`
fn default_title(kind: &str) -> String {
    let mut chars = kind.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[derive(Debug, Clone)]
struct CalloutHandle(RenderContext);

impl MarkdownItExt for CalloutHandle {}

pub struct CalloutExtension {
    context: RenderContext,
}

impl CalloutExtension {
    pub fn new(context: RenderContext) -> Self {
        Self { context }
    }
}

impl Extension for CalloutExtension {
    fn name(&self) -> &'static str {
        "blockquote"
    }

    fn register(&self, md: &mut MarkdownIt) -> RenderResult<()> {
        md.ext.insert(CalloutHandle(self.context.clone()));
        md.add_rule::<DetectCallouts>();
        Ok(())
    }
}

/// Remove the `[!type] title` line from a blockquote.
///
/// Returns the type and title if the blockquote is a callout.
fn take_callout_header(quote: &mut Node) -> Option<(String, String)> {
    let first = quote.children.first_mut()?;
    if !first.is::<Paragraph>() {
        return None;
    }

    let split = first
        .children
        .iter()
        .position(|n| n.is::<Softbreak>() || n.is::<Hardbreak>());
    let head_len = split.unwrap_or(first.children.len());
    let head: String = first.children[..head_len].iter().map(collect_text).collect();

    let caps = CALLOUT_RE.captures(head.trim_start())?;
    let kind = caps.get(1)?.as_str().trim().to_string();
    let title = caps
        .get(3)
        .map(|m| m.as_str().trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| default_title(&kind));

    let drain_to = split.map_or(head_len, |i| i + 1);
    first.children.drain(..drain_to);
    let emptied = first.children.is_empty();
    if emptied {
        quote.children.remove(0);
    }
    Some((kind, title))
}

struct DetectCallouts;

impl CoreRule for DetectCallouts {
    fn run(root: &mut Node, md: &MarkdownIt) {
        if in_embed(md) {
            return;
        }
        let Some(CalloutHandle(context)) = md.ext.get::<CalloutHandle>() else {
            return;
        };

        root.walk_mut(|node, _| {
            if !node.is::<Blockquote>() {
                return;
            }
            let Some((kind, title)) = take_callout_header(node) else {
                return;
            };

            let lower = kind.to_lowercase();
            let (icon, style) = match builtin_callout(&lower) {
                Some((icon, style)) => (icon.to_string(), style.to_string()),
                None => {
                    let icon = context.assets.load_icon(&kind);
                    if icon.is_empty() {
                        debug!(kind = %kind, "unknown callout type, using note");
                        (ICON_NOTE.to_string(), "note-callout-note".to_string())
                    } else {
                        (icon, "note-callout-custom".to_string())
                    }
                }
            };

            node.replace(WxToken::Callout(Callout {
                kind,
                title,
                style,
                icon,
            }));
        });
    }
}
