//! Footnotes: `[^label]` references and `[^label]: text` definitions
//!
//! Definitions are hidden in place and collected into a numbered list that
//! is appended to the article. References are numbered after the whole
//! document has been parsed, so a reference may precede its definition.

use markdown_it::common::utils::escape_html;
use markdown_it::parser::block::{BlockRule, BlockState};
use markdown_it::parser::core::CoreRule;
use markdown_it::parser::extset::MarkdownItExt;
use markdown_it::parser::inline::{InlineRule, InlineState};
use markdown_it::{MarkdownIt, Node};
use parking_lot::Mutex;
use regex::Regex;
use std::sync::{Arc, LazyLock};
use tracing::warn;

use crate::context::in_embed;
use crate::error::RenderResult;
use crate::extension::Extension;
use crate::token::{FootnoteDef, FootnoteRef, WxToken};

static REF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[\^([^\]]+)\]").expect("valid footnote ref regex"));

static DEF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ *\[\^([^\]]+)\]:").expect("valid footnote def regex"));

/// A collected definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FootnoteEntry {
    pub label: String,
    pub content: String,
}

/// Definitions collected during the current render, in document order
#[derive(Debug, Default)]
pub struct FootnoteStore {
    entries: Vec<FootnoteEntry>,
}

impl FootnoteStore {
    pub fn entries(&self) -> &[FootnoteEntry] {
        &self.entries
    }

    /// 1-based number of a label
    pub fn number_of(&self, label: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.label == label).map(|i| i + 1)
    }

    fn push(&mut self, entry: FootnoteEntry) {
        if self.number_of(&entry.label).is_none() {
            self.entries.push(entry);
        }
    }
}

#[derive(Debug, Clone)]
struct FootnoteHandle(Arc<Mutex<FootnoteStore>>);

impl MarkdownItExt for FootnoteHandle {}

pub struct FootnoteExtension {
    store: Arc<Mutex<FootnoteStore>>,
}

impl Default for FootnoteExtension {
    fn default() -> Self {
        Self::new()
    }
}

impl FootnoteExtension {
    pub fn new() -> Self {
        Self {
            store: Arc::new(Mutex::new(FootnoteStore::default())),
        }
    }

    /// Shared view of the collected definitions
    pub fn store(&self) -> Arc<Mutex<FootnoteStore>> {
        self.store.clone()
    }
}

impl Extension for FootnoteExtension {
    fn name(&self) -> &'static str {
        "footnote"
    }

    fn register(&self, md: &mut MarkdownIt) -> RenderResult<()> {
        md.ext.insert(FootnoteHandle(self.store.clone()));
        // ahead of the reference rule, which would take `[^a]: url` as a link target
        md.block.add_rule::<FootnoteDefScanner>().before_all();
        md.inline.add_rule::<FootnoteRefScanner>();
        md.add_rule::<FootnoteNumbering>();
        Ok(())
    }

    fn prepare(&self) {
        self.store.lock().entries.clear();
    }

    fn postprocess(&self, html: String, md: &MarkdownIt) -> String {
        let entries = self.store.lock().entries.clone();
        if entries.is_empty() {
            return html;
        }

        let mut items = String::new();
        for entry in &entries {
            let body = md.parse(&entry.content).render();
            items.push_str(&format!(
                "<li id=\"fn-{}\">{}</li>",
                escape_html(&entry.label),
                body.trim_end()
            ));
        }
        format!(
            "{}<section class=\"footnotes\"><hr><ol>{}</ol></section>",
            html, items
        )
    }
}

struct FootnoteRefScanner;

impl InlineRule for FootnoteRefScanner {
    const MARKER: char = '[';

    fn run(state: &mut InlineState) -> Option<(Node, usize)> {
        let input = &state.src[state.pos..state.pos_max];
        let caps = REF_RE.captures(input)?;
        let len = caps.get(0)?.end();
        let label = caps.get(1)?.as_str().trim().to_string();

        let node = Node::new(WxToken::FootnoteRef(FootnoteRef {
            label,
            number: None,
        }));
        Some((node, len))
    }
}

struct FootnoteDefScanner;

impl BlockRule for FootnoteDefScanner {
    fn run(state: &mut BlockState) -> Option<(Node, usize)> {
        if state.line_indent(state.line) >= state.md.max_indent {
            return None;
        }
        let line = state.get_line(state.line);
        let caps = DEF_RE.captures(line)?;
        let label = caps.get(1)?.as_str().trim().to_string();
        let content = line[caps.get(0)?.end()..].trim().to_string();

        let mut node = Node::new(WxToken::FootnoteDef(FootnoteDef { label, content }));
        node.srcmap = state.get_map(state.line, state.line);
        Some((node, 1))
    }
}

/// Collects definitions in document order, then numbers every reference
struct FootnoteNumbering;

impl CoreRule for FootnoteNumbering {
    fn run(root: &mut Node, md: &MarkdownIt) {
        if in_embed(md) {
            return;
        }
        let Some(FootnoteHandle(store)) = md.ext.get::<FootnoteHandle>() else {
            return;
        };

        let mut defs = Vec::new();
        root.walk(|node, _| {
            if let Some(WxToken::FootnoteDef(def)) = node.cast::<WxToken>() {
                defs.push(FootnoteEntry {
                    label: def.label.clone(),
                    content: def.content.clone(),
                });
            }
        });

        let mut store = store.lock();
        for def in defs {
            store.push(def);
        }

        root.walk_mut(|node, _| {
            if let Some(WxToken::FootnoteRef(reference)) = node.cast_mut::<WxToken>() {
                reference.number = store.number_of(&reference.label);
                if reference.number.is_none() {
                    warn!(label = %reference.label, "footnote reference without definition");
                }
            }
        });
    }
}
