//! `^block-id` markers at the end of a paragraph
//!
//! Obsidian uses these to address a block from other notes. The marker is
//! replaced by an empty span carrying the id so the text stays clean.

use markdown_it::parser::core::CoreRule;
use markdown_it::parser::extset::MarkdownItExt;
use markdown_it::parser::inline::{InlineRule, InlineState};
use markdown_it::{MarkdownIt, Node};
use parking_lot::Mutex;
use std::sync::Arc;

use crate::context::in_embed;
use crate::error::RenderResult;
use crate::extension::Extension;
use crate::token::WxToken;

#[derive(Debug, Clone)]
struct BlockMarkHandle(Arc<Mutex<Vec<String>>>);

impl MarkdownItExt for BlockMarkHandle {}

#[derive(Default)]
pub struct BlockMarkExtension {
    ids: Arc<Mutex<Vec<String>>>,
}

impl BlockMarkExtension {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block ids seen in the last render, in document order
    pub fn block_ids(&self) -> Vec<String> {
        self.ids.lock().clone()
    }
}

impl Extension for BlockMarkExtension {
    fn name(&self) -> &'static str {
        "block-mark"
    }

    fn register(&self, md: &mut MarkdownIt) -> RenderResult<()> {
        md.ext.insert(BlockMarkHandle(self.ids.clone()));
        md.inline.add_rule::<BlockMarkScanner>();
        md.add_rule::<CollectBlockIds>();
        Ok(())
    }

    fn prepare(&self) {
        self.ids.lock().clear();
    }
}

fn is_block_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

struct BlockMarkScanner;

impl InlineRule for BlockMarkScanner {
    const MARKER: char = '^';

    fn run(state: &mut InlineState) -> Option<(Node, usize)> {
        // a mark follows whitespace; `[^1]` and `x^2` stay literal
        if state.src[..state.pos]
            .chars()
            .next_back()
            .is_some_and(|c| !c.is_whitespace())
        {
            return None;
        }
        let input = &state.src[state.pos..state.pos_max];
        let id = input.strip_prefix('^')?;
        if !is_block_id(id) {
            return None;
        }

        let node = Node::new(WxToken::BlockMark { id: id.to_string() });
        Some((node, input.len()))
    }
}

struct CollectBlockIds;

impl CoreRule for CollectBlockIds {
    fn run(root: &mut Node, md: &MarkdownIt) {
        if in_embed(md) {
            return;
        }
        let Some(BlockMarkHandle(ids)) = md.ext.get::<BlockMarkHandle>() else {
            return;
        };
        let mut ids = ids.lock();
        root.walk(|node, _| {
            if let Some(WxToken::BlockMark { id }) = node.cast::<WxToken>() {
                ids.push(id.clone());
            }
        });
    }
}
