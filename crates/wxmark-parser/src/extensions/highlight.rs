//! `==highlighted==` text

use markdown_it::parser::inline::{InlineRule, InlineState};
use markdown_it::{MarkdownIt, Node};

use crate::error::RenderResult;
use crate::extension::Extension;
use crate::token::WxToken;

pub struct HighlightExtension;

impl Extension for HighlightExtension {
    fn name(&self) -> &'static str {
        "highlight"
    }

    fn register(&self, md: &mut MarkdownIt) -> RenderResult<()> {
        md.inline.add_rule::<HighlightScanner>();
        Ok(())
    }
}

struct HighlightScanner;

impl InlineRule for HighlightScanner {
    const MARKER: char = '=';

    fn run(state: &mut InlineState) -> Option<(Node, usize)> {
        let input = &state.src[state.pos..state.pos_max];
        let rest = input.strip_prefix("==")?;
        let end = rest.find("==")?;
        if end == 0 || rest[..end].contains('\n') {
            return None;
        }

        // tokenize the inner text as inline markdown
        let start = state.pos;
        let max = state.pos_max;
        let old_node = std::mem::replace(&mut state.node, Node::new(WxToken::Highlight));
        state.pos = start + 2;
        state.pos_max = start + 2 + end;
        state.md.inline.tokenize(state);
        state.pos = start;
        state.pos_max = max;
        let node = std::mem::replace(&mut state.node, old_node);

        Some((node, end + 4))
    }
}
