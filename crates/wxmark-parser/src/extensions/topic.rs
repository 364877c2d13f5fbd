//! `#topic` tags rendered as WeChat topic links

use markdown_it::parser::inline::{InlineRule, InlineState};
use markdown_it::{MarkdownIt, Node};

use crate::error::RenderResult;
use crate::extension::Extension;
use crate::token::WxToken;

pub struct TopicExtension;

impl Extension for TopicExtension {
    fn name(&self) -> &'static str {
        "topic"
    }

    fn register(&self, md: &mut MarkdownIt) -> RenderResult<()> {
        md.inline.add_rule::<TopicScanner>();
        Ok(())
    }
}

struct TopicScanner;

impl InlineRule for TopicScanner {
    const MARKER: char = '#';

    fn run(state: &mut InlineState) -> Option<(Node, usize)> {
        let input = &state.src[state.pos..state.pos_max];
        let rest = input.strip_prefix('#')?;
        let end = rest
            .find(|c: char| c.is_whitespace() || c == '#')
            .unwrap_or(rest.len());
        if end == 0 {
            return None;
        }

        let node = Node::new(WxToken::Topic {
            tag: rest[..end].to_string(),
        });
        Some((node, end + 1))
    }
}
