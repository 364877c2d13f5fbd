//! Preserve runs of blank lines between blocks
//!
//! CommonMark collapses any number of blank lines into one block
//! separator. With this extension each extra blank line becomes an empty
//! paragraph.

use markdown_it::parser::core::{CoreRule, Root};
use markdown_it::{MarkdownIt, Node};

use crate::error::RenderResult;
use crate::extension::Extension;
use crate::token::WxToken;

pub struct EmptyLineExtension;

impl Extension for EmptyLineExtension {
    fn name(&self) -> &'static str {
        "empty-line"
    }

    fn register(&self, md: &mut MarkdownIt) -> RenderResult<()> {
        md.add_rule::<InsertEmptyLines>();
        Ok(())
    }
}

/// Number of empty paragraphs for a gap between two blocks
pub(crate) fn empty_lines_in(gap: &str) -> usize {
    gap.matches('\n').count().saturating_sub(1)
}

struct InsertEmptyLines;

impl CoreRule for InsertEmptyLines {
    fn run(root: &mut Node, _: &MarkdownIt) {
        let Some(source) = root.cast::<Root>().map(|r| r.content.clone()) else {
            return;
        };

        let children = std::mem::take(&mut root.children);
        let mut result = Vec::with_capacity(children.len());
        let mut prev_end: Option<usize> = None;

        for child in children {
            let span = child.srcmap.as_ref().map(|s| s.get_byte_offsets());
            if let (Some(end), Some((start, _))) = (prev_end, span) {
                if start > end {
                    let count = source.get(end..start).map(empty_lines_in).unwrap_or(0);
                    if count > 0 {
                        result.push(Node::new(WxToken::EmptyLine { count }));
                    }
                }
            }
            if let Some((_, end)) = span {
                prev_end = Some(end);
            }
            result.push(child);
        }
        root.children = result;
    }
}
