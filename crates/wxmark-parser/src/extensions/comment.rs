//! `%%comments%%`, inline or spanning whole lines. Never rendered.

use markdown_it::parser::block::{BlockRule, BlockState};
use markdown_it::parser::inline::{InlineRule, InlineState};
use markdown_it::plugins::cmark::block::blockquote::BlockquoteScanner;
use markdown_it::{MarkdownIt, Node};

use crate::error::RenderResult;
use crate::extension::Extension;
use crate::token::WxToken;

pub struct CommentExtension;

impl Extension for CommentExtension {
    fn name(&self) -> &'static str {
        "comment"
    }

    fn register(&self, md: &mut MarkdownIt) -> RenderResult<()> {
        md.block
            .add_rule::<BlockCommentScanner>()
            .before::<BlockquoteScanner>();
        md.inline.add_rule::<InlineCommentScanner>();
        Ok(())
    }
}

struct InlineCommentScanner;

impl InlineRule for InlineCommentScanner {
    const MARKER: char = '%';

    fn run(state: &mut InlineState) -> Option<(Node, usize)> {
        let input = &state.src[state.pos..state.pos_max];
        let rest = input.strip_prefix("%%")?;
        let end = rest.find("%%")?;

        let node = Node::new(WxToken::Comment {
            text: rest[..end].to_string(),
            block: false,
        });
        Some((node, end + 4))
    }
}

/// A comment that opens at the start of a line and closes at the end of a
/// line, possibly several lines (and blank lines) later
struct BlockCommentScanner;

impl BlockRule for BlockCommentScanner {
    fn run(state: &mut BlockState) -> Option<(Node, usize)> {
        let start = state.line;
        let first = state.get_line(start).trim_start();
        let opened = first.strip_prefix("%%")?;

        let mut text = Vec::new();
        let mut segment = opened.to_string();
        let mut line = start;
        loop {
            if let Some(end) = segment.find("%%") {
                if !segment[end + 2..].trim().is_empty() {
                    return None;
                }
                text.push(segment[..end].to_string());
                break;
            }
            text.push(segment);
            line += 1;
            if line >= state.line_max {
                return None;
            }
            segment = state.get_line(line).to_string();
        }

        let mut node = Node::new(WxToken::Comment {
            text: text.join("\n"),
            block: true,
        });
        node.srcmap = state.get_map(start, line);
        Some((node, line - start + 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(input: &str) -> String {
        let mut md = MarkdownIt::new();
        markdown_it::plugins::cmark::add(&mut md);
        CommentExtension.register(&mut md).unwrap();
        md.parse(input).render()
    }

    #[test]
    fn test_inline_comment_removed() {
        assert_eq!(render("keep %%drop%% this"), "<p>keep  this</p>\n");
    }

    #[test]
    fn test_block_comment_removed() {
        let html = render("before\n\n%%\nhidden\n\nstill hidden\n%%\n\nafter");
        assert_eq!(html, "<p>before</p>\n<p>after</p>\n");
    }

    #[test]
    fn test_single_line_block_comment() {
        assert_eq!(render("%% note to self %%\n\nbody"), "<p>body</p>\n");
    }

    #[test]
    fn test_unclosed_comment_is_text() {
        assert_eq!(render("50%% off"), "<p>50%% off</p>\n");
    }
}
