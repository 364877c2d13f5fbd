//! Formulas: `$inline$`, `$$display$$` and `$$` fenced blocks

use markdown_it::parser::block::{BlockRule, BlockState};
use markdown_it::parser::core::CoreRule;
use markdown_it::parser::extset::MarkdownItExt;
use markdown_it::parser::inline::{InlineRule, InlineState};
use markdown_it::plugins::cmark::block::blockquote::BlockquoteScanner;
use markdown_it::{MarkdownIt, Node};

use crate::context::{in_embed, RenderContext};
use crate::error::RenderResult;
use crate::extension::Extension;
use crate::token::{MathToken, WxToken};

#[derive(Debug, Clone)]
struct MathHandle(RenderContext);

impl MarkdownItExt for MathHandle {}

pub struct MathExtension {
    context: RenderContext,
}

impl MathExtension {
    pub fn new(context: RenderContext) -> Self {
        Self { context }
    }
}

impl Extension for MathExtension {
    fn name(&self) -> &'static str {
        "math"
    }

    fn register(&self, md: &mut MarkdownIt) -> RenderResult<()> {
        md.ext.insert(MathHandle(self.context.clone()));
        md.block
            .add_rule::<BlockMathScanner>()
            .before::<BlockquoteScanner>();
        md.inline.add_rule::<InlineMathScanner>();
        md.add_rule::<MathRendering>();
        Ok(())
    }

    fn prepare(&self) {
        self.context.math.reset_ids();
    }
}

/// Scan `$...$` or `$$...$$` at the start of `input`.
///
/// Returns the delimiter count, the trimmed body and the consumed length.
/// The body may not start with `$`, must not end with an unescaped
/// backslash or `$`, and must stay on one line.
pub(crate) fn scan_inline(input: &str) -> Option<(usize, &str, usize)> {
    let bytes = input.as_bytes();
    let delims = bytes.iter().take(2).take_while(|&&b| b == b'$').count();
    if delims == 0 || bytes.get(delims) == Some(&b'$') {
        return None;
    }

    let mut i = delims;
    while i < bytes.len() {
        match bytes[i] {
            b'\n' => return None,
            b'\\' => {
                if i + 1 >= bytes.len() || bytes[i + 1] == b'\n' {
                    return None;
                }
                i += 2;
            }
            b'$' => {
                let body = &input[delims..i];
                let closes = bytes[i..].iter().take_while(|&&b| b == b'$').count() >= delims;
                if !body.is_empty() && closes {
                    let text = body.trim();
                    if text.is_empty() {
                        return None;
                    }
                    return Some((delims, text, i + delims));
                }
                if !closes {
                    i += 1;
                    continue;
                }
                return None;
            }
            _ => i += 1,
        }
    }
    None
}

struct InlineMathScanner;

impl InlineRule for InlineMathScanner {
    const MARKER: char = '$';

    fn run(state: &mut InlineState) -> Option<(Node, usize)> {
        let input = &state.src[state.pos..state.pos_max];
        let (delims, text, len) = scan_inline(input)?;

        let node = Node::new(WxToken::InlineMath(MathToken {
            text: text.to_string(),
            display_mode: delims == 2,
            html: None,
        }));
        Some((node, len))
    }
}

struct BlockMathScanner;

impl BlockRule for BlockMathScanner {
    fn run(state: &mut BlockState) -> Option<(Node, usize)> {
        let start = state.line;
        let delim = state.get_line(start).trim_end();
        if delim != "$" && delim != "$$" {
            return None;
        }
        let delim = delim.to_string();

        let mut lines = Vec::new();
        let mut line = start + 1;
        while line < state.line_max {
            let current = state.get_line(line);
            if current.trim_end() == delim {
                let text = lines.join("\n").trim().to_string();
                if text.is_empty() {
                    return None;
                }
                let mut node = Node::new(WxToken::BlockMath(MathToken {
                    text,
                    display_mode: delim.len() == 2,
                    html: None,
                }));
                node.srcmap = state.get_map(start, line);
                return Some((node, line - start + 1));
            }
            lines.push(current.to_string());
            line += 1;
        }
        None
    }
}

/// Renders every formula through the shared math service
struct MathRendering;

impl CoreRule for MathRendering {
    fn run(root: &mut Node, md: &MarkdownIt) {
        if in_embed(md) {
            return;
        }
        let Some(MathHandle(context)) = md.ext.get::<MathHandle>() else {
            return;
        };
        let dialect = context.settings.math;

        root.walk_mut(|node, _| match node.cast_mut::<WxToken>() {
            Some(WxToken::InlineMath(math)) if math.html.is_none() => {
                math.html = Some(context.math.render(&math.text, false, math.display_mode, dialect));
            }
            Some(WxToken::BlockMath(math)) if math.html.is_none() => {
                math.html = Some(context.math.render(&math.text, true, true, dialect));
            }
            _ => {}
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(input: &str) -> String {
        let ext = MathExtension::new(RenderContext::default());
        let mut md = MarkdownIt::new();
        markdown_it::plugins::cmark::add(&mut md);
        ext.register(&mut md).unwrap();
        md.parse(input).render()
    }

    #[test]
    fn test_scan_inline() {
        assert_eq!(scan_inline("$x^2$ rest"), Some((1, "x^2", 5)));
        assert_eq!(scan_inline("$$ a+b $$"), Some((2, "a+b", 9)));
        assert_eq!(scan_inline(r"$\$5$"), Some((1, r"\$5", 5)));
        assert_eq!(scan_inline("$$$x$$$"), None);
        assert_eq!(scan_inline("$x"), None);
        assert_eq!(scan_inline("$a\nb$"), None);
        assert_eq!(scan_inline("$ $"), None);
    }

    #[test]
    fn test_inline_formula() {
        let html = render("Euler: $e^{i\\pi}+1=0$.");
        assert!(html.contains(r#"<span id="math-id-1" class="inline-math-svg">"#));
        assert!(html.contains(r"$e^{i\pi}+1=0$"));
        assert!(html.ends_with(".</p>\n"));
    }

    #[test]
    fn test_block_formula() {
        let html = render("$$\n\\int_0^1 x\\,dx\n$$\n\nafter");
        assert!(html.contains(r#"class="block-math-svg"><section class="block-math-section">"#));
        assert!(html.contains("<p>after</p>"));
        assert!(!html.contains("<p>$$"));
    }

    #[test]
    fn test_unclosed_block_is_text() {
        let html = render("$$\nx\n");
        assert!(!html.contains("math-svg"));
    }

    #[test]
    fn test_same_formula_hits_cache() {
        let context = RenderContext::default();
        let ext = MathExtension::new(context.clone());
        let mut md = MarkdownIt::new();
        markdown_it::plugins::cmark::add(&mut md);
        ext.register(&mut md).unwrap();

        md.parse("$x$ and $x$ and $y$").render();
        assert_eq!(context.math.len(), 2);
    }
}
