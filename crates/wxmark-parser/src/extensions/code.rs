//! Code blocks
//!
//! Formula fences (`latex`, `tex`, `am`, `asciimath`) are typeset through
//! the math service. Everything else becomes a line-per-`<code>` block
//! that survives the WeChat editor's whitespace handling.

use markdown_it::common::utils::escape_html;
use markdown_it::parser::core::CoreRule;
use markdown_it::parser::extset::MarkdownItExt;
use markdown_it::plugins::cmark::block::code::CodeBlock as IndentedCode;
use markdown_it::plugins::cmark::block::fence::CodeFence;
use markdown_it::{MarkdownIt, Node};

use crate::context::{in_embed, RenderContext};
use crate::error::RenderResult;
use crate::extension::Extension;
use crate::settings::MathDialect;
use crate::token::WxToken;

#[derive(Debug, Clone)]
struct CodeHandle(RenderContext);

impl MarkdownItExt for CodeHandle {}

pub struct CodeExtension {
    context: RenderContext,
}

impl CodeExtension {
    pub fn new(context: RenderContext) -> Self {
        Self { context }
    }
}

impl Extension for CodeExtension {
    fn name(&self) -> &'static str {
        "code"
    }

    fn register(&self, md: &mut MarkdownIt) -> RenderResult<()> {
        md.ext.insert(CodeHandle(self.context.clone()));
        md.add_rule::<RenderCodeBlocks>();
        Ok(())
    }
}

fn preserve_spaces(text: &str) -> String {
    text.replace('\t', "&nbsp;&nbsp;&nbsp;&nbsp;")
        .replace(' ', "&nbsp;")
}

/// Build the markup for a non-formula code block
pub fn code_block_html(code: &str, lang: Option<&str>, line_numbers: bool) -> String {
    let code = code.strip_suffix('\n').unwrap_or(code);

    let mut body = String::new();
    let mut gutter = String::new();
    for (i, line) in code.split('\n').enumerate() {
        let text = preserve_spaces(&escape_html(line));
        if text.is_empty() {
            body.push_str("<code><br></code>");
        } else {
            body.push_str(&format!("<code>{}</code>", text));
        }
        gutter.push_str(&format!("<li>{}</li>", i + 1));
    }

    let mut html = String::from("<section class=\"code-section code-snippet__fix hljs\">");
    if line_numbers {
        html.push_str(&format!("<ul>{}</ul>", gutter));
    }
    match lang {
        Some(lang) => html.push_str(&format!(
            "<pre class=\"hljs language-{}\">{}</pre>",
            escape_html(lang),
            body
        )),
        None => html.push_str(&format!("<pre>{}</pre>", body)),
    }
    html.push_str("</section>");
    html
}

struct RenderCodeBlocks;

impl CoreRule for RenderCodeBlocks {
    fn run(root: &mut Node, md: &MarkdownIt) {
        if in_embed(md) {
            return;
        }
        let Some(CodeHandle(context)) = md.ext.get::<CodeHandle>() else {
            return;
        };
        let line_numbers = context.settings.line_number;

        root.walk_mut(|node, _| {
            let html = if let Some(fence) = node.cast::<CodeFence>() {
                let lang = fence.info.split_whitespace().next().filter(|l| !l.is_empty());
                match lang.and_then(MathDialect::from_fence_lang) {
                    Some(dialect) => {
                        context.math.render(fence.content.trim(), true, true, dialect)
                    }
                    None => code_block_html(&fence.content, lang, line_numbers),
                }
            } else if let Some(code) = node.cast::<IndentedCode>() {
                code_block_html(&code.content, None, line_numbers)
            } else {
                return;
            };
            node.replace(WxToken::Code { html });
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::RenderSettings;

    fn render(input: &str, line_number: bool) -> String {
        let settings = RenderSettings {
            line_number,
            ..Default::default()
        };
        let ext = CodeExtension::new(RenderContext::new(settings));
        let mut md = MarkdownIt::new();
        markdown_it::plugins::cmark::add(&mut md);
        ext.register(&mut md).unwrap();
        md.parse(input).render()
    }

    #[test]
    fn test_code_block_markup() {
        let html = code_block_html("fn main() {\n\n\tx < 1\n}\n", Some("rust"), true);
        assert_eq!(
            html,
            "<section class=\"code-section code-snippet__fix hljs\">\
             <ul><li>1</li><li>2</li><li>3</li><li>4</li></ul>\
             <pre class=\"hljs language-rust\">\
             <code>fn&nbsp;main()&nbsp;{</code>\
             <code><br></code>\
             <code>&nbsp;&nbsp;&nbsp;&nbsp;x&nbsp;&lt;&nbsp;1</code>\
             <code>}</code>\
             </pre></section>"
        );
    }

    #[test]
    fn test_fenced_block() {
        let html = render("```python\nprint('hi')\n```", true);
        assert!(html.contains("<pre class=\"hljs language-python\"><code>print('hi')</code></pre>"));
        assert!(html.contains("<ul><li>1</li></ul>"));
    }

    #[test]
    fn test_without_line_numbers() {
        let html = render("```\nplain\n```", false);
        assert!(!html.contains("<ul>"));
        assert!(html.contains("<pre><code>plain</code></pre>"));
    }

    #[test]
    fn test_indented_block() {
        let html = render("    indented", false);
        assert!(html.contains("<code>indented</code>"));
    }

    #[test]
    fn test_formula_fence_goes_to_math() {
        let html = render("```latex\nE = mc^2\n```", true);
        assert!(html.contains("class=\"block-math-svg\""));
        assert!(html.contains("E = mc^2"));
        assert!(!html.contains("code-section"));
    }
}
