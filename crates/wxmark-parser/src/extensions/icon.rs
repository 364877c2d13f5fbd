//! Inline SVG icons: `[:name:]`, `[:name|24:]`, `[:name|24x32|#f00:]`

use markdown_it::common::utils::escape_html;
use markdown_it::parser::core::CoreRule;
use markdown_it::parser::extset::MarkdownItExt;
use markdown_it::parser::inline::{InlineRule, InlineState};
use markdown_it::{MarkdownIt, Node};
use tracing::warn;

use crate::context::{in_embed, RenderContext};
use crate::error::RenderResult;
use crate::extension::Extension;
use crate::svg::{apply_appearance, Appearance};
use crate::token::WxToken;

#[derive(Debug, Clone)]
struct IconHandle(RenderContext);

impl MarkdownItExt for IconHandle {}

pub struct IconExtension {
    context: RenderContext,
}

impl IconExtension {
    pub fn new(context: RenderContext) -> Self {
        Self { context }
    }
}

impl Extension for IconExtension {
    fn name(&self) -> &'static str {
        "svg-icon"
    }

    fn register(&self, md: &mut MarkdownIt) -> RenderResult<()> {
        md.ext.insert(IconHandle(self.context.clone()));
        md.inline.add_rule::<IconScanner>();
        md.add_rule::<ResolveIcons>();
        Ok(())
    }
}

/// Render `name|size|color` into the icon span
pub fn render_icon(context: &RenderContext, text: &str) -> String {
    let parts: Vec<&str> = text.split('|').collect();
    let name = parts[0].trim();

    let svg = context.assets.load_icon(name);
    if svg.is_empty() {
        warn!(name, "icon not found");
        return format!(
            "<span class=\"note-svg-icon\">未找到图标{}</span>",
            escape_html(name)
        );
    }

    let appearance = Appearance::from_parts(&parts[1..]);
    format!(
        "<span class=\"note-svg-icon\">{}</span>",
        apply_appearance(&svg, &appearance)
    )
}

struct IconScanner;

impl InlineRule for IconScanner {
    const MARKER: char = '[';

    fn run(state: &mut InlineState) -> Option<(Node, usize)> {
        let input = &state.src[state.pos..state.pos_max];
        let rest = input.strip_prefix("[:")?;
        let end = rest.find(":]")?;
        let text = &rest[..end];
        if text.is_empty() || text.contains('\n') {
            return None;
        }

        let node = Node::new(WxToken::Icon {
            text: text.to_string(),
            html: None,
        });
        Some((node, end + 4))
    }
}

struct ResolveIcons;

impl CoreRule for ResolveIcons {
    fn run(root: &mut Node, md: &MarkdownIt) {
        if in_embed(md) {
            return;
        }
        let Some(IconHandle(context)) = md.ext.get::<IconHandle>() else {
            return;
        };
        root.walk_mut(|node, _| {
            if let Some(WxToken::Icon { text, html }) = node.cast_mut::<WxToken>() {
                if html.is_none() {
                    *html = Some(render_icon(context, text));
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetManager;
    use crate::settings::RenderSettings;

    const CHECK: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24"><path d="M20 6 9 17l-5-5"></path></svg>"#;

    fn context() -> RenderContext {
        let assets = AssetManager::new();
        assets.register_icon("check", CHECK);
        RenderContext::new(RenderSettings::default()).with_assets(assets)
    }

    fn render(input: &str) -> String {
        let ext = IconExtension::new(context());
        let mut md = MarkdownIt::new();
        markdown_it::plugins::cmark::add(&mut md);
        ext.register(&mut md).unwrap();
        md.parse(input).render()
    }

    #[test]
    fn test_icon_with_size_and_color() {
        let html = render("ok [:check|24|#ff0000:]");
        assert!(html.contains("<span class=\"note-svg-icon\"><svg"));
        assert!(html.contains("width=\"24px\""));
        assert!(html.contains("height=\"24px\""));
        assert!(html.contains("fill=\"#ff0000\""));
    }

    #[test]
    fn test_icon_with_dimensions_only() {
        let html = render("[:check|24x32:]");
        assert!(html.contains("width=\"24px\""));
        assert!(html.contains("height=\"32px\""));
        assert!(!html.contains("fill="));
    }

    #[test]
    fn test_plain_icon_is_unchanged() {
        let html = render("[:check:]");
        assert!(html.contains(&format!("<span class=\"note-svg-icon\">{}</span>", CHECK)));
    }

    #[test]
    fn test_missing_icon_placeholder() {
        let html = render("[:nope:]");
        assert!(html.contains("<span class=\"note-svg-icon\">未找到图标nope</span>"));
    }

    #[test]
    fn test_links_still_work() {
        let html = render("[text](https://example.com)");
        assert!(html.contains("<a href=\"https://example.com\">text</a>"));
    }
}
