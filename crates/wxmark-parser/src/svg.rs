//! SVG appearance overrides for icons and embedded SVG files

use markdown_it::common::utils::escape_html;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;


static COLOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:#[0-9a-f]{3,8}|rgba?\([^)]*\)|hsla?\([^)]*\)|var\(--[a-z0-9_-]+\)|[a-z]+)$",
    )
    .expect("valid color regex")
});

/// Size and color overrides applied to a root `<svg>` element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Appearance {
    pub width: Option<String>,
    pub height: Option<String>,
    pub color: Option<String>,
}

impl Appearance {
    /// Build an appearance from the `|`-separated parts after the name.
    ///
    /// With two parts the first is the size and the second the color. A
    /// single part is a color if it looks like one, otherwise a size.
    pub fn from_parts(parts: &[&str]) -> Self {
        let mut appearance = Self::default();
        match parts {
            [size, color] => {
                appearance.set_size(size);
                if is_color(color) {
                    appearance.color = Some(color.trim().to_string());
                }
            }
            [single] => {
                if is_color(single) {
                    appearance.color = Some(single.trim().to_string());
                } else {
                    appearance.set_size(single);
                }
            }
            _ => {}
        }
        appearance
    }

    fn set_size(&mut self, size: &str) {
        let size = size.trim();
        if size.is_empty() {
            return;
        }
        match size.split_once('x') {
            Some((w, h)) => {
                self.width = Some(with_unit(w));
                self.height = Some(with_unit(h));
            }
            None => {
                self.width = Some(with_unit(size));
                self.height = Some(with_unit(size));
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width.is_none() && self.height.is_none() && self.color.is_none()
    }
}

pub fn is_color(text: &str) -> bool {
    COLOR_RE.is_match(text.trim())
}

fn with_unit(value: &str) -> String {
    let value = value.trim();
    if value.parse::<f64>().is_ok() {
        format!("{}px", value)
    } else {
        value.to_string()
    }
}

/// Rewrite the root `<svg>` of `svg` with the given appearance.
///
/// Markup without an `<svg>` element is returned unchanged.
pub fn apply_appearance(svg: &str, appearance: &Appearance) -> String {
    if appearance.is_empty() {
        return svg.to_string();
    }

    let fragment = Html::parse_fragment(svg);
    let Ok(selector) = Selector::parse("svg") else {
        return svg.to_string();
    };
    let Some(root) = fragment.select(&selector).next() else {
        return svg.to_string();
    };

    let mut attrs: Vec<(String, String)> = root
        .value()
        .attrs()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();

    let mut set = |name: &str, value: &str| {
        match attrs.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value.to_string(),
            None => attrs.push((name.to_string(), value.to_string())),
        }
    };
    if let Some(width) = &appearance.width {
        set("width", width);
    }
    if let Some(height) = &appearance.height {
        set("height", height);
    }
    if let Some(color) = &appearance.color {
        set("fill", color);
        set("stroke", color);
        set("color", color);
    }

    let mut out = String::from("<svg");
    for (name, value) in &attrs {
        out.push_str(&format!(" {}=\"{}\"", name, escape_html(value)));
    }
    out.push('>');
    out.push_str(&root.inner_html());
    out.push_str("</svg>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHECK: &str = r#"<svg viewBox="0 0 24 24" width="16"><path d="M20 6 9 17l-5-5"></path></svg>"#;

    #[test]
    fn test_size_and_color() {
        let appearance = Appearance::from_parts(&["24", "#ff0000"]);
        assert_eq!(appearance.width.as_deref(), Some("24px"));
        assert_eq!(appearance.height.as_deref(), Some("24px"));
        assert_eq!(appearance.color.as_deref(), Some("#ff0000"));
    }

    #[test]
    fn test_single_part_disambiguation() {
        let sized = Appearance::from_parts(&["24x32"]);
        assert_eq!(sized.width.as_deref(), Some("24px"));
        assert_eq!(sized.height.as_deref(), Some("32px"));
        assert!(sized.color.is_none());

        let colored = Appearance::from_parts(&["rgb(1, 2, 3)"]);
        assert!(colored.width.is_none());
        assert_eq!(colored.color.as_deref(), Some("rgb(1, 2, 3)"));

        let var = Appearance::from_parts(&["var(--accent)"]);
        assert_eq!(var.color.as_deref(), Some("var(--accent)"));
    }

    #[test]
    fn test_invalid_color_dropped() {
        let appearance = Appearance::from_parts(&["2em", "#zz"]);
        assert_eq!(appearance.width.as_deref(), Some("2em"));
        assert!(appearance.color.is_none());
    }

    #[test]
    fn test_apply_overrides_root_attributes() {
        let appearance = Appearance::from_parts(&["24", "red"]);
        let out = apply_appearance(CHECK, &appearance);

        assert!(out.starts_with("<svg"));
        assert!(out.contains("width=\"24px\""));
        assert!(!out.contains("width=\"16\""));
        assert!(out.contains("height=\"24px\""));
        assert!(out.contains("fill=\"red\""));
        assert!(out.contains("stroke=\"red\""));
        assert!(out.contains("<path"));
        assert!(out.ends_with("</svg>"));
    }

    #[test]
    fn test_apply_without_svg_is_identity() {
        let appearance = Appearance::from_parts(&["24"]);
        assert_eq!(apply_appearance("未找到图标x", &appearance), "未找到图标x");
        assert_eq!(apply_appearance(CHECK, &Appearance::default()), CHECK);
    }
}
