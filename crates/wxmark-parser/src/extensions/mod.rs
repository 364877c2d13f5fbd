//! Built-in extensions
//!
//! Each extension installs its own tokenizers and tree passes. Order
//! matters where two extensions start on the same character; see
//! [`default_extensions`].

pub mod block_mark;
pub mod blockquote;
pub mod code;
pub mod comment;
pub mod empty_line;
pub mod footnote;
pub mod heading;
pub mod highlight;
pub mod icon;
pub mod link;
pub mod local_file;
pub mod math;
pub mod overrides;
pub mod topic;

pub use block_mark::BlockMarkExtension;
pub use blockquote::CalloutExtension;
pub use code::CodeExtension;
pub use comment::CommentExtension;
pub use empty_line::EmptyLineExtension;
pub use footnote::FootnoteExtension;
pub use heading::HeadingExtension;
pub use highlight::HighlightExtension;
pub use icon::IconExtension;
pub use link::LinkExtension;
pub use local_file::LocalFileExtension;
pub use math::MathExtension;
pub use topic::TopicExtension;

use crate::context::RenderContext;
use crate::extension::Extension;

/// The standard extension chain, in registration order.
///
/// Footnotes come before links: footnote bodies are rendered during
/// postprocess and must register their links before the link list is
/// written. The empty-line extension is only included when enabled in
/// settings.
pub fn default_extensions(context: &RenderContext) -> Vec<Box<dyn Extension>> {
    let mut extensions: Vec<Box<dyn Extension>> = vec![
        Box::new(LocalFileExtension::new(context.clone())),
        Box::new(CalloutExtension::new(context.clone())),
        Box::new(BlockMarkExtension::new()),
        Box::new(IconExtension::new(context.clone())),
        Box::new(FootnoteExtension::new()),
        Box::new(LinkExtension::new(context.clone())),
        Box::new(HighlightExtension),
        Box::new(CodeExtension::new(context.clone())),
        Box::new(CommentExtension),
        Box::new(TopicExtension),
        Box::new(HeadingExtension::new(context.clone())),
    ];
    if context.settings.enable_empty_line {
        extensions.push(Box::new(EmptyLineExtension));
    }
    extensions.push(Box::new(MathExtension::new(context.clone())));
    extensions
}
