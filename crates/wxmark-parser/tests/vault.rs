//! Rendering notes that reference files in a vault

use std::fs;
use std::path::Path;

use wxmark_parser::{
    AssetManager, LinkStyle, RenderContext, RenderError, RenderSettings, WxParser,
};

fn vault() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("attachments")).unwrap();
    fs::write(root.join("attachments/diagram.png"), b"png").unwrap();
    fs::write(root.join("attachments/photo one.jpg"), b"jpg").unwrap();
    fs::write(
        root.join("Reference.md"),
        "---\nalias: ref\n---\n# Reference\n\n## Usage\nCall **it** twice.\n\n## Other\nignored\n",
    )
    .unwrap();
    fs::write(
        root.join("Post.md"),
        "---\ntitle: Post\n---\n# Post\n\n![[diagram.png|300x200]]\n\n![Photo](attachments/photo%20one.jpg)\n\n![[Reference#Usage]]\n",
    )
    .unwrap();
    dir
}

fn parser(root: &Path) -> WxParser {
    let context = RenderContext::new(RenderSettings::default())
        .with_assets(AssetManager::new().with_vault(root));
    WxParser::new(context)
}

#[tokio::test]
async fn test_render_post_with_embeds() {
    let dir = vault();
    let mut parser = parser(dir.path());

    let html = parser.render_file(dir.path().join("Post.md")).await.unwrap();

    assert!(html.starts_with("<h1>Post</h1>"));
    assert!(!html.contains("title: Post"));
    assert!(html.contains("width=\"300\" height=\"200\""));
    assert!(html.contains("<section class=\"note-embed-file\""));
    assert!(html.contains("Call <strong>it</strong> twice."));
    assert!(!html.contains("ignored"));
}

#[tokio::test]
async fn test_local_images_registered_for_upload() {
    let dir = vault();
    let mut parser = parser(dir.path());
    let html = parser.render_file(dir.path().join("Post.md")).await.unwrap();

    let images = parser.context().images.clone();
    let pending = images.pending_uploads();
    assert_eq!(pending.len(), 2);
    assert_eq!(pending[0].file_path, dir.path().join("attachments/diagram.png"));
    assert_eq!(pending[1].file_path, dir.path().join("attachments/photo one.jpg"));

    let local = pending[0].res_url.clone();
    assert!(images.mark_uploaded(&local, Some("m1".into()), "https://mmbiz.qpic.cn/1".into()));
    let published = images.apply_uploads(&html);
    assert!(published.contains("https://mmbiz.qpic.cn/1"));
    assert!(!published.contains(&local));
    assert_eq!(images.pending_uploads().len(), 1);
}

#[tokio::test]
async fn test_rendering_twice_registers_once() {
    let dir = vault();
    let mut parser = parser(dir.path());
    parser.render_file(dir.path().join("Post.md")).await.unwrap();
    parser.render_file(dir.path().join("Post.md")).await.unwrap();

    assert_eq!(parser.context().images.len(), 2);
}

#[tokio::test]
async fn test_missing_file_is_io_error() {
    let dir = vault();
    let mut parser = parser(dir.path());
    let err = parser.render_file(dir.path().join("Nope.md")).await.unwrap_err();
    assert!(matches!(err, RenderError::Io(_)));
}

#[test]
fn test_missing_embed_degrades() {
    let dir = vault();
    let html = parser(dir.path()).parse("![[Nowhere]]\n\nstill here").unwrap();
    assert!(html.contains("找不到文件：Nowhere"));
    assert!(html.contains("<p>still here</p>"));
}

#[tokio::test]
async fn test_embedded_note_numbered_in_document_order() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("Note.md"), "# Inner\n\n[b](https://b.example)\n").unwrap();
    fs::write(
        dir.path().join("Main.md"),
        "# Outer\n\n[a](https://a.example)\n\n![[Note]]\n\n# Last\n",
    )
    .unwrap();
    let settings = RenderSettings {
        heading_numbers: true,
        link_style: LinkStyle::Footnote,
        ..Default::default()
    };
    let context =
        RenderContext::new(settings).with_assets(AssetManager::new().with_vault(dir.path()));
    let mut parser = WxParser::new(context);

    let html = parser.render_file(dir.path().join("Main.md")).await.unwrap();

    assert!(html.contains("<span class=\"heading-number\">1.</span> Outer"));
    assert!(html.contains("<span class=\"heading-number\">2.</span> Inner"));
    assert!(html.contains("<span class=\"heading-number\">3.</span> Last"));
    assert!(html.contains("a<sup>[1]</sup>"));
    assert!(html.contains("b<sup>[2]</sup>"));
    assert!(html.contains("<section class=\"note-embed-file\" id=\"fid-0\">"));

    let links = html.split("<section class=\"footnotes\">").nth(1).unwrap();
    assert!(links.find("https://a.example").unwrap() < links.find("https://b.example").unwrap());
}
