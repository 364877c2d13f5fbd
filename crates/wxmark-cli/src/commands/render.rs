use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{info, warn};
use wxmark_parser::WxParser;

use crate::config::CliConfig;

pub async fn execute(config: CliConfig, file: PathBuf, output: Option<PathBuf>) -> Result<()> {
    let mut parser = WxParser::new(config.context());
    let html = parser
        .render_file(&file)
        .await
        .with_context(|| format!("Failed to render {}", file.display()))?;
    parser.before_publish();

    let pending = parser.context().images.pending_uploads();
    if !pending.is_empty() {
        warn!(count = pending.len(), "article references local images that are not uploaded");
    }

    match output {
        Some(path) => {
            tokio::fs::write(&path, &html)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), bytes = html.len(), "wrote article");
        }
        None => println!("{}", html),
    }

    parser.cleanup();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_render_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let note = dir.path().join("post.md");
        let out = dir.path().join("post.html");
        std::fs::write(&note, "---\ntitle: x\n---\n# Title\n\n==mark==").unwrap();

        execute(CliConfig::default(), note, Some(out.clone())).await.unwrap();

        let html = std::fs::read_to_string(out).unwrap();
        assert!(html.starts_with("<h1>Title</h1>"));
        assert!(html.contains("<span class=\"note-highlight\">mark</span>"));
    }

    #[tokio::test]
    async fn test_missing_note_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = execute(CliConfig::default(), dir.path().join("gone.md"), None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("gone.md"));
    }
}
