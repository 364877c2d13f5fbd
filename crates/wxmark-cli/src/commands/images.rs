use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use wxmark_parser::{ImageInfo, WxParser};

use crate::config::CliConfig;

/// Local images referenced by a note, in first-use order
pub async fn collect(config: &CliConfig, file: &Path, pending: bool) -> Result<Vec<ImageInfo>> {
    let mut parser = WxParser::new(config.context());
    parser
        .render_file(file)
        .await
        .with_context(|| format!("Failed to render {}", file.display()))?;

    let images = &parser.context().images;
    Ok(if pending {
        images.pending_uploads()
    } else {
        images.images()
    })
}

pub async fn execute(config: CliConfig, file: PathBuf, pending: bool) -> Result<()> {
    let images = collect(&config, &file, pending).await?;
    if images.is_empty() {
        println!("No local images");
        return Ok(());
    }

    for image in images {
        let status = match &image.url {
            Some(url) => url.as_str(),
            None => "pending",
        };
        println!("{}\t{}", image.file_path.display(), status);
    }
    Ok(())
}
