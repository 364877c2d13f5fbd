use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;
use wxmark_parser::{EmbedStyle, LinkStyle};

/// How external links are shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LinkStyleArg {
    /// `text[url]`
    Inline,
    /// Numbered, listed at the end of the article
    Footnote,
}

impl From<LinkStyleArg> for LinkStyle {
    fn from(style: LinkStyleArg) -> Self {
        match style {
            LinkStyleArg::Inline => LinkStyle::Inline,
            LinkStyleArg::Footnote => LinkStyle::Footnote,
        }
    }
}

/// Wrapper for embedded notes
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EmbedStyleArg {
    Content,
    Quote,
}

impl From<EmbedStyleArg> for EmbedStyle {
    fn from(style: EmbedStyleArg) -> Self {
        match style {
            EmbedStyleArg::Content => EmbedStyle::Content,
            EmbedStyleArg::Quote => EmbedStyle::Quote,
        }
    }
}

#[derive(Parser)]
#[command(name = "wxmark")]
#[command(about = "wxmark - render Obsidian notes as WeChat article HTML")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// More log output: -v info, -vv debug, -vvv trace
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only report errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Config file path (defaults to ~/.config/wxmark/config.toml)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Vault root used to resolve embeds and images (overrides config file)
    #[arg(long, global = true, env = "WXMARK_VAULT")]
    pub vault: Option<PathBuf>,
}

impl Cli {
    /// Log level from `--quiet` and the number of `-v` flags; warnings by default
    pub fn level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::ERROR;
        }
        match self.verbose {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }
}

/// Options that override the `[render]` table of the config file
#[derive(Debug, Clone, Default, clap::Args)]
pub struct RenderOverrides {
    /// Link presentation
    #[arg(long, value_enum)]
    pub link_style: Option<LinkStyleArg>,

    /// Embedded note wrapper
    #[arg(long, value_enum)]
    pub embed_style: Option<EmbedStyleArg>,

    /// Keep runs of blank lines as empty paragraphs
    #[arg(long)]
    pub empty_lines: bool,

    /// Wrap images in figure/figcaption
    #[arg(long)]
    pub figcaption: bool,

    /// Number headings 1., 1.1., ...
    #[arg(long)]
    pub heading_numbers: bool,

    /// Hide the code block line gutter
    #[arg(long)]
    pub no_line_numbers: bool,

    /// Directory of custom `<name>.svg` icons
    #[arg(long)]
    pub icons: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render a note to HTML
    Render {
        /// Markdown note to render
        file: PathBuf,

        /// Write HTML here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        overrides: RenderOverrides,
    },

    /// List local images a note references
    Images {
        /// Markdown note to scan
        file: PathBuf,

        /// Show only images that still need uploading
        #[arg(long)]
        pending: bool,
    },

    /// Print the effective render settings as TOML
    Settings,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_render_parses() {
        let cli = Cli::try_parse_from(["wxmark", "render", "post.md"]).unwrap();
        if let Commands::Render {
            file,
            output,
            overrides,
        } = cli.command
        {
            assert_eq!(file, PathBuf::from("post.md"));
            assert!(output.is_none());
            assert!(overrides.link_style.is_none());
            assert!(!overrides.empty_lines);
        } else {
            panic!("Expected Render command");
        }
    }

    #[test]
    fn test_render_overrides() {
        let cli = Cli::try_parse_from([
            "wxmark",
            "render",
            "post.md",
            "-o",
            "post.html",
            "--link-style",
            "footnote",
            "--empty-lines",
            "--embed-style",
            "quote",
        ])
        .unwrap();
        if let Commands::Render {
            output, overrides, ..
        } = cli.command
        {
            assert_eq!(output, Some(PathBuf::from("post.html")));
            assert_eq!(overrides.link_style, Some(LinkStyleArg::Footnote));
            assert_eq!(overrides.embed_style, Some(EmbedStyleArg::Quote));
            assert!(overrides.empty_lines);
        } else {
            panic!("Expected Render command");
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["wxmark", "images", "post.md", "--pending", "--vault", "/notes", "-v"])
                .unwrap();
        assert_eq!(cli.verbose, 1);
        assert_eq!(cli.vault, Some(PathBuf::from("/notes")));
        assert!(matches!(cli.command, Commands::Images { pending: true, .. }));
    }

    #[test]
    fn test_verbosity_levels() {
        let level = |args: &[&str]| {
            Cli::try_parse_from(["wxmark"].iter().chain(args).chain(&["settings"]).copied())
                .unwrap()
                .level()
        };
        assert_eq!(level(&[]), LevelFilter::WARN);
        assert_eq!(level(&["-v"]), LevelFilter::INFO);
        assert_eq!(level(&["-vv"]), LevelFilter::DEBUG);
        assert_eq!(level(&["-vvvv"]), LevelFilter::TRACE);
        assert_eq!(level(&["-q"]), LevelFilter::ERROR);
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["wxmark", "-q", "-v", "settings"]).is_err());
    }

    #[test]
    fn test_invalid_link_style_rejected() {
        let result = Cli::try_parse_from(["wxmark", "render", "a.md", "--link-style", "sidenote"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["wxmark"]).is_err());
    }
}
