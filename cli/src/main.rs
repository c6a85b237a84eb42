//! mdpress CLI - Markdown to paginated PDF

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use mdpress::detect;
use mdpress::{
    ExportEvent, ExportObserver, Mdpress, PaperSize, ParseOptions, RenderOptions, PREVIEW_ID,
};

#[derive(Parser)]
#[command(name = "mdpress")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Render Markdown and export it as a paginated PDF", long_about = None)]
struct Cli {
    /// Input Markdown file
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output PDF file
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    #[command(flatten)]
    page: PageArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Export Markdown to PDF
    Export {
        /// Input Markdown file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output PDF file (defaults to the input name with .pdf)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        #[command(flatten)]
        page: PageArgs,

        /// Document title
        #[arg(long)]
        title: Option<String>,

        /// Document author
        #[arg(long, env = "MDPRESS_AUTHOR")]
        author: Option<String>,

        /// Also write each captured page as PNG into this directory
        #[arg(long, value_name = "DIR")]
        pages_dir: Option<PathBuf>,
    },

    /// Print the pagination plan as JSON
    Plan {
        /// Input Markdown file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        #[command(flatten)]
        page: PageArgs,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Show block and page statistics
    Info {
        /// Input Markdown file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Show version information
    Version,
}

#[derive(Args, Clone)]
struct PageArgs {
    /// Paper format
    #[arg(long, value_enum, env = "MDPRESS_PAPER", default_value = "a4")]
    paper: Paper,

    /// Virtual page width in pixels
    #[arg(long, env = "MDPRESS_PAGE_WIDTH", default_value_t = 800.0)]
    width: f32,

    /// Page padding in pixels
    #[arg(long, env = "MDPRESS_PADDING", default_value_t = 40.0)]
    padding: f32,

    /// Capture oversampling factor
    #[arg(long, env = "MDPRESS_OVERSAMPLE", default_value_t = 2.0)]
    oversample: f32,

    /// Additional font directory (repeatable)
    #[arg(long, value_name = "DIR")]
    font_dir: Vec<PathBuf>,

    /// Drop raw HTML instead of showing it as text
    #[arg(long)]
    strip_html: bool,
}

impl PageArgs {
    fn builder(&self) -> Mdpress {
        let mut parse = ParseOptions::new();
        if self.strip_html {
            parse = parse.strip_html();
        }
        let mut builder = Mdpress::new()
            .with_render_options(RenderOptions::new().with_parse_options(parse))
            .with_paper(self.paper.into())
            .with_page_width(self.width)
            .with_padding(self.padding)
            .with_oversample(self.oversample);
        for dir in &self.font_dir {
            builder = builder.with_font_dir(dir);
        }
        builder.with_system_fonts()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Paper {
    /// ISO A4 (210 x 297 mm)
    A4,
    /// ISO A5 (148 x 210 mm)
    A5,
    /// US Letter (8.5 x 11 in)
    Letter,
    /// US Legal (8.5 x 14 in)
    Legal,
}

impl From<Paper> for PaperSize {
    fn from(paper: Paper) -> Self {
        match paper {
            Paper::A4 => PaperSize::A4,
            Paper::A5 => PaperSize::A5,
            Paper::Letter => PaperSize::LETTER,
            Paper::Legal => PaperSize::LEGAL,
        }
    }
}

/// Drives a progress bar from export events.
struct ProgressObserver {
    bar: ProgressBar,
}

impl ProgressObserver {
    fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(1);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
                .progress_chars("#>-"),
        );
        bar.set_message("Rendering...");
        Ok(Self { bar })
    }
}

impl ExportObserver for ProgressObserver {
    fn on_event(&self, event: &ExportEvent) {
        match event {
            ExportEvent::Started { blocks, .. } => {
                self.bar.set_message(format!("Packing {} blocks...", blocks));
            }
            ExportEvent::Packed { pages, .. } => {
                self.bar.set_length(u64::from(*pages));
                self.bar.set_message("Capturing pages...");
            }
            ExportEvent::PageCaptured { page, total } => {
                self.bar.inc(1);
                self.bar.set_message(format!("Captured page {}/{}", page, total));
            }
            ExportEvent::Assembled { .. } => {
                self.bar.set_message("Writing PDF...");
            }
            ExportEvent::Emitted { .. } => {
                self.bar.finish_with_message("Done!");
            }
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Export {
            input,
            output,
            page,
            title,
            author,
            pages_dir,
        }) => cmd_export(&input, output.as_deref(), &page, title, author, pages_dir),
        Some(Commands::Plan {
            input,
            page,
            compact,
        }) => cmd_plan(&input, &page, compact),
        Some(Commands::Info { input, page }) => cmd_info(&input, &page),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            // Default behavior: export if input is provided
            if let Some(input) = cli.input {
                cmd_export(&input, cli.output.as_deref(), &cli.page, None, None, None)
            } else {
                println!("{}", "Usage: mdpress <FILE> [OUTPUT]".yellow());
                println!("       mdpress --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn check_input(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if !detect::is_markdown_path(input) {
        return Err(format!(
            "{} is not a Markdown file (expected .md or .markdown)",
            input.display()
        )
        .into());
    }
    if !input.is_file() {
        return Err(format!("{} does not exist", input.display()).into());
    }
    Ok(())
}

/// Output path: the given one, or the input renamed to `.pdf`.
fn output_for(input: &Path, output: Option<&Path>) -> PathBuf {
    output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| input.with_extension("pdf"))
}

fn title_for(input: &Path) -> String {
    input
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned()
}

fn cmd_export(
    input: &Path,
    output: Option<&Path>,
    page: &PageArgs,
    title: Option<String>,
    author: Option<String>,
    pages_dir: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    check_input(input)?;

    let output = output_for(input, output);
    let title = title.unwrap_or_else(|| title_for(input));

    log::debug!("exporting {} to {}", input.display(), output.display());

    let mut builder = page
        .builder()
        .with_title(title)
        .with_observer(Arc::new(ProgressObserver::new()?));
    if let Some(author) = author {
        builder = builder.with_author(author);
    }
    if let Some(dir) = &pages_dir {
        builder = builder.with_pages_dir(dir);
    }

    let doc = builder.convert_file(input, &output)?;

    let path = doc.path.clone().unwrap_or(output);
    println!(
        "\n{} {} ({} pages, {} KB)",
        "Saved to".green(),
        path.display(),
        doc.page_count,
        doc.len() / 1024
    );
    if let Some(dir) = pages_dir {
        println!("  {} page images in {}", "└─".dimmed(), dir.display());
    }

    Ok(())
}

fn cmd_plan(input: &Path, page: &PageArgs, compact: bool) -> Result<(), Box<dyn std::error::Error>> {
    check_input(input)?;

    let plan = page.builder().plan_file(input)?;
    let json = if compact {
        serde_json::to_string(&plan)?
    } else {
        serde_json::to_string_pretty(&plan)?
    };
    println!("{}", json);

    Ok(())
}

fn cmd_info(input: &Path, page: &PageArgs) -> Result<(), Box<dyn std::error::Error>> {
    check_input(input)?;

    let builder = page.builder();
    let geometry = builder.geometry()?;
    let (surface, exporter) = builder.pipeline_for(Some(input))?;
    surface.render_file(PREVIEW_ID, input)?;
    let tree = surface
        .tree(PREVIEW_ID)
        .ok_or_else(|| mdpress::Error::SourceNotFound(PREVIEW_ID.to_string()))?;
    let pages = exporter.paginate(&surface, PREVIEW_ID)?;

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {} bytes", "Size".bold(), fs::metadata(input)?.len());
    println!(
        "{}: {}x{} px (usable {}x{}), {}x capture",
        "Page".bold(),
        geometry.width(),
        geometry.height(),
        geometry.usable_width(),
        geometry.usable_height(),
        geometry.oversample()
    );

    println!();
    println!("{}", "Content Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "Blocks".bold(), tree.len());
    let mut kinds: Vec<_> = tree.kind_counts().into_iter().collect();
    kinds.sort_by_key(|(kind, _)| format!("{:?}", kind));
    for (kind, count) in kinds {
        println!("  {} {:?}: {}", "├─".dimmed(), kind, count);
    }
    println!("{}: {:.0} px", "Total height".bold(), tree.total_height());
    println!("{}: {}", "Pages".bold(), pages.len());

    let rescaled: Vec<u32> = pages
        .iter()
        .filter(|p| p.has_rescaled_block())
        .map(|p| p.number)
        .collect();
    if !rescaled.is_empty() {
        println!(
            "{}: {:?}",
            "Rescaled pages".bold().yellow(),
            rescaled
        );
    }

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "mdpress".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Markdown to paginated PDF export");
    println!();
    println!("Library: mdpress {}", mdpress::VERSION);
    println!("Repository: {}", "https://github.com/iyulab/mdpress".dimmed());
    println!("License: MIT");
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdpress::PageGeometry;
    use std::fs;
    use tempfile::TempDir;

    fn write_md(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn page_args(args: &[&str]) -> PageArgs {
        let mut argv = vec!["mdpress", "plan", "doc.md"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Some(Commands::Plan { page, .. }) => page,
            _ => panic!("expected plan command"),
        }
    }

    #[test]
    fn test_check_input() {
        let dir = TempDir::new().unwrap();
        let md = write_md(&dir, "notes.md", "# Notes");
        let txt = write_md(&dir, "notes.txt", "# Notes");

        assert!(check_input(&md).is_ok());
        assert!(check_input(&txt).is_err());
        assert!(check_input(&dir.path().join("missing.md")).is_err());
    }

    #[test]
    fn test_output_and_title_defaults() {
        let input = Path::new("docs/report.md");
        assert_eq!(output_for(input, None), PathBuf::from("docs/report.pdf"));
        assert_eq!(
            output_for(input, Some(Path::new("out/final.pdf"))),
            PathBuf::from("out/final.pdf")
        );
        assert_eq!(title_for(input), "report");
    }

    #[test]
    fn test_page_args_builder_geometry() {
        let page = page_args(&["--paper", "letter", "--width", "640", "--padding", "20"]);
        assert_eq!(page.paper, Paper::Letter);

        let geometry = page.builder().geometry().unwrap();
        let expected = PageGeometry::new(PaperSize::LETTER, 640.0, 20.0, page.oversample).unwrap();
        assert_eq!(geometry, expected);
    }

    #[test]
    fn test_default_command_reads_page_flags() {
        let cli = Cli::try_parse_from(["mdpress", "doc.md", "--paper", "a5", "--strip-html"])
            .unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.input, Some(PathBuf::from("doc.md")));
        assert_eq!(cli.page.paper, Paper::A5);
        assert!(cli.page.strip_html);
    }

    #[test]
    fn test_export_writes_pdf_next_to_input() {
        let dir = TempDir::new().unwrap();
        let input = write_md(&dir, "guide.md", "# Guide\n\nA short paragraph.");
        let page = page_args(&["--oversample", "1"]);

        cmd_export(&input, None, &page, None, None, None).unwrap();

        let pdf = fs::read(dir.path().join("guide.pdf")).unwrap();
        assert!(pdf.starts_with(b"%PDF"));
    }

    #[test]
    fn test_export_rejects_non_markdown() {
        let dir = TempDir::new().unwrap();
        let input = write_md(&dir, "guide.txt", "text");
        let page = page_args(&[]);

        assert!(cmd_export(&input, None, &page, None, None, None).is_err());
        assert!(!dir.path().join("guide.pdf").exists());
    }
}
