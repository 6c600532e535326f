use clap::{Parser, Subcommand};
use mycozine::imaging::RustBackend;
use mycozine::store::{FsStore, ZineStore};
use mycozine::types::{PAGE_COUNT, PageNumber, Style, Tone};
use mycozine::{config, outline, output, pipeline};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "mycozine")]
#[command(about = "Mini-zine outlines, pages and print-ready fold sheets")]
#[command(long_about = "\
Mini-zine outlines, pages and print-ready fold sheets

A zine is 8 pages printed on one US Letter sheet (3300x2550 at 300 DPI),
folded twice and cut once into a booklet. The store keeps one directory
per zine:

  zines/
  ├── config.toml                  # Store config (optional)
  └── 3f2c9a…/
      ├── zine.json                # Topic, style, tone, 8-page outline
      ├── p1.png … p8.png          # Current image of each page
      └── print.png                # Last assembled print sheet

Sheet layout (top row printed upside down):

  ┌───┬───┬───┬───┐
  │ 1 │ 8 │ 7 │ 6 │
  ├───┼───┼───┼───┤
  │ 2 │ 3 │ 4 │ 5 │
  └───┴───┴───┴───┘

Set RUST_LOG (e.g. RUST_LOG=mycozine=debug) for diagnostics on stderr.

Run 'mycozine gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Store directory
    #[arg(long, default_value = "zines", global = true)]
    store: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a zine from a saved LLM outline response
    ImportOutline {
        /// File holding the raw response (JSON, optionally fenced)
        file: PathBuf,
        #[arg(long)]
        topic: String,
        #[arg(long, value_enum, default_value_t = Style::Mycelial)]
        style: Style,
        #[arg(long, value_enum, default_value_t = Tone::Regenerative)]
        tone: Tone,
    },
    /// Store or replace a page image (any decodable format)
    AddPage {
        zine: String,
        page: PageNumber,
        image: PathBuf,
    },
    /// Print the image prompt for a page
    Prompt {
        zine: String,
        page: PageNumber,
        /// Extra direction appended to the prompt
        #[arg(long)]
        feedback: Option<String>,
    },
    /// Fit and binarize an inpainting mask to a page
    Mask {
        zine: String,
        page: PageNumber,
        mask: PathBuf,
        /// Where to write the prepared PNG mask
        #[arg(long)]
        out: PathBuf,
    },
    /// Store styled placeholders for pages without an image
    Placeholders { zine: String },
    /// Report each page's image and how it will fit the sheet
    Check { zine: String },
    /// Assemble and save the print sheet
    Layout { zine: String },
    /// List zines in the store
    List,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        // Needs no store, and must work while config.toml is broken
        Command::GenConfig => print!("{}", config::stock_config_toml()),
        command => run(command, &cli.store)?,
    }
    Ok(())
}

fn run(command: Command, store_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = config::load_config(store_dir)?;
    let store = FsStore::new(store_dir).with_layout_filename(config.layout.filename.clone());
    let backend = RustBackend::new();

    match command {
        Command::ImportOutline {
            file,
            topic,
            style,
            tone,
        } => {
            let topic = topic.trim();
            if topic.is_empty() {
                return Err("--topic must not be empty".into());
            }
            let response = std::fs::read_to_string(&file)?;
            let pages = outline::parse_outline(&response)?;
            std::fs::create_dir_all(store_dir)?;
            let zine = pipeline::zine_from_outline(&store, topic, style, tone, pages)?;
            output::print_outline(&zine);
        }
        Command::AddPage { zine, page, image } => {
            let bytes = std::fs::read(&image)?;
            let reference = pipeline::add_page_image(&store, &backend, &zine, page, &bytes)?;
            println!("Page {page} → {reference}");
        }
        Command::Prompt {
            zine,
            page,
            feedback,
        } => {
            let prompt = pipeline::page_prompt(
                &store,
                &zine,
                page,
                feedback.as_deref(),
                &config.generation,
            )?;
            println!("{prompt}");
        }
        Command::Mask {
            zine,
            page,
            mask,
            out,
        } => {
            let bytes = std::fs::read(&mask)?;
            let prepared = pipeline::page_mask(&store, &backend, &zine, page, &bytes)?;
            std::fs::write(&out, prepared)?;
            println!("Mask for page {page} → {}", out.display());
        }
        Command::Placeholders { zine } => {
            let filled = pipeline::fill_placeholders(&store, &backend, &zine)?;
            if filled.is_empty() {
                println!("All pages already have images");
            } else {
                let pages: Vec<String> = filled.iter().map(|p| p.to_string()).collect();
                println!("Placeholders stored for pages {}", pages.join(", "));
            }
        }
        Command::Check { zine } => {
            let (zine, checks) = pipeline::check_zine(&store, &backend, &zine)?;
            println!("==> Checking {} ({})", zine.id, zine.topic);
            output::print_check_report(&checks);
            let ready = checks.iter().filter(|c| c.is_ready()).count();
            if ready < PAGE_COUNT {
                return Err(format!("{} page(s) not ready for layout", PAGE_COUNT - ready).into());
            }
            println!("==> Ready for layout");
        }
        Command::Layout { zine } => {
            init_thread_pool(&config.processing);
            let (reference, layout) =
                pipeline::assemble_print_layout(&store, &backend, &zine, &config.layout.options())?;
            output::print_layout_result(&reference, &layout);
        }
        Command::List => {
            let zines = store.list_zines()?;
            output::print_zine_list(&zines);
        }
        Command::GenConfig => print!("{}", config::stock_config_toml()),
    }

    Ok(())
}

/// Diagnostics go to stderr so stdout stays clean for command output.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mycozine=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
