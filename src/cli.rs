use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "splitter")]
#[command(about = "Extract PDF pages, merge PDFs, and extract slides from PowerPoint decks")]
#[command(version)]
pub struct Cli {
    /// More log output on stderr (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract page ranges from a PDF into a new PDF
    #[command(alias = "pages")]
    Extract {
        /// PDF file to extract from
        path: PathBuf,

        /// Page ranges (e.g., "1,2" or "1-3,5-7")
        pages: String,

        /// Output file [default: <name>_pages_<range>.pdf next to the input]
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Keep pages in the order given, repeats included, instead of ascending
        #[arg(long)]
        ordered: bool,
    },

    /// Append all pages of a second PDF to a first one
    Merge {
        /// First PDF file
        first: PathBuf,

        /// Second PDF file
        second: PathBuf,

        /// Output file [default: <first>_merged.pdf]
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Keep only the given slides of a PowerPoint (.pptx) deck
    Slides {
        /// PPTX file to extract from
        path: PathBuf,

        /// Slide ranges (e.g., "1,2" or "1-3,5-7")
        slides: String,

        /// Output file [default: <name>_slides_<range>.pptx next to the input]
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the page or slide count of a PDF or PPTX file
    Info {
        /// File to inspect
        path: PathBuf,
    },

    /// Run as MCP server on stdin/stdout
    Mcp,
}
