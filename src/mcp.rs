use anyhow::Result;
use rmcp::{
    ServerHandler, ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::commands::{self, Outcome};

// Request structs for tools

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PathRequest {
    #[schemars(description = "Path to a .pdf or .pptx file")]
    pub path: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfExtractRequest {
    #[schemars(description = "Path to the source PDF file")]
    pub path: String,
    #[schemars(description = "Page ranges, 1-based and inclusive (e.g., '1,2' or '1-3,5-7')")]
    pub pages: String,
    #[schemars(description = "Output file path (default: <name>_pages_<range>.pdf next to the input)")]
    #[serde(default)]
    pub output: Option<String>,
    #[schemars(description = "Keep pages in the order given, repeats included (default: false, ascending and deduplicated)")]
    #[serde(default)]
    pub ordered: bool,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfMergeRequest {
    #[schemars(description = "Path to the first PDF file; its pages come first")]
    pub first: String,
    #[schemars(description = "Path to the second PDF file")]
    pub second: String,
    #[schemars(description = "Output file path (default: <first>_merged.pdf)")]
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PptxExtractRequest {
    #[schemars(description = "Path to the source PPTX file")]
    pub path: String,
    #[schemars(description = "Slide ranges, 1-based and inclusive (e.g., '1,2' or '1-3,5-7')")]
    pub slides: String,
    #[schemars(description = "Output file path (default: <name>_slides_<range>.pptx next to the input)")]
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SplitterServer {
    tool_router: ToolRouter<Self>,
}

impl SplitterServer {
    pub fn new() -> Self {
        Self {
            tool_router: Self::tool_router(),
        }
    }
}

impl Default for SplitterServer {
    fn default() -> Self {
        Self::new()
    }
}

fn respond<T: Serialize>(result: anyhow::Result<T>) -> String {
    match result {
        Ok(value) => {
            serde_json::to_string_pretty(&value).unwrap_or_else(|e| format!("Error: {}", e))
        }
        Err(e) => {
            tracing::warn!("tool call failed: {:#}", e);
            format!("Error: {:#}", e)
        }
    }
}

#[tool_router]
impl SplitterServer {
    #[tool(description = "Extract specific pages from a PDF and save them to a new file")]
    fn pdf_extract(&self, Parameters(req): Parameters<PdfExtractRequest>) -> String {
        tracing::info!(path = %req.path, pages = %req.pages, "pdf_extract");
        let output = req.output.as_deref().map(Path::new);
        respond(
            commands::extract::execute(Path::new(&req.path), &req.pages, output, req.ordered)
                .map(OperationResult::from),
        )
    }

    #[tool(description = "Merge two PDFs: all pages of the first followed by all pages of the second")]
    fn pdf_merge(&self, Parameters(req): Parameters<PdfMergeRequest>) -> String {
        tracing::info!(first = %req.first, second = %req.second, "pdf_merge");
        let output = req.output.as_deref().map(Path::new);
        respond(
            commands::merge::execute(Path::new(&req.first), Path::new(&req.second), output)
                .map(OperationResult::from),
        )
    }

    #[tool(description = "Keep only the given slides of a PowerPoint deck and save the result to a new .pptx file. Slides stay in deck order.")]
    fn pptx_extract(&self, Parameters(req): Parameters<PptxExtractRequest>) -> String {
        tracing::info!(path = %req.path, slides = %req.slides, "pptx_extract");
        let output = req.output.as_deref().map(Path::new);
        respond(
            commands::slides::execute(Path::new(&req.path), &req.slides, output)
                .map(OperationResult::from),
        )
    }

    #[tool(description = "Get the type and page or slide count of a PDF or PPTX file")]
    fn document_info(&self, Parameters(PathRequest { path }): Parameters<PathRequest>) -> String {
        respond(
            commands::info::execute(Path::new(&path)).map(|info| DocumentInfoResult {
                kind: info.kind.name().to_string(),
                item_count: info.item_count,
                path,
            }),
        )
    }
}

// Result types for MCP tools

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct OperationResult {
    pub output_path: String,
    pub item_count: usize,
}

impl From<Outcome> for OperationResult {
    fn from(outcome: Outcome) -> Self {
        OperationResult {
            output_path: outcome.output_path.display().to_string(),
            item_count: outcome.item_count,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct DocumentInfoResult {
    pub path: String,
    pub kind: String,
    pub item_count: usize,
}

#[tool_handler]
impl ServerHandler for SplitterServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "PDF and PowerPoint subsetting tools. Use pdf_extract to copy page ranges of a \
                 PDF into a new file, pdf_merge to append one PDF to another, pptx_extract to \
                 keep a subset of slides, and document_info to get page or slide counts. Ranges \
                 are 1-based and inclusive, like '1-3,5'."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

pub async fn run_server() -> Result<()> {
    let server = SplitterServer::new();
    tracing::info!("serving MCP on stdio");

    // Serve using stdin/stdout as a tuple
    let service = server.serve((tokio::io::stdin(), tokio::io::stdout())).await?;

    service.waiting().await?;

    Ok(())
}
