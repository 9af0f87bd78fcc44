/// MCP Tool handlers for codescope.
///
/// Implements the measure → outline → extract workflow as 4 tools:
/// 1. measure_file  – file-level size and comment metrics
/// 2. outline_file  – structural outline with exact line positions
/// 3. read_lines    – byte-exact extraction of a line range
/// 4. project_info  – resolved boundary root and registered languages
use crate::language::{ConstructKind, LanguageId};
use crate::mcp::server::McpContext;
use rmcp::handler::server::ServerHandler;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{ErrorData as McpError, handler::server::tool::ToolRouter, model::*, tool, tool_router};
use schemars::JsonSchema;
use serde::Deserialize;
use std::path::Path;

// ── Parameter structs ────────────────────────────────────────────────

#[derive(Deserialize, JsonSchema)]
struct MeasureParams {
    /// Path to the file, relative to the project root
    filepath: String,
    /// Language override (e.g. 'java', 'python'); detected when omitted
    language: Option<String>,
}

#[derive(Deserialize, JsonSchema)]
struct OutlineParams {
    /// Path to the file, relative to the project root
    filepath: String,
    /// Language override (e.g. 'java', 'python'); detected when omitted
    language: Option<String>,
    /// Construct kinds to extract (comma-separated, e.g. 'class,method');
    /// all supported kinds when omitted
    constructs: Option<String>,
}

#[derive(Deserialize, JsonSchema)]
struct ReadLinesParams {
    /// Path to the file, relative to the project root
    filepath: String,
    /// First line to return (1-based, inclusive)
    start_line: usize,
    /// Last line to return (1-based, inclusive)
    end_line: usize,
}

// ── Response helpers ─────────────────────────────────────────────────

fn json_result(value: serde_json::Value) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::success(vec![Content::text(
        serde_json::to_string_pretty(&value).unwrap_or_default(),
    )]))
}

fn error_result(msg: &str) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::error(vec![Content::text(msg.to_string())]))
}

fn parse_language(raw: Option<&str>) -> Result<Option<LanguageId>, String> {
    raw.map(str::parse).transpose()
}

fn parse_constructs(raw: Option<&str>) -> Result<Option<Vec<ConstructKind>>, String> {
    let Some(raw) = raw else { return Ok(None) };
    let kinds = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect::<Result<Vec<ConstructKind>, String>>()?;
    Ok(if kinds.is_empty() { None } else { Some(kinds) })
}

// ── Tool implementations ─────────────────────────────────────────────

#[derive(Clone)]
pub struct AppTools {
    pub ctx: McpContext,
    pub tool_router: ToolRouter<Self>,
}

impl ServerHandler for AppTools {}

#[tool_router]
impl AppTools {
    pub fn new(ctx: McpContext) -> Self {
        Self {
            ctx,
            tool_router: Self::tool_router(),
        }
    }

    // ── Tool 1: measure_file ────────────────────────────────────────

    #[tool(
        description = "Measure a source file before reading it: total/non-empty/comment line counts and byte size. Works even when the language is unsupported. The first step for any file too large to read whole."
    )]
    async fn measure_file(
        &self,
        params: Parameters<MeasureParams>,
    ) -> Result<CallToolResult, McpError> {
        let p = params.0;
        if p.filepath.is_empty() {
            return error_result("filepath is required");
        }
        let hint = match parse_language(p.language.as_deref()) {
            Ok(h) => h,
            Err(e) => return error_result(&e),
        };

        match self.ctx.engine.measure(Path::new(&p.filepath), hint) {
            Ok(metrics) => json_result(serde_json::json!({
                "filepath": p.filepath,
                "metrics": metrics,
            })),
            Err(e) => error_result(&e.to_string()),
        }
    }

    // ── Tool 2: outline_file ────────────────────────────────────────

    #[tool(
        description = "Outline the declarations of a source file (classes, methods, functions, imports, ...) with exact start/end lines and nesting. Use the line positions with read_lines to pull out just the parts you need. Languages: Java, Python, JavaScript, TypeScript, HTML, CSS, Markdown, Rust, Go."
    )]
    async fn outline_file(
        &self,
        params: Parameters<OutlineParams>,
    ) -> Result<CallToolResult, McpError> {
        let p = params.0;
        if p.filepath.is_empty() {
            return error_result("filepath is required");
        }
        let hint = match parse_language(p.language.as_deref()) {
            Ok(h) => h,
            Err(e) => return error_result(&e),
        };
        let constructs = match parse_constructs(p.constructs.as_deref()) {
            Ok(c) => c,
            Err(e) => return error_result(&e),
        };

        match self.ctx.engine.analyze(
            Path::new(&p.filepath),
            hint,
            constructs.as_deref(),
        ) {
            Ok(result) => json_result(serde_json::json!({
                "filepath": p.filepath,
                "language": result.language,
                "elements": result.elements,
                "diagnostics": result.diagnostics,
                "count": result.elements.len(),
            })),
            Err(e) => error_result(&e.to_string()),
        }
    }

    // ── Tool 3: read_lines ──────────────────────────────────────────

    #[tool(
        description = "Read an exact line range from a file (1-based, inclusive). Returns the verbatim content plus absolute line and byte positions for citation. Does not require the language to be supported."
    )]
    async fn read_lines(
        &self,
        params: Parameters<ReadLinesParams>,
    ) -> Result<CallToolResult, McpError> {
        let p = params.0;
        if p.filepath.is_empty() {
            return error_result("filepath is required");
        }

        match self
            .ctx
            .engine
            .extract(Path::new(&p.filepath), p.start_line, p.end_line)
        {
            Ok(slice) => json_result(serde_json::json!({
                "filepath": p.filepath,
                "content": slice.content,
                "position": slice.position,
            })),
            Err(e) => error_result(&e.to_string()),
        }
    }

    // ── Tool 4: project_info ────────────────────────────────────────

    #[tool(
        description = "Report the resolved project root (all file paths are validated against it) and the registered languages with their extensions and construct kinds."
    )]
    async fn project_info(&self) -> Result<CallToolResult, McpError> {
        let engine = &self.ctx.engine;
        let languages: Vec<serde_json::Value> = engine
            .registry()
            .plugins()
            .iter()
            .map(|p| {
                serde_json::json!({
                    "language": p.id,
                    "extensions": p.extensions,
                    "constructs": p.supported_constructs(),
                })
            })
            .collect();

        json_result(serde_json::json!({
            "root": engine.boundary().root().display().to_string(),
            "languages": languages,
        }))
    }
}
