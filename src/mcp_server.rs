use crate::client::{RagClient, ingest_response};
use crate::config::Config;
use crate::types::*;

use anyhow::{Context, Result};
use rmcp::{
    ErrorData as McpError, Peer, RoleServer, ServerHandler, ServiceExt,
    handler::server::{
        router::prompt::PromptRouter,
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::*,
    prompt, prompt_handler, prompt_router,
    service::RequestContext,
    tool, tool_router,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct RagMcpServer {
    client: Arc<RagClient>,
    tool_router: ToolRouter<Self>,
    prompt_router: PromptRouter<Self>,
}

impl RagMcpServer {
    /// Create a new RAG MCP server from configuration
    pub async fn new(config: Config) -> Result<Self> {
        let client = RagClient::with_config(config).await?;
        Self::with_client(Arc::new(client))
    }

    /// Create a new RAG MCP server with an existing client
    pub fn with_client(client: Arc<RagClient>) -> Result<Self> {
        Ok(Self {
            client,
            tool_router: Self::tool_router(),
            prompt_router: Self::prompt_router(),
        })
    }

    /// Get the underlying client
    pub fn client(&self) -> &RagClient {
        &self.client
    }

    fn has_tool(&self, name: &str) -> bool {
        self.tool_router
            .list_all()
            .iter()
            .any(|tool| tool.name == name)
    }

    async fn run_query(&self, req: QueryRequest) -> Result<String, String> {
        req.validate().map_err(|e| format!("Error: {}", e))?;

        let response = self.client.query(req).await;
        if let Some(error) = response.error {
            return Err(format!("Error: {}", error));
        }
        Ok(format_query_text(&response.chunks))
    }

    async fn run_ingest(
        &self,
        req: IngestRequest,
        peer: Option<Peer<RoleServer>>,
        progress_token: Option<ProgressToken>,
    ) -> Result<String, String> {
        let result = crate::client::indexing::do_ingest(
            &self.client,
            req.force_rebuild,
            CancellationToken::new(),
            peer,
            progress_token,
        )
        .await;

        let response = ingest_response(result);
        match (response.ok, response.message, response.error) {
            (true, Some(message), _) => Ok(message),
            (true, None, _) => Ok("Indexing completed".to_string()),
            (false, _, error) => Err(format!(
                "Error: {}",
                error.unwrap_or_else(|| "Unknown error".to_string())
            )),
        }
    }

    async fn run_list(&self) -> Result<String, String> {
        let response = self.client.list_documents().await;
        if let Some(error) = response.error {
            return Err(format!("Error: {}", error));
        }
        Ok(format_list_text(&response))
    }
}

/// Tool text for a query result, numbered from 1
pub fn format_query_text(chunks: &[String]) -> String {
    if chunks.is_empty() {
        return "No relevant chunks found.".to_string();
    }

    let mut text = format!("Found {} relevant chunks:\n\n", chunks.len());
    for (i, chunk) in chunks.iter().enumerate() {
        text.push_str(&format!("--- Chunk {} ---\n{}\n\n", i + 1, chunk));
    }
    text
}

/// Tool text for a listing: total count, then chunk counts per source file
pub fn format_list_text(response: &ListResponse) -> String {
    let mut text = format!(
        "Total indexed documents: {}\n\nDocuments by source:\n",
        response.count
    );
    for (source, count) in response.chunks_by_source() {
        text.push_str(&format!("  {}: {} chunks\n", source, count));
    }
    text
}

pub fn unknown_tool_text(name: &str) -> String {
    format!("Unknown tool: {}", name)
}

#[tool_router(router = tool_router)]
impl RagMcpServer {
    #[tool(
        description = "Query the RAG system to retrieve relevant code and documentation chunks from the project. Returns top-k most relevant chunks based on semantic similarity."
    )]
    async fn rag_query(
        &self,
        Parameters(req): Parameters<QueryRequest>,
    ) -> Result<String, String> {
        self.run_query(req).await
    }

    #[tool(
        description = "Index or re-index the project files into the RAG system. Use force_rebuild to clear existing index and rebuild from scratch."
    )]
    async fn rag_ingest(
        &self,
        meta: Meta,
        peer: Peer<RoleServer>,
        Parameters(req): Parameters<IngestRequest>,
    ) -> Result<String, String> {
        let progress_token = meta.get_progress_token();
        self.run_ingest(req, Some(peer), progress_token).await
    }

    #[tool(
        description = "List all indexed documents in the RAG system with their metadata. Useful for understanding what content is currently indexed."
    )]
    async fn rag_list(
        &self,
        Parameters(_req): Parameters<ListRequest>,
    ) -> Result<String, String> {
        self.run_list().await
    }
}

// Prompts for slash commands
#[prompt_router]
impl RagMcpServer {
    #[prompt(
        name = "rag-context",
        description = "Wrap the most relevant project chunks around a request (arguments: request, top_k, type)"
    )]
    async fn rag_context_prompt(
        &self,
        Parameters(args): Parameters<serde_json::Value>,
    ) -> Result<GetPromptResult, McpError> {
        let request = args.get("request").and_then(|v| v.as_str()).unwrap_or("");
        let top_k = args
            .get("top_k")
            .and_then(|v| v.as_u64())
            .map(|k| k as usize);
        let type_filter = match args.get("type").and_then(|v| v.as_str()) {
            Some(t) => Some(
                t.parse::<DocType>()
                    .map_err(|e| McpError::invalid_params(e.to_string(), None))?,
            ),
            None => None,
        };

        let prompt = self
            .client
            .build_prompt(request, top_k, type_filter)
            .await
            .map_err(|e| {
                if e.is_user_error() {
                    McpError::invalid_params(e.to_user_string(), None)
                } else {
                    McpError::internal_error(e.to_user_string(), None)
                }
            })?;

        Ok(GetPromptResult {
            description: Some(format!("Project context for: {}", request)),
            messages: vec![PromptMessage::new_text(PromptMessageRole::User, prompt)],
        })
    }

    #[prompt(
        name = "ingest",
        description = "Index the project directories (incremental unless a rebuild is requested)"
    )]
    async fn ingest_prompt(
        &self,
        Parameters(args): Parameters<serde_json::Value>,
    ) -> Result<Vec<PromptMessage>, McpError> {
        let force = args
            .get("force_rebuild")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        let text = if force {
            "Please clear the RAG index and rebuild it from scratch using rag_ingest with force_rebuild set."
        } else {
            "Please update the RAG index using rag_ingest. Only changed files will be re-indexed."
        };
        Ok(vec![PromptMessage::new_text(PromptMessageRole::User, text)])
    }
}

#[prompt_handler]
impl ServerHandler for RagMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::default(),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_prompts()
                .build(),
            server_info: Implementation {
                name: "monorepo-rag".into(),
                title: Some("Monorepo RAG - Project Context Retrieval".into()),
                version: env!("CARGO_PKG_VERSION").into(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "RAG index over the project's design docs, schemas and source. \
                Use rag_ingest to index changed files, rag_query to retrieve context \
                (optionally filtered by type), and rag_list to see what is indexed."
                    .into(),
            ),
        }
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        if !self.has_tool(&request.name) {
            tracing::warn!("Unknown tool requested: {}", request.name);
            return Ok(CallToolResult::success(vec![Content::text(
                unknown_tool_text(&request.name),
            )]));
        }

        let tcc = ToolCallContext::new(self, request, context);
        self.tool_router.call(tcc).await
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult::with_all_items(self.tool_router.list_all()))
    }
}

impl RagMcpServer {
    pub async fn serve_stdio(config: Config) -> Result<()> {
        tracing::info!("Starting RAG MCP server");

        let server = Self::new(config)
            .await
            .context("Failed to create MCP server")?;
        let client = server.client.clone();

        let transport = rmcp::transport::io::stdio();

        server.serve(transport).await?.waiting().await?;

        client
            .flush()
            .await
            .context("Failed to flush index state on shutdown")?;
        Ok(())
    }
}
