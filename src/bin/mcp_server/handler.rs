use async_trait::async_trait;
use rust_mcp_sdk::schema::{
    schema_utils::CallToolError, CallToolRequest, CallToolResult, ListToolsRequest,
    ListToolsResult, RpcError,
};
use rust_mcp_sdk::{mcp_server::ServerHandler, McpServer};
use std::sync::Arc;
use yt_subtitles::{Settings, SubtitleRetriever, YtDlp};

use crate::tools::SubtitleTools;

pub struct SubtitleServerHandler {
    retriever: Arc<SubtitleRetriever>,
    settings: Arc<Settings>,
}

impl SubtitleServerHandler {
    pub fn new(settings: Settings) -> Self {
        let retriever = SubtitleRetriever::new(YtDlp::new(&settings.downloader_binary))
            .with_cookie_source(settings.cookie_source.clone());
        Self {
            retriever: Arc::new(retriever),
            settings: Arc::new(settings),
        }
    }
}

#[async_trait]
impl ServerHandler for SubtitleServerHandler {
    async fn handle_list_tools_request(
        &self,
        _request: ListToolsRequest,
        _runtime: Arc<dyn McpServer>,
    ) -> std::result::Result<ListToolsResult, RpcError> {
        Ok(ListToolsResult {
            meta: None,
            next_cursor: None,
            tools: SubtitleTools::tools(),
        })
    }

    async fn handle_call_tool_request(
        &self,
        request: CallToolRequest,
        _runtime: Arc<dyn McpServer>,
    ) -> std::result::Result<CallToolResult, CallToolError> {
        let tool_params: SubtitleTools =
            SubtitleTools::try_from(request.params).map_err(CallToolError::new)?;

        match tool_params {
            SubtitleTools::GetTranscript(tool) => {
                tool.call_tool(&self.retriever, &self.settings).await
            }
        }
    }
}
