mod handler;
mod tools;

use handler::SubtitleServerHandler;
use rust_mcp_sdk::schema::{
    Implementation, InitializeResult, ServerCapabilities, ServerCapabilitiesTools,
    LATEST_PROTOCOL_VERSION,
};
use rust_mcp_sdk::{
    error::SdkResult,
    mcp_server::{server_runtime, ServerRuntime},
    McpServer, StdioTransport, TransportOptions,
};
use std::sync::Arc;
use tracing_subscriber::{filter::LevelFilter, EnvFilter};
use yt_subtitles::Settings;

#[tokio::main]
async fn main() -> SdkResult<()> {
    // stdout carries JSON-RPC; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings::from_env();
    tracing::info!(
        downloader = %settings.downloader_binary,
        timeout_ms = settings.timeout_ms,
        use_cookies = settings.use_cookies,
        languages = %settings.default_languages.join(","),
        "starting subtitle MCP server"
    );

    let server_details = InitializeResult {
        server_info: Implementation {
            name: "yt-subtitles".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            title: Some("YouTube Subtitles".to_string()),
        },
        capabilities: ServerCapabilities {
            tools: Some(ServerCapabilitiesTools { list_changed: None }),
            ..Default::default()
        },
        meta: None,
        instructions: Some(
            "Use the `get_transcript` tool with a YouTube `videoId` (11 characters) and an \
             optional two-letter `lang` to get the video's caption text as a single block."
                .to_string(),
        ),
        protocol_version: LATEST_PROTOCOL_VERSION.to_string(),
    };

    let transport = StdioTransport::new(TransportOptions::default())?;
    let handler = SubtitleServerHandler::new(settings);

    let server: Arc<ServerRuntime> =
        server_runtime::create_server(server_details, transport, handler);

    if let Err(start_error) = server.start().await {
        tracing::error!(
            "{}",
            start_error
                .rpc_error_message()
                .unwrap_or(&start_error.to_string())
        );
    }

    Ok(())
}
