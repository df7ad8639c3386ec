use super::protocol::Protocol;
use super::types::*;
use crate::config::SearchConfig;
use crate::handlers::ToolHandlers;
use crate::search::SearchEngine;
use anyhow::Result;
use serde_json::json;
use std::sync::Arc;

const PROTOCOL_VERSION: &str = "2024-11-05";
const SERVER_NAME: &str = "code-extractor-mcp";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Main MCP Server
pub struct McpServer {
    protocol: Protocol,
    tool_handlers: ToolHandlers,
}

impl McpServer {
    pub fn new(config: SearchConfig) -> Result<Self> {
        tracing::debug!("Search configuration: {:?}", config);
        let engine = Arc::new(SearchEngine::new(config));

        Ok(Self {
            protocol: Protocol::new(),
            tool_handlers: ToolHandlers::new(engine),
        })
    }

    pub async fn start(mut self) -> Result<()> {
        tracing::info!("MCP server started, waiting for requests...");

        // Main request loop
        loop {
            match self.protocol.read_request().await {
                Ok(Some(request)) => {
                    let Some(response) = self.handle_request(request).await else {
                        continue;
                    };
                    if let Err(e) = self.protocol.send_response(response).await {
                        tracing::error!("Failed to send response: {}", e);
                    }
                }
                Ok(None) => {
                    tracing::info!("Client disconnected");
                    break;
                }
                Err(e) => {
                    tracing::error!("Failed to read request: {}", e);
                    let error_response = self.protocol.error_response(
                        json!(null),
                        JsonRpcError::parse_error(),
                    );
                    let _ = self.protocol.send_response(error_response).await;
                }
            }
        }

        Ok(())
    }

    /// Notifications get no response
    async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        tracing::debug!("Received request: method={}, id={:?}", request.method, request.id);

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(request.id, request.params),
            "ping" => self.protocol.success_response(request.id, json!({})),
            "tools/list" => self.handle_tools_list(request.id),
            "tools/call" => self.handle_tools_call(request.id, request.params).await,
            method if method.starts_with("notifications/") => return None,
            _ => self
                .protocol
                .error_response(request.id, JsonRpcError::method_not_found()),
        };
        Some(response)
    }

    fn handle_initialize(&self, id: serde_json::Value, params: serde_json::Value) -> JsonRpcResponse {
        match serde_json::from_value::<InitializeRequest>(params) {
            Ok(req) => {
                tracing::info!("Client connected: {} v{}", req.clientInfo.name, req.clientInfo.version);
            }
            Err(e) => {
                tracing::warn!("Failed to parse initialize request: {}", e);
                return self.protocol.error_response(
                    id,
                    JsonRpcError::internal_error(format!("Invalid initialize params: {}", e)),
                );
            }
        }

        let response = InitializeResponse {
            protocolVersion: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: ToolsCapability {
                    listChanged: Some(false),
                },
            },
            serverInfo: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: SERVER_VERSION.to_string(),
            },
        };

        self.protocol.success_response(id, json!(response))
    }

    fn handle_tools_list(&self, id: serde_json::Value) -> JsonRpcResponse {
        let response = ListToolsResponse { tools: tools() };
        self.protocol.success_response(id, json!(response))
    }

    async fn handle_tools_call(&self, id: serde_json::Value, params: serde_json::Value) -> JsonRpcResponse {
        let call_request: CallToolRequest = match serde_json::from_value(params) {
            Ok(req) => req,
            Err(e) => {
                return self.protocol.error_response(
                    id,
                    JsonRpcError::invalid_params(format!("Invalid params: {}", e)),
                );
            }
        };

        let handlers = &self.tool_handlers;
        let args = &call_request.arguments;
        let result = match call_request.name.as_str() {
            "get_symbols" => handlers.handle_get_symbols(args).await,
            "get_function" => handlers.handle_get_function(args).await,
            "get_class" => handlers.handle_get_class(args).await,
            "get_signature" => handlers.handle_get_signature(args).await,
            "get_lines" => handlers.handle_get_lines(args).await,
            "search_code" => handlers.handle_search_code(args).await,
            _ => {
                return self.protocol.error_response(
                    id,
                    JsonRpcError::invalid_params(format!("Unknown tool: {}", call_request.name)),
                );
            }
        };

        let response = match result {
            Ok(content) => CallToolResponse {
                content,
                isError: None,
            },
            Err(e) => {
                tracing::debug!("Tool {} failed: {:#}", call_request.name, e);
                CallToolResponse {
                    content: vec![Content::Text {
                        text: format!("Error: {:#}", e),
                    }],
                    isError: Some(true),
                }
            }
        };
        self.protocol.success_response(id, json!(response))
    }
}

fn file_tool(name: &str, description: &str, extra: Option<(&str, &str)>) -> Tool {
    let mut properties = json!({
        "file_path": {
            "type": "string",
            "description": "Path to the source file"
        }
    });
    let mut required = vec!["file_path".to_string()];
    if let Some((key, text)) = extra {
        properties[key] = json!({ "type": "string", "description": text });
        required.push(key.to_string());
    }
    Tool {
        name: name.to_string(),
        description: description.to_string(),
        inputSchema: json!({
            "type": "object",
            "properties": properties,
            "required": required
        }),
    }
}

/// Tool catalogue advertised through tools/list
pub fn tools() -> Vec<Tool> {
    vec![
        file_tool(
            "get_symbols",
            "List every function, method, class, variable and type declared in a file, with line ranges and parents.",
            None,
        ),
        file_tool(
            "get_function",
            "Get the full source of a function or method, its lines, parameters, return type and docstring.",
            Some(("function_name", "Exact name of the function or method")),
        ),
        file_tool(
            "get_class",
            "Get the full source of a class, struct or interface together with its methods.",
            Some(("class_name", "Exact name of the class")),
        ),
        file_tool(
            "get_signature",
            "Get only the declaration line of a function or method, without its body.",
            Some(("function_name", "Exact name of the function or method")),
        ),
        Tool {
            name: "get_lines".to_string(),
            description: "Get a 1-based inclusive range of lines from a file. The end is clipped to the file length.".to_string(),
            inputSchema: json!({
                "type": "object",
                "properties": {
                    "file_path": { "type": "string", "description": "Path to the file" },
                    "start_line": { "type": "number", "description": "First line, starting at 1" },
                    "end_line": { "type": "number", "description": "Last line, inclusive" }
                },
                "required": ["file_path", "start_line", "end_line"]
            }),
        },
        Tool {
            name: "search_code".to_string(),
            description: r#"Structural search over a file or a directory using syntax trees.

- `function-calls`: call sites whose text contains `target` (e.g. "requests.get").
- `symbol-definitions`: declarations whose name contains `target`.

Directory scopes are walked in path order and the result cap applies to the whole scope."#.to_string(),
            inputSchema: json!({
                "type": "object",
                "properties": {
                    "search_type": {
                        "type": "string",
                        "enum": ["function-calls", "symbol-definitions"]
                    },
                    "target": {
                        "type": "string",
                        "description": "Substring to look for"
                    },
                    "scope": {
                        "type": "string",
                        "description": "File or directory to search"
                    },
                    "language": {
                        "type": "string",
                        "description": "Override language detection (python, javascript, typescript, tsx, rust, go, java, cpp, c_sharp)"
                    },
                    "git_revision": {
                        "type": "string",
                        "description": "Search file contents at this git revision"
                    },
                    "file_patterns": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Include globs for directory scopes"
                    },
                    "exclude_patterns": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Exclude globs for directory scopes"
                    },
                    "max_results": {
                        "type": "number",
                        "description": "Maximum number of results across the whole scope"
                    },
                    "context_lines": {
                        "type": "number",
                        "description": "Lines of context before and after each match"
                    },
                    "include_context": {
                        "type": "boolean",
                        "default": true
                    }
                },
                "required": ["search_type", "target", "scope"]
            }),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server() -> McpServer {
        McpServer::new(SearchConfig::default()).unwrap()
    }

    fn request(method: &str, params: serde_json::Value) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: json!(1),
            method: method.to_string(),
            params,
        }
    }

    #[test]
    fn test_tool_catalogue() {
        let names: Vec<String> = tools().into_iter().map(|t| t.name).collect();
        assert_eq!(
            names,
            vec!["get_symbols", "get_function", "get_class", "get_signature", "get_lines", "search_code"]
        );
        let function = &tools()[1];
        assert_eq!(
            function.inputSchema["required"],
            json!(["file_path", "function_name"])
        );
    }

    #[tokio::test]
    async fn test_notifications_are_silent() {
        let server = server();
        assert!(server
            .handle_request(request("notifications/initialized", json!({})))
            .await
            .is_none());
        let unknown = server.handle_request(request("resources/list", json!({}))).await.unwrap();
        assert_eq!(unknown.error.unwrap().code, -32601);
    }

    #[tokio::test]
    async fn test_tool_errors_are_content() {
        let server = server();
        let response = server
            .handle_request(request(
                "tools/call",
                json!({ "name": "get_lines", "arguments": { "file_path": "/no/such/file.py", "start_line": 1, "end_line": 2 } }),
            ))
            .await
            .unwrap();
        let result = response.result.unwrap();
        assert_eq!(result["isError"], json!(true));
        assert!(result["content"][0]["text"].as_str().unwrap().starts_with("Error:"));
    }
}
