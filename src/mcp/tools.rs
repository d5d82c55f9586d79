//! Tool registry for MCP tools.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::converter::Converter;
use crate::models::HandlersResponse;

/// An MCP tool that can be called by the client
#[derive(Clone)]
pub struct Tool {
    /// Tool name (e.g., "convert_url_to_bibtex")
    pub name: String,

    /// Human-readable description
    pub description: String,

    /// JSON Schema for input parameters
    pub input_schema: serde_json::Value,

    /// Handler function to execute the tool
    pub handler: Arc<dyn ToolHandler>,
}

impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("input_schema", &self.input_schema)
            .finish()
    }
}

/// Handler for executing a tool
#[async_trait::async_trait]
pub trait ToolHandler: Send + Sync + std::fmt::Debug {
    /// Execute the tool with the given arguments
    async fn execute(&self, args: Value) -> Result<Value, String>;
}

/// Registry for all MCP tools
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Tool>,
}

impl ToolRegistry {
    /// Create a tool registry whose tools share one converter
    pub fn from_converter(converter: &Converter) -> Self {
        let mut registry = Self {
            tools: HashMap::new(),
        };
        registry.register_converter_tools(converter);
        registry
    }

    fn register_converter_tools(&mut self, converter: &Converter) {
        let handler_ids: Vec<String> = converter
            .list_handlers()
            .into_iter()
            .map(|h| h.id)
            .collect();

        // 1. convert_url_to_bibtex
        self.register(Tool {
            name: "convert_url_to_bibtex".to_string(),
            description: format!(
                "Convert a paper, preprint or repository URL into a BibTeX entry. Supported handlers: {}",
                handler_ids.join(", ")
            ),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "url": {
                        "type": "string",
                        "description": "URL to convert (e.g., 'https://arxiv.org/abs/2103.15348', 'https://doi.org/10.1038/nature12373')"
                    }
                },
                "required": ["url"]
            }),
            handler: Arc::new(ConvertUrlHandler {
                converter: converter.clone(),
            }),
        });

        // 2. list_handlers
        self.register(Tool {
            name: "list_handlers".to_string(),
            description: "List the registered URL handlers in dispatch order".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {}
            }),
            handler: Arc::new(ListHandlersHandler {
                converter: converter.clone(),
            }),
        });

        // 3. health
        self.register(Tool {
            name: "health".to_string(),
            description: "Report converter status and the number of registered handlers"
                .to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {}
            }),
            handler: Arc::new(HealthHandler {
                converter: converter.clone(),
            }),
        });
    }

    /// Register a tool
    pub fn register(&mut self, tool: Tool) {
        self.tools.insert(tool.name.clone(), tool);
    }

    /// Get all tools, sorted by name
    pub fn all(&self) -> Vec<&Tool> {
        let mut tools: Vec<&Tool> = self.tools.values().collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        tools
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.tools.get(name)
    }

    /// Execute a tool by name
    pub async fn execute(&self, name: &str, args: Value) -> Result<Value, String> {
        let tool = self
            .get(name)
            .ok_or_else(|| format!("Tool '{}' not found", name))?;

        tool.handler.execute(args).await
    }
}

// ========== TOOL HANDLERS ==========

/// Converts one URL; conversion failures are reported in the response body
#[derive(Debug)]
pub struct ConvertUrlHandler {
    pub converter: Converter,
}

#[async_trait::async_trait]
impl ToolHandler for ConvertUrlHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let url = args
            .get("url")
            .and_then(|v| v.as_str())
            .ok_or("Missing 'url' parameter")?;

        let response = self.converter.convert_response(url).await;
        serde_json::to_value(response).map_err(|e| e.to_string())
    }
}

/// Lists registered handlers
#[derive(Debug)]
pub struct ListHandlersHandler {
    pub converter: Converter,
}

#[async_trait::async_trait]
impl ToolHandler for ListHandlersHandler {
    async fn execute(&self, _args: Value) -> Result<Value, String> {
        let response = HandlersResponse::from(self.converter.list_handlers());
        serde_json::to_value(response).map_err(|e| e.to_string())
    }
}

/// Reports converter health
#[derive(Debug)]
pub struct HealthHandler {
    pub converter: Converter,
}

#[async_trait::async_trait]
impl ToolHandler for HealthHandler {
    async fn execute(&self, _args: Value) -> Result<Value, String> {
        serde_json::to_value(self.converter.health()).map_err(|e| e.to_string())
    }
}
