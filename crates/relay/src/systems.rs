use async_trait::async_trait;
use serde_json::Value;

use crate::errors::{ToolError, ToolResult};
use crate::models::tool::{Tool, ToolCall};

pub mod weather;

pub use weather::WeatherSystem;

/// Core trait that defines a system whose tools a model can call
#[async_trait]
pub trait System: Send + Sync {
    /// Get the name of the system
    fn name(&self) -> &str;

    /// Get the system description
    fn description(&self) -> &str;

    /// Get system instructions
    fn instructions(&self) -> &str;

    /// Get available tools
    fn tools(&self) -> &[Tool];

    /// Call a tool with the given arguments
    async fn call(&self, tool_call: ToolCall) -> ToolResult<Value>;
}

/// The registry of systems available to a conversation.
///
/// Tool names are flat: the model sees each tool by its own name, and a call is
/// routed to the first registered system that declares it.
#[derive(Default)]
pub struct Toolbox {
    systems: Vec<Box<dyn System>>,
}

impl Toolbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a system to the toolbox
    pub fn add_system(&mut self, system: Box<dyn System>) {
        self.systems.push(system);
    }

    pub fn with_system(mut self, system: Box<dyn System>) -> Self {
        self.add_system(system);
        self
    }

    /// Get all tools from all systems
    pub fn tools(&self) -> Vec<Tool> {
        self.systems
            .iter()
            .flat_map(|system| system.tools().iter().cloned())
            .collect()
    }

    /// Describe the registered systems for the model, or `None` when there are none
    pub fn system_prompt(&self) -> Option<String> {
        if self.systems.is_empty() {
            return None;
        }

        let sections: Vec<String> = self
            .systems
            .iter()
            .map(|system| {
                let mut section = format!("## {}\n{}", system.name(), system.description());
                if !system.instructions().is_empty() {
                    section.push_str("\n\n");
                    section.push_str(system.instructions());
                }
                section
            })
            .collect();

        Some(format!(
            "You have access to tools from the following systems.\n\n{}",
            sections.join("\n\n")
        ))
    }

    fn system_for_tool(&self, name: &str) -> Option<&dyn System> {
        self.systems
            .iter()
            .find(|system| system.tools().iter().any(|tool| tool.name == name))
            .map(|system| &**system)
    }

    /// Dispatch a single tool call to the system that declares it
    pub async fn dispatch(&self, tool_call: ToolCall) -> ToolResult<Value> {
        let system = self
            .system_for_tool(&tool_call.name)
            .ok_or_else(|| ToolError::ToolNotFound(tool_call.name.clone()))?;

        tracing::debug!(system = system.name(), tool = %tool_call.name, "dispatching tool call");
        system.call(tool_call).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoSystem {
        tools: Vec<Tool>,
    }

    impl EchoSystem {
        fn new() -> Self {
            Self {
                tools: vec![Tool::new(
                    "echo",
                    "reply with the input",
                    json!({
                        "type": "object",
                        "properties": {"message": {"type": "string"}},
                        "required": ["message"]
                    }),
                )],
            }
        }
    }

    #[async_trait]
    impl System for EchoSystem {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "A simple system that echoes input back to the caller"
        }

        fn instructions(&self) -> &str {
            "Use the echo tool to get your message back"
        }

        fn tools(&self) -> &[Tool] {
            &self.tools
        }

        async fn call(&self, tool_call: ToolCall) -> ToolResult<Value> {
            match tool_call.name.as_str() {
                "echo" => Ok(tool_call.arguments),
                _ => Err(ToolError::ToolNotFound(tool_call.name)),
            }
        }
    }

    #[test]
    fn test_tools_are_listed_across_systems() {
        let toolbox = Toolbox::new()
            .with_system(Box::new(EchoSystem::new()))
            .with_system(Box::new(WeatherSystem::new()));

        let names: Vec<_> = toolbox.tools().into_iter().map(|tool| tool.name).collect();
        assert_eq!(names, vec!["echo", "get_current_weather"]);
    }

    #[test]
    fn test_system_prompt_describes_each_system() {
        let toolbox = Toolbox::new()
            .with_system(Box::new(EchoSystem::new()))
            .with_system(Box::new(WeatherSystem::new()));

        let prompt = toolbox.system_prompt().unwrap();
        assert!(prompt.contains(
            "## echo\nA simple system that echoes input back to the caller\n\n\
             Use the echo tool to get your message back"
        ));
        assert!(prompt.contains("## weather\nCurrent weather conditions for any location"));
        assert!(prompt.find("## echo").unwrap() < prompt.find("## weather").unwrap());
    }

    #[test]
    fn test_empty_toolbox_has_no_system_prompt() {
        assert_eq!(Toolbox::new().system_prompt(), None);
    }

    #[tokio::test]
    async fn test_dispatch_routes_by_tool_name() {
        let toolbox = Toolbox::new().with_system(Box::new(EchoSystem::new()));

        let result = toolbox
            .dispatch(ToolCall::new("echo", json!({"message": "hello"})))
            .await
            .unwrap();
        assert_eq!(result, json!({"message": "hello"}));
    }

    #[tokio::test]
    async fn test_dispatch_unregistered_tool() {
        let toolbox = Toolbox::new().with_system(Box::new(EchoSystem::new()));

        let error = toolbox
            .dispatch(ToolCall::new("launch_rocket", json!({})))
            .await
            .unwrap_err();
        assert_eq!(error, ToolError::ToolNotFound("launch_rocket".to_string()));
    }
}
