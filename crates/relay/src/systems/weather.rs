use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::System;
use crate::errors::{ToolError, ToolResult};
use crate::models::tool::{Tool, ToolCall};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    Celsius,
    #[default]
    Fahrenheit,
}

#[derive(Debug, Deserialize)]
struct WeatherParams {
    location: String,
    #[serde(default)]
    unit: TemperatureUnit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    pub temperature: i32,
    pub unit: TemperatureUnit,
    pub location: String,
}

/// Looks up the current weather. Readings are simulated.
pub struct WeatherSystem {
    tools: Vec<Tool>,
}

impl Default for WeatherSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl WeatherSystem {
    pub fn new() -> Self {
        let weather_tool = Tool::new(
            "get_current_weather",
            "Get the current weather in a given location",
            json!({
                "type": "object",
                "required": ["location", "unit"],
                "properties": {
                    "location": {
                        "type": "string",
                        "description": "The city and state, e.g. San Francisco, CA"
                    },
                    "unit": {
                        "type": "string",
                        "enum": ["celsius", "fahrenheit"],
                        "description": "The temperature unit, either celsius or fahrenheit"
                    }
                }
            }),
        );

        Self {
            tools: vec![weather_tool],
        }
    }

    fn current_weather(&self, arguments: Value) -> ToolResult<Value> {
        let params: WeatherParams = serde_json::from_value(arguments)
            .map_err(|e| ToolError::InvalidParameters(e.to_string()))?;

        let mut rng = rand::thread_rng();
        let temperature = match params.unit {
            TemperatureUnit::Celsius => rng.gen_range(-34..=43),
            TemperatureUnit::Fahrenheit => rng.gen_range(-30..=110),
        };

        let reading = WeatherReading {
            temperature,
            unit: params.unit,
            location: params.location,
        };
        serde_json::to_value(reading).map_err(|e| ToolError::Internal(e.to_string()))
    }
}

#[async_trait]
impl System for WeatherSystem {
    fn name(&self) -> &str {
        "weather"
    }

    fn description(&self) -> &str {
        "Current weather conditions for any location"
    }

    fn instructions(&self) -> &str {
        "Use get_current_weather when the user asks about the weather somewhere"
    }

    fn tools(&self) -> &[Tool] {
        &self.tools
    }

    async fn call(&self, tool_call: ToolCall) -> ToolResult<Value> {
        match tool_call.name.as_str() {
            "get_current_weather" => self.current_weather(tool_call.arguments),
            _ => Err(ToolError::ToolNotFound(tool_call.name)),
        }
    }
}
