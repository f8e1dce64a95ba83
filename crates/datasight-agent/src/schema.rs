//! The `generate_summary` tool: its JSON schema and the parsed output

use datasight_ai::Tool;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Name of the structured-output tool
pub const TOOL_NAME: &str = "generate_summary";

/// Bumped whenever the tool schema changes shape
pub const TOOL_SCHEMA_VERSION: u32 = 1;

const TOOL_DESCRIPTION: &str = "You are an experienced business intelligence analyst. \
Generate a structured summary of dataset analysis with visualization recommendation. \
Provide a natural language summary of key findings and insights, plus two recommended charts the user can create. \
Provide a recommendation on the next step in the analysis for the user. \
Focus on actionable insights and clear visualizations. \
Return the matplotlib code to generate the charts. \
Return the code as a string in a code block.";

const CODE_DESCRIPTION: &str = "Complete executable matplotlib code that creates both charts in a figure with two subplots. \
The code should create a figure object named 'fig' and return it at the end. \
Assumes df is already loaded. Example: fig, axes = plt.subplots(1, 2, figsize=(12, 5))";

/// Which request the tool is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolVariant {
    /// Initial analysis; `next_steps` is required
    Summary,
    /// Follow-up question
    FollowUp,
}

fn chart_properties() -> Value {
    json!({
        "type": {
            "type": "string",
            "enum": ChartType::ALL.iter().map(|t| t.as_str()).collect::<Vec<_>>(),
            "description": "Chart type (histogram, scatter, box, bar)"
        },
        "x": { "type": "string", "description": "X-axis column name" },
        "y": {
            "type": ["string", "null"],
            "description": "Y-axis column name (null for histograms)"
        }
    })
}

/// JSON schema of the tool input for a variant
pub fn input_schema(variant: ToolVariant) -> Value {
    let mut properties = json!({
        "text": {
            "type": "string",
            "description": "Natural language summary of key findings and insights"
        },
        "chart_1": {
            "type": "object",
            "description": "First recommended chart",
            "properties": chart_properties(),
            "required": ["type", "x"]
        },
        "chart_2": {
            "type": ["object", "null"],
            "description": "Second recommended chart",
            "properties": chart_properties(),
            "required": ["type", "x"]
        },
        "matplotlib_code": {
            "type": "string",
            "description": CODE_DESCRIPTION
        }
    });
    let mut required = vec!["text", "chart_1", "matplotlib_code"];

    if variant == ToolVariant::Summary {
        properties["next_steps"] = json!({
            "type": "string",
            "description": "Recommendation on the next step in the analysis"
        });
        required.insert(1, "next_steps");
    }

    json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

/// Tool definition sent with every request
pub fn tool(variant: ToolVariant) -> Tool {
    Tool::new(TOOL_NAME, TOOL_DESCRIPTION, input_schema(variant))
}

/// Supported chart kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Histogram,
    Bar,
    Scatter,
    Box,
}

impl ChartType {
    pub const ALL: [ChartType; 4] = [
        ChartType::Histogram,
        ChartType::Scatter,
        ChartType::Box,
        ChartType::Bar,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Histogram => "histogram",
            ChartType::Bar => "bar",
            ChartType::Scatter => "scatter",
            ChartType::Box => "box",
        }
    }

    /// Case-insensitive parse; unknown names yield `None`
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
    }
}

/// A recommended chart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartDescriptor {
    #[serde(rename = "type")]
    pub chart_type: ChartType,
    pub x: String,
    /// Always `None` for histograms
    pub y: Option<String>,
}

impl ChartDescriptor {
    /// Lenient parse of a chart object. Anything unusable is "no chart".
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let chart_type = ChartType::parse(obj.get("type")?.as_str()?)?;
        let x = obj.get("x")?.as_str()?.trim();
        if x.is_empty() {
            return None;
        }

        let y = match chart_type {
            ChartType::Histogram => None,
            _ => obj
                .get("y")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|y| {
                    !y.is_empty() && !y.eq_ignore_ascii_case("null") && !y.eq_ignore_ascii_case("none")
                })
                .map(str::to_string),
        };

        Some(Self {
            chart_type,
            x: x.to_string(),
            y,
        })
    }
}

/// Parsed tool input. Missing or malformed fields are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuredOutput {
    pub text: Option<String>,
    pub next_steps: Option<String>,
    pub chart_1: Option<ChartDescriptor>,
    pub chart_2: Option<ChartDescriptor>,
    pub generated_code: Option<String>,
}

impl StructuredOutput {
    /// Parse a tool input, logging (never failing on) schema violations
    pub fn from_tool_input(input: &Value, variant: ToolVariant) -> Self {
        if let Some(problems) = validate(input, variant) {
            tracing::warn!("Structured output does not match tool schema: {}", problems);
        }

        let string_field = |key: &str| {
            input
                .get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        let chart_field = |key: &str| input.get(key).and_then(ChartDescriptor::from_value);

        Self {
            text: string_field("text"),
            next_steps: string_field("next_steps"),
            chart_1: chart_field("chart_1"),
            chart_2: chart_field("chart_2"),
            generated_code: string_field("matplotlib_code")
                .or_else(|| string_field("generated_code"))
                .filter(|code| !code.trim().is_empty()),
        }
    }
}

/// Validate a tool input against the variant's schema.
/// Returns `Some(description)` when it does not conform.
pub fn validate(input: &Value, variant: ToolVariant) -> Option<String> {
    let schema = input_schema(variant);
    let validator = match jsonschema::validator_for(&schema) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!("Tool schema failed to compile, skipping validation: {}", e);
            return None;
        }
    };

    let errors: Vec<String> = validator
        .iter_errors(input)
        .map(|e| {
            let path = e.instance_path.to_string();
            if path.is_empty() {
                e.to_string()
            } else {
                format!("{}: {}", path, e)
            }
        })
        .collect();

    if errors.is_empty() {
        None
    } else {
        Some(errors.join("; "))
    }
}
