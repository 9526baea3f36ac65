// steward-cli/src/tools/calculator.rs
use anyhow::Result;
use serde::Deserialize;

use steward_core::{handler_fn, ToolInput, ToolParameter, ToolParametersDefinition, ToolSpec};

#[derive(Deserialize)]
struct CalculatorParams {
    operation: String,
    a: f64,
    b: f64,
}

/// Applies `operation` to `a` and `b`. Problems are reported as text so the
/// model can explain them.
pub fn calculate(operation: &str, a: f64, b: f64) -> String {
    let value = match operation {
        "add" => a + b,
        "subtract" => a - b,
        "multiply" => a * b,
        "divide" if b == 0.0 => return "Error: Division by zero".to_string(),
        "divide" => a / b,
        other => {
            return format!(
                "Error: Unknown operation '{}'. Use: add, subtract, multiply, divide",
                other
            )
        }
    };
    format_number(value)
}

// Whole numbers keep one decimal place: 144 / 12 reads "12.0".
fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

pub fn calculator_tool() -> ToolSpec {
    ToolSpec::new(
        "calculator",
        "Perform arithmetic operations (add, subtract, multiply, divide) on two numbers.",
        ToolParametersDefinition::new()
            .property(
                "operation",
                ToolParameter::string("The operation: 'add', 'subtract', 'multiply', or 'divide'"),
                true,
            )
            .property("a", ToolParameter::number("First number"), true)
            .property("b", ToolParameter::number("Second number"), true),
        handler_fn(|input: ToolInput| -> Result<String> {
            let params: CalculatorParams = input.parse()?;
            Ok(calculate(&params.operation, params.a, params.b))
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_calculate() {
        assert_eq!(calculate("divide", 144.0, 12.0), "12.0");
        assert_eq!(calculate("add", 0.1, 0.2), "0.30000000000000004");
        assert_eq!(calculate("multiply", 25.0, 4.0), "100.0");
        assert_eq!(calculate("subtract", 1.0, 3.5), "-2.5");
        assert_eq!(calculate("divide", 1.0, 0.0), "Error: Division by zero");
        assert_eq!(
            calculate("modulo", 1.0, 2.0),
            "Error: Unknown operation 'modulo'. Use: add, subtract, multiply, divide"
        );
    }

    #[tokio::test]
    async fn test_calculator_tool_accepts_integers() {
        let spec = calculator_tool();
        let input = ToolInput::new(
            json!({ "operation": "add", "a": 2, "b": 3 }).as_object().cloned().unwrap(),
        );
        assert_eq!(spec.handler.call(input).await.unwrap(), "5.0");
    }
}
