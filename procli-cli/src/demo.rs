//! Built-in demo operations served by the `procli` binary

use procli_contract::{number_value, InputContract, Operation, OperationKind};
use procli_router::{handler_fn, HandlerError, OperationRegistry};
use serde_json::{json, Value};

fn pair(input: &Value) -> Result<(f64, f64), HandlerError> {
    match input.as_array().map(Vec::as_slice) {
        Some([a, b]) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => Ok((a, b)),
            _ => Err(HandlerError::bad_request("Expected two numbers")),
        },
        _ => Err(HandlerError::bad_request("Expected two numbers")),
    }
}

fn binary(name: &str, description: &str, example: &str) -> Operation {
    Operation::new(name, OperationKind::Read)
        .description(description)
        .example(example)
        .input(InputContract::tuple(vec![
            InputContract::number(),
            InputContract::number(),
        ]))
}

/// Registry with arithmetic, help, application and agent-call operations
pub fn demo_registry() -> OperationRegistry {
    let mut registry = OperationRegistry::new();

    registry.register(
        binary("math.add", "Add two numbers", "procli math.add 1 2"),
        handler_fn(|input| pair(&input).map(|(a, b)| Some(number_value(a + b)))),
    );
    registry.register(
        binary("math.subtract", "Subtract the second number from the first", "procli math.subtract 5 3"),
        handler_fn(|input| pair(&input).map(|(a, b)| Some(number_value(a - b)))),
    );
    registry.register(
        binary("math.multiply", "Multiply two numbers", "procli math.multiply 4 2.5"),
        handler_fn(|input| pair(&input).map(|(a, b)| Some(number_value(a * b)))),
    );

    registry.register(
        Operation::new("math.square", OperationKind::Read)
            .description("Square a number")
            .input(InputContract::number().described("number")),
        handler_fn(|input| {
            let n = input
                .as_f64()
                .ok_or_else(|| HandlerError::bad_request("Expected a number"))?;
            Ok(Some(number_value(n * n)))
        }),
    );

    registry.register(
        Operation::new("math.divide", OperationKind::Write)
            .description("Divide one number by another")
            .example("procli math.divide --numerator 10 --denominator 4")
            .input(InputContract::object([
                ("numerator", InputContract::number().described("Number to divide")),
                ("denominator", InputContract::number().described("Number to divide by")),
            ])),
        handler_fn(|input| {
            let numerator = input["numerator"].as_f64().unwrap_or_default();
            let denominator = input["denominator"].as_f64().unwrap_or_default();
            if denominator == 0.0 {
                return Err(HandlerError::bad_request("Cannot divide by zero"));
            }
            Ok(Some(number_value(numerator / denominator)))
        }),
    );

    registry.register(
        Operation::new("help.man", OperationKind::Read)
            .description("Show the manual page for a command")
            .input(InputContract::tuple(vec![InputContract::string().described("command")])),
        handler_fn(|input| {
            let topic = input[0].as_str().unwrap_or_default().to_string();
            Ok(Some(json!([
                format!("{}(1)", topic),
                format!("Run `procli {} --help` for flags and usage.", topic),
            ])))
        }),
    );

    registry.register(
        Operation::new("application.create", OperationKind::Write)
            .description("Create an application")
            .input(InputContract::tuple(vec![InputContract::string().described("Name")])),
        handler_fn(|input| {
            let name = input[0].as_str().unwrap_or_default();
            Ok(Some(Value::String(format!("Created application {}", name))))
        }),
    );

    registry.register(
        Operation::new("cerebro.exec", OperationKind::Write)
            .description("Call a method on an agent")
            .example(r#"procli cerebro.exec 'agent.method("a", "b")'"#)
            .input(InputContract::object([
                ("agent", InputContract::string().described("Agent to call")),
                ("method", InputContract::string().described("Method to call")),
                (
                    "params",
                    InputContract::array(InputContract::string())
                        .described("Method arguments")
                        .optional(),
                ),
            ])),
        handler_fn(|input| Ok(Some(input))),
    );

    registry
}
