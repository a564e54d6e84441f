//! User-facing output
//!
//! Operation results and diagnostics are written through a [`Logger`]. The
//! [`LineByLineLogger`] prints primitives as-is, the items of a top-level list
//! one per line, and anything structured as pretty JSON.

use colored::Colorize;
use is_terminal::IsTerminal;
use serde_json::Value;
use std::io::Write;
use std::sync::Mutex;

/// Destination for rendered output lines
pub trait Logger: Send + Sync {
    fn info(&self, value: &Value);
    fn error(&self, value: &Value);
}

/// Where rendered lines end up
pub trait Sink: Send + Sync {
    fn out(&self, line: &str);
    fn err(&self, line: &str);
}

/// Writes to stdout and stderr; error lines are red when stderr is a terminal
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl Sink for ConsoleSink {
    fn out(&self, line: &str) {
        let mut stdout = std::io::stdout().lock();
        let _ = writeln!(stdout, "{}", line);
    }

    fn err(&self, line: &str) {
        let stderr = std::io::stderr();
        let painted = if stderr.is_terminal() {
            line.red().to_string()
        } else {
            line.to_string()
        };
        let _ = writeln!(stderr.lock(), "{}", painted);
    }
}

/// Captures lines in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    out: Mutex<Vec<String>>,
    err: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn out_lines(&self) -> Vec<String> {
        self.out.lock().map(|lines| lines.clone()).unwrap_or_default()
    }

    pub fn err_lines(&self) -> Vec<String> {
        self.err.lock().map(|lines| lines.clone()).unwrap_or_default()
    }
}

impl Sink for MemorySink {
    fn out(&self, line: &str) {
        if let Ok(mut lines) = self.out.lock() {
            lines.push(line.to_string());
        }
    }

    fn err(&self, line: &str) {
        if let Ok(mut lines) = self.err.lock() {
            lines.push(line.to_string());
        }
    }
}

impl<S: Sink + ?Sized> Sink for std::sync::Arc<S> {
    fn out(&self, line: &str) {
        (**self).out(line)
    }

    fn err(&self, line: &str) {
        (**self).err(line)
    }
}

/// Logger printing primitives directly, lists item by item and objects as JSON
#[derive(Debug, Default)]
pub struct LineByLineLogger<S> {
    sink: S,
}

impl<S: Sink> LineByLineLogger<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

impl LineByLineLogger<ConsoleSink> {
    pub fn console() -> Self {
        Self::new(ConsoleSink)
    }
}

impl<S: Sink> Logger for LineByLineLogger<S> {
    fn info(&self, value: &Value) {
        for line in render_lines(value) {
            self.sink.out(&line);
        }
    }

    fn error(&self, value: &Value) {
        for line in render_lines(value) {
            self.sink.err(&line);
        }
    }
}

/// Render a value as output lines
///
/// Only the top level of a list is expanded; nested values are printed whole.
pub fn render_lines(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().map(render_item).collect(),
        other => vec![render_item(other)],
    }
}

fn render_item(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_primitives_print_directly() {
        assert_eq!(render_lines(&json!("hi")), vec!["hi"]);
        assert_eq!(render_lines(&json!(3)), vec!["3"]);
        assert_eq!(render_lines(&json!(false)), vec!["false"]);
    }

    #[test]
    fn test_top_level_list_one_item_per_line() {
        assert_eq!(
            render_lines(&json!(["a", 1, [2, 3]])),
            vec!["a".to_string(), "1".to_string(), "[\n  2,\n  3\n]".to_string()]
        );
    }

    #[test]
    fn test_objects_print_as_pretty_json() {
        assert_eq!(render_lines(&json!({"a": 1})), vec!["{\n  \"a\": 1\n}"]);
        assert_eq!(render_lines(&Value::Null), vec!["null"]);
    }

    #[test]
    fn test_memory_sink_separates_streams() {
        let sink = Arc::new(MemorySink::new());
        let logger = LineByLineLogger::new(Arc::clone(&sink));
        logger.info(&json!(["x", "y"]));
        logger.error(&json!("bad"));
        assert_eq!(sink.out_lines(), vec!["x", "y"]);
        assert_eq!(sink.err_lines(), vec!["bad"]);
    }
}
