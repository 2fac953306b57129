//! Common test utilities for integration tests.

#![allow(dead_code)]

pub mod harness;

use std::cell::RefCell;
use std::rc::Rc;

use workflow_canvas::{GestureOutcome, NodeData, Parameter, Port};

/// Route `log` output through env_logger (`RUST_LOG=debug cargo test`).
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Records every outcome the editor reports.
#[derive(Default, Clone)]
pub struct OutcomeTracker {
    pub outcomes: Rc<RefCell<Vec<GestureOutcome>>>,
}

impl OutcomeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, outcome: &GestureOutcome) {
        self.outcomes.borrow_mut().push(outcome.clone());
    }

    pub fn last(&self) -> Option<GestureOutcome> {
        self.outcomes.borrow().last().cloned()
    }

    pub fn count(&self, pred: impl Fn(&GestureOutcome) -> bool) -> usize {
        self.outcomes.borrow().iter().filter(|o| pred(o)).count()
    }

    pub fn clear(&self) {
        self.outcomes.borrow_mut().clear();
    }
}

// === Node templates ===

pub fn prompt() -> NodeData {
    NodeData::new("Prompt")
        .with_output(Port::new("text", "STRING"))
        .with_parameter(Parameter::new("template", "string", serde_json::json!("")))
}

pub fn summarize() -> NodeData {
    NodeData::new("Summarize")
        .with_input(Port::new("text", "STRING").required())
        .with_output(Port::new("summary", "STRING"))
}

pub fn output() -> NodeData {
    NodeData::new("Output").with_input(Port::untyped("value").required())
}

pub fn counter() -> NodeData {
    NodeData::new("Counter")
        .with_input(Port::new("n", "INT"))
        .with_output(Port::new("count", "INT"))
}

pub fn average() -> NodeData {
    NodeData::new("Average")
        .with_input(Port::new("x", "FLOAT").required())
        .with_output(Port::new("mean", "FLOAT"))
}

pub fn schema_provider() -> NodeData {
    NodeData::new("SchemaProvider")
        .with_output(Port::new("schema", "SCHEMA"))
        .with_parameter(Parameter::new(
            "schema",
            "json",
            serde_json::json!({ "type": "object", "properties": { "title": { "type": "string" } } }),
        ))
}

pub fn extractor() -> NodeData {
    NodeData::new("Extractor")
        .with_input(Port::new("schema", "SCHEMA"))
        .with_input(Port::new("text", "STRING"))
        .with_parameter(Parameter::new("schema", "json", serde_json::Value::Null))
}
