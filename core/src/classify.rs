//! Mapping from a single probe outcome to an item state.
//!
//! Classification is memoryless: the result depends only on the outcome
//! passed in. `Connecting` is never produced here; it is the state an item
//! holds between issuing a probe and that probe resolving.

use serde_json::Value;

use crate::model::ItemState;

/// Field of the ping reply that carries the liveness answer.
pub const ALIVE_FIELD: &str = "data";

#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    /// 2xx response with a JSON body.
    Reply(Value),
    /// Non-2xx response.
    Rejected { status: u16 },
    /// Transport failure, undecodable body or timeout.
    Failed(String),
}

pub fn classify(outcome: &ProbeOutcome) -> ItemState {
    match outcome {
        ProbeOutcome::Reply(body) => {
            if body.get(ALIVE_FIELD).is_some_and(is_truthy) {
                ItemState::Online
            } else {
                ItemState::Offline
            }
        }
        ProbeOutcome::Rejected { .. } | ProbeOutcome::Failed(_) => ItemState::Offline,
    }
}

/// Truthiness as the ping service's JSON clients understand it.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number
            .as_f64()
            .is_some_and(|value| value != 0.0 && !value.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
