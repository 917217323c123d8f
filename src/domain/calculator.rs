//! Arithmetic procedures
//!
//! `calculate` takes a keyed `WorkRequest`; `calculate2` takes the same
//! operands positionally.

use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
}
crate::reflect_enum!(Operation ["add", "subtract", "multiply", "divide"]);

impl Operation {
    pub fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            Self::Add => lhs + rhs,
            Self::Subtract => lhs - rhs,
            Self::Multiply => lhs * rhs,
            Self::Divide => lhs / rhs,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkRequest {
    pub arg1: f64,
    pub arg2: f64,
    pub op: Operation,
    pub comment: Option<String>,
}
crate::reflect_record!(WorkRequest {
    arg1: f64,
    arg2: f64,
    op: Operation,
    comment: Option<String>,
});

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkResponse {
    pub result: f64,
}
crate::reflect_record!(WorkResponse { result: f64 });

pub fn calculate(work: WorkRequest) -> WorkResponse {
    let result = work.op.apply(work.arg1, work.arg2);
    debug!(
        arg1 = work.arg1,
        arg2 = work.arg2,
        op = ?work.op,
        comment = work.comment.as_deref().unwrap_or(""),
        result,
        "calculate"
    );
    WorkResponse { result }
}

pub fn calculate_positional(arg1: f64, arg2: f64, op: Operation) -> f64 {
    let result = op.apply(arg1, arg2);
    debug!(arg1, arg2, op = ?op, result, "calculate2");
    result
}
