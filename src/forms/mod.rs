//! The dynamic question schema: how a question's `options` payload is read for
//! its type, and what a valid answer looks like.

pub mod answers;
pub mod schema;

pub use answers::{validate_answer, validate_responses};
pub use schema::{QuestionOptions, parse_options, validate_definition};
