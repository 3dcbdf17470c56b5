//! Structured answer generation.
//!
//! [`AnswerFormatter`] turns a [`RetrievalResult`](nyaya_rag::RetrievalResult) and the
//! user's question into one language model request whose instructions pin the answer to
//! a fixed layout:
//!
//! ```text
//! [Yes|No, <brief answer> under Section <n> IPC.]   only for "is this an offence" questions
//! Section <n> IPC: <title>
//! Explanation:
//! Key Details:
//! Punishment:
//! Example Case Study:
//! [Relevant Sections:]
//! ```
//!
//! [`QuestionKind`] decides deterministically whether a question names a section or asks
//! for a verdict. [`AnswerLayout`] checks what came back.

mod formatter;
pub mod layout;
pub mod section;
pub mod template;

pub use formatter::{AnswerFormatter, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, failure_message};
pub use layout::{AnswerLayout, SectionHeader, strip_preamble};
pub use section::QuestionKind;
