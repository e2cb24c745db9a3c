//! Prompt domain
//!
//! Templates for the classifier, the planner, role passes, discussion
//! rounds and synthesis.

mod template;

pub use template::PromptTemplate;
