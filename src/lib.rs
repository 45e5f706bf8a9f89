//! Prompt quality analysis: rule-based and LLM-assisted scoring, optimization
//! suggestions, score history with trends and rankings, a template library, and
//! a library of saved prompts.

pub mod analytics;
pub mod analyzer;
pub mod cli;
pub mod config;
pub mod error;
pub mod llm;
pub mod logging;
pub mod optimizer;
pub mod prompts;
pub mod templates;
pub mod utils;
pub mod web;
