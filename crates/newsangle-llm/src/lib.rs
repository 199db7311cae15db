// Generative-language integration: prompt, API client and response parsing.

pub mod client;
pub mod generate;
pub mod parse;
pub mod prompt;
