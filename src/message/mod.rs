pub mod provider;
pub mod templates;

pub use provider::{build_prompt, AiClient, AiProvider, AiResult, ProviderError};
pub use templates::{compose, personalize, select_template, TemplateName};
