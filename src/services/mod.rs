pub mod description_fetcher;
pub mod llm_service;
pub mod prompt_builder;
pub mod work_filter;

pub use description_fetcher::{parse_response, DescriptionFetcher};
pub use llm_service::{LlmService, TextGenerator};
pub use prompt_builder::build_prompt;
pub use work_filter::filter_pending;
