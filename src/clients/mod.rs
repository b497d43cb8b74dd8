pub mod model_client;
pub mod ollama_client;
pub mod openai_client;

pub use model_client::{GenerationOptions, ModelClient};
pub use ollama_client::OllamaClient;
pub use openai_client::OpenAiCompatClient;
