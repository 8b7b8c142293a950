//! Generation infrastructure: HTTP seam, OpenAI-compatible binding, and
//! structured-output parsing

mod http_client;
mod openai;
mod structured;

pub use http_client::{HttpClient, HttpClientTrait};
pub use openai::OpenAiGenerationProvider;
pub use structured::parse_json_object;
