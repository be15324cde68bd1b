pub mod auth_service;
pub mod encoding;
pub mod gemini_service;
pub mod prompt;
pub mod staging_gateway;

#[cfg(test)]
pub(crate) mod test_server;

pub use auth_service::{AuthSession, IdentityProvider, SupabaseAuth};
pub use encoding::{encode_inline, InlineImage};
pub use gemini_service::GeminiGateway;
pub use prompt::build_staging_prompt;
pub use staging_gateway::{StagingGateway, StagingMode, StagingRequest};
