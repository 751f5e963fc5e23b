mod core;
mod database;
mod docusign;
mod gateway;
mod gemini;
mod session;
mod status_stream;

pub use self::core::Config;
pub use database::DatabaseConfig;
pub use docusign::DocuSignConfig;
pub use gateway::GatewayConfig;
pub use gemini::GeminiConfig;
pub use session::SessionConfig;
pub use status_stream::StatusStreamConfig;
