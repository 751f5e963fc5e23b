pub mod schema;

pub use schema::{
    Config, DatabaseConfig, DocuSignConfig, GatewayConfig, GeminiConfig, SessionConfig,
    StatusStreamConfig,
};
