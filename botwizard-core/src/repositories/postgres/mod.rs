// src/repositories/postgres/mod.rs

pub mod settings;
pub mod google_tokens;
pub mod project;
pub mod message_log;
pub mod faq;
pub mod channels;

pub use settings::PostgresSettingsRepository;
pub use google_tokens::PostgresGoogleTokenRepository;
pub use project::PostgresProjectRepository;
pub use message_log::PostgresMessageLogRepository;
pub use faq::PostgresFaqRepository;
pub use channels::PostgresChannelRepository;
