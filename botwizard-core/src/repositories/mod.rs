// src/repositories/mod.rs

pub mod postgres;

pub use botwizard_common::traits::repository_traits::{
    ChannelRepository, FaqRepository, GoogleTokenRepository, MessageLogRepository,
    ProjectRepository, SettingsRepository, SheetBindingRepository,
};

pub use postgres::settings::PostgresSettingsRepository;
pub use postgres::google_tokens::PostgresGoogleTokenRepository;
pub use postgres::project::PostgresProjectRepository;
pub use postgres::message_log::PostgresMessageLogRepository;
pub use postgres::faq::PostgresFaqRepository;
pub use postgres::channels::PostgresChannelRepository;
