// botwizard-core/src/auth/mod.rs

pub mod google;
pub mod manager;
pub mod callback_server;

pub use google::{GoogleOAuthClient, OAuthClient};
pub use manager::GoogleAuthManager;
