// File: botwizard-common/src/traits/mod.rs
pub mod repository_traits;
