pub mod auth;
pub mod user;
pub mod job;
pub mod application;
pub mod analysis;
pub mod assessment;
pub mod file_upload;
