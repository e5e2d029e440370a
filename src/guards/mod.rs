pub mod auth;
pub mod recruiter;

pub use auth::AuthGuard;
pub use recruiter::RecruiterGuard;
