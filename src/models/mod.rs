pub mod user;
pub mod profile;
pub mod job;
pub mod application;
pub mod match_score;
pub mod assessment;

pub use user::*;
pub use profile::*;
pub use job::*;
pub use application::*;
pub use match_score::*;
pub use assessment::*;
