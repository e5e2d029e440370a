pub mod assessment;
pub mod jwt;
pub mod matching;
pub mod notify;

pub use jwt::JwtService;
pub use notify::{NotificationSender, NoopNotifier, SmtpNotifier};
