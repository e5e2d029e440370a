use lettre::{
    Message, SmtpTransport, Transport,
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
};
use log::{info, warn};

/// Outbound notification capability. The core never depends on SMTP
/// directly, so tests (and mail-less deployments) can plug in the
/// no-op sender.
#[rocket::async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), String>;
}

pub struct SmtpNotifier;

#[rocket::async_trait]
impl NotificationSender for SmtpNotifier {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), String> {
        let mail_user = crate::config::Config::mail_user();
        let mail_password = crate::config::Config::mail_password();

        if mail_user.is_empty() || mail_password.is_empty() {
            warn!("Email credentials not configured. Skipping email send.");
            return Err("Email not configured".to_string());
        }

        let from_mailbox: Mailbox = crate::config::Config::mail_from()
            .parse()
            .map_err(|e| format!("Invalid from address: {}", e))?;
        let to_mailbox: Mailbox = to
            .parse()
            .map_err(|e| format!("Invalid recipient address: {}", e))?;

        let email_message = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())
            .map_err(|e| format!("Failed to build message: {}", e))?;

        let creds = Credentials::new(mail_user, mail_password);
        let mailer = SmtpTransport::relay(&crate::config::Config::mail_host())
            .map_err(|e| format!("SMTP relay error: {}", e))?
            .credentials(creds)
            .build();

        mailer
            .send(&email_message)
            .map_err(|e| format!("SMTP send error: {}", e))?;

        info!("Notification email sent to {}", to);
        Ok(())
    }
}

/// Drop-in sender for tests and local runs without SMTP.
pub struct NoopNotifier;

#[rocket::async_trait]
impl NotificationSender for NoopNotifier {
    async fn send(&self, to: &str, subject: &str, _html_body: &str) -> Result<(), String> {
        info!("(noop) would send \"{}\" to {}", subject, to);
        Ok(())
    }
}

pub fn assessment_invitation_body(applicant_name: &str, job_title: &str, url: &str) -> String {
    format!(
        r#"<html>
<body>
    <p>Hi {},</p>
    <p>You've been invited to complete a short assessment for the position
    of <strong>{}</strong>.</p>
    <p><a href="{}">Start the assessment</a></p>
    <p>The assessment stays open for 7 days from today.</p>
    <p>Best regards,<br><strong>TalentHub Team</strong></p>
</body>
</html>"#,
        applicant_name, job_title, url
    )
}

pub fn contact_candidate_body(applicant_name: &str, recruiter_name: &str, message: &str) -> String {
    format!(
        r#"<html>
<body>
    <p>Hi {},</p>
    <p><strong>{}</strong> reached out about your application:</p>
    <blockquote>{}</blockquote>
    <p>You can reply directly to this email.</p>
    <p>Best regards,<br><strong>TalentHub Team</strong></p>
</body>
</html>"#,
        applicant_name, recruiter_name, message
    )
}
