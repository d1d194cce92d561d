use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{debug, warn};

use crate::config::SmtpConfig;

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("invalid address: {0}")]
    Address(String),
    #[error("message build failed: {0}")]
    Build(String),
    #[error("smtp transport failed: {0}")]
    Transport(String),
    #[error("mail transport is not configured")]
    Disabled,
}

/// Outbound mail used for OTP and welcome messages.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_html(&self, to: &str, subject: &str, html: &str) -> Result<(), MailError>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    pub fn new(cfg: &SmtpConfig) -> anyhow::Result<Self> {
        let creds = Credentials::new(cfg.username.clone(), cfg.password.clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&cfg.host)?
            .credentials(creds)
            .build();
        Ok(Self {
            transport,
            from: cfg.from.clone(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_html(&self, to: &str, subject: &str, html: &str) -> Result<(), MailError> {
        let message = Message::builder()
            .from(self.from.parse().map_err(|e| MailError::Address(format!("{e}")))?)
            .to(to.parse().map_err(|e| MailError::Address(format!("{e}")))?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html.to_string())
            .map_err(|e| MailError::Build(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;
        debug!(to, subject, "mail sent");
        Ok(())
    }
}

/// Installed when SMTP is not configured. Every send fails.
pub struct DisabledMailer;

#[async_trait]
impl Mailer for DisabledMailer {
    async fn send_html(&self, to: &str, subject: &str, _html: &str) -> Result<(), MailError> {
        warn!(to, subject, "mail transport disabled; message dropped");
        Err(MailError::Disabled)
    }
}

pub fn from_config(cfg: Option<&SmtpConfig>) -> anyhow::Result<std::sync::Arc<dyn Mailer>> {
    Ok(match cfg {
        Some(smtp) => std::sync::Arc::new(SmtpMailer::new(smtp)?),
        None => {
            warn!("SMTP_HOST/SMTP_USERNAME/SMTP_PASSWORD/MAIL_FROM not set; emails will not be sent");
            std::sync::Arc::new(DisabledMailer)
        }
    })
}

pub const OTP_SUBJECT: &str = "Email Verification OTP - Job Portal";
pub const WELCOME_SUBJECT: &str = "Welcome to Job Portal - Email Verified!";

pub fn otp_email(fullname: &str, otp: &str, valid_minutes: i64) -> String {
    format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
  <h2>Hello {fullname}!</h2>
  <p>Thank you for registering with Job Portal. Use the code below to verify your email address:</p>
  <div style="font-size: 32px; font-weight: bold; letter-spacing: 5px; font-family: 'Courier New', monospace;">{otp}</div>
  <p><strong>Important:</strong> This OTP will expire in {valid_minutes} minutes.</p>
  <p>Never share this OTP with anyone.</p>
</div>"#
    )
}

pub fn welcome_email(fullname: &str) -> String {
    format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
  <h2>Hello {fullname}!</h2>
  <p>Your email address has been verified. You can now complete your profile, upload your resume and apply for jobs.</p>
</div>"#
    )
}
