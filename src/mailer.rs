//!
//! # Outbound Mail
//!
//! Boundary for transactional email. The workflow never sends mail itself;
//! handlers build the message and hand it to a [`Mailer`]. Actual delivery is
//! out of scope for this service, so the default implementation writes the
//! message to the application log. Delivery failures are reported to the
//! caller, which logs them without failing the triggering request.

use std::fmt;

#[derive(Debug)]
pub enum MailerError {
    Delivery(String),
}

impl fmt::Display for MailerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MailerError::Delivery(msg) => write!(f, "Mail delivery failed: {}", msg),
        }
    }
}

pub trait Mailer: Send + Sync {
    fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), MailerError>;
}

/// Development mailer: logs the outgoing message instead of delivering it.
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), MailerError> {
        log::info!("outgoing mail to={} subject={:?}", to, subject);
        log::debug!("mail body:\n{}", html_body);
        Ok(())
    }
}

/// Subject and HTML body for the account verification email.
pub fn verification_email(api_url: &str, token: &str) -> (String, String) {
    let verification_url = format!("{}/api/auth/verify-email/{}", api_url, token);
    let subject = "Verify your WorkMarket account".to_string();
    let body = format!(
        "<div style=\"font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;\">\
           <h2>Welcome to WorkMarket!</h2>\
           <p>Thank you for registering. Please verify your email address by clicking the link below:</p>\
           <p><a href=\"{url}\">Verify Email Address</a></p>\
           <p>Or copy and paste this link in your browser:</p>\
           <p style=\"word-break: break-all;\">{url}</p>\
           <p>This verification link will expire in 24 hours.</p>\
           <p>If you didn't create an account with WorkMarket, please ignore this email.</p>\
         </div>",
        url = verification_url
    );
    (subject, body)
}

/// Subject and HTML body for the password reset email.
pub fn password_reset_email(base_url: &str, token: &str) -> (String, String) {
    let reset_url = format!("{}/reset-password/{}", base_url, token);
    let subject = "Reset your WorkMarket password".to_string();
    let body = format!(
        "<h2>Password Reset Request</h2>\
         <p>Click the link below to reset your password:</p>\
         <p><a href=\"{url}\" target=\"_blank\">{url}</a></p>\
         <p>This link expires in 10 minutes.</p>",
        url = reset_url
    );
    (subject, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_email_embeds_token() {
        let (subject, body) = verification_email("http://localhost:8080", "abc123");
        assert!(subject.contains("Verify"));
        assert!(body.contains("http://localhost:8080/api/auth/verify-email/abc123"));
    }

    #[test]
    fn test_password_reset_email_embeds_token() {
        let (_, body) = password_reset_email("http://localhost:5173", "tok");
        assert!(body.contains("http://localhost:5173/reset-password/tok"));
    }

    #[test]
    fn test_log_mailer_always_succeeds() {
        let mailer = LogMailer;
        assert!(mailer.send("a@b.com", "hi", "<p>hi</p>").is_ok());
    }
}
