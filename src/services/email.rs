use anyhow::Context;
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use uuid::Uuid;

use crate::config::Config;

const PRODUCT_NAME: &str = "Blueink";

pub struct EmailService {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl EmailService {
    /// Returns None if SMTP is not fully configured.
    pub fn new(config: &Config) -> Option<Self> {
        let host = config.smtp_host.as_deref()?;
        let username = config.smtp_username.clone()?;
        let password = config.smtp_password.clone()?;
        let from_addr = config.smtp_from.as_deref()?;

        let port = config.smtp_port.unwrap_or(587);
        let creds = Credentials::new(username, password);

        // 465 is implicit TLS; anything else upgrades with STARTTLS.
        let transport = if port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)
                .ok()?
                .port(port)
                .credentials(creds)
                .build()
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .ok()?
                .port(port)
                .credentials(creds)
                .build()
        };

        let from: Mailbox = from_addr.parse().ok()?;

        Some(Self { transport, from })
    }

    fn new_message_id(&self) -> String {
        format!("<{}@{}>", Uuid::new_v4(), self.from.email.domain())
    }

    async fn send_email(&self, to: Mailbox, subject: &str, text: &str, html: &str) -> anyhow::Result<()> {
        let email = Message::builder()
            .message_id(Some(self.new_message_id()))
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html.to_string()),
                    ),
            )
            .context("Failed to build email message")?;

        self.transport
            .send(email)
            .await
            .context("Failed to send email")?;

        Ok(())
    }

    pub async fn send_password_reset(&self, to_email: &str, reset_url: &str) -> anyhow::Result<()> {
        let to: Mailbox = to_email
            .parse()
            .with_context(|| format!("Invalid recipient address {to_email:?}"))?;
        let (subject, text, html) = password_reset_body(reset_url);
        self.send_email(to, &subject, &text, &html).await
    }
}

/// `(subject, plain text, html)` of the reset mail.
fn password_reset_body(reset_url: &str) -> (String, String, String) {
    let subject = format!("Reset your {PRODUCT_NAME} password");

    let text = format!(
        "Hello,\n\n\
        We received a request to reset the password of your {PRODUCT_NAME} account.\n\n\
        Open this link to choose a new password (valid for 1 hour):\n\
        {reset_url}\n\n\
        If you did not ask for this, you can ignore this email."
    );

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>{PRODUCT_NAME}</title></head>
<body style="margin:0;padding:40px 16px;background-color:#f1f5f9;font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',Roboto,Helvetica,Arial,sans-serif">
  <div style="max-width:520px;margin:0 auto;background:#ffffff;border-radius:12px;padding:40px">
    <h1 style="margin:0 0 8px 0;font-size:22px;color:#0f172a">Password reset</h1>
    <p style="margin:0 0 28px 0;font-size:15px;color:#64748b;line-height:1.6">We received a request to reset the password of your {PRODUCT_NAME} account.</p>
    <a href="{reset_url}" style="display:inline-block;padding:13px 28px;background:#2563eb;color:#ffffff;text-decoration:none;font-weight:600;border-radius:8px">Choose a new password</a>
    <p style="margin:28px 0 0 0;font-size:13px;color:#94a3b8">This link expires in <strong>1 hour</strong>. If you did not ask for this, ignore this email.</p>
  </div>
</body>
</html>"#
    );

    (subject, text, html)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_mail_carries_the_link_in_both_parts() {
        let url = "http://localhost:3000/reset-password?token=abc";
        let (subject, text, html) = password_reset_body(url);
        assert!(subject.contains("password"));
        assert!(text.contains(url));
        assert!(html.contains(url));
    }
}
