//! Transactional email bodies and best-effort delivery

use platform::mail::{MailMessage, Mailer};

use crate::application::config::AuthConfig;
use crate::domain::entity::user::User;

pub fn verification_email(config: &AuthConfig, user: &User, raw_token: &str) -> MailMessage {
    let link = config.verification_link(raw_token);
    let hours = config.verification_token_ttl.as_secs() / 3600;
    MailMessage::new(
        user.email.as_str(),
        format!("Confirm your {} account", config.site_name),
        format!(
            "<p>Hi {},</p>\
             <p>Confirm your email address to start learning:</p>\
             <p><a href=\"{link}\">{link}</a></p>\
             <p>This link expires in {hours} hours.</p>",
            user.user_name
        ),
    )
}

pub fn password_reset_email(config: &AuthConfig, user: &User, raw_token: &str) -> MailMessage {
    let link = config.reset_link(raw_token);
    let minutes = config.reset_token_ttl.as_secs() / 60;
    MailMessage::new(
        user.email.as_str(),
        format!("Reset your {} password", config.site_name),
        format!(
            "<p>Hi {},</p>\
             <p>Someone asked to reset the password for this account. If it was you, open:</p>\
             <p><a href=\"{link}\">{link}</a></p>\
             <p>This link expires in {minutes} minutes. If you did not ask for it, ignore this email.</p>",
            user.user_name
        ),
    )
}

/// Delivery failures are logged; the calling operation still succeeds.
pub async fn send_best_effort<M>(mailer: &M, message: MailMessage)
where
    M: Mailer,
{
    let to = message.to.clone();
    if let Err(e) = mailer.send(message).await {
        tracing::warn!(error = %e, to = %to, "Failed to send email");
    }
}
