//! Email Templates

use crate::email::sender::EmailMessage;
use crate::user::entity::User;

/// Renders account emails with links back to the application.
#[derive(Debug, Clone)]
pub struct EmailTemplates {
    from: String,
    app_base_url: String,
}

impl EmailTemplates {
    pub fn new(from: impl Into<String>, app_base_url: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            app_base_url: app_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &gk_config::EmailConfig) -> Self {
        Self::new(&config.from, &config.app_base_url)
    }

    pub fn verification(&self, user: &User, token: &str) -> EmailMessage {
        let link = format!("{}/verify?token={}", self.app_base_url, token);
        EmailMessage {
            from: self.from.clone(),
            to: user.email.clone(),
            subject: "Confirm your email address".to_string(),
            body: format!(
                "Hello {},\n\nPlease confirm your email address by opening the link below:\n\n{}\n\nIf you did not create an account, you can ignore this message.\n",
                user.name, link
            ),
        }
    }

    pub fn password_reset(&self, user: &User, token: &str) -> EmailMessage {
        let link = format!("{}/reset-password?token={}", self.app_base_url, token);
        EmailMessage {
            from: self.from.clone(),
            to: user.email.clone(),
            subject: "Reset your password".to_string(),
            body: format!(
                "Hello {},\n\nA password reset was requested for your account. Open the link below to choose a new password:\n\n{}\n\nIf you did not request this, you can ignore this message.\n",
                user.name, link
            ),
        }
    }
}

/// Pull the token back out of a rendered link.
pub fn token_from_body(body: &str) -> Option<&str> {
    let start = body.find("token=")? + "token=".len();
    body[start..].split_whitespace().next()
}
