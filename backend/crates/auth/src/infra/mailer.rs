//! Outbound Mail
//!
//! Delivery is fire-and-forget: failures are logged, never surfaced to
//! the flow that triggered the message.

/// Mail delivery trait
#[trait_variant::make(Mailer: Send)]
pub trait LocalMailer {
    async fn send(&self, to: &str, subject: &str, body: &str);
}

/// Mailer that writes messages to the log instead of delivering them.
///
/// Stands in for real SMTP delivery in development and tests; the
/// deployment wires in its own transport.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) {
        tracing::info!(to = %to, subject = %subject, body = %body, "sending email");
    }
}

/// Message templates
pub mod templates {
    pub const VERIFY_SUBJECT: &str = "Please verify your email";

    pub fn verify_body(base_url: &str, token_id: &str) -> String {
        format!("Click the link to verify your email: {base_url}/verify-email?token={token_id}")
    }

    pub const PASSWORD_RESET_SUBJECT: &str = "Password reset";

    pub fn password_reset_body(base_url: &str, token_id: &str) -> String {
        format!("Click the link to reset your password: {base_url}/set-password?token={token_id}")
    }

    pub const LOGIN_LINK_SUBJECT: &str = "Your login link";

    pub fn login_link_body(base_url: &str, token_id: &str) -> String {
        format!("Click the link to log in: {base_url}/login/t/{token_id}")
    }
}

/// Mailer that records messages for assertions
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct RecordingMailer {
    sent: std::sync::Arc<std::sync::Mutex<Vec<(String, String, String)>>>,
}

#[cfg(test)]
impl RecordingMailer {
    pub fn sent(&self) -> Vec<(String, String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string(), body.to_string()));
    }
}
