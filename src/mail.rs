/// Outbound mail. Messages are written to the log instead of an SMTP relay.
#[derive(Clone)]
pub struct Mailer {
    from: String,
}

impl Mailer {
    pub fn new(from: impl Into<String>) -> Self {
        Mailer { from: from.into() }
    }

    pub fn send(&self, to: &str, subject: &str, body: &str) {
        tracing::info!(from = %self.from, to, subject, "Sending mail");
        tracing::debug!(body, "Mail body");
    }
}
