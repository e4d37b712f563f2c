use lettre::message::Mailbox;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

/// Dispatches verification codes over SMTP.
///
/// Callers treat dispatch as best-effort: the login flow logs a failure and
/// continues rather than aborting.
pub struct CodeMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("invalid mail address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("message build failed: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP dispatch failed: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

impl CodeMailer {
    /// Connects to a plain relay host without TLS, the usual in-cluster
    /// setup.
    pub fn new(host: &str, port: u16, from: &str) -> Result<Self, MailError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
            .port(port)
            .build();
        Ok(Self {
            transport,
            from: from.parse()?,
        })
    }

    pub async fn send_code(&self, to: &str, code: &str) -> Result<(), MailError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(to.parse()?)
            .subject("Your verification code")
            .body(format!("Your verification code: {code}"))?;

        self.transport.send(message).await?;
        Ok(())
    }
}
