//! Envío de correo
//!
//! `SmtpEmailSender` usa el transporte SMTP asíncrono de lettre;
//! `LogEmailSender` sólo registra el mensaje y se usa cuando no hay SMTP
//! configurado.

use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::info;

use crate::{
    config::environment::EmailConfig,
    utils::errors::{AppError, AppResult},
};

#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: EmailMessage) -> AppResult<()>;
}

pub struct SmtpEmailSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpEmailSender {
    pub fn new(config: &EmailConfig, host: &str) -> AppResult<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .map_err(|e| AppError::ExternalApi(format!("SMTP relay error: {}", e)))?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            ))
            .build();

        Ok(Self {
            transport,
            from: config.from.clone(),
        })
    }
}

#[async_trait]
impl EmailSender for SmtpEmailSender {
    async fn send(&self, message: EmailMessage) -> AppResult<()> {
        let mut builder = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e| AppError::ExternalApi(format!("Invalid from address: {}", e)))?,
            )
            .subject(message.subject)
            .header(ContentType::TEXT_HTML);

        for to in &message.to {
            builder = builder.to(to
                .parse()
                .map_err(|e| AppError::ExternalApi(format!("Invalid to address '{}': {}", to, e)))?);
        }

        let email = builder
            .body(message.html)
            .map_err(|e| AppError::ExternalApi(format!("Failed to build email: {}", e)))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| AppError::ExternalApi(format!("Failed to send email: {}", e)))?;

        Ok(())
    }
}

#[derive(Default)]
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, message: EmailMessage) -> AppResult<()> {
        info!(
            "📧 (no SMTP configured) to={:?} subject={}",
            message.to, message.subject
        );
        Ok(())
    }
}
