//! Notificaciones de viaje
//!
//! Envío best-effort: los fallos se registran y nunca llegan al flujo del
//! viaje. En modo `Background` los correos salen en una tarea aparte; en
//! modo `Inline` se esperan antes de responder.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    models::{travel::Travel, user::User},
    services::{
        email_service::{EmailMessage, EmailSender},
        email_templates,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    Background,
    Inline,
}

#[derive(Clone)]
pub struct Notifier {
    sender: Arc<dyn EmailSender>,
    mode: DispatchMode,
}

impl Notifier {
    pub fn new(sender: Arc<dyn EmailSender>, mode: DispatchMode) -> Self {
        Self { sender, mode }
    }

    /// Enviar en orden; un fallo no detiene los siguientes
    pub async fn dispatch(&self, messages: Vec<EmailMessage>) {
        if messages.is_empty() {
            return;
        }

        let sender = self.sender.clone();
        let job = async move {
            for message in messages {
                let subject = message.subject.clone();
                match sender.send(message).await {
                    Ok(()) => debug!("📧 Sent '{}'", subject),
                    Err(e) => warn!("⚠️ Failed to send '{}': {}", subject, e),
                }
            }
        };

        match self.mode {
            DispatchMode::Background => {
                tokio::spawn(job);
            }
            DispatchMode::Inline => job.await,
        }
    }

    pub async fn travel_created(&self, travel: &Travel) {
        self.dispatch(vec![email_templates::travel_created_email(travel)])
            .await;
    }

    /// Avisos de estado al tutor y, si se conoce, a la escuela
    pub async fn status_changed(&self, travel: &Travel, school_email: Option<&str>) {
        self.dispatch(status_messages(travel, school_email)).await;
    }

    /// Avisos de un cambio en bloque, viaje por viaje y en orden
    pub async fn statuses_changed(&self, updates: &[(Travel, Option<String>)]) {
        let messages = updates
            .iter()
            .flat_map(|(travel, school_email)| status_messages(travel, school_email.as_deref()))
            .collect();
        self.dispatch(messages).await;
    }

    /// Bienvenida para transportistas y escuelas; otros roles no reciben nada
    pub async fn welcome(&self, user: &User, password: &str) {
        if let Some(message) = email_templates::welcome_email(user, password) {
            self.dispatch(vec![message]).await;
        }
    }

    pub async fn password_reset(&self, user: &User, code: &str, valid_minutes: i64) {
        self.dispatch(vec![email_templates::password_reset_email(
            user,
            code,
            valid_minutes,
        )])
        .await;
    }
}

fn status_messages(travel: &Travel, school_email: Option<&str>) -> Vec<EmailMessage> {
    let mut messages: Vec<EmailMessage> = email_templates::guardian_status_email(travel)
        .into_iter()
        .collect();
    if let Some(email) = school_email {
        messages.extend(email_templates::school_status_email(travel, email));
    }
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::travel::{tests_support::sample_travel, TravelStatus},
        utils::errors::{AppError, AppResult},
    };
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    /// Falla con el primer mensaje y registra el resto
    #[derive(Default)]
    struct FlakySender {
        attempts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl EmailSender for FlakySender {
        async fn send(&self, message: EmailMessage) -> AppResult<()> {
            let mut attempts = self.attempts.lock().await;
            attempts.push(message.to[0].clone());
            if attempts.len() == 1 {
                return Err(AppError::ExternalApi("smtp down".to_string()));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_failure_does_not_abort_remaining_notifications() {
        let sender = Arc::new(FlakySender::default());
        let notifier = Notifier::new(sender.clone(), DispatchMode::Inline);

        let updates: Vec<(Travel, Option<String>)> = (0..3)
            .map(|i| {
                let mut travel = sample_travel();
                travel.status = TravelStatus::ArrivedAtDestination;
                travel.guardian.email = format!("guardian{}@example.com", i);
                (travel, None)
            })
            .collect();

        notifier.statuses_changed(&updates).await;

        let attempts = sender.attempts.lock().await;
        assert_eq!(
            *attempts,
            vec![
                "guardian0@example.com".to_string(),
                "guardian1@example.com".to_string(),
                "guardian2@example.com".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_status_change_includes_school_when_known() {
        let mut travel = sample_travel();
        travel.status = TravelStatus::Boarded;
        let messages = status_messages(&travel, Some("school@example.com"));
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].to, vec!["school@example.com".to_string()]);
    }
}
