//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum.

use std::sync::Arc;

use crate::{
    config::environment::EnvironmentConfig,
    repositories::Repositories,
    services::{
        authorization_service::AuthorizationService,
        email_service::EmailSender,
        notification_service::{DispatchMode, Notifier},
        payment_gateway::PaymentGateway,
        payment_poller::PollConfig,
    },
    utils::jwt::JwtConfig,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<EnvironmentConfig>,
    pub repositories: Repositories,
    pub payment_gateway: Arc<dyn PaymentGateway>,
    pub notifier: Notifier,
    pub authorization: AuthorizationService,
}

impl AppState {
    pub fn new(
        config: EnvironmentConfig,
        repositories: Repositories,
        payment_gateway: Arc<dyn PaymentGateway>,
        email_sender: Arc<dyn EmailSender>,
        dispatch_mode: DispatchMode,
    ) -> Self {
        let authorization = AuthorizationService::new(repositories.activity_logs.clone());
        Self {
            config: Arc::new(config),
            repositories,
            payment_gateway,
            notifier: Notifier::new(email_sender, dispatch_mode),
            authorization,
        }
    }

    pub fn jwt_config(&self) -> JwtConfig {
        JwtConfig::from(self.config.as_ref())
    }

    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            interval: self.config.payment.poll_interval,
            timeout: self.config.payment.poll_timeout,
        }
    }
}
