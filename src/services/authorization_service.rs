//! Servicio de autorización
//!
//! Decide por rol o por propiedad del recurso y deja constancia de cada
//! denegación en el registro de actividad.

use std::sync::Arc;

use tracing::{error, warn};
use uuid::Uuid;

use crate::{
    middleware::{auth::Principal, request_meta::RequestMeta},
    models::{activity_log::ActivityLog, user::Role},
    repositories::ActivityLogRepository,
    utils::errors::{AppError, AppResult},
};

pub const ACCESS_DENIED: &str = "Access denied! You are not allowed to perform this operation.";

/// El rol del principal está en el conjunto requerido
pub fn has_any_role(principal: Option<&Principal>, roles: &[Role]) -> bool {
    principal.map_or(false, |p| roles.contains(&p.role))
}

#[derive(Clone)]
pub struct AuthorizationService {
    activity_logs: Arc<dyn ActivityLogRepository>,
}

impl AuthorizationService {
    pub fn new(activity_logs: Arc<dyn ActivityLogRepository>) -> Self {
        Self { activity_logs }
    }

    /// 403 + auditoría si el rol no está permitido
    pub async fn require_role(
        &self,
        principal: Option<&Principal>,
        roles: &[Role],
        meta: &RequestMeta,
    ) -> AppResult<()> {
        if has_any_role(principal, roles) {
            return Ok(());
        }

        self.record_denied(
            principal,
            meta,
            "system",
            "unauthorized_access_attempt",
            format!(
                "User tried to access a route: {} without permission",
                meta.route()
            ),
        )
        .await;
        Err(AppError::Forbidden(ACCESS_DENIED.to_string()))
    }

    /// 403 + auditoría si el principal no es el dueño del recurso
    pub async fn require_owner(
        &self,
        principal: &Principal,
        owner_id: Uuid,
        meta: &RequestMeta,
        resource: &str,
    ) -> AppResult<()> {
        if principal.user_id == owner_id {
            return Ok(());
        }

        self.record_denied(
            Some(principal),
            meta,
            resource,
            "ownership_check_failed",
            format!(
                "User tried to modify a {} they do not own via {}",
                resource,
                meta.route()
            ),
        )
        .await;
        Err(AppError::Forbidden(format!(
            "You are not allowed to modify this {}",
            resource
        )))
    }

    async fn record_denied(
        &self,
        principal: Option<&Principal>,
        meta: &RequestMeta,
        kind: &str,
        action: &str,
        details: String,
    ) {
        let actor = principal
            .map(|p| p.user_id.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        warn!("🚫 Denied {} for {}: {}", meta.route(), actor, details);

        let entry = ActivityLog::failure(
            principal.map(|p| p.user_id),
            kind,
            action,
            details,
            meta.ip_address.clone(),
            meta.user_agent.clone(),
        );
        if let Err(e) = self.activity_logs.insert(entry).await {
            error!("❌ Failed to write activity log: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::activity_log::{ActivityStatus, UserAgentInfo},
        repositories::memory::InMemoryActivityLogRepository,
    };

    fn principal(role: Role) -> Principal {
        Principal {
            user_id: Uuid::new_v4(),
            role,
            name: "Test".to_string(),
            email: "test@example.com".to_string(),
        }
    }

    fn meta() -> RequestMeta {
        RequestMeta {
            ip_address: "127.0.0.1".to_string(),
            user_agent: UserAgentInfo {
                browser: "curl 8.4.0".to_string(),
                os: "unknown".to_string(),
            },
            method: "POST".to_string(),
            path: "/api/v1/plans".to_string(),
        }
    }

    #[test]
    fn test_role_decision_is_pure() {
        let authority = principal(Role::Authority);
        let school = principal(Role::School);
        for _ in 0..3 {
            assert!(has_any_role(Some(&authority), &[Role::Authority]));
            assert!(!has_any_role(Some(&school), &[Role::Authority]));
        }
        assert!(!has_any_role(None, &[Role::Authority]));
    }

    #[tokio::test]
    async fn test_denial_is_audited() {
        let logs = Arc::new(InMemoryActivityLogRepository::default());
        let service = AuthorizationService::new(logs.clone());
        let school = principal(Role::School);

        let err = service
            .require_role(Some(&school), &[Role::Authority], &meta())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let entries = logs.find_recent(10).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].user_id, Some(school.user_id));
        assert_eq!(entries[0].status, ActivityStatus::Failure);
        assert!(entries[0].details.contains("/api/v1/plans"));
    }

    #[tokio::test]
    async fn test_owner_check() {
        let logs = Arc::new(InMemoryActivityLogRepository::default());
        let service = AuthorizationService::new(logs.clone());
        let transporter = principal(Role::Transporter);

        assert!(service
            .require_owner(&transporter, transporter.user_id, &meta(), "travel")
            .await
            .is_ok());
        assert!(service
            .require_owner(&transporter, Uuid::new_v4(), &meta(), "travel")
            .await
            .is_err());
        assert_eq!(logs.find_recent(10).await.unwrap().len(), 1);
    }
}
