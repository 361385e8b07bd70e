//! Middleware de autenticación JWT y control de roles
//!
//! `authenticate` verifica el bearer token, busca la cuenta e inyecta el
//! `Principal` en las extensions. `restrict_to` corre después y compara el
//! rol con el conjunto permitido de la ruta.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::{from_fn_with_state, Next},
    response::Response,
    routing::MethodRouter,
};
use uuid::Uuid;

use crate::{
    middleware::request_meta::RequestMeta,
    models::user::Role,
    services::authorization_service::AuthorizationService,
    state::AppState,
    utils::{
        errors::{AppError, AppResult},
        jwt::{extract_token_from_header, verify_token},
    },
};

/// Usuario autenticado que se inyecta en las requests
#[derive(Debug, Clone)]
pub struct Principal {
    pub user_id: Uuid,
    pub role: Role,
    pub name: String,
    pub email: String,
}

async fn resolve_principal(state: &AppState, headers: &HeaderMap) -> AppResult<Principal> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            AppError::Unauthorized("Access denied. Please sign in again to continue.".to_string())
        })?;

    let token = extract_token_from_header(auth_header)?;
    let claims = verify_token(token, &state.jwt_config())?;
    let user_id = claims.user_id()?;

    let user = state
        .repositories
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User no longer exists".to_string()))?;

    Ok(Principal {
        user_id: user.id,
        role: user.role(),
        name: user.name,
        email: user.email,
    })
}

/// Middleware de autenticación JWT
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let principal = resolve_principal(&state, request.headers()).await?;
    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

/// Autenticación opcional: un token inválido o ausente deja la petición anónima
pub async fn optional_authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if request.headers().contains_key(header::AUTHORIZATION) {
        if let Ok(principal) = resolve_principal(&state, request.headers()).await {
            request.extensions_mut().insert(principal);
        }
    }
    next.run(request).await
}

/// Estado del middleware de roles de una ruta
#[derive(Clone)]
pub struct RoleGate {
    authorization: AuthorizationService,
    roles: &'static [Role],
}

/// Middleware de roles; el `Principal` ya debe estar en las extensions
pub async fn restrict_to(
    State(gate): State<RoleGate>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (parts, body) = request.into_parts();
    let meta = RequestMeta::from_parts(&parts);
    let principal = parts.extensions.get::<Principal>();

    gate.authorization
        .require_role(principal, gate.roles, &meta)
        .await?;

    Ok(next.run(Request::from_parts(parts, body)).await)
}

/// Proteger un `MethodRouter`: autenticación primero, luego roles
pub fn guarded(
    state: &AppState,
    roles: &'static [Role],
    route: MethodRouter<AppState>,
) -> MethodRouter<AppState> {
    let gate = RoleGate {
        authorization: state.authorization.clone(),
        roles,
    };
    route
        .route_layer(from_fn_with_state(gate, restrict_to))
        .route_layer(from_fn_with_state(state.clone(), authenticate))
}

/// Sólo autenticación, sin restricción de rol
pub fn authenticated(state: &AppState, route: MethodRouter<AppState>) -> MethodRouter<AppState> {
    route.route_layer(from_fn_with_state(state.clone(), authenticate))
}

/// Sólo identifica al llamante si envía token
pub fn identified(state: &AppState, route: MethodRouter<AppState>) -> MethodRouter<AppState> {
    route.route_layer(from_fn_with_state(state.clone(), optional_authenticate))
}

#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Principal>().cloned().ok_or_else(|| {
            AppError::Unauthorized("Access denied. Please sign in again to continue.".to_string())
        })
    }
}
