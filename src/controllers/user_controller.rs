//! Controlador de cuentas
//!
//! Alta de cuentas por variante. Transportistas y escuelas reciben un
//! correo de bienvenida con su contraseña inicial.

use tracing::info;
use uuid::Uuid;

use crate::{
    dto::user_dto::{
        AccountBaseRequest, CreateSchoolRequest, CreateTransporterRequest, CreateUserRequest,
    },
    models::user::{Account, Role, User},
    state::AppState,
    utils::{
        errors::{not_found_error, validation_error, AppResult},
        password::hash_password,
    },
};

pub struct UserController {
    state: AppState,
}

impl UserController {
    pub fn new(state: &AppState) -> Self {
        Self {
            state: state.clone(),
        }
    }

    async fn create_account(&self, base: AccountBaseRequest, account: Account) -> AppResult<User> {
        let password = base
            .password
            .unwrap_or_else(|| self.state.config.default_password.clone());
        let password_hash = hash_password(password.clone(), self.state.config.bcrypt_cost).await?;

        let user = User::new(
            base.name.trim().to_string(),
            base.email,
            base.phone_number.trim().to_string(),
            password_hash,
            account,
        );
        let user = self.state.repositories.users.insert(user).await?;
        info!("👤 Created {} account {}", user.role(), user.email);

        self.state.notifier.welcome(&user, &password).await;
        Ok(user)
    }

    pub async fn create_user(&self, request: CreateUserRequest) -> AppResult<User> {
        let account = match request.role.unwrap_or(Role::User) {
            Role::User => Account::User,
            Role::Admin => Account::Admin,
            Role::Authority => Account::Authority,
            Role::Transporter | Role::School => {
                return Err(validation_error(
                    "role",
                    "transporters and schools are created through their own endpoints",
                ))
            }
        };
        self.create_account(request.base, account).await
    }

    pub async fn create_transporter(&self, request: CreateTransporterRequest) -> AppResult<User> {
        let account = Account::Transporter {
            area_of_operations: request
                .area_of_operations
                .iter()
                .map(|area| area.trim().to_string())
                .collect(),
        };
        self.create_account(request.base, account).await
    }

    pub async fn create_school(&self, request: CreateSchoolRequest) -> AppResult<User> {
        let account = Account::School {
            district: request.district.trim().to_string(),
            sector: request.sector.trim().to_string(),
            cell: request.cell.trim().to_string(),
            village: request.village.trim().to_string(),
        };
        self.create_account(request.base, account).await
    }

    pub async fn list(&self, role: Option<Role>) -> AppResult<Vec<User>> {
        self.state.repositories.users.find_all(role).await
    }

    pub async fn get(&self, id: Uuid) -> AppResult<User> {
        self.state
            .repositories
            .users
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("User", &id.to_string()))
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        if !self.state.repositories.users.delete(id).await? {
            return Err(not_found_error("User", &id.to_string()));
        }
        info!("🗑️ Deleted user {}", id);
        Ok(())
    }
}
