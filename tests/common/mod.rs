//! Harness compartido por los tests de integración
//!
//! Store en memoria, gateway de pago guionado y un sender de correo que
//! guarda los mensajes. Las notificaciones se envían en línea para que los
//! tests puedan leerlas en cuanto vuelve la respuesta.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::http::{header, HeaderValue};
use axum_test::{TestRequest, TestServer};
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use school_transport::{
    config::environment::EnvironmentConfig,
    create_app_router,
    models::{
        plan::Plan,
        schedule::{Schedule, TimeSlot},
        travel::PaymentStatus,
        user::{Account, User},
    },
    repositories::Repositories,
    services::{
        email_service::{EmailMessage, EmailSender},
        notification_service::DispatchMode,
        payment_gateway::{
            CashInReceipt, EventFilter, PaymentEnvironment, PaymentGateway, TransactionEvent,
        },
    },
    utils::{
        errors::AppResult,
        jwt::generate_token,
        password::hash_password,
    },
    AppState,
};

pub const PASSWORD: &str = "secret123";
pub const MORNING: &str = "07:00 AM";
pub const AFTERNOON: &str = "02:00 PM";

/// Qué responde el gateway a las consultas de eventos
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GatewayScript {
    /// Evento exitoso a partir de la consulta n (1 = la primera)
    SucceedOnQuery(u32),
    /// Nunca aparece un evento
    Silent,
    /// El gateway reporta el cobro como fallido
    Fail,
}

#[derive(Default)]
struct GatewayInner {
    script: Option<GatewayScript>,
    issued: u32,
    queries: HashMap<String, u32>,
    cash_ins: Vec<(String, i64)>,
}

/// Gateway falso con comportamiento programable por test
pub struct FakeGateway {
    inner: Mutex<GatewayInner>,
}

impl FakeGateway {
    pub fn new(script: GatewayScript) -> Self {
        Self {
            inner: Mutex::new(GatewayInner {
                script: Some(script),
                ..Default::default()
            }),
        }
    }

    pub fn set_script(&self, script: GatewayScript) {
        let mut inner = self.inner.lock().unwrap();
        inner.script = Some(script);
        inner.queries.clear();
    }

    pub fn cash_ins(&self) -> Vec<(String, i64)> {
        self.inner.lock().unwrap().cash_ins.clone()
    }

    pub fn queries_for(&self, reference: &str) -> u32 {
        self.inner
            .lock()
            .unwrap()
            .queries
            .get(reference)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn cash_in(
        &self,
        phone_number: &str,
        amount: i64,
        _environment: PaymentEnvironment,
    ) -> AppResult<CashInReceipt> {
        let mut inner = self.inner.lock().unwrap();
        inner.issued += 1;
        inner.cash_ins.push((phone_number.to_string(), amount));
        Ok(CashInReceipt {
            reference: format!("ref-{}", inner.issued),
            status: PaymentStatus::Pending,
            amount,
        })
    }

    async fn query_events(&self, filter: &EventFilter) -> AppResult<Vec<TransactionEvent>> {
        let mut inner = self.inner.lock().unwrap();
        let count = {
            let counter = inner
                .queries
                .entry(filter.transaction_ref.clone())
                .or_insert(0);
            *counter += 1;
            *counter
        };

        let status = match inner.script.unwrap_or(GatewayScript::Silent) {
            GatewayScript::SucceedOnQuery(n) if count >= n => {
                PaymentStatus::Successful
            }
            GatewayScript::Fail => PaymentStatus::Failed,
            _ => return Ok(Vec::new()),
        };

        Ok(vec![TransactionEvent {
            reference: filter.transaction_ref.clone(),
            status,
            amount: 5000,
            client: Some("0788000000".to_string()),
            provider: Some("mtn".to_string()),
            created_at: Some(Utc::now()),
        }])
    }
}

/// Sender que guarda los correos en memoria
#[derive(Default)]
pub struct RecordingEmailSender {
    sent: Mutex<Vec<EmailMessage>>,
}

impl RecordingEmailSender {
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, address: &str) -> Vec<EmailMessage> {
        self.sent()
            .into_iter()
            .filter(|m| m.to.iter().any(|to| to == address))
            .collect()
    }
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send(&self, message: EmailMessage) -> AppResult<()> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub gateway: Arc<FakeGateway>,
    pub emails: Arc<RecordingEmailSender>,
}

pub fn test_config() -> EnvironmentConfig {
    let mut config = EnvironmentConfig::default();
    config.jwt_secret = "integration-test-secret".to_string();
    config.bcrypt_cost = 4;
    config.payment.poll_interval = Duration::from_millis(5);
    config.payment.poll_timeout = Duration::from_millis(200);
    config
}

pub fn spawn_app(script: GatewayScript) -> TestApp {
    let gateway = Arc::new(FakeGateway::new(script));
    let emails = Arc::new(RecordingEmailSender::default());
    let state = AppState::new(
        test_config(),
        Repositories::in_memory(),
        gateway.clone(),
        emails.clone(),
        DispatchMode::Inline,
    );
    let server = TestServer::new(create_app_router(state.clone())).unwrap();

    TestApp {
        server,
        state,
        gateway,
        emails,
    }
}

/// Añadir el bearer token a una petición
pub fn authed(request: TestRequest, token: &str) -> TestRequest {
    request.add_header(
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    )
}

/// Cuenta sembrada con su token
pub struct Seeded {
    pub user: User,
    pub token: String,
}

impl TestApp {
    pub async fn seed_account(&self, name: &str, email: &str, account: Account) -> Seeded {
        let hash = hash_password(PASSWORD.to_string(), 4).await.unwrap();
        let user = User::new(
            name.to_string(),
            email.to_string(),
            "0788000000".to_string(),
            hash,
            account,
        );
        let user = self.state.repositories.users.insert(user).await.unwrap();
        let token = generate_token(user.id, user.role(), &self.state.jwt_config()).unwrap();
        Seeded { user, token }
    }

    pub async fn seed_admin(&self) -> Seeded {
        self.seed_account("Admin", "admin@edumove.rw", Account::Admin).await
    }

    pub async fn seed_authority(&self) -> Seeded {
        self.seed_account("Ministry", "authority@edumove.rw", Account::Authority)
            .await
    }

    pub async fn seed_transporter(&self, email: &str) -> Seeded {
        self.seed_account(
            "Volcano Express",
            email,
            Account::Transporter {
                area_of_operations: vec!["South".to_string()],
            },
        )
        .await
    }

    pub async fn seed_school(&self, email: &str) -> Seeded {
        self.seed_account(
            "Groupe Scolaire Huye",
            email,
            Account::School {
                district: "Huye".to_string(),
                sector: "Ngoma".to_string(),
                cell: "Butare".to_string(),
                village: "Taba".to_string(),
            },
        )
        .await
    }

    pub async fn seed_plan(&self, destinations: &[&str]) -> Plan {
        let plan = Plan {
            id: Uuid::new_v4(),
            date: Utc.with_ymd_and_hms(2025, 1, 15, 6, 0, 0).unwrap(),
            destinations: destinations.iter().map(|d| d.to_string()).collect(),
            province: None,
            created_by: None,
            created_at: Utc::now(),
        };
        self.state.repositories.plans.insert(plan).await.unwrap()
    }

    /// Schedule Kigali → `destination` con franjas de mañana y tarde
    pub async fn seed_schedule(
        &self,
        plan: &Plan,
        transporter: &User,
        destination: &str,
        seats: u32,
    ) -> Schedule {
        let slot = |time: &str, bus: &str, hour: u32| TimeSlot {
            time: time.to_string(),
            slots: seats,
            bus_number: bus.to_string(),
            expected_arrival_time: Utc.with_ymd_and_hms(2025, 1, 15, hour, 0, 0).unwrap(),
        };
        let schedule = Schedule {
            id: Uuid::new_v4(),
            plan_id: plan.id,
            departure: "Kigali".to_string(),
            destination: destination.to_string(),
            price: 5000,
            transporter_id: transporter.id,
            time_slots: vec![slot(MORNING, "RAB 123 A", 10), slot(AFTERNOON, "RAB 456 B", 17)],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.state
            .repositories
            .schedules
            .insert(schedule)
            .await
            .unwrap()
    }

    /// Reservar por HTTP; devuelve el cuerpo completo
    pub async fn book(&self, schedule: &Schedule, school: &User, time: &str, guardian_email: &str) -> Value {
        let response = self
            .server
            .post("/api/v1/travels")
            .json(&travel_body(schedule.id, school.id, time, guardian_email))
            .await;
        response.json::<Value>()
    }

    /// Reservar y devolver el número de viaje (el pago debe confirmarse)
    pub async fn book_number(&self, schedule: &Schedule, school: &User, time: &str) -> String {
        let body = self
            .book(schedule, school, time, "guardian@example.com")
            .await;
        body["data"]["travelNumber"]
            .as_str()
            .unwrap_or_else(|| panic!("booking failed: {}", body))
            .to_string()
    }
}

pub fn travel_body(schedule: Uuid, school: Uuid, time: &str, guardian_email: &str) -> Value {
    json!({
        "guardian": {
            "name": "Jane Mukamana",
            "email": guardian_email,
            "phoneNumber": "0788123456",
            "address": "Kicukiro, Kigali"
        },
        "student": { "name": "Eric Habimana" },
        "school": school,
        "schedule": schedule,
        "departureTime": time
    })
}
