//! Controlador de viajes
//!
//! Ciclo de vida completo de un viaje: reserva con cobro y espera de la
//! confirmación, conciliación posterior, embarque, llegada en bloque al
//! destino, llegada a la escuela y edición administrativa.
//!
//! Cada transición pasa por `TravelStatus::can_transition_to` y se aplica
//! con una actualización condicionada al estado actual, de modo que dos
//! peticiones concurrentes no pueden retroceder un viaje.

use std::collections::HashMap;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dto::travel_dto::{
        BulkArrivalResponse, CreateTravelRequest, TravelFilter, TravelResponse,
        UpdateTravelRequest,
    },
    middleware::{auth::Principal, request_meta::RequestMeta},
    models::{
        travel::{
            Guardian, PaymentData, PaymentDetails, PaymentStatus, PlanSnapshot, Student, Travel,
            TravelDetails, TravelQuery, TravelStatus, TransporterSnapshot,
        },
        user::{Role, User},
    },
    services::{
        payment_gateway::{find_successful, EventFilter, TransactionEvent},
        payment_poller::{poll_until, PollOutcome},
        travel_number,
    },
    state::AppState,
    utils::{
        errors::{not_found_error, validation_error, AppError, AppResult},
        validation::validate_date,
    },
};

#[derive(Clone)]
pub struct TravelController {
    state: AppState,
}

impl TravelController {
    pub fn new(state: &AppState) -> Self {
        Self {
            state: state.clone(),
        }
    }

    /// Reservar un viaje y esperar la confirmación del pago.
    ///
    /// El registro se guarda en `Pending` antes de sondear el gateway. Si el
    /// plazo vence, el viaje queda pendiente para `verify_transaction`.
    pub async fn create_travel(&self, request: CreateTravelRequest) -> AppResult<TravelResponse> {
        let repos = &self.state.repositories;

        let schedule_id = request
            .schedule
            .ok_or_else(|| validation_error("schedule", "is required"))?;
        let school_id = request
            .school
            .ok_or_else(|| validation_error("school", "is required"))?;

        let schedule = repos
            .schedules
            .find_by_id(schedule_id)
            .await?
            .ok_or_else(|| not_found_error("Schedule", &schedule_id.to_string()))?;
        let slot = schedule
            .find_slot(request.departure_time.trim())
            .cloned()
            .ok_or_else(|| {
                validation_error("departure_time", "is not one of the schedule's time slots")
            })?;
        let plan = repos
            .plans
            .find_by_id(schedule.plan_id)
            .await?
            .ok_or_else(|| not_found_error("Plan", &schedule.plan_id.to_string()))?;
        let transporter = repos
            .users
            .find_by_id(schedule.transporter_id)
            .await?
            .ok_or_else(|| not_found_error("Transporter", &schedule.transporter_id.to_string()))?;
        let school = repos
            .users
            .find_by_id(school_id)
            .await?
            .ok_or_else(|| not_found_error("School", &school_id.to_string()))?;
        if school.role() != Role::School {
            return Err(validation_error("school", "must reference a school account"));
        }

        let booked = repos
            .travels
            .count_active_bookings(schedule.id, &slot.time)
            .await?;
        if booked >= i64::from(slot.slots) {
            return Err(no_seats_left(&slot.time));
        }

        let guardian = Guardian::from(request.guardian);
        let payer = request
            .payer_phone_number
            .map(|p| p.trim().to_string())
            .unwrap_or_else(|| guardian.phone_number.clone());

        let receipt = self
            .state
            .payment_gateway
            .cash_in(&payer, schedule.price, self.state.config.payment_environment())
            .await?;
        info!(
            "💸 Cash-in {} requested for {} RWF",
            receipt.reference, schedule.price
        );

        let now = Utc::now();
        let travel = Travel {
            id: Uuid::new_v4(),
            travel_details: TravelDetails {
                plan: PlanSnapshot {
                    id: plan.id,
                    date: plan.date,
                },
                departure: schedule.departure.clone(),
                destination: schedule.destination.clone(),
                price: schedule.price,
                transporter: TransporterSnapshot {
                    id: transporter.id,
                    name: transporter.name.clone(),
                    contact: transporter.phone_number.clone(),
                    bus_number: slot.bus_number.clone(),
                },
                schedule: schedule.id,
                departure_time: slot.time.clone(),
                expected_arrival_time: slot.expected_arrival_time,
                payment_details: Some(PaymentDetails {
                    status: PaymentStatus::Pending,
                    data: PaymentData {
                        reference: receipt.reference.clone(),
                        amount: receipt.amount,
                        client: Some(payer),
                        provider: None,
                        created_at: None,
                    },
                }),
            },
            guardian,
            student: Student {
                name: request.student.name.trim().to_string(),
            },
            school: school.id,
            status: TravelStatus::Pending,
            travel_number: String::new(),
            created_at: now,
            updated_at: now,
        };
        let travel = self
            .insert_with_unique_number(travel, slot.slots)
            .await?
            .ok_or_else(|| no_seats_left(&slot.time))?;
        info!(
            "🎟️ Travel {} recorded as Pending, waiting for payment {}",
            travel.travel_number, receipt.reference
        );

        // Sólo se escribe el pago; el estado pudo avanzar durante el sondeo
        let travel = match self.wait_for_payment(&receipt.reference).await {
            PollOutcome::Confirmed(event) if event.is_successful() => {
                let travel = self
                    .record_payment(&travel, &event.to_payment_details())
                    .await?;
                info!("✅ Payment confirmed for travel {}", travel.travel_number);
                travel
            }
            PollOutcome::Confirmed(event) => {
                self.record_payment(&travel, &event.to_payment_details())
                    .await?;
                return Err(AppError::PaymentFailed(format!(
                    "The payment for travel {} was declined",
                    travel.travel_number
                )));
            }
            PollOutcome::TimedOut { attempts } => {
                warn!(
                    "⏱️ No confirmation for {} after {} attempt(s)",
                    travel.travel_number, attempts
                );
                return Err(AppError::PaymentTimeout {
                    travel_number: travel.travel_number,
                    waited_secs: self.state.config.payment.poll_timeout.as_secs(),
                });
            }
        };

        self.state.notifier.travel_created(&travel).await;
        Ok(TravelResponse::new(travel, Some(&school)))
    }

    /// Número único y plaza libre; `None` si la franja se llenó entretanto.
    /// La restricción UNIQUE también puede rechazar el insert.
    async fn insert_with_unique_number(
        &self,
        mut travel: Travel,
        seats: u32,
    ) -> AppResult<Option<Travel>> {
        let travels = self.state.repositories.travels.as_ref();
        loop {
            travel.travel_number = travel_number::next_unique(travels).await?;
            match travels.insert_within_capacity(travel.clone(), seats).await {
                Ok(saved) => return Ok(saved),
                Err(AppError::Conflict(_)) => {
                    warn!("🔁 Travel number {} lost a race, retrying", travel.travel_number);
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn record_payment(&self, travel: &Travel, payment: &PaymentDetails) -> AppResult<Travel> {
        self.state
            .repositories
            .travels
            .update_payment(travel.id, payment)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Travel with number '{}' not found",
                    travel.travel_number
                ))
            })
    }

    /// Sondear hasta un evento final (exitoso o fallido) para la referencia
    async fn wait_for_payment(&self, reference: &str) -> PollOutcome<TransactionEvent> {
        let gateway = self.state.payment_gateway.clone();
        let filter = EventFilter {
            transaction_ref: reference.to_string(),
        };

        poll_until(self.state.poll_config(), || {
            let gateway = gateway.clone();
            let filter = filter.clone();
            async move {
                let events = gateway.query_events(&filter).await?;
                let matching = events
                    .into_iter()
                    .filter(|e| e.reference == filter.transaction_ref)
                    .collect::<Vec<_>>();
                Ok(matching
                    .iter()
                    .find(|e| e.is_successful())
                    .or_else(|| {
                        matching
                            .iter()
                            .find(|e| e.status == PaymentStatus::Failed)
                    })
                    .cloned())
            }
        })
        .await
    }

    /// Conciliar un pago pendiente con una única consulta al gateway
    pub async fn verify_transaction(&self, travel_number: &str) -> AppResult<TravelResponse> {
        let travel = self.find_by_number(travel_number).await?;
        if travel.is_payment_confirmed() {
            return self.respond(travel).await;
        }

        let reference = travel
            .payment_reference()
            .ok_or_else(|| {
                AppError::BadRequest(format!(
                    "Travel {} has no payment to verify",
                    travel.travel_number
                ))
            })?
            .to_string();

        let events = self
            .state
            .payment_gateway
            .query_events(&EventFilter {
                transaction_ref: reference.clone(),
            })
            .await?;

        let event = find_successful(&events, &reference).ok_or_else(|| {
            AppError::PaymentFailed(format!(
                "Payment {} has not been confirmed by the provider",
                reference
            ))
        })?;

        let travel = self
            .record_payment(&travel, &event.to_payment_details())
            .await?;
        info!("✅ Payment reconciled for travel {}", travel.travel_number);

        self.state.notifier.travel_created(&travel).await;
        self.respond(travel).await
    }

    /// Embarque, sólo por el transportista del viaje
    pub async fn confirm_boarding(
        &self,
        principal: &Principal,
        travel_number: &str,
        meta: &RequestMeta,
    ) -> AppResult<TravelResponse> {
        let travel = self.find_by_number(travel_number).await?;
        self.state
            .authorization
            .require_owner(principal, travel.transporter_id(), meta, "travel")
            .await?;

        let travel = self.transition(travel, TravelStatus::Boarded).await?;
        let school = self.find_school(travel.school).await?;
        self.state
            .notifier
            .status_changed(&travel, school.as_ref().map(|s| s.email.as_str()))
            .await;

        Ok(TravelResponse::new(travel, school.as_ref()))
    }

    /// Llegada al destino de todos los viajes de una franja
    pub async fn arrived_at_destination(
        &self,
        principal: &Principal,
        schedule_id: Uuid,
        time_slot: Option<String>,
        meta: &RequestMeta,
    ) -> AppResult<BulkArrivalResponse> {
        let time_slot = time_slot
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| validation_error("timeSlot", "is required"))?;

        let schedule = self
            .state
            .repositories
            .schedules
            .find_by_id(schedule_id)
            .await?
            .ok_or_else(|| not_found_error("Schedule", &schedule_id.to_string()))?;
        self.state
            .authorization
            .require_owner(principal, schedule.transporter_id, meta, "schedule")
            .await?;
        if schedule.find_slot(&time_slot).is_none() {
            return Err(validation_error(
                "timeSlot",
                "is not one of the schedule's time slots",
            ));
        }

        let target = TravelStatus::ArrivedAtDestination;
        let updated = self
            .state
            .repositories
            .travels
            .bulk_update_status(
                schedule.id,
                &time_slot,
                &TravelStatus::sources_of(target),
                target,
            )
            .await?;
        info!(
            "🏁 {} travel(s) of schedule {} at {} arrived at destination",
            updated.len(),
            schedule.id,
            time_slot
        );

        let schools = self.schools_for(&updated).await?;
        let notifications: Vec<(Travel, Option<String>)> = updated
            .iter()
            .map(|t| (t.clone(), schools.get(&t.school).map(|s| s.email.clone())))
            .collect();
        self.state.notifier.statuses_changed(&notifications).await;

        Ok(BulkArrivalResponse {
            schedule_id: schedule.id,
            time_slot,
            updated: updated.len(),
            travels: updated
                .into_iter()
                .map(|t| {
                    let school = schools.get(&t.school);
                    TravelResponse::new(t, school)
                })
                .collect(),
        })
    }

    /// Llegada a la escuela, sólo por la escuela del viaje
    pub async fn arrived_at_school(
        &self,
        principal: &Principal,
        travel_number: &str,
        meta: &RequestMeta,
    ) -> AppResult<TravelResponse> {
        let travel = self.find_by_number(travel_number).await?;
        self.state
            .authorization
            .require_owner(principal, travel.school, meta, "travel")
            .await?;

        let travel = self.transition(travel, TravelStatus::ArrivedAtSchool).await?;
        self.state.notifier.status_changed(&travel, None).await;
        self.respond(travel).await
    }

    /// Listado filtrado; transportistas y escuelas sólo ven lo suyo
    pub async fn get_all_travels(
        &self,
        principal: &Principal,
        filter: TravelFilter,
    ) -> AppResult<Vec<TravelResponse>> {
        let date = match filter.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
            Some(date) => Some(
                validate_date(date)
                    .map_err(|_| validation_error("date", "must use the YYYY-MM-DD format"))?,
            ),
            None => None,
        };

        let mut query = TravelQuery {
            destination: filter.destination.filter(|d| !d.trim().is_empty()),
            date,
            departure_time: filter.time_slot.filter(|t| !t.trim().is_empty()),
            schedule_id: filter.schedule_id,
            transporter_id: None,
            school_id: None,
        };
        match principal.role {
            Role::Transporter => query.transporter_id = Some(principal.user_id),
            Role::School => query.school_id = Some(principal.user_id),
            _ => {}
        }

        let travels = self.state.repositories.travels.find_all(&query).await?;
        let schools = self.schools_for(&travels).await?;
        Ok(travels
            .into_iter()
            .map(|t| {
                let school = schools.get(&t.school);
                TravelResponse::new(t, school)
            })
            .collect())
    }

    pub async fn get_travel(&self, travel_number: &str) -> AppResult<TravelResponse> {
        let travel = self.find_by_number(travel_number).await?;
        self.respond(travel).await
    }

    /// Edición administrativa; el estado sigue sujeto a la máquina de estados
    pub async fn update_travel(&self, id: Uuid, request: UpdateTravelRequest) -> AppResult<TravelResponse> {
        let repos = &self.state.repositories;
        let mut travel = repos
            .travels
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Travel", &id.to_string()))?;

        let mut status_changed = false;
        if let Some(status) = request.status {
            if status != travel.status {
                travel = self.transition(travel, status).await?;
                status_changed = true;
            }
        }

        let guardian = request.guardian.map(Guardian::from);
        let student = request.student.map(|s| Student {
            name: s.name.trim().to_string(),
        });
        if guardian.is_some() || student.is_some() {
            travel = repos
                .travels
                .update_contacts(id, guardian.as_ref(), student.as_ref())
                .await?
                .ok_or_else(|| not_found_error("Travel", &id.to_string()))?;
        }

        let school = self.find_school(travel.school).await?;
        if status_changed {
            info!("✏️ Travel {} set to {}", travel.travel_number, travel.status);
            self.state
                .notifier
                .status_changed(&travel, school.as_ref().map(|s| s.email.as_str()))
                .await;
        }
        Ok(TravelResponse::new(travel, school.as_ref()))
    }

    pub async fn delete_travel(&self, id: Uuid) -> AppResult<()> {
        if !self.state.repositories.travels.delete(id).await? {
            return Err(not_found_error("Travel", &id.to_string()));
        }
        info!("🗑️ Deleted travel {}", id);
        Ok(())
    }

    async fn find_by_number(&self, travel_number: &str) -> AppResult<Travel> {
        self.state
            .repositories
            .travels
            .find_by_travel_number(travel_number)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Travel with number '{}' not found", travel_number))
            })
    }

    /// Aplicar `next` sólo si el estado guardado todavía lo permite
    async fn transition(&self, travel: Travel, next: TravelStatus) -> AppResult<Travel> {
        if !travel.status.can_transition_to(next) {
            return Err(illegal_transition(&travel, next));
        }

        let updated = self
            .state
            .repositories
            .travels
            .update_status(travel.id, &TravelStatus::sources_of(next), next)
            .await?
            .ok_or_else(|| {
                AppError::Conflict(format!(
                    "Travel {} changed status concurrently",
                    travel.travel_number
                ))
            })?;

        info!("🚦 Travel {} is now {}", updated.travel_number, updated.status);
        Ok(updated)
    }

    async fn find_school(&self, id: Uuid) -> AppResult<Option<User>> {
        self.state.repositories.users.find_by_id(id).await
    }

    async fn schools_for(&self, travels: &[Travel]) -> AppResult<HashMap<Uuid, User>> {
        let mut schools = HashMap::new();
        for travel in travels {
            if schools.contains_key(&travel.school) {
                continue;
            }
            if let Some(school) = self.find_school(travel.school).await? {
                schools.insert(travel.school, school);
            }
        }
        Ok(schools)
    }

    async fn respond(&self, travel: Travel) -> AppResult<TravelResponse> {
        let school = self.find_school(travel.school).await?;
        Ok(TravelResponse::new(travel, school.as_ref()))
    }
}

fn no_seats_left(departure_time: &str) -> AppError {
    AppError::Conflict(format!("No seats left on the {} departure", departure_time))
}

fn illegal_transition(travel: &Travel, next: TravelStatus) -> AppError {
    AppError::Conflict(format!(
        "Travel {} cannot move from '{}' to '{}'",
        travel.travel_number, travel.status, next
    ))
}
