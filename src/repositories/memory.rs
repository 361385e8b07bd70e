//! Repositorios en memoria
//!
//! Respaldan las ejecuciones de desarrollo sin `DATABASE_URL` y los tests.
//! Cada operación toma el lock de escritura completo, así que las
//! comprobaciones de unicidad y los cambios de estado son atómicos.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    models::{
        activity_log::ActivityLog,
        plan::Plan,
        schedule::{Schedule, ScheduleQuery},
        travel::{Guardian, PaymentDetails, Student, Travel, TravelQuery, TravelStatus},
        user::{Role, User},
    },
    repositories::{
        ActivityLogRepository, PlanRepository, ScheduleRepository, TravelRepository,
        UserRepository,
    },
    utils::errors::{conflict_error, AppError, AppResult},
};

fn newest_first<T>(mut items: Vec<T>, created_at: impl Fn(&T) -> chrono::DateTime<Utc>) -> Vec<T> {
    items.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
    items
}

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<Uuid, User>>,
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert(&self, user: User) -> AppResult<User> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(conflict_error("User", "email", &user.email));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let email = email.trim();
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_all(&self, role: Option<Role>) -> AppResult<Vec<User>> {
        let users = self
            .users
            .read()
            .await
            .values()
            .filter(|u| role.map_or(true, |r| u.role() == r))
            .cloned()
            .collect();
        Ok(newest_first(users, |u| u.created_at))
    }

    async fn save(&self, user: &User) -> AppResult<()> {
        let mut users = self.users.write().await;
        if let Some(stored) = users.get_mut(&user.id) {
            *stored = user.clone();
            stored.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.users.write().await.remove(&id).is_some())
    }
}

#[derive(Default)]
pub struct InMemoryPlanRepository {
    plans: RwLock<HashMap<Uuid, Plan>>,
}

#[async_trait]
impl PlanRepository for InMemoryPlanRepository {
    async fn insert(&self, plan: Plan) -> AppResult<Plan> {
        self.plans.write().await.insert(plan.id, plan.clone());
        Ok(plan)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Plan>> {
        Ok(self.plans.read().await.get(&id).cloned())
    }

    async fn find_all(&self) -> AppResult<Vec<Plan>> {
        let plans = self.plans.read().await.values().cloned().collect();
        Ok(newest_first(plans, |p| p.date))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.plans.write().await.remove(&id).is_some())
    }
}

#[derive(Default)]
pub struct InMemoryScheduleRepository {
    schedules: RwLock<HashMap<Uuid, Schedule>>,
}

#[async_trait]
impl ScheduleRepository for InMemoryScheduleRepository {
    async fn insert(&self, schedule: Schedule) -> AppResult<Schedule> {
        self.schedules
            .write()
            .await
            .insert(schedule.id, schedule.clone());
        Ok(schedule)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Schedule>> {
        Ok(self.schedules.read().await.get(&id).cloned())
    }

    async fn find_all(&self, query: &ScheduleQuery) -> AppResult<Vec<Schedule>> {
        let schedules = self
            .schedules
            .read()
            .await
            .values()
            .filter(|s| query.matches(s))
            .cloned()
            .collect();
        Ok(newest_first(schedules, |s| s.created_at))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.schedules.write().await.remove(&id).is_some())
    }
}

fn active_in_slot(travels: &HashMap<Uuid, Travel>, schedule_id: Uuid, departure_time: &str) -> usize {
    travels
        .values()
        .filter(|t| {
            t.travel_details.schedule == schedule_id
                && t.travel_details.departure_time == departure_time
                && t.status != TravelStatus::Cancelled
        })
        .count()
}

#[derive(Default)]
pub struct InMemoryTravelRepository {
    travels: RwLock<HashMap<Uuid, Travel>>,
}

#[async_trait]
impl TravelRepository for InMemoryTravelRepository {
    async fn insert(&self, travel: Travel) -> AppResult<Travel> {
        let mut travels = self.travels.write().await;
        if travels
            .values()
            .any(|t| t.travel_number == travel.travel_number)
        {
            return Err(AppError::Conflict(format!(
                "Travel number '{}' already exists",
                travel.travel_number
            )));
        }
        travels.insert(travel.id, travel.clone());
        Ok(travel)
    }

    async fn insert_within_capacity(&self, travel: Travel, seats: u32) -> AppResult<Option<Travel>> {
        let mut travels = self.travels.write().await;
        let booked = active_in_slot(
            &travels,
            travel.travel_details.schedule,
            &travel.travel_details.departure_time,
        );
        if booked >= seats as usize {
            return Ok(None);
        }
        if travels
            .values()
            .any(|t| t.travel_number == travel.travel_number)
        {
            return Err(AppError::Conflict(format!(
                "Travel number '{}' already exists",
                travel.travel_number
            )));
        }
        travels.insert(travel.id, travel.clone());
        Ok(Some(travel))
    }

    async fn exists_by_travel_number(&self, travel_number: &str) -> AppResult<bool> {
        Ok(self
            .travels
            .read()
            .await
            .values()
            .any(|t| t.travel_number == travel_number))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Travel>> {
        Ok(self.travels.read().await.get(&id).cloned())
    }

    async fn find_by_travel_number(&self, travel_number: &str) -> AppResult<Option<Travel>> {
        Ok(self
            .travels
            .read()
            .await
            .values()
            .find(|t| t.travel_number == travel_number)
            .cloned())
    }

    async fn find_all(&self, query: &TravelQuery) -> AppResult<Vec<Travel>> {
        let travels = self
            .travels
            .read()
            .await
            .values()
            .filter(|t| query.matches(t))
            .cloned()
            .collect();
        Ok(newest_first(travels, |t| t.created_at))
    }

    async fn count_active_bookings(&self, schedule_id: Uuid, departure_time: &str) -> AppResult<i64> {
        let travels = self.travels.read().await;
        Ok(active_in_slot(&travels, schedule_id, departure_time) as i64)
    }

    async fn update_payment(&self, id: Uuid, payment: &PaymentDetails) -> AppResult<Option<Travel>> {
        let mut travels = self.travels.write().await;
        Ok(travels.get_mut(&id).map(|travel| {
            travel.travel_details.payment_details = Some(payment.clone());
            travel.updated_at = Utc::now();
            travel.clone()
        }))
    }

    async fn update_contacts(
        &self,
        id: Uuid,
        guardian: Option<&Guardian>,
        student: Option<&Student>,
    ) -> AppResult<Option<Travel>> {
        let mut travels = self.travels.write().await;
        Ok(travels.get_mut(&id).map(|travel| {
            if let Some(guardian) = guardian {
                travel.guardian = guardian.clone();
            }
            if let Some(student) = student {
                travel.student = student.clone();
            }
            travel.updated_at = Utc::now();
            travel.clone()
        }))
    }

    async fn update_status(
        &self,
        id: Uuid,
        from: &[TravelStatus],
        to: TravelStatus,
    ) -> AppResult<Option<Travel>> {
        let mut travels = self.travels.write().await;
        match travels.get_mut(&id) {
            Some(travel) if from.contains(&travel.status) => {
                travel.status = to;
                travel.updated_at = Utc::now();
                Ok(Some(travel.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn bulk_update_status(
        &self,
        schedule_id: Uuid,
        departure_time: &str,
        from: &[TravelStatus],
        to: TravelStatus,
    ) -> AppResult<Vec<Travel>> {
        let mut travels = self.travels.write().await;
        let now = Utc::now();
        let mut updated: Vec<Travel> = travels
            .values_mut()
            .filter(|t| {
                t.travel_details.schedule == schedule_id
                    && t.travel_details.departure_time == departure_time
                    && from.contains(&t.status)
            })
            .map(|t| {
                t.status = to;
                t.updated_at = now;
                t.clone()
            })
            .collect();
        updated.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.travels.write().await.remove(&id).is_some())
    }
}

#[derive(Default)]
pub struct InMemoryActivityLogRepository {
    entries: RwLock<Vec<ActivityLog>>,
}

#[async_trait]
impl ActivityLogRepository for InMemoryActivityLogRepository {
    async fn insert(&self, entry: ActivityLog) -> AppResult<()> {
        self.entries.write().await.push(entry);
        Ok(())
    }

    async fn find_recent(&self, limit: i64) -> AppResult<Vec<ActivityLog>> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .rev()
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::travel::tests_support::sample_travel;

    #[tokio::test]
    async fn test_duplicate_travel_number_is_conflict() {
        let repo = InMemoryTravelRepository::default();
        let first = sample_travel();
        let mut second = sample_travel();
        second.travel_number = first.travel_number.clone();

        repo.insert(first).await.unwrap();
        let err = repo.insert(second).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_bulk_update_only_touches_matching_slot_and_status() {
        let repo = InMemoryTravelRepository::default();
        let schedule = Uuid::new_v4();

        let mut numbers = 0;
        let mut make = |time: &str, status: TravelStatus| {
            numbers += 1;
            let mut travel = sample_travel();
            travel.travel_number = format!("TR-000000-{}", numbers);
            travel.travel_details.schedule = schedule;
            travel.travel_details.departure_time = time.to_string();
            travel.status = status;
            travel
        };

        for travel in [
            make("07:00 AM", TravelStatus::Boarded),
            make("07:00 AM", TravelStatus::Pending),
            make("07:00 AM", TravelStatus::Cancelled),
            make("09:00 AM", TravelStatus::Boarded),
        ] {
            repo.insert(travel).await.unwrap();
        }

        let updated = repo
            .bulk_update_status(
                schedule,
                "07:00 AM",
                &TravelStatus::sources_of(TravelStatus::ArrivedAtDestination),
                TravelStatus::ArrivedAtDestination,
            )
            .await
            .unwrap();

        assert_eq!(updated.len(), 2);
        let other_slot = repo
            .find_all(&TravelQuery {
                departure_time: Some("09:00 AM".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(other_slot[0].status, TravelStatus::Boarded);
        assert_eq!(repo.count_active_bookings(schedule, "07:00 AM").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_update_status_is_conditional() {
        let repo = InMemoryTravelRepository::default();
        let travel = repo.insert(sample_travel()).await.unwrap();

        let boarded = repo
            .update_status(travel.id, &[TravelStatus::Pending], TravelStatus::Boarded)
            .await
            .unwrap();
        assert_eq!(boarded.unwrap().status, TravelStatus::Boarded);

        let again = repo
            .update_status(travel.id, &[TravelStatus::Pending], TravelStatus::Boarded)
            .await
            .unwrap();
        assert!(again.is_none());
    }

    #[tokio::test]
    async fn test_insert_within_capacity_never_oversells() {
        let repo = std::sync::Arc::new(InMemoryTravelRepository::default());
        let schedule = Uuid::new_v4();

        let handles = (0..10)
            .map(|i| {
                let repo = repo.clone();
                let mut travel = sample_travel();
                travel.travel_number = format!("TR-000000-{}", i);
                travel.travel_details.schedule = schedule;
                tokio::spawn(async move { repo.insert_within_capacity(travel, 3).await })
            })
            .collect::<Vec<_>>();

        let mut inserted = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap().is_some() {
                inserted += 1;
            }
        }
        assert_eq!(inserted, 3);
        assert_eq!(repo.count_active_bookings(schedule, "07:00 AM").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_cancelled_bookings_free_their_seat() {
        let repo = InMemoryTravelRepository::default();
        let mut cancelled = sample_travel();
        cancelled.status = TravelStatus::Cancelled;
        let schedule = cancelled.travel_details.schedule;
        repo.insert(cancelled).await.unwrap();

        let mut travel = sample_travel();
        travel.travel_number = "TR-000000-1".to_string();
        travel.travel_details.schedule = schedule;
        assert!(repo.insert_within_capacity(travel, 1).await.unwrap().is_some());

        let mut late = sample_travel();
        late.travel_number = "TR-000000-2".to_string();
        late.travel_details.schedule = schedule;
        assert!(repo.insert_within_capacity(late, 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_payment_keeps_current_status() {
        let repo = InMemoryTravelRepository::default();
        let travel = repo.insert(sample_travel()).await.unwrap();
        repo.update_status(travel.id, &[TravelStatus::Pending], TravelStatus::Boarded)
            .await
            .unwrap();

        let payment = PaymentDetails {
            status: crate::models::travel::PaymentStatus::Successful,
            data: crate::models::travel::PaymentData {
                reference: "ref-1".to_string(),
                amount: 5000,
                client: None,
                provider: Some("mtn".to_string()),
                created_at: None,
            },
        };
        let updated = repo.update_payment(travel.id, &payment).await.unwrap().unwrap();

        assert_eq!(updated.status, TravelStatus::Boarded);
        assert!(updated.is_payment_confirmed());
        assert!(repo
            .update_payment(Uuid::new_v4(), &payment)
            .await
            .unwrap()
            .is_none());
    }
}
