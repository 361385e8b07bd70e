//! Generación de números de viaje
//!
//! Formato `TR-<últimos 6 dígitos de epoch millis>-<aleatorio 0..=9999>`.
//! La consulta previa sólo reduce reintentos; la restricción UNIQUE de la
//! tabla `travels` es la garantía real.

use chrono::Utc;
use rand::Rng;
use tracing::debug;

use crate::{repositories::TravelRepository, utils::errors::AppResult};

pub fn format_travel_number(epoch_millis: i64, random: u32) -> String {
    format!(
        "TR-{:06}-{}",
        epoch_millis.rem_euclid(1_000_000),
        random % 10_000
    )
}

/// Candidato nuevo a partir del reloj y del RNG del hilo
pub fn generate_candidate() -> String {
    let random = rand::thread_rng().gen_range(0..10_000);
    format_travel_number(Utc::now().timestamp_millis(), random)
}

/// Primer número libre, regenerando ante colisión
pub async fn next_unique(repo: &dyn TravelRepository) -> AppResult<String> {
    next_unique_with(repo, generate_candidate).await
}

pub async fn next_unique_with<F>(repo: &dyn TravelRepository, mut candidate: F) -> AppResult<String>
where
    F: FnMut() -> String,
{
    loop {
        let number = candidate();
        if !repo.exists_by_travel_number(&number).await? {
            return Ok(number);
        }
        debug!("🔁 Travel number {} already taken, regenerating", number);
        tokio::task::yield_now().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::travel::tests_support::sample_travel,
        repositories::memory::InMemoryTravelRepository,
        utils::validation::is_travel_number,
    };

    #[test]
    fn test_format_keeps_last_six_digits() {
        assert_eq!(format_travel_number(1_736_920_123_456, 42), "TR-123456-42");
        assert_eq!(format_travel_number(1_000_000_000_007, 9_999), "TR-000007-9999");
        assert_eq!(format_travel_number(5, 10_000), "TR-000005-0");
    }

    #[test]
    fn test_generated_candidates_match_pattern() {
        for _ in 0..100 {
            assert!(is_travel_number(&generate_candidate()));
        }
    }

    #[tokio::test]
    async fn test_regenerates_on_collision() {
        let repo = InMemoryTravelRepository::default();
        let mut taken = sample_travel();
        taken.travel_number = "TR-111111-1".to_string();
        repo.insert(taken).await.unwrap();

        let mut candidates = vec!["TR-111111-1", "TR-111111-1", "TR-222222-2"].into_iter();
        let number = next_unique_with(&repo, || candidates.next().unwrap().to_string())
            .await
            .unwrap();

        assert_eq!(number, "TR-222222-2");
    }
}
