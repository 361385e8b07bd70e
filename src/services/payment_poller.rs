//! Espera acotada de la confirmación de pago
//!
//! Reintenta una consulta con cadencia fija hasta que devuelva un valor o
//! se agote el plazo. Corre dentro de la tarea de la petición, sin timers
//! globales.

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep_until, timeout_at, Instant};
use tracing::{debug, warn};

use crate::utils::errors::AppResult;

#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    pub interval: Duration,
    pub timeout: Duration,
}

#[derive(Debug, PartialEq)]
pub enum PollOutcome<T> {
    Confirmed(T),
    TimedOut { attempts: u32 },
}

/// Consultar cada `interval` hasta obtener `Some` o llegar a `timeout`.
///
/// Los errores de la consulta se registran y el sondeo continúa; el gateway
/// puede fallar de forma transitoria.
pub async fn poll_until<T, F, Fut>(config: PollConfig, mut query: F) -> PollOutcome<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<Option<T>>>,
{
    let deadline = Instant::now() + config.timeout;
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        match timeout_at(deadline, query()).await {
            Ok(Ok(Some(value))) => {
                debug!("✅ Confirmed after {} attempt(s)", attempts);
                return PollOutcome::Confirmed(value);
            }
            Ok(Ok(None)) => {}
            Ok(Err(e)) => warn!("⚠️ Poll attempt {} failed: {}", attempts, e),
            Err(_) => return PollOutcome::TimedOut { attempts },
        }

        let now = Instant::now();
        if now >= deadline {
            return PollOutcome::TimedOut { attempts };
        }
        sleep_until((now + config.interval).min(deadline)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::errors::AppError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn config() -> PollConfig {
        PollConfig {
            interval: Duration::from_secs(2),
            timeout: Duration::from_secs(20),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirms_when_value_appears() {
        let calls = Arc::new(AtomicU32::new(0));
        let start = Instant::now();

        let outcome = poll_until(config(), || {
            let calls = calls.clone();
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                Ok(if n == 3 { Some("ref-1") } else { None })
            }
        })
        .await;

        assert_eq!(outcome, PollOutcome::Confirmed("ref-1"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(start.elapsed() >= Duration::from_secs(4));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_after_deadline() {
        let start = Instant::now();

        let outcome: PollOutcome<()> = poll_until(config(), || async { Ok(None) }).await;

        assert!(matches!(outcome, PollOutcome::TimedOut { attempts } if attempts == 11));
        assert!(start.elapsed() >= Duration::from_secs(20));
        assert!(start.elapsed() < Duration::from_secs(21));
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_errors_do_not_stop_polling() {
        let calls = Arc::new(AtomicU32::new(0));

        let outcome = poll_until(config(), || {
            let calls = calls.clone();
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Err(AppError::ExternalApi("gateway down".to_string()))
                } else {
                    Ok(Some(n))
                }
            }
        })
        .await;

        assert_eq!(outcome, PollOutcome::Confirmed(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_query_is_cut_at_deadline() {
        let start = Instant::now();

        let outcome: PollOutcome<()> = poll_until(config(), || async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(None)
        })
        .await;

        assert_eq!(outcome, PollOutcome::TimedOut { attempts: 1 });
        assert!(start.elapsed() >= Duration::from_secs(20));
        assert!(start.elapsed() < Duration::from_secs(21));
    }
}
