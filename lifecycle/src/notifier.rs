//! Job outcome notifications
//!
//! The scheduler reports batch outcomes through this sink; the request
//! layer can plug in email or chat delivery. The default sink logs.

use markt_core::MarketError;

pub trait JobNotifier: Send + Sync {
    fn job_succeeded(&self, job: &str, detail: &str);
    fn job_failed(&self, job: &str, error: &MarketError);
}

/// Notifier that writes to the log
pub struct LogNotifier;

impl JobNotifier for LogNotifier {
    fn job_succeeded(&self, job: &str, detail: &str) {
        tracing::info!("job {} succeeded: {}", job, detail);
    }

    fn job_failed(&self, job: &str, error: &MarketError) {
        tracing::error!("job {} failed: {}", job, error);
    }
}
