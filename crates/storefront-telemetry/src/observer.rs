//! Dispatch observer backed by `tracing` and `metrics`.

use storefront_core::{DispatchRecord, ErrorKind, Observer, ServiceError};

use crate::metrics::record_request;

/// Logs every dispatch and records the standard request metrics.
///
/// Client errors are logged at `warn` with their message. Upstream and
/// internal failures are logged at `error` with the full source chain,
/// which never reaches the client.
#[derive(Debug, Clone, Copy, Default)]
pub struct TelemetryObserver;

impl TelemetryObserver {
    /// Creates a new observer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn operation<'a>(record: &'a DispatchRecord<'_>) -> &'a str {
    record.ctx.operation_id().unwrap_or("unknown")
}

impl Observer for TelemetryObserver {
    fn dispatch_succeeded(&self, record: &DispatchRecord<'_>) {
        let operation = operation(record);
        tracing::info!(
            request_id = %record.ctx.request_id(),
            operation_id = operation,
            http.status_code = record.status,
            duration_ms = elapsed_ms(record),
            "request completed"
        );
        record_request(operation, record.status, "ok", record.elapsed);
    }

    fn dispatch_failed(&self, record: &DispatchRecord<'_>, error: &ServiceError) {
        let operation = operation(record);
        let kind = error.kind();

        match kind {
            ErrorKind::Validation | ErrorKind::NotFound | ErrorKind::Timeout => {
                tracing::warn!(
                    request_id = %record.ctx.request_id(),
                    operation_id = operation,
                    http.status_code = record.status,
                    duration_ms = elapsed_ms(record),
                    error.kind = %kind,
                    error.message = error.message(),
                    "request failed"
                );
            }
            ErrorKind::Upstream | ErrorKind::Internal => {
                let detail = error.detail().unwrap_or_default();
                tracing::error!(
                    request_id = %record.ctx.request_id(),
                    operation_id = operation,
                    http.status_code = record.status,
                    duration_ms = elapsed_ms(record),
                    error.kind = %kind,
                    error.message = error.message(),
                    error.detail = %detail,
                    "request failed"
                );
            }
        }

        record_request(operation, record.status, kind.as_str(), record.elapsed);
    }
}

fn elapsed_ms(record: &DispatchRecord<'_>) -> u64 {
    u64::try_from(record.elapsed.as_millis()).unwrap_or(u64::MAX)
}
