use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::config;

#[derive(Serialize, ToSchema)]
pub struct ServiceStatus {
    pub status: String,
    pub service: String,
    pub version: String,
    pub message: String,
}

impl ServiceStatus {
    fn active() -> Self {
        Self {
            status: "active".to_string(),
            service: config::SERVICE_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            message: "API is running and ready to extract barcodes".to_string(),
        }
    }
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service is up", body = ServiceStatus)
    ),
    tag = "health"
)]
pub async fn root() -> Json<ServiceStatus> {
    Json(ServiceStatus::active())
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = ServiceStatus)
    ),
    tag = "health"
)]
pub async fn health_check() -> Json<ServiceStatus> {
    Json(ServiceStatus::active())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_body_is_the_stable_contract() {
        let status = ServiceStatus::active();
        assert_eq!(status.status, "active");
        assert_eq!(status.service, "Universal Barcode Scanner API");
        assert_eq!(status.version, "1.0.0");
        assert_eq!(status.message, "API is running and ready to extract barcodes");
    }
}
