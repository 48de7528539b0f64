//! Customer activation, one contract, one implementation.

use async_trait::async_trait;
use serde_json::json;

use crate::api::HttpStorefront;
use crate::net::{send_classified, ApiError};
use crate::types::{Customer, Record};

#[async_trait]
pub trait CustomerStatusRepository: Send + Sync {
    /// Enable or disable a customer account and return the updated record.
    async fn set_active(&self, id: u64, active: bool) -> Result<Customer, ApiError>;
}

/// `PATCH /admin/customers/{id}/status` with `{"is_active": bool}`.
#[derive(Clone, Debug)]
pub struct HttpCustomerStatusRepository {
    api: HttpStorefront,
}

impl HttpCustomerStatusRepository {
    pub fn new(api: HttpStorefront) -> Self {
        Self { api }
    }
}

#[async_trait]
impl CustomerStatusRepository for HttpCustomerStatusRepository {
    async fn set_active(&self, id: u64, active: bool) -> Result<Customer, ApiError> {
        let rb = self
            .api
            .request(reqwest::Method::PATCH, &format!("admin/customers/{id}/status"))
            .json(&json!({ "is_active": active }));
        let res = send_classified(rb, "customer status").await?;
        let record: Record<Customer> = res
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        let customer = record.into_inner();
        log::info!(
            "[customers] #{} is now {}",
            customer.id,
            if customer.is_active { "active" } else { "inactive" }
        );
        Ok(customer)
    }
}
