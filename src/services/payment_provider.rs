//! Proveedor de pagos
//!
//! Creación de preferencias de checkout. Con `MP_KEY` se usa la API de
//! MercadoPago; sin clave, un proveedor simulado que no sale de la red.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::config::EnvironmentConfig;
use crate::utils::errors::{AppError, AppResult};

pub const MERCADOPAGO_METHOD: &str = "MERCADOPAGO";
pub const SIMULATION_METHOD: &str = "MERCADOPAGO_SIMULATION";

const MERCADOPAGO_PREFERENCES_URL: &str = "https://api.mercadopago.com/checkout/preferences";
const PROVIDER_TIMEOUT_SECS: u64 = 5;

/// Datos de la reparación a cobrar
#[derive(Debug, Clone)]
pub struct PreferenceOrder {
    pub repair_id: Uuid,
    pub client_id: Uuid,
    pub description: String,
    pub amount: Decimal,
    pub brand: String,
    pub model: String,
    pub license_plate: String,
    pub payer_name: String,
    pub payer_surname: String,
    pub payer_email: Option<String>,
    pub requested_at: DateTime<Utc>,
}

impl PreferenceOrder {
    /// Referencia externa `repair_{id}_client_{id}`
    pub fn external_reference(&self) -> String {
        format!("repair_{}_client_{}", self.repair_id, self.client_id)
    }

    pub fn payer_email(&self) -> String {
        self.payer_email
            .clone()
            .filter(|email| !email.trim().is_empty())
            .unwrap_or_else(|| format!("client{}@taller-interestellar.com", self.client_id))
    }
}

/// Preferencia creada en el proveedor
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Preference {
    pub preference_id: String,
    pub init_point: String,
    pub sandbox_init_point: String,
    /// Método con el que se registra el pago
    #[serde(skip)]
    pub method: &'static str,
    #[serde(skip)]
    pub external_id: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub simulation: bool,
}

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn create_preference(&self, order: &PreferenceOrder) -> AppResult<Preference>;
}

#[derive(Debug, Deserialize)]
struct MercadoPagoPreference {
    id: String,
    init_point: String,
    #[serde(default)]
    sandbox_init_point: Option<String>,
}

/// Cliente de la API de preferencias de MercadoPago
pub struct MercadoPagoProvider {
    access_token: String,
    frontend_url: String,
    backend_url: String,
    client: Client,
}

impl MercadoPagoProvider {
    pub fn new(access_token: String, frontend_url: String, backend_url: String) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(PROVIDER_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::Internal(format!("No se pudo crear el cliente HTTP: {}", e)))?;

        Ok(Self {
            access_token,
            frontend_url,
            backend_url,
            client,
        })
    }

    fn preference_body(&self, order: &PreferenceOrder) -> AppResult<serde_json::Value> {
        let unit_price = order
            .amount
            .to_f64()
            .ok_or_else(|| AppError::InvalidInput("Monto de pago inválido".to_string()))?;
        let return_url = |outcome: &str| {
            format!("{}/home/client/repairs?payment={}", self.frontend_url, outcome)
        };

        Ok(json!({
            "items": [{
                "id": format!("repair_{}", order.repair_id),
                "title": format!("Repair {} {} - {}", order.brand, order.model, order.license_plate),
                "description": if order.description.trim().is_empty() {
                    "Vehicle repair service"
                } else {
                    order.description.as_str()
                },
                "quantity": 1,
                "unit_price": unit_price,
            }],
            "payer": {
                "name": order.payer_name,
                "surname": order.payer_surname,
                "email": order.payer_email(),
            },
            "back_urls": {
                "success": return_url("success"),
                "failure": return_url("failure"),
                "pending": return_url("pending"),
            },
            "notification_url": format!("{}/api/payments/webhook", self.backend_url),
            "external_reference": order.external_reference(),
        }))
    }
}

#[async_trait]
impl PaymentProvider for MercadoPagoProvider {
    async fn create_preference(&self, order: &PreferenceOrder) -> AppResult<Preference> {
        let body = self.preference_body(order)?;
        debug!("📋 Preferencia para reparación {}: {}", order.repair_id, body);

        let response = self
            .client
            .post(MERCADOPAGO_PREFERENCES_URL)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ExternalApi(format!("MercadoPago no respondió: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            error!("❌ MercadoPago respondió {}: {}", status, detail);
            return Err(AppError::ExternalApi(format!("MercadoPago respondió {}", status)));
        }

        let preference: MercadoPagoPreference = response
            .json()
            .await
            .map_err(|e| AppError::ExternalApi(format!("Respuesta de MercadoPago inválida: {}", e)))?;

        info!("✅ Preferencia MercadoPago creada: {}", preference.id);
        Ok(Preference {
            sandbox_init_point: preference
                .sandbox_init_point
                .unwrap_or_else(|| preference.init_point.clone()),
            init_point: preference.init_point,
            external_id: preference.id.clone(),
            preference_id: preference.id,
            method: MERCADOPAGO_METHOD,
            simulation: false,
        })
    }
}

/// Proveedor simulado para desarrollo
pub struct SimulatedProvider {
    frontend_url: String,
}

impl SimulatedProvider {
    pub fn new(frontend_url: impl Into<String>) -> Self {
        Self {
            frontend_url: frontend_url.into(),
        }
    }
}

#[async_trait]
impl PaymentProvider for SimulatedProvider {
    async fn create_preference(&self, order: &PreferenceOrder) -> AppResult<Preference> {
        let timestamp = order.requested_at.timestamp_millis();
        let url = format!(
            "{}/home/client/repairs?payment=success&simulation=true",
            self.frontend_url
        );
        info!("🧪 Pago simulado para reparación {}", order.repair_id);

        Ok(Preference {
            preference_id: format!("sim_{}", timestamp),
            init_point: url.clone(),
            sandbox_init_point: url,
            method: SIMULATION_METHOD,
            external_id: format!("sim_{}_{}", timestamp, order.repair_id),
            simulation: true,
        })
    }
}

/// Proveedor según configuración
pub fn provider_from_config(config: &EnvironmentConfig) -> AppResult<Box<dyn PaymentProvider>> {
    match &config.mp_key {
        Some(key) => {
            info!("💳 MercadoPago configurado");
            Ok(Box::new(MercadoPagoProvider::new(
                key.clone(),
                config.frontend_url.clone(),
                config.backend_url.clone(),
            )?))
        }
        None => {
            info!("🧪 MP_KEY no configurada, pagos en modo simulación");
            Ok(Box::new(SimulatedProvider::new(config.frontend_url.clone())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn order() -> PreferenceOrder {
        PreferenceOrder {
            repair_id: Uuid::nil(),
            client_id: Uuid::nil(),
            description: String::new(),
            amount: Decimal::from_str("150.50").unwrap(),
            brand: "Fiat".to_string(),
            model: "Cronos".to_string(),
            license_plate: "AB123CD".to_string(),
            payer_name: "Ana".to_string(),
            payer_surname: "Pérez".to_string(),
            payer_email: None,
            requested_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        }
    }

    #[test]
    fn test_preference_body_shape() {
        let provider = MercadoPagoProvider::new(
            "token".to_string(),
            "http://front".to_string(),
            "http://back".to_string(),
        )
        .unwrap();
        let body = provider.preference_body(&order()).unwrap();

        assert_eq!(body["items"][0]["title"], "Repair Fiat Cronos - AB123CD");
        assert_eq!(body["items"][0]["unit_price"], 150.5);
        assert_eq!(body["items"][0]["description"], "Vehicle repair service");
        assert_eq!(
            body["payer"]["email"],
            format!("client{}@taller-interestellar.com", Uuid::nil())
        );
        assert_eq!(body["back_urls"]["failure"], "http://front/home/client/repairs?payment=failure");
        assert_eq!(body["notification_url"], "http://back/api/payments/webhook");
    }

    #[tokio::test]
    async fn test_simulated_preference() {
        let preference = SimulatedProvider::new("http://front")
            .create_preference(&order())
            .await
            .unwrap();
        assert!(preference.simulation);
        assert_eq!(preference.method, SIMULATION_METHOD);
        assert_eq!(preference.preference_id, "sim_1700000000000");
        assert_eq!(
            preference.external_id,
            format!("sim_1700000000000_{}", Uuid::nil())
        );
        assert!(preference.init_point.ends_with("simulation=true"));
    }
}
