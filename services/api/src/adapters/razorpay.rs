//! services/api/src/adapters/razorpay.rs
//!
//! Payment gateway adapter for Razorpay: order creation over its REST API and
//! checkout signature verification.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use sha2::Sha256;
use tracing::error;
use tutoring_core::domain::GatewayOrder;
use tutoring_core::ports::{PaymentGateway, PortError, PortResult};

type HmacSha256 = Hmac<Sha256>;

const ORDERS_URL: &str = "https://api.razorpay.com/v1/orders";

pub struct RazorpayAdapter {
    http: Client,
    key_id: Option<String>,
    key_secret: Option<String>,
}

impl RazorpayAdapter {
    pub fn new(http: Client, key_id: Option<String>, key_secret: Option<String>) -> Self {
        Self {
            http,
            key_id,
            key_secret,
        }
    }
}

/// `hex(HMAC-SHA256(secret, "<order_id>|<payment_id>"))`, the signature the
/// checkout widget hands back after a successful payment.
pub fn checkout_signature(secret: &str, order_id: &str, payment_id: &str) -> String {
    // HMAC accepts keys of any length.
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(format!("{}|{}", order_id, payment_id).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

#[derive(Deserialize)]
struct OrderResponse {
    id: String,
    amount: i64,
    currency: String,
}

#[async_trait]
impl PaymentGateway for RazorpayAdapter {
    fn public_key(&self) -> String {
        self.key_id.clone().unwrap_or_default()
    }

    async fn create_order(
        &self,
        amount: i64,
        currency: &str,
        receipt: &str,
        notes: &[(String, String)],
    ) -> PortResult<GatewayOrder> {
        let (key_id, key_secret) = match (&self.key_id, &self.key_secret) {
            (Some(id), Some(secret)) => (id, secret),
            _ => {
                return Err(PortError::Unexpected(
                    "Razorpay credentials are not configured".to_string(),
                ))
            }
        };

        let notes: Map<String, Value> = notes
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        let body = json!({
            "amount": amount,
            "currency": currency,
            "receipt": receipt,
            "notes": notes,
        });

        let response = self
            .http
            .post(ORDERS_URL)
            .basic_auth(key_id, Some(key_secret))
            .json(&body)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!("Razorpay order creation failed ({}): {}", status, text);
            return Err(PortError::Unexpected(format!(
                "order creation failed with {}",
                status
            )));
        }

        let order: OrderResponse = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(GatewayOrder {
            order_id: order.id,
            amount: order.amount,
            currency: order.currency,
        })
    }

    fn verify_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> bool {
        let Some(secret) = self.key_secret.as_deref() else {
            return false;
        };
        let Ok(provided) = hex::decode(signature.trim()) else {
            return false;
        };
        let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
            return false;
        };
        mac.update(format!("{}|{}", order_id, payment_id).as_bytes());
        // Constant-time comparison.
        mac.verify_slice(&provided).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter(secret: Option<&str>) -> RazorpayAdapter {
        RazorpayAdapter::new(
            Client::new(),
            Some("rzp_test_key".to_string()),
            secret.map(str::to_string),
        )
    }

    #[test]
    fn accepts_signature_made_with_the_secret() {
        let signature = checkout_signature("s3cret", "order_1", "pay_1");
        assert_eq!(signature.len(), 64);
        assert!(adapter(Some("s3cret")).verify_signature("order_1", "pay_1", &signature));
    }

    #[test]
    fn rejects_tampered_or_foreign_signatures() {
        let signature = checkout_signature("s3cret", "order_1", "pay_1");
        let gateway = adapter(Some("s3cret"));
        assert!(!gateway.verify_signature("order_1", "pay_2", &signature));
        assert!(!gateway.verify_signature("order_1", "pay_1", "not-hex"));
        assert!(!adapter(Some("other")).verify_signature("order_1", "pay_1", &signature));
        assert!(!adapter(None).verify_signature("order_1", "pay_1", &signature));
    }

    #[tokio::test]
    async fn order_creation_requires_credentials() {
        let result = adapter(None).create_order(165_000, "INR", "receipt", &[]).await;
        assert!(matches!(result, Err(PortError::Unexpected(_))));
    }
}
