//! Outbound mail delivery for account activation codes.
//!
//! Delivery goes through an HTTP mail provider when a webhook endpoint is
//! configured; otherwise codes are only written to the log, which is what
//! development and test environments run with. Delivery failures never
//! roll back the registration that triggered them.

use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailerError {
    #[error("Mail delivery failed: {0}")]
    Delivery(String),
}

#[derive(Clone)]
pub enum Mailer {
    /// Log the code instead of sending. Default outside production.
    Log,
    /// POST a JSON payload to a configured mail-provider endpoint.
    Webhook {
        client: reqwest::Client,
        endpoint: String,
    },
}

impl Mailer {
    pub fn from_webhook(endpoint: Option<String>) -> Self {
        match endpoint {
            Some(endpoint) => Self::Webhook {
                client: reqwest::Client::new(),
                endpoint,
            },
            None => Self::Log,
        }
    }

    /// Deliver an activation code to a freshly registered (or expired-token)
    /// account.
    pub async fn send_activation_code(
        &self,
        email: &str,
        full_name: &str,
        code: &str,
    ) -> Result<(), MailerError> {
        match self {
            Mailer::Log => {
                tracing::info!(email, code, "Activation code issued (log-only mailer)");
                Ok(())
            }
            Mailer::Webhook { client, endpoint } => {
                let body = json!({
                    "to": email,
                    "template": "activate-account",
                    "subject": "Account activation",
                    "variables": {
                        "full_name": full_name,
                        "activation_code": code,
                    },
                });
                let response = client
                    .post(endpoint)
                    .json(&body)
                    .send()
                    .await
                    .map_err(|e| MailerError::Delivery(e.to_string()))?;
                if !response.status().is_success() {
                    return Err(MailerError::Delivery(format!(
                        "provider returned {}",
                        response.status()
                    )));
                }
                tracing::info!(email, "Activation code sent");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn log_mailer_always_succeeds() {
        let mailer = Mailer::from_webhook(None);
        assert!(mailer
            .send_activation_code("a@b.tn", "A B", "123456")
            .await
            .is_ok());
    }

    #[test]
    fn webhook_config_selects_webhook_mode() {
        let mailer = Mailer::from_webhook(Some("http://localhost:9".into()));
        assert!(matches!(mailer, Mailer::Webhook { .. }));
    }
}
