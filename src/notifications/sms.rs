use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::NotificationError;
use crate::{config::SmsConfig, db::models::auth::User, validation::rules::validate_e164_phone};

#[async_trait]
pub trait SmsSender: Send + Sync {
    /// Sends `body` to an E.164 number and returns the provider message id.
    async fn send(&self, to: &str, body: &str) -> Result<String, NotificationError>;
}

/// Twilio Messages API client.
pub struct TwilioSmsSender {
    client: Client,
    config: SmsConfig,
}

#[derive(Deserialize)]
struct TwilioMessage {
    sid: String,
}

impl TwilioSmsSender {
    pub fn new(config: SmsConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| Client::new()),
            config,
        }
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/Accounts/{}/Messages.json",
            self.config.api_url.trim_end_matches('/'),
            self.config.account_sid
        )
    }
}

#[async_trait]
impl SmsSender for TwilioSmsSender {
    async fn send(&self, to: &str, body: &str) -> Result<String, NotificationError> {
        validate_e164_phone(to).map_err(|_| NotificationError::InvalidRecipient(to.to_string()))?;

        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&[("To", to), ("From", self.config.from_number.as_str()), ("Body", body)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotificationError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let message: TwilioMessage = response.json().await?;
        Ok(message.sid)
    }
}

/// Logs messages instead of sending them; used when Twilio is not configured.
#[derive(Default)]
pub struct LogSmsSender;

#[async_trait]
impl SmsSender for LogSmsSender {
    async fn send(&self, to: &str, body: &str) -> Result<String, NotificationError> {
        validate_e164_phone(to).map_err(|_| NotificationError::InvalidRecipient(to.to_string()))?;
        info!(to = %to, length = body.len(), "SMS delivery disabled, message logged");
        Ok(format!("log-{}", uuid::Uuid::new_v4()))
    }
}

/// Fire-and-forget SMS dispatch. Delivery failures are logged and never
/// reach the caller.
#[derive(Clone)]
pub struct Notifier {
    sender: Arc<dyn SmsSender>,
}

impl Notifier {
    pub fn new(sender: Arc<dyn SmsSender>) -> Self {
        Self { sender }
    }

    pub fn from_config(config: Option<SmsConfig>) -> Self {
        match config {
            Some(config) => Self::new(Arc::new(TwilioSmsSender::new(config))),
            None => Self::new(Arc::new(LogSmsSender)),
        }
    }

    /// Sends in the background.
    pub fn notify(&self, to: Option<String>, body: String) {
        let Some(to) = to else {
            return;
        };
        let sender = self.sender.clone();
        tokio::spawn(async move {
            deliver(sender.as_ref(), &to, &body).await;
        });
    }

    /// Sends and waits for the outcome. Returns whether delivery succeeded.
    pub async fn notify_now(&self, to: &str, body: &str) -> bool {
        deliver(self.sender.as_ref(), to, body).await
    }
}

/// Phone number of an alert recipient. A failed lookup skips the alert.
pub fn recipient_phone<E: std::fmt::Display>(user_id: Uuid, lookup: Result<Option<User>, E>) -> Option<String> {
    match lookup {
        Ok(user) => user.and_then(|user| user.phone),
        Err(e) => {
            warn!(user_id = %user_id, error = %e, "Alert recipient lookup failed");
            None
        }
    }
}

async fn deliver(sender: &dyn SmsSender, to: &str, body: &str) -> bool {
    match sender.send(to, body).await {
        Ok(id) => {
            info!(message_id = %id, "SMS notification sent");
            true
        }
        Err(e) => {
            warn!(error = %e, "SMS notification failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSender {
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl SmsSender for RecordingSender {
        async fn send(&self, to: &str, body: &str) -> Result<String, NotificationError> {
            self.sent
                .lock()
                .unwrap()
                .push((to.to_string(), body.to_string()));
            Ok("SM1".to_string())
        }
    }

    struct FailingSender;

    #[async_trait]
    impl SmsSender for FailingSender {
        async fn send(&self, _to: &str, _body: &str) -> Result<String, NotificationError> {
            Err(NotificationError::Rejected {
                status: 400,
                body: "bad".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn delivers_through_sender() {
        let recorder = Arc::new(RecordingSender::default());
        let notifier = Notifier::new(recorder.clone());
        assert!(notifier.notify_now("+14155550123", "Critical risk R-7").await);
        assert_eq!(recorder.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failures_are_swallowed() {
        let notifier = Notifier::new(Arc::new(FailingSender));
        assert!(!notifier.notify_now("+14155550123", "hello").await);
    }

    #[tokio::test]
    async fn log_sender_validates_numbers() {
        assert!(LogSmsSender.send("+14155550123", "x").await.is_ok());
        assert!(matches!(
            LogSmsSender.send("555-0123", "x").await,
            Err(NotificationError::InvalidRecipient(_))
        ));
    }

    #[test]
    fn failed_recipient_lookup_skips_the_alert() {
        let lookup: Result<Option<User>, diesel::result::Error> = Err(diesel::result::Error::BrokenTransactionManager);
        assert_eq!(recipient_phone(Uuid::new_v4(), lookup), None);

        let missing: Result<Option<User>, diesel::result::Error> = Ok(None);
        assert_eq!(recipient_phone(Uuid::new_v4(), missing), None);
    }

    #[test]
    fn builds_twilio_messages_url() {
        let sender = TwilioSmsSender::new(SmsConfig {
            account_sid: "AC123".to_string(),
            auth_token: "token".to_string(),
            from_number: "+15550001111".to_string(),
            api_url: "https://api.twilio.com/2010-04-01/".to_string(),
        });
        assert_eq!(
            sender.messages_url(),
            "https://api.twilio.com/2010-04-01/Accounts/AC123/Messages.json"
        );
    }
}
