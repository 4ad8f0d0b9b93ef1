use async_trait::async_trait;
use serde_json::json;

use crate::config::Config;
use crate::error::Error;

/// Notification sink. Delivery is best-effort everywhere: callers log
/// failures and never let them roll back a state transition.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), Error>;
}

/// Client for an HTTP mail relay. The relay owns templates-to-inbox
/// concerns; this client only hands over recipient, subject and body.
pub struct HttpMailer {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    sender: String,
}

impl HttpMailer {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: config.mail_api_base.clone(),
            api_key: config.mail_api_key.clone(),
            sender: config.mail_sender.clone(),
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    #[tracing::instrument(skip(self, body))]
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), Error> {
        let url = format!("{}/emails", self.api_base);

        let res = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "from": self.sender,
                "to": recipient,
                "subject": subject,
                "text": body,
            }))
            .send()
            .await?;

        let status_code = res.status().as_u16();

        if status_code >= 300 {
            return Err(Error::Delivery(format!(
                "mail relay responded with status {}",
                status_code
            )));
        }

        tracing::info!(recipient, subject, "notification delivered");

        Ok(())
    }
}
