use std::env;
use std::net::SocketAddr;

use crate::error::Error;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub mail_api_base: String,
    pub mail_api_key: String,
    pub mail_sender: String,
}

impl Config {
    pub fn from_env() -> Result<Self, Error> {
        let database_url = env::var("DATABASE_URL")?;

        let port = env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3000);

        let mail_api_base = env::var("MAIL_API_BASE")
            .unwrap_or_else(|_| "https://api.resend.com".to_string());
        let mail_api_key = env::var("MAIL_API_KEY").unwrap_or_default();
        let mail_sender = env::var("MAIL_SENDER")
            .unwrap_or_else(|_| "Vectura <noreply@vectura.app>".to_string());

        Ok(Self {
            database_url,
            port,
            mail_api_base,
            mail_api_key,
            mail_sender,
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], self.port))
    }
}
