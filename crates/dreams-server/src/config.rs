use std::net::SocketAddr;

use anyhow::Context;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use tracing::warn;

const DEFAULT_TOKEN_TTL_HOURS: i64 = 720;

/// Server settings, read from the environment (and `.env`, if present).
pub struct Config {
    pub addr: SocketAddr,
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let host = std::env::var("DREAMS_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = std::env::var("DREAMS_PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .context("DREAMS_PORT must be a port number")?;
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .context("DREAMS_HOST must be an IP address")?;

        let jwt_secret = match std::env::var("DREAMS_JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ => {
                warn!("DREAMS_JWT_SECRET not set, generating a random secret; tokens will not survive a restart");
                let bytes: [u8; 32] = rand::random();
                B64.encode(bytes)
            }
        };

        let ttl_hours: i64 = match std::env::var("DREAMS_TOKEN_TTL_HOURS") {
            Ok(raw) => raw
                .parse()
                .context("DREAMS_TOKEN_TTL_HOURS must be a whole number of hours")?,
            Err(_) => DEFAULT_TOKEN_TTL_HOURS,
        };
        if ttl_hours <= 0 {
            anyhow::bail!("DREAMS_TOKEN_TTL_HOURS must be positive");
        }

        Ok(Self {
            addr,
            jwt_secret,
            token_ttl: chrono::Duration::hours(ttl_hours),
        })
    }
}
