use base64::{Engine, engine::general_purpose};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid signing key")]
    InvalidKey,
}

/// A time-windowed read capability for one container, carried as a URL query
/// string: `st=<start>&se=<expiry>&sp=r&sig=<signature>`.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub query: String,
    pub issued_at: DateTime<Utc>,
}

/// Issues HMAC-SHA256 signed container read tokens. The start instant is
/// backdated by a small clock-skew allowance so a token is usable the moment
/// it is handed out.
pub struct TokenIssuer {
    secret: String,
    validity: Duration,
    clock_skew: Duration,
}

impl TokenIssuer {
    pub fn new(secret: String, validity: Duration, clock_skew: Duration) -> Self {
        Self {
            secret,
            validity,
            clock_skew,
        }
    }

    pub fn issue(&self, container: &str) -> Result<AccessToken, TokenError> {
        self.issue_at(container, Utc::now())
    }

    pub(crate) fn issue_at(
        &self,
        container: &str,
        now: DateTime<Utc>,
    ) -> Result<AccessToken, TokenError> {
        let start = (now - self.clock_skew).timestamp();
        let expiry = (now + self.validity).timestamp();

        let signature = self.sign(container, start, expiry)?;
        let query = format!("st={}&se={}&sp=r&sig={}", start, expiry, signature);

        Ok(AccessToken {
            query,
            issued_at: now,
        })
    }

    /// Check a token query against a container name and instant. Used by
    /// whatever fronts the blob store; kept next to issuance so the two
    /// halves of the format cannot drift apart.
    pub fn verify(&self, container: &str, query: &str, now: DateTime<Utc>) -> bool {
        let mut start = None;
        let mut expiry = None;
        let mut signature = None;
        for pair in query.split('&') {
            match pair.split_once('=') {
                Some(("st", value)) => start = value.parse::<i64>().ok(),
                Some(("se", value)) => expiry = value.parse::<i64>().ok(),
                Some(("sig", value)) => signature = Some(value),
                _ => {}
            }
        }

        let (Some(start), Some(expiry), Some(signature)) = (start, expiry, signature) else {
            return false;
        };

        let timestamp = now.timestamp();
        if timestamp < start || timestamp >= expiry {
            return false;
        }

        let Ok(mut mac) = HmacSha256::new_from_slice(self.secret.as_bytes()) else {
            return false;
        };
        mac.update(payload(container, start, expiry).as_bytes());

        match general_purpose::URL_SAFE_NO_PAD.decode(signature) {
            Ok(decoded) => mac.verify_slice(&decoded).is_ok(),
            Err(_) => false,
        }
    }

    fn sign(&self, container: &str, start: i64, expiry: i64) -> Result<String, TokenError> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|_| TokenError::InvalidKey)?;
        mac.update(payload(container, start, expiry).as_bytes());
        let signature = mac.finalize().into_bytes();
        Ok(general_purpose::URL_SAFE_NO_PAD.encode(signature))
    }
}

fn payload(container: &str, start: i64, expiry: i64) -> String {
    format!("{}\n{}\n{}\nr", container, start, expiry)
}
