//! Cross-device handoff
//!
//! Mints single-use tokens bound to a booking reference and renders them as a
//! scannable code so a secondary device can contribute captures to the same
//! bundle. Correlating the secondary device's uploads happens server-side and
//! is out of scope here.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use image::GrayImage;
use qrcode::QrCode;
use uuid::Uuid;

/// A single-use credential for a secondary capture device
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct HandoffToken {
    /// Opaque token value embedded in the handoff URL
    pub token: String,
    pub booking_reference: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl HandoffToken {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Why a redemption was refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandoffError {
    UnknownToken,
    Expired,
    AlreadyRedeemed,
    /// The URL could not be encoded as a QR code
    Render(String),
}

impl std::fmt::Display for HandoffError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownToken => write!(f, "Handoff token is not recognized"),
            Self::Expired => write!(f, "Handoff token has expired"),
            Self::AlreadyRedeemed => write!(f, "Handoff token was already used"),
            Self::Render(msg) => write!(f, "QR render failed: {}", msg),
        }
    }
}

impl std::error::Error for HandoffError {}

struct TokenEntry {
    token: HandoffToken,
    redeemed: bool,
}

/// In-memory registry of outstanding handoff tokens for a verification flow
pub struct HandoffRegistry {
    tokens: Mutex<HashMap<String, TokenEntry>>,
    ttl: Duration,
}

impl HandoffRegistry {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            tokens: Mutex::new(HashMap::new()),
            ttl: Duration::seconds(ttl_secs as i64),
        }
    }

    /// Mint a token scoped to the booking reference
    pub fn mint(&self, booking_reference: &str) -> HandoffToken {
        let issued_at = Utc::now();
        let token = HandoffToken {
            token: Uuid::new_v4().simple().to_string(),
            booking_reference: booking_reference.to_string(),
            issued_at,
            expires_at: issued_at + self.ttl,
        };

        log::info!(
            "Minted handoff token for {} (valid {}s)",
            booking_reference,
            self.ttl.num_seconds()
        );

        self.tokens.lock().expect("lock poisoned").insert(
            token.token.clone(),
            TokenEntry {
                token: token.clone(),
                redeemed: false,
            },
        );
        token
    }

    /// Redeem a token, returning the booking reference it is bound to
    ///
    /// Valid for exactly one redemption inside the validity window.
    pub fn redeem(&self, token: &str) -> Result<String, HandoffError> {
        self.redeem_at(token, Utc::now())
    }

    /// Deterministic redemption for hosts driving their own clock
    pub fn redeem_at(&self, token: &str, now: DateTime<Utc>) -> Result<String, HandoffError> {
        let mut tokens = self.tokens.lock().expect("lock poisoned");
        let entry = tokens.get_mut(token).ok_or(HandoffError::UnknownToken)?;

        if entry.redeemed {
            return Err(HandoffError::AlreadyRedeemed);
        }
        if entry.token.is_expired_at(now) {
            return Err(HandoffError::Expired);
        }

        entry.redeemed = true;
        log::info!(
            "Handoff token redeemed for {}",
            entry.token.booking_reference
        );
        Ok(entry.token.booking_reference.clone())
    }

    /// Drop expired entries; call opportunistically
    pub fn prune(&self) {
        let now = Utc::now();
        self.tokens
            .lock()
            .expect("lock poisoned")
            .retain(|_, entry| !entry.token.is_expired_at(now));
    }
}

/// Build the URL a secondary device opens to join the flow
pub fn handoff_url(origin: &str, token: &HandoffToken) -> String {
    format!("{}/verify-upload/{}", origin.trim_end_matches('/'), token.token)
}

/// Render a handoff URL as a scannable code
pub fn render_qr(url: &str) -> Result<GrayImage, HandoffError> {
    let code = QrCode::new(url.as_bytes()).map_err(|e| HandoffError::Render(e.to_string()))?;
    let image = code
        .render::<image::Luma<u8>>()
        .min_dimensions(240, 240)
        .build();
    Ok(image)
}
