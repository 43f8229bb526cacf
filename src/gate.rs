//! Provider credentials and the check that guards every send.

use crate::bulk::BatchError;
use crate::client::Auth;
use crate::config::Settings;
use crate::domain::{Channel, SenderAddress};

#[derive(Debug, Clone)]
/// Account, secret and sender for one channel. Read-only once loaded.
pub struct ProviderCredential {
    auth: Auth,
    sender: SenderAddress,
}

impl ProviderCredential {
    pub fn new(auth: Auth, sender: SenderAddress) -> Self {
        Self { auth, sender }
    }

    /// `None` unless account id, secret and the channel's sender are all present.
    pub fn from_settings(settings: &Settings, channel: Channel) -> Option<Self> {
        let sender = match channel {
            Channel::Sms => settings.sms_from.as_deref(),
            Channel::WhatsApp => settings.whatsapp_from.as_deref(),
        };
        let auth = Auth::basic(
            settings.account_sid.as_deref()?,
            settings.auth_token.as_deref()?,
        )
        .ok()?;
        let sender = SenderAddress::new(sender?).ok()?;
        Some(Self { auth, sender })
    }

    pub fn auth(&self) -> &Auth {
        &self.auth
    }

    pub fn sender(&self) -> &SenderAddress {
        &self.sender
    }
}

#[derive(Debug, Clone, Default)]
pub struct CredentialGate {
    credential: Option<ProviderCredential>,
}

impl CredentialGate {
    pub fn new(credential: Option<ProviderCredential>) -> Self {
        Self { credential }
    }

    pub fn from_settings(settings: &Settings, channel: Channel) -> Self {
        let credential = ProviderCredential::from_settings(settings, channel);
        if credential.is_none() {
            tracing::warn!(%channel, "provider credentials not set; sends will be refused");
        }
        Self { credential }
    }

    pub fn is_configured(&self) -> bool {
        self.credential.is_some()
    }

    pub fn credential(&self) -> Option<&ProviderCredential> {
        self.credential.as_ref()
    }

    /// Fail fast before any input is read.
    pub fn require(&self) -> Result<&ProviderCredential, BatchError> {
        self.credential
            .as_ref()
            .ok_or(BatchError::ProviderNotConfigured)
    }
}
