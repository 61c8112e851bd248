use crate::config::Config;
use crate::error::{Error, Result};

pub mod freedns;

/// The two operations an ACME dns-01 host drives, plus config checks.
///
/// Implementations keep per-instance state (session, caches), so calls
/// take `&mut self` and an instance must not be shared between callers.
pub trait DnsAuthenticator {
    /// Publish `content` as a TXT record at `validation_name`.
    /// Succeeds without change if an identical record already exists.
    fn present(&mut self, domain: &str, validation_name: &str, content: &str) -> Result<()>;

    /// Remove the TXT record published by `present`.
    /// A record that is already gone is not an error.
    fn cleanup(&mut self, domain: &str, validation_name: &str, content: &str) -> Result<()>;

    /// Validate that the client has all required configuration
    fn validate_config(&self) -> Result<()>;

    /// Get the provider name for logging purposes
    fn provider_name(&self) -> &str;
}

/// Build the authenticator for `provider` from the given configuration.
pub fn create_client(provider: &str, config: &Config) -> Result<Box<dyn DnsAuthenticator>> {
    match provider.to_ascii_lowercase().as_str() {
        "freedns" | "afraid" => Ok(Box::new(freedns::FreednsClient::new(config)?)),
        _ => Err(Error::config(format!("Unsupported provider: {}", provider))),
    }
}
