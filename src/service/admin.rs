//! Admin gate.
//!
//! A single shared passphrase unlocks export and reset. It is compared as-is;
//! anyone who can read the configuration knows it.

use crate::config::AdminConfig;

/// Checks admin passphrase attempts.
pub struct AdminGate {
    passphrase: String,
}

impl AdminGate {
    /// Create a gate for the configured passphrase.
    #[must_use]
    pub fn new(config: &AdminConfig) -> Self {
        Self {
            passphrase: config.passphrase.clone(),
        }
    }

    /// Whether `attempt` is the admin passphrase.
    #[must_use]
    pub fn verify(&self, attempt: &str) -> bool {
        !self.passphrase.is_empty() && attempt == self.passphrase
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate(passphrase: &str) -> AdminGate {
        AdminGate::new(&AdminConfig {
            passphrase: passphrase.to_string(),
        })
    }

    #[test]
    fn test_verify() {
        let gate = gate("sorteo2024");
        assert!(gate.verify("sorteo2024"));
        assert!(!gate.verify("sorteo"));
        assert!(!gate.verify(" sorteo2024"));
        assert!(!gate.verify(""));
    }

    #[test]
    fn test_empty_passphrase_never_matches() {
        assert!(!gate("").verify(""));
    }
}
