use std::env;

use crate::error::WalletError;
use crate::wallet::Wallet;

/// Runtime settings read from the environment (and `.env`, loaded in `main`).
///
/// - `HOST` / `PORT`: HTTP bind address, default `127.0.0.1:8080`
/// - `WALLET_PRIVATE_KEY`: hex secp256k1 key; a fresh one is generated when unset
/// - `MINER_ADDRESS`: coinbase recipient; defaults to the wallet's address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub wallet_private_key: Option<String>,
    pub miner_address: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            host: non_empty("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: lookup("PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
            wallet_private_key: non_empty("WALLET_PRIVATE_KEY"),
            miner_address: non_empty("MINER_ADDRESS"),
        }
    }

    pub fn load_wallet(&self) -> Result<Wallet, WalletError> {
        match &self.wallet_private_key {
            Some(sk_hex) => Wallet::from_private_hex(sk_hex),
            None => Ok(Wallet::generate()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = config(&[]);
        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.port, 8080);
        assert!(cfg.wallet_private_key.is_none());
        assert!(cfg.miner_address.is_none());
    }

    #[test]
    fn bad_port_falls_back() {
        assert_eq!(config(&[("PORT", "http")]).port, 8080);
        assert_eq!(config(&[("PORT", "3000")]).port, 3000);
    }

    #[test]
    fn loads_configured_wallet() {
        let w = Wallet::generate();
        let key = w.private_key_hex();
        let cfg = config(&[("WALLET_PRIVATE_KEY", key.as_str()), ("MINER_ADDRESS", " ")]);
        assert_eq!(cfg.load_wallet().unwrap().public_address(), w.public_address());
        assert!(cfg.miner_address.is_none());
        assert!(config(&[("WALLET_PRIVATE_KEY", "xx")]).load_wallet().is_err());
    }
}
