use log::debug;
use rand::rngs::OsRng;
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey, ecdsa::Signature};

use crate::error::WalletError;
use crate::transaction::{OutPoint, Transaction, TxIn, TxOut, UtxoSet};

/// The node's own key pair. Addresses are the hex of the uncompressed public key.
#[derive(Debug, Clone)]
pub struct Wallet {
    secret: SecretKey,
    address: String,
}

impl Wallet {
    /// Fresh random key pair.
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let (sk, pk) = secp.generate_keypair(&mut OsRng);
        Self {
            secret: sk,
            address: address_from_public(&pk),
        }
    }

    /// Load a wallet from a hex-encoded 32-byte private key.
    pub fn from_private_hex(sk_hex: &str) -> Result<Self, WalletError> {
        let bytes = hex::decode(sk_hex.trim()).map_err(|_| WalletError::InvalidKey)?;
        let sk = SecretKey::from_slice(&bytes).map_err(|_| WalletError::InvalidKey)?;
        let secp = Secp256k1::signing_only();
        let pk = PublicKey::from_secret_key(&secp, &sk);
        Ok(Self {
            secret: sk,
            address: address_from_public(&pk),
        })
    }

    pub fn public_address(&self) -> &str {
        &self.address
    }

    pub fn private_key_hex(&self) -> String {
        hex::encode(self.secret.secret_bytes())
    }

    pub fn balance(&self, unspent: &UtxoSet) -> u64 {
        get_balance(&self.address, unspent)
    }

    /// Build and sign a payment of `amount` to `to`.
    ///
    /// Outputs already claimed by a pooled transaction are never selected, so
    /// back-to-back sends do not conflict with each other in the mempool.
    pub fn create_tx(
        &self,
        to: &str,
        amount: u64,
        unspent: &UtxoSet,
        mempool: &[Transaction],
    ) -> Result<Transaction, WalletError> {
        if amount == 0 {
            return Err(WalletError::ZeroAmount);
        }

        let mut mine: Vec<(&OutPoint, &TxOut)> = unspent
            .owned_by(&self.address)
            .filter(|(op, _)| !mempool.iter().any(|tx| tx.outpoints().any(|p| &p == *op)))
            .collect();
        mine.sort_by(|a, b| {
            a.0.tx_out_id
                .cmp(&b.0.tx_out_id)
                .then(a.0.tx_out_index.cmp(&b.0.tx_out_index))
        });

        let mut gathered: u64 = 0;
        let mut tx_ins = Vec::new();
        for (op, out) in mine.iter() {
            if gathered >= amount {
                break;
            }
            gathered = gathered.saturating_add(out.amount);
            tx_ins.push(TxIn {
                tx_out_id: op.tx_out_id.clone(),
                tx_out_index: op.tx_out_index,
                signature: String::new(),
            });
        }
        if gathered < amount {
            return Err(WalletError::InsufficientFunds {
                required: amount,
                available: gathered,
            });
        }

        let mut tx_outs = vec![TxOut {
            address: to.to_string(),
            amount,
        }];
        let change = gathered - amount;
        if change > 0 {
            tx_outs.push(TxOut {
                address: self.address.clone(),
                amount: change,
            });
        }

        let mut tx = Transaction::new(tx_ins, tx_outs);
        let sighash = tx.sighash().ok_or(WalletError::Signing("malformed tx id"))?;
        let signature = sign_hex(&self.secret, sighash);
        for tx_in in tx.tx_ins.iter_mut() {
            tx_in.signature = signature.clone();
        }
        debug!(
            "WALLET - built tx {} ({} inputs, change={})",
            tx.id,
            tx.tx_ins.len(),
            change
        );
        Ok(tx)
    }
}

/// Sum of every unspent output paying `address`.
pub fn get_balance(address: &str, unspent: &UtxoSet) -> u64 {
    unspent
        .owned_by(address)
        .map(|(_, out)| out.amount)
        .fold(0u64, u64::saturating_add)
}

pub fn address_from_public(pk: &PublicKey) -> String {
    hex::encode(pk.serialize_uncompressed())
}

/// Sign a 32-byte digest, returning the hex DER signature.
pub fn sign_hex(sk: &SecretKey, msg32: [u8; 32]) -> String {
    let secp = Secp256k1::signing_only();
    let msg = Message::from_digest(msg32);
    hex::encode(secp.sign_ecdsa(&msg, sk).serialize_der())
}

/// Verify a signature (hex DER) against an address (hex public key) and a 32-byte digest.
pub fn verify_signature_hex(
    address_hex: &str,
    sig_hex: &str,
    msg32: [u8; 32],
) -> Result<bool, &'static str> {
    let secp = Secp256k1::verification_only();

    let sig_bytes = hex::decode(sig_hex).map_err(|_| "invalid signature hex")?;
    let sig = Signature::from_der(&sig_bytes).map_err(|_| "invalid DER signature")?;

    let pk_bytes = hex::decode(address_hex).map_err(|_| "invalid address hex")?;
    let pk = PublicKey::from_slice(&pk_bytes).map_err(|_| "invalid public key bytes")?;

    let msg = Message::from_digest(msg32);
    Ok(secp.verify_ecdsa(&msg, &sig, &pk).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn funded(wallet: &Wallet, amounts: &[u64]) -> UtxoSet {
        let mut set = UtxoSet::new();
        for (height, amount) in amounts.iter().enumerate() {
            let mut tx = Transaction::coinbase(wallet.public_address(), height as u64 + 1);
            tx.tx_outs[0].amount = *amount;
            tx.id = tx.compute_id();
            set.add_tx_outputs(&tx);
        }
        set
    }

    #[test]
    fn private_key_round_trips_through_hex() {
        let w = Wallet::generate();
        let again = Wallet::from_private_hex(&w.private_key_hex()).unwrap();
        assert_eq!(w.public_address(), again.public_address());
        assert_eq!(w.public_address().len(), 130);
    }

    #[test]
    fn rejects_garbage_key() {
        assert_eq!(
            Wallet::from_private_hex("zz").unwrap_err(),
            WalletError::InvalidKey
        );
    }

    #[test]
    fn signatures_verify_only_for_owner() {
        let alice = Wallet::generate();
        let bob = Wallet::generate();
        let digest = [7u8; 32];
        let sig = sign_hex(&alice.secret, digest);
        assert_eq!(verify_signature_hex(alice.public_address(), &sig, digest), Ok(true));
        assert_eq!(verify_signature_hex(bob.public_address(), &sig, digest), Ok(false));
    }

    #[test]
    fn create_tx_returns_change() {
        let w = Wallet::generate();
        let utxos = funded(&w, &[50]);
        let tx = w.create_tx("bob", 20, &utxos, &[]).unwrap();
        assert_eq!(tx.tx_outs.len(), 2);
        assert_eq!(tx.tx_outs[0].amount, 20);
        assert_eq!(tx.tx_outs[1].address, w.public_address());
        assert_eq!(tx.tx_outs[1].amount, 30);
    }

    #[test]
    fn create_tx_skips_outputs_claimed_by_pool() {
        let w = Wallet::generate();
        let utxos = funded(&w, &[50, 50]);
        let first = w.create_tx("bob", 50, &utxos, &[]).unwrap();
        let second = w.create_tx("bob", 50, &utxos, std::slice::from_ref(&first)).unwrap();
        assert_ne!(first.tx_ins[0].outpoint(), second.tx_ins[0].outpoint());

        let err = w
            .create_tx("bob", 50, &utxos, &[first, second])
            .unwrap_err();
        assert_eq!(
            err,
            WalletError::InsufficientFunds {
                required: 50,
                available: 0
            }
        );
    }

    #[test]
    fn balance_sums_owned_outputs() {
        let w = Wallet::generate();
        let utxos = funded(&w, &[50, 25]);
        assert_eq!(w.balance(&utxos), 75);
        assert_eq!(get_balance("nobody", &utxos), 0);
    }
}
