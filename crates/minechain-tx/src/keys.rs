use crate::{calculate_transaction_id, Transaction};
use anyhow::{Context, Result};
use minechain_core::Hash;
use once_cell::sync::Lazy;
use rand::rngs::OsRng;
use secp256k1::{ecdsa::Signature, All, Message, PublicKey, Secp256k1, SecretKey};
use std::fs;
use std::path::Path;
use tracing::info;

static SECP256K1_CONTEXT: Lazy<Secp256k1<All>> = Lazy::new(Secp256k1::new);

pub const COMPACT_SIGNATURE_SIZE: usize = 64;

#[derive(Clone, Debug)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
}

impl KeyPair {
    pub fn generate() -> Self {
        let secret_key = SecretKey::new(&mut OsRng);
        Self::from_secret_key(secret_key)
    }

    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let public_key = PublicKey::from_secret_key(&SECP256K1_CONTEXT, &secret_key);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Writes the secret key to `path` as hex.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, hex::encode(self.secret_key.secret_bytes()))
            .with_context(|| format!("writing key file {}", path.display()))?;
        info!(path = %path.display(), "saved signing key");
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let encoded = fs::read_to_string(path)
            .with_context(|| format!("reading key file {}", path.display()))?;
        let bytes = hex::decode(encoded.trim()).context("key file is not valid hex")?;
        let secret_key =
            SecretKey::from_slice(&bytes).context("key file does not hold a valid secret key")?;
        Ok(Self::from_secret_key(secret_key))
    }

    /// Signs the recomputed transaction id, never the stored one, so the
    /// signature always targets what the transaction currently says.
    pub fn sign_transaction(&self, tx: &Transaction) -> [u8; COMPACT_SIGNATURE_SIZE] {
        let id = calculate_transaction_id(tx);
        let message = Message::from_digest(id);
        SECP256K1_CONTEXT
            .sign_ecdsa(&message, &self.secret_key)
            .serialize_compact()
    }
}

pub fn verify(id: &Hash, signature: &[u8; COMPACT_SIGNATURE_SIZE], public_key: &PublicKey) -> bool {
    let message = Message::from_digest(*id);
    match Signature::from_compact(signature) {
        Ok(signature) => SECP256K1_CONTEXT
            .verify_ecdsa(&message, &signature, public_key)
            .is_ok(),
        Err(_) => false,
    }
}
