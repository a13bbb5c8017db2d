//! Transaction types and signing.

use crate::crypto::{Address, Keypair, Signature};
use crate::hash::{hash, Hash};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur during transaction operations.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TransactionError {
    #[error("cannot sign transactions for another wallet")]
    KeyMismatch,
    #[error("no signature in this transaction")]
    MissingSignature,
}

/// Origin of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sender {
    /// A wallet that must sign for its own transfers.
    Wallet(Address),
    /// The ledger itself paying a mining reward. Never signed.
    SystemReward,
}

impl Sender {
    /// The wallet address, if this sender is a wallet.
    pub fn address(&self) -> Option<&Address> {
        match self {
            Sender::Wallet(address) => Some(address),
            Sender::SystemReward => None,
        }
    }
}

impl From<Address> for Sender {
    fn from(address: Address) -> Self {
        Sender::Wallet(address)
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sender::Wallet(address) => write!(f, "{}", address),
            Sender::SystemReward => write!(f, "Supplier"),
        }
    }
}

/// A signed intent to move value between two addresses.
///
/// Both endpoints are optional so that an incompletely addressed transfer can be
/// represented and rejected on submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Sender.
    pub from: Option<Sender>,
    /// Recipient's address.
    pub to: Option<Address>,
    /// Value to transfer. Negative amounts are not rejected by the ledger.
    pub amount: i64,
    /// Signature over [`Transaction::digest`], present once signed.
    pub signature: Option<Signature>,
}

/// Signed content of a transaction, in canonical field order.
#[derive(Serialize)]
struct SigningPayload<'a> {
    from: &'a Option<Sender>,
    to: &'a Option<Address>,
    amount: i64,
}

impl Transaction {
    /// Create a new unsigned transaction. No validation happens here.
    pub fn new(from: impl Into<Sender>, to: Address, amount: i64) -> Self {
        Self {
            from: Some(from.into()),
            to: Some(to),
            amount,
            signature: None,
        }
    }

    /// Create an unsigned mining reward paid by the ledger.
    pub fn reward(to: Address, amount: i64) -> Self {
        Self::new(Sender::SystemReward, to, amount)
    }

    /// Digest of `(from, to, amount)`; the signature is not part of it.
    pub fn digest(&self) -> Hash {
        let payload = SigningPayload {
            from: &self.from,
            to: &self.to,
            amount: self.amount,
        };
        let encoded = bincode::serialize(&payload).expect("serialization should not fail");
        hash(&encoded)
    }

    /// Sign the transaction. Only the holder of the sending wallet's key may sign.
    pub fn sign(&mut self, keypair: &Keypair) -> Result<(), TransactionError> {
        if self.from != Some(Sender::Wallet(keypair.address())) {
            return Err(TransactionError::KeyMismatch);
        }
        self.signature = Some(keypair.sign_hash(&self.digest()));
        Ok(())
    }

    /// Create a signed transaction.
    pub fn signed(mut self, keypair: &Keypair) -> Result<Self, TransactionError> {
        self.sign(keypair)?;
        Ok(self)
    }

    /// Check the transaction's signature.
    ///
    /// Rewards are trusted without a signature. Any other transaction without a
    /// signature is an error; a signature that does not verify against the
    /// sender's address is `Ok(false)`.
    pub fn is_valid(&self) -> Result<bool, TransactionError> {
        if self.is_reward() {
            return Ok(true);
        }

        let signature = self
            .signature
            .as_ref()
            .ok_or(TransactionError::MissingSignature)?;

        let Some(Sender::Wallet(address)) = &self.from else {
            return Ok(false);
        };
        let Ok(public_key) = address.to_public_key() else {
            return Ok(false);
        };

        Ok(public_key
            .verify(self.digest().as_bytes(), signature)
            .is_ok())
    }

    /// Whether this is a ledger-issued reward.
    pub fn is_reward(&self) -> bool {
        self.from == Some(Sender::SystemReward)
    }

    /// Whether both endpoints are populated.
    pub fn is_addressed(&self) -> bool {
        self.from.is_some() && self.to.is_some()
    }

    /// Whether `address` is the sending wallet.
    pub fn is_sent_by(&self, address: &Address) -> bool {
        self.from.as_ref().and_then(Sender::address) == Some(address)
    }

    /// Whether `address` is the recipient.
    pub fn is_received_by(&self, address: &Address) -> bool {
        self.to.as_ref() == Some(address)
    }

    /// Whether `address` is either endpoint.
    pub fn involves(&self, address: &Address) -> bool {
        self.is_sent_by(address) || self.is_received_by(address)
    }
}
