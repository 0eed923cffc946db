//! The transaction envelope: source instructions plus signature slots, and
//! its wire format.
//!
//! ```text
//! Transaction:
//!   num_signatures          short vec length
//!   signatures              64 bytes * num_signatures
//!   message                 (see `message`)
//! ```
//!
//! The envelope never stores a compiled [`Message`]. Every operation that
//! needs one compiles it from the current fields, so edits to instructions
//! or the blockhash cannot leave a stale copy behind.

use base64::Engine as _;
use log::{debug, trace};

use crate::error::TransactionError;
use crate::hash::Blockhash;
use crate::instruction::{AccountMeta, Instruction, NonceInformation};
use crate::message::{Message, Reader};
use crate::pubkey::Pubkey;
use crate::short_vec;
use crate::signature::{Ed25519Verifier, Signature, Signer, SignerSource, Verifier, SIGNATURE_BYTES};

/// Largest serialized transaction: IPv6 minimum MTU minus the IPv6 and
/// fragment headers.
pub const PACKET_DATA_SIZE: usize = 1280 - 40 - 8;

/// Signature slot count at which serialization refuses the envelope.
pub const MAX_SIGNATURES: usize = 4 * 64;

/// One signature slot: the key that must sign and its signature, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SigPubkeyPair {
    pub pubkey: Pubkey,
    pub signature: Option<Signature>,
}

impl SigPubkeyPair {
    fn unsigned(pubkey: Pubkey) -> Self {
        Self {
            pubkey,
            signature: None,
        }
    }
}

/// Checks applied by [`Transaction::serialize_with_config`] and
/// [`Transaction::serialize_with_verifier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerializeConfig {
    /// Fail with `BadSignature` unless every slot holds a valid signature.
    pub verify_signatures: bool,
    /// Fail with `Unsigned` on any empty slot. When off, empty slots are
    /// written as 64 zero bytes.
    pub require_all_signatures: bool,
}

impl Default for SerializeConfig {
    fn default() -> Self {
        Self {
            verify_signatures: true,
            require_all_signatures: true,
        }
    }
}

/// Something [`Transaction::add`] accepts.
#[derive(Debug, Clone)]
pub enum TransactionItem {
    Instruction(Instruction),
    /// Contributes its instructions only.
    Transaction(Transaction),
}

impl From<Instruction> for TransactionItem {
    fn from(ix: Instruction) -> Self {
        TransactionItem::Instruction(ix)
    }
}

impl From<Transaction> for TransactionItem {
    fn from(tx: Transaction) -> Self {
        TransactionItem::Transaction(tx)
    }
}

/// A transaction under construction, partially signed, or decoded from the
/// wire.
#[derive(Debug, Clone, Default)]
pub struct Transaction {
    /// Explicit fee payer. When unset the first signature slot pays.
    pub fee_payer: Option<Pubkey>,
    pub instructions: Vec<Instruction>,
    pub signatures: Vec<SigPubkeyPair>,
    pub recent_blockhash: Option<Blockhash>,
    pub nonce_info: Option<NonceInformation>,
}

// Equality ignores `fee_payer`: a decoded transaction only knows its payer
// as the first signature slot.
impl PartialEq for Transaction {
    fn eq(&self, other: &Self) -> bool {
        self.instructions == other.instructions
            && self.recent_blockhash == other.recent_blockhash
            && self.nonce_info == other.nonce_info
            && self.signatures == other.signatures
    }
}

impl Eq for Transaction {}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

impl Transaction {
    pub fn new(recent_blockhash: Option<Blockhash>) -> Self {
        Self {
            recent_blockhash,
            ..Self::default()
        }
    }

    pub fn with_fee_payer(mut self, fee_payer: Pubkey) -> Self {
        self.fee_payer = Some(fee_payer);
        self
    }

    pub fn with_nonce_info(mut self, nonce_info: NonceInformation) -> Self {
        self.nonce_info = Some(nonce_info);
        self
    }

    /// Append instructions. A transaction item contributes its instruction
    /// list; nothing is validated until compilation.
    pub fn add<I>(&mut self, items: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<TransactionItem>,
    {
        for item in items {
            match item.into() {
                TransactionItem::Instruction(ix) => self.instructions.push(ix),
                TransactionItem::Transaction(tx) => self.instructions.extend(tx.instructions),
            }
        }
        self
    }

    /// The fee payer's signature, which also identifies the transaction.
    pub fn signature(&self) -> Option<Signature> {
        self.signatures.first().and_then(|pair| pair.signature)
    }
}

// ---------------------------------------------------------------------------
// Compilation and signing
// ---------------------------------------------------------------------------

impl Transaction {
    /// Compile the current fields into a message.
    pub fn compile_message(&self) -> Result<Message, TransactionError> {
        let seeds: Vec<Pubkey> = self.signatures.iter().map(|pair| pair.pubkey).collect();
        Message::compile(
            &self.instructions,
            self.recent_blockhash,
            self.nonce_info.as_ref(),
            self.fee_payer,
            &seeds,
        )
    }

    /// The bytes every signer signs.
    pub fn serialize_message(&self) -> Result<Vec<u8>, TransactionError> {
        Ok(self.compile_message()?.serialize())
    }

    /// Replace the signature slots and sign with every signer.
    ///
    /// The first signer pays fees unless `fee_payer` is set.
    pub fn sign(&mut self, signers: &[&dyn Signer]) -> Result<(), TransactionError> {
        let sources: Vec<SignerSource<'_>> =
            signers.iter().map(|signer| SignerSource::Resolved(*signer)).collect();
        self.sign_partial(&sources)
    }

    /// Replace the signature slots and sign with the resolved sources.
    ///
    /// Unresolved sources reserve a slot for a signature supplied later via
    /// [`add_signer`](Self::add_signer) or
    /// [`add_signature`](Self::add_signature). Any other slot the message
    /// requires is left empty as well.
    pub fn sign_partial(&mut self, signers: &[SignerSource<'_>]) -> Result<(), TransactionError> {
        let mut seeds: Vec<Pubkey> = Vec::with_capacity(signers.len());
        for signer in signers {
            let pubkey = signer.pubkey();
            if !seeds.contains(&pubkey) {
                seeds.push(pubkey);
            }
        }

        let message = Message::compile(
            &self.instructions,
            self.recent_blockhash,
            self.nonce_info.as_ref(),
            self.fee_payer,
            &seeds,
        )?;
        let message_bytes = message.serialize();

        let mut slots: Vec<SigPubkeyPair> = message
            .signer_keys()
            .iter()
            .map(|pubkey| SigPubkeyPair::unsigned(*pubkey))
            .collect();

        let mut signed = 0usize;
        for source in signers {
            let SignerSource::Resolved(signer) = source else {
                continue;
            };
            let pubkey = signer.pubkey();
            if let Some(slot) = slots.iter_mut().find(|slot| slot.pubkey == pubkey) {
                slot.signature = Some(signer.sign_message(&message_bytes));
                signed += 1;
            }
        }

        debug!("signed {signed} of {} signature slots", slots.len());
        self.signatures = slots;
        Ok(())
    }

    /// Sign the current message with `signer` and store the result in its
    /// slot.
    pub fn add_signer(&mut self, signer: &dyn Signer) -> Result<(), TransactionError> {
        let message_bytes = self.serialize_message()?;
        let signature = signer.sign_message(&message_bytes);
        self.add_signature(&signer.pubkey(), signature.as_ref())
    }

    /// Store an externally produced signature in the slot of `pubkey`,
    /// replacing any earlier one.
    ///
    /// An envelope without slots gets one empty slot per required signer
    /// first.
    pub fn add_signature(&mut self, pubkey: &Pubkey, signature: &[u8]) -> Result<(), TransactionError> {
        let signature = Signature::try_from(signature)?;

        if self.signatures.is_empty() {
            let message = self.compile_message()?;
            self.signatures = message
                .signer_keys()
                .iter()
                .map(|key| SigPubkeyPair::unsigned(*key))
                .collect();
        }

        let slot = self
            .signatures
            .iter_mut()
            .find(|pair| pair.pubkey == *pubkey)
            .ok_or(TransactionError::UnknownSigner(*pubkey))?;
        slot.signature = Some(signature);
        Ok(())
    }

    /// Whether every required signer has a valid Ed25519 signature over the
    /// current message.
    pub fn verify_signatures(&self) -> bool {
        self.verify_signatures_with(&Ed25519Verifier)
    }

    /// [`verify_signatures`](Self::verify_signatures) with a custom verifier.
    pub fn verify_signatures_with(&self, verifier: &dyn Verifier) -> bool {
        match self.compile_message() {
            Ok(message) => self.verify_slots(&message, &message.serialize(), verifier),
            Err(_) => false,
        }
    }

    fn signature_for(&self, pubkey: &Pubkey) -> Option<Signature> {
        self.signatures
            .iter()
            .find(|pair| pair.pubkey == *pubkey)
            .and_then(|pair| pair.signature)
    }

    fn verify_slots(&self, message: &Message, message_bytes: &[u8], verifier: &dyn Verifier) -> bool {
        message.signer_keys().iter().all(|pubkey| {
            self.signature_for(pubkey)
                .is_some_and(|signature| verifier.verify(pubkey, message_bytes, &signature))
        })
    }
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

impl Transaction {
    /// Serialize a fully signed transaction, verifying every signature.
    pub fn serialize(&self) -> Result<Vec<u8>, TransactionError> {
        self.serialize_with_config(SerializeConfig::default())
    }

    pub fn serialize_with_config(&self, config: SerializeConfig) -> Result<Vec<u8>, TransactionError> {
        self.serialize_with_verifier(config, &Ed25519Verifier)
    }

    /// Serialize, checking signatures with `verifier` when
    /// `config.verify_signatures` is set.
    pub fn serialize_with_verifier(
        &self,
        config: SerializeConfig,
        verifier: &dyn Verifier,
    ) -> Result<Vec<u8>, TransactionError> {
        if self.signatures.len() >= MAX_SIGNATURES {
            return Err(TransactionError::TooManySignatures(self.signatures.len()));
        }
        if self.signatures.iter().all(|pair| pair.signature.is_none()) {
            return Err(TransactionError::Unsigned);
        }

        let message = self.compile_message()?;
        let message_bytes = message.serialize();

        if config.verify_signatures && !self.verify_slots(&message, &message_bytes, verifier) {
            return Err(TransactionError::BadSignature);
        }

        let signer_keys = message.signer_keys();
        let mut wire = Vec::with_capacity(
            short_vec::MAX_ENCODING_LENGTH + signer_keys.len() * SIGNATURE_BYTES + message_bytes.len(),
        );

        wire.extend_from_slice(&short_vec::encode_length(signer_keys.len()));
        for pubkey in signer_keys {
            match self.signature_for(pubkey) {
                Some(signature) => wire.extend_from_slice(signature.as_ref()),
                None if config.require_all_signatures => return Err(TransactionError::Unsigned),
                None => wire.extend_from_slice(&[0u8; SIGNATURE_BYTES]),
            }
        }
        wire.extend_from_slice(&message_bytes);

        if wire.len() > PACKET_DATA_SIZE {
            return Err(TransactionError::TooLarge {
                size: wire.len(),
                max: PACKET_DATA_SIZE,
            });
        }

        trace!(
            "serialized transaction: {} signatures, {} bytes",
            signer_keys.len(),
            wire.len()
        );
        Ok(wire)
    }

    /// Decode wire bytes. All-zero signatures come back as empty slots.
    pub fn deserialize(data: &[u8]) -> Result<Self, TransactionError> {
        let mut reader = Reader::new(data);

        let num_signatures = reader.read_length("signature count")?;
        let mut signatures = Vec::with_capacity(num_signatures.min(reader.remaining() / SIGNATURE_BYTES));
        for _ in 0..num_signatures {
            signatures.push(Signature::new_from_array(reader.read_array("signature")?));
        }

        let message_start = reader.position();
        let (message, consumed) = Message::decode(&data[message_start..])?;
        let trailing = data.len() - message_start - consumed;
        if trailing > 0 {
            return Err(TransactionError::TrailingBytes(trailing));
        }

        trace!(
            "deserialized transaction: {} signatures, {} bytes",
            signatures.len(),
            data.len()
        );
        Self::populate(message, signatures)
    }

    /// Rebuild an envelope from a compiled message and its signatures in
    /// slot order.
    ///
    /// Instruction account flags come from the header regions. Missing
    /// trailing signatures and all-zero signatures become empty slots.
    pub fn populate(message: Message, signatures: Vec<Signature>) -> Result<Self, TransactionError> {
        let signer_keys = message.signer_keys();
        if signatures.len() > signer_keys.len() {
            return Err(TransactionError::InvalidHeader(format!(
                "{} signatures for {} required signers",
                signatures.len(),
                signer_keys.len()
            )));
        }

        let slots = signer_keys
            .iter()
            .enumerate()
            .map(|(idx, pubkey)| SigPubkeyPair {
                pubkey: *pubkey,
                signature: signatures.get(idx).copied().filter(|sig| !sig.is_default()),
            })
            .collect();

        let key_at = |index: u8| {
            message
                .account_keys
                .get(index as usize)
                .copied()
                .ok_or(TransactionError::IndexOutOfRange {
                    index,
                    len: message.account_keys.len(),
                })
        };

        let mut instructions = Vec::with_capacity(message.instructions.len());
        for compiled in &message.instructions {
            let program_id = key_at(compiled.program_id_index)?;
            let accounts = compiled
                .accounts
                .iter()
                .map(|&index| -> Result<AccountMeta, TransactionError> {
                    Ok(AccountMeta {
                        pubkey: key_at(index)?,
                        is_signer: message.is_signer(index as usize),
                        is_writable: message.is_writable(index as usize),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;

            instructions.push(Instruction::new(program_id, accounts, compiled.data.clone()));
        }

        Ok(Self {
            fee_payer: None,
            instructions,
            signatures: slots,
            recent_blockhash: Some(message.recent_blockhash),
            nonce_info: None,
        })
    }

    /// Base64 of [`serialize`](Self::serialize), the form RPC nodes accept.
    pub fn to_base64(&self) -> Result<String, TransactionError> {
        Ok(base64::engine::general_purpose::STANDARD.encode(self.serialize()?))
    }

    pub fn from_base64(encoded: &str) -> Result<Self, TransactionError> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| TransactionError::InvalidEncoding(format!("base64 decode failed: {e}")))?;
        Self::deserialize(&bytes)
    }
}
