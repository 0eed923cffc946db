//! The message: the part of a transaction that gets signed.
//!
//! ```text
//! Message:
//!   num_required_sigs     u8
//!   num_readonly_signed   u8
//!   num_readonly_unsigned u8
//!   num_accounts          short vec length
//!   account_keys          32 bytes * num_accounts
//!   recent_blockhash      32 bytes
//!   num_instructions      short vec length
//!   instructions[]        (see below)
//!
//! Instruction:
//!   program_id_index      u8
//!   num_accounts          short vec length
//!   account_indices       u8 * num_accounts
//!   data_len              short vec length
//!   data                  u8 * data_len
//! ```

use std::borrow::Cow;

use log::{debug, trace};

use crate::account_keys::{collect_account_metas, compile_keys};
use crate::error::TransactionError;
use crate::hash::{Blockhash, HASH_BYTES};
use crate::instruction::{CompiledInstruction, Instruction, NonceInformation};
use crate::pubkey::{Pubkey, PUBKEY_BYTES};
use crate::short_vec;

/// Three counts that split `account_keys` into signer / non-signer and
/// writable / read-only regions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessageHeader {
    /// The first `num_required_signatures` keys must sign.
    pub num_required_signatures: u8,
    /// The last `num_readonly_signed_accounts` signer keys are read-only.
    pub num_readonly_signed_accounts: u8,
    /// The last `num_readonly_unsigned_accounts` non-signer keys are read-only.
    pub num_readonly_unsigned_accounts: u8,
}

/// A compiled message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub header: MessageHeader,
    pub account_keys: Vec<Pubkey>,
    /// Recent blockhash, or the stored nonce value for a durable-nonce
    /// transaction.
    pub recent_blockhash: Blockhash,
    pub instructions: Vec<CompiledInstruction>,
}

// ---------------------------------------------------------------------------
// Compilation
// ---------------------------------------------------------------------------

impl Message {
    /// Compile source instructions into a message.
    ///
    /// `seed_signers` are the keys of signature slots the envelope already
    /// holds; each stays a required signer even if no instruction asks for
    /// it, and the first one pays fees unless `fee_payer` is set. With
    /// `nonce_info`, the advance-nonce instruction runs first and its nonce
    /// value replaces `recent_blockhash`.
    pub fn compile(
        instructions: &[Instruction],
        recent_blockhash: Option<Blockhash>,
        nonce_info: Option<&NonceInformation>,
        fee_payer: Option<Pubkey>,
        seed_signers: &[Pubkey],
    ) -> Result<Self, TransactionError> {
        let (instructions, recent_blockhash): (Cow<'_, [Instruction]>, _) = match nonce_info {
            Some(nonce) => {
                let mut with_nonce = Vec::with_capacity(instructions.len() + 1);
                if instructions.first() != Some(&nonce.nonce_instruction) {
                    with_nonce.push(nonce.nonce_instruction.clone());
                }
                with_nonce.extend_from_slice(instructions);
                (Cow::Owned(with_nonce), Some(nonce.nonce))
            }
            None => (Cow::Borrowed(instructions), recent_blockhash),
        };

        let recent_blockhash = recent_blockhash.ok_or(TransactionError::MissingBlockhash)?;
        if instructions.is_empty() {
            return Err(TransactionError::EmptyInstructions);
        }

        let collected = collect_account_metas(&instructions)?;
        let keys = compile_keys(seed_signers, fee_payer, &collected.metas)?;

        let lookup = |pubkey: &Pubkey| {
            keys.position(pubkey)
                .ok_or(TransactionError::UnknownAccountKey(*pubkey))
        };

        let mut compiled = Vec::with_capacity(instructions.len());
        for ix in instructions.iter() {
            let program_id_index = lookup(&ix.program_id)?;
            let accounts = ix
                .accounts
                .iter()
                .map(|meta| lookup(&meta.pubkey))
                .collect::<Result<Vec<u8>, _>>()?;

            compiled.push(CompiledInstruction {
                program_id_index,
                accounts,
                data: ix.data.clone(),
            });
        }

        debug!(
            "compiled message: {} keys, {} signers, {} instructions over {} programs",
            keys.account_keys.len(),
            keys.header.num_required_signatures,
            compiled.len(),
            collected.program_ids.len()
        );

        Ok(Self {
            header: keys.header,
            account_keys: keys.account_keys,
            recent_blockhash,
            instructions: compiled,
        })
    }

    /// Whether the key at `index` must sign.
    pub fn is_signer(&self, index: usize) -> bool {
        index < self.header.num_required_signatures as usize
    }

    /// Whether the key at `index` may be written.
    pub fn is_writable(&self, index: usize) -> bool {
        let required = self.header.num_required_signatures as usize;
        let readonly_signed = self.header.num_readonly_signed_accounts as usize;
        let readonly_unsigned = self.header.num_readonly_unsigned_accounts as usize;

        if index < required {
            index < required.saturating_sub(readonly_signed)
        } else {
            index < self.account_keys.len().saturating_sub(readonly_unsigned)
        }
    }

    /// Keys whose signatures the message requires, in slot order.
    pub fn signer_keys(&self) -> &[Pubkey] {
        let required = (self.header.num_required_signatures as usize).min(self.account_keys.len());
        &self.account_keys[..required]
    }
}

// ---------------------------------------------------------------------------
// Wire codec
// ---------------------------------------------------------------------------

impl Message {
    /// Serialize into the signed byte form.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(
            3 + short_vec::MAX_ENCODING_LENGTH * 2
                + self.account_keys.len() * PUBKEY_BYTES
                + HASH_BYTES
                + self
                    .instructions
                    .iter()
                    .map(|ix| 1 + ix.accounts.len() + ix.data.len() + 2 * short_vec::MAX_ENCODING_LENGTH)
                    .sum::<usize>(),
        );

        buf.push(self.header.num_required_signatures);
        buf.push(self.header.num_readonly_signed_accounts);
        buf.push(self.header.num_readonly_unsigned_accounts);

        buf.extend_from_slice(&short_vec::encode_length(self.account_keys.len()));
        for key in &self.account_keys {
            buf.extend_from_slice(key.as_ref());
        }

        buf.extend_from_slice(self.recent_blockhash.as_ref());

        buf.extend_from_slice(&short_vec::encode_length(self.instructions.len()));
        for ix in &self.instructions {
            buf.push(ix.program_id_index);

            buf.extend_from_slice(&short_vec::encode_length(ix.accounts.len()));
            buf.extend_from_slice(&ix.accounts);

            buf.extend_from_slice(&short_vec::encode_length(ix.data.len()));
            buf.extend_from_slice(&ix.data);
        }

        trace!("serialized message: {} bytes", buf.len());
        buf
    }

    /// Decode a message from the front of `data`.
    ///
    /// Returns `(message, bytes_consumed)`; bytes after the message are left
    /// for the caller.
    pub fn decode(data: &[u8]) -> Result<(Self, usize), TransactionError> {
        let mut reader = Reader::new(data);

        let header = MessageHeader {
            num_required_signatures: reader.read_u8("header")?,
            num_readonly_signed_accounts: reader.read_u8("header")?,
            num_readonly_unsigned_accounts: reader.read_u8("header")?,
        };

        let num_keys = reader.read_length("account key count")?;
        let mut account_keys = Vec::with_capacity(num_keys.min(data.len() / PUBKEY_BYTES));
        for _ in 0..num_keys {
            let bytes = reader.read_array::<PUBKEY_BYTES>("account key")?;
            account_keys.push(Pubkey::new_from_array(bytes));
        }
        check_header(&header, account_keys.len())?;

        let recent_blockhash = Blockhash::new_from_array(reader.read_array("recent blockhash")?);

        let num_instructions = reader.read_length("instruction count")?;
        let mut instructions = Vec::with_capacity(num_instructions.min(reader.remaining()));
        for _ in 0..num_instructions {
            let program_id_index = reader.read_u8("program id index")?;
            check_index(program_id_index, account_keys.len())?;

            let num_accounts = reader.read_length("instruction account count")?;
            let accounts = reader.read_bytes(num_accounts, "instruction accounts")?.to_vec();
            for index in &accounts {
                check_index(*index, account_keys.len())?;
            }

            let data_len = reader.read_length("instruction data length")?;
            let data = reader.read_bytes(data_len, "instruction data")?.to_vec();

            instructions.push(CompiledInstruction {
                program_id_index,
                accounts,
                data,
            });
        }

        trace!("decoded message: {} bytes", reader.position());

        Ok((
            Self {
                header,
                account_keys,
                recent_blockhash,
                instructions,
            },
            reader.position(),
        ))
    }

    /// Decode a message that must span all of `data`.
    pub fn deserialize(data: &[u8]) -> Result<Self, TransactionError> {
        let (message, consumed) = Self::decode(data)?;
        if consumed != data.len() {
            return Err(TransactionError::TrailingBytes(data.len() - consumed));
        }
        Ok(message)
    }
}

fn check_index(index: u8, len: usize) -> Result<(), TransactionError> {
    if index as usize >= len {
        return Err(TransactionError::IndexOutOfRange { index, len });
    }
    Ok(())
}

fn check_header(header: &MessageHeader, num_keys: usize) -> Result<(), TransactionError> {
    let required = header.num_required_signatures as usize;
    let readonly_signed = header.num_readonly_signed_accounts as usize;
    let readonly_unsigned = header.num_readonly_unsigned_accounts as usize;

    if required > num_keys {
        return Err(TransactionError::InvalidHeader(format!(
            "{required} required signatures but only {num_keys} account keys"
        )));
    }
    if readonly_signed > 0 && readonly_signed >= required {
        return Err(TransactionError::InvalidHeader(format!(
            "{readonly_signed} readonly signers out of {required} signers"
        )));
    }
    if readonly_unsigned > num_keys - required {
        return Err(TransactionError::InvalidHeader(format!(
            "{readonly_unsigned} readonly non-signers out of {} non-signers",
            num_keys - required
        )));
    }
    Ok(())
}

/// Forward-only cursor over wire bytes.
pub(crate) struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub(crate) fn read_bytes(&mut self, len: usize, what: &str) -> Result<&'a [u8], TransactionError> {
        if self.remaining() < len {
            return Err(TransactionError::TruncatedMessage(format!(
                "{what}: need {len} bytes, {} left",
                self.remaining()
            )));
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    pub(crate) fn read_array<const N: usize>(&mut self, what: &str) -> Result<[u8; N], TransactionError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N, what)?);
        Ok(out)
    }

    pub(crate) fn read_u8(&mut self, what: &str) -> Result<u8, TransactionError> {
        Ok(self.read_bytes(1, what)?[0])
    }

    /// Running out of bytes before the final length byte is truncation; an
    /// over-long encoding is `MalformedLength`.
    pub(crate) fn read_length(&mut self, what: &str) -> Result<usize, TransactionError> {
        let rest = &self.data[self.pos..];
        let cut_off = rest.len() < short_vec::MAX_ENCODING_LENGTH
            && rest.iter().all(|byte| byte & 0x80 != 0);
        if cut_off {
            return Err(TransactionError::TruncatedMessage(format!(
                "{what}: length prefix cut off after {} bytes",
                rest.len()
            )));
        }
        let (len, consumed) = short_vec::decode_length(rest)?;
        self.pos += consumed;
        Ok(len)
    }
}
