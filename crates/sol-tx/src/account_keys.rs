//! Account table construction: collect every account a set of instructions
//! references, merge duplicates, and lay the result out in canonical order.
//!
//! Canonical order is:
//!   1. the fee payer (always a writable signer)
//!   2. writable signers
//!   3. read-only signers
//!   4. writable non-signers
//!   5. read-only non-signers
//!
//! Groups 2-5 are ordered by key bytes, so two implementations given the same
//! instructions and fee payer produce byte-identical messages.

use log::trace;

use crate::error::TransactionError;
use crate::instruction::{AccountMeta, Instruction};
use crate::message::MessageHeader;
use crate::pubkey::Pubkey;

/// Account indices are single bytes on the wire.
pub const MAX_ACCOUNT_KEYS: usize = u8::MAX as usize + 1;

/// Every account reference of a set of instructions, in instruction order,
/// followed by one read-only non-signer entry per distinct program id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedAccounts {
    pub metas: Vec<AccountMeta>,
    /// Distinct program ids in order of first use.
    pub program_ids: Vec<Pubkey>,
}

/// Flatten the account references of `instructions`.
///
/// Duplicates are kept; merging happens in [`compile_keys`].
pub fn collect_account_metas(
    instructions: &[Instruction],
) -> Result<CollectedAccounts, TransactionError> {
    let mut metas = Vec::with_capacity(instructions.iter().map(|ix| ix.accounts.len()).sum());
    let mut program_ids: Vec<Pubkey> = Vec::new();

    for (index, ix) in instructions.iter().enumerate() {
        if ix.accounts.is_empty() {
            return Err(TransactionError::InvalidInstruction(format!(
                "instruction {index} for program {} has no accounts",
                ix.program_id
            )));
        }
        metas.extend_from_slice(&ix.accounts);
        if !program_ids.contains(&ix.program_id) {
            program_ids.push(ix.program_id);
        }
    }

    // Program ids must be addressable from the account table.
    metas.extend(
        program_ids
            .iter()
            .map(|program_id| AccountMeta::new_readonly(*program_id, false)),
    );

    Ok(CollectedAccounts { metas, program_ids })
}

/// The deduplicated, ordered account table and the header describing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledKeys {
    pub header: MessageHeader,
    pub account_keys: Vec<Pubkey>,
}

impl CompiledKeys {
    /// Index of `pubkey` in the account table.
    pub fn position(&self, pubkey: &Pubkey) -> Option<u8> {
        self.account_keys
            .iter()
            .position(|k| k == pubkey)
            .map(|idx| idx as u8)
    }

    /// The signer prefix of the account table.
    pub fn signer_keys(&self) -> &[Pubkey] {
        &self.account_keys[..self.header.num_required_signatures as usize]
    }
}

#[derive(Debug, Clone, Copy)]
struct AccountEntry {
    pubkey: Pubkey,
    is_signer: bool,
    is_writable: bool,
}

// A plain Vec: account lists are tiny and insertion order matters for
// picking an implicit fee payer.
fn upsert(entries: &mut Vec<AccountEntry>, pubkey: Pubkey, is_signer: bool, is_writable: bool) {
    if let Some(entry) = entries.iter_mut().find(|e| e.pubkey == pubkey) {
        entry.is_signer |= is_signer;
        entry.is_writable |= is_writable;
    } else {
        entries.push(AccountEntry {
            pubkey,
            is_signer,
            is_writable,
        });
    }
}

/// Merge `metas` into a deduplicated account table.
///
/// `seed_signers` are keys already holding a signature slot on the envelope;
/// they are forced to be signers. The fee payer is `fee_payer` if given,
/// otherwise the first seeded signer, otherwise the first writable signer
/// among `metas`, otherwise the first signer. It is always placed at index 0
/// and promoted to writable.
pub fn compile_keys(
    seed_signers: &[Pubkey],
    fee_payer: Option<Pubkey>,
    metas: &[AccountMeta],
) -> Result<CompiledKeys, TransactionError> {
    let mut entries: Vec<AccountEntry> = Vec::with_capacity(seed_signers.len() + metas.len());

    for signer in seed_signers {
        upsert(&mut entries, *signer, true, false);
    }
    for meta in metas {
        upsert(&mut entries, meta.pubkey, meta.is_signer, meta.is_writable);
    }

    let fee_payer = fee_payer
        .or_else(|| seed_signers.first().copied())
        .or_else(|| {
            entries
                .iter()
                .find(|e| e.is_signer && e.is_writable)
                .map(|e| e.pubkey)
        })
        .or_else(|| entries.iter().find(|e| e.is_signer).map(|e| e.pubkey))
        .ok_or(TransactionError::MissingFeePayer)?;

    if let Some(pos) = entries.iter().position(|e| e.pubkey == fee_payer) {
        entries.remove(pos);
    }

    // Keys are unique at this point, so the sort is total.
    entries.sort_by_key(|e| (!e.is_signer, !e.is_writable, e.pubkey));

    let total = entries.len() + 1;
    if total > MAX_ACCOUNT_KEYS {
        return Err(TransactionError::TooManyAccounts(total));
    }

    let num_signers = 1 + entries.iter().filter(|e| e.is_signer).count();
    let num_readonly_signed = entries
        .iter()
        .filter(|e| e.is_signer && !e.is_writable)
        .count();
    let num_readonly_unsigned = entries
        .iter()
        .filter(|e| !e.is_signer && !e.is_writable)
        .count();

    let header = MessageHeader {
        num_required_signatures: u8::try_from(num_signers)
            .map_err(|_| TransactionError::TooManySignatures(num_signers))?,
        num_readonly_signed_accounts: num_readonly_signed as u8,
        num_readonly_unsigned_accounts: num_readonly_unsigned as u8,
    };

    let mut account_keys = Vec::with_capacity(total);
    account_keys.push(fee_payer);
    account_keys.extend(entries.iter().map(|e| e.pubkey));

    trace!(
        "account table: {} keys, fee payer {fee_payer}, header {:?}",
        account_keys.len(),
        header
    );

    Ok(CompiledKeys {
        header,
        account_keys,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(b: u8) -> Pubkey {
        Pubkey::new_from_array([b; 32])
    }

    fn ix(program: u8, accounts: Vec<AccountMeta>) -> Instruction {
        Instruction::new(key(program), accounts, vec![])
    }

    fn compile(instructions: &[Instruction], fee_payer: Option<Pubkey>) -> CompiledKeys {
        let collected = collect_account_metas(instructions).unwrap();
        compile_keys(&[], fee_payer, &collected.metas).unwrap()
    }

    // -- collection ---------------------------------------------------------

    #[test]
    fn collect_appends_each_program_once() {
        let instructions = [
            ix(9, vec![AccountMeta::new(key(1), true)]),
            ix(9, vec![AccountMeta::new(key(2), false)]),
            ix(8, vec![AccountMeta::new(key(1), true)]),
        ];
        let collected = collect_account_metas(&instructions).unwrap();

        assert_eq!(collected.program_ids, vec![key(9), key(8)]);
        // 3 instruction metas + 2 program metas.
        assert_eq!(collected.metas.len(), 5);
        assert_eq!(collected.metas[3], AccountMeta::new_readonly(key(9), false));
        assert_eq!(collected.metas[4], AccountMeta::new_readonly(key(8), false));
    }

    #[test]
    fn collect_rejects_instruction_without_accounts() {
        let result = collect_account_metas(&[ix(9, vec![])]);
        assert!(matches!(
            result,
            Err(TransactionError::InvalidInstruction(_))
        ));
    }

    // -- ordering -----------------------------------------------------------

    #[test]
    fn canonical_group_order() {
        let instructions = [ix(
            9,
            vec![
                AccountMeta::new_readonly(key(5), false),
                AccountMeta::new(key(4), false),
                AccountMeta::new_readonly(key(3), true),
                AccountMeta::new(key(2), true),
                AccountMeta::new(key(1), true),
            ],
        )];
        let compiled = compile(&instructions, None);

        // Fee payer is the first writable signer in reference order.
        assert_eq!(
            compiled.account_keys,
            vec![key(2), key(1), key(3), key(4), key(5), key(9)]
        );
        assert_eq!(compiled.header.num_required_signatures, 3);
        assert_eq!(compiled.header.num_readonly_signed_accounts, 1);
        assert_eq!(compiled.header.num_readonly_unsigned_accounts, 2);
    }

    #[test]
    fn duplicate_accounts_merge_flags() {
        let instructions = [
            ix(9, vec![AccountMeta::new_readonly(key(1), true), AccountMeta::new_readonly(key(2), false)]),
            ix(9, vec![AccountMeta::new(key(2), false), AccountMeta::new_readonly(key(2), true)]),
        ];
        let compiled = compile(&instructions, None);

        // key(2) merged into a writable signer and pays; key(1) stays read-only.
        assert_eq!(compiled.account_keys, vec![key(2), key(1), key(9)]);
        assert_eq!(compiled.header.num_required_signatures, 2);
        assert_eq!(compiled.header.num_readonly_signed_accounts, 1);
        assert_eq!(compiled.header.num_readonly_unsigned_accounts, 1);
    }

    #[test]
    fn explicit_fee_payer_is_first_and_writable() {
        let instructions = [ix(
            9,
            vec![
                AccountMeta::new(key(1), true),
                AccountMeta::new_readonly(key(7), true),
            ],
        )];
        let compiled = compile(&instructions, Some(key(7)));

        assert_eq!(compiled.account_keys[0], key(7));
        assert_eq!(compiled.header.num_required_signatures, 2);
        assert_eq!(compiled.header.num_readonly_signed_accounts, 0);
    }

    #[test]
    fn fee_payer_not_referenced_is_added() {
        let instructions = [ix(9, vec![AccountMeta::new(key(1), false)])];
        let compiled = compile(&instructions, Some(key(6)));

        assert_eq!(compiled.account_keys, vec![key(6), key(1), key(9)]);
        assert_eq!(compiled.header.num_required_signatures, 1);
    }

    #[test]
    fn seeded_signers_lead_and_stay_signers() {
        let instructions = [ix(
            9,
            vec![
                AccountMeta::new(key(1), true),
                AccountMeta::new_readonly(key(4), false),
            ],
        )];
        let collected = collect_account_metas(&instructions).unwrap();
        let compiled = compile_keys(&[key(4), key(1)], None, &collected.metas).unwrap();

        assert_eq!(compiled.account_keys, vec![key(4), key(1), key(9)]);
        assert_eq!(compiled.signer_keys(), &[key(4), key(1)]);
        assert_eq!(compiled.header.num_readonly_signed_accounts, 0);
    }

    #[test]
    fn seeded_readonly_signer_stays_readonly() {
        let instructions = [ix(
            9,
            vec![
                AccountMeta::new(key(1), true),
                AccountMeta::new_readonly(key(4), true),
            ],
        )];
        let collected = collect_account_metas(&instructions).unwrap();
        let compiled = compile_keys(&[key(1), key(4)], None, &collected.metas).unwrap();

        assert_eq!(compiled.header.num_readonly_signed_accounts, 1);
    }

    #[test]
    fn no_signer_is_missing_fee_payer() {
        let instructions = [ix(9, vec![AccountMeta::new(key(1), false)])];
        let collected = collect_account_metas(&instructions).unwrap();
        assert_eq!(
            compile_keys(&[], None, &collected.metas),
            Err(TransactionError::MissingFeePayer)
        );
    }

    #[test]
    fn no_duplicate_keys() {
        let instructions = [
            ix(9, vec![AccountMeta::new(key(1), true), AccountMeta::new(key(2), false)]),
            ix(9, vec![AccountMeta::new(key(2), false), AccountMeta::new(key(1), true)]),
            ix(1, vec![AccountMeta::new(key(9), false)]),
        ];
        let compiled = compile(&instructions, None);

        let mut sorted = compiled.account_keys.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), compiled.account_keys.len());
    }

    #[test]
    fn too_many_accounts() {
        let mut accounts = vec![AccountMeta::new(Pubkey::new_from_array([0xff; 32]), true)];
        for i in 0..256u32 {
            let mut bytes = [0u8; 32];
            bytes[..4].copy_from_slice(&i.to_le_bytes());
            accounts.push(AccountMeta::new_readonly(Pubkey::new_from_array(bytes), false));
        }
        let collected = collect_account_metas(&[ix(0xee, accounts)]).unwrap();
        assert!(matches!(
            compile_keys(&[], None, &collected.metas),
            Err(TransactionError::TooManyAccounts(258))
        ));
    }
}
