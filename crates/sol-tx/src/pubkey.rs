//! Account public keys and program-derived addresses.
//!
//! A public key is a raw 32-byte Ed25519 point. Its text form is plain
//! Base58 (no checksum, no hashing), the same alphabet the `bs58` crate uses.

use std::fmt;
use std::str::FromStr;

use sha2::{Digest, Sha256};

use crate::error::TransactionError;

/// Number of bytes in a public key.
pub const PUBKEY_BYTES: usize = 32;

/// Maximum length of a single derivation seed.
pub const MAX_SEED_LEN: usize = 32;

/// Maximum number of seeds for a program-derived address.
pub const MAX_SEEDS: usize = 16;

/// The string appended to PDA derivation.
const PDA_MARKER: &[u8] = b"ProgramDerivedAddress";

/// A 32-byte account address.
///
/// Ordering is byte-wise, which is the order the account table uses within
/// each signer/writable group.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pubkey([u8; PUBKEY_BYTES]);

impl Pubkey {
    pub const fn new_from_array(bytes: [u8; PUBKEY_BYTES]) -> Self {
        Self(bytes)
    }

    pub const fn to_bytes(self) -> [u8; PUBKEY_BYTES] {
        self.0
    }

    pub const fn as_array(&self) -> &[u8; PUBKEY_BYTES] {
        &self.0
    }

    /// Derive an address from a base key, a UTF-8 seed and an owning program:
    /// `SHA-256(base || seed || program_id)`.
    pub fn create_with_seed(
        base: &Pubkey,
        seed: &str,
        program_id: &Pubkey,
    ) -> Result<Pubkey, TransactionError> {
        if seed.len() > MAX_SEED_LEN {
            return Err(TransactionError::InvalidSeeds(format!(
                "seed is {} bytes, max {MAX_SEED_LEN}",
                seed.len()
            )));
        }

        let mut hasher = Sha256::new();
        hasher.update(base.0);
        hasher.update(seed.as_bytes());
        hasher.update(program_id.0);
        Ok(Pubkey(hasher.finalize().into()))
    }

    /// Derive a program address from `seeds` and `program_id`.
    ///
    /// Fails if the hash lands on the Ed25519 curve; a program address must
    /// have no private key.
    pub fn create_program_address(
        seeds: &[&[u8]],
        program_id: &Pubkey,
    ) -> Result<Pubkey, TransactionError> {
        check_seeds(seeds, MAX_SEEDS)?;
        try_create_program_address(seeds, &[], program_id).ok_or_else(|| {
            TransactionError::InvalidSeeds("address must fall off the curve".into())
        })
    }

    /// Find a valid program address and its bump seed.
    ///
    /// Tries bump seeds from 255 down to 1, appended as a final one-byte
    /// seed, and returns the first address that is off the curve.
    pub fn find_program_address(
        seeds: &[&[u8]],
        program_id: &Pubkey,
    ) -> Result<(Pubkey, u8), TransactionError> {
        // The bump occupies one of the seed slots.
        check_seeds(seeds, MAX_SEEDS - 1)?;

        for bump in (1u8..=255).rev() {
            if let Some(address) = try_create_program_address(seeds, &[bump], program_id) {
                return Ok((address, bump));
            }
        }

        Err(TransactionError::InvalidSeeds(
            "unable to find a viable program address bump seed".into(),
        ))
    }

    /// Whether these bytes decompress to a point on the Ed25519 curve.
    pub fn is_on_curve(&self) -> bool {
        curve25519_dalek::edwards::CompressedEdwardsY(self.0)
            .decompress()
            .is_some()
    }
}

fn check_seeds(seeds: &[&[u8]], max_seeds: usize) -> Result<(), TransactionError> {
    if seeds.len() > max_seeds {
        return Err(TransactionError::InvalidSeeds(format!(
            "{} seeds, max {max_seeds}",
            seeds.len()
        )));
    }
    if let Some(seed) = seeds.iter().find(|s| s.len() > MAX_SEED_LEN) {
        return Err(TransactionError::InvalidSeeds(format!(
            "seed is {} bytes, max {MAX_SEED_LEN}",
            seed.len()
        )));
    }
    Ok(())
}

/// `SHA-256(seed_0 || .. || seed_n || bump || program_id || "ProgramDerivedAddress")`,
/// or `None` when the result is a valid curve point.
fn try_create_program_address(
    seeds: &[&[u8]],
    bump_seed: &[u8],
    program_id: &Pubkey,
) -> Option<Pubkey> {
    let mut hasher = Sha256::new();
    for seed in seeds {
        hasher.update(seed);
    }
    hasher.update(bump_seed);
    hasher.update(program_id.0);
    hasher.update(PDA_MARKER);

    let address = Pubkey(hasher.finalize().into());
    if address.is_on_curve() {
        return None;
    }
    Some(address)
}

impl From<[u8; PUBKEY_BYTES]> for Pubkey {
    fn from(bytes: [u8; PUBKEY_BYTES]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for Pubkey {
    type Error = TransactionError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let arr: [u8; PUBKEY_BYTES] = bytes.try_into().map_err(|_| {
            TransactionError::InvalidPubkey(format!("expected 32 bytes, got {}", bytes.len()))
        })?;
        Ok(Self(arr))
    }
}

impl AsRef<[u8]> for Pubkey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl FromStr for Pubkey {
    type Err = TransactionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| TransactionError::InvalidPubkey(format!("base58 decode failed: {e}")))?;
        Self::try_from(bytes.as_slice())
    }
}

impl fmt::Display for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pk(s: &str) -> Pubkey {
        s.parse().unwrap()
    }

    /// The System Program address is 32 zero bytes.
    #[test]
    fn default_is_system_program() {
        assert_eq!(
            Pubkey::default().to_string(),
            "11111111111111111111111111111111"
        );
    }

    #[test]
    fn roundtrip_encode_decode() {
        for address in [
            "CiDwVBFgWV9E5MvXWoLgnEgn2hK7rJikbvfWavzAQz3",
            "1111111111111111111111111111BukQL",
            "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA",
        ] {
            assert_eq!(pk(address).to_string(), address);
        }
    }

    #[test]
    fn parse_garbage_fails() {
        assert!("not-a-valid-address!!!".parse::<Pubkey>().is_err());
    }

    #[test]
    fn parse_short_key_fails() {
        // "1" decodes to a single zero byte.
        let err = "1".parse::<Pubkey>().unwrap_err();
        assert!(err.to_string().contains("expected 32 bytes, got 1"));
    }

    #[test]
    fn try_from_slice_checks_length() {
        assert!(Pubkey::try_from(&[0u8; 31][..]).is_err());
        assert_eq!(
            Pubkey::try_from(&[7u8; 32][..]).unwrap(),
            Pubkey::new_from_array([7; 32])
        );
    }

    #[test]
    fn ordering_is_bytewise() {
        let a = Pubkey::new_from_array([1; 32]);
        let mut b_bytes = [1; 32];
        b_bytes[31] = 2;
        let b = Pubkey::new_from_array(b_bytes);
        assert!(a < b);
    }

    // -- derivation ---------------------------------------------------------

    #[test]
    fn create_program_address_known_vectors() {
        let program_id = pk("BPFLoader1111111111111111111111111111111111");

        let address = Pubkey::create_program_address(&[b"", &[1]], &program_id).unwrap();
        assert_eq!(address, pk("3gF2KMe9KiC6FNVBmfg9i267aMPvK37FewCip4eGBFcT"));

        let address = Pubkey::create_program_address(&["☉".as_bytes()], &program_id).unwrap();
        assert_eq!(address, pk("7ytmC1nT1xY4RfxCV2ZgyA7UakC93do5ZdyhdF3EtPj7"));

        let address =
            Pubkey::create_program_address(&[b"Talking", b"Squirrels"], &program_id).unwrap();
        assert_eq!(address, pk("HwRVBufQ4haG5XSgpspwKtNd3PC9GM9m1196uJW36vds"));

        let seed = pk("SeedPubey1111111111111111111111111111111111");
        let address = Pubkey::create_program_address(&[seed.as_ref()], &program_id).unwrap();
        assert_eq!(address, pk("GUs5qLUfsEHkcMB9T38vjr18ypEhRuNWiePW2LoK4E3K"));

        let other = Pubkey::create_program_address(&[b"Talking"], &program_id).unwrap();
        assert_ne!(other, address);
    }

    #[test]
    fn create_program_address_with_numeric_seed() {
        let base = pk("H4snTKK9adiU15gP22ErfZYtro3aqR9BTMXiH3AwiUTQ");
        let index = 2u64.to_le_bytes();
        let address = Pubkey::create_program_address(
            &[base.as_ref(), &index],
            &pk("4ckmDgGdxQoPDLUkDT3vHgSAkzA3QRdNq5ywwY4sUSJn"),
        )
        .unwrap();
        assert_eq!(address, pk("12rqwuEgBYiGhBrDJStCiqEtzQpTTiZbh7teNVLuYcFA"));
    }

    #[test]
    fn create_program_address_rejects_long_seed() {
        let long_seed = [0u8; MAX_SEED_LEN + 1];
        let result = Pubkey::create_program_address(&[&long_seed], &Pubkey::default());
        assert!(matches!(result, Err(TransactionError::InvalidSeeds(_))));
    }

    #[test]
    fn find_program_address_matches_create() {
        let program_id = pk("BPFLoader1111111111111111111111111111111111");
        let (address, bump) = Pubkey::find_program_address(&[b""], &program_id).unwrap();
        assert_eq!(
            address,
            Pubkey::create_program_address(&[b"", &[bump]], &program_id).unwrap()
        );
        assert!(!address.is_on_curve());
    }

    #[test]
    fn on_curve_check() {
        assert!(pk("4fwsi7ei2vDcUByZWXV3YmMEyLwBnLamiuDzUrEKADnm").is_on_curve());
        assert!(!pk("12rqwuEgBYiGhBrDJStCiqEtzQpTTiZbh7teNVLuYcFA").is_on_curve());
    }

    #[test]
    fn create_with_seed_known_vector() {
        let base = Pubkey::default();
        let derived = Pubkey::create_with_seed(&base, "limber chicken: 4/45", &base).unwrap();
        assert_eq!(derived, pk("9h1HyLCW5dZnBVap8C5egQ9Z6pHyjsh5MNy83iPqqRuq"));
    }

    #[test]
    fn create_with_seed_rejects_long_seed() {
        let seed = "x".repeat(MAX_SEED_LEN + 1);
        assert!(Pubkey::create_with_seed(&Pubkey::default(), &seed, &Pubkey::default()).is_err());
    }
}
