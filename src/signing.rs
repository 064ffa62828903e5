//! Recoverable ECDSA signatures over ticket hashes.
//!
//! Signatures are made directly over the 32 byte ticket hash, with no
//! message prefix, and serialized as `r || s || v` with `v` in `{27, 28}`,
//! which is the form the ledger's signature recovery expects.

use alloy_primitives::{keccak256, Address, B256};
use secp256k1::{
    ecdsa::{RecoverableSignature, RecoveryId},
    Message, PublicKey, SecretKey, SECP256K1,
};
use serde::{Deserialize, Serialize};

use crate::{consts::SIGNATURE_SIZE, errors::Error, serialization};

use std::fmt;

/// A 65 byte recoverable signature over a ticket hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature(#[serde(with = "serialization::signature_bytes")] [u8; SIGNATURE_SIZE]);

impl Signature {
    /// Wrap raw signature bytes. The bytes are only checked for validity
    /// when the signature is verified.
    pub fn from_bytes(bytes: [u8; SIGNATURE_SIZE]) -> Signature {
        Signature(bytes)
    }

    /// Parse a signature from a byte slice of exactly [`SIGNATURE_SIZE`] bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Signature, Error> {
        let bytes: [u8; SIGNATURE_SIZE] =
            bytes.try_into().map_err(|_| Error::InvalidSignature)?;
        Ok(Signature(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; SIGNATURE_SIZE] {
        &self.0
    }

    fn to_recoverable(&self) -> Result<RecoverableSignature, Error> {
        let recid = match self.0[64] {
            0 | 27 => 0,
            1 | 28 => 1,
            _ => return Err(Error::InvalidSignature),
        };
        let recid = RecoveryId::from_i32(recid)?;
        Ok(RecoverableSignature::from_compact(&self.0[..64], recid)?)
    }

    fn from_recoverable(sig: &RecoverableSignature) -> Signature {
        let (recid, compact) = sig.serialize_compact();
        let mut bytes = [0u8; SIGNATURE_SIZE];
        bytes[..64].copy_from_slice(&compact);
        bytes[64] = 27 + recid.to_i32() as u8;
        Signature(bytes)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Signature({})", self)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl std::str::FromStr for Signature {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; SIGNATURE_SIZE];
        hex::decode_to_slice(s.strip_prefix("0x").unwrap_or(s), &mut bytes)
            .map_err(|_| Error::InvalidSignature)?;
        Ok(Signature(bytes))
    }
}

/// Derive the ledger account identifier controlled by a public key: the last
/// 20 bytes of the keccak256 hash of the uncompressed point.
pub fn public_key_to_address(pubkey: &PublicKey) -> Address {
    let uncompressed = pubkey.serialize_uncompressed();
    let hash = keccak256(&uncompressed[1..]);
    Address::from_slice(&hash[12..])
}

/// Recover the account which produced `signature` over `hash`.
pub fn recover(hash: &B256, signature: &Signature) -> Result<Address, Error> {
    let sig = signature.to_recoverable()?;
    let msg = Message::from_digest(hash.0);
    let pubkey = SECP256K1.recover_ecdsa(&msg, &sig)?;
    Ok(public_key_to_address(&pubkey))
}

/// Verify that `signature` over `hash` was produced by `expected`.
pub fn verify(hash: &B256, signature: &Signature, expected: Address) -> Result<(), Error> {
    if recover(hash, signature)? != expected {
        return Err(Error::InvalidSignature);
    }
    Ok(())
}

/// Something which can sign ticket hashes on behalf of a ledger account.
pub trait TicketSigner {
    /// The account whose escrow backs the signed tickets.
    fn address(&self) -> Address;

    /// Sign a 32 byte digest.
    fn sign_hash(&self, hash: &B256) -> Signature;
}

/// A secp256k1 secret key and the account it controls.
#[derive(Clone)]
pub struct SigningKey {
    seckey: SecretKey,
    address: Address,
}

impl SigningKey {
    pub fn new(seckey: SecretKey) -> SigningKey {
        let address = public_key_to_address(&seckey.public_key(SECP256K1));
        SigningKey { seckey, address }
    }

    /// Generate a new key from a secure RNG.
    pub fn random<R: rand::Rng + rand::CryptoRng + ?Sized>(rng: &mut R) -> SigningKey {
        SigningKey::new(SecretKey::new(rng))
    }

    /// Parse a secret key from a hex string, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<SigningKey, Error> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s.strip_prefix("0x").unwrap_or(s), &mut bytes)?;
        let seckey = SecretKey::from_slice(&bytes).map_err(Error::InvalidKey)?;
        Ok(SigningKey::new(seckey))
    }

    pub fn public_key(&self) -> PublicKey {
        self.seckey.public_key(SECP256K1)
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl TicketSigner for SigningKey {
    fn address(&self) -> Address {
        self.address
    }

    fn sign_hash(&self, hash: &B256) -> Signature {
        let msg = Message::from_digest(hash.0);
        let sig = SECP256K1.sign_ecdsa_recoverable(&msg, &self.seckey);
        Signature::from_recoverable(&sig)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECKEY: &str = "289c2857d4598e37fb9647507e47a309d6133539bf21a8b9cb6df88fd5232032";

    #[test]
    fn address_derivation() {
        // Secret key 1 controls the well-known generator-point address.
        let mut one = [0u8; 32];
        one[31] = 1;
        let key = SigningKey::new(SecretKey::from_slice(&one).unwrap());
        assert_eq!(
            key.address(),
            "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf"
                .parse::<Address>()
                .unwrap()
        );
    }

    #[test]
    fn sign_and_recover() {
        let key = SigningKey::from_hex(TEST_SECKEY).unwrap();
        let hash = keccak256(b"ticket");
        let sig = key.sign_hash(&hash);

        assert!(sig.as_bytes()[64] == 27 || sig.as_bytes()[64] == 28);
        assert_eq!(recover(&hash, &sig), Ok(key.address()));
        assert_eq!(verify(&hash, &sig, key.address()), Ok(()));

        // Signing is deterministic.
        assert_eq!(key.sign_hash(&hash), sig);
    }

    #[test]
    fn verification_fails_for_other_hash_or_signer() {
        let key = SigningKey::from_hex(TEST_SECKEY).unwrap();
        let hash = keccak256(b"ticket");
        let sig = key.sign_hash(&hash);

        let other_hash = keccak256(b"mutated ticket");
        assert_eq!(
            verify(&other_hash, &sig, key.address()),
            Err(Error::InvalidSignature)
        );
        assert_eq!(
            verify(&hash, &sig, Address::repeat_byte(9)),
            Err(Error::InvalidSignature)
        );
    }

    #[test]
    fn malformed_signatures_are_rejected() {
        let hash = keccak256(b"ticket");
        assert_eq!(
            Signature::from_slice(&[0u8; 1]),
            Err(Error::InvalidSignature)
        );

        let mut bytes = [1u8; SIGNATURE_SIZE];
        bytes[64] = 5;
        assert_eq!(
            recover(&hash, &Signature::from_bytes(bytes)),
            Err(Error::InvalidSignature)
        );

        assert_eq!(
            recover(&hash, &Signature::from_bytes([0u8; SIGNATURE_SIZE])),
            Err(Error::InvalidSignature)
        );
    }

    #[test]
    fn recovery_id_without_offset_is_accepted() {
        let key = SigningKey::from_hex(TEST_SECKEY).unwrap();
        let hash = keccak256(b"ticket");
        let mut bytes = *key.sign_hash(&hash).as_bytes();
        bytes[64] -= 27;
        assert_eq!(recover(&hash, &Signature::from_bytes(bytes)), Ok(key.address()));
    }

    #[test]
    fn bad_key_material_is_rejected() {
        assert_eq!(
            SigningKey::from_hex("abc").unwrap_err(),
            Error::InvalidKeyHex(hex::FromHexError::OddLength)
        );
        assert_eq!(
            SigningKey::from_hex(&TEST_SECKEY[..62]).unwrap_err(),
            Error::InvalidKeyHex(hex::FromHexError::InvalidStringLength)
        );
        assert_eq!(
            SigningKey::from_hex(&"00".repeat(32)).unwrap_err(),
            Error::InvalidKey(secp256k1::Error::InvalidSecretKey)
        );

        let prefixed = format!("0x{}", TEST_SECKEY);
        assert_eq!(
            SigningKey::from_hex(&prefixed).unwrap().address(),
            SigningKey::from_hex(TEST_SECKEY).unwrap().address()
        );
    }

    #[test]
    fn signature_hex_round_trip() {
        let key = SigningKey::from_hex(TEST_SECKEY).unwrap();
        let sig = key.sign_hash(&keccak256(b"ticket"));
        let parsed: Signature = sig.to_string().parse().unwrap();
        assert_eq!(parsed, sig);
    }
}
