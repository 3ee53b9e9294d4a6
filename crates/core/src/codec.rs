//! Public identifier and key-hash codecs.
//!
//! Numeric row ids never leave the server. Callers see a fixed-width base58
//! rendering grouped with hyphens (`XXXX-XXXX-XX`), so the string length
//! carries no information about the magnitude of the id.

use thiserror::Error;

use crate::note::KEY_HASH_LEN;

/// The bitcoin base58 alphabet (no `0`, `O`, `I` or `l`).
pub const BASE58_ALPHABET: &[u8; 58] =
    b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// The alphabet's zero symbol, used for left padding.
pub const ZERO_SYMBOL: char = '1';

/// Number of base58 symbols in a canonical public id payload.
pub const ID_PAYLOAD_WIDTH: usize = 10;

/// Length of a canonical public id, hyphens included.
pub const PUBLIC_ID_LEN: usize = 12;

/// Payload width used for ids too large for [`ID_PAYLOAD_WIDTH`] symbols.
pub const EXTENDED_ID_PAYLOAD_WIDTH: usize = 11;

/// Length of an extended public id, hyphens included.
pub const EXTENDED_PUBLIC_ID_LEN: usize = 13;

/// Smallest id that no longer fits in [`ID_PAYLOAD_WIDTH`] symbols (`58^10`).
pub const EXTENDED_ID_THRESHOLD: u64 = 430_804_206_899_405_824;

/// Length of an encoded key hash. 44 symbols is the widest base58 rendering
/// of a 32-byte value.
pub const KEY_HASH_ENCODED_LEN: usize = 44;

const GROUP_WIDTH: usize = 4;
const SEPARATOR: u8 = b'-';

/// Byte offsets of the separators inside a public id.
const SEPARATOR_POSITIONS: [usize; 2] = [GROUP_WIDTH, 2 * GROUP_WIDTH + 1];

/// Errors produced while decoding public ids and key hashes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The input does not have the expected shape.
    #[error("malformed identifier: {0}")]
    Format(String),

    /// The input contains symbols outside the base58 alphabet.
    #[error("invalid base58 input: {0}")]
    Alphabet(String),

    /// The decoded value does not fit the target width.
    #[error("decoded value does not fit in {0} bytes")]
    Overflow(usize),
}

/// Bijective mapping between numeric row ids and public identifiers.
pub trait IdCodec: Send + Sync {
    /// Render a numeric id as a public identifier.
    fn encode(&self, id: u64) -> String;

    /// Recover the numeric id from a public identifier.
    fn decode(&self, public_id: &str) -> Result<u64, CodecError>;
}

/// The default [`IdCodec`]: big-endian bytes, base58, zero-symbol padding,
/// and 4-symbol hyphenated groups.
#[derive(Debug, Clone, Copy, Default)]
pub struct Base58IdCodec;

impl IdCodec for Base58IdCodec {
    fn encode(&self, id: u64) -> String {
        let payload = encode_padded(&id.to_be_bytes(), ID_PAYLOAD_WIDTH);
        group(&payload)
    }

    fn decode(&self, public_id: &str) -> Result<u64, CodecError> {
        let payload = ungroup(public_id)?;
        let bytes = decode_trailing::<8>(&payload)?;
        Ok(u64::from_be_bytes(bytes))
    }
}

/// Returns `true` if `symbol` belongs to the base58 alphabet.
pub fn is_base58_symbol(symbol: u8) -> bool {
    BASE58_ALPHABET.contains(&symbol)
}

/// Returns `true` if every byte of `input` belongs to the base58 alphabet.
pub fn is_base58(input: &str) -> bool {
    input.bytes().all(is_base58_symbol)
}

/// Returns `true` if `public_id` has the hyphenated group shape: separators
/// exactly at the group boundaries and base58 symbols everywhere else.
///
/// Length is not checked here; see [`PUBLIC_ID_LEN`].
pub fn has_public_id_shape(public_id: &str) -> bool {
    public_id.bytes().enumerate().all(|(i, b)| {
        if SEPARATOR_POSITIONS.contains(&i) {
            b == SEPARATOR
        } else {
            is_base58_symbol(b)
        }
    })
}

/// Render a key hash as [`KEY_HASH_ENCODED_LEN`] base58 symbols.
pub fn encode_key_hash(key_hash: &[u8]) -> String {
    encode_padded(key_hash, KEY_HASH_ENCODED_LEN)
}

/// Decode a base58 key hash.
///
/// Zero-symbol padding beyond [`KEY_HASH_LEN`] bytes is dropped, so both the
/// padded and the plain base58 renderings decode to the same bytes. The
/// length of the result is not enforced here; validation owns that rule.
pub fn decode_key_hash(encoded: &str) -> Result<Vec<u8>, CodecError> {
    let mut decoded = bs58::decode(encoded)
        .into_vec()
        .map_err(|e| CodecError::Alphabet(e.to_string()))?;

    let excess = decoded.len().saturating_sub(KEY_HASH_LEN);
    if decoded[..excess].iter().all(|&b| b == 0) {
        decoded.drain(..excess);
    }
    Ok(decoded)
}

/// Base58-encode `bytes` and left-pad the result with the zero symbol up to
/// `width` symbols. Longer encodings are returned unpadded.
fn encode_padded(bytes: &[u8], width: usize) -> String {
    let encoded = bs58::encode(bytes).into_string();
    let fill = width.saturating_sub(encoded.len());

    let mut padded = String::with_capacity(fill + encoded.len());
    padded.extend(std::iter::repeat_n(ZERO_SYMBOL, fill));
    padded.push_str(&encoded);
    padded
}

/// Base58-decode `payload` into exactly `N` bytes, keeping the trailing `N`
/// bytes. Every byte before them must be zero.
fn decode_trailing<const N: usize>(payload: &str) -> Result<[u8; N], CodecError> {
    let decoded = bs58::decode(payload)
        .into_vec()
        .map_err(|e| CodecError::Alphabet(e.to_string()))?;

    let (excess, tail) = decoded.split_at(decoded.len().saturating_sub(N));
    if excess.iter().any(|&b| b != 0) {
        return Err(CodecError::Overflow(N));
    }

    let mut out = [0u8; N];
    out[N - tail.len()..].copy_from_slice(tail);
    Ok(out)
}

/// Insert a separator after every [`GROUP_WIDTH`] symbols.
fn group(payload: &str) -> String {
    let mut grouped = String::with_capacity(payload.len() + payload.len() / GROUP_WIDTH);
    for (i, symbol) in payload.chars().enumerate() {
        if i > 0 && i % GROUP_WIDTH == 0 {
            grouped.push(char::from(SEPARATOR));
        }
        grouped.push(symbol);
    }
    grouped
}

/// Strip the separators from a public id, rejecting any deviation from the
/// grouped shape.
fn ungroup(public_id: &str) -> Result<String, CodecError> {
    let payload_width = match public_id.len() {
        PUBLIC_ID_LEN => ID_PAYLOAD_WIDTH,
        EXTENDED_PUBLIC_ID_LEN => EXTENDED_ID_PAYLOAD_WIDTH,
        other => {
            return Err(CodecError::Format(format!(
                "expected {PUBLIC_ID_LEN} characters, got {other}"
            )));
        }
    };

    let mut payload = String::with_capacity(payload_width);
    for (i, b) in public_id.bytes().enumerate() {
        if SEPARATOR_POSITIONS.contains(&i) {
            if b != SEPARATOR {
                return Err(CodecError::Format(format!("expected '-' at position {i}")));
            }
        } else if is_base58_symbol(b) {
            payload.push(char::from(b));
        } else {
            return Err(CodecError::Alphabet(format!(
                "unexpected character at position {i}"
            )));
        }
    }

    // An extended payload starting with the zero symbol would alias a
    // canonical id.
    if payload_width == EXTENDED_ID_PAYLOAD_WIDTH && payload.starts_with(ZERO_SYMBOL) {
        return Err(CodecError::Format(
            "extended identifier must not start with the zero symbol".to_owned(),
        ));
    }

    Ok(payload)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn codec() -> Base58IdCodec {
        Base58IdCodec
    }

    #[test]
    fn encode_one() {
        assert_eq!(codec().encode(1), "1111-1111-12");
        assert_eq!(codec().decode("1111-1111-12").unwrap(), 1);
    }

    #[test]
    fn encode_zero() {
        assert_eq!(codec().encode(0), "1111-1111-11");
        assert_eq!(codec().decode("1111-1111-11").unwrap(), 0);
    }

    #[test]
    fn largest_canonical_id_stays_canonical() {
        let id = EXTENDED_ID_THRESHOLD - 1;
        let encoded = codec().encode(id);
        assert_eq!(encoded.len(), PUBLIC_ID_LEN);
        assert_eq!(encoded, "zzzz-zzzz-zz");
        assert_eq!(codec().decode(&encoded).unwrap(), id);
    }

    #[test]
    fn threshold_switches_to_extended_width() {
        let encoded = codec().encode(EXTENDED_ID_THRESHOLD);
        assert_eq!(encoded, "2111-1111-111");
        assert_eq!(codec().decode(&encoded).unwrap(), EXTENDED_ID_THRESHOLD);
    }

    #[test]
    fn max_id_round_trips() {
        let encoded = codec().encode(u64::MAX);
        assert_eq!(encoded.len(), EXTENDED_PUBLIC_ID_LEN);
        assert_eq!(codec().decode(&encoded).unwrap(), u64::MAX);
    }

    #[test]
    fn extended_payload_overflowing_u64_is_rejected() {
        let err = codec().decode("zzzz-zzzz-zzz").unwrap_err();
        assert_eq!(err, CodecError::Overflow(8));
    }

    #[test]
    fn extended_payload_with_leading_zero_symbol_is_rejected() {
        let err = codec().decode("1111-1111-112").unwrap_err();
        assert!(matches!(err, CodecError::Format(_)));
    }

    #[test]
    fn shifted_hyphen_is_rejected() {
        let err = codec().decode("11111-111-12").unwrap_err();
        assert!(matches!(err, CodecError::Format(_)));

        let err = codec().decode("1111-11111-2").unwrap_err();
        assert!(matches!(err, CodecError::Format(_)));
    }

    #[test]
    fn bare_payload_is_rejected() {
        let err = codec().decode("1111111112").unwrap_err();
        assert!(matches!(err, CodecError::Format(_)));
    }

    #[test]
    fn ambiguous_symbols_are_rejected() {
        for bad in ["0111-1111-12", "O111-1111-12", "I111-1111-12", "l111-1111-12"] {
            let err = codec().decode(bad).unwrap_err();
            assert!(matches!(err, CodecError::Alphabet(_)), "{bad} should be rejected");
        }
    }

    #[test]
    fn multibyte_input_does_not_panic() {
        assert!(codec().decode("ééé-ééé-11").is_err());
        assert!(codec().decode("").is_err());
    }

    #[test]
    fn public_id_shape() {
        assert!(has_public_id_shape("1111-1111-12"));
        assert!(has_public_id_shape("2111-1111-111"));
        assert!(!has_public_id_shape("1111_1111_12"));
        assert!(!has_public_id_shape("1111-1111-1-"));
        assert!(!has_public_id_shape("1111-1111-10"));
    }

    #[test]
    fn key_hash_is_padded_to_fixed_width() {
        let zeros = [0u8; KEY_HASH_LEN];
        assert_eq!(encode_key_hash(&zeros), "1".repeat(KEY_HASH_ENCODED_LEN));

        let mut small = [0u8; KEY_HASH_LEN];
        small[KEY_HASH_LEN - 1] = 1;
        let encoded = encode_key_hash(&small);
        assert_eq!(encoded.len(), KEY_HASH_ENCODED_LEN);
        assert_eq!(decode_key_hash(&encoded).unwrap(), small.to_vec());

        let full = [0xffu8; KEY_HASH_LEN];
        let encoded = encode_key_hash(&full);
        assert_eq!(encoded.len(), KEY_HASH_ENCODED_LEN);
        assert_eq!(decode_key_hash(&encoded).unwrap(), full.to_vec());
    }

    #[test]
    fn unpadded_key_hash_decodes_to_same_bytes() {
        let hash = [0x01u8; KEY_HASH_LEN];
        let plain = bs58::encode(hash).into_string();
        assert!(plain.len() < KEY_HASH_ENCODED_LEN);
        assert_eq!(decode_key_hash(&plain).unwrap(), hash.to_vec());
        assert_eq!(
            decode_key_hash(&plain).unwrap(),
            decode_key_hash(&encode_key_hash(&hash)).unwrap()
        );
    }

    #[test]
    fn oversized_key_hash_keeps_its_length() {
        let decoded = decode_key_hash(&"z".repeat(KEY_HASH_ENCODED_LEN)).unwrap();
        assert!(decoded.len() > KEY_HASH_LEN);
    }

    #[test]
    fn key_hash_with_bad_alphabet_fails() {
        assert!(matches!(
            decode_key_hash("0OIl"),
            Err(CodecError::Alphabet(_))
        ));
    }

    proptest! {
        #[test]
        fn round_trip(id in any::<u64>()) {
            let encoded = codec().encode(id);
            prop_assert_eq!(codec().decode(&encoded).unwrap(), id);
        }

        #[test]
        fn canonical_ids_have_fixed_format(id in 0..EXTENDED_ID_THRESHOLD) {
            let encoded = codec().encode(id);
            prop_assert_eq!(encoded.len(), PUBLIC_ID_LEN);
            prop_assert!(has_public_id_shape(&encoded));
        }

        #[test]
        fn decode_never_panics(input in "\\PC{0,16}") {
            let _ = codec().decode(&input);
        }
    }
}
