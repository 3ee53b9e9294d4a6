pub mod auth;
pub mod codec;
pub mod expiration;
pub mod note;
pub mod validation;

pub use auth::is_authorized;
pub use codec::{
    Base58IdCodec, CodecError, EXTENDED_ID_THRESHOLD, IdCodec, KEY_HASH_ENCODED_LEN,
    PUBLIC_ID_LEN, decode_key_hash, encode_key_hash,
};
pub use expiration::{Expiration, ExpirationError, load_time_zone, resolve_expiration};
pub use note::{
    KEY_HASH_LEN, MAX_CONTENT_LEN, MAX_EXPIRES_IN, MIN_EXPIRES_IN, NewNote, NoteRequest,
    PublicNote, StoredNote, UTC_ZONE_ID,
};
pub use validation::{FieldError, ValidationErrors, Validator, validate_lookup, validate_note};
