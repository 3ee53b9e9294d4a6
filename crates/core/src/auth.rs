use subtle::ConstantTimeEq;

/// Returns `true` if the supplied key hash matches the stored one.
///
/// The comparison runs in constant time for equal-length inputs. Slices of
/// different lengths never match.
pub fn is_authorized(supplied: &[u8], stored: &[u8]) -> bool {
    supplied.ct_eq(stored).into()
}
