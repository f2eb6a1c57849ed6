//! Compact-bits difficulty targets and the proof-of-work re-check run
//! against every stored header during block-index reconstruction.

/// Consensus parameters consulted by the proof-of-work check.
#[derive(Clone, Copy, Debug)]
pub struct PowParams {
    /// Easiest permitted target, big-endian. Targets above this are
    /// rejected regardless of what the compact encoding claims.
    pub pow_limit: [u8; 32],
}

/// Expand a compact-bits encoding into a 256-bit big-endian target.
///
/// Returns `None` when the encoding is negative, overflows 256 bits,
/// or expands to zero — all of which fail the proof-of-work check.
pub fn target_from_compact(bits: u32) -> Option<[u8; 32]> {
    let exponent = (bits >> 24) as usize;
    let mantissa = bits & 0x007f_ffff;

    if bits & 0x0080_0000 != 0 {
        return None; // sign bit set
    }
    if mantissa == 0 {
        return None;
    }
    // Overflow: mantissa shifted past the top of 256 bits.
    if exponent > 34
        || (exponent > 33 && mantissa > 0xff)
        || (exponent > 32 && mantissa > 0xffff)
    {
        return None;
    }

    let mut target = [0u8; 32];
    if exponent <= 3 {
        let shifted = mantissa >> (8 * (3 - exponent));
        if shifted == 0 {
            return None;
        }
        target[29..32].copy_from_slice(&shifted.to_be_bytes()[1..4]);
    } else {
        // mantissa byte m[1 + i] lands at index 32 - exponent + i; the
        // overflow rules above guarantee any byte pushed past the top
        // is zero.
        let m = mantissa.to_be_bytes();
        for i in 0..3 {
            if exponent <= 32 + i {
                target[(32 + i) - exponent] = m[1 + i];
            }
        }
    }
    Some(target)
}

/// Check a header's proof-of-work hash against its declared bits.
///
/// The hash is interpreted as a 256-bit big-endian integer and must be
/// less than or equal to the expanded target, which itself must not
/// exceed `pow_limit`.
pub fn check_proof_of_work(pow_hash: &[u8; 32], bits: u32, params: &PowParams) -> bool {
    let target = match target_from_compact(bits) {
        Some(t) => t,
        None => return false,
    };
    if target > params.pow_limit {
        return false;
    }
    *pow_hash <= target
}
