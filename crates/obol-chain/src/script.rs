//! Best-effort destination extraction from locking scripts.
//!
//! The coin store keeps a derived address column for each unspent
//! output; scripts that match no known pattern simply yield no
//! destination and an empty address, which is a normal state.

const OP_DUP: u8 = 0x76;
const OP_EQUAL: u8 = 0x87;
const OP_EQUALVERIFY: u8 = 0x88;
const OP_HASH160: u8 = 0xa9;
const OP_CHECKSIG: u8 = 0xac;

/// A decoded spend destination.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Destination {
    PubkeyHash([u8; 20]),
    ScriptHash([u8; 20]),
}

/// Match the standard pay-to-pubkey-hash and pay-to-script-hash
/// templates. Anything else is "no destination".
pub fn extract_destination(script: &[u8]) -> Option<Destination> {
    match script {
        [OP_DUP, OP_HASH160, 20, hash @ .., OP_EQUALVERIFY, OP_CHECKSIG] if hash.len() == 20 => {
            Some(Destination::PubkeyHash(hash.try_into().ok()?))
        }
        [OP_HASH160, 20, hash @ .., OP_EQUAL] if hash.len() == 20 => {
            Some(Destination::ScriptHash(hash.try_into().ok()?))
        }
        _ => None,
    }
}

/// Render a destination as the address string stored alongside coins.
pub fn encode_destination(destination: &Destination) -> String {
    match destination {
        Destination::PubkeyHash(h) => format!("pkh1{}", hex::encode(h)),
        Destination::ScriptHash(h) => format!("sh1{}", hex::encode(h)),
    }
}

/// Build a standard pay-to-pubkey-hash locking script.
pub fn p2pkh_script(hash: &[u8; 20]) -> Vec<u8> {
    let mut script = Vec::with_capacity(25);
    script.extend_from_slice(&[OP_DUP, OP_HASH160, 20]);
    script.extend_from_slice(hash);
    script.extend_from_slice(&[OP_EQUALVERIFY, OP_CHECKSIG]);
    script
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_p2pkh_destination() {
        let script = p2pkh_script(&[0x11; 20]);
        let dest = extract_destination(&script).unwrap();
        assert_eq!(dest, Destination::PubkeyHash([0x11; 20]));
        assert_eq!(
            encode_destination(&dest),
            format!("pkh1{}", "11".repeat(20))
        );
    }

    #[test]
    fn test_p2sh_destination() {
        let mut script = vec![OP_HASH160, 20];
        script.extend_from_slice(&[0xab; 20]);
        script.push(OP_EQUAL);
        assert_eq!(
            extract_destination(&script),
            Some(Destination::ScriptHash([0xab; 20]))
        );
    }

    #[test]
    fn test_unknown_script_has_no_destination() {
        assert_eq!(extract_destination(&[]), None);
        assert_eq!(extract_destination(&[0x6a, 0x01, 0x00]), None); // OP_RETURN
        // Truncated p2pkh.
        let mut script = p2pkh_script(&[0x11; 20]);
        script.pop();
        assert_eq!(extract_destination(&script), None);
    }
}
