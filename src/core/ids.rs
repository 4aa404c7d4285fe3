//! Identifier and code generators for ledger records and the simulated wallet.

use chrono::Utc;
use rand::Rng;

const BASE36_LOWER: &str = "0123456789abcdefghijklmnopqrstuvwxyz";
const REFERRAL_ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const HEX_LOWER: &str = "0123456789abcdef";

// Base58-style alphabet used by Dogecoin addresses (no 0, O, I, l).
const ADDRESS_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";
// Second character of a mainnet address is drawn from a narrower set.
const ADDRESS_SECOND: &str = "56789ABCDEFGHJKLMNPQRSTU";

fn pick(rng: &mut impl Rng, alphabet: &str) -> char {
    let bytes = alphabet.as_bytes();
    bytes[rng.gen_range(0..bytes.len())] as char
}

fn random_string(rng: &mut impl Rng, alphabet: &str, len: usize) -> String {
    (0..len).map(|_| pick(rng, alphabet)).collect()
}

/// Stable user identity: creation time plus a random base36 suffix.
pub fn generate_user_id() -> String {
    let mut rng = rand::thread_rng();
    format!(
        "user_{}_{}",
        Utc::now().timestamp_millis(),
        random_string(&mut rng, BASE36_LOWER, 9)
    )
}

/// 8-character referral code, generated once per user and stable thereafter.
pub fn generate_referral_code() -> String {
    let mut rng = rand::thread_rng();
    random_string(&mut rng, REFERRAL_ALPHABET, 8)
}

/// 64-character hex transaction hash for the simulated wallet.
pub fn generate_tx_hash() -> String {
    let mut rng = rand::thread_rng();
    random_string(&mut rng, HEX_LOWER, 64)
}

/// Simulated Dogecoin address: prefix `D`, 34 characters total.
pub fn generate_address() -> String {
    let mut rng = rand::thread_rng();
    let mut address = String::with_capacity(34);
    address.push('D');
    address.push(pick(&mut rng, ADDRESS_SECOND));
    address.push_str(&random_string(&mut rng, ADDRESS_ALPHABET, 32));
    address
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_shape() {
        let id = generate_user_id();
        assert!(id.starts_with("user_"));
        let parts: Vec<&str> = id.splitn(3, '_').collect();
        assert_eq!(parts.len(), 3);
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 9);
        assert!(parts[2].chars().all(|c| BASE36_LOWER.contains(c)));
    }

    #[test]
    fn referral_code_shape() {
        let code = generate_referral_code();
        assert_eq!(code.len(), 8);
        assert!(code.chars().all(|c| REFERRAL_ALPHABET.contains(c)));
    }

    #[test]
    fn tx_hash_shape() {
        let hash = generate_tx_hash();
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn generated_address_is_valid() {
        for _ in 0..32 {
            let address = generate_address();
            assert_eq!(address.len(), 34);
            assert!(crate::wallet::address::is_valid_address(&address));
        }
    }
}
