//! Test-data generators

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{Addition, EntityData};

const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8] = b"0123456789";
const PUNCTUATION: &[u8] = b"!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

/// Last name used for every customer added through the UI
pub const DEFAULT_LAST_NAME: &str = "Testerson";

/// Number of digits in a generated post code
pub const POST_CODE_LEN: usize = 10;

/// Random ASCII string with at least one letter, one digit and one punctuation mark
///
/// Lengths below 3 still produce the three guaranteed characters.
pub fn generate_random_string(length: usize) -> String {
    let mut rng = rand::thread_rng();
    let all: Vec<u8> = [LETTERS, DIGITS, PUNCTUATION].concat();

    let mut chars = Vec::with_capacity(length.max(3));
    for class in [LETTERS, DIGITS, PUNCTUATION] {
        chars.push(class[rng.gen_range(0..class.len())]);
    }
    for _ in 3..length {
        chars.push(all[rng.gen_range(0..all.len())]);
    }
    chars.shuffle(&mut rng);

    chars.into_iter().map(char::from).collect()
}

/// Entity payload with a randomized title
pub fn generate_entity_data() -> EntityData {
    EntityData {
        addition: Addition {
            additional_info: "Дополнительные сведения".to_string(),
            additional_number: 123,
        },
        important_numbers: vec![42, 87, 15],
        title: format!("Валидирующий заголовок {}", generate_random_string(10)),
        verified: true,
    }
}

/// Ten random decimal digits
pub fn generate_random_post_code() -> String {
    let mut rng = rand::thread_rng();
    let post_code: String = (0..POST_CODE_LEN)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect();
    debug!(%post_code, "generated post code");
    post_code
}

/// Derive a lowercase first name from a numeric post code
///
/// Each pair of decimal digits, taken from the least significant end, maps to
/// the letter `(pair % 26)`. The letters are then reversed so the name reads
/// from the most significant pair. A zero value yields an empty name.
/// Codes of any length are accepted; pairs are read off the digits, not a
/// fixed-width integer.
pub fn generate_name_from_post_code(post_code: &str) -> Result<String> {
    if post_code.is_empty() || !post_code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidPostCode(post_code.to_string()));
    }

    // leading zeros carry no pairs
    let significant = post_code.trim_start_matches('0').as_bytes();
    let name: String = significant
        .rchunks(2)
        .rev()
        .map(|pair| {
            let value = pair.iter().fold(0u8, |acc, d| acc * 10 + (d - b'0'));
            char::from(b'a' + value % 26)
        })
        .collect();

    debug!(post_code, %name, "derived name from post code");
    Ok(name)
}
