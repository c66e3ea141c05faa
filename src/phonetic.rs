//! Phonetic name coding
//!
//! Soundex as used by genealogy software: accented letters are folded to
//! their ASCII base, `H`, `W` and punctuation vanish entirely, and vowels
//! separate repeated consonant codes.

use unicode_normalization::UnicodeNormalization;

/// Encode a string as a four character Soundex code.
///
/// Returns `None` when nothing encodable remains after folding to ASCII
/// (empty input, names written in a non-Latin script, or only `H` and
/// `W`). Callers treat
/// that as an encoding failure and fall back to literal comparison.
///
/// ```
/// use kinmatch::phonetic::soundex;
/// assert_eq!(soundex("Robert").as_deref(), Some("R163"));
/// assert_eq!(soundex("Müller").as_deref(), Some("M460"));
/// assert_eq!(soundex("Иванов"), None);
/// ```
pub fn soundex(value: &str) -> Option<String> {
    let folded: String = value
        .trim()
        .to_uppercase()
        .nfkd()
        .filter(|c| c.is_ascii_alphabetic())
        .collect();

    let first = folded.chars().next()?;
    let mut code = String::with_capacity(4);
    code.push(first);

    // Only H or W present: no code, so callers compare literally.
    let mut digits = folded.chars().filter_map(letter_code);
    let mut prev = digits.next()?;
    for digit in digits {
        if code.len() == 4 {
            break;
        }
        if digit != prev && digit != '0' {
            code.push(digit);
        }
        prev = digit;
    }

    while code.len() < 4 {
        code.push('0');
    }
    Some(code)
}

/// Digit for an upper-case ASCII letter; `H` and `W` have none.
fn letter_code(c: char) -> Option<char> {
    match c {
        'B' | 'F' | 'P' | 'V' => Some('1'),
        'C' | 'G' | 'J' | 'K' | 'Q' | 'S' | 'X' | 'Z' => Some('2'),
        'D' | 'T' => Some('3'),
        'L' => Some('4'),
        'M' | 'N' => Some('5'),
        'R' => Some('6'),
        'H' | 'W' => None,
        _ => Some('0'),
    }
}

/// True when two strings sound alike, or are literally equal when either
/// cannot be encoded.
pub fn sounds_alike(a: &str, b: &str) -> bool {
    match (soundex(a), soundex(b)) {
        (Some(code_a), Some(code_b)) => code_a == code_b,
        _ => a == b,
    }
}

/// Compare two strings phonetically when `use_soundex` is set, literally
/// otherwise.
pub fn names_equal(a: &str, b: &str, use_soundex: bool) -> bool {
    if use_soundex {
        sounds_alike(a, b)
    } else {
        a == b
    }
}

/// Bucket key for a surname: its Soundex code, or the literal surname when
/// phonetic coding is off or fails.
pub fn bucket_key(surname: &str, use_soundex: bool) -> String {
    if use_soundex {
        soundex(surname).unwrap_or_else(|| surname.to_string())
    } else {
        surname.to_string()
    }
}
