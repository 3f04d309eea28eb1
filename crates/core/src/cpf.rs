//! CPF (Cadastro de Pessoas Físicas) helpers.
//!
//! A CPF is stored as its 11 bare digits. Punctuated input
//! (`035.613.507-12`) is accepted at the boundary and reduced to digits.

use crate::error::CoreError;

/// Number of digits in a CPF.
pub const CPF_LENGTH: usize = 11;

/// Strip punctuation and verify the check digits.
///
/// Returns the bare 11-digit form on success.
pub fn normalize_cpf(raw: &str) -> Result<String, CoreError> {
    let digits: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '.' | '-' | ' '))
        .collect();

    if digits.len() != CPF_LENGTH || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CoreError::Validation(format!(
            "CPF must have exactly {CPF_LENGTH} digits"
        )));
    }
    if !is_valid_cpf(&digits) {
        return Err(CoreError::Validation("Invalid CPF check digits".to_string()));
    }
    Ok(digits)
}

/// Validate a CPF, returning an error for malformed input.
pub fn validate_cpf(raw: &str) -> Result<(), CoreError> {
    normalize_cpf(raw).map(|_| ())
}

/// Check-digit verification over a bare 11-digit string.
///
/// Sequences of a single repeated digit pass the arithmetic but are not
/// issued, so they are rejected.
pub fn is_valid_cpf(digits: &str) -> bool {
    let d: Vec<u32> = digits.chars().filter_map(|c| c.to_digit(10)).collect();
    if d.len() != CPF_LENGTH || digits.len() != CPF_LENGTH {
        return false;
    }
    if d.iter().all(|&x| x == d[0]) {
        return false;
    }
    check_digit(&d[..9]) == d[9] && check_digit(&d[..10]) == d[10]
}

/// Mask the middle of a CPF for logs and public responses:
/// `45049725810` becomes `450***25810`. Anything that is not 11 ASCII
/// characters is returned unchanged.
pub fn mask_cpf(cpf: &str) -> String {
    if cpf.len() != CPF_LENGTH || !cpf.is_ascii() {
        return cpf.to_string();
    }
    format!("{}***{}", &cpf[..3], &cpf[6..])
}

fn check_digit(prefix: &[u32]) -> u32 {
    let weight_start = prefix.len() as u32 + 1;
    let sum: u32 = prefix
        .iter()
        .enumerate()
        .map(|(i, &digit)| digit * (weight_start - i as u32))
        .sum();
    match (sum * 10) % 11 {
        10 => 0,
        r => r,
    }
}
