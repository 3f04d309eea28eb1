//! Phone number normalization.
//!
//! Free-form input is decomposed into DDI (country calling code), DDD
//! (Brazilian area code) and subscriber number. The storage key is the plain
//! concatenation of the three, with no `+` and no separators. Every read and
//! every write path must derive its key through [`PhoneNumber::parse`]: a
//! drift between the stored form and the looked-up form does not fail, it
//! silently reports "not found".

use std::fmt;

use crate::error::CoreError;

/// Calling code for Brazil. Input without a leading `+` is assumed to be
/// Brazilian unless it already starts with this code.
pub const BRAZIL_DDI: &str = "55";

/// Minimum accepted length of the national significant number.
pub const MIN_NATIONAL_DIGITS: usize = 8;

/// Maximum accepted length of the national significant number.
pub const MAX_NATIONAL_DIGITS: usize = 15;

/// Length of a Brazilian area code.
const DDD_LENGTH: usize = 2;

/// Characters accepted (and discarded) between digits.
const SEPARATORS: &[char] = &[' ', '-', '(', ')', '.', '\t'];

/// Reasons a phone string cannot be normalized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PhoneError {
    #[error("phone number is empty")]
    Empty,

    #[error("phone number contains invalid character '{0}'")]
    InvalidCharacter(char),

    #[error("phone number has no valid country calling code")]
    UnknownCountryCode,

    #[error("phone number could not be parsed: {0}")]
    Unparseable(String),

    #[error("national number has {0} digits, expected between {MIN_NATIONAL_DIGITS} and {MAX_NATIONAL_DIGITS}")]
    InvalidLength(usize),

    #[error("not a valid number for its country")]
    NotValid,
}

impl From<PhoneError> for CoreError {
    fn from(err: PhoneError) -> Self {
        CoreError::Validation(format!("Invalid phone number: {err}"))
    }
}

/// A parsed phone number.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhoneNumber {
    ddi: String,
    ddd: String,
    subscriber: String,
}

impl PhoneNumber {
    /// Parse a free-form phone string.
    ///
    /// For DDI `55` the first two digits of the national number are the DDD;
    /// for every other country the DDD is empty and the whole national number
    /// is the subscriber part.
    pub fn parse(raw: &str) -> Result<Self, PhoneError> {
        let trimmed = raw.trim();
        let (explicit_ddi, body) = match trimmed.strip_prefix('+') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let mut digits = String::with_capacity(body.len() + BRAZIL_DDI.len());
        for c in body.chars() {
            if c.is_ascii_digit() {
                digits.push(c);
            } else if !SEPARATORS.contains(&c) {
                return Err(PhoneError::InvalidCharacter(c));
            }
        }
        if digits.is_empty() {
            return Err(PhoneError::Empty);
        }
        if !explicit_ddi {
            // Brazilian trunk prefix ("0 21 ...") is not part of the number.
            let national = digits.trim_start_matches('0');
            digits = if national.starts_with(BRAZIL_DDI) {
                national.to_string()
            } else {
                format!("{BRAZIL_DDI}{national}")
            };
        }

        let parsed = phonenumber::parse(None, format!("+{digits}")).map_err(|e| match e {
            phonenumber::ParseError::InvalidCountryCode => PhoneError::UnknownCountryCode,
            other => PhoneError::Unparseable(other.to_string()),
        })?;

        let ddi = parsed.country().code().to_string();
        let e164 = parsed.format().mode(phonenumber::Mode::E164).to_string();
        let national = e164
            .trim_start_matches('+')
            .strip_prefix(ddi.as_str())
            .ok_or(PhoneError::UnknownCountryCode)?
            .to_string();

        if !(MIN_NATIONAL_DIGITS..=MAX_NATIONAL_DIGITS).contains(&national.len()) {
            return Err(PhoneError::InvalidLength(national.len()));
        }
        if !phonenumber::is_valid(&parsed) {
            return Err(PhoneError::NotValid);
        }

        let (ddd, subscriber) = if ddi == BRAZIL_DDI {
            national.split_at(DDD_LENGTH)
        } else {
            ("", national.as_str())
        };

        Ok(Self {
            ddi,
            ddd: ddd.to_string(),
            subscriber: subscriber.to_string(),
        })
    }

    pub fn ddi(&self) -> &str {
        &self.ddi
    }

    pub fn ddd(&self) -> &str {
        &self.ddd
    }

    pub fn subscriber(&self) -> &str {
        &self.subscriber
    }

    /// The canonical storage key, e.g. `5521999887766`.
    pub fn storage_key(&self) -> String {
        format_for_storage(&self.ddi, &self.ddd, &self.subscriber)
    }

    /// E.164 display form, e.g. `+5521999887766`.
    pub fn e164(&self) -> String {
        format!("+{}", self.storage_key())
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.e164())
    }
}

/// Join phone components into the canonical storage key.
pub fn format_for_storage(ddi: &str, ddd: &str, subscriber: &str) -> String {
    format!("{ddi}{ddd}{subscriber}")
}

/// Parse `raw` and return its storage key, mapping failures to
/// [`CoreError::Validation`].
pub fn normalize(raw: &str) -> Result<String, CoreError> {
    Ok(PhoneNumber::parse(raw)?.storage_key())
}
