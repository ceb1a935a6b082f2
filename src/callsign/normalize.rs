use crate::callsign::Callsign;
use crate::CallsignError;

/// Normalizes a callsign string according to Nodemap's rules
///
/// # Normalization Steps
///
/// 1. Trim whitespace and any trailing `*` (heard-list "via digipeater" marker)
/// 2. Uppercase
/// 3. Split off an optional `-SSID` suffix (0-15)
/// 4. Validate the base: 1-6 alphanumerics, at least one digit and one letter
///
/// # Examples
///
/// ```
/// use nodemap::callsign::normalize_callsign;
///
/// let call = normalize_callsign(" kc1jmh-15 ").unwrap();
/// assert_eq!(call.to_string(), "KC1JMH-15");
/// ```
pub fn normalize_callsign(input: &str) -> Result<Callsign, CallsignError> {
    let trimmed = input.trim().trim_end_matches('*');
    if trimmed.is_empty() {
        return Err(CallsignError::Empty);
    }

    let upper = trimmed.to_uppercase();
    match upper.split_once('-') {
        Some((base, ssid)) => {
            let ssid: u8 = ssid
                .parse()
                .map_err(|_| CallsignError::InvalidSsid(upper.clone()))?;
            Callsign::new(base, Some(ssid))
        }
        None => Callsign::new(&upper, None),
    }
}

/// Validates and uppercases a base callsign
pub(crate) fn normalize_base(base: &str) -> Result<String, CallsignError> {
    let base = base.trim().to_uppercase();
    if base.is_empty() {
        return Err(CallsignError::Empty);
    }

    if base.len() > 6 || !base.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(CallsignError::InvalidBase(base));
    }

    let has_digit = base.chars().any(|c| c.is_ascii_digit());
    let has_letter = base.chars().any(|c| c.is_ascii_alphabetic());
    if !has_digit || !has_letter {
        return Err(CallsignError::InvalidBase(base));
    }

    Ok(base)
}

/// Normalizes a NET/ROM alias
///
/// Aliases are 1-6 characters: alphanumerics plus `#`, `_` and `-`.
/// Returns the uppercased alias.
pub fn normalize_alias(input: &str) -> Result<String, CallsignError> {
    let alias = input.trim().to_uppercase();
    if alias.is_empty() {
        return Err(CallsignError::Empty);
    }

    let valid_chars = alias
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '#' | '_' | '-'));
    if alias.len() > 6 || !valid_chars {
        return Err(CallsignError::InvalidAlias(alias));
    }

    Ok(alias)
}
