//! # Identifier Allocation
//!
//! Identifiers are lower-case base-36 strings handed out in sequence
//! (`"1"`, `"2"`, ... `"z"`, `"10"`, ...). The counter lives in the store
//! settings so allocation survives restarts.

use crate::primitives::{FIRST_ID, ID_DIGITS, MAX_ID_LENGTH, RESERVED_PREFIX};
use crate::{NodeId, NoemaError};

/// Return the identifier following `current`.
///
/// Malformed input (anything outside the base-36 alphabet) restarts the
/// sequence at `FIRST_ID` rather than producing a colliding id.
#[must_use]
pub fn next_id(current: &str) -> String {
    let digits: Option<Vec<usize>> = current
        .bytes()
        .map(|b| ID_DIGITS.iter().position(|&d| d == b))
        .collect();
    let mut digits = match digits {
        Some(d) if !d.is_empty() => d,
        _ => return FIRST_ID.to_string(),
    };

    let last = ID_DIGITS.len() - 1;
    let mut carry = true;
    for digit in digits.iter_mut().rev() {
        if *digit == last {
            *digit = 0;
        } else {
            *digit += 1;
            carry = false;
            break;
        }
    }
    if carry {
        digits.insert(0, 1);
    }

    digits.into_iter().map(|d| char::from(ID_DIGITS[d])).collect()
}

/// Validate the character set and length of a record identifier.
///
/// Accepts reserved identifiers; used by boundaries that map ids to paths.
pub(crate) fn validate_record_id(id: &str) -> Result<(), NoemaError> {
    if id.is_empty() {
        return Err(NoemaError::invalid("node id must not be empty"));
    }
    if id.len() > MAX_ID_LENGTH {
        return Err(NoemaError::invalid(format!(
            "node id exceeds {} characters",
            MAX_ID_LENGTH
        )));
    }
    if !id
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    {
        return Err(NoemaError::invalid(format!(
            "node id '{}' contains characters outside [A-Za-z0-9_-]",
            id
        )));
    }
    Ok(())
}

/// Validate a caller-supplied identifier.
pub(crate) fn validate_id(id: &NodeId) -> Result<(), NoemaError> {
    validate_record_id(id.as_str())?;
    if id.as_str().starts_with(RESERVED_PREFIX) {
        return Err(NoemaError::invalid(format!(
            "node id '{}' uses the reserved prefix '{}'",
            id, RESERVED_PREFIX
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increments_within_a_digit() {
        assert_eq!(next_id("1"), "2");
        assert_eq!(next_id("9"), "a");
        assert_eq!(next_id("y"), "z");
    }

    #[test]
    fn carries_into_new_digit() {
        assert_eq!(next_id("z"), "10");
        assert_eq!(next_id("zz"), "100");
        assert_eq!(next_id("1z"), "20");
    }

    #[test]
    fn malformed_input_restarts() {
        assert_eq!(next_id(""), FIRST_ID);
        assert_eq!(next_id("A!"), FIRST_ID);
    }

    #[test]
    fn validation_rules() {
        assert!(validate_id(&NodeId::new("abc-12")).is_ok());
        assert!(validate_id(&NodeId::new("")).is_err());
        assert!(validate_id(&NodeId::new("../etc")).is_err());
        assert!(validate_id(&NodeId::new("_settings")).is_err());
        assert!(validate_record_id("_settings").is_ok());
        assert!(validate_id(&NodeId::new("x".repeat(MAX_ID_LENGTH + 1))).is_err());
    }
}
