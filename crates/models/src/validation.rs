//! Field checks shared by the entity modules.

use crate::errors::ModelError;

pub const MAX_TEXT: usize = 255;

fn invalid(field: &str, msg: &str) -> ModelError {
    ModelError::Validation(format!("{field}: {msg}"))
}

/// Required, non-blank, at most `max` characters.
pub fn required(field: &str, value: &str, max: usize) -> Result<(), ModelError> {
    if value.trim().is_empty() {
        return Err(invalid(field, "must not be blank"));
    }
    max_len(field, value, max)
}

pub fn max_len(field: &str, value: &str, max: usize) -> Result<(), ModelError> {
    if value.chars().count() > max {
        return Err(invalid(field, &format!("size must be at most {max}")));
    }
    Ok(())
}

pub fn optional(field: &str, value: Option<&str>, max: usize) -> Result<(), ModelError> {
    value.map_or(Ok(()), |v| max_len(field, v, max))
}

/// Four digit year within 1900..=2199.
pub fn year(field: &str, value: &str) -> Result<(), ModelError> {
    let ok = value.len() == 4
        && value.chars().all(|c| c.is_ascii_digit())
        && matches!(&value[..2], "19" | "20" | "21");
    if ok { Ok(()) } else { Err(invalid(field, "must be a year between 1900 and 2199")) }
}

/// `local@domain.tld`, no whitespace.
pub fn email(field: &str, value: &str) -> Result<(), ModelError> {
    max_len(field, value, MAX_TEXT)?;
    let ok = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.split('.').count() >= 2
                && domain.split('.').all(|p| !p.is_empty())
                && !value.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if ok { Ok(()) } else { Err(invalid(field, "must be a well-formed email address")) }
}

/// Swedish personal identity number, `[CC]YYMMDD[-]NNNC`, suffix optional.
/// When the suffix is present the control digit must satisfy Luhn.
pub fn social_security_number(field: &str, value: &str) -> Result<(), ModelError> {
    if value.trim().is_empty() {
        return Ok(());
    }
    if !value.is_ascii() {
        return Err(invalid(field, "must match [CC]YYMMDD[-NNNC]"));
    }
    let (date, suffix) = match value.split_once('-') {
        Some((d, s)) => (d, Some(s)),
        None if value.len() == 10 || value.len() == 12 => (&value[..value.len() - 4], Some(&value[value.len() - 4..])),
        None => (value, None),
    };
    let digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    if !digits(date) || !(date.len() == 6 || date.len() == 8) {
        return Err(invalid(field, "must match [CC]YYMMDD[-NNNC]"));
    }
    let Some(suffix) = suffix else { return Ok(()) };
    if suffix.len() != 4 || !digits(suffix) {
        return Err(invalid(field, "must match [CC]YYMMDD[-NNNC]"));
    }
    let short_date = &date[date.len() - 6..];
    let payload = format!("{short_date}{}", &suffix[..3]);
    let control = suffix.as_bytes()[3] - b'0';
    if luhn(&payload) != control {
        return Err(invalid(field, "invalid control number"));
    }
    Ok(())
}

/// Luhn check digit for a string of ASCII digits.
pub fn luhn(digits: &str) -> u8 {
    let sum: u32 = digits
        .bytes()
        .enumerate()
        .map(|(i, b)| {
            let mut d = u32::from(b - b'0') * (2 - (i as u32 % 2));
            if d > 9 {
                d -= 9;
            }
            d
        })
        .sum();
    ((10 - (sum % 10)) % 10) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_rejects_blank_and_long() {
        assert!(required("name", "  ", 10).is_err());
        assert!(required("name", "abcdefghijk", 10).is_err());
        assert!(required("name", "ok", 10).is_ok());
    }

    #[test]
    fn year_pattern() {
        assert!(year("year", "1948").is_ok());
        assert!(year("year", "2105").is_ok());
        assert!(year("year", "1848").is_err());
        assert!(year("year", "20x1").is_err());
        assert!(year("year", "201").is_err());
    }

    #[test]
    fn email_shape() {
        assert!(email("emailAddress", "kalle@fgv.nu").is_ok());
        assert!(email("emailAddress", "kalle.anka@mail.chalmers.se").is_ok());
        for bad in ["kalle", "@fgv.nu", "kalle@fgv", "kalle@@fgv.nu", "kalle @fgv.nu", "kalle@fgv..nu"] {
            assert!(email("emailAddress", bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn luhn_matches_known_number() {
        // 811218-9876 is the textbook example
        assert_eq!(luhn("811218987"), 6);
    }

    #[test]
    fn social_security_number_variants() {
        assert!(social_security_number("ssn", "811218-9876").is_ok());
        assert!(social_security_number("ssn", "19811218-9876").is_ok());
        assert!(social_security_number("ssn", "8112189876").is_ok());
        assert!(social_security_number("ssn", "811218").is_ok());
        assert!(social_security_number("ssn", "").is_ok());
        assert!(social_security_number("ssn", "811218-9875").is_err());
        assert!(social_security_number("ssn", "81121-9876").is_err());
        assert!(social_security_number("ssn", "811218-98a6").is_err());
    }
}
