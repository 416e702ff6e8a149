//! Format validation for the email, US phone, and US SSN subtypes.

use common::SubType;
use once_cell::sync::Lazy;
use regex::Regex;

use super::ValueError;

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static email pattern"));

static US_PHONE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:1-?)?([0-9]{3})[-.]?([0-9]{3})[-.]?([0-9]{4})$").expect("static phone pattern")
});

static US_SSN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]{3})[- ]?([0-9]{2})[- ]?([0-9]{4})$").expect("static SSN pattern")
});

/// Run the validation predicate for `subtype` against `text`.
///
/// `Generic` accepts everything.
pub fn check(subtype: SubType, text: &str) -> Result<(), ValueError> {
    let ok = match subtype {
        SubType::Generic => true,
        SubType::Email => is_email(text),
        SubType::UsPhone => is_us_phone(text),
        SubType::UsSsn => is_us_ssn(text),
    };
    if ok {
        Ok(())
    } else {
        Err(ValueError::Validation(format!("not a valid {}", describe(subtype))))
    }
}

pub fn is_email(text: &str) -> bool {
    EMAIL.is_match(text)
}

pub fn is_us_phone(text: &str) -> bool {
    US_PHONE.is_match(text)
}

/// Pattern check plus the number ranges the SSA never issues.
pub fn is_us_ssn(text: &str) -> bool {
    let Some(caps) = US_SSN.captures(text) else {
        return false;
    };
    let (area, group, serial) = (&caps[1], &caps[2], &caps[3]);
    if area == "000" || area == "666" || area.starts_with('9') {
        return false;
    }
    if group == "00" || serial == "0000" {
        return false;
    }
    // Woolworth wallet card number, published in 1938 and never valid since.
    !(area == "078" && group == "05" && serial == "1120")
}

fn describe(subtype: SubType) -> &'static str {
    match subtype {
        SubType::Generic => "text value",
        SubType::Email => "email address",
        SubType::UsPhone => "US phone number",
        SubType::UsSsn => "US social security number",
    }
}
