//! Intrastat membership of ISO 3166-1 alpha-2 country codes.
//!
//! Membership is date dependent: the United Kingdom left on 2021-01-01 while
//! Northern Ireland (XI) keeps reporting goods movements from that date.

use chrono::NaiveDate;

/// EU member states reporting Intrastat. Sorted for binary search.
static MEMBER_CODES: &[&str] = &[
    "AT", "BE", "BG", "CY", "CZ", "DE", "DK", "EE", "ES", "FI", "FR", "GR", "HR", "HU", "IE", "IT",
    "LT", "LU", "LV", "MT", "NL", "PL", "PT", "RO", "SE", "SI", "SK",
];

/// Country codes with a bounded membership period: (code, from, until).
static PERIOD_MEMBERS: &[(&str, Option<(i32, u32, u32)>, Option<(i32, u32, u32)>)] = &[
    ("GB", None, Some((2020, 12, 31))),
    ("XI", Some((2021, 1, 1)), None),
];

fn ymd((y, m, d): (i32, u32, u32)) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
}

/// Check whether `code` takes part in Intrastat on `date`.
///
/// Codes are compared case-insensitively.
pub fn in_intrastat(code: &str, date: NaiveDate) -> bool {
    let code = code.trim().to_uppercase();
    if MEMBER_CODES.binary_search(&code.as_str()).is_ok() {
        return true;
    }
    PERIOD_MEMBERS.iter().any(|(member, from, until)| {
        *member == code
            && from.and_then(ymd).is_none_or(|from| date >= from)
            && until.and_then(ymd).is_none_or(|until| date <= until)
    })
}
