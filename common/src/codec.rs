use std::sync::OnceLock;

use regex::Regex;

use crate::{error::ParseError, types::SettingName};

fn pattern(key: SettingName) -> &'static Regex {
    static PATTERNS: OnceLock<[Regex; 4]> = OnceLock::new();
    let patterns = PATTERNS.get_or_init(|| {
        SettingName::ALL.map(|name| {
            Regex::new(&format!(r"(?i){}\s*=\s*([0-9]+)", regex::escape(name.as_str())))
                .expect("valid setting pattern")
        })
    });
    &patterns[key.index()]
}

/// Extracts the first `<key>=<digits>` pair from a controller response body.
/// Range checks are left to the caller.
pub fn parse_setting(body: &str, key: SettingName) -> Result<u32, ParseError> {
    let captures = pattern(key)
        .captures(body)
        .ok_or(ParseError::MissingValue { key })?;
    let raw = &captures[1];
    raw.parse::<u32>().map_err(|_| ParseError::InvalidNumber {
        key,
        raw: raw.to_string(),
    })
}
