mod money;

pub mod op;

pub use money::{Money, MoneyConversionError, CNY_CURRENCY_CODE, CNY_CURRENCY_CODE_LOWER};

/// Parse a boolean flag from a string value, or return the given default value otherwise.
pub fn parse_boolean_flag(value: Option<String>, default: bool) -> bool {
    let value = match value {
        Some(v) => v,
        None => return default,
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

#[cfg(test)]
mod test {
    use super::parse_boolean_flag;

    #[test]
    fn boolean_flags_parse_loosely() {
        assert!(parse_boolean_flag(Some("YES".to_string()), false));
        assert!(parse_boolean_flag(Some(" on ".to_string()), false));
        assert!(!parse_boolean_flag(Some("0".to_string()), true));
        assert!(parse_boolean_flag(None, true));
        assert!(!parse_boolean_flag(Some("maybe".to_string()), false));
    }
}
