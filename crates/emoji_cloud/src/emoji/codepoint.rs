use crate::CloudError;

/// Canonical `U+XXXX[-U+XXXX...]` name for an emoji given as raw characters
/// (`"😂"`), hex codepoints (`"1f602"`, `"1f1e6-1f1e8"`, `"1f1e6, 1f1e8"`) or
/// an existing `U+` name.
pub fn normalize_codepoints(name: &str) -> Result<String, CloudError> {
    let invalid = || CloudError::InvalidCodepoint(name.to_owned());
    let cleaned: String = name
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '-' } else { c })
        .collect();
    let cleaned = cleaned.strip_suffix(".png").unwrap_or(&cleaned);

    if cleaned.is_empty() {
        return Err(invalid());
    }

    let is_hex_sequence = cleaned.chars().all(|c| c.is_ascii_hexdigit() || c == '-' || c == '+')
        || cleaned.to_ascii_lowercase().starts_with("u+");

    let codepoints: Vec<u32> = if is_hex_sequence {
        cleaned
            .split('-')
            .map(|segment| {
                let digits = segment
                    .strip_prefix("U+")
                    .or_else(|| segment.strip_prefix("u+"))
                    .unwrap_or(segment);
                if digits.is_empty() || digits.len() > 6 {
                    return Err(invalid());
                }
                u32::from_str_radix(digits, 16).map_err(|_| invalid())
            })
            .collect::<Result<_, _>>()?
    } else {
        cleaned.chars().map(u32::from).collect()
    };

    if codepoints.iter().any(|&cp| char::from_u32(cp).is_none()) {
        return Err(invalid());
    }

    Ok(codepoints.iter().map(|cp| format!("U+{cp:04X}")).collect::<Vec<_>>().join("-"))
}

/// Lowercase hex name without prefixes or padding, e.g. `U+1F1E6-U+1F1E8`
/// becomes `1f1e6-1f1e8`.
pub fn bare_hex_name(canonical: &str) -> String {
    canonical
        .split('-')
        .map(|segment| {
            let digits = segment.trim_start_matches("U+").trim_start_matches('0');
            if digits.is_empty() {
                "0".to_owned()
            } else {
                digits.to_ascii_lowercase()
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_emoji_characters() {
        assert_eq!(normalize_codepoints("😂").unwrap(), "U+1F602");
        assert_eq!(normalize_codepoints("🇦🇨").unwrap(), "U+1F1E6-U+1F1E8");
    }

    #[test]
    fn hex_codepoints() {
        assert_eq!(normalize_codepoints("1f602").unwrap(), "U+1F602");
        assert_eq!(normalize_codepoints("1f1e6-1f1e8").unwrap(), "U+1F1E6-U+1F1E8");
        assert_eq!(normalize_codepoints("1f1e6, 1f1e8").unwrap(), "U+1F1E6-U+1F1E8");
        assert_eq!(normalize_codepoints("a9").unwrap(), "U+00A9");
    }

    #[test]
    fn canonical_names_pass_through() {
        assert_eq!(normalize_codepoints("U+1F602").unwrap(), "U+1F602");
        assert_eq!(normalize_codepoints("u+1f1e6-u+1f1e8").unwrap(), "U+1F1E6-U+1F1E8");
        assert_eq!(normalize_codepoints("U+1F602.png").unwrap(), "U+1F602");
    }

    #[test]
    fn malformed_names_are_rejected() {
        assert!(normalize_codepoints("").is_err());
        assert!(normalize_codepoints("  ").is_err());
        assert!(normalize_codepoints("1f602--1f603").is_err());
        assert!(normalize_codepoints("U+D800").is_err());
        assert!(normalize_codepoints("U+1F60Z").is_err());
    }

    #[test]
    fn bare_hex_drops_prefix_and_padding() {
        assert_eq!(bare_hex_name("U+1F1E6-U+1F1E8"), "1f1e6-1f1e8");
        assert_eq!(bare_hex_name("U+00A9"), "a9");
    }
}
