//! Favorites bitstring encoding.

const CHECKED: &str = "on";

/// Encode checkbox-style fields keyed by integer position into a bitstring.
///
/// Every field whose value is `on` and whose key parses as an integer marks
/// position `key` (0-indexed) as '1'; gaps are padded with '0'. Positions are
/// walked in ascending numeric order: a lexical walk would pad position `10`
/// before position `2` and corrupt the string. Positions past the highest
/// checked one are omitted, so no checked field yields an empty string.
pub fn encode<'a>(
    fields: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> String {
    let mut checked: Vec<usize> = fields
        .into_iter()
        .filter(|(_, value)| *value == CHECKED)
        .filter_map(|(key, _)| key.parse().ok())
        .collect();
    checked.sort_unstable();
    checked.dedup();

    let mut bits = String::new();
    for position in checked {
        while bits.len() < position {
            bits.push('0');
        }
        bits.push('1');
    }

    bits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_pads_gaps() {
        assert_eq!(encode([("0", "on"), ("3", "on")]), "1001");
    }

    #[test]
    fn test_encode_leading_pad() {
        assert_eq!(encode([("2", "on")]), "001");
    }

    #[test]
    fn test_encode_nothing_checked() {
        assert_eq!(encode([]), "");
        assert_eq!(encode([("4", "off")]), "");
    }

    #[test]
    fn test_encode_orders_numerically() {
        // Lexically "10" < "2"; padding must still follow numeric order.
        let bits = encode([("10", "on"), ("1", "on")]);
        assert_eq!(bits.len(), 11);
        assert_eq!(bits, "01000000001");

        // Iteration order of the input must not matter.
        assert_eq!(encode([("1", "on"), ("10", "on")]), bits);
    }

    #[test]
    fn test_encode_ignores_other_fields() {
        let bits = encode([
            ("name", "Ada"),
            ("email", "ada@example.com"),
            ("sex", "Female"),
            ("1", "on"),
        ]);
        assert_eq!(bits, "01");
    }

    #[test]
    fn test_encode_ignores_unchecked_values() {
        assert_eq!(encode([("0", "on"), ("1", "0"), ("2", "true")]), "1");
    }
}
