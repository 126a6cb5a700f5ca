//! Output formatting for the CLI.
//!
//! One line per row: `oid<separator>value`. String-like values (OCTET
//! STRING, Opaque) are rendered as printable ASCII, as a hex dump, or both,
//! according to the `-O` flags.

use crate::{Oid, Value};

/// Separator between OID and value unless `-O` says otherwise.
pub const DEFAULT_SEPARATOR: &str = " = ";

/// Supported `-O` flags.
pub const OUTPUT_FLAGS: &[(char, &str)] = &[
    ('a', "print all strings in ascii format"),
    ('x', "print all strings in hex format"),
    ('q', "quick print for easier parsing"),
    ('Q', "quick print with equal-signs"),
    ('T', "print human-readable text along with hex strings"),
    ('v', "print values only (not OID = value)"),
];

const MIN_PRINTABLE: u8 = 0x20;
const MAX_PRINTABLE: u8 = 0x7f;

/// Rendering of string-like values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StrFormat {
    /// Printable ASCII, other bytes as `.`.
    #[default]
    Ascii,
    /// Uppercase hex bytes separated by spaces.
    Hex,
    /// ASCII, a space, then hex.
    AsciiHex,
}

/// Line formatter built from `-O` flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formatter {
    show_key: bool,
    separator: &'static str,
    strings: StrFormat,
}

impl Default for Formatter {
    fn default() -> Self {
        Self {
            show_key: true,
            separator: DEFAULT_SEPARATOR,
            strings: StrFormat::default(),
        }
    }
}

impl Formatter {
    /// Reject unknown flags, naming each once in order of appearance.
    pub fn validate_flags(flags: &str) -> Result<(), String> {
        let mut invalid: Vec<char> = Vec::new();
        for ch in flags.chars() {
            if !OUTPUT_FLAGS.iter().any(|(flag, _)| *flag == ch) && !invalid.contains(&ch) {
                invalid.push(ch);
            }
        }
        match invalid.as_slice() {
            [] => Ok(()),
            [one] => Err(format!("Invalid format option: {}", one)),
            many => Err(format!(
                "Invalid format options: {}",
                many.iter()
                    .map(char::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
        }
    }

    /// Apply flags left to right; later flags override earlier ones.
    pub fn from_flags(flags: &str) -> Self {
        let mut formatter = Self::default();
        for ch in flags.chars() {
            match ch {
                'a' => formatter.strings = StrFormat::Ascii,
                'x' => formatter.strings = StrFormat::Hex,
                'T' => formatter.strings = StrFormat::AsciiHex,
                'q' => formatter.separator = " ",
                'Q' => formatter.separator = " = ",
                'v' => {
                    formatter.show_key = false;
                    formatter.separator = "";
                }
                _ => {}
            }
        }
        formatter
    }

    pub fn format_value(&self, value: &Value) -> String {
        match value {
            Value::Null => "null".to_string(),
            Value::Integer(v) => v.to_string(),
            Value::Counter32(v) | Value::Gauge32(v) | Value::TimeTicks(v) => v.to_string(),
            Value::Counter64(v) => v.to_string(),
            Value::ObjectIdentifier(oid) => oid.to_string(),
            Value::IpAddress([a, b, c, d]) => format!("{}.{}.{}.{}", a, b, c, d),
            Value::OctetString(bytes) | Value::Opaque(bytes) => self.format_bytes(bytes),
            other => other.to_string(),
        }
    }

    pub fn format(&self, oid: &Oid, value: &Value) -> String {
        let value = self.format_value(value);
        if self.show_key {
            format!("{}{}{}", oid, self.separator, value)
        } else {
            format!("{}{}", self.separator, value)
        }
    }

    fn format_bytes(&self, bytes: &[u8]) -> String {
        match self.strings {
            StrFormat::Ascii => ascii_string(bytes),
            StrFormat::Hex => hex_string(bytes),
            StrFormat::AsciiHex => format!("{} {}", ascii_string(bytes), hex_string(bytes)),
        }
    }
}

fn ascii_string(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| {
            if (MIN_PRINTABLE..MAX_PRINTABLE).contains(&b) {
                b as char
            } else {
                '.'
            }
        })
        .collect()
}

fn hex_string(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;

    fn sys_descr() -> Oid {
        oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)
    }

    #[test]
    fn test_default_line() {
        let f = Formatter::default();
        assert_eq!(
            f.format(&sys_descr(), &Value::from("Linux")),
            "1.3.6.1.2.1.1.1.0 = Linux"
        );
        assert_eq!(f.format_value(&Value::Null), "null");
        assert_eq!(f.format_value(&Value::Counter64(1 << 40)), "1099511627776");
        assert_eq!(f.format_value(&Value::IpAddress([10, 0, 0, 1])), "10.0.0.1");
        assert_eq!(
            f.format_value(&Value::ObjectIdentifier(oid!(1, 3, 6, 1, 4, 1, 9))),
            "1.3.6.1.4.1.9"
        );
    }

    #[test]
    fn test_string_formats() {
        let value = Value::from(&b"ab\x00\x7f"[..]);
        assert_eq!(Formatter::from_flags("").format_value(&value), "ab..");
        assert_eq!(
            Formatter::from_flags("x").format_value(&value),
            "61 62 00 7F"
        );
        assert_eq!(
            Formatter::from_flags("T").format_value(&value),
            "ab.. 61 62 00 7F"
        );
        assert_eq!(Formatter::from_flags("xa").format_value(&value), "ab..");
    }

    #[test]
    fn test_separators() {
        let value = Value::Integer(7);
        assert_eq!(
            Formatter::from_flags("q").format(&sys_descr(), &value),
            "1.3.6.1.2.1.1.1.0 7"
        );
        assert_eq!(
            Formatter::from_flags("qQ").format(&sys_descr(), &value),
            "1.3.6.1.2.1.1.1.0 = 7"
        );
        assert_eq!(Formatter::from_flags("v").format(&sys_descr(), &value), "7");
    }

    #[test]
    fn test_validate_flags() {
        assert!(Formatter::validate_flags("axqQTv").is_ok());
        assert_eq!(
            Formatter::validate_flags("qzz").unwrap_err(),
            "Invalid format option: z"
        );
        assert_eq!(
            Formatter::validate_flags("yqz").unwrap_err(),
            "Invalid format options: y, z"
        );
    }
}
