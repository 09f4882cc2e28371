//! Port specification parsing and wire encoding
//!
//! Ports are addressed on the wire with the TL1 enumeration syntax: `&` joins
//! the members of a list, `&&` joins the endpoints of an inclusive range.
//! Operators type the human form instead: `7`, `1,2,3` or `1-5`.

use std::fmt;
use std::str::FromStr;

use crate::error::Tl1Error;

/// A parsed port specification.
///
/// The variant is decided once, at the API boundary, from the documented
/// comma/dash rule, never re-sniffed from string contents later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortSpec {
    /// One port
    Single(u32),
    /// An explicit, ordered list of ports
    List(Vec<u32>),
    /// An inclusive range of ports
    Range(u32, u32),
}

impl PortSpec {
    /// Render the TL1 wire form: `7`, `1&2&3` or `1&&5`.
    pub fn wire(&self) -> String {
        match self {
            PortSpec::Single(port) => port.to_string(),
            PortSpec::List(ports) => ports
                .iter()
                .map(|p| p.to_string())
                .collect::<Vec<_>>()
                .join("&"),
            PortSpec::Range(low, high) => format!("{}&&{}", low, high),
        }
    }
}

impl fmt::Display for PortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.wire())
    }
}

fn parse_port(token: &str, spec: &str) -> Result<u32, Tl1Error> {
    token
        .trim()
        .parse::<u32>()
        .map_err(|_| Tl1Error::InvalidPortSpec(spec.to_string()))
}

impl FromStr for PortSpec {
    type Err = Tl1Error;

    /// Parse the human form.
    ///
    /// Inputs mixing `,` and `-` are ambiguous in the original grammar; they
    /// are rejected rather than guessed, as is anything non-numeric.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if text.is_empty() {
            return Err(Tl1Error::InvalidPortSpec(s.to_string()));
        }

        let has_comma = text.contains(',');
        let has_dash = text.contains('-');
        if has_comma && has_dash {
            return Err(Tl1Error::InvalidPortSpec(s.to_string()));
        }

        if has_comma {
            let ports = text
                .split(',')
                .map(|t| parse_port(t, s))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(PortSpec::List(ports))
        } else if has_dash {
            let mut parts = text.split('-');
            match (parts.next(), parts.next(), parts.next()) {
                (Some(low), Some(high), None) => {
                    Ok(PortSpec::Range(parse_port(low, s)?, parse_port(high, s)?))
                }
                _ => Err(Tl1Error::InvalidPortSpec(s.to_string())),
            }
        } else {
            Ok(PortSpec::Single(parse_port(text, s)?))
        }
    }
}

impl From<Vec<u32>> for PortSpec {
    /// An already-structured sequence of ports, order preserved.
    fn from(ports: Vec<u32>) -> Self {
        PortSpec::List(ports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_single() {
        assert_eq!("7".parse::<PortSpec>().unwrap(), PortSpec::Single(7));
        assert_eq!(" 7 ".parse::<PortSpec>().unwrap(), PortSpec::Single(7));
    }

    #[test]
    fn test_decode_list() {
        assert_eq!(
            "1,2,3".parse::<PortSpec>().unwrap(),
            PortSpec::List(vec![1, 2, 3])
        );
    }

    #[test]
    fn test_decode_range() {
        assert_eq!("1-5".parse::<PortSpec>().unwrap(), PortSpec::Range(1, 5));
    }

    #[test]
    fn test_encode() {
        assert_eq!(PortSpec::Single(7).wire(), "7");
        assert_eq!(PortSpec::List(vec![1, 2, 3]).wire(), "1&2&3");
        assert_eq!(PortSpec::Range(1, 5).wire(), "1&&5");
    }

    #[test]
    fn test_mixed_separators_rejected() {
        assert!(matches!(
            "1,2-3".parse::<PortSpec>(),
            Err(Tl1Error::InvalidPortSpec(_))
        ));
        assert!(matches!(
            "1-2,3".parse::<PortSpec>(),
            Err(Tl1Error::InvalidPortSpec(_))
        ));
    }

    #[test]
    fn test_malformed_rejected() {
        for bad in ["", "  ", "a", "1,a", "1-", "-5", "1-2-3", "1&&5"] {
            assert!(
                matches!(bad.parse::<PortSpec>(), Err(Tl1Error::InvalidPortSpec(_))),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_comma_list_round_trip() {
        // encode(decode(t)) with '&' re-expanded equals t for comma-only input
        for text in ["1,2,3", "49,50", "8"] {
            let spec = text.parse::<PortSpec>().unwrap();
            assert_eq!(spec.wire().replace('&', ","), text);
        }
    }

    #[test]
    fn test_from_vec_preserves_order() {
        let spec = PortSpec::from(vec![3, 1, 2]);
        assert_eq!(spec.wire(), "3&1&2");
    }
}
