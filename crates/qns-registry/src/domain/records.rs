//! # Record Types and Payload Validation
//!
//! Type-specific checks applied before any record is written, plus the SOA
//! payload codec. Adding a record type means extending [`RecordType`] and the
//! single `match` in [`validate_payload`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv6Addr;
use std::str::FromStr;

use super::errors::RegistryError;
use super::grammar::split_and_check;

/// Maximum TXT payload length in characters.
pub const TXT_MAX_LENGTH: usize = 255;

/// Maximum SOA email length.
pub const SOA_EMAIL_MAX_LENGTH: usize = 255;

/// Number of space-delimited fields in an SOA payload.
pub const SOA_FIELD_COUNT: usize = 7;

/// Index of the serial field inside an SOA payload.
const SOA_SERIAL_INDEX: usize = 2;

/// DNS record types held by the store.
///
/// Discriminants are the DNS wire type numbers and double as the type byte
/// inside record keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
#[allow(clippy::upper_case_acronyms)]
pub enum RecordType {
    A = 1,
    CNAME = 5,
    SOA = 6,
    TXT = 16,
    AAAA = 28,
}

impl RecordType {
    /// Every supported type, in key order.
    pub const ALL: [RecordType; 5] = [
        RecordType::A,
        RecordType::CNAME,
        RecordType::SOA,
        RecordType::TXT,
        RecordType::AAAA,
    ];

    /// Byte used in storage keys.
    pub const fn as_byte(self) -> u8 {
        self as u8
    }

    /// Inverse of [`RecordType::as_byte`].
    pub fn from_byte(byte: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_byte() == byte)
    }

    /// DNS mnemonic.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::CNAME => "CNAME",
            RecordType::SOA => "SOA",
            RecordType::TXT => "TXT",
            RecordType::AAAA => "AAAA",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

impl FromStr for RecordType {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.mnemonic().eq_ignore_ascii_case(s))
            .ok_or_else(|| RegistryError::invalid_format(format!("unsupported record type {s:?}")))
    }
}

/// Validate `data` for a record of `record_type` written through the
/// generic record path. SOA is rejected here; it is only written by
/// registration and `update_soa`.
pub fn validate_payload(record_type: RecordType, data: &str) -> Result<(), RegistryError> {
    let reject = |reason: &str| RegistryError::InvalidRecord {
        record_type,
        reason: reason.to_string(),
    };

    match record_type {
        RecordType::A => {
            if check_ipv4(data) {
                Ok(())
            } else {
                Err(reject("not a public IPv4 host address"))
            }
        }
        RecordType::AAAA => {
            if check_ipv6(data) {
                Ok(())
            } else {
                Err(reject("not a global unicast IPv6 address"))
            }
        }
        RecordType::CNAME => split_and_check(data, true)
            .map(|_| ())
            .map_err(|_| reject("target is not a valid name")),
        RecordType::TXT => {
            if data.chars().count() <= TXT_MAX_LENGTH {
                Ok(())
            } else {
                Err(reject("longer than 255 characters"))
            }
        }
        RecordType::SOA => Err(reject("SOA records are managed by the registry")),
    }
}

/// Parse a strict dotted-quad: four decimal octets, no leading zeros.
fn parse_ipv4(data: &str) -> Option<[u8; 4]> {
    let mut octets = [0u8; 4];
    let mut parts = data.split('.');
    for octet in octets.iter_mut() {
        let part = parts.next()?;
        if part.is_empty() || part.len() > 3 || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if part.len() > 1 && part.starts_with('0') {
            return None;
        }
        *octet = part.parse().ok()?;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(octets)
}

/// True for a syntactically valid, publicly routable IPv4 host address.
pub fn check_ipv4(data: &str) -> bool {
    let Some([a, b, c, d]) = parse_ipv4(data) else {
        return false;
    };

    let reserved = match (a, b, c) {
        (0, _, _) | (10, _, _) | (127, _, _) => true,
        (169, 254, _) => true,
        (172, 16..=31, _) => true,
        (192, 0, 0) | (192, 0, 2) | (192, 88, 99) => true,
        (192, 168, _) => true,
        (198, 18..=19, _) => true,
        (198, 51, 100) => true,
        (203, 0, 113) => true,
        (224..=255, _, _) => true,
        _ => false,
    };

    !reserved && d != 0 && d != 255
}

/// True for an IPv6 literal inside the global unicast block `2000::/3`,
/// excluding 6to4, the retired 6bone range and the documentation prefix.
pub fn check_ipv6(data: &str) -> bool {
    if data.contains('.') {
        return false;
    }
    let Ok(address) = Ipv6Addr::from_str(data) else {
        return false;
    };

    let segments = address.segments();
    if segments[0] & 0xe000 != 0x2000 {
        return false;
    }
    !matches!(
        (segments[0], segments[1]),
        (0x2002, _) | (0x3ffe, _) | (0x2001, 0x0db8)
    )
}

/// Caller-supplied SOA fields. The primary name and serial are filled in by
/// the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoaFields {
    pub email: String,
    pub refresh: u32,
    pub retry: u32,
    pub expire: u32,
    pub ttl: u32,
}

impl SoaFields {
    /// Check the email; the payload is space-delimited so whitespace would
    /// corrupt it.
    pub fn validate(&self) -> Result<(), RegistryError> {
        if self.email.is_empty()
            || self.email.len() > SOA_EMAIL_MAX_LENGTH
            || self.email.chars().any(char::is_whitespace)
        {
            return Err(RegistryError::InvalidRecord {
                record_type: RecordType::SOA,
                reason: "invalid email".to_string(),
            });
        }
        Ok(())
    }
}

/// Parsed SOA payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoaRecord {
    pub mname: String,
    pub email: String,
    pub serial: u64,
    pub refresh: u32,
    pub retry: u32,
    pub expire: u32,
    pub ttl: u32,
}

impl SoaRecord {
    /// Build the SOA for `mname` with the given serial.
    pub fn new(mname: impl Into<String>, fields: &SoaFields, serial: u64) -> Self {
        Self {
            mname: mname.into(),
            email: fields.email.clone(),
            serial,
            refresh: fields.refresh,
            retry: fields.retry,
            expire: fields.expire,
            ttl: fields.ttl,
        }
    }

    /// Encode as `name email serial refresh retry expire ttl`.
    pub fn to_payload(&self) -> String {
        format!(
            "{} {} {} {} {} {} {}",
            self.mname, self.email, self.serial, self.refresh, self.retry, self.expire, self.ttl
        )
    }

    /// Decode a stored payload.
    pub fn parse(data: &str) -> Result<Self, RegistryError> {
        let fields: Vec<&str> = data.split(' ').collect();
        if fields.len() != SOA_FIELD_COUNT {
            return Err(corrupted_soa(data));
        }
        let number = |s: &str| s.parse::<u32>().map_err(|_| corrupted_soa(data));
        Ok(Self {
            mname: fields[0].to_string(),
            email: fields[1].to_string(),
            serial: fields[2].parse().map_err(|_| corrupted_soa(data))?,
            refresh: number(fields[3])?,
            retry: number(fields[4])?,
            expire: number(fields[5])?,
            ttl: number(fields[6])?,
        })
    }
}

/// Rewrite only the serial field of a stored SOA payload.
pub fn refresh_serial(data: &str, serial: u64) -> Result<String, RegistryError> {
    let mut fields: Vec<String> = data.split(' ').map(str::to_string).collect();
    if fields.len() != SOA_FIELD_COUNT {
        return Err(corrupted_soa(data));
    }
    fields[SOA_SERIAL_INDEX] = serial.to_string();
    Ok(fields.join(" "))
}

fn corrupted_soa(data: &str) -> RegistryError {
    RegistryError::Corrupted {
        reason: format!("malformed SOA payload {data:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> SoaFields {
        SoaFields {
            email: "admin.example.com".to_string(),
            refresh: 3600,
            retry: 600,
            expire: 604_800,
            ttl: 3600,
        }
    }

    #[test]
    fn test_record_type_roundtrip_through_byte() {
        for t in RecordType::ALL {
            assert_eq!(RecordType::from_byte(t.as_byte()), Some(t));
        }
        assert_eq!(RecordType::from_byte(2), None);
    }

    #[test]
    fn test_record_type_parse() {
        assert_eq!("aaaa".parse::<RecordType>().unwrap(), RecordType::AAAA);
        assert_eq!("CNAME".parse::<RecordType>().unwrap(), RecordType::CNAME);
        assert!("MX".parse::<RecordType>().is_err());
    }

    #[test]
    fn test_public_ipv4_accepted() {
        assert!(check_ipv4("93.184.216.34"));
        assert!(check_ipv4("1.2.3.4"));
        assert!(check_ipv4("8.8.8.8"));
    }

    #[test]
    fn test_reserved_ipv4_rejected() {
        for addr in [
            "0.1.2.3",
            "10.0.0.1",
            "127.0.0.1",
            "169.254.1.1",
            "172.16.0.1",
            "172.31.255.1",
            "192.168.1.1",
            "192.0.2.1",
            "198.51.100.7",
            "203.0.113.9",
            "224.0.0.1",
            "255.255.255.254",
            "1.2.3.0",
            "1.2.3.255",
        ] {
            assert!(!check_ipv4(addr), "{addr} should be rejected");
        }
    }

    #[test]
    fn test_malformed_ipv4_rejected() {
        for addr in ["1.2.3", "1.2.3.4.5", "01.2.3.4", "1.2.3.256", "a.b.c.d", "1..3.4", ""] {
            assert!(!check_ipv4(addr), "{addr:?} should be rejected");
        }
    }

    #[test]
    fn test_ipv6_global_unicast() {
        assert!(check_ipv6("2606:2800:220:1:248:1893:25c8:1946"));
        assert!(check_ipv6("2a00:1450:4001:82a::200e"));
        assert!(!check_ipv6("::1"));
        assert!(!check_ipv6("fe80::1"));
        assert!(!check_ipv6("2002:c000:0204::1"));
        assert!(!check_ipv6("3ffe:1900:4545:3:200:f8ff:fe21:67cf"));
        assert!(!check_ipv6("2001:db8::1"));
        assert!(!check_ipv6("::ffff:1.2.3.4"));
        assert!(!check_ipv6("not-an-address"));
    }

    #[test]
    fn test_validate_payload_dispatch() {
        assert!(validate_payload(RecordType::A, "93.184.216.34").is_ok());
        assert!(validate_payload(RecordType::CNAME, "www.example.com").is_ok());
        assert!(validate_payload(RecordType::CNAME, "-bad.com").is_err());
        assert!(validate_payload(RecordType::TXT, &"x".repeat(255)).is_ok());
        assert!(validate_payload(RecordType::TXT, &"x".repeat(256)).is_err());
        assert!(validate_payload(RecordType::SOA, "anything").is_err());
    }

    #[test]
    fn test_soa_payload_roundtrip() {
        let soa = SoaRecord::new("example.com", &fields(), 1_700_000_000_000);
        let payload = soa.to_payload();
        assert_eq!(
            payload,
            "example.com admin.example.com 1700000000000 3600 600 604800 3600"
        );
        assert_eq!(SoaRecord::parse(&payload).unwrap(), soa);
    }

    #[test]
    fn test_refresh_serial_rewrites_only_serial() {
        let payload = "example.com admin.example.com 1 3600 600 604800 3600";
        let refreshed = refresh_serial(payload, 42).unwrap();
        assert_eq!(refreshed, "example.com admin.example.com 42 3600 600 604800 3600");
    }

    #[test]
    fn test_malformed_soa_is_corruption() {
        let err = refresh_serial("example.com admin 1 2 3", 9).unwrap_err();
        assert!(matches!(err, RegistryError::Corrupted { .. }));
        assert!(SoaRecord::parse("a b c d e f g").is_err());
    }

    #[test]
    fn test_soa_email_validation() {
        assert!(fields().validate().is_ok());
        let mut bad = fields();
        bad.email = "admin example.com".to_string();
        assert!(bad.validate().is_err());
        bad.email = String::new();
        assert!(bad.validate().is_err());
    }
}
