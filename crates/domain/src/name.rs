use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// Longest label in octets (RFC 1035 §2.3.4).
const MAX_LABEL_LEN: usize = 63;

/// Longest name in wire octets, including length octets and the root
/// terminator (RFC 1035 §2.3.4).
const MAX_NAME_LEN: usize = 255;

/// A fully qualified domain name, stored as its ordered label sequence.
///
/// Labels are normalized to ASCII lowercase on construction so that equality,
/// hashing and the cache fingerprint are case-insensitive. The root name has
/// zero labels and displays as `"."`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DomainName {
    labels: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    #[error("empty label in domain name")]
    EmptyLabel,

    #[error("label exceeds {MAX_LABEL_LEN} octets: {0}")]
    LabelTooLong(String),

    #[error("domain name exceeds {MAX_NAME_LEN} octets on the wire")]
    NameTooLong,

    #[error("label contains non-ASCII or control characters")]
    InvalidLabel,
}

impl DomainName {
    /// The root name (zero labels).
    pub fn root() -> Self {
        Self { labels: Vec::new() }
    }

    /// Builds a name from raw label octets, e.g. as decoded off the wire.
    pub fn from_labels<I, L>(labels: I) -> Result<Self, NameError>
    where
        I: IntoIterator<Item = L>,
        L: AsRef<[u8]>,
    {
        let mut out = Vec::new();
        for label in labels {
            let label = label.as_ref();
            out.push(Self::check_label(label)?);
        }
        let name = Self { labels: out };
        if name.wire_len() > MAX_NAME_LEN {
            return Err(NameError::NameTooLong);
        }
        Ok(name)
    }

    fn check_label(label: &[u8]) -> Result<String, NameError> {
        if label.is_empty() {
            return Err(NameError::EmptyLabel);
        }
        if label.len() > MAX_LABEL_LEN {
            return Err(NameError::LabelTooLong(
                String::from_utf8_lossy(label).into_owned(),
            ));
        }
        if !label.iter().all(|b| b.is_ascii() && !b.is_ascii_control()) {
            return Err(NameError::InvalidLabel);
        }
        Ok(String::from_utf8_lossy(label).to_ascii_lowercase())
    }

    /// Number of labels; zero for the root name.
    pub fn label_count(&self) -> usize {
        self.labels.len()
    }

    pub fn is_root(&self) -> bool {
        self.labels.is_empty()
    }

    /// Iterates the labels in lookup order (leftmost first).
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    /// Length of the wire encoding: one length octet per label plus the
    /// label octets, plus the root terminator.
    pub fn wire_len(&self) -> usize {
        self.labels.iter().map(|l| l.len() + 1).sum::<usize>() + 1
    }

    /// The reverse-lookup name for an address: `d.c.b.a.in-addr.arpa` for
    /// IPv4, nibble-reversed `ip6.arpa` for IPv6.
    pub fn reverse_from_ip(addr: IpAddr) -> Self {
        let mut labels: Vec<String> = match addr {
            IpAddr::V4(v4) => v4
                .octets()
                .iter()
                .rev()
                .map(|octet| octet.to_string())
                .collect(),
            IpAddr::V6(v6) => v6
                .octets()
                .iter()
                .rev()
                .flat_map(|octet| [octet & 0x0f, octet >> 4])
                .map(|nibble| format!("{:x}", nibble))
                .collect(),
        };
        match addr {
            IpAddr::V4(_) => {
                labels.push("in-addr".to_string());
                labels.push("arpa".to_string());
            }
            IpAddr::V6(_) => {
                labels.push("ip6".to_string());
                labels.push("arpa".to_string());
            }
        }
        Self { labels }
    }
}

impl FromStr for DomainName {
    type Err = NameError;

    /// Parses a dotted name. A single trailing dot is accepted and `"."`
    /// denotes the root name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.strip_suffix('.').unwrap_or(s);
        if trimmed.is_empty() {
            return Ok(Self::root());
        }
        Self::from_labels(trimmed.split('.').map(str::as_bytes))
    }
}

impl TryFrom<String> for DomainName {
    type Error = NameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DomainName> for String {
    fn from(name: DomainName) -> Self {
        name.to_string()
    }
}

impl fmt::Display for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.labels.is_empty() {
            return f.write_str(".");
        }
        for (i, label) in self.labels.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(label)?;
        }
        Ok(())
    }
}
