use crate::name::DomainName;
use crate::record_class::RecordClass;
use crate::record_type::RecordType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What is being asked: name, type and class.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Question {
    pub name: DomainName,
    pub record_type: RecordType,
    pub class: RecordClass,
}

impl Question {
    pub fn new(name: DomainName, record_type: RecordType) -> Self {
        Self {
            name,
            record_type,
            class: RecordClass::IN,
        }
    }

    pub fn with_class(name: DomainName, record_type: RecordType, class: RecordClass) -> Self {
        Self {
            name,
            record_type,
            class,
        }
    }

    /// Canonical fingerprint `name:type:class`, used as the cache key.
    /// The name is already lowercase by construction.
    pub fn fingerprint(&self) -> String {
        format!("{}:{}:{}", self.name, self.record_type, self.class)
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.name, self.class, self.record_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_case_insensitive() {
        let upper = Question::new("EXAMPLE.com".parse().unwrap(), RecordType::A);
        let lower = Question::new("example.com".parse().unwrap(), RecordType::A);
        assert_eq!(upper.fingerprint(), lower.fingerprint());
        assert_eq!(upper.fingerprint(), "example.com:A:IN");
    }

    #[test]
    fn fingerprint_distinguishes_type_and_class() {
        let name: DomainName = "example.com".parse().unwrap();
        let a = Question::new(name.clone(), RecordType::A);
        let aaaa = Question::new(name.clone(), RecordType::AAAA);
        let chaos = Question::with_class(name, RecordType::A, RecordClass::CH);
        assert_ne!(a.fingerprint(), aaaa.fingerprint());
        assert_ne!(a.fingerprint(), chaos.fingerprint());
    }
}
