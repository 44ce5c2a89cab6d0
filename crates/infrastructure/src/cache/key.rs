use compact_str::CompactString;
use ferrous_resolver_domain::{Question, RecordClass, RecordType};
use std::fmt;

/// Cache key: lowercased name plus type and class. Domain names are already
/// lowercase by construction, so building a key never re-normalizes.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    name: CompactString,
    record_type: RecordType,
    class: RecordClass,
}

impl CacheKey {
    pub fn for_question(question: &Question) -> Self {
        Self {
            name: CompactString::from(question.name.to_string()),
            record_type: question.record_type,
            class: question.class,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn record_type(&self) -> RecordType {
        self.record_type
    }

    pub fn class(&self) -> RecordClass {
        self.class
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.name, self.record_type, self.class)
    }
}
