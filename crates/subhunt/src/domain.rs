use crate::{Error, Result};
use lazy_regex::regex_is_match;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

const MAX_DOMAIN_LEN: usize = 253;

/// A validated target domain, stored lower-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Domain(String);

impl Domain {
    pub fn validate(input: &str) -> Result<Domain> {
        if input.is_empty() || input.len() > MAX_DOMAIN_LEN {
            return Err(Error::InvalidDomain(input.to_string()));
        }

        // labels of 1-63 chars, no hyphen at either end, alphabetic final label
        if !regex_is_match!(
            r"^(?:[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?\.)+[a-zA-Z]{2,63}$",
            input
        ) {
            return Err(Error::InvalidDomain(input.to_string()));
        }

        Ok(Domain(input.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when `name` is this domain or one of its subdomains, on a label boundary.
    pub fn is_parent_of(&self, name: &str) -> bool {
        match name.strip_suffix(self.as_str()) {
            Some("") => true,
            Some(prefix) => prefix.len() > 1 && prefix.ends_with('.'),
            None => false,
        }
    }
}

impl FromStr for Domain {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Domain::validate(s)
    }
}

impl AsRef<str> for Domain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::Domain;
    use crate::Error;

    #[test]
    fn accepts_valid_domains() {
        for input in [
            "example.com",
            "api.example.com",
            "a-b.c-d.co",
            "x.io",
            "deep.nested.sub.example.org",
            "123.example.net",
        ] {
            let domain = Domain::validate(input).unwrap();
            assert_eq!(domain.as_str(), input);
        }
    }

    #[test]
    fn validation_is_idempotent() {
        let first = Domain::validate("Sub.Example.COM").unwrap();
        let second = Domain::validate(first.as_str()).unwrap();
        assert_eq!(first, second);
        assert_eq!(second.as_str(), "sub.example.com");
    }

    #[test]
    fn rejects_malformed_domains() {
        for input in [
            "",
            "localhost",
            "example.c",
            "example.c0m",
            "-example.com",
            "example-.com",
            "exa_mple.com",
            "example..com",
            ".example.com",
            "example.com.",
            "https://example.com",
            "example.com/path",
            "exam ple.com",
        ] {
            assert!(
                matches!(Domain::validate(input), Err(Error::InvalidDomain(_))),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_oversized_labels() {
        let label = "a".repeat(64);
        assert!(Domain::validate(&format!("{label}.com")).is_err());
        let label = "a".repeat(63);
        assert!(Domain::validate(&format!("{label}.com")).is_ok());
    }

    #[test]
    fn parent_matching_respects_label_boundary() {
        let domain = Domain::validate("example.com").unwrap();
        assert!(domain.is_parent_of("example.com"));
        assert!(domain.is_parent_of("api.example.com"));
        assert!(!domain.is_parent_of("notexample.com"));
        assert!(!domain.is_parent_of("example.com.evil.com"));
        assert!(!domain.is_parent_of(".example.com"));
    }
}
