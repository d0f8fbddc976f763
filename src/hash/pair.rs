//! The `sig:body` hash pair and change classification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between the signature and body halves.
pub const PAIR_DELIMITER: char = ':';

/// A signature/body hash pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct HashPair {
    pub signature: String,
    pub body: String,
}

impl HashPair {
    pub fn new(signature: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            signature: signature.into(),
            body: body.into(),
        }
    }

    /// Storage form: `<sig>:<body>`.
    pub fn encode(&self) -> String {
        format!("{}{}{}", self.signature, PAIR_DELIMITER, self.body)
    }

    /// Parse a stored pair. Never fails: a missing delimiter makes the whole
    /// string the signature half with an empty body half.
    pub fn parse(text: &str) -> Self {
        match text.split_once(PAIR_DELIMITER) {
            Some((signature, body)) => Self::new(signature, body),
            None => Self::new(text, ""),
        }
    }

    /// Both halves present.
    pub fn is_well_formed(&self) -> bool {
        !self.signature.is_empty() && !self.body.is_empty()
    }
}

impl fmt::Display for HashPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl From<&str> for HashPair {
    fn from(text: &str) -> Self {
        Self::parse(text)
    }
}

/// What changed between two hash pairs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeClass {
    pub signature_changed: bool,
    pub body_changed: bool,
}

impl ChangeClass {
    /// Everything must be recomputed.
    pub const ALL: ChangeClass = ChangeClass {
        signature_changed: true,
        body_changed: true,
    };

    pub fn is_unchanged(&self) -> bool {
        !self.signature_changed && !self.body_changed
    }
}

/// Classify the change between two encoded pairs.
///
/// A pair that is not well formed on either side classifies as
/// [`ChangeClass::ALL`].
pub fn compare(old: &str, new: &str) -> ChangeClass {
    compare_pairs(&HashPair::parse(old), &HashPair::parse(new))
}

/// [`compare`] over already-parsed pairs.
pub fn compare_pairs(old: &HashPair, new: &HashPair) -> ChangeClass {
    if !old.is_well_formed() || !new.is_well_formed() {
        return ChangeClass::ALL;
    }
    ChangeClass {
        signature_changed: old.signature != new.signature,
        body_changed: old.body != new.body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_identical() {
        let class = compare("abcd1234:efgh5678", "abcd1234:efgh5678");
        assert_eq!((class.signature_changed, class.body_changed), (false, false));
        assert!(class.is_unchanged());
    }

    #[test]
    fn test_compare_signature_only() {
        let class = compare("abcd1234:efgh5678", "xxxx9999:efgh5678");
        assert_eq!((class.signature_changed, class.body_changed), (true, false));
    }

    #[test]
    fn test_compare_body_only() {
        let class = compare("abcd1234:efgh5678", "abcd1234:00000000");
        assert_eq!((class.signature_changed, class.body_changed), (false, true));
    }

    #[test]
    fn test_compare_malformed_is_everything() {
        assert_eq!(compare("abcd1234:efgh5678", "invalidhash"), ChangeClass::ALL);
        assert_eq!(compare("invalidhash", "abcd1234:efgh5678"), ChangeClass::ALL);
        assert_eq!(compare("abcd1234:", "abcd1234:"), ChangeClass::ALL);
        assert_eq!(compare(":efgh5678", ":efgh5678"), ChangeClass::ALL);
        assert_eq!(compare("", ""), ChangeClass::ALL);
    }

    #[test]
    fn test_parse_tolerates_missing_parts() {
        let pair = HashPair::parse("onlysig");
        assert_eq!(pair.signature, "onlysig");
        assert_eq!(pair.body, "");
        assert!(!pair.is_well_formed());

        let pair = HashPair::parse(":body");
        assert_eq!(pair.signature, "");
        assert_eq!(pair.body, "body");
    }

    #[test]
    fn test_encode_parse() {
        let pair = HashPair::new("aa", "bb");
        assert_eq!(pair.encode(), "aa:bb");
        assert_eq!(pair.to_string(), "aa:bb");
        assert_eq!(HashPair::from("aa:bb"), pair);
    }
}
