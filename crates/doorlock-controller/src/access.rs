//! Authorized tag list.

use doorlock_core::{Result, TagIdentifier};
use serde::{Deserialize, Serialize};
use subtle::{Choice, ConstantTimeEq};

/// Decides whether a presented tag may open the door.
pub trait AccessList {
    fn is_authorized(&self, tag: &TagIdentifier) -> bool;
}

/// Fixed list of authorized identifiers.
///
/// Lookups compare against every entry without stopping at a match, so the
/// time taken does not reveal where (or whether) a tag is listed.
///
/// # Examples
///
/// ```
/// use doorlock_controller::{AccessList, AuthorizedTags};
///
/// let tags = AuthorizedTags::parse(["04:AB:10:9F", "DE AD BE EF"]).unwrap();
/// assert!(tags.is_authorized(&"04AB109F".parse().unwrap()));
/// assert!(!tags.is_authorized(&"01:02:03:04".parse().unwrap()));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthorizedTags {
    tags: Vec<TagIdentifier>,
}

impl AuthorizedTags {
    pub fn new(tags: impl IntoIterator<Item = TagIdentifier>) -> Self {
        Self {
            tags: tags.into_iter().collect(),
        }
    }

    /// Parse identifiers written as colon, dash or space separated hex.
    ///
    /// # Errors
    ///
    /// `Error::InvalidTagFormat` for the first entry that does not parse.
    pub fn parse<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tags = entries
            .into_iter()
            .map(|entry| entry.as_ref().parse())
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { tags })
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TagIdentifier> {
        self.tags.iter()
    }
}

impl AccessList for AuthorizedTags {
    fn is_authorized(&self, tag: &TagIdentifier) -> bool {
        let found = self
            .tags
            .iter()
            .fold(Choice::from(0), |acc, known| {
                acc | known.as_bytes().ct_eq(tag.as_bytes())
            });
        found.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn tags() -> AuthorizedTags {
        AuthorizedTags::parse(["04:AB:10:9F", "11-22-33-44"]).unwrap()
    }

    #[rstest]
    #[case("04:AB:10:9F", true)]
    #[case("11:22:33:44", true)]
    #[case("04:AB:10:9E", false)]
    #[case("04:AB:10:9F:00", false)]
    #[case("04:AB:10", false)]
    fn test_is_authorized(#[case] presented: &str, #[case] expected: bool) {
        let tag: TagIdentifier = presented.parse().unwrap();
        assert_eq!(tags().is_authorized(&tag), expected);
    }

    #[test]
    fn test_empty_list_denies() {
        let tag = TagIdentifier::from_uid4([1, 2, 3, 4]);
        assert!(!AuthorizedTags::default().is_authorized(&tag));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(AuthorizedTags::parse(["04:AB:10:9F", "zz"]).is_err());
    }

    #[test]
    fn test_serde_as_string_list() {
        let json = serde_json::to_string(&tags()).unwrap();
        assert_eq!(json, r#"["04:AB:10:9F","11:22:33:44"]"#);

        let back: AuthorizedTags = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tags());
    }
}
