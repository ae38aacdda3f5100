//! Release version references.

use std::fmt;

use super::{FetchError, FetchResult};

/// A release identifier in both of its spellings.
///
/// Release tags carry a prefix (`v0.9.50`) while artifact file names usually
/// use the bare form (`MCC-0.9.50.mrpack`). Operators may type either.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionRef {
    tag: String,
    bare: String,
}

impl VersionRef {
    /// Normalize `input` against `tag_prefix`.
    ///
    /// # Example
    ///
    /// ```
    /// use localserver::fetch::VersionRef;
    ///
    /// let a = VersionRef::parse("v0.9.50", "v").unwrap();
    /// let b = VersionRef::parse("0.9.50", "v").unwrap();
    /// assert_eq!(a, b);
    /// assert_eq!(a.tag(), "v0.9.50");
    /// assert_eq!(a.bare(), "0.9.50");
    /// ```
    pub fn parse(input: &str, tag_prefix: &str) -> FetchResult<Self> {
        let trimmed = input.trim();
        let bare = if tag_prefix.is_empty() {
            trimmed
        } else {
            trimmed.strip_prefix(tag_prefix).unwrap_or(trimmed)
        };

        let valid = !bare.is_empty()
            && bare
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | '+'));
        if !valid {
            return Err(FetchError::InvalidVersion(input.to_string()));
        }

        Ok(Self {
            tag: format!("{}{}", tag_prefix, bare),
            bare: bare.to_string(),
        })
    }

    /// Tag form, e.g. `v0.9.50`.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Bare form, e.g. `0.9.50`.
    pub fn bare(&self) -> &str {
        &self.bare
    }

    /// Parsed semantic version of the bare form, if it is one.
    pub fn semver(&self) -> Option<semver::Version> {
        semver::Version::parse(&self.bare).ok()
    }

    /// Substitute `{tag}` and `{version}` in a URL template.
    pub fn expand(&self, template: &str) -> String {
        template
            .replace("{tag}", &self.tag)
            .replace("{version}", &self.bare)
    }
}

impl fmt::Display for VersionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag)
    }
}
