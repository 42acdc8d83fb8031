//! Framework versions and target framework monikers.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// `major.minor.patch[-pre]` version of a framework or framework directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FxVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub pre: Option<String>,
}

impl FxVersion {
    /// True if `self` is a patch-level sibling of `other` (same major.minor).
    pub fn same_feature_band(&self, other: &FxVersion) -> bool {
        self.major == other.major && self.minor == other.minor
    }
}

impl FromStr for FxVersion {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        // Build metadata never takes part in comparisons.
        let version = value.split_once('+').map_or(value, |(version, _)| version);
        let (release, pre) = match version.split_once('-') {
            Some((release, pre)) => (release, Some(pre.to_string())),
            None => (version, None),
        };
        let mut parts = release.split('.');
        let mut next = |field: &str| -> Result<u64, String> {
            parts
                .next()
                .ok_or_else(|| format!("version '{value}' is missing {field}"))?
                .parse::<u64>()
                .map_err(|err| format!("version '{value}' has invalid {field}: {err}"))
        };
        let major = next("major")?;
        let minor = next("minor")?;
        let patch = next("patch")?;
        if parts.next().is_some() {
            return Err(format!("version '{value}' has too many components"));
        }
        Ok(Self {
            major,
            minor,
            patch,
            pre: pre.filter(|pre| !pre.is_empty()),
        })
    }
}

impl Ord for FxVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| match (&self.pre, &other.pre) {
                (None, None) => Ordering::Equal,
                // A pre-release sorts before its release.
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (Some(left), Some(right)) => compare_prerelease(left, right),
            })
    }
}

/// Dot-separated identifiers, left to right. Numeric identifiers compare as
/// numbers and sort below alphanumeric ones; a shorter prefix sorts first.
fn compare_prerelease(left: &str, right: &str) -> Ordering {
    let mut left_ids = left.split('.');
    let mut right_ids = right.split('.');
    loop {
        let order = match (left_ids.next(), right_ids.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => match (l.parse::<u64>(), r.parse::<u64>()) {
                (Ok(ln), Ok(rn)) => ln.cmp(&rn).then_with(|| l.cmp(r)),
                (Ok(_), Err(_)) => Ordering::Less,
                (Err(_), Ok(_)) => Ordering::Greater,
                (Err(_), Err(_)) => l.cmp(r),
            },
        };
        if order != Ordering::Equal {
            return order;
        }
    }
}

impl PartialOrd for FxVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for FxVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.pre {
            write!(f, "-{pre}")?;
        }
        Ok(())
    }
}

/// Highest candidate in the same feature band as `target` that is not newer than it.
pub fn best_patch_match<'v>(candidates: &'v [FxVersion], target: &FxVersion) -> Option<&'v FxVersion> {
    candidates
        .iter()
        .filter(|candidate| candidate.same_feature_band(target) && *candidate <= target)
        .max()
}

/// Short TFM for a target framework moniker (`.NETCoreApp,Version=v8.0` → `net8.0`).
///
/// Versions below 5 use the `netcoreappX.Y` spelling.
pub fn short_tfm(moniker: &str) -> Option<String> {
    let (identifier, version) = moniker.split_once(",Version=v")?;
    if identifier != ".NETCoreApp" {
        return None;
    }
    let major: u64 = version.split('.').next()?.parse().ok()?;
    if major >= 5 {
        Some(format!("net{version}"))
    } else {
        Some(format!("netcoreapp{version}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(value: &str) -> FxVersion {
        value.parse().expect("version")
    }

    #[test]
    fn parses_release_and_prerelease() {
        assert_eq!(v("8.0.1").to_string(), "8.0.1");
        assert_eq!(v("9.0.0-preview.3").pre.as_deref(), Some("preview.3"));
        assert!("8.0".parse::<FxVersion>().is_err());
        assert!("8.x.1".parse::<FxVersion>().is_err());
    }

    #[test]
    fn build_metadata_is_ignored() {
        assert_eq!(v("8.0.1+build-5"), v("8.0.1"));
        assert_eq!(v("8.0.1+build-5").pre, None);
        assert_eq!(v("9.0.0-rc.1+sha.abc-def").pre.as_deref(), Some("rc.1"));
    }

    #[test]
    fn prerelease_identifiers_compare_numerically() {
        assert!(v("9.0.0-preview.9") < v("9.0.0-preview.10"));
        assert!(v("9.0.0-preview.7") < v("9.0.0-rc.1"));
        assert!(v("9.0.0-alpha") < v("9.0.0-alpha.1"));
        assert!(v("9.0.0-1") < v("9.0.0-alpha"));
        let candidates = vec![v("9.0.0-preview.9"), v("9.0.0-preview.10")];
        let best = best_patch_match(&candidates, &v("9.0.0")).expect("match");
        assert_eq!(best, &v("9.0.0-preview.10"));
    }

    #[test]
    fn prerelease_sorts_before_release() {
        assert!(v("9.0.0-rc.1") < v("9.0.0"));
        assert!(v("8.0.10") > v("8.0.9"));
    }

    #[test]
    fn best_patch_match_stays_in_band_and_not_newer() {
        let candidates = vec![v("8.0.0"), v("8.0.2"), v("8.0.5"), v("8.1.0"), v("7.0.9")];
        let best = best_patch_match(&candidates, &v("8.0.3")).expect("match");
        assert_eq!(best, &v("8.0.2"));
        assert_eq!(best_patch_match(&candidates, &v("6.0.0")), None);
    }

    #[test]
    fn short_tfm_handles_both_spellings() {
        assert_eq!(short_tfm(".NETCoreApp,Version=v8.0").as_deref(), Some("net8.0"));
        assert_eq!(
            short_tfm(".NETCoreApp,Version=v3.1").as_deref(),
            Some("netcoreapp3.1")
        );
        assert_eq!(short_tfm(".NETStandard,Version=v2.0"), None);
    }
}
