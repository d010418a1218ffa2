use crate::layout::HostPlatform;
use std::fmt;
use thiserror::Error;

pub const BASELINE_SYMBOL: &str = "UNITY_STANDALONE";
pub const DEBUG_SYMBOL: &str = "DEVELOPMENT_BUILD";

/// Known host release lines, oldest first. Each yields `UNITY_<M>_<m>_OR_NEWER`
/// when the host is at or past `<M>.<m>.0`.
pub const RELEASE_LINES: &[(u32, u32)] = &[
    (5, 3),
    (5, 4),
    (5, 5),
    (5, 6),
    (2017, 1),
    (2017, 2),
    (2017, 3),
    (2017, 4),
    (2018, 1),
    (2018, 2),
    (2018, 3),
    (2018, 4),
    (2019, 1),
    (2019, 2),
    (2019, 3),
    (2019, 4),
    (2020, 1),
    (2020, 2),
    (2020, 3),
    (2021, 1),
    (2021, 2),
    (2021, 3),
    (2022, 1),
    (2022, 2),
    (2022, 3),
    (2023, 1),
    (2023, 2),
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid host version '{raw}': expected <major>.<minor>.<patch>[b|f|p<build>]")]
pub struct VersionError {
    pub raw: String,
}

/// Host engine version such as `2019.4.1f1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct HostVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl HostVersion {
    /// Split on `.`, `b`, `f` and `p`; the first three fields must be numeric.
    /// Anything after the patch (the build suffix) is ignored.
    pub fn parse(raw: &str) -> Result<Self, VersionError> {
        let invalid = || VersionError {
            raw: raw.to_string(),
        };
        let mut fields = raw.trim().split(['.', 'b', 'f', 'p']);
        let mut next = || -> Result<u32, VersionError> {
            fields
                .next()
                .and_then(|field| field.parse().ok())
                .ok_or_else(invalid)
        };
        Ok(Self {
            major: next()?,
            minor: next()?,
            patch: next()?,
        })
    }

    pub fn is_at_least(&self, major: u32, minor: u32) -> bool {
        (self.major, self.minor, self.patch) >= (major, minor, 0)
    }
}

impl fmt::Display for HostVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Preprocessor symbols for a host, in the order they are sent.
pub fn derive_symbols(
    platform: HostPlatform,
    version: HostVersion,
    debug_build: bool,
) -> Vec<String> {
    let mut symbols = vec![
        BASELINE_SYMBOL.to_string(),
        platform.platform_symbol().to_string(),
    ];
    if debug_build {
        symbols.push(DEBUG_SYMBOL.to_string());
    }
    let HostVersion {
        major,
        minor,
        patch,
    } = version;
    symbols.push(format!("UNITY_{major}"));
    symbols.push(format!("UNITY_{major}_{minor}"));
    symbols.push(format!("UNITY_{major}_{minor}_{patch}"));
    symbols.extend(
        RELEASE_LINES
            .iter()
            .filter(|(m, n)| version.is_at_least(*m, *n))
            .map(|(m, n)| format!("UNITY_{m}_{n}_OR_NEWER")),
    );
    symbols
}
