//! Host platform and host version detection.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Operating systems that have a native artifact flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Windows, ships `.dll` artifacts.
    Windows,
    /// Linux, ships `.so` artifacts.
    Linux,
    /// macOS, ships `.dylib` artifacts.
    #[serde(rename = "macos")]
    MacOs,
}

impl Platform {
    /// Detect the platform this binary was built for.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedPlatform`] on any other operating system.
    pub fn current() -> Result<Self> {
        Self::from_os(std::env::consts::OS)
    }

    /// Map an operating system name (as reported by `std::env::consts::OS`
    /// or a `sys.platform`-style string) to a platform.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedPlatform`] for unrecognised names.
    pub fn from_os(os: &str) -> Result<Self> {
        let os = os.to_ascii_lowercase();
        if os.starts_with("win") {
            Ok(Self::Windows)
        } else if os.starts_with("linux") {
            Ok(Self::Linux)
        } else if os.starts_with("darwin") || os.starts_with("macos") {
            Ok(Self::MacOs)
        } else {
            Err(Error::UnsupportedPlatform(os))
        }
    }

    /// File extension of the artifact built for this platform.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Windows => "dll",
            Self::Linux => "so",
            Self::MacOs => "dylib",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Windows => "windows",
            Self::Linux => "linux",
            Self::MacOs => "macos",
        };
        f.write_str(name)
    }
}

/// Version identity of the host application.
///
/// Hosts report strings such as `4.1.5747-dev (Build 2024-06-01)`. Only the
/// first whitespace-separated token is meaningful; the part before its first
/// `-` is matched against release assets and a `-dev` marker anywhere in the
/// string puts the host on the dev channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostVersion {
    raw: String,
    display: String,
    core: String,
    dev_channel: bool,
}

impl HostVersion {
    /// Parse the version string reported by the host.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let display = raw.split_whitespace().next().unwrap_or_default().to_string();
        let core = display.split('-').next().unwrap_or_default().to_string();
        Self {
            raw: raw.to_string(),
            display,
            core,
            dev_channel: raw.contains("-dev"),
        }
    }

    /// Version used for exact asset matching (`4.1.5747`).
    #[must_use]
    pub fn core(&self) -> &str {
        &self.core
    }

    /// First version token including any pre-release suffix (`4.1.5747-dev`).
    #[must_use]
    pub fn display(&self) -> &str {
        &self.display
    }

    /// The unmodified string reported by the host.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Whether the host is a development build.
    #[must_use]
    pub fn is_dev_channel(&self) -> bool {
        self.dev_channel
    }
}

impl fmt::Display for HostVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}
