//! Domain primitive types used across the nsjoin workspace.

use std::fmt;

/// Identifier of the process whose namespaces are joined.
///
/// Kept as validated text: it is only ever used to build
/// `/proc/<pid>/ns/<kind>` paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetPid(String);

impl TargetPid {
    /// Parses a decimal process identifier.
    ///
    /// Returns `None` if the token is empty or is not made of ASCII digits
    /// only.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some(Self(raw.to_owned()))
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u32> for TargetPid {
    fn from(pid: u32) -> Self {
        Self(pid.to_string())
    }
}

impl fmt::Display for TargetPid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A synchronization pipe descriptor number received through the environment.
///
/// Malformed or missing values collapse to [`PipeDescriptor::INVALID`];
/// stages that need the descriptor treat that as fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipeDescriptor(i32);

impl PipeDescriptor {
    /// Sentinel for "no descriptor".
    pub const INVALID: Self = Self(-1);

    /// Parses an environment value as a non-negative descriptor number.
    ///
    /// The whole value must be consumed by the integer: `"7"` is descriptor 7,
    /// while `"7x"`, `""` and `"-3"` are [`PipeDescriptor::INVALID`].
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        raw.filter(|s| !s.is_empty())
            .and_then(|s| s.parse::<i32>().ok())
            .filter(|fd| *fd >= 0)
            .map_or(Self::INVALID, Self)
    }

    /// Wraps a raw descriptor number. Negative values become invalid.
    #[must_use]
    pub const fn from_raw(fd: i32) -> Self {
        if fd < 0 { Self::INVALID } else { Self(fd) }
    }

    /// Returns the raw descriptor number (`-1` when invalid).
    #[must_use]
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Returns `true` unless this is the invalid sentinel.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 >= 0
    }
}

impl fmt::Display for PipeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a container, as recorded by the runtime that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerStatus {
    /// Container has been created but not yet started.
    Created,
    /// Container is actively running.
    Running,
    /// Container has exited.
    Exited,
}

impl fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Running => write!(f, "running"),
            Self::Exited => write!(f, "exited"),
        }
    }
}
