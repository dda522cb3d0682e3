//! Wait budget for polling loops

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Raised for negative budgets other than the `-1` sentinel
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid max wait {0}: use -1 for unlimited or a non-negative number of seconds")]
pub struct InvalidMaxWait(pub i64);

/// Upper bound on how long a poller keeps waiting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxWait {
    Unlimited,
    Limited(Duration),
}

impl MaxWait {
    /// Converts the command-line convention where `-1` means no limit
    pub fn from_secs(secs: i64) -> Result<Self, InvalidMaxWait> {
        match secs {
            -1 => Ok(MaxWait::Unlimited),
            s if s < 0 => Err(InvalidMaxWait(s)),
            s => Ok(MaxWait::Limited(Duration::from_secs(s as u64))),
        }
    }

    /// Whether a loop that has slept for `waited` may sleep again
    pub fn allows(&self, waited: Duration) -> bool {
        match self {
            MaxWait::Unlimited => true,
            MaxWait::Limited(max) => waited < *max,
        }
    }

    pub fn is_unlimited(&self) -> bool {
        matches!(self, MaxWait::Unlimited)
    }
}

impl fmt::Display for MaxWait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaxWait::Unlimited => f.write_str("unlimited"),
            MaxWait::Limited(d) => write!(f, "{:?}", d),
        }
    }
}
