//! Conflict scale: the geographic scope of a conflict.

use serde::{Deserialize, Serialize};

/// Scope of a conflict. Only ever advances `Local -> Regional -> Global`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictScale {
    Local,
    Regional,
    Global,
}

impl ConflictScale {
    /// All scales in escalation order.
    pub const ALL: [ConflictScale; 3] = [Self::Local, Self::Regional, Self::Global];

    /// The next scale, or `None` at `Global`.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Local => Some(Self::Regional),
            Self::Regional => Some(Self::Global),
            Self::Global => None,
        }
    }

    /// Position in escalation order (0, 1, 2).
    #[must_use]
    pub fn tier(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Regional => "regional",
            Self::Global => "global",
        }
    }
}

impl std::fmt::Display for ConflictScale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_walks_forward_only() {
        assert_eq!(ConflictScale::Local.next(), Some(ConflictScale::Regional));
        assert_eq!(ConflictScale::Regional.next(), Some(ConflictScale::Global));
        assert_eq!(ConflictScale::Global.next(), None);
    }

    #[test]
    fn test_ordering_matches_tier() {
        for pair in ConflictScale::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
            assert_eq!(pair[0].tier() + 1, pair[1].tier());
        }
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&ConflictScale::Regional).unwrap(), "\"regional\"");
    }
}
