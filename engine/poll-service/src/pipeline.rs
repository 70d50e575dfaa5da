//! Fetch, reshape and publish paths run by the poll driver

use serde::{Deserialize, Serialize};
use std::fmt;

/// One fetch -> reshape -> publish path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pipeline {
    /// `{topic}/{account}` account summaries
    Accounts,
    /// `{topic}/{account}/positions` position lists
    Positions,
    /// `{topic}/watchlists/{watchlist}` watchlist summaries
    Watchlists,
    /// `{topic}/raw` unshaped provider payloads
    Raw,
}

impl Pipeline {
    /// Pipelines run when none are configured
    pub fn default_set() -> Vec<Pipeline> {
        vec![Pipeline::Accounts, Pipeline::Positions, Pipeline::Watchlists]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Pipeline::Accounts => "accounts",
            Pipeline::Positions => "positions",
            Pipeline::Watchlists => "watchlists",
            Pipeline::Raw => "raw",
        }
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_lowercase() {
        let pipelines: Vec<Pipeline> =
            serde_json::from_str(r#"["accounts", "raw", "watchlists"]"#).unwrap();
        assert_eq!(pipelines, vec![Pipeline::Accounts, Pipeline::Raw, Pipeline::Watchlists]);

        assert!(serde_json::from_str::<Pipeline>(r#""orders""#).is_err());
    }

    #[test]
    fn test_default_set_excludes_raw() {
        assert!(!Pipeline::default_set().contains(&Pipeline::Raw));
        assert_eq!(Pipeline::Positions.to_string(), "positions");
    }
}
