use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the two override lists a limiter keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListKind {
    #[serde(rename = "whitelist")]
    White,
    #[serde(rename = "blocklist")]
    Block,
}

impl ListKind {
    /// Storage key of the durable set backing this list for limiter `name`.
    pub fn set_key(self, name: &str) -> String {
        match self {
            ListKind::White => format!("{name}-white"),
            ListKind::Block => format!("{name}-block"),
        }
    }
}

impl fmt::Display for ListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListKind::White => f.write_str("whiteList"),
            ListKind::Block => f.write_str("blockList"),
        }
    }
}
