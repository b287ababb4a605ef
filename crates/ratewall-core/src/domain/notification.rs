//! Broadcast notifications for list changes.
//!
//! Every mutation of a whitelist or blocklist can be announced to the other
//! instances sharing the limiter name. The wire format is `{op}-{id}` where
//! `op` is a two-letter code.

use std::fmt;

use super::ListKind;

/// A list mutation carried by a broadcast notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListOp {
    AddWhite,
    AddBlock,
    RemoveWhite,
    RemoveBlock,
}

impl ListOp {
    /// Two-letter wire code.
    pub fn code(self) -> &'static str {
        match self {
            ListOp::AddWhite => "aw",
            ListOp::AddBlock => "ab",
            ListOp::RemoveWhite => "rw",
            ListOp::RemoveBlock => "rb",
        }
    }

    /// Decode a wire code. Unknown codes yield `None`.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "aw" => Some(ListOp::AddWhite),
            "ab" => Some(ListOp::AddBlock),
            "rw" => Some(ListOp::RemoveWhite),
            "rb" => Some(ListOp::RemoveBlock),
            _ => None,
        }
    }

    pub fn add(kind: ListKind) -> Self {
        match kind {
            ListKind::White => ListOp::AddWhite,
            ListKind::Block => ListOp::AddBlock,
        }
    }

    pub fn remove(kind: ListKind) -> Self {
        match kind {
            ListKind::White => ListOp::RemoveWhite,
            ListKind::Block => ListOp::RemoveBlock,
        }
    }

    /// The list this operation targets.
    pub fn kind(self) -> ListKind {
        match self {
            ListOp::AddWhite | ListOp::RemoveWhite => ListKind::White,
            ListOp::AddBlock | ListOp::RemoveBlock => ListKind::Block,
        }
    }
}

/// A decoded `{op}-{id}` message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub op: ListOp,
    pub id: String,
}

impl Notification {
    pub fn new(op: ListOp, id: impl Into<String>) -> Self {
        Self { op, id: id.into() }
    }

    /// Parse a raw broadcast payload.
    ///
    /// The payload must split on `-` into exactly two segments, the first a
    /// known op code and the second a non-empty id. Anything else is `None`.
    /// An empty id (`aw-`) is deliberately dropped so a truncated message can
    /// never list or unlist the empty string on every instance.
    pub fn parse(message: &str) -> Option<Self> {
        let mut parts = message.split('-');
        let (code, id) = match (parts.next(), parts.next(), parts.next()) {
            (Some(code), Some(id), None) => (code, id),
            _ => return None,
        };
        if id.is_empty() {
            return None;
        }
        let op = ListOp::from_code(code)?;
        Some(Self::new(op, id))
    }

    /// Wire encoding, the inverse of [`Notification::parse`].
    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.op.code(), self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_ops() {
        assert_eq!(
            Notification::parse("aw-42"),
            Some(Notification::new(ListOp::AddWhite, "42"))
        );
        assert_eq!(
            Notification::parse("rb-10.0.0.1"),
            Some(Notification::new(ListOp::RemoveBlock, "10.0.0.1"))
        );
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(Notification::parse("bogus"), None);
        assert_eq!(Notification::parse("x-y-z"), None);
        assert_eq!(Notification::parse("aw-a-b"), None);
        assert_eq!(Notification::parse("zz-42"), None);
        assert_eq!(Notification::parse("aw-"), None);
        assert_eq!(Notification::parse(""), None);
    }

    #[test]
    fn test_encode_matches_wire_format() {
        assert_eq!(Notification::new(ListOp::AddBlock, "u1").encode(), "ab-u1");
        assert_eq!(Notification::new(ListOp::RemoveWhite, "u1").encode(), "rw-u1");
    }

    #[test]
    fn test_op_kind() {
        assert_eq!(ListOp::add(ListKind::Block), ListOp::AddBlock);
        assert_eq!(ListOp::remove(ListKind::White).kind(), ListKind::White);
    }
}
