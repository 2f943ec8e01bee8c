//! `resourceOperations` as a genuine set-of-flags type (per the spec's
//! "enum bitmasks" design note), rather than the single-valued enum LSP
//! proper's `lsp_types::ResourceOperationKind` models it as. Wire shape is
//! unchanged: an array of tag strings.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ResourceOperationKind: u8 {
        const CREATE = 0b0001;
        const RENAME = 0b0010;
        const DELETE = 0b0100;
    }
}

impl ResourceOperationKind {
    fn tags(self) -> Vec<&'static str> {
        let mut tags = Vec::new();
        if self.contains(ResourceOperationKind::CREATE) {
            tags.push("create");
        }
        if self.contains(ResourceOperationKind::RENAME) {
            tags.push("rename");
        }
        if self.contains(ResourceOperationKind::DELETE) {
            tags.push("delete");
        }
        tags
    }

    fn from_tags(tags: &[String]) -> Self {
        let mut flags = ResourceOperationKind::empty();
        for tag in tags {
            match tag.as_str() {
                "create" => flags |= ResourceOperationKind::CREATE,
                "rename" => flags |= ResourceOperationKind::RENAME,
                "delete" => flags |= ResourceOperationKind::DELETE,
                _ => {}
            }
        }
        flags
    }
}

impl Serialize for ResourceOperationKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.tags().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ResourceOperationKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tags = Vec::<String>::deserialize(deserializer)?;
        Ok(ResourceOperationKind::from_tags(&tags))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_tag_array() {
        let flags = ResourceOperationKind::CREATE | ResourceOperationKind::DELETE;
        let json = serde_json::to_string(&flags).unwrap();
        assert_eq!(json, "[\"create\",\"delete\"]");
        let back: ResourceOperationKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, flags);
    }

    #[test]
    fn unknown_tags_are_ignored() {
        let flags: ResourceOperationKind = serde_json::from_str("[\"create\",\"bogus\"]").unwrap();
        assert_eq!(flags, ResourceOperationKind::CREATE);
    }
}
