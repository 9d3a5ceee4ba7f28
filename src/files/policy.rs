//! Access policy for file nodes
//!
//! Read access: public nodes are readable by anyone; private nodes only by
//! their owner. Every other combination is reported as absence, so the
//! existence of private files is never disclosed to non-owners.

use bson::oid::ObjectId;

use crate::db::schemas::FileDoc;

/// Whether a caller (authenticated or anonymous) may read a node's
/// metadata or content
pub fn can_read(node: &FileDoc, caller: Option<&ObjectId>) -> bool {
    node.is_public || caller.is_some_and(|c| *c == node.user_id)
}

/// Whether a caller may toggle a node's visibility
pub fn can_modify(node: &FileDoc, caller: &ObjectId) -> bool {
    *caller == node.user_id
}
