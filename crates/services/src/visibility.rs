//! # Comment Visibility Filter
//!
//! Every read path that returns comments goes through [`filter`]. A
//! Customer must never receive an internal comment.

use domains::{Comment, Role};

pub fn is_visible_to(comment: &Comment, role: Role) -> bool {
    role.is_staff() || !comment.is_internal
}

/// Identity for staff; for customers, the external subsequence in
/// original order.
pub fn filter(comments: Vec<Comment>, role: Role) -> Vec<Comment> {
    if role.is_staff() {
        return comments;
    }
    comments
        .into_iter()
        .filter(|c| is_visible_to(c, role))
        .collect()
}
