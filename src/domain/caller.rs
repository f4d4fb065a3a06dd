//! Authenticated identity behind a request.

use super::UserId;

/// The user on whose behalf a request runs, as resolved by the host's
/// identity directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    /// Host user key.
    pub user_id: UserId,
    /// Login name, for log lines only.
    pub login: String,
    /// Whether the user belongs to the POS operator group.
    pub is_pos_operator: bool,
}

impl Caller {
    /// Returns `true` if the caller may record and browse offline logs.
    #[must_use]
    pub const fn can_operate_pos(&self) -> bool {
        self.is_pos_operator
    }
}
