use stockward_core::UserId;

/// Identity attached to each request by the identity middleware.
///
/// Authentication itself happens upstream (gateway/session layer); this
/// engine only attributes movements and status changes to a user id.
#[derive(Debug, Copy, Clone)]
pub struct RequestIdentity {
    user_id: UserId,
}

impl RequestIdentity {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }
}
