use crate::domain::{User, UserId};

/// The identity a request acts as.
///
/// Built once at request entry by [`super::LedgerService::open_session`] and
/// passed explicitly to every user-scoped operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    user_id: UserId,
    email: String,
}

impl Session {
    pub(crate) fn for_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}
