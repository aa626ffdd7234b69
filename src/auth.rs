use std::sync::{PoisonError, RwLock};

/// The authenticated user on whose behalf calls are made. Inserted rows are
/// stamped with `user_id` and reads are scoped to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: String,
}

impl Caller {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self { user_id: user_id.into() }
    }
}

pub trait AuthProvider: Send + Sync {
    fn current_caller(&self) -> Option<Caller>;
}

/// A signed-in (or signed-out) user session.
#[derive(Default)]
pub struct Session {
    caller: RwLock<Option<Caller>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signed_in(user_id: impl Into<String>) -> Self {
        Self {
            caller: RwLock::new(Some(Caller::new(user_id))),
        }
    }

    pub fn sign_in(&self, user_id: impl Into<String>) {
        let caller = Caller::new(user_id);
        log::info!("signed in as {}", caller.user_id);
        *self.caller.write().unwrap_or_else(PoisonError::into_inner) = Some(caller);
    }

    pub fn sign_out(&self) {
        *self.caller.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl AuthProvider for Session {
    fn current_caller(&self) -> Option<Caller> {
        self.caller
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_in_and_out() {
        let session = Session::new();
        assert_eq!(session.current_caller(), None);

        session.sign_in("u-1");
        assert_eq!(session.current_caller(), Some(Caller::new("u-1")));

        session.sign_out();
        assert_eq!(session.current_caller(), None);
    }
}
