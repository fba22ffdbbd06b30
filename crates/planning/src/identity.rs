use std::sync::Arc;

use tokio::sync::watch;

/// Signed-in user shared by every engine. `None` means signed out, in which
/// case engines resolve nothing and mutations are no-ops.
#[derive(Clone)]
pub struct Identity(Arc<watch::Sender<Option<String>>>);

impl Default for Identity {
    fn default() -> Self {
        Self(Arc::new(watch::channel(None).0))
    }
}

impl Identity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signed_in(uid: impl Into<String>) -> Self {
        let identity = Self::default();
        identity.sign_in(uid);
        identity
    }

    pub fn sign_in(&self, uid: impl Into<String>) {
        let uid = Some(uid.into());
        self.0.send_if_modified(|current| {
            if *current == uid {
                return false;
            }

            *current = uid;
            true
        });
    }

    pub fn sign_out(&self) {
        self.0.send_if_modified(|current| current.take().is_some());
    }

    pub fn current_user_id(&self) -> Option<String> {
        self.0.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.0.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_in_and_out_notify_once() {
        let identity = Identity::new();
        let mut rx = identity.subscribe();
        assert_eq!(identity.current_user_id(), None);

        identity.sign_in("john");
        assert!(rx.has_changed().unwrap());
        rx.mark_unchanged();

        identity.sign_in("john");
        assert!(!rx.has_changed().unwrap());

        identity.sign_out();
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), None);

        identity.sign_out();
        assert!(!rx.has_changed().unwrap());
    }
}
