//! Access policy adapters

use rca_core::AccessPolicy;
use std::sync::atomic::{AtomicBool, Ordering};

/// Access policy whose answer can be flipped at runtime
#[derive(Debug, Default)]
pub struct SwitchableAccessPolicy {
    admin: AtomicBool,
}

impl SwitchableAccessPolicy {
    /// Create policy, acting as an administrator when `admin` is set
    #[inline]
    #[must_use]
    pub fn new(admin: bool) -> Self {
        Self {
            admin: AtomicBool::new(admin),
        }
    }

    /// Switch the acting principal
    pub fn set_admin(&self, admin: bool) {
        self.admin.store(admin, Ordering::SeqCst);
    }
}

impl AccessPolicy for SwitchableAccessPolicy {
    fn is_current_user_admin(&self) -> bool {
        self.admin.load(Ordering::SeqCst)
    }
}
