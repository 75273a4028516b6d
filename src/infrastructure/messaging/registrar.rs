use crate::application::ports::sync_registrar::SyncRegistrar;
use crate::domain::value_objects::SyncTag;
use crate::shared::error::AppError;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// In-process stand-in for the platform's deferred-sync registration. Hosts
/// without deferred sync flip `supported` off, which makes every
/// registration fail so callers exercise their foreground fallback.
pub struct InProcessSyncRegistrar {
    supported: AtomicBool,
    registered: Mutex<Vec<SyncTag>>,
}

impl InProcessSyncRegistrar {
    pub fn new(supported: bool) -> Self {
        Self {
            supported: AtomicBool::new(supported),
            registered: Mutex::new(Vec::new()),
        }
    }

    pub fn set_supported(&self, supported: bool) {
        self.supported.store(supported, Ordering::SeqCst);
    }

    /// Drains the tags registered since the last call.
    pub fn take_registered(&self) -> Vec<SyncTag> {
        let mut registered = self
            .registered
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        std::mem::take(&mut *registered)
    }
}

impl Default for InProcessSyncRegistrar {
    fn default() -> Self {
        Self::new(true)
    }
}

#[async_trait]
impl SyncRegistrar for InProcessSyncRegistrar {
    async fn register(&self, tag: SyncTag) -> Result<(), AppError> {
        if !self.supported.load(Ordering::SeqCst) {
            return Err(AppError::Internal(
                "deferred sync registration is not available on this host".to_string(),
            ));
        }

        let mut registered = self
            .registered
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !registered.contains(&tag) {
            registered.push(tag);
        }
        Ok(())
    }
}
