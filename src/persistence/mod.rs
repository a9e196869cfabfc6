//! Layout persistence with remote-primary / local-fallback degradation
//!
//! - **remote**: HTTP layout store, capability source and credential providers
//! - **local**: the single-key fallback store
//! - **queue**: background worker that serializes saves
//!
//! Precedence on load: remote, then fallback store, then nothing (the resolver
//! uses defaults). Every save attempt also lands in the fallback store so it is
//! always consistent with the last attempted save.

pub mod local;
pub mod queue;
pub mod remote;

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::types::SavedLayout;

pub use local::{FallbackStore, FileStore, MemoryStore};
pub use queue::{SaveQueue, SaveReport};
pub use remote::{
    CredentialProvider, EnvCredential, HttpCapabilitySource, HttpLayoutStore, RemoteLayoutStore, StaticCredential,
};

/// Anything an editing session can hand a finished layout to
///
/// Implementations never fail loudly: outcomes are logged or reported out of band.
pub trait LayoutWriter {
    fn submit(&self, layout: &SavedLayout);
}

impl<W: LayoutWriter + ?Sized> LayoutWriter for Arc<W> {
    fn submit(&self, layout: &SavedLayout) {
        self.as_ref().submit(layout);
    }
}

/// Best-effort remote save/load backed by a local fallback store
pub struct PersistenceGateway {
    remote: Option<Box<dyn RemoteLayoutStore>>,
    credentials: Box<dyn CredentialProvider>,
    local: Box<dyn FallbackStore>,
}

impl PersistenceGateway {
    pub fn new(
        remote: Option<Box<dyn RemoteLayoutStore>>,
        credentials: Box<dyn CredentialProvider>,
        local: Box<dyn FallbackStore>,
    ) -> Self {
        Self {
            remote,
            credentials,
            local,
        }
    }

    /// Gateway with no remote store; every save and load goes to `local`
    pub fn local_only(local: Box<dyn FallbackStore>) -> Self {
        Self::new(None, Box::new(StaticCredential::none()), local)
    }

    /// Save remotely when possible and always write the fallback store
    ///
    /// `Ok` only when the remote write succeeded.
    pub fn save(&self, layout: &SavedLayout) -> Result<(), StoreError> {
        let remote_result = self.save_remote(layout);
        match &remote_result {
            Ok(()) => info!(entries = layout.len(), "Saved layout to remote store"),
            Err(e) => warn!(error = %e, "Remote layout save failed, keeping local copy"),
        }

        if let Err(e) = self.save_local(layout) {
            warn!(error = %e, "Failed to write fallback layout store");
        }

        remote_result
    }

    /// Remote first, then the fallback store; `None` when neither has a layout
    pub fn load(&self) -> Option<SavedLayout> {
        match self.load_remote() {
            Ok(Some(layout)) => {
                info!(entries = layout.len(), "Loaded layout from remote store");
                return Some(layout);
            }
            Ok(None) => debug!("Remote store has no saved layout"),
            Err(e) => warn!(error = %e, "Remote layout load failed, trying fallback store"),
        }

        match self.load_local() {
            Ok(Some(layout)) => {
                info!(entries = layout.len(), "Loaded layout from fallback store");
                Some(layout)
            }
            Ok(None) => {
                debug!("No saved layout anywhere, using defaults");
                None
            }
            Err(e) => {
                warn!(error = %e, "Fallback layout unreadable, using defaults");
                None
            }
        }
    }

    fn save_remote(&self, layout: &SavedLayout) -> Result<(), StoreError> {
        let remote = self.remote.as_ref().ok_or(StoreError::NotConfigured)?;
        let token = self.credentials.bearer_token().ok_or(StoreError::MissingCredential)?;
        remote.store(&token, layout)
    }

    fn load_remote(&self) -> Result<Option<SavedLayout>, StoreError> {
        let remote = self.remote.as_ref().ok_or(StoreError::NotConfigured)?;
        let token = self.credentials.bearer_token().ok_or(StoreError::MissingCredential)?;
        remote.fetch(&token)
    }

    fn save_local(&self, layout: &SavedLayout) -> Result<(), StoreError> {
        let contents = serde_json::to_string(layout)?;
        self.local.write(&contents)
    }

    fn load_local(&self) -> Result<Option<SavedLayout>, StoreError> {
        match self.local.read()? {
            Some(contents) => Ok(Some(serde_json::from_str(&contents)?)),
            None => Ok(None),
        }
    }
}

impl LayoutWriter for PersistenceGateway {
    fn submit(&self, layout: &SavedLayout) {
        // Outcome already logged by save()
        let _ = self.save(layout);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Remote store driven by a script, recording every write
    #[derive(Default)]
    pub struct ScriptedRemote {
        pub stored: Mutex<Vec<SavedLayout>>,
        pub fetch_result: Mutex<Option<Result<Option<SavedLayout>, u16>>>,
        pub fail_store: Mutex<Option<u16>>,
    }

    impl ScriptedRemote {
        pub fn serving(layout: Option<SavedLayout>) -> Arc<Self> {
            let remote = Self::default();
            *remote.fetch_result.lock().unwrap() = Some(Ok(layout));
            Arc::new(remote)
        }

        pub fn failing(status: u16) -> Arc<Self> {
            let remote = Self::default();
            *remote.fetch_result.lock().unwrap() = Some(Err(status));
            *remote.fail_store.lock().unwrap() = Some(status);
            Arc::new(remote)
        }

        pub fn last_stored(&self) -> Option<SavedLayout> {
            self.stored.lock().unwrap().last().cloned()
        }
    }

    impl RemoteLayoutStore for Arc<ScriptedRemote> {
        fn fetch(&self, _token: &str) -> Result<Option<SavedLayout>, StoreError> {
            match self.fetch_result.lock().unwrap().clone() {
                Some(Ok(layout)) => Ok(layout),
                Some(Err(status)) => Err(StoreError::Status { status }),
                None => Ok(None),
            }
        }

        fn store(&self, _token: &str, layout: &SavedLayout) -> Result<(), StoreError> {
            if let Some(status) = *self.fail_store.lock().unwrap() {
                return Err(StoreError::Status { status });
            }
            self.stored.lock().unwrap().push(layout.clone());
            Ok(())
        }
    }

    impl FallbackStore for Arc<MemoryStore> {
        fn read(&self) -> Result<Option<String>, StoreError> {
            self.as_ref().read()
        }

        fn write(&self, contents: &str) -> Result<(), StoreError> {
            self.as_ref().write(contents)
        }
    }

    pub fn gateway(remote: &Arc<ScriptedRemote>, token: Option<&str>, local: &Arc<MemoryStore>) -> PersistenceGateway {
        PersistenceGateway::new(
            Some(Box::new(Arc::clone(remote))),
            Box::new(StaticCredential(token.map(str::to_string))),
            Box::new(Arc::clone(local)),
        )
    }
}
