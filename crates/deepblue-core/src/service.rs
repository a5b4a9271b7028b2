//! Shared viewer services
//!
//! The toolbar and the loader host never reference each other. The loader
//! host registers a dialog hook when it mounts; the toolbar asks the service
//! to open the dialog and finds out whether anyone is listening. Selections
//! travel back through the same service as queued [`ModelSource`]s.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use crate::strategy::ModelSource;

/// Opens the platform file dialog
pub type DialogHook = Box<dyn Fn() -> Result<(), String> + Send + Sync>;

/// Token returned by [`ViewerServices::register_dialog`]
///
/// Clearing with a stale token is ignored, so a late teardown of an old
/// loader host cannot remove the hook of its replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialogRegistration(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogOutcome {
    Opened,
    /// No loader host has registered a dialog
    Unavailable,
    Failed(String),
}

#[derive(Default)]
struct Inner {
    dialog: Option<(DialogRegistration, Arc<DialogHook>)>,
    generation: u64,
    requests: VecDeque<ModelSource>,
}

/// Cheap to clone; all clones share one hook slot and request queue
#[derive(Clone, Default)]
pub struct ViewerServices {
    inner: Arc<Mutex<Inner>>,
}

impl ViewerServices {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the dialog hook, replacing any previous one
    pub fn register_dialog(&self, hook: DialogHook) -> DialogRegistration {
        let Ok(mut inner) = self.inner.lock() else {
            warn!("Viewer services poisoned, dialog hook not registered");
            return DialogRegistration(0);
        };
        inner.generation += 1;
        let registration = DialogRegistration(inner.generation);
        inner.dialog = Some((registration, Arc::new(hook)));
        info!("File dialog registered");
        registration
    }

    /// Remove the hook installed with `registration`; returns whether it was removed
    pub fn clear_dialog(&self, registration: DialogRegistration) -> bool {
        let Ok(mut inner) = self.inner.lock() else {
            return false;
        };
        match &inner.dialog {
            Some((current, _)) if *current == registration => {
                inner.dialog = None;
                true
            }
            _ => false,
        }
    }

    pub fn has_dialog(&self) -> bool {
        self.inner
            .lock()
            .map(|inner| inner.dialog.is_some())
            .unwrap_or(false)
    }

    /// Ask the registered loader host to open its file dialog
    pub fn open_file_dialog(&self) -> DialogOutcome {
        // The hook may re-enter the service, so it runs without the lock held
        let hook = self
            .inner
            .lock()
            .ok()
            .and_then(|inner| inner.dialog.as_ref().map(|(_, hook)| Arc::clone(hook)));

        let Some(hook) = hook else {
            warn!("File dialog not available");
            return DialogOutcome::Unavailable;
        };

        match hook() {
            Ok(()) => DialogOutcome::Opened,
            Err(e) => {
                warn!(error = %e, "File dialog failed to open");
                DialogOutcome::Failed(e)
            }
        }
    }

    /// Hand a selection to the loader host
    pub fn submit(&self, source: ModelSource) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.requests.push_back(source);
        }
    }

    /// Take every queued selection, oldest first
    pub fn drain_requests(&self) -> Vec<ModelSource> {
        self.inner
            .lock()
            .map(|mut inner| inner.requests.drain(..).collect())
            .unwrap_or_default()
    }
}
