//! Installs the namespace override as the ambient resolver for the length
//! of a test run and puts the original back afterwards.

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};
use crate::config::OverrideConfig;
use crate::context::AmbientContext;
use crate::errors::{Error, Result};
use crate::override_resolver::NamespaceOverrideResolver;
use crate::resolver::Resolver;

/// Callbacks a host test engine fires around a run.
pub trait RunListener {
    fn run_opened(&self) -> Result<()>;
    fn discovery_started(&self) -> Result<()>;
    fn discovery_finished(&self) -> Result<()>;
    fn execution_started(&self) -> Result<()>;
    fn execution_finished(&self) -> Result<()>;
    fn run_closed(&self) -> Result<()>;
}

#[derive(Default)]
struct RunState {
    /// Outer `None`: no snapshot taken yet. Inner `None`: the slot was empty.
    snapshot: Option<Option<Arc<dyn Resolver>>>,
    active: Option<Arc<NamespaceOverrideResolver>>,
    /// `active` was already installed by someone else; never close it.
    adopted: bool,
    created: usize,
}

pub struct LifecycleController {
    ambient: Arc<AmbientContext>,
    config: OverrideConfig,
    state: Mutex<RunState>,
}

impl LifecycleController {
    pub fn new(ambient: Arc<AmbientContext>, config: OverrideConfig) -> Self {
        Self { ambient, config, state: Mutex::new(RunState::default()) }
    }

    pub fn ambient(&self) -> &Arc<AmbientContext> { &self.ambient }

    pub fn active_override(&self) -> Option<Arc<NamespaceOverrideResolver>> {
        self.state.lock().active.clone()
    }

    pub fn snapshot_taken(&self) -> bool { self.state.lock().snapshot.is_some() }

    /// How many override instances this controller has built so far.
    pub fn overrides_created(&self) -> usize { self.state.lock().created }

    fn ensure_override(&self, state: &mut RunState) -> Result<()> {
        if state.active.is_some() {
            // keeps the delegate captured on first creation
            return Ok(());
        }
        let current = self.ambient.current();
        if let Some(existing) = current.clone().and_then(|r| r.as_override()) {
            debug!(resolver = %existing.describe(), "adopting installed override");
            state.active = Some(existing);
            state.adopted = true;
            return Ok(());
        }
        let created = NamespaceOverrideResolver::over_delegate(
            current,
            self.config.namespace_prefixes(),
            &self.config.fallback_roots,
        )?;
        state.created += 1;
        info!(resolver = %created.describe(), "created override resolver");
        state.active = Some(Arc::new(created));
        state.adopted = false;
        Ok(())
    }

    fn install(&self, state: &RunState) {
        let Some(active) = &state.active else { return };
        let active: Arc<dyn Resolver> = Arc::clone(active) as Arc<dyn Resolver>;
        if !self.ambient.is_current(&active) {
            self.ambient.replace(Some(active));
            info!("override installed as ambient resolver");
        }
    }

    /// Snapshot (once), ensure the override exists, install it. Idempotent.
    fn open(&self) -> Result<()> {
        let mut state = self.state.lock();
        if state.snapshot.is_none() {
            state.snapshot = Some(self.ambient.current());
        }
        self.ensure_override(&mut state)?;
        self.install(&state);
        Ok(())
    }

    /// Restores the snapshot if the override is still ambient, then releases
    /// the override unless it was adopted. A no-op when nothing is active.
    fn teardown(&self) -> Result<()> {
        let mut state = self.state.lock();
        let snapshot = state.snapshot.take();
        let Some(active) = state.active.take() else {
            debug!("teardown with no active override");
            return Ok(());
        };
        let as_dyn: Arc<dyn Resolver> = Arc::clone(&active) as Arc<dyn Resolver>;
        if self.ambient.is_current(&as_dyn) {
            self.ambient.replace(snapshot.flatten());
            info!("ambient resolver restored");
        }
        if std::mem::take(&mut state.adopted) {
            debug!("leaving adopted override open");
            return Ok(());
        }
        active.close().map_err(|source| {
            warn!(error = %source, "override resolver failed to close");
            Error::Teardown { source }
        })
    }
}

impl RunListener for LifecycleController {
    fn run_opened(&self) -> Result<()> { self.open() }

    fn discovery_started(&self) -> Result<()> { self.open() }

    // the override stays installed through execution
    fn discovery_finished(&self) -> Result<()> { Ok(()) }

    fn execution_started(&self) -> Result<()> { Ok(()) }

    fn execution_finished(&self) -> Result<()> { self.teardown() }

    fn run_closed(&self) -> Result<()> { self.teardown() }
}
