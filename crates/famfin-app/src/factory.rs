//! Application factory.
//!
//! Constructs the application registered under the configured entry name,
//! once per process. Construction failures (invalid settings, a panicking
//! constructor) degrade to the stand-in application carrying the failure
//! message. An entry name with no registration yields
//! [`LoadedApp::Missing`], which the bridge reports on every invocation.

use std::collections::BTreeMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use famfin_async::Application;
use famfin_core::Settings;
use tracing::{error, info, warn};

use crate::standin::standin_router;
use crate::store::ExpenseStore;
use crate::{ApiState, RouterApp, api_router};

/// Collaborators available to application constructors.
#[derive(Clone)]
pub struct AppContext {
    pub settings: Arc<Settings>,
    pub store: Arc<dyn ExpenseStore>,
}

pub type AppConstructor = fn(&AppContext) -> anyhow::Result<Arc<dyn Application>>;

/// Named application constructors.
#[derive(Clone, Default)]
pub struct AppRegistry {
    entries: BTreeMap<String, AppConstructor>,
}

impl AppRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the Family Financial API under `famfin`.
    pub fn with_defaults() -> Self {
        Self::new().register(famfin_core::config::DEFAULT_ENTRY, build_famfin)
    }

    pub fn register(mut self, name: impl Into<String>, constructor: AppConstructor) -> Self {
        self.entries.insert(name.into(), constructor);
        self
    }

    pub fn get(&self, name: &str) -> Option<AppConstructor> {
        self.entries.get(name).copied()
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

/// Outcome of the one-time application construction.
#[derive(Clone)]
pub enum LoadedApp {
    Ready {
        entry: String,
        app: Arc<dyn Application>,
    },
    /// The stand-in is serving; `reason` is the construction failure.
    Degraded {
        entry: String,
        app: Arc<dyn Application>,
        reason: String,
    },
    /// No application is registered under `entry`.
    Missing {
        entry: String,
        available: Vec<String>,
    },
}

impl LoadedApp {
    pub fn entry(&self) -> &str {
        match self {
            LoadedApp::Ready { entry, .. }
            | LoadedApp::Degraded { entry, .. }
            | LoadedApp::Missing { entry, .. } => entry,
        }
    }

    pub fn application(&self) -> Option<&Arc<dyn Application>> {
        match self {
            LoadedApp::Ready { app, .. } | LoadedApp::Degraded { app, .. } => Some(app),
            LoadedApp::Missing { .. } => None,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, LoadedApp::Degraded { .. })
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            LoadedApp::Degraded { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

impl std::fmt::Debug for LoadedApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadedApp::Ready { entry, .. } => f.debug_struct("Ready").field("entry", entry).finish(),
            LoadedApp::Degraded { entry, reason, .. } => f
                .debug_struct("Degraded")
                .field("entry", entry)
                .field("reason", reason)
                .finish(),
            LoadedApp::Missing { entry, available } => f
                .debug_struct("Missing")
                .field("entry", entry)
                .field("available", available)
                .finish(),
        }
    }
}

pub struct AppFactory {
    registry: AppRegistry,
    entry: String,
}

impl AppFactory {
    pub fn new(registry: AppRegistry, entry: impl Into<String>) -> Self {
        Self {
            registry,
            entry: entry.into(),
        }
    }

    /// Construct the application. Never fails; see [`LoadedApp`].
    pub fn build(&self, ctx: &AppContext) -> LoadedApp {
        let entry = self.entry.clone();
        let Some(constructor) = self.registry.get(&entry) else {
            let available = self.registry.names();
            error!(%entry, ?available, "no application registered under entry");
            return LoadedApp::Missing { entry, available };
        };

        let reason = match catch_unwind(AssertUnwindSafe(|| constructor(ctx))) {
            Ok(Ok(app)) => {
                info!(%entry, "application constructed");
                return LoadedApp::Ready { entry, app };
            }
            Ok(Err(e)) => format!("{e:#}"),
            Err(_) => "application constructor panicked".to_string(),
        };

        warn!(%entry, %reason, "application failed to initialize; serving stand-in");
        LoadedApp::Degraded {
            entry,
            app: Arc::new(RouterApp::new(standin_router(reason.clone()))),
            reason,
        }
    }
}

/// Constructor of the Family Financial API.
pub fn build_famfin(ctx: &AppContext) -> anyhow::Result<Arc<dyn Application>> {
    ctx.settings.validate()?;
    let state = ApiState {
        settings: Arc::clone(&ctx.settings),
        store: Arc::clone(&ctx.store),
    };
    Ok(Arc::new(RouterApp::new(api_router(state))))
}
