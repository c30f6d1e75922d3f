pub mod invoke;
pub mod serve;

use std::sync::Arc;

use anyhow::Context;
use famfin_app::{AppContext, AppFactory, AppRegistry, MemoryStore};
use famfin_core::{FamfinConfig, ProcessEnv, Settings, SettingsResolver};
use famfin_trigger::Bridge;
use tracing::info;

/// Resolve settings, construct the application once and wrap it in a
/// bridge.
///
/// Must run before any thread is spawned: resolved values are exported
/// into the process environment.
pub fn bootstrap(config: &FamfinConfig) -> anyhow::Result<Bridge> {
    let resolver = SettingsResolver::new(config.bridge.platform_prefix.as_str());
    let resolved = resolver.resolve(&ProcessEnv);

    // SAFETY: called from the synchronous `main` before any runtime or
    // other thread has been created.
    unsafe { resolved.export() };

    let settings = Settings::from_resolved(&resolved).context("failed to build settings")?;
    info!(
        prefix = %config.bridge.platform_prefix,
        entry = %config.bridge.entry,
        store_configured = !settings.store_url.is_empty(),
        "settings resolved"
    );

    let ctx = AppContext {
        settings: Arc::new(settings),
        store: Arc::new(MemoryStore::new()),
    };
    let loaded = AppFactory::new(AppRegistry::with_defaults(), config.bridge.entry.as_str())
        .build(&ctx);
    Ok(Bridge::new(loaded))
}
