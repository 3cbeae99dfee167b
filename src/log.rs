/*!

Console logging for the simulation, backed by `log4rs`.

Logging is disabled until [`enable_logging`] is called. Modules in this crate log through the
`log` facade macros re-exported here (`use crate::log::{debug, info, trace};`), so an
application that installs its own logger instead of calling `enable_logging` still sees them.

```no_run
use hepce_core::log::{enable_logging, set_log_level, LevelFilter};

enable_logging().unwrap();
set_log_level(LevelFilter::Debug).unwrap();
```

*/

pub use ::log::{LevelFilter, debug, error, info, trace, warn};

use crate::error::HepceError;
use crate::hashing::{HashMap, HashMapExt};
use log4rs::{
    Handle,
    append::console::ConsoleAppender,
    config::{Appender, Config, Logger, Root},
    encode::pattern::PatternEncoder,
};
use std::sync::{LazyLock, Mutex, MutexGuard, PoisonError};

const CONSOLE_APPENDER: &str = "console";
const DEFAULT_PATTERN: &str = "{d(%H:%M:%S%.3f)} {h({l:<5})} {t} - {m}{n}";

struct LogConfiguration {
    global_level: LevelFilter,
    module_levels: HashMap<String, LevelFilter>,
    handle: Option<Handle>,
}

impl LogConfiguration {
    fn build_config(&self) -> Result<Config, HepceError> {
        let console = ConsoleAppender::builder()
            .encoder(Box::new(PatternEncoder::new(DEFAULT_PATTERN)))
            .build();

        let mut builder = Config::builder()
            .appender(Appender::builder().build(CONSOLE_APPENDER, Box::new(console)));

        // Sorted so the resulting config does not depend on map order.
        let mut modules: Vec<_> = self.module_levels.iter().collect();
        modules.sort();
        for (module, level) in modules {
            builder = builder.logger(Logger::builder().build(module.clone(), *level));
        }

        builder
            .build(
                Root::builder()
                    .appender(CONSOLE_APPENDER)
                    .build(self.global_level),
            )
            .map_err(|e| HepceError::Logging(e.to_string()))
    }

    /// Pushes the current settings to log4rs, installing the logger on first use.
    fn apply(&mut self) -> Result<(), HepceError> {
        let config = self.build_config()?;
        match &self.handle {
            Some(handle) => handle.set_config(config),
            None => {
                let handle = log4rs::init_config(config)
                    .map_err(|e| HepceError::Logging(e.to_string()))?;
                self.handle = Some(handle);
            }
        }
        Ok(())
    }
}

static LOG_CONFIGURATION: LazyLock<Mutex<LogConfiguration>> = LazyLock::new(|| {
    Mutex::new(LogConfiguration {
        global_level: LevelFilter::Off,
        module_levels: HashMap::new(),
        handle: None,
    })
});

fn configuration() -> MutexGuard<'static, LogConfiguration> {
    LOG_CONFIGURATION
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

/// Turns on logging at the `Info` level for everything.
pub fn enable_logging() -> Result<(), HepceError> {
    set_log_level(LevelFilter::Info)
}

pub fn disable_logging() -> Result<(), HepceError> {
    set_log_level(LevelFilter::Off)
}

/// Sets the level applied to every module without its own filter.
pub fn set_log_level(level: LevelFilter) -> Result<(), HepceError> {
    let mut config = configuration();
    config.global_level = level;
    config.apply()
}

/// Overrides the level for a single module path, e.g. `"hepce_core::events"`.
pub fn set_module_filter(module: &str, level: LevelFilter) -> Result<(), HepceError> {
    let mut config = configuration();
    config.module_levels.insert(module.to_string(), level);
    config.apply()
}

pub fn remove_module_filter(module: &str) -> Result<(), HepceError> {
    let mut config = configuration();
    config.module_levels.remove(module);
    config.apply()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_filters_are_recorded() {
        set_module_filter("hepce_core::events", LevelFilter::Trace).unwrap();
        {
            let config = configuration();
            assert_eq!(
                config.module_levels.get("hepce_core::events"),
                Some(&LevelFilter::Trace)
            );
            assert!(config.handle.is_some());
        }
        remove_module_filter("hepce_core::events").unwrap();
        assert!(configuration().module_levels.get("hepce_core::events").is_none());
        disable_logging().unwrap();
        assert_eq!(configuration().global_level, LevelFilter::Off);
    }
}
