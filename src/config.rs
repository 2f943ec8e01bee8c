//! `GlobalConfiguration` (§3, §4.6): the flags applied from
//! `workspace/didChangeConfiguration`. Mounts are applied idempotently on
//! the first configuration notification only; the secondary-compilation
//! flag is re-read on every notification, ported from `original_source`'s
//! `m_read_config`/`sqcSupport` split.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::Deserialize;

use crate::workspace::Mount;

/// Raw shape of the settings object the client sends under
/// `workspace/didChangeConfiguration`'s `settings` field. Unknown keys are
/// ignored rather than rejected — editor clients routinely send unrelated
/// settings sections alongside this server's own.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfiguration {
    #[serde(default)]
    pub secondary_compilation_enabled: bool,
    #[serde(default)]
    pub additional_mounts: Vec<RawMount>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawMount {
    pub physical: String,
    pub virtual_path: String,
}

/// Server-held configuration state, guarded by the first-apply-only guard
/// on `mounts`.
#[derive(Default)]
pub struct GlobalConfiguration {
    mounts_applied: AtomicBool,
    secondary_enabled: std::sync::atomic::AtomicBool,
}

impl GlobalConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn secondary_compilation_enabled(&self) -> bool {
        self.secondary_enabled.load(Ordering::Relaxed)
    }

    /// Applies one `workspace/didChangeConfiguration` notification.
    /// `additional_mounts` is only read and returned on the first call
    /// (`None` afterward, signaling the caller to skip mounting); the
    /// secondary-compilation flag is re-read (and returned) every time.
    pub fn apply(&self, raw: &RawConfiguration) -> Option<Vec<Mount>> {
        self.secondary_enabled.store(raw.secondary_compilation_enabled, Ordering::Relaxed);

        // Gate reading the mount list behind the guard itself, set *before*
        // the read, matching `original_source`'s `m_read_config` ordering:
        // a second call that races the first observes the guard already
        // set and never touches `additional_mounts` at all.
        if self.mounts_applied.swap(true, Ordering::Relaxed) {
            return None;
        }

        Some(raw.additional_mounts.iter().map(|m| Mount::new(m.physical.clone().into(), m.virtual_path.clone())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_apply_returns_mounts_second_returns_none() {
        let config = GlobalConfiguration::new();
        let raw = RawConfiguration {
            secondary_compilation_enabled: true,
            additional_mounts: vec![RawMount { physical: "/a".into(), virtual_path: "/v".into() }],
        };
        assert!(config.apply(&raw).is_some());
        assert!(config.apply(&raw).is_none());
    }

    #[test]
    fn secondary_flag_is_reread_every_call() {
        let config = GlobalConfiguration::new();
        config.apply(&RawConfiguration { secondary_compilation_enabled: true, additional_mounts: vec![] });
        assert!(config.secondary_compilation_enabled());
        config.apply(&RawConfiguration { secondary_compilation_enabled: false, additional_mounts: vec![] });
        assert!(!config.secondary_compilation_enabled());
    }
}
