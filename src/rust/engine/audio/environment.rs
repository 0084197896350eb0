//! Runtime environment snapshot and restricted-environment detection
//!
//! User-agent sniffing stays a heuristic. It is isolated here so the rest of
//! the engine only sees the `Capabilities` flags.

use std::cell::Cell;
use std::rc::Rc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::engine::host::{AudioHost, ClipSupport};
use crate::shared::diagnostics::Diagnostics;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnvironmentInfo {
    pub user_agent: String,
    pub platform: String,
    pub vendor: String,
    pub max_touch_points: u32,
    pub language: String,
    pub hardware_concurrency: u32,
    pub window_size: String,
    pub screen_size: String,
    pub pixel_ratio: f64,
    pub timezone: String,
    pub has_audio_api: bool,
}

static EXPLICIT_MOBILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)ipad|iphone|ipod").expect("valid regex"));
static SAFARI: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)safari").expect("valid regex"));
static MOBILE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)mobile").expect("valid regex"));
static OTHER_ENGINES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)chrome|crios|firefox|fxios|edge").expect("valid regex"));

/// Independent signals; any one being true marks the environment restricted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestrictionSignals {
    pub explicit_mobile: bool,
    pub desktop_with_touch: bool,
    pub mobile_engine: bool,
}

impl RestrictionSignals {
    pub fn from_environment(env: &EnvironmentInfo) -> Self {
        let ua = env.user_agent.as_str();
        Self {
            explicit_mobile: EXPLICIT_MOBILE.is_match(ua),
            desktop_with_touch: env.platform.to_lowercase().contains("mac")
                && env.max_touch_points > 1,
            mobile_engine: SAFARI.is_match(ua) && MOBILE.is_match(ua) && !OTHER_ENGINES.is_match(ua),
        }
    }

    pub fn any(&self) -> bool {
        self.explicit_mobile || self.desktop_with_touch || self.mobile_engine
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    pub restricted: bool,
    pub live_graph: bool,
    pub clip_playback: bool,
}

/// Caches the restricted verdict for the session and logs the signals once
pub struct EnvironmentProbe {
    host: Rc<dyn AudioHost>,
    diagnostics: Rc<Diagnostics>,
    restricted_override: Option<bool>,
    restricted: Cell<Option<bool>>,
}

impl EnvironmentProbe {
    pub fn new(
        host: Rc<dyn AudioHost>,
        diagnostics: Rc<Diagnostics>,
        restricted_override: Option<bool>,
    ) -> Self {
        Self {
            host,
            diagnostics,
            restricted_override,
            restricted: Cell::new(None),
        }
    }

    pub fn environment(&self) -> EnvironmentInfo {
        self.host.environment()
    }

    pub fn is_restricted(&self) -> bool {
        if let Some(cached) = self.restricted.get() {
            return cached;
        }

        let env = self.host.environment();
        let signals = RestrictionSignals::from_environment(&env);
        let restricted = self.restricted_override.unwrap_or_else(|| signals.any());

        self.diagnostics.info_with(
            "ENVIRONMENT",
            "Restricted environment detection",
            &serde_json::json!({
                "userAgent": env.user_agent,
                "platform": env.platform,
                "signals": signals,
                "override": self.restricted_override,
                "result": restricted,
            }),
        );

        self.restricted.set(Some(restricted));
        restricted
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            restricted: self.is_restricted(),
            live_graph: self.host.environment().has_audio_api,
            clip_playback: self.host.clip_support() != ClipSupport::No,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(user_agent: &str, platform: &str, touch: u32) -> EnvironmentInfo {
        EnvironmentInfo {
            user_agent: user_agent.to_string(),
            platform: platform.to_string(),
            max_touch_points: touch,
            ..Default::default()
        }
    }

    #[test]
    fn test_iphone_user_agent_is_restricted() {
        let signals = RestrictionSignals::from_environment(&env(
            "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1",
            "iPhone",
            5,
        ));
        assert!(signals.explicit_mobile);
        assert!(signals.mobile_engine);
        assert!(signals.any());
    }

    #[test]
    fn test_ipad_reporting_desktop_platform_is_restricted() {
        let signals = RestrictionSignals::from_environment(&env(
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15",
            "MacIntel",
            5,
        ));
        assert!(!signals.explicit_mobile);
        assert!(signals.desktop_with_touch);
        assert!(signals.any());
    }

    #[test]
    fn test_desktop_chrome_is_not_restricted() {
        let signals = RestrictionSignals::from_environment(&env(
            "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36",
            "Linux x86_64",
            0,
        ));
        assert!(!signals.any());
    }

    #[test]
    fn test_android_chrome_mobile_is_not_mobile_engine() {
        let signals = RestrictionSignals::from_environment(&env(
            "Mozilla/5.0 (Linux; Android 14) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Mobile Safari/537.36",
            "Linux armv8l",
            5,
        ));
        assert!(!signals.mobile_engine);
        assert!(!signals.any());
    }
}
