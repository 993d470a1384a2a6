//! Device fingerprinting for license binding.
//!
//! A device id is derived from a handful of environment signals hashed with
//! a 32-bit rolling hash. It is a fingerprint of convenience, not an
//! identity: it is neither secret nor collision-free, and two machines that
//! report the same environment will share an id and be treated as one
//! device.
//!
//! The id is computed once per device and cached in device storage, so
//! later changes to the environment do not move an existing binding.

use crate::error::LicenseResult;
use serde::{Deserialize, Serialize};
use std::env;
use std::sync::Arc;
use sypher_storage::DeviceStorage;
use sypher_types::DeviceId;
use tracing::{debug, info};

/// Device storage item holding the cached device id.
pub const DEVICE_ID_ITEM: &str = "sypher-device-id";

/// Prefix of every derived device id.
pub const DEVICE_ID_PREFIX: &str = "device_";

/// Environment attributes the fingerprint is computed from.
///
/// `Default` is an empty environment, used where the id is pinned and the
/// signals are never hashed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentSignals {
    /// Application, OS, architecture and hostname.
    pub user_agent: String,
    /// Preferred language tag.
    pub language: String,
    /// Number of logical CPUs.
    pub hardware_concurrency: u32,
    pub screen_width: u32,
    pub screen_height: u32,
    pub color_depth: u32,
    /// IANA timezone name.
    pub timezone: String,
}

impl EnvironmentSignals {
    /// Collects signals from the current process environment.
    #[must_use]
    pub fn collect() -> Self {
        let (screen_width, screen_height, color_depth) = get_screen();
        Self {
            user_agent: format!(
                "sypher/{} ({}; {}; {})",
                env!("CARGO_PKG_VERSION"),
                env::consts::OS,
                env::consts::ARCH,
                get_hostname()
            ),
            language: get_language(),
            hardware_concurrency: std::thread::available_parallelism()
                .map(|n| u32::try_from(n.get()).unwrap_or(u32::MAX))
                .unwrap_or(1),
            screen_width,
            screen_height,
            color_depth,
            timezone: get_timezone(),
        }
    }

    /// Returns the string the fingerprint hash is computed over.
    ///
    /// Screen width, height and colour depth enter as their sum, not as
    /// separate fields.
    #[must_use]
    pub fn fingerprint_source(&self) -> String {
        let screen = u64::from(self.screen_width)
            + u64::from(self.screen_height)
            + u64::from(self.color_depth);
        format!(
            "{}{}{}{}{}",
            self.user_agent, self.language, self.hardware_concurrency, screen, self.timezone
        )
    }
}

/// 32-bit rolling hash (`h = h * 31 + c`) over the UTF-16 code units of `s`,
/// wrapping on overflow.
#[must_use]
pub fn rolling_hash(s: &str) -> i32 {
    s.encode_utf16().fold(0i32, |hash, unit| {
        hash.wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit))
    })
}

/// Derives the device id for the given signals.
#[must_use]
pub fn fingerprint(signals: &EnvironmentSignals) -> DeviceId {
    let hash = rolling_hash(&signals.fingerprint_source());
    DeviceId::from_derived(format!("{DEVICE_ID_PREFIX}{:x}", hash.unsigned_abs()))
}

/// Resolves the id of the current device, caching it in device storage.
#[derive(Clone)]
pub struct DeviceIdentity {
    storage: Arc<dyn DeviceStorage>,
    signals: EnvironmentSignals,
}

impl DeviceIdentity {
    /// Creates an identity that fingerprints `signals` on first use.
    #[must_use]
    pub fn new(storage: Arc<dyn DeviceStorage>, signals: EnvironmentSignals) -> Self {
        Self { storage, signals }
    }

    /// Creates an identity for the environment this process runs in.
    #[must_use]
    pub fn from_environment(storage: Arc<dyn DeviceStorage>) -> Self {
        Self::new(storage, EnvironmentSignals::collect())
    }

    /// Creates an identity whose device id is pinned to `id`.
    ///
    /// The id is written to device storage, so it is what
    /// [`current_device_id`](Self::current_device_id) returns from then on.
    /// The environment is not probed.
    pub fn with_id(storage: Arc<dyn DeviceStorage>, id: &DeviceId) -> LicenseResult<Self> {
        storage.set_item(DEVICE_ID_ITEM, id.as_str())?;
        Ok(Self::new(storage, EnvironmentSignals::default()))
    }

    /// Returns the current device id.
    ///
    /// The first call computes the fingerprint and persists it; later calls
    /// return the cached value.
    pub fn current_device_id(&self) -> LicenseResult<DeviceId> {
        if let Some(cached) = self.storage.get_item(DEVICE_ID_ITEM)? {
            if let Ok(id) = DeviceId::parse(&cached) {
                return Ok(id);
            }
            debug!("ignoring empty cached device id");
        }

        let id = fingerprint(&self.signals);
        self.storage.set_item(DEVICE_ID_ITEM, id.as_str())?;
        info!(device_id = %id, "generated device id");
        Ok(id)
    }

    /// Returns the signals this identity fingerprints.
    #[must_use]
    pub fn signals(&self) -> &EnvironmentSignals {
        &self.signals
    }

    /// Returns the device storage this identity caches into.
    #[must_use]
    pub fn storage(&self) -> &Arc<dyn DeviceStorage> {
        &self.storage
    }
}

/// Gets the machine hostname.
fn get_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Gets the preferred language as a BCP 47-ish tag (`en_US.UTF-8` -> `en-US`).
fn get_language() -> String {
    ["LC_ALL", "LANG"]
        .iter()
        .filter_map(|var| env::var(var).ok())
        .map(|v| v.split(['.', '@']).next().unwrap_or_default().replace('_', "-"))
        .find(|v| !v.is_empty() && v != "C" && v != "POSIX")
        .unwrap_or_else(|| "en-US".to_string())
}

/// Gets screen geometry from `SYPHER_SCREEN` (`WIDTHxHEIGHTxDEPTH`).
///
/// There is no portable way to query a display from a headless process, so
/// absent an override the geometry is reported as zero-sized.
fn get_screen() -> (u32, u32, u32) {
    const DEFAULT: (u32, u32, u32) = (0, 0, 24);

    let Ok(raw) = env::var("SYPHER_SCREEN") else {
        return DEFAULT;
    };
    let parts: Vec<u32> = raw
        .split('x')
        .filter_map(|p| p.trim().parse().ok())
        .collect();
    match parts.as_slice() {
        [w, h, d] => (*w, *h, *d),
        [w, h] => (*w, *h, DEFAULT.2),
        _ => DEFAULT,
    }
}

/// Gets the IANA timezone name.
fn get_timezone() -> String {
    if let Ok(tz) = env::var("TZ") {
        let tz = tz.trim_start_matches(':').trim();
        if !tz.is_empty() {
            return tz.to_string();
        }
    }

    #[cfg(unix)]
    {
        if let Ok(content) = std::fs::read_to_string("/etc/timezone") {
            let tz = content.trim();
            if !tz.is_empty() {
                return tz.to_string();
            }
        }
        if let Ok(target) = std::fs::read_link("/etc/localtime") {
            let target = target.to_string_lossy();
            if let Some((_, zone)) = target.split_once("zoneinfo/") {
                return zone.to_string();
            }
        }
    }

    "UTC".to_string()
}
