use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use regex::Regex;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::color_names::{ColorNameSource, NamedColorTable};
use crate::backend::app_settings::SettingsSource;
use crate::backend::common::constants::PREDEFINED_COLORS;
use crate::backend::common::dtos::RecentColor;
use crate::backend::project_storage::{BackendKind, StorageBackends};
use crate::error::DashboardResult;

static RGB_FUNCTION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^rgba?\(([^)]*)\)").expect("valid rgb() pattern"));

pub struct ColorService {
    backends: StorageBackends,
    settings: Arc<dyn SettingsSource>,
    names: Arc<dyn ColorNameSource>,
    write_lock: Mutex<()>,
}

impl ColorService {
    pub fn new(backends: StorageBackends, settings: Arc<dyn SettingsSource>) -> Self {
        Self::with_name_source(backends, settings, Arc::new(NamedColorTable::default()))
    }

    pub fn with_name_source(
        backends: StorageBackends,
        settings: Arc<dyn SettingsSource>,
        names: Arc<dyn ColorNameSource>,
    ) -> Self {
        Self {
            backends,
            settings,
            names,
            write_lock: Mutex::new(()),
        }
    }

    fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get_recent_colors(&self) -> DashboardResult<Vec<RecentColor>> {
        let kind = BackendKind::from_settings(&self.settings.current());
        self.backends.read_recent_colors(kind)
    }

    pub fn add_recent_color(&self, color_code: Option<&str>) -> DashboardResult<()> {
        let Some(color_code) = color_code.map(str::trim).filter(|code| !code.is_empty()) else {
            return Ok(());
        };

        let _guard = self.lock_writes();
        let settings = self.settings.current();
        let kind = BackendKind::from_settings(&settings);

        let mut colors = self.backends.read_recent_colors(kind)?;
        let entry = match colors.iter().position(|(code, _)| code == color_code) {
            Some(index) => colors.remove(index),
            None => (color_code.to_string(), self.get_color_name(color_code)),
        };
        colors.insert(0, entry);
        let colors = dedupe_recent_colors(colors, settings.recent_colors_to_remember);

        self.backends.write_recent_colors(kind, &colors)
    }

    pub fn get_color_name(&self, color_code: &str) -> Option<String> {
        let color_code = color_code.trim();
        if color_code.is_empty() {
            return None;
        }

        if let Some((label, _)) = PREDEFINED_COLORS
            .iter()
            .find(|(_, value)| *value == color_code)
        {
            return Some(label.to_string());
        }

        let hex = color_code_to_hex(color_code)?;
        let matched = self.names.nearest(&hex)?;
        matched.confident_name().map(ToOwned::to_owned)
    }

    pub fn get_random_color(&self, predefined_only: bool) -> String {
        if predefined_only {
            return PREDEFINED_COLORS
                .choose(&mut rand::thread_rng())
                .map(|(_, value)| value.to_string())
                .unwrap_or_default();
        }

        self.names.random_hex()
    }
}

/// `colors` is newest-first. Per non-null name the earliest recorded entry
/// survives, so a new code whose name is already listed is dropped. Unnamed
/// entries never collide. Re-adding a listed code moves it to the front
/// before this runs.
pub(crate) fn dedupe_recent_colors(colors: Vec<RecentColor>, max_count: usize) -> Vec<RecentColor> {
    let mut seen_names = HashSet::new();
    let mut kept = colors
        .into_iter()
        .rev()
        .filter(|(_, name)| match name {
            Some(name) => seen_names.insert(name.clone()),
            None => true,
        })
        .collect::<Vec<_>>();
    kept.reverse();
    kept.truncate(max_count);
    kept
}

/// Normalizes `#rgb`, `#rrggbb` (alpha digits dropped), `rgb()` and `rgba()`
/// into lowercase `#rrggbb`. Anything else yields `None`.
pub(crate) fn color_code_to_hex(color_code: &str) -> Option<String> {
    let color_code = color_code.trim();

    if let Some(digits) = color_code.strip_prefix('#') {
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let digits = digits.to_lowercase();
        return match digits.len() {
            3 | 4 => Some(
                digits
                    .chars()
                    .take(3)
                    .flat_map(|c| [c, c])
                    .fold(String::from("#"), |mut hex, c| {
                        hex.push(c);
                        hex
                    }),
            ),
            6 | 8 => Some(format!("#{}", &digits[..6])),
            _ => None,
        };
    }

    let lowered = color_code.to_lowercase();
    let captures = RGB_FUNCTION_PATTERN.captures(&lowered)?;
    rgb_arguments_to_hex(captures.get(1)?.as_str())
}

fn rgb_arguments_to_hex(arguments: &str) -> Option<String> {
    let components = if arguments.contains(',') {
        arguments.split(',').map(str::trim).collect::<Vec<_>>()
    } else {
        arguments.split_whitespace().collect::<Vec<_>>()
    };
    if components.len() < 3 {
        return None;
    }

    let mut hex = String::from("#");
    for component in &components[..3] {
        let value = component.parse::<f64>().ok()?;
        if !value.is_finite() || !(0.0..=255.0).contains(&value) {
            return None;
        }
        hex.push_str(&format!("{:02x}", value.round() as u8));
    }
    Some(hex)
}
