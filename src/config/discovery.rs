use super::error::DiscoveryError;
use super::limits::{PROFILE_SUBDIR, PROFILE_SUFFIX};
use std::path::{Path, PathBuf};

/// The selectable satellite profiles found in the profile directory.
#[derive(Debug)]
pub struct ProfileSet {
    /// Directory the profiles were found in
    pub dir: PathBuf,
    /// Profile names (file stems), byte-wise sorted
    pub names: Vec<String>,
    /// Currently active profile name
    pub active: Option<String>,
}

impl ProfileSet {
    /// Full path of the named profile file
    pub fn profile_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}{PROFILE_SUFFIX}"))
    }

    /// Path of the active profile, if one is selected
    pub fn active_path(&self) -> Option<PathBuf> {
        self.active.as_deref().map(|name| self.profile_path(name))
    }

    /// Make the named profile active if it is a known profile
    pub fn select(&mut self, name: &str) -> bool {
        if self.names.iter().any(|n| n == name) {
            self.active = Some(name.to_string());
            true
        } else {
            false
        }
    }
}

/// Default profile directory under the user's home directory.
///
/// The home directory is a precondition; a missing one is reported as an
/// unreadable profile directory rather than validated separately.
pub fn default_profile_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_default().join(PROFILE_SUBDIR)
}

/// Enumerate `*.cfg` profiles in `dir`.
///
/// Names are derived by stripping the suffix and sorted byte-wise, so the
/// order is stable regardless of locale. The first profile found becomes
/// active when `current` names none of them. Each discovered name is also
/// handed to `register`, which the frontend uses to populate its satellite
/// selection menu. Zero matches is an error the caller reports without
/// aborting the process.
pub fn find_profiles(
    dir: &Path,
    current: Option<&str>,
    mut register: impl FnMut(&str),
) -> Result<ProfileSet, DiscoveryError> {
    let entries = std::fs::read_dir(dir).map_err(|e| DiscoveryError::ReadDir {
        dir: dir.display().to_string(),
        source: e,
    })?;

    let mut names: Vec<String> = Vec::new();
    for entry in entries.flatten() {
        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            continue;
        };
        if let Some(stem) = file_name.strip_suffix(PROFILE_SUFFIX) {
            if !stem.is_empty() {
                names.push(stem.to_string());
            }
        }
    }
    names.sort();

    if names.is_empty() {
        return Err(DiscoveryError::NoProfiles {
            dir: dir.display().to_string(),
        });
    }

    for name in &names {
        register(name);
    }

    let active = match current {
        Some(sel) if names.iter().any(|n| n == sel) => Some(sel.to_string()),
        _ => Some(names[0].clone()),
    };
    log::info!(
        "found {} profile(s) in {}, active: {}",
        names.len(),
        dir.display(),
        active.as_deref().unwrap_or("-")
    );

    Ok(ProfileSet {
        dir: dir.to_path_buf(),
        names,
        active,
    })
}
