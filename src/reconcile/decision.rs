//! Pure decision table for reconciliation.
//!
//! Everything here is a function of booleans observed from the filesystem and
//! the tracking record; no I/O happens in this module.

/// Facts observed at the start of a reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Observation {
    /// The targeted artifact file exists in the install directory.
    pub installed: bool,
    /// A well-formed tracking record exists.
    pub record_valid: bool,
    /// The record names the currently targeted artifact file.
    pub filename_matches: bool,
    /// The record's version equals the latest release tag.
    pub version_matches: bool,
    /// The installed file still hashes to the record's hash.
    pub hash_matches: bool,
}

/// Next step chosen for an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plan {
    /// The record tracks an artifact for another host version. Delete that
    /// artifact and the record, then plan again with no record.
    Migrate,
    /// Nothing installed: download straight to the install path.
    Install,
    /// Download the release into staging and compare it with the installed
    /// file, deleting the existing record first when `purge_record` is set.
    Verify {
        /// Whether a stale record must be removed before staging.
        purge_record: bool,
    },
    /// The installed file is a registered older release.
    ManualUpdate,
    /// Record and file agree with the latest release.
    UpToDate,
}

/// What to do once a staged release has been compared with the installed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// Bytes are identical: register the installed file as the latest release.
    Adopt,
    /// Bytes differ: leave the file alone and ask the user to update.
    ManualUpdate,
}

/// Choose the next step for `obs`.
///
/// Fields that cannot be observed (for example `hash_matches` without a
/// record) are ignored.
#[must_use]
pub fn plan(obs: Observation) -> Plan {
    if obs.record_valid && !obs.filename_matches {
        return Plan::Migrate;
    }
    if !obs.installed {
        return Plan::Install;
    }
    if !obs.record_valid {
        return Plan::Verify {
            purge_record: false,
        };
    }

    match (obs.version_matches, obs.hash_matches) {
        (true, true) => Plan::UpToDate,
        (false, true) => Plan::ManualUpdate,
        (_, false) => Plan::Verify { purge_record: true },
    }
}

/// Decide between adoption and a manual update after staging.
#[must_use]
pub fn resolve_comparison(staged_matches_installed: bool) -> Comparison {
    if staged_matches_installed {
        Comparison::Adopt
    } else {
        Comparison::ManualUpdate
    }
}
