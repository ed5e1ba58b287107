//! Host engine version gate.

use orche_core::{OrcheError, OrcheResult};
use semver::{Version, VersionReq};

/// The range of host engine versions an engine binding supports.
///
/// Both bounds are inclusive. A bound may use wildcards (`1.x`, `1.2.*`),
/// which cover the whole minor or patch range.
///
/// ```
/// use orche_config::CompatRange;
///
/// let range = CompatRange::new("hyper", "1.0.0", "1.x");
/// assert!(range.check("1.6.0").is_ok());
/// assert!(range.check("2.0.0").is_err());
/// assert!(range.check("0.14.28").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompatRange {
    dependency: String,
    from: String,
    to: String,
}

impl CompatRange {
    /// Creates a range for `dependency`.
    pub fn new(dependency: impl Into<String>, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            dependency: dependency.into(),
            from: from.into(),
            to: to.into(),
        }
    }

    /// Returns the dependency name.
    pub fn dependency(&self) -> &str {
        &self.dependency
    }

    /// Returns the lowest supported version.
    pub fn from_version(&self) -> &str {
        &self.from
    }

    /// Returns the highest supported version.
    pub fn to_version(&self) -> &str {
        &self.to
    }

    /// Fails unless `installed` lies within the range.
    ///
    /// # Errors
    ///
    /// [`OrcheError::IncompatibleEngine`] when outside the range,
    /// [`OrcheError::Configuration`] when a version string is malformed.
    pub fn check(&self, installed: &str) -> OrcheResult<()> {
        let requirement = self.requirement()?;
        let version = Version::parse(installed.trim()).map_err(|e| {
            OrcheError::configuration(format!(
                "invalid installed version `{installed}` for {}: {e}",
                self.dependency
            ))
        })?;

        if requirement.matches(&version) {
            tracing::debug!(dependency = %self.dependency, version = %version, "engine version supported");
            Ok(())
        } else {
            Err(OrcheError::IncompatibleEngine {
                dependency: self.dependency.clone(),
                from: self.from.clone(),
                to: self.to.clone(),
                found: installed.to_string(),
            })
        }
    }

    fn requirement(&self) -> OrcheResult<VersionReq> {
        let raw = format!(">={}, <={}", self.from.trim(), self.to.trim());
        VersionReq::parse(&raw).map_err(|e| {
            OrcheError::configuration(format!(
                "invalid version range {} to {} for {}: {e}",
                self.from, self.to, self.dependency
            ))
        })
    }
}
