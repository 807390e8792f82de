//! Builder-style configuration for serving the tablet protocols.
//!
//! For a default configuration, `Builder::new().build()` is all you need!

use smallvec::SmallVec;

use crate::{cursor::ThemeCursor, protocol::Revision, TabletManager};

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildError {
    /// Every revision was turned off.
    #[error("no protocol revision enabled")]
    NoRevision,
    /// The revision was requested but its feature was disabled at compile-time.
    #[error("{} support was not compiled in", .0.as_ref())]
    Unsupported(Revision),
}

/// Settings fixed at construction.
#[derive(Clone, Debug)]
pub(crate) struct Config {
    pub(crate) revisions: SmallVec<[Revision; 2]>,
    pub(crate) fallback_cursor: ThemeCursor,
}

/// Pre-construction configuration for a [`TabletManager`].
#[derive(Clone, Debug)]
pub struct Builder {
    legacy: bool,
    unstable_v1: bool,
    fallback_cursor: ThemeCursor,
}
impl Default for Builder {
    /// Every compiled revision, crosshair fallback.
    fn default() -> Self {
        Self {
            legacy: Revision::Legacy.is_compiled(),
            unstable_v1: Revision::UnstableV1.is_compiled(),
            fallback_cursor: ThemeCursor::default(),
        }
    }
}

/// # Configuration
impl Builder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
    /// Serve the early experimental `wl_tablet_manager`.
    #[must_use]
    pub fn legacy(self, enable: bool) -> Self {
        Self {
            legacy: enable,
            ..self
        }
    }
    /// Serve `zwp_tablet_manager_v1`.
    #[must_use]
    pub fn unstable_v1(self, enable: bool) -> Self {
        Self {
            unstable_v1: enable,
            ..self
        }
    }
    /// The theme cursor shown while a tool is in proximity but no client cursor applies.
    #[must_use]
    pub fn fallback_cursor(self, cursor: ThemeCursor) -> Self {
        Self {
            fallback_cursor: cursor,
            ..self
        }
    }
}
/// # Finishing
impl Builder {
    // Silly clippy, it's a self-describing err type!
    #[allow(clippy::missing_errors_doc)]
    pub fn build(self) -> Result<TabletManager, BuildError> {
        let mut revisions = SmallVec::new();
        for (revision, enabled) in [
            (Revision::Legacy, self.legacy),
            (Revision::UnstableV1, self.unstable_v1),
        ] {
            if !enabled {
                continue;
            }
            if !revision.is_compiled() {
                return Err(BuildError::Unsupported(revision));
            }
            revisions.push(revision);
        }
        if revisions.is_empty() {
            return Err(BuildError::NoRevision);
        }
        Ok(TabletManager::new(Config {
            revisions,
            fallback_cursor: self.fallback_cursor,
        }))
    }
}
