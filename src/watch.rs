//! Surface destruction watches.
//!
//! Tablets hold on to two surfaces: the focus and the cursor. Each holding registers a watch
//! here and cancels it when let go, so that a destroyed surface can be unwound from every
//! tablet still pointing at it.

use std::collections::HashMap;

use smallvec::SmallVec;

use crate::compositor::{DeviceId, SurfaceId};

/// What a tablet holds a surface as.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum Watcher {
    Focus(DeviceId),
    Cursor(DeviceId),
}

/// Proof of a registered watch. Pass back to [`SurfaceWatches::cancel`].
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a watch must be cancelled when the surface is let go"]
pub(crate) struct WatchToken {
    surface: SurfaceId,
    key: u64,
}

#[derive(Debug, Default)]
pub(crate) struct SurfaceWatches {
    next_key: u64,
    watches: HashMap<SurfaceId, SmallVec<[(u64, Watcher); 2]>>,
}

impl SurfaceWatches {
    pub(crate) fn watch(&mut self, surface: SurfaceId, watcher: Watcher) -> WatchToken {
        let key = self.next_key;
        self.next_key += 1;
        self.watches.entry(surface).or_default().push((key, watcher));
        WatchToken { surface, key }
    }
    pub(crate) fn cancel(&mut self, token: WatchToken) {
        if let Some(list) = self.watches.get_mut(&token.surface) {
            list.retain(|(key, _)| *key != token.key);
            if list.is_empty() {
                self.watches.remove(&token.surface);
            }
        }
    }
    /// Everyone watching `surface`, in registration order. The watches stay registered until
    /// each watcher cancels its own.
    pub(crate) fn watchers(&self, surface: SurfaceId) -> SmallVec<[Watcher; 2]> {
        self.watches
            .get(&surface)
            .map(|list| list.iter().map(|(_, watcher)| *watcher).collect())
            .unwrap_or_default()
    }
    pub(crate) fn is_empty(&self) -> bool {
        self.watches.is_empty()
    }
}
