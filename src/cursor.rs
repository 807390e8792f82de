//! # Cursor surfaces
//!
//! A client may give a surface the tablet cursor role through `set_cursor`. The role keeps the
//! hotspot and the sprite derived from the surface's buffer, and pushes texture updates to the
//! renderer of whichever tablet is showing it.

use std::collections::HashMap;

use crate::compositor::{BufferId, CursorBackend, RendererId, Scene, Surface, SurfaceId};

/// Cursors from the compositor's theme.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::AsRefStr)]
pub enum ThemeCursor {
    #[default]
    Crosshair,
    Default,
}

/// An image derived from a client buffer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CursorSprite {
    /// `None` until a buffer has been realized.
    pub texture: Option<BufferId>,
    /// In buffer pixels.
    pub hotspot: [i32; 2],
    /// Monitor scale over surface scale at the last position.
    pub texture_scale: f32,
}
impl Default for CursorSprite {
    fn default() -> Self {
        Self {
            texture: None,
            hotspot: [0, 0],
            texture_scale: 1.0,
        }
    }
}

/// What a renderer should show.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CursorImage {
    Theme(ThemeCursor),
    Sprite(CursorSprite),
}

/// Buffer state of a surface commit, as far as cursors care.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Commit {
    /// The buffer current after this commit.
    pub buffer: Option<BufferId>,
    /// Whether this commit attached a new buffer.
    pub newly_attached: bool,
    pub scale: i32,
}

/// The tablet-cursor role of one surface.
#[derive(Debug)]
pub struct CursorRole {
    surface: Surface,
    hotspot: [i32; 2],
    sprite: CursorSprite,
    renderer: Option<RendererId>,
    buffer: Option<BufferId>,
}

impl CursorRole {
    #[must_use]
    pub fn new(surface: Surface) -> Self {
        Self {
            surface,
            hotspot: [0, 0],
            sprite: CursorSprite::default(),
            renderer: None,
            buffer: None,
        }
    }
    #[must_use]
    pub fn surface(&self) -> &Surface {
        &self.surface
    }
    /// In surface-local coordinates.
    #[must_use]
    pub fn hotspot(&self) -> [i32; 2] {
        self.hotspot
    }
    #[must_use]
    pub fn sprite(&self) -> &CursorSprite {
        &self.sprite
    }
    #[must_use]
    pub fn renderer(&self) -> Option<RendererId> {
        self.renderer
    }
    /// Whether the surface has an attached buffer to draw.
    #[must_use]
    pub fn has_buffer(&self) -> bool {
        self.buffer.is_some()
    }

    pub fn set_hotspot<B: CursorBackend + ?Sized>(&mut self, hotspot: [i32; 2], backend: &mut B) {
        if self.hotspot == hotspot {
            return;
        }
        self.hotspot = hotspot;
        self.update_sprite(backend);
    }

    /// Bind to a renderer, or unbind with `None`.
    pub fn set_renderer<B: CursorBackend + ?Sized>(
        &mut self,
        renderer: Option<RendererId>,
        backend: &mut B,
    ) {
        if self.renderer == renderer {
            return;
        }
        self.renderer = renderer;
        self.update_sprite(backend);
    }

    /// Track the surface's buffer. The sprite is only recomputed when a new buffer came with
    /// the commit.
    pub fn commit<B: CursorBackend + ?Sized>(&mut self, commit: &Commit, backend: &mut B) {
        self.surface.scale = commit.scale.max(1);
        self.buffer = commit.buffer;
        if commit.newly_attached {
            self.update_sprite(backend);
        }
    }

    /// Adjust texture scale for the monitor at `position`.
    pub fn prepare_at<S: Scene + ?Sized>(&mut self, position: [f64; 2], scene: &S) {
        if scene.is_xwayland(&self.surface) {
            return;
        }
        #[allow(clippy::cast_precision_loss)]
        let surface_scale = self.surface.scale.max(1) as f32;
        self.sprite.texture_scale = scene.monitor_scale_at(position) / surface_scale;
    }

    fn update_sprite<B: CursorBackend + ?Sized>(&mut self, backend: &mut B) {
        let scale = self.surface.scale.max(1);
        match (self.renderer, self.buffer) {
            (Some(renderer), Some(buffer)) => {
                self.sprite.texture = Some(buffer);
                self.sprite.hotspot = self.hotspot.map(|axis| axis.saturating_mul(scale));
                backend.realize_from_buffer(renderer, &self.sprite, buffer);
                backend.force_update(renderer);
            }
            (Some(renderer), None) => {
                self.sprite.texture = None;
                self.sprite.hotspot = [0, 0];
                backend.force_update(renderer);
            }
            (None, _) => self.sprite.texture = None,
        }
        tracing::trace!(surface = ?self.surface.id, sprite = ?self.sprite, "cursor sprite updated");
    }
}

/// Cursor roles by surface.
#[derive(Debug, Default)]
pub(crate) struct CursorRoles(HashMap<SurfaceId, CursorRole>);
impl CursorRoles {
    pub(crate) fn ensure(&mut self, surface: Surface) -> &mut CursorRole {
        self.0
            .entry(surface.id)
            .or_insert_with(|| CursorRole::new(surface))
    }
    pub(crate) fn get(&self, surface: SurfaceId) -> Option<&CursorRole> {
        self.0.get(&surface)
    }
    pub(crate) fn get_mut(&mut self, surface: SurfaceId) -> Option<&mut CursorRole> {
        self.0.get_mut(&surface)
    }
    pub(crate) fn remove(&mut self, surface: SurfaceId) -> Option<CursorRole> {
        self.0.remove(&surface)
    }
}
