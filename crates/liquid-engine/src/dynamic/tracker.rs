use std::time::Instant;

use image::RgbaImage;

use crate::arena::Arena;
use crate::coords::{Rect, Vec2};
use crate::geometry::texture_rect;
use crate::host::{ElementId, RasterError, RasterJob, RasterOptions, RasterTag, Rasterizer, SceneHost};
use crate::snapshot::SnapshotImage;
use crate::texture::TextureManager;

use super::compose::{compose, crop_padded, ComposeJob, ComposedPatch, VideoLayer};
use super::composer::PatchComposer;
use super::node::{DynamicHandle, DynamicNode, NodeEvent};

/// Per-frame inputs shared by node and video patching.
#[derive(Debug, Copy, Clone)]
pub struct PatchFrame<'a> {
    pub base: &'a SnapshotImage,
    /// Snapshot root origin, viewport-relative CSS px.
    pub snap_origin: Vec2,
    /// Current lens rectangles, CSS px.
    pub lens_rects: &'a [Rect],
    /// Highest effective z-index among lenses; nodes at or above it are
    /// drawn by the host on top of the overlay and need no patch.
    pub max_lens_z: i32,
    pub videos: &'a [ElementId],
    pub scrolling: bool,
}

/// Owns every tracked node.
#[derive(Debug, Default)]
pub struct DynamicTracker {
    nodes: Arena<DynamicHandle, DynamicNode>,
    epoch: Option<u64>,
}

impl DynamicTracker {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 0
    }

    pub fn get(&self, handle: DynamicHandle) -> Option<&DynamicNode> {
        self.nodes.get(handle)
    }

    pub fn handles(&self) -> Vec<DynamicHandle> {
        self.nodes.keys()
    }

    pub fn find(&self, el: ElementId) -> Option<DynamicHandle> {
        self.nodes.iter().find(|(_, n)| n.element == el).map(|(h, _)| h)
    }

    /// Starts tracking `el`.
    ///
    /// Ignored and already tracked elements are skipped. Tracked descendants
    /// of `el` are dropped; the new node's patch covers them.
    pub fn register<H: SceneHost>(&mut self, host: &H, el: ElementId) -> Option<DynamicHandle> {
        if host.is_ignored(el) || self.find(el).is_some() {
            return None;
        }
        let dropped = self
            .nodes
            .retain(|_, n| !(n.element != el && host.contains(el, n.element)));
        if !dropped.is_empty() {
            log::debug!("{} tracked descendant(s) folded into {el:?}", dropped.len());
        }
        Some(self.nodes.insert(DynamicNode::new(el)))
    }

    /// Registers every element under `root` matching `selector`.
    pub fn register_selector<H: SceneHost>(
        &mut self,
        host: &H,
        root: ElementId,
        selector: &str,
    ) -> Vec<DynamicHandle> {
        host.query_selector_all(root, selector)
            .into_iter()
            .filter_map(|el| self.register(host, el))
            .collect()
    }

    pub fn remove(&mut self, handle: DynamicHandle) -> Option<DynamicNode> {
        self.nodes.remove(handle)
    }

    /// Routes a host event to the node tracking `el`.
    pub fn notify(&mut self, el: ElementId, event: &NodeEvent) -> bool {
        let Some(h) = self.find(el) else { return false; };
        if let Some(node) = self.nodes.get_mut(h) {
            node.handle_event(event);
        }
        true
    }

    /// Drops nodes whose element left the document.
    ///
    /// Only walks the nodes when the host's structure epoch moved.
    pub fn purge_detached<H: SceneHost>(&mut self, host: &H) -> Vec<DynamicHandle> {
        let epoch = host.structure_epoch();
        if self.epoch == Some(epoch) {
            return Vec::new();
        }
        self.epoch = Some(epoch);
        let removed = self.nodes.retain(|_, n| host.is_connected(n.element));
        if !removed.is_empty() {
            log::debug!("purged {} detached dynamic node(s)", removed.len());
        }
        removed
    }

    pub fn realtime_tick(&mut self, now: Instant) {
        for (_, node) in self.nodes.iter_mut() {
            node.realtime_tick(now);
        }
    }

    /// Forgets every drawn patch; used after a full recapture.
    pub fn invalidate_all(&mut self) {
        for (_, node) in self.nodes.iter_mut() {
            node.invalidate();
        }
    }

    /// Feeds a finished rasterization back into its node.
    pub fn on_capture(&mut self, handle: DynamicHandle, result: Result<RgbaImage, RasterError>) {
        let Some(node) = self.nodes.get_mut(handle) else {
            log::debug!("dropping capture for untracked node {handle:?}");
            return;
        };
        match result {
            Ok(img) => node.finish_capture(Some(img)),
            Err(e) => {
                log::warn!("dynamic capture of {:?} failed: {e}", node.element);
                node.finish_capture(None);
            }
        }
    }

    /// One patching pass over every node.
    ///
    /// Dirty nodes get a capture submitted (not while scrolling). Nodes with a
    /// capture get their previous rectangle erased and a fresh patch drawn.
    /// A node whose previous patch is still with the composer is skipped.
    pub fn update_nodes<H, R>(
        &mut self,
        host: &H,
        rasterizer: &mut R,
        composer: &mut dyn PatchComposer,
        texture: &mut TextureManager,
        frame: &PatchFrame<'_>,
    ) where
        H: SceneHost,
        R: Rasterizer + ?Sized,
    {
        let Some(tex_size) = texture.size() else { return; };
        let scale = frame.base.scale;
        let offloaded = composer.is_offloaded();

        for (handle, node) in self.nodes.iter_mut() {
            let el = node.element;

            if node.wants_capture() && !frame.scrolling {
                if let Some(rect) = host.bounding_rect(el) {
                    node.begin_capture();
                    rasterizer.submit(RasterJob {
                        tag: RasterTag::Dynamic { handle },
                        root: el,
                        options: RasterOptions {
                            scale,
                            width: rect.size.x,
                            height: rect.size.y,
                            ignore: Vec::new(),
                            ignore_fixed: false,
                            ignore_marked: true,
                        },
                    });
                }
            }

            let Some(capture) = node.last_capture().cloned() else { continue; };
            if node.is_composing() {
                continue;
            }
            let heavy_offload = offloaded && node.is_heavy();

            if let Some(prev) = node.prev_draw_rect {
                if !heavy_offload && !prev.is_empty() {
                    texture.patch_region(prev, &crop_padded(&frame.base.pixels, prev));
                }
            }

            let rect = host.bounding_rect(el).unwrap_or_default();
            if host.effective_z(el) >= frame.max_lens_z
                || !host.is_connected(el)
                || rect.is_empty()
                || !frame.lens_rects.iter().any(|lr| rect.intersects(*lr))
            {
                node.prev_draw_rect = None;
                continue;
            }

            let dst = texture_rect(rect, frame.snap_origin, scale);
            let Some(clipped) = dst.clip_to(tex_size.0, tex_size.1) else {
                node.prev_draw_rect = None;
                continue;
            };

            let style = host.style(el);
            let mut transform = style.transform;
            transform.m[4] *= scale;
            transform.m[5] *= scale;

            let job = ComposeJob {
                handle,
                generation: frame.base.generation,
                dst,
                base: crop_padded(&frame.base.pixels, dst),
                videos: video_layers(host, frame, rect, scale),
                capture,
                transform,
                opacity: style.opacity,
            };

            if node.is_heavy() {
                node.begin_compose();
                composer.submit(job);
            } else {
                let patch = compose(job);
                texture.patch_region(patch.dst, &patch.pixels);
            }
            node.prev_draw_rect = Some(clipped.dst);
        }
    }

    /// Applies patches returned by the composer.
    ///
    /// Patches of removed or invalidated nodes, and patches cut from a
    /// snapshot other than `generation`, are dropped.
    pub fn apply_composed(&mut self, texture: &mut TextureManager, patches: Vec<ComposedPatch>, generation: u64) {
        for patch in patches {
            let Some(node) = self.nodes.get_mut(patch.handle) else {
                log::debug!("dropping patch for untracked node {:?}", patch.handle);
                continue;
            };
            if !node.finish_compose() || patch.generation != generation {
                log::debug!(
                    "dropping stale patch for {:?} (snapshot {}, current {generation})",
                    patch.handle,
                    patch.generation
                );
                continue;
            }
            texture.patch_region(patch.dst, &patch.pixels);
        }
    }
}

fn video_layers<H: SceneHost>(host: &H, frame: &PatchFrame<'_>, node_rect: Rect, scale: f32) -> Vec<VideoLayer> {
    frame
        .videos
        .iter()
        .filter(|v| host.effective_z(**v) < frame.max_lens_z)
        .filter_map(|v| {
            let vr = host.bounding_rect(*v)?;
            if !node_rect.intersects(vr) {
                return None;
            }
            let frame_img = host.video_frame(*v)?;
            Some(VideoLayer {
                x: (vr.origin.x - node_rect.origin.x) * scale,
                y: (vr.origin.y - node_rect.origin.y) * scale,
                width: (vr.size.x * scale).round().max(0.0) as u32,
                height: (vr.size.y * scale).round().max(0.0) as u32,
                frame: frame_img,
            })
        })
        .collect()
}
