//! Headless CPU raster surface.
//!
//! Keeps drawables in memory and composites pixel content on export with
//! nearest-neighbour sampling. Text and frames have no glyph/stroke
//! rasterizer here and export as transparent. It also counts every write,
//! which makes it the reference surface for reconciler tests.

use crate::surface::{DrawableContent, DrawableProps, DrawingSurface, SurfaceError};
use board_core::kurbo::{Affine, Point, Rect};
use board_core::{NodeId, Viewport};
use image::{ImageBuffer, ImageFormat, Rgba};
use std::io::Cursor;

#[derive(Debug, Clone)]
struct Item {
    handle: u64,
    id: NodeId,
    props: DrawableProps,
    content: DrawableContent,
}

impl Item {
    /// Local (0..w, 0..h) → document transform.
    fn transform(&self) -> Affine {
        let g = &self.props.geometry;
        Affine::translate((g.x, g.y)) * Affine::rotate(self.props.rotation.to_radians())
    }

    fn bounds(&self) -> Rect {
        let g = &self.props.geometry;
        let t = self.transform();
        let corners = [
            t * Point::new(0.0, 0.0),
            t * Point::new(g.width, 0.0),
            t * Point::new(0.0, g.height),
            t * Point::new(g.width, g.height),
        ];
        corners
            .iter()
            .skip(1)
            .fold(Rect::from_points(corners[0], corners[0]), |r, p| r.union_pt(*p))
    }
}

/// Write counters, reset with [`RasterSurface::reset_stats`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceStats {
    pub created: usize,
    pub props_set: usize,
    pub content_set: usize,
    pub removed: usize,
    pub restacked: usize,
    pub redraws: usize,
}

impl SurfaceStats {
    pub fn writes(&self) -> usize {
        self.created + self.props_set + self.content_set + self.removed + self.restacked
    }
}

/// In-memory drawing surface with PNG export.
pub struct RasterSurface {
    width: u32,
    height: u32,
    viewport: Viewport,
    items: Vec<Item>,
    next_handle: u64,
    stats: SurfaceStats,
}

impl RasterSurface {
    /// A surface whose visible area is `width × height` screen pixels.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            viewport: Viewport::default(),
            items: Vec::new(),
            next_handle: 1,
            stats: SurfaceStats::default(),
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    pub fn stats(&self) -> SurfaceStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = SurfaceStats::default();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Node ids bottom-to-top.
    pub fn paint_order(&self) -> Vec<NodeId> {
        self.items.iter().map(|i| i.id).collect()
    }

    pub fn content_of(&self, id: NodeId) -> Option<&DrawableContent> {
        self.items.iter().find(|i| i.id == id).map(|i| &i.content)
    }

    fn item(&self, handle: u64) -> Option<&Item> {
        self.items.iter().find(|i| i.handle == handle)
    }

    fn item_mut(&mut self, handle: u64) -> Option<&mut Item> {
        self.items.iter_mut().find(|i| i.handle == handle)
    }

    /// Composite every item into `out_w × out_h` pixels, where `to_doc`
    /// maps output pixel centres to document space.
    fn composite(&self, out_w: u32, out_h: u32, to_doc: Affine) -> ImageBuffer<Rgba<u8>, Vec<u8>> {
        let mut out = ImageBuffer::<Rgba<u8>, Vec<u8>>::new(out_w, out_h);
        let prepared: Vec<(Affine, &Item)> = self
            .items
            .iter()
            .filter(|i| matches!(&i.content, DrawableContent::Pixels(p) if p.width > 0 && p.height > 0))
            .map(|i| (i.transform().inverse(), i))
            .collect();

        for (px, py, dst) in out.enumerate_pixels_mut() {
            let doc = to_doc * Point::new(px as f64 + 0.5, py as f64 + 0.5);
            for (inv, item) in &prepared {
                let DrawableContent::Pixels(src) = &item.content else {
                    continue;
                };
                let local = *inv * doc;
                let g = &item.props.geometry;
                if local.x < 0.0 || local.y < 0.0 || local.x >= g.width || local.y >= g.height {
                    continue;
                }
                let sx = ((local.x / g.width) * src.width as f64) as u32;
                let sy = ((local.y / g.height) * src.height as f64) as u32;
                let s = src.pixel(sx.min(src.width - 1), sy.min(src.height - 1));
                blend(&mut dst.0, s, item.props.opacity);
            }
        }
        out
    }
}

/// Source-over blend of straight-alpha `src` onto `dst`.
fn blend(dst: &mut [u8; 4], src: [u8; 4], opacity: f64) {
    let sa = (src[3] as f64 / 255.0) * opacity.clamp(0.0, 1.0);
    if sa <= 0.0 {
        return;
    }
    let da = dst[3] as f64 / 255.0;
    let oa = sa + da * (1.0 - sa);
    for c in 0..3 {
        let sc = src[c] as f64 / 255.0;
        let dc = dst[c] as f64 / 255.0;
        let oc = (sc * sa + dc * da * (1.0 - sa)) / oa;
        dst[c] = (oc * 255.0).round() as u8;
    }
    dst[3] = (oa * 255.0).round() as u8;
}

fn encode_png(img: &ImageBuffer<Rgba<u8>, Vec<u8>>) -> Result<Vec<u8>, SurfaceError> {
    let mut cursor = Cursor::new(Vec::new());
    img.write_to(&mut cursor, ImageFormat::Png)
        .map_err(|e| SurfaceError::Encode(e.to_string()))?;
    Ok(cursor.into_inner())
}

impl DrawingSurface for RasterSurface {
    type Handle = u64;

    fn create(&mut self, id: NodeId, props: &DrawableProps, content: DrawableContent) -> u64 {
        let handle = self.next_handle;
        self.next_handle += 1;
        self.items.push(Item {
            handle,
            id,
            props: props.clone(),
            content,
        });
        self.stats.created += 1;
        handle
    }

    fn realized(&self, handle: &u64) -> Option<DrawableProps> {
        self.item(*handle).map(|i| i.props.clone())
    }

    fn set_props(&mut self, handle: &u64, props: &DrawableProps) {
        if let Some(item) = self.item_mut(*handle) {
            item.props = props.clone();
            self.stats.props_set += 1;
        }
    }

    fn set_content(&mut self, handle: &u64, content: DrawableContent) {
        if let Some(item) = self.item_mut(*handle) {
            item.content = content;
            self.stats.content_set += 1;
        }
    }

    fn remove(&mut self, handle: &u64) {
        let before = self.items.len();
        self.items.retain(|i| i.handle != *handle);
        if self.items.len() != before {
            self.stats.removed += 1;
        }
    }

    fn restack(&mut self, order: &[u64]) {
        let (mut listed, unlisted): (Vec<Item>, Vec<Item>) = self
            .items
            .drain(..)
            .partition(|i| order.contains(&i.handle));
        listed.sort_by_key(|i| order.iter().position(|h| *h == i.handle));
        self.items = unlisted;
        self.items.extend(listed);
        self.stats.restacked += 1;
    }

    fn redraw(&mut self) {
        self.stats.redraws += 1;
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn export_png(&self, clip: Option<&u64>) -> Result<Vec<u8>, SurfaceError> {
        let img = match clip {
            Some(handle) => {
                let item = self
                    .item(*handle)
                    .ok_or_else(|| SurfaceError::UnknownDrawable(handle.to_string()))?;
                let b = item.bounds();
                let (w, h) = (b.width().ceil() as u32, b.height().ceil() as u32);
                if w == 0 || h == 0 {
                    return Err(SurfaceError::EmptyRegion(format!("{} has no area", item.id)));
                }
                self.composite(w, h, Affine::translate((b.x0, b.y0)))
            }
            None => {
                if self.width == 0 || self.height == 0 {
                    return Err(SurfaceError::EmptyRegion("surface has no area".into()));
                }
                self.composite(self.width, self.height, self.viewport.affine().inverse())
            }
        };
        encode_png(&img)
    }
}
