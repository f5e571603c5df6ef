//! Drawing-surface capability consumed by the reconciler.
//!
//! A surface is a retained-mode object graph: it owns drawables, each a
//! positioned, rotatable, opacity-controlled rectangle of content. The
//! reconciler is the only writer; hosts implement this trait over their
//! rendering library (Canvas2D, a GPU scene, or the headless
//! [`RasterSurface`](crate::raster::RasterSurface)).

use board_core::{Geometry, Node, NodeId, TextNode, Viewport, VisualExtras};
use thiserror::Error;

/// Decoded RGBA8 pixel content.
#[derive(Clone, PartialEq, Eq)]
pub struct Pixels {
    pub width: u32,
    pub height: u32,
    /// Row-major, 4 bytes per pixel, straight alpha.
    pub rgba: Vec<u8>,
}

impl Pixels {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Self {
        debug_assert_eq!(rgba.len(), Self::byte_len(width, height));
        Self {
            width,
            height,
            rgba,
        }
    }

    /// A single-color block, handy for placeholders.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let data = rgba
            .iter()
            .copied()
            .cycle()
            .take(Self::byte_len(width, height))
            .collect();
        Self::new(width, height, data)
    }

    fn byte_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * 4
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.rgba[i],
            self.rgba[i + 1],
            self.rgba[i + 2],
            self.rgba[i + 3],
        ]
    }
}

impl std::fmt::Debug for Pixels {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Pixels({}x{})", self.width, self.height)
    }
}

/// What a drawable shows.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawableContent {
    /// Decoded network content (image or video poster frame).
    Pixels(Pixels),
    /// Text laid out by the surface.
    Text(TextNode),
    /// Bounds-only frame for group nodes.
    Frame,
}

/// Realized transform and decoration of a drawable.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawableProps {
    pub geometry: Geometry,
    /// Degrees.
    pub rotation: f64,
    pub opacity: f64,
    pub visual: VisualExtras,
}

impl DrawableProps {
    pub fn from_node(node: &Node) -> Self {
        Self {
            geometry: node.geometry,
            rotation: node.rotation,
            opacity: node.opacity,
            visual: node.visual.clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("no drawable for handle {0}")]
    UnknownDrawable(String),
    #[error("nothing to export: {0}")]
    EmptyRegion(String),
    #[error("raster encode failed: {0}")]
    Encode(String),
}

/// A retained-mode drawing surface.
pub trait DrawingSurface {
    type Handle: Clone + std::fmt::Debug + PartialEq;

    /// Materialize a drawable for `id`. It is painted above existing ones
    /// until the next `restack`.
    fn create(&mut self, id: NodeId, props: &DrawableProps, content: DrawableContent)
    -> Self::Handle;

    /// Currently realized properties, or `None` if the handle is gone.
    fn realized(&self, handle: &Self::Handle) -> Option<DrawableProps>;

    fn set_props(&mut self, handle: &Self::Handle, props: &DrawableProps);

    fn set_content(&mut self, handle: &Self::Handle, content: DrawableContent);

    /// Release the drawable and its resources.
    fn remove(&mut self, handle: &Self::Handle);

    /// Reorder drawables bottom-to-top. Handles not listed keep their
    /// relative order below the listed ones.
    fn restack(&mut self, order: &[Self::Handle]);

    fn redraw(&mut self);

    /// Document-to-screen mapping used for painting and export.
    fn set_viewport(&mut self, _viewport: Viewport) {}

    /// Rasterize the visible surface, or only one drawable's bounds, as PNG.
    fn export_png(&self, clip: Option<&Self::Handle>) -> Result<Vec<u8>, SurfaceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn byte_len_is_computed_in_usize() {
        assert_eq!(Pixels::byte_len(70_000, 16_000), 4_480_000_000);
        assert_eq!(Pixels::byte_len(0, 9), 0);
    }

    #[test]
    fn pixel_reads_row_major_rgba() {
        let mut rgba = vec![0; 2 * 2 * 4];
        rgba[12..16].copy_from_slice(&[1, 2, 3, 4]);
        let pixels = Pixels::new(2, 2, rgba);
        assert_eq!(pixels.pixel(1, 1), [1, 2, 3, 4]);
        assert_eq!(pixels.pixel(0, 1), [0, 0, 0, 0]);
    }
}
