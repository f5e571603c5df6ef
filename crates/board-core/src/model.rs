//! Core node model for board documents.
//!
//! A board is a flat, ordered collection of nodes. Paint order is ascending
//! `z_index` with ties broken by collection position (see [`paint_order`]);
//! `z_index` is assigned at creation from the node count and renumbered by
//! the z-order operations. Each node carries shared
//! geometry and visual attributes plus a per-variant payload in `NodeKind`.

use crate::id::{AssetId, NodeId};
use kurbo::{Affine, Point, Rect, Shape};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

// ─── Colors ──────────────────────────────────────────────────────────────

/// RGBA color. Stored as 4 × f32 [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Color {
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#RGB`, `#RRGGBB` or `#RRGGBBAA`. The `#` is optional.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex.as_bytes();
        let pair = |i: usize| -> Option<f32> {
            let hi = hex_val(bytes[i])?;
            let lo = hex_val(bytes[i + 1])?;
            Some((hi * 16 + lo) as f32 / 255.0)
        };

        match bytes.len() {
            3 => {
                let r = hex_val(bytes[0])?;
                let g = hex_val(bytes[1])?;
                let b = hex_val(bytes[2])?;
                Some(Self::rgba(
                    (r * 17) as f32 / 255.0,
                    (g * 17) as f32 / 255.0,
                    (b * 17) as f32 / 255.0,
                    1.0,
                ))
            }
            6 => Some(Self::rgba(pair(0)?, pair(2)?, pair(4)?, 1.0)),
            8 => Some(Self::rgba(pair(0)?, pair(2)?, pair(4)?, pair(6)?)),
            _ => None,
        }
    }

    /// Emit as `#RRGGBB`, or `#RRGGBBAA` when not fully opaque.
    pub fn to_hex(&self) -> String {
        let to_byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        let (r, g, b, a) = (to_byte(self.r), to_byte(self.g), to_byte(self.b), to_byte(self.a));
        if a == 255 {
            format!("#{r:02X}{g:02X}{b:02X}")
        } else {
            format!("#{r:02X}{g:02X}{b:02X}{a:02X}")
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

// ─── Geometry ────────────────────────────────────────────────────────────

/// Position and size in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Geometry {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Geometry {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }
}

// ─── Visual extras ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shadow {
    pub offset_x: f64,
    pub offset_y: f64,
    pub blur: f64,
    pub color: Color,
}

/// Optional decoration available to every node type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VisualExtras {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blend_mode: Option<BlendMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow: Option<Shadow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corner_radius: Option<f64>,
}

// ─── Text ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    pub family: String,
    pub weight: u16,
    pub size: f64,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: "Inter".into(),
            weight: 400,
            size: 24.0,
        }
    }
}

// ─── Node variants ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ImageNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VideoNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
    #[serde(default)]
    pub muted: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TextNode {
    pub content: String,
    #[serde(default)]
    pub font: FontSpec,
    #[serde(default)]
    pub color: Color,
    #[serde(default)]
    pub align: TextAlign,
}

/// A group keeps references to its members; members stay in the collection.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GroupNode {
    #[serde(default)]
    pub members: SmallVec<[NodeId; 4]>,
}

/// Per-variant payload. Serialized with a `type` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeKind {
    Image(ImageNode),
    Video(VideoNode),
    Group(GroupNode),
    Text(TextNode),
}

/// Bare discriminant of `NodeKind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Image,
    Video,
    Group,
    Text,
}

impl NodeKind {
    pub fn node_type(&self) -> NodeType {
        match self {
            NodeKind::Image(_) => NodeType::Image,
            NodeKind::Video(_) => NodeType::Video,
            NodeKind::Group(_) => NodeType::Group,
            NodeKind::Text(_) => NodeType::Text,
        }
    }
}

impl NodeType {
    /// Prefix used for generated IDs.
    pub fn id_prefix(self) -> &'static str {
        match self {
            NodeType::Image => "image",
            NodeType::Video => "video",
            NodeType::Group => "group",
            NodeType::Text => "text",
        }
    }
}

// ─── Node ────────────────────────────────────────────────────────────────

fn default_opacity() -> f64 {
    1.0
}

/// A positioned, transformable item on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<AssetId>,
    pub geometry: Geometry,
    /// Degrees, clockwise, pivoting on the top-left corner.
    #[serde(default)]
    pub rotation: f64,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    /// Excluded from drag moves; still selectable.
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub z_index: i64,
    #[serde(default)]
    pub visual: VisualExtras,
    pub kind: NodeKind,
}

impl Node {
    pub fn node_type(&self) -> NodeType {
        self.kind.node_type()
    }

    /// Network content location, for variants that have one.
    pub fn content_ref(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Image(img) => img.url.as_deref(),
            NodeKind::Video(vid) => vid.url.as_deref(),
            NodeKind::Group(_) | NodeKind::Text(_) => None,
        }
    }

    /// Rotation folded into `[0, 360)` for display.
    pub fn display_rotation(&self) -> f64 {
        self.rotation.rem_euclid(360.0)
    }

    /// Local → document transform (rotation about the top-left corner).
    pub fn transform(&self) -> Affine {
        Affine::translate((self.geometry.x, self.geometry.y))
            * Affine::rotate(self.rotation.to_radians())
    }

    /// Centroid of the rotated rectangle in document coordinates.
    pub fn centroid(&self) -> Point {
        self.transform() * Point::new(self.geometry.width / 2.0, self.geometry.height / 2.0)
    }

    /// Axis-aligned bounding box of the rotated rectangle.
    pub fn bounds(&self) -> Rect {
        if self.rotation.rem_euclid(360.0) == 0.0 {
            return self.geometry.rect();
        }
        let local = Rect::new(0.0, 0.0, self.geometry.width, self.geometry.height);
        (self.transform() * local.to_path(0.1)).bounding_box()
    }

    /// Whether a document-space point falls inside the rotated rectangle.
    pub fn contains(&self, p: Point) -> bool {
        let local = self.transform().inverse() * p;
        local.x >= 0.0
            && local.y >= 0.0
            && local.x <= self.geometry.width
            && local.y <= self.geometry.height
    }

    /// Merge the set fields of `patch` into this node.
    ///
    /// Variant-specific fields are ignored when they do not apply to this
    /// node's kind (e.g. `text` on an image).
    pub fn apply_patch(&mut self, patch: &NodePatch) {
        let g = &mut self.geometry;
        if let Some(x) = patch.x {
            g.x = x;
        }
        if let Some(y) = patch.y {
            g.y = y;
        }
        if let Some(w) = patch.width {
            g.width = w;
        }
        if let Some(h) = patch.height {
            g.height = h;
        }
        if let Some(r) = patch.rotation {
            self.rotation = r;
        }
        if let Some(o) = patch.opacity {
            self.opacity = o;
        }
        if let Some(l) = patch.locked {
            self.locked = l;
        }
        if let Some(z) = patch.z_index {
            self.z_index = z;
        }
        if let Some(asset) = &patch.asset_id {
            self.asset_id = Some(asset.clone());
        }
        if let Some(mode) = patch.blend_mode {
            self.visual.blend_mode = Some(mode);
        }
        if let Some(shadow) = &patch.shadow {
            self.visual.shadow = Some(shadow.clone());
        }
        if let Some(radius) = patch.corner_radius {
            self.visual.corner_radius = Some(radius);
        }

        match &mut self.kind {
            NodeKind::Image(img) => {
                if let Some(url) = &patch.url {
                    img.url = Some(url.clone());
                }
            }
            NodeKind::Video(vid) => {
                if let Some(url) = &patch.url {
                    vid.url = Some(url.clone());
                }
            }
            NodeKind::Text(text) => {
                if let Some(content) = &patch.text {
                    text.content = content.clone();
                }
                if let Some(size) = patch.font_size {
                    text.font.size = size;
                }
                if let Some(color) = patch.color {
                    text.color = color;
                }
                if let Some(align) = patch.align {
                    text.align = align;
                }
            }
            NodeKind::Group(_) => {}
        }
    }
}

/// `nodes` bottom-to-top: ascending `z_index`, ties in collection order.
pub fn paint_order(nodes: &[Node]) -> Vec<&Node> {
    let mut order: Vec<&Node> = nodes.iter().collect();
    order.sort_by_key(|n| n.z_index);
    order
}

/// A node before the store assigns its `id` and `z_index`.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeDraft {
    pub asset_id: Option<AssetId>,
    pub geometry: Geometry,
    pub rotation: f64,
    pub opacity: f64,
    pub locked: bool,
    pub visual: VisualExtras,
    pub kind: NodeKind,
}

impl NodeDraft {
    pub fn new(kind: NodeKind, geometry: Geometry) -> Self {
        Self {
            asset_id: None,
            geometry,
            rotation: 0.0,
            opacity: 1.0,
            locked: false,
            visual: VisualExtras::default(),
            kind,
        }
    }

    pub fn image(url: impl Into<String>, geometry: Geometry) -> Self {
        Self::new(
            NodeKind::Image(ImageNode {
                url: Some(url.into()),
            }),
            geometry,
        )
    }

    pub fn video(url: impl Into<String>, geometry: Geometry) -> Self {
        Self::new(
            NodeKind::Video(VideoNode {
                url: Some(url.into()),
                ..VideoNode::default()
            }),
            geometry,
        )
    }

    pub fn text(content: impl Into<String>, geometry: Geometry) -> Self {
        Self::new(
            NodeKind::Text(TextNode {
                content: content.into(),
                ..TextNode::default()
            }),
            geometry,
        )
    }

    pub fn with_asset(mut self, asset_id: AssetId) -> Self {
        self.asset_id = Some(asset_id);
        self
    }

    pub fn into_node(self, id: NodeId, z_index: i64) -> Node {
        Node {
            id,
            asset_id: self.asset_id,
            geometry: self.geometry,
            rotation: self.rotation,
            opacity: self.opacity,
            locked: self.locked,
            z_index,
            visual: self.visual,
            kind: self.kind,
        }
    }
}

/// Partial update for `update_node`. Unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodePatch {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub rotation: Option<f64>,
    pub opacity: Option<f64>,
    pub locked: Option<bool>,
    pub z_index: Option<i64>,
    pub asset_id: Option<AssetId>,
    pub blend_mode: Option<BlendMode>,
    pub shadow: Option<Shadow>,
    pub corner_radius: Option<f64>,
    /// Image/video only.
    pub url: Option<String>,
    /// Text only.
    pub text: Option<String>,
    pub font_size: Option<f64>,
    pub color: Option<Color>,
    pub align: Option<TextAlign>,
}

impl NodePatch {
    pub fn position(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    pub fn size(width: f64, height: f64) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Self::default()
        }
    }
}

// ─── Viewport & document ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pan {
    pub x: f64,
    pub y: f64,
}

/// Zoom and pan of the visible surface. `screen = doc * zoom + pan`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub zoom: f64,
    pub pan: Pan,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan: Pan::default(),
        }
    }
}

impl Viewport {
    pub fn affine(&self) -> Affine {
        Affine::translate((self.pan.x, self.pan.y)) * Affine::scale(self.zoom)
    }

    pub fn doc_to_screen(&self, p: Point) -> Point {
        self.affine() * p
    }

    pub fn screen_to_doc(&self, p: Point) -> Point {
        self.affine().inverse() * p
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DocumentFlags {
    #[serde(default)]
    pub show_grid: bool,
    #[serde(default)]
    pub snap_to_grid: bool,
}

/// Pixel dimensions of the visible canvas element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

// ─── Assets ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Image,
    Video,
}

/// A backend media record. Opaque content to position, never mutated here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: AssetId,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    pub width: f64,
    pub height: f64,
    pub kind: AssetKind,
}

impl Asset {
    /// Draft a node showing this asset at `(x, y)` with its natural size.
    pub fn to_draft(&self, x: f64, y: f64) -> NodeDraft {
        let geometry = Geometry::new(x, y, self.width, self.height);
        let draft = match self.kind {
            AssetKind::Image => NodeDraft::image(self.url.clone(), geometry),
            AssetKind::Video => NodeDraft::video(self.url.clone(), geometry),
        };
        draft.with_asset(self.id.clone())
    }
}
