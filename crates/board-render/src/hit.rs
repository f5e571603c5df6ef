//! Hit testing: point / rectangle → node lookup.
//!
//! Walks the nodes in paint order back-to-front (last painted = topmost)
//! and honors node rotation.

use board_core::kurbo::{Point, Rect};
use board_core::{Node, NodeId, paint_order};

/// Find the topmost node at document position `p`.
/// Returns `None` if only the background is hit.
pub fn hit_test(nodes: &[Node], p: Point) -> Option<NodeId> {
    paint_order(nodes)
        .into_iter()
        .rev()
        .find(|n| n.contains(p))
        .map(|n| n.id)
}

/// All nodes whose rotated bounding box intersects `rect`, in paint order.
/// Used for marquee (rubber-band) selection.
pub fn hit_test_rect(nodes: &[Node], rect: Rect) -> Vec<NodeId> {
    let rect = rect.abs();
    paint_order(nodes)
        .into_iter()
        .filter(|n| {
            let b = n.bounds();
            b.x0 < rect.x1 && b.x1 > rect.x0 && b.y0 < rect.y1 && b.y1 > rect.y0
        })
        .map(|n| n.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use board_core::{Geometry, NodeDraft};

    fn node(name: &str, x: f64, y: f64, w: f64, h: f64, z: i64) -> Node {
        NodeDraft::image("https://cdn.test/x.png", Geometry::new(x, y, w, h))
            .into_node(NodeId::intern(name), z)
    }

    #[test]
    fn topmost_wins() {
        let nodes = vec![
            node("below", 0.0, 0.0, 100.0, 100.0, 0),
            node("above", 50.0, 50.0, 100.0, 100.0, 1),
        ];
        assert_eq!(hit_test(&nodes, Point::new(75.0, 75.0)), Some(NodeId::intern("above")));
        assert_eq!(hit_test(&nodes, Point::new(10.0, 10.0)), Some(NodeId::intern("below")));
        assert_eq!(hit_test(&nodes, Point::new(500.0, 500.0)), None);
    }

    #[test]
    fn z_index_beats_collection_position() {
        let nodes = vec![
            node("raised", 0.0, 0.0, 100.0, 100.0, 5),
            node("lowered", 0.0, 0.0, 100.0, 100.0, 1),
        ];
        assert_eq!(hit_test(&nodes, Point::new(50.0, 50.0)), Some(NodeId::intern("raised")));
        let hits = hit_test_rect(&nodes, Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(hits, vec![NodeId::intern("lowered"), NodeId::intern("raised")]);
    }

    #[test]
    fn marquee_collects_intersecting_in_paint_order() {
        let nodes = vec![
            node("a", 0.0, 0.0, 10.0, 10.0, 0),
            node("far", 1000.0, 1000.0, 10.0, 10.0, 1),
            node("b", 20.0, 0.0, 10.0, 10.0, 2),
        ];
        // Dragged right-to-left: rect is normalized.
        let hits = hit_test_rect(&nodes, Rect::new(25.0, 15.0, 5.0, -5.0));
        assert_eq!(hits, vec![NodeId::intern("a"), NodeId::intern("b")]);
    }

    #[test]
    fn rotated_node_is_hit_where_it_is_drawn() {
        let mut n = node("rot", 0.0, 0.0, 100.0, 20.0, 0);
        n.rotation = 90.0;
        let nodes = vec![n];
        assert_eq!(hit_test(&nodes, Point::new(-10.0, 50.0)), Some(NodeId::intern("rot")));
        assert_eq!(hit_test(&nodes, Point::new(50.0, 10.0)), None);
    }
}
