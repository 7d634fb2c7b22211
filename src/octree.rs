use crate::geometry::Bounds;
use crate::math::{Point3, Vector3};

/// Number of items a node may hold before it subdivides.
pub const MAX_ITEMS_PER_NODE: usize = 8;

/// Maximum subdivision depth of the tree.
pub const MAX_DEPTH: usize = 8;

/// An octree mapping bounding boxes to items.
///
/// Items whose bounds straddle a child boundary stay at the internal node,
/// so queries never miss an item at the cost of some over-reporting. Both
/// queries return coarse candidate sets; callers do their own exact tests.
#[derive(Debug)]
pub struct Octree<T> {
    root: Node<T>,
    bounds: Bounds,
    len: usize,
}

#[derive(Debug)]
struct Node<T> {
    items: Vec<(T, Bounds)>,
    children: Option<Box<[Node<T>; 8]>>,
}

impl<T> Node<T> {
    fn empty() -> Self {
        Self {
            items: Vec::new(),
            children: None,
        }
    }
}

impl<T> Octree<T> {
    /// Creates an empty tree covering the given region.
    ///
    /// Items outside the region are accepted but accumulate at the root.
    #[must_use]
    pub fn new(bounds: Bounds) -> Self {
        Self {
            root: Node::empty(),
            bounds,
            len: 0,
        }
    }

    /// Returns the number of items in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Checks whether the tree holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterates over all items in the tree, in no particular order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            stack: vec![&self.root],
            front: &[],
        }
    }
}

impl<T: Copy + PartialEq> Octree<T> {
    /// Inserts an item with its bounding box.
    pub fn insert(&mut self, item: T, bounds: Bounds) {
        Self::insert_into(&mut self.root, &self.bounds, 0, item, bounds);
        self.len += 1;
    }

    /// Removes an item, looked up under the same bounds it was inserted
    /// with. Returns `false` when the item is not present.
    pub fn remove(&mut self, item: &T, bounds: &Bounds) -> bool {
        if Self::remove_from(&mut self.root, &self.bounds, item, bounds) {
            self.len -= 1;
            true
        } else {
            false
        }
    }

    /// Collects all items whose bounds overlap the query box.
    #[must_use]
    pub fn search_bounds(&self, query: &Bounds) -> Vec<T> {
        let mut found = Vec::new();
        Self::search_node(&self.root, &self.bounds, query, &mut found);
        found
    }

    /// Collects all items whose bounds lie along the ray.
    #[must_use]
    pub fn along_ray(&self, origin: &Point3, direction: &Vector3) -> Vec<T> {
        let mut found = Vec::new();
        Self::ray_node(&self.root, &self.bounds, origin, direction, &mut found);
        found
    }

    fn insert_into(node: &mut Node<T>, node_bounds: &Bounds, depth: usize, item: T, bounds: Bounds) {
        if let Some(children) = node.children.as_deref_mut() {
            if let Some(octant) = octant_containing(node_bounds, &bounds) {
                let child = child_bounds(node_bounds, octant);
                Self::insert_into(&mut children[octant], &child, depth + 1, item, bounds);
            } else {
                node.items.push((item, bounds));
            }
            return;
        }

        node.items.push((item, bounds));
        if node.items.len() > MAX_ITEMS_PER_NODE && depth < MAX_DEPTH {
            Self::subdivide(node, node_bounds, depth);
        }
    }

    fn subdivide(node: &mut Node<T>, node_bounds: &Bounds, depth: usize) {
        let mut children: Box<[Node<T>; 8]> = Box::new(std::array::from_fn(|_| Node::empty()));
        for (item, bounds) in std::mem::take(&mut node.items) {
            if let Some(octant) = octant_containing(node_bounds, &bounds) {
                let child = child_bounds(node_bounds, octant);
                Self::insert_into(&mut children[octant], &child, depth + 1, item, bounds);
            } else {
                node.items.push((item, bounds));
            }
        }
        node.children = Some(children);
    }

    fn remove_from(node: &mut Node<T>, node_bounds: &Bounds, item: &T, bounds: &Bounds) -> bool {
        if let Some(at) = node.items.iter().position(|(held, _)| held == item) {
            node.items.swap_remove(at);
            return true;
        }
        if let Some(children) = node.children.as_deref_mut() {
            if let Some(octant) = octant_containing(node_bounds, bounds) {
                let child = child_bounds(node_bounds, octant);
                return Self::remove_from(&mut children[octant], &child, item, bounds);
            }
        }
        false
    }

    fn search_node(node: &Node<T>, node_bounds: &Bounds, query: &Bounds, found: &mut Vec<T>) {
        for (item, bounds) in &node.items {
            if bounds.overlaps(query) {
                found.push(*item);
            }
        }
        if let Some(children) = node.children.as_deref() {
            for (octant, child) in children.iter().enumerate() {
                let child_box = child_bounds(node_bounds, octant);
                if child_box.overlaps(query) {
                    Self::search_node(child, &child_box, query, found);
                }
            }
        }
    }

    fn ray_node(
        node: &Node<T>,
        node_bounds: &Bounds,
        origin: &Point3,
        direction: &Vector3,
        found: &mut Vec<T>,
    ) {
        for (item, bounds) in &node.items {
            if bounds.intersects_ray(origin, direction) {
                found.push(*item);
            }
        }
        if let Some(children) = node.children.as_deref() {
            for (octant, child) in children.iter().enumerate() {
                let child_box = child_bounds(node_bounds, octant);
                if child_box.intersects_ray(origin, direction) {
                    Self::ray_node(child, &child_box, origin, direction, found);
                }
            }
        }
    }
}

/// Iterator over all items of an [`Octree`].
#[derive(Debug)]
pub struct Iter<'a, T> {
    stack: Vec<&'a Node<T>>,
    front: &'a [(T, Bounds)],
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(((item, _), rest)) = self.front.split_first() {
                self.front = rest;
                return Some(item);
            }
            let node = self.stack.pop()?;
            if let Some(children) = node.children.as_deref() {
                self.stack.extend(children.iter());
            }
            self.front = &node.items;
        }
    }
}

/// Determines which child octant fully contains `bounds`, or `None` when it
/// straddles a splitting plane or exceeds the node. Octant bits: 1 = high x,
/// 2 = high y, 4 = high z.
fn octant_containing(node_bounds: &Bounds, bounds: &Bounds) -> Option<usize> {
    if !node_bounds.contains(bounds) {
        return None;
    }
    let center = node_bounds.center();
    let mut octant = 0;
    for i in 0..3 {
        if bounds.min()[i] >= center[i] {
            octant |= 1 << i;
        } else if bounds.max()[i] > center[i] {
            return None;
        }
    }
    Some(octant)
}

fn child_bounds(node_bounds: &Bounds, octant: usize) -> Bounds {
    let center = node_bounds.center();
    let mut min = *node_bounds.min();
    let mut max = *node_bounds.max();
    for i in 0..3 {
        if octant & (1 << i) == 0 {
            max[i] = center[i];
        } else {
            min[i] = center[i];
        }
    }
    Bounds::new(min, max)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn region() -> Bounds {
        Bounds::new(p(0.0, 0.0, 0.0), p(10.0, 10.0, 10.0))
    }

    fn cell(x: f64, y: f64, z: f64) -> Bounds {
        Bounds::new(p(x, y, z), p(x + 0.5, y + 0.5, z + 0.5))
    }

    #[test]
    fn search_finds_inserted_items() {
        let mut tree = Octree::new(region());
        tree.insert(1_usize, cell(1.0, 1.0, 1.0));
        tree.insert(2_usize, cell(8.0, 8.0, 8.0));

        let found = tree.search_bounds(&cell(0.8, 0.8, 0.8));
        assert_eq!(found, vec![1]);
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn subdivision_preserves_items() {
        let mut tree = Octree::new(region());
        for i in 0..32 {
            let offset = f64::from(i) * 0.3;
            tree.insert(i, cell(offset, offset, offset));
        }
        assert_eq!(tree.len(), 32);
        assert_eq!(tree.iter().count(), 32);

        // Every item is still findable after the root split.
        for i in 0..32 {
            let offset = f64::from(i) * 0.3;
            assert!(
                tree.search_bounds(&cell(offset, offset, offset)).contains(&i),
                "item {i} lost after subdivision"
            );
        }
    }

    #[test]
    fn straddling_items_are_found_from_both_sides() {
        let mut tree = Octree::new(region());
        // Spans the x = 5 splitting plane.
        tree.insert(7_u32, Bounds::new(p(4.0, 1.0, 1.0), p(6.0, 2.0, 2.0)));
        for i in 0..16_u32 {
            let offset = f64::from(i) * 0.4;
            tree.insert(100 + i, cell(offset, 5.0, 5.0));
        }

        assert!(tree.search_bounds(&cell(4.0, 1.0, 1.0)).contains(&7));
        assert!(tree.search_bounds(&cell(5.5, 1.5, 1.5)).contains(&7));
    }

    #[test]
    fn remove_makes_items_unfindable() {
        let mut tree = Octree::new(region());
        let bounds = cell(3.0, 3.0, 3.0);
        tree.insert(42_usize, bounds);
        assert!(tree.remove(&42, &bounds));
        assert!(!tree.remove(&42, &bounds));
        assert!(tree.search_bounds(&bounds).is_empty());
        assert!(tree.is_empty());
    }

    #[test]
    fn ray_reports_items_along_it() {
        let mut tree = Octree::new(region());
        tree.insert(1_usize, cell(5.0, 5.0, 1.0));
        tree.insert(2_usize, cell(5.0, 5.0, 9.0));
        tree.insert(3_usize, cell(1.0, 1.0, 5.0));

        let hits = tree.along_ray(&p(5.2, 5.2, 0.0), &Vector3::new(0.0, 0.0, 1.0));
        assert!(hits.contains(&1));
        assert!(hits.contains(&2));
        assert!(!hits.contains(&3));
    }

    #[test]
    fn items_outside_the_region_are_still_found() {
        let mut tree = Octree::new(region());
        let outside = cell(14.0, 14.0, 14.0);
        tree.insert(9_usize, outside);
        assert_eq!(tree.search_bounds(&outside), vec![9]);
    }

    fn arb_box() -> impl Strategy<Value = Bounds> {
        (
            (0.0..9.0f64, 0.0..9.0f64, 0.0..9.0f64),
            (0.1..1.0f64, 0.1..1.0f64, 0.1..1.0f64),
        )
            .prop_map(|((x, y, z), (dx, dy, dz))| {
                Bounds::new(p(x, y, z), p(x + dx, y + dy, z + dz))
            })
    }

    proptest! {
        // Compare tree queries against a linear scan over the same items.
        #[test]
        fn search_matches_linear_scan(
            boxes in proptest::collection::vec(arb_box(), 0..64),
            query in arb_box(),
        ) {
            let mut tree = Octree::new(region());
            for (i, bounds) in boxes.iter().enumerate() {
                tree.insert(i, *bounds);
            }

            let mut found = tree.search_bounds(&query);
            found.sort_unstable();

            let expected: Vec<usize> = boxes
                .iter()
                .enumerate()
                .filter(|(_, b)| b.overlaps(&query))
                .map(|(i, _)| i)
                .collect();

            prop_assert_eq!(found, expected);
        }

        #[test]
        fn ray_results_cover_the_linear_scan(
            boxes in proptest::collection::vec(arb_box(), 0..64),
            ox in 0.0..10.0f64,
            oy in 0.0..10.0f64,
        ) {
            let mut tree = Octree::new(region());
            for (i, bounds) in boxes.iter().enumerate() {
                tree.insert(i, *bounds);
            }

            let origin = p(ox, oy, -1.0);
            let direction = Vector3::new(0.1, -0.05, 1.0);
            let found = tree.along_ray(&origin, &direction);

            // The tree may over-report, but must never miss a hit.
            for (i, bounds) in boxes.iter().enumerate() {
                if bounds.intersects_ray(&origin, &direction) {
                    prop_assert!(found.contains(&i), "missed item {}", i);
                }
            }
        }

        #[test]
        fn remove_then_search_is_consistent(
            boxes in proptest::collection::vec(arb_box(), 1..32),
            keep in 0.0..1.0f64,
        ) {
            let mut tree = Octree::new(region());
            for (i, bounds) in boxes.iter().enumerate() {
                tree.insert(i, *bounds);
            }

            #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let cutoff = (boxes.len() as f64 * keep) as usize;
            for (i, bounds) in boxes.iter().enumerate().skip(cutoff) {
                prop_assert!(tree.remove(&i, bounds));
            }

            prop_assert_eq!(tree.len(), cutoff);
            let everything = tree.search_bounds(&region());
            for (i, _) in boxes.iter().enumerate() {
                prop_assert_eq!(everything.contains(&i), i < cutoff);
            }
        }
    }
}
