// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Bounding Volume Hierarchy (BVH) for spatial acceleration
//! Used as the broad phase of the pairwise self-intersection check

use super::BoundingBox;
use std::cmp::Ordering;

/// BVH node
#[derive(Debug, Clone)]
pub struct BVHNode {
    /// Bounding box of this node
    pub bbox: BoundingBox,
    /// Left child (None for leaf)
    pub left: Option<Box<BVHNode>>,
    /// Right child (None for leaf)
    pub right: Option<Box<BVHNode>>,
    /// Item indices (only for leaf nodes)
    pub items: Vec<usize>,
}

impl BVHNode {
    fn leaf(bbox: BoundingBox, items: Vec<usize>) -> Self {
        Self {
            bbox,
            left: None,
            right: None,
            items,
        }
    }

    fn internal(bbox: BoundingBox, left: Box<BVHNode>, right: Box<BVHNode>) -> Self {
        Self {
            bbox,
            left: Some(left),
            right: Some(right),
            items: Vec::new(),
        }
    }

    /// Check if this is a leaf node
    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

/// Bounding Volume Hierarchy over boxed items (cells, usually)
#[derive(Debug, Clone)]
pub struct BVH {
    root: BVHNode,
}

impl BVH {
    const MAX_DEPTH: usize = 32;
    const LEAF_SIZE: usize = 4;

    /// Build BVH from (item index, bbox) pairs
    pub fn build(items: Vec<(usize, BoundingBox)>) -> Self {
        if items.is_empty() {
            return Self {
                root: BVHNode::leaf(BoundingBox::empty(), Vec::new()),
            };
        }

        Self {
            root: Self::build_recursive(items, 0),
        }
    }

    fn build_recursive(mut items: Vec<(usize, BoundingBox)>, depth: usize) -> BVHNode {
        let bbox = items
            .iter()
            .fold(BoundingBox::empty(), |acc, (_, b)| acc.union(b));

        if items.len() <= Self::LEAF_SIZE || depth >= Self::MAX_DEPTH {
            let indices = items.iter().map(|(idx, _)| *idx).collect();
            return BVHNode::leaf(bbox, indices);
        }

        // Split along the longest axis at the median centroid
        let size = bbox.size();
        let axis = if size.x >= size.y && size.x >= size.z {
            0
        } else if size.y >= size.z {
            1
        } else {
            2
        };

        items.sort_by(|(_, a), (_, b)| {
            a.center()[axis]
                .partial_cmp(&b.center()[axis])
                .unwrap_or(Ordering::Equal)
        });

        let right_items = items.split_off(items.len() / 2);
        let left = Box::new(Self::build_recursive(items, depth + 1));
        let right = Box::new(Self::build_recursive(right_items, depth + 1));

        BVHNode::internal(bbox, left, right)
    }

    /// Items whose box overlaps the query box
    pub fn query(&self, bbox: &BoundingBox) -> Vec<usize> {
        let mut result = Vec::new();
        Self::query_recursive(&self.root, bbox, &mut result);
        result
    }

    fn query_recursive(node: &BVHNode, bbox: &BoundingBox, result: &mut Vec<usize>) {
        if !node.bbox.overlaps(bbox) {
            return;
        }

        if node.is_leaf() {
            result.extend_from_slice(&node.items);
            return;
        }

        if let Some(ref left) = node.left {
            Self::query_recursive(left, bbox, result);
        }
        if let Some(ref right) = node.right {
            Self::query_recursive(right, bbox, result);
        }
    }

    #[cfg(test)]
    pub fn root(&self) -> &BVHNode {
        &self.root
    }
}
