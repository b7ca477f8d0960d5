//! Atlas rectangle packing
//!
//! Skyline bottom-left packing: the packed area is described by a
//! "skyline" of horizontal segments; each rectangle goes to the position
//! with the lowest resulting top edge; ties go to the least wasted area
//! beneath it, then the leftmost. Rectangles are packed tallest first.
//! The target is width-constrained; height only has a ceiling.

use log::{debug, warn};

use super::metadata::Glyph;
use crate::constants::{ATLAS_MAX_HEIGHT, ATLAS_WIDTHS, ATLAS_WIDTH_THRESHOLD, GLYPH_PADDING};

/// Rectangle to place in the atlas
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PackRect {
    /// Caller-defined identifier (glyph index)
    pub id: usize,
    pub width: u32,
    pub height: u32,
    /// Set once the rectangle has a position
    pub packed: bool,
    pub x: u32,
    pub y: u32,
}

impl PackRect {
    pub fn new(id: usize, width: u32, height: u32) -> Self {
        Self {
            id,
            width,
            height,
            ..Self::default()
        }
    }

    /// Bottom edge (exclusive)
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// True if the two rectangles share any pixel
    pub fn overlaps(&self, other: &PackRect) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

/// One skyline segment, spanning from `x` to the next node (or the atlas edge)
#[derive(Debug, Clone, Copy)]
struct SkylineNode {
    x: u32,
    y: u32,
}

/// Skyline bottom-left packer
pub struct SkylinePacker {
    width: u32,
    height: u32,
    nodes: Vec<SkylineNode>,
}

impl SkylinePacker {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            nodes: vec![SkylineNode { x: 0, y: 0 }],
        }
    }

    /// Right edge of skyline node `i`
    fn node_end(&self, i: usize) -> u32 {
        self.nodes.get(i + 1).map_or(self.width, |n| n.x)
    }

    /// Lowest y at which a `width` wide rectangle fits starting at node `i`,
    /// with the area left empty beneath it
    fn fit_y(&self, i: usize, width: u32) -> (u32, u64) {
        let end = self.nodes[i].x + width;
        let mut y = 0;
        let mut visited = 0;
        let mut waste = 0u64;

        for j in i..self.nodes.len() {
            let node = self.nodes[j];
            if node.x >= end {
                break;
            }
            let span = self.node_end(j) - node.x;
            if node.y > y {
                // Everything visited so far now sits below the new floor
                waste += visited as u64 * (node.y - y) as u64;
                y = node.y;
            } else {
                let under = span.min(width - visited);
                waste += under as u64 * (y - node.y) as u64;
            }
            visited += span;
        }
        (y, waste)
    }

    /// Best (node index, y) for a rectangle, if any position is inside the target
    ///
    /// Lowest y wins; ties go to the least wasted area, then the leftmost node.
    fn find_position(&self, width: u32, height: u32) -> Option<(usize, u32)> {
        if width > self.width {
            return None;
        }

        let mut best: Option<(usize, u32, u64)> = None;
        for i in 0..self.nodes.len() {
            if self.nodes[i].x + width > self.width {
                break;
            }
            let (y, waste) = self.fit_y(i, width);
            let better = best.map_or(true, |(_, best_y, best_waste)| {
                y < best_y || (y == best_y && waste < best_waste)
            });
            if better {
                best = Some((i, y, waste));
            }
        }

        best.map(|(i, y, _)| (i, y))
            .filter(|&(_, y)| y + height <= self.height)
    }

    /// Raise the skyline over `[x, x + width)` to `top`
    fn place(&mut self, i: usize, width: u32, top: u32) {
        let x = self.nodes[i].x;
        let end = x + width;

        // Nodes fully covered by the new segment
        let mut covered = i;
        while covered < self.nodes.len() && self.node_end(covered) <= end {
            covered += 1;
        }
        // The first partially covered node now starts where the segment ends
        if covered < self.nodes.len() {
            self.nodes[covered].x = self.nodes[covered].x.max(end);
        }
        self.nodes.splice(i..covered, [SkylineNode { x, y: top }]);

        // Merge neighbours at the same height
        self.nodes.dedup_by(|next, prev| next.y == prev.y);
    }

    /// Pack one rectangle; returns its position
    pub fn insert(&mut self, width: u32, height: u32) -> Option<(u32, u32)> {
        let (i, y) = self.find_position(width, height)?;
        let x = self.nodes[i].x;
        if width > 0 {
            self.place(i, width, y + height);
        }
        Some((x, y))
    }

    /// Pack all rectangles, tallest first
    ///
    /// Rectangles keep their order; each is either marked packed with a
    /// position, or left unpacked. Returns the number packed.
    pub fn pack(&mut self, rects: &mut [PackRect]) -> usize {
        let mut order: Vec<usize> = (0..rects.len()).collect();
        order.sort_by(|&a, &b| {
            rects[b]
                .height
                .cmp(&rects[a].height)
                .then(rects[b].width.cmp(&rects[a].width))
        });

        let mut packed = 0;
        for index in order {
            let rect = &mut rects[index];
            match self.insert(rect.width, rect.height) {
                Some((x, y)) => {
                    rect.x = x;
                    rect.y = y;
                    rect.packed = true;
                    packed += 1;
                }
                None => {
                    rect.packed = false;
                }
            }
        }
        packed
    }
}

/// Pick the atlas width for an estimated total surface
///
/// The estimated square side is `sqrt(total_area) + 1`. A candidate width is
/// selected once the side reaches 70% of it; the largest such candidate wins.
pub fn choose_atlas_width(total_area: u64) -> u32 {
    let side = (total_area as f64).sqrt() as u32 + 1;

    ATLAS_WIDTHS
        .iter()
        .rev()
        .copied()
        .find(|&candidate| side as f32 >= candidate as f32 * ATLAS_WIDTH_THRESHOLD)
        .unwrap_or(ATLAS_WIDTHS[0])
}

/// Result of packing a font's glyphs
#[derive(Debug, Clone)]
pub struct PackResult {
    pub width: u32,
    /// Bottom of the lowest packed rectangle
    pub height: u32,
    /// One rectangle per glyph, in glyph order
    pub rects: Vec<PackRect>,
}

impl PackResult {
    pub fn unpacked(&self) -> impl Iterator<Item = &PackRect> {
        self.rects.iter().filter(|r| !r.packed)
    }
}

/// Pack every glyph as a `(width + 2) x (font_size + 2)` rectangle
pub fn pack_glyphs(glyphs: &[Glyph], font_size: u32) -> PackResult {
    let mut rects: Vec<PackRect> = glyphs
        .iter()
        .enumerate()
        .map(|(i, g)| PackRect::new(i, g.width as u32 + GLYPH_PADDING, font_size + GLYPH_PADDING))
        .collect();

    let total_area: u64 = rects
        .iter()
        .map(|r| r.width as u64 * r.height as u64)
        .sum();
    let width = choose_atlas_width(total_area);

    let mut packer = SkylinePacker::new(width, ATLAS_MAX_HEIGHT);
    let packed = packer.pack(&mut rects);

    let height = rects
        .iter()
        .filter(|r| r.packed)
        .map(PackRect::bottom)
        .max()
        .unwrap_or(0);

    debug!(
        "Packed {}/{} glyphs into {}x{} (surface {})",
        packed,
        rects.len(),
        width,
        height,
        total_area
    );

    for rect in rects.iter().filter(|r| !r.packed) {
        warn!(
            "Glyph U+{:04X} does not fit in the atlas ({}x{}), skipped",
            glyphs[rect.id].codepoint, rect.width, rect.height
        );
    }

    PackResult {
        width,
        height,
        rects,
    }
}
