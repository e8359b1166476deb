//! Visual line heights and collapsed line sections.
//!
//! [`HeightTree`] mirrors the document's lines in an implicit treap (ordered by line number,
//! balanced by random priorities). Every node carries the line height plus the number of
//! collapsed sections covering the line; collapse counts are applied to whole subtrees lazily,
//! so collapsing or uncollapsing a range is O(log n) regardless of its size.
//!
//! Each subtree caches the smallest collapse count found in it and the summed height of the
//! lines that have that count. A subtree's visible height is that sum when the minimum is zero,
//! and zero otherwise, which gives O(log n) visual positions and hit testing.

use crate::error::{DocumentError, DocumentResult};
use tracing::{debug, trace};

type Link = Option<Box<Node>>;

#[derive(Debug)]
struct Node {
    height: f64,
    /// Sections covering this line, excluding lazy deltas still pending on ancestors.
    collapsed: i32,
    /// Delta not yet pushed to the children.
    pending: i32,
    size: usize,
    min_collapsed: i32,
    /// Summed height of the subtree lines whose count equals `min_collapsed`.
    min_height: f64,
    priority: u64,
    left: Link,
    right: Link,
}

impl Node {
    fn new(height: f64, collapsed: i32, priority: u64) -> Box<Self> {
        Box::new(Self {
            height,
            collapsed,
            pending: 0,
            size: 1,
            min_collapsed: collapsed,
            min_height: height,
            priority,
            left: None,
            right: None,
        })
    }
}

fn size(link: &Link) -> usize {
    link.as_ref().map_or(0, |node| node.size)
}

/// Visible height of a subtree, given the deltas pending on its ancestors.
fn visible_height(link: &Link, acc: i32) -> f64 {
    match link {
        Some(node) if node.min_collapsed + acc == 0 => node.min_height,
        _ => 0.0,
    }
}

fn has_uncollapsed(link: &Link, acc: i32) -> bool {
    link.as_ref()
        .is_some_and(|node| node.min_collapsed + acc == 0)
}

fn apply(node: &mut Node, delta: i32) {
    node.collapsed += delta;
    node.min_collapsed += delta;
    node.pending += delta;
}

fn push_down(node: &mut Node) {
    if node.pending == 0 {
        return;
    }
    let delta = node.pending;
    if let Some(left) = node.left.as_mut() {
        apply(left, delta);
    }
    if let Some(right) = node.right.as_mut() {
        apply(right, delta);
    }
    node.pending = 0;
}

fn update(node: &mut Node) {
    node.size = 1 + size(&node.left) + size(&node.right);
    let mut min = node.collapsed;
    let mut sum = node.height;
    for child in [&node.left, &node.right].into_iter().flatten() {
        let child_min = child.min_collapsed + node.pending;
        if child_min < min {
            min = child_min;
            sum = child.min_height;
        } else if child_min == min {
            sum += child.min_height;
        }
    }
    node.min_collapsed = min;
    node.min_height = sum;
}

/// Split into the first `k` lines and the rest.
fn split(link: Link, k: usize) -> (Link, Link) {
    let Some(mut node) = link else {
        return (None, None);
    };
    push_down(&mut node);
    let left_size = size(&node.left);
    if k <= left_size {
        let (first, rest) = split(node.left.take(), k);
        node.left = rest;
        update(&mut node);
        (first, Some(node))
    } else {
        let (first, rest) = split(node.right.take(), k - left_size - 1);
        node.right = first;
        update(&mut node);
        (Some(node), rest)
    }
}

fn merge(a: Link, b: Link) -> Link {
    match (a, b) {
        (None, b) => b,
        (a, None) => a,
        (Some(mut a), Some(mut b)) => {
            if a.priority >= b.priority {
                push_down(&mut a);
                a.right = merge(a.right.take(), Some(b));
                update(&mut a);
                Some(a)
            } else {
                push_down(&mut b);
                b.left = merge(Some(a), b.left.take());
                update(&mut b);
                Some(b)
            }
        }
    }
}

fn set_height_at(node: &mut Node, index: usize, height: f64) {
    push_down(node);
    let left_size = size(&node.left);
    if index < left_size {
        if let Some(left) = node.left.as_mut() {
            set_height_at(left, index, height);
        }
    } else if index == left_size {
        node.height = height;
    } else if let Some(right) = node.right.as_mut() {
        set_height_at(right, index - left_size - 1, height);
    }
    update(node);
}

fn collect_uncollapsed(link: &Link, acc: i32, base: usize, out: &mut Vec<usize>) {
    let Some(node) = link else {
        return;
    };
    if node.min_collapsed + acc != 0 {
        return;
    }
    let child_acc = acc + node.pending;
    collect_uncollapsed(&node.left, child_acc, base, out);
    let index = base + size(&node.left);
    if node.collapsed + acc == 0 {
        out.push(index + 1);
    }
    collect_uncollapsed(&node.right, child_acc, index + 1, out);
}

/// Handle to a collapsed range of lines, returned by [`HeightTree::collapse`].
///
/// The handle stays valid until [`HeightTree::uncollapse`] is called or until every line of
/// the section has been deleted; afterwards it reports as not collapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CollapsedLineSection {
    slot: usize,
    generation: u32,
}

#[derive(Debug, Clone)]
struct SectionSlot {
    generation: u32,
    /// 1-based inclusive line range, `None` once the section ended.
    range: Option<(usize, usize)>,
}

/// Weighted line tree with collapsible sections.
///
/// Lines are addressed by 1-based line numbers.
///
/// # Example
///
/// ```rust
/// use document_core::HeightTree;
///
/// let mut tree = HeightTree::new(10, 1.0);
/// tree.set_height(3, 2.5).unwrap();
/// let section = tree.collapse(4, 6).unwrap();
/// assert_eq!(tree.total_height(), 8.5);
/// assert_eq!(tree.visual_position(7).unwrap(), 3.5);
/// assert!(tree.is_collapsed(5).unwrap());
///
/// tree.uncollapse(section).unwrap();
/// assert_eq!(tree.total_height(), 11.5);
/// ```
#[derive(Debug)]
pub struct HeightTree {
    root: Link,
    default_height: f64,
    sections: Vec<SectionSlot>,
    free_sections: Vec<usize>,
    rng_state: u64,
}

impl HeightTree {
    /// Create a tree with `line_count` lines of `default_height`.
    pub fn new(line_count: usize, default_height: f64) -> Self {
        let mut tree = Self {
            root: None,
            default_height: sanitize_height(default_height),
            sections: Vec::new(),
            free_sections: Vec::new(),
            rng_state: 0x9E37_79B9_7F4A_7C15,
        };
        tree.rebuild(line_count);
        tree
    }

    /// Drop all lines and sections and start over with `line_count` default-height lines.
    ///
    /// Every outstanding [`CollapsedLineSection`] reports as not collapsed afterwards.
    pub fn rebuild(&mut self, line_count: usize) {
        self.end_all_sections();
        let mut root = None;
        for _ in 0..line_count {
            let node = Node::new(self.default_height, 0, self.next_priority());
            root = merge(root, Some(node));
        }
        self.root = root;
        debug!(line_count, "height tree rebuilt");
    }

    fn next_priority(&mut self) -> u64 {
        // xorshift64*
        let mut x = self.rng_state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.rng_state = x;
        x.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }

    /// Height given to lines created by [`HeightTree::insert_line_after`].
    pub fn default_height(&self) -> f64 {
        self.default_height
    }

    /// Change the height given to new lines. Existing lines keep their height.
    pub fn set_default_height(&mut self, height: f64) -> DocumentResult<()> {
        self.default_height = checked_height(height)?;
        Ok(())
    }

    /// Number of lines.
    pub fn line_count(&self) -> usize {
        size(&self.root)
    }

    /// Sum of the heights of all lines that are not collapsed.
    pub fn total_height(&self) -> f64 {
        visible_height(&self.root, 0)
    }

    fn check_line(&self, line: usize) -> DocumentResult<usize> {
        let line_count = self.line_count();
        if line == 0 || line > line_count {
            return Err(DocumentError::LineNumberOutOfRange { line, line_count });
        }
        Ok(line - 1)
    }

    /// Walk to the node at `index`, returning it together with its collapse count.
    fn node_at(&self, mut index: usize) -> Option<(&Node, i32)> {
        let mut link = &self.root;
        let mut acc = 0;
        while let Some(node) = link {
            let left_size = size(&node.left);
            if index < left_size {
                acc += node.pending;
                link = &node.left;
            } else if index == left_size {
                return Some((node, node.collapsed + acc));
            } else {
                index -= left_size + 1;
                acc += node.pending;
                link = &node.right;
            }
        }
        None
    }

    /// Height of a line, whether or not it is collapsed.
    pub fn height(&self, line: usize) -> DocumentResult<f64> {
        let index = self.check_line(line)?;
        Ok(self.node_at(index).map_or(0.0, |(node, _)| node.height))
    }

    /// Set the height of a line.
    pub fn set_height(&mut self, line: usize, height: f64) -> DocumentResult<()> {
        let index = self.check_line(line)?;
        let height = checked_height(height)?;
        if let Some(root) = self.root.as_mut() {
            set_height_at(root, index, height);
        }
        trace!(line, height, "line height changed");
        Ok(())
    }

    /// Returns `true` if at least one active section covers the line.
    pub fn is_collapsed(&self, line: usize) -> DocumentResult<bool> {
        let index = self.check_line(line)?;
        Ok(self.node_at(index).is_some_and(|(_, count)| count > 0))
    }

    /// Sum of the heights of all non-collapsed lines before `line`.
    pub fn visual_position(&self, line: usize) -> DocumentResult<f64> {
        let mut index = self.check_line(line)?;
        let mut position = 0.0;
        let mut link = &self.root;
        let mut acc = 0;
        while let Some(node) = link {
            let left_size = size(&node.left);
            let child_acc = acc + node.pending;
            if index < left_size {
                link = &node.left;
            } else {
                position += visible_height(&node.left, child_acc);
                if index == left_size {
                    break;
                }
                if node.collapsed + acc == 0 {
                    position += node.height;
                }
                index -= left_size + 1;
                link = &node.right;
            }
            acc = child_acc;
        }
        Ok(position)
    }

    /// Line at the visual position `y`.
    ///
    /// Collapsed lines are never returned unless every line is collapsed. Positions before the
    /// first line map to the first visible line, positions past the end to the last visible one.
    pub fn line_by_visual_position(&self, y: f64) -> usize {
        let mut remaining = if y.is_nan() { 0.0 } else { y.max(0.0) };
        let mut link = &self.root;
        let mut acc = 0;
        let mut base = 0;
        while let Some(node) = link {
            let child_acc = acc + node.pending;
            let left_visible = visible_height(&node.left, child_acc);
            if remaining < left_visible {
                link = &node.left;
            } else {
                remaining -= left_visible;
                let own = if node.collapsed + acc == 0 {
                    node.height
                } else {
                    0.0
                };
                let index = base + size(&node.left);
                if remaining < own {
                    return index + 1;
                }
                remaining -= own;
                base = index + 1;
                link = &node.right;
            }
            acc = child_acc;
        }
        self.last_uncollapsed_line()
            .unwrap_or_else(|| self.line_count().max(1))
    }

    fn last_uncollapsed_line(&self) -> Option<usize> {
        let mut link = &self.root;
        let mut acc = 0;
        let mut base = 0;
        let mut found = None;
        while let Some(node) = link {
            if node.min_collapsed + acc != 0 {
                break;
            }
            let child_acc = acc + node.pending;
            let index = base + size(&node.left);
            if has_uncollapsed(&node.right, child_acc) {
                base = index + 1;
                link = &node.right;
            } else if node.collapsed + acc == 0 {
                found = Some(index + 1);
                break;
            } else {
                link = &node.left;
            }
            acc = child_acc;
        }
        found
    }

    /// Line numbers of all lines that are not collapsed, in document order.
    pub fn visible_lines(&self) -> Vec<usize> {
        let mut out = Vec::new();
        collect_uncollapsed(&self.root, 0, 0, &mut out);
        out
    }

    fn add_collapsed(&mut self, first_index: usize, count: usize, delta: i32) {
        let root = self.root.take();
        let (before, rest) = split(root, first_index);
        let (mut middle, after) = split(rest, count);
        if let Some(node) = middle.as_mut() {
            apply(node, delta);
        }
        self.root = merge(merge(before, middle), after);
    }

    /// Collapse the lines `start..=end`.
    ///
    /// Sections may overlap; a line stays collapsed as long as any section covers it.
    pub fn collapse(&mut self, start: usize, end: usize) -> DocumentResult<CollapsedLineSection> {
        let first = self.check_line(start)?;
        self.check_line(end)?;
        if start > end {
            return Err(DocumentError::InvalidLineRange { start, end });
        }
        self.add_collapsed(first, end - start + 1, 1);

        let slot = match self.free_sections.pop() {
            Some(slot) => {
                self.sections[slot].range = Some((start, end));
                slot
            }
            None => {
                self.sections.push(SectionSlot {
                    generation: 0,
                    range: Some((start, end)),
                });
                self.sections.len() - 1
            }
        };
        debug!(start, end, slot, "lines collapsed");
        Ok(CollapsedLineSection {
            slot,
            generation: self.sections[slot].generation,
        })
    }

    fn live_slot(&self, section: CollapsedLineSection) -> DocumentResult<Option<(usize, usize)>> {
        let slot = self
            .sections
            .get(section.slot)
            .ok_or(DocumentError::UnknownSection)?;
        if slot.generation != section.generation {
            return Ok(None);
        }
        Ok(slot.range)
    }

    /// Remove a section's contribution.
    ///
    /// Returns `false` if the section had already ended (uncollapsed before, or all of its lines
    /// were deleted).
    pub fn uncollapse(&mut self, section: CollapsedLineSection) -> DocumentResult<bool> {
        let Some((start, end)) = self.live_slot(section)? else {
            return Ok(false);
        };
        self.add_collapsed(start - 1, end - start + 1, -1);
        self.release_slot(section.slot);
        debug!(start, end, slot = section.slot, "lines uncollapsed");
        Ok(true)
    }

    fn release_slot(&mut self, slot: usize) {
        let entry = &mut self.sections[slot];
        entry.range = None;
        entry.generation = entry.generation.wrapping_add(1);
        self.free_sections.push(slot);
    }

    fn end_all_sections(&mut self) {
        for slot in 0..self.sections.len() {
            if self.sections[slot].range.is_some() {
                self.release_slot(slot);
            }
        }
    }

    /// Returns `true` while the section is active.
    pub fn is_section_collapsed(&self, section: CollapsedLineSection) -> bool {
        matches!(self.live_slot(section), Ok(Some(_)))
    }

    /// Current `(start, end)` line numbers of an active section.
    pub fn section_range(&self, section: CollapsedLineSection) -> Option<(usize, usize)> {
        self.live_slot(section).ok().flatten()
    }

    /// All active sections with their current line ranges.
    pub fn collapsed_sections(&self) -> Vec<(CollapsedLineSection, usize, usize)> {
        self.sections
            .iter()
            .enumerate()
            .filter_map(|(slot, entry)| {
                let (start, end) = entry.range?;
                let handle = CollapsedLineSection {
                    slot,
                    generation: entry.generation,
                };
                Some((handle, start, end))
            })
            .collect()
    }

    /// Insert a new default-height line directly after `line`.
    ///
    /// The new line is collapsed by every section that covers both `line` and the line after
    /// it, so text inserted inside a collapsed range stays hidden, while a section ending at
    /// `line` does not grow.
    pub fn insert_line_after(&mut self, line: usize) -> DocumentResult<()> {
        self.check_line(line)?;
        let mut covering = 0;
        for entry in &mut self.sections {
            let Some((start, end)) = entry.range.as_mut() else {
                continue;
            };
            if *start <= line && line < *end {
                covering += 1;
            }
            if *start > line {
                *start += 1;
            }
            if *end > line {
                *end += 1;
            }
        }

        let node = Node::new(self.default_height, covering, self.next_priority());
        let root = self.root.take();
        let (before, after) = split(root, line);
        self.root = merge(merge(before, Some(node)), after);
        trace!(after = line, covering, "line inserted");
        Ok(())
    }

    /// Remove `line`.
    ///
    /// A section starting or ending at the line shrinks; a section consisting only of this
    /// line ends and reports as not collapsed.
    pub fn remove_line(&mut self, line: usize) -> DocumentResult<()> {
        self.check_line(line)?;
        let mut ended = Vec::new();
        for (slot, entry) in self.sections.iter_mut().enumerate() {
            let Some((start, end)) = entry.range.as_mut() else {
                continue;
            };
            if *start == line && *end == line {
                ended.push(slot);
                continue;
            }
            if *start > line {
                *start -= 1;
            }
            if *end >= line {
                *end -= 1;
            }
        }
        for slot in ended {
            debug!(line, slot, "collapsed section ended by line removal");
            self.release_slot(slot);
        }

        let root = self.root.take();
        let (before, rest) = split(root, line - 1);
        let (_removed, after) = split(rest, 1);
        self.root = merge(before, after);
        trace!(line, "line removed");
        Ok(())
    }
}

impl Default for HeightTree {
    fn default() -> Self {
        Self::new(1, 1.0)
    }
}

fn checked_height(height: f64) -> DocumentResult<f64> {
    if height.is_nan() || height < 0.0 {
        return Err(DocumentError::InvalidHeight);
    }
    Ok(height)
}

fn sanitize_height(height: f64) -> f64 {
    checked_height(height).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collapsed_lines(tree: &HeightTree) -> Vec<usize> {
        (1..=tree.line_count())
            .filter(|&line| tree.is_collapsed(line).unwrap())
            .collect()
    }

    #[test]
    fn test_uniform_heights() {
        let tree = HeightTree::new(5, 2.0);
        assert_eq!(tree.line_count(), 5);
        assert_eq!(tree.total_height(), 10.0);
        assert_eq!(tree.visual_position(1).unwrap(), 0.0);
        assert_eq!(tree.visual_position(4).unwrap(), 6.0);
        assert_eq!(tree.line_by_visual_position(0.0), 1);
        assert_eq!(tree.line_by_visual_position(5.9), 3);
        assert_eq!(tree.line_by_visual_position(100.0), 5);
    }

    #[test]
    fn test_set_height_updates_sums() {
        let mut tree = HeightTree::new(4, 1.0);
        tree.set_height(2, 5.0).unwrap();
        assert_eq!(tree.height(2).unwrap(), 5.0);
        assert_eq!(tree.total_height(), 8.0);
        assert_eq!(tree.visual_position(3).unwrap(), 6.0);
        assert_eq!(tree.line_by_visual_position(3.0), 2);
    }

    #[test]
    fn test_invalid_arguments() {
        let mut tree = HeightTree::new(3, 1.0);
        assert_eq!(
            tree.height(0),
            Err(DocumentError::LineNumberOutOfRange {
                line: 0,
                line_count: 3
            })
        );
        assert!(tree.set_height(4, 1.0).is_err());
        assert_eq!(tree.set_height(1, -1.0), Err(DocumentError::InvalidHeight));
        assert_eq!(
            tree.collapse(3, 2),
            Err(DocumentError::InvalidLineRange { start: 3, end: 2 })
        );
    }

    #[test]
    fn test_collapse_and_uncollapse() {
        let mut tree = HeightTree::new(10, 1.0);
        let section = tree.collapse(4, 6).unwrap();
        assert_eq!(collapsed_lines(&tree), vec![4, 5, 6]);
        assert_eq!(tree.total_height(), 7.0);
        assert_eq!(tree.visual_position(7).unwrap(), 3.0);
        assert_eq!(tree.line_by_visual_position(3.5), 7);
        assert_eq!(tree.section_range(section), Some((4, 6)));

        assert!(tree.uncollapse(section).unwrap());
        assert!(collapsed_lines(&tree).is_empty());
        assert!(!tree.is_section_collapsed(section));
        assert!(!tree.uncollapse(section).unwrap());
    }

    #[test]
    fn test_overlapping_sections() {
        let mut tree = HeightTree::new(10, 1.0);
        let a = tree.collapse(2, 5).unwrap();
        let b = tree.collapse(4, 8).unwrap();
        assert_eq!(collapsed_lines(&tree), vec![2, 3, 4, 5, 6, 7, 8]);

        tree.uncollapse(a).unwrap();
        assert_eq!(collapsed_lines(&tree), vec![4, 5, 6, 7, 8]);
        tree.uncollapse(b).unwrap();
        assert!(collapsed_lines(&tree).is_empty());
    }

    #[test]
    fn test_insert_inside_collapsed_range() {
        let mut tree = HeightTree::new(10, 1.0);
        let section = tree.collapse(4, 6).unwrap();
        tree.insert_line_after(5).unwrap();
        tree.insert_line_after(6).unwrap();
        assert_eq!(collapsed_lines(&tree), vec![4, 5, 6, 7, 8]);
        assert_eq!(tree.section_range(section), Some((4, 8)));
    }

    #[test]
    fn test_insert_after_section_end_does_not_grow() {
        let mut tree = HeightTree::new(5, 1.0);
        let section = tree.collapse(2, 3).unwrap();
        tree.insert_line_after(3).unwrap();
        assert_eq!(collapsed_lines(&tree), vec![2, 3]);
        tree.insert_line_after(1).unwrap();
        assert_eq!(collapsed_lines(&tree), vec![3, 4]);
        assert_eq!(tree.section_range(section), Some((3, 4)));
    }

    #[test]
    fn test_remove_section_boundaries() {
        let mut tree = HeightTree::new(10, 1.0);
        let section = tree.collapse(4, 6).unwrap();
        tree.remove_line(4).unwrap();
        assert_eq!(tree.section_range(section), Some((4, 5)));
        tree.remove_line(5).unwrap();
        assert_eq!(tree.section_range(section), Some((4, 4)));
        assert_eq!(collapsed_lines(&tree), vec![4]);
        tree.remove_line(4).unwrap();
        assert!(!tree.is_section_collapsed(section));
        assert_eq!(tree.section_range(section), None);
        assert!(collapsed_lines(&tree).is_empty());
        assert_eq!(tree.line_count(), 7);
    }

    #[test]
    fn test_stale_handle_does_not_touch_reused_slot() {
        let mut tree = HeightTree::new(6, 1.0);
        let old = tree.collapse(2, 2).unwrap();
        tree.remove_line(2).unwrap();
        let new = tree.collapse(3, 4).unwrap();
        assert!(!tree.uncollapse(old).unwrap());
        assert!(tree.is_section_collapsed(new));
        assert_eq!(collapsed_lines(&tree), vec![3, 4]);
    }

    #[test]
    fn test_visible_lines_skip_collapsed() {
        let mut tree = HeightTree::new(6, 1.0);
        tree.collapse(2, 3).unwrap();
        tree.collapse(5, 5).unwrap();
        assert_eq!(tree.visible_lines(), vec![1, 4, 6]);
    }

    #[test]
    fn test_hit_test_past_end_skips_collapsed_tail() {
        let mut tree = HeightTree::new(5, 1.0);
        tree.collapse(4, 5).unwrap();
        assert_eq!(tree.line_by_visual_position(50.0), 3);
        tree.collapse(1, 3).unwrap();
        assert_eq!(tree.total_height(), 0.0);
        assert_eq!(tree.line_by_visual_position(0.0), 5);
    }

    #[test]
    fn test_rebuild_ends_sections() {
        let mut tree = HeightTree::new(4, 1.0);
        let section = tree.collapse(1, 2).unwrap();
        tree.rebuild(8);
        assert_eq!(tree.line_count(), 8);
        assert!(!tree.is_section_collapsed(section));
        assert_eq!(tree.total_height(), 8.0);
    }
}
