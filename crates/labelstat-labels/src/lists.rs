//! Intrusive per-label pixel lists
//!
//! The lists live inside one `i32` array indexed by pixel: `lists[i]` is
//! the next pixel of the same label, or [`LIST_END`]. `list_heads[label]`
//! is the first pixel of `label` (or [`LIST_END`] if the label never
//! occurs). Background pixels belong to no list.
//!
//! Each worker prepends the pixels of its own blocks to private lists. Its
//! `heads[label]` is the most recently prepended pixel, and
//! `tails_increased[label]` is `first_pixel + 1`: zero means the worker has
//! not seen the label yet, which keeps freshly grown (zero-filled) arrays
//! valid. After the barrier, the per-worker lists of each label are
//! spliced in worker order by linking every tail to the next head.

use crate::error::LabelsResult;
use labelstat_core::{
    BlockScheduler, Error, PooledBuffer, SchedulerOptions, cleared_i32_pool,
    ensure_capacity_for_label,
};

/// Marker of a list end and of an absent list head
pub const LIST_END: i32 = -1;

/// Per-label linked lists of pixel indexes
#[derive(Debug, Clone)]
pub struct LabelLists {
    lists: Vec<i32>,
    list_heads: Vec<i32>,
}

impl LabelLists {
    /// Highest label found
    pub fn max_label(&self) -> usize {
        self.list_heads.len() - 1
    }

    /// Number of pixels of the underlying image
    pub fn len(&self) -> usize {
        self.lists.len()
    }

    /// Check whether the image has no pixels
    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    /// Next-pixel links, one per pixel
    pub fn lists(&self) -> &[i32] {
        &self.lists
    }

    /// First pixel of every label in `0..=max_label`
    pub fn list_heads(&self) -> &[i32] {
        &self.list_heads
    }

    /// Iterate over the pixel indexes of `label`
    pub fn pixels(&self, label: usize) -> LabelPixels<'_> {
        LabelPixels {
            lists: &self.lists,
            next: self.list_heads.get(label).copied().unwrap_or(LIST_END),
        }
    }
}

/// Iterator over the pixels of one label
#[derive(Debug, Clone)]
pub struct LabelPixels<'a> {
    lists: &'a [i32],
    next: i32,
}

impl Iterator for LabelPixels<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.next < 0 {
            return None;
        }
        let index = self.next as usize;
        self.next = self.lists[index];
        Some(index)
    }
}

struct ListWorker {
    heads: PooledBuffer<'static, i32>,
    tails_increased: PooledBuffer<'static, i32>,
    max_label: usize,
}

/// Build the pixel list of every label
///
/// # Errors
///
/// Returns an error if a label is too large or the image has more than
/// `i32::MAX` pixels.
pub fn build_label_lists(labels: &[i32], options: &SchedulerOptions) -> LabelsResult<LabelLists> {
    if labels.len() >= i32::MAX as usize {
        return Err(Error::TooLargeArray {
            what: "pixel lists",
            elements: labels.len() as u64,
        }
        .into());
    }
    let mut lists = vec![LIST_END; labels.len()];
    let scheduler = BlockScheduler::for_pixels(labels.len(), options);
    let list_heads = scheduler.run_with_output(
        &mut lists,
        1,
        |_| ListWorker {
            heads: cleared_i32_pool().acquire(),
            tails_increased: cleared_i32_pool().acquire(),
            max_label: 0,
        },
        |worker, block, links: &mut [i32]| -> LabelsResult<()> {
            for (link, k) in links.iter_mut().zip(block.range()) {
                let label = labels[k];
                if label <= 0 {
                    continue;
                }
                let label = label as usize;
                if label >= worker.heads.len() {
                    ensure_capacity_for_label(&mut *worker.heads, label)?;
                }
                if label >= worker.tails_increased.len() {
                    ensure_capacity_for_label(&mut *worker.tails_increased, label)?;
                }
                if worker.tails_increased[label] == 0 {
                    worker.tails_increased[label] = k as i32 + 1;
                    *link = LIST_END;
                } else {
                    *link = worker.heads[label];
                }
                worker.heads[label] = k as i32;
                worker.max_label = worker.max_label.max(label);
            }
            Ok(())
        },
        |mut workers, lists| {
            let max_label = workers.iter().map(|w| w.max_label).max().unwrap_or(0);
            let mut list_heads = vec![LIST_END; max_label + 1];
            let mut parts: Vec<(i32, i32)> = Vec::with_capacity(workers.len());
            for (label, list_head) in list_heads.iter_mut().enumerate().skip(1) {
                parts.clear();
                for worker in &workers {
                    if label <= worker.max_label && worker.tails_increased[label] > 0 {
                        parts.push((worker.heads[label], worker.tails_increased[label] - 1));
                    }
                }
                for pair in parts.windows(2) {
                    let previous_tail = pair[0].1 as usize;
                    debug_assert_eq!(lists[previous_tail], LIST_END);
                    lists[previous_tail] = pair[1].0;
                }
                if let Some(&(head, _)) = parts.first() {
                    *list_head = head;
                }
            }
            for worker in workers.iter_mut() {
                let used = worker.max_label + 1;
                worker.heads.set_used_len(used);
                worker.tails_increased.set_used_len(used);
            }
            Ok(list_heads)
        },
    )?;
    log::trace!("built pixel lists for {} labels", list_heads.len() - 1);
    Ok(LabelLists { lists, list_heads })
}
