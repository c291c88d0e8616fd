use std::collections::VecDeque;

use crate::error::StructureError;
use crate::log;
use crate::partners::{Linker, Partners, Stem};
use crate::types::LoopKind;

pub type StemId = usize;
pub type LoopId = usize;

/// A stem in the loop tree.
#[derive(Debug, Clone, PartialEq)]
pub struct StemNode {
    pub stem: Stem,
    /// Loop the stem hangs off (back-reference)
    pub parent_loop: LoopId,
    /// Loop closed by the stem's innermost pair
    pub enclosed_loop: LoopId,
}

/// An element around a loop, in 5' to 3' order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopChild {
    Linker(Linker),
    Stem(StemId),
}

/// A loop with its variant-specific children.
///
/// Every loop other than the outermost one is closed by the innermost pair of
/// a stem, and its children always begin and end with a (possibly empty)
/// linker.
#[derive(Debug, Clone, PartialEq)]
pub enum Loop {
    Hairpin {
        closing: StemId,
        linker: Linker,
    },
    Internal {
        closing: StemId,
        linker5: Linker,
        inner: StemId,
        linker3: Linker,
    },
    Multibranch {
        closing: StemId,
        children: Vec<LoopChild>,
    },
    Outermost {
        children: Vec<LoopChild>,
    },
}

impl Loop {
    pub fn kind(&self) -> LoopKind {
        match self {
            Loop::Hairpin { .. } => LoopKind::Hairpin,
            Loop::Internal { .. } => LoopKind::Internal,
            Loop::Multibranch { .. } => LoopKind::Multibranch,
            Loop::Outermost { .. } => LoopKind::Outermost,
        }
    }

    pub fn closing_stem(&self) -> Option<StemId> {
        match self {
            Loop::Hairpin { closing, .. }
            | Loop::Internal { closing, .. }
            | Loop::Multibranch { closing, .. } => Some(*closing),
            Loop::Outermost { .. } => None,
        }
    }

    /// Linkers and stems around the loop, 5' to 3'.
    pub fn children(&self) -> Vec<LoopChild> {
        match self {
            Loop::Hairpin { linker, .. } => vec![LoopChild::Linker(*linker)],
            Loop::Internal {
                linker5,
                inner,
                linker3,
                ..
            } => vec![
                LoopChild::Linker(*linker5),
                LoopChild::Stem(*inner),
                LoopChild::Linker(*linker3),
            ],
            Loop::Multibranch { children, .. } | Loop::Outermost { children } => children.clone(),
        }
    }

    pub fn child_stems(&self) -> Vec<StemId> {
        self.children()
            .into_iter()
            .filter_map(|child| match child {
                LoopChild::Stem(id) => Some(id),
                LoopChild::Linker(_) => None,
            })
            .collect()
    }
}

/// Stems and loops of a nested structure, addressed by index.
///
/// Loop 0 is the outermost loop. Loops are numbered breadth-first, so every
/// loop has a larger index than the loop enclosing it.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopTree {
    pub stems: Vec<StemNode>,
    pub loops: Vec<Loop>,
    len: usize,
}

impl LoopTree {
    pub const OUTERMOST: LoopId = 0;

    /// Length of the sequence the tree was built from.
    pub fn sequence_len(&self) -> usize {
        self.len
    }

    pub fn stem(&self, id: StemId) -> &Stem {
        &self.stems[id].stem
    }

    /// The loop enclosing `id`, `None` for the outermost loop.
    pub fn parent_loop(&self, id: LoopId) -> Option<LoopId> {
        self.loops[id]
            .closing_stem()
            .map(|stem| self.stems[stem].parent_loop)
    }

    /// The stem a position belongs to, if it is paired.
    pub fn stem_containing(&self, position: usize) -> Option<&Stem> {
        self.stems
            .iter()
            .map(|node| &node.stem)
            .find(|stem| stem.contains(position))
    }

    /// Stem index for every position (`None` for unpaired positions).
    pub fn stem_of_positions(&self) -> Vec<Option<StemId>> {
        let mut owners = vec![None; self.len];
        for (id, node) in self.stems.iter().enumerate() {
            for p in node.stem.side5().chain(node.stem.side3()) {
                owners[p - 1] = Some(id);
            }
        }
        owners
    }
}

/// Decompose a partners table into a loop tree.
///
/// Fails if the table is not symmetric or contains crossing pairs. Every pair
/// ends up in exactly one stem.
pub fn decompose(partners: &Partners) -> Result<LoopTree, StructureError> {
    partners.validate()?;
    let n = partners.len();

    let mut stems: Vec<StemNode> = Vec::new();
    let mut loops: Vec<Loop> = Vec::new();

    // (closing stem, upstream bound, downstream bound). FIFO order makes the
    // arena index of each loop equal to its position in the queue.
    let mut queue: VecDeque<(Option<StemId>, usize, usize)> = VecDeque::new();
    queue.push_back((None, 0, n + 1));

    while let Some((closing, upstream, downstream)) = queue.pop_front() {
        let loop_id = loops.len();
        let mut children: Vec<LoopChild> = Vec::new();
        let mut bound = upstream;
        let mut p = upstream + 1;

        while p < downstream {
            let Some(q) = partners.partner_of(p) else {
                p += 1;
                continue;
            };
            // Nesting guarantees the 5' partner is seen first.
            debug_assert!(p < q && q < downstream);

            let mut size = 1;
            while p + size < q - size && partners.partner_of(p + size) == Some(q - size) {
                size += 1;
            }

            let stem_id = stems.len();
            let enclosed_loop = loop_id + 1 + queue.len();
            stems.push(StemNode {
                stem: Stem::new(p, q, size),
                parent_loop: loop_id,
                enclosed_loop,
            });
            queue.push_back((Some(stem_id), p + size - 1, q + 1 - size));

            children.push(LoopChild::Linker(Linker::new(bound, p)));
            children.push(LoopChild::Stem(stem_id));
            bound = q;
            p = q + 1;
        }
        children.push(LoopChild::Linker(Linker::new(bound, downstream)));

        loops.push(classify(closing, children));
    }

    log::debug!(
        stems = stems.len(),
        loops = loops.len(),
        "decomposed structure"
    );

    Ok(LoopTree {
        stems,
        loops,
        len: n,
    })
}

fn classify(closing: Option<StemId>, children: Vec<LoopChild>) -> Loop {
    let Some(closing) = closing else {
        return Loop::Outermost { children };
    };
    let simple = match children.as_slice() {
        [LoopChild::Linker(linker)] => Some(Loop::Hairpin {
            closing,
            linker: *linker,
        }),
        [LoopChild::Linker(linker5), LoopChild::Stem(inner), LoopChild::Linker(linker3)] => {
            Some(Loop::Internal {
                closing,
                linker5: *linker5,
                inner: *inner,
                linker3: *linker3,
            })
        }
        _ => None,
    };
    match simple {
        Some(lp) => lp,
        None => Loop::Multibranch { closing, children },
    }
}
