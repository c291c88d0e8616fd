use serde::{Deserialize, Serialize};

use crate::error::StructureError;

/// Pairing table over 1-indexed sequence positions.
///
/// `table[p - 1] = q` means position `p` pairs with position `q`;
/// `0` means `p` is unpaired. Construction never fails: the table is only
/// checked by [`Partners::validate`], so that malformed input can be reported
/// instead of silently repaired.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Partners(Vec<usize>);

impl Partners {
    pub fn new(table: Vec<usize>) -> Self {
        Self(table)
    }

    /// A table of `len` unpaired positions.
    pub fn unpaired(len: usize) -> Self {
        Self(vec![0; len])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    /// The partner of position `p`, or `None` if unpaired or out of range.
    pub fn partner_of(&self, p: usize) -> Option<usize> {
        p.checked_sub(1)
            .and_then(|i| self.0.get(i))
            .copied()
            .filter(|&q| q != 0)
    }

    pub fn is_paired(&self, p: usize) -> bool {
        self.partner_of(p).is_some()
    }

    /// Pairs as `(upstream, downstream)` in upstream order.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (1..=self.len()).filter_map(move |p| match self.partner_of(p) {
            Some(q) if p < q => Some((p, q)),
            _ => None,
        })
    }

    /// Check symmetry, range and the absence of crossing pairs.
    pub fn validate(&self) -> Result<(), StructureError> {
        let n = self.len();
        let mut open: Vec<usize> = Vec::new();
        for p in 1..=n {
            let q = self.0[p - 1];
            if q == 0 {
                continue;
            }
            if q == p {
                return Err(StructureError::SelfPaired { position: p });
            }
            if q > n || self.0[q - 1] != p {
                return Err(StructureError::AsymmetricPartners {
                    position: p,
                    partner: q,
                });
            }
            if p < q {
                open.push(p);
                continue;
            }
            // Closing a pair: it must be the innermost open one.
            match open.pop() {
                Some(top) if top == q => {}
                Some(top) => {
                    return Err(StructureError::CrossingPairs {
                        upstream: q,
                        downstream: p,
                        other_upstream: top,
                        other_downstream: self.0[top - 1],
                    });
                }
                None => {
                    return Err(StructureError::AsymmetricPartners {
                        position: p,
                        partner: q,
                    });
                }
            }
        }
        Ok(())
    }
}

impl From<Vec<usize>> for Partners {
    fn from(table: Vec<usize>) -> Self {
        Self(table)
    }
}

/// A maximal run of consecutively nested pairs `(p, q), (p+1, q-1), ...`
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Stem {
    pub position5: usize,
    pub position3: usize,
    pub size: usize,
}

impl Stem {
    pub fn new(position5: usize, position3: usize, size: usize) -> Self {
        Self {
            position5,
            position3,
            size,
        }
    }

    /// Positions on the 5' side, outermost first.
    pub fn side5(&self) -> impl Iterator<Item = usize> {
        self.position5..self.position5 + self.size
    }

    /// Positions on the 3' side, paired index-wise with [`Stem::side5`].
    pub fn side3(&self) -> impl Iterator<Item = usize> {
        let top = self.position3;
        (0..self.size).map(move |k| top - k)
    }

    /// The innermost pair, which closes the enclosed loop.
    pub fn innermost_pair(&self) -> (usize, usize) {
        (
            self.position5 + self.size - 1,
            self.position3 + 1 - self.size,
        )
    }

    pub fn contains(&self, p: usize) -> bool {
        let (inner5, inner3) = self.innermost_pair();
        (self.position5..=inner5).contains(&p) || (inner3..=self.position3).contains(&p)
    }
}

/// A run of unpaired positions between two bounding positions.
///
/// The bounds of the free 5' and 3' tails are the virtual positions `0` and
/// `N + 1`.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Linker {
    pub upstream: usize,
    pub downstream: usize,
}

impl Linker {
    pub fn new(upstream: usize, downstream: usize) -> Self {
        debug_assert!(upstream < downstream);
        Self {
            upstream,
            downstream,
        }
    }

    pub fn size(&self) -> usize {
        self.downstream - self.upstream - 1
    }

    /// Unpaired positions, 5' to 3'.
    pub fn positions(&self) -> impl Iterator<Item = usize> {
        self.upstream + 1..self.downstream
    }
}
