//! Hop-count distances and the replicated distance vector.

/// A hop count from the source vertex, or unreachable.
///
/// Internally `Option<u32>`, where `None` is the unreachable marker.
/// Serializes transparently, so unreachable is encoded as json `null`
/// and survives a round trip, unlike a float infinity.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(transparent)]
pub struct Distance(Option<u32>);

impl Distance {
    /// The source vertex distance.
    pub const ZERO: Distance = Distance(Some(0));

    /// Not (yet) reachable from the source.
    pub const UNREACHABLE: Distance = Distance(None);

    /// Construct a finite distance.
    pub fn hops(hops: u32) -> Self {
        Self(Some(hops))
    }

    /// The distance one edge further on.
    /// Unreachable stays unreachable.
    pub fn successor(self) -> Self {
        Self(self.0.map(|h| h.saturating_add(1)))
    }

    /// True if this is a finite distance.
    pub fn is_reachable(&self) -> bool {
        self.0.is_some()
    }

    /// Get the hop count, if reachable.
    pub fn get(&self) -> Option<u32> {
        self.0
    }
}

impl Default for Distance {
    fn default() -> Self {
        Self::UNREACHABLE
    }
}

impl From<Option<u32>> for Distance {
    fn from(d: Option<u32>) -> Self {
        Self(d)
    }
}

impl PartialOrd for Distance {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Distance {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use std::cmp::Ordering::*;
        match (self.0, other.0) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Less,
            (None, Some(_)) => Greater,
            (None, None) => Equal,
        }
    }
}

impl std::fmt::Display for Distance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(h) => h.fmt(f),
            None => f.write_str("inf"),
        }
    }
}

/// One tentative distance per vertex.
///
/// Entries only ever decrease: [DistanceVector::lower] and
/// [DistanceVector::merge_min] refuse to raise a value.
#[derive(
    Debug, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct DistanceVector(Vec<Distance>);

impl DistanceVector {
    /// All vertices unreachable.
    pub fn unreachable(n: usize) -> Self {
        Self(vec![Distance::UNREACHABLE; n])
    }

    /// Zero at `source`, unreachable elsewhere.
    /// A `source` outside `0..n` leaves every entry unreachable.
    pub fn seeded(n: usize, source: usize) -> Self {
        let mut out = Self::unreachable(n);
        if let Some(d) = out.0.get_mut(source) {
            *d = Distance::ZERO;
        }
        out
    }

    /// Vertex count.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if there are no vertices.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get the distance of vertex `i`, unreachable if out of range.
    pub fn get(&self, i: usize) -> Distance {
        self.0.get(i).copied().unwrap_or_default()
    }

    /// Write `d` at `i` only if it is strictly smaller than the
    /// current entry. Returns true if the entry changed.
    pub fn lower(&mut self, i: usize, d: Distance) -> bool {
        match self.0.get_mut(i) {
            Some(cur) if d < *cur => {
                *cur = d;
                true
            }
            _ => false,
        }
    }

    /// Fold another replica in with element-wise min.
    /// Returns the number of entries lowered.
    pub fn merge_min(&mut self, other: &DistanceVector) -> usize {
        other
            .0
            .iter()
            .enumerate()
            .filter(|(i, d)| self.lower(*i, **d))
            .count()
    }

    /// Number of vertices with a finite distance.
    pub fn reachable_count(&self) -> usize {
        self.0.iter().filter(|d| d.is_reachable()).count()
    }

    /// Access the raw entries.
    pub fn as_slice(&self) -> &[Distance] {
        &self.0
    }
}

impl From<Vec<Distance>> for DistanceVector {
    fn from(v: Vec<Distance>) -> Self {
        Self(v)
    }
}

impl FromIterator<Distance> for DistanceVector {
    fn from_iter<T: IntoIterator<Item = Distance>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl std::fmt::Display for DistanceVector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[")?;
        for (i, d) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            d.fmt(f)?;
        }
        f.write_str("]")
    }
}
