use std::collections::VecDeque;

use fnv::FnvHashMap;

use super::track::Track;

/// Rolling pool of recent events' track lists, one FIFO per multiplicity bin.
#[derive(Debug, Clone)]
pub struct EventBuffer {
    capacity: usize,
    pools: FnvHashMap<usize, VecDeque<Vec<Track>>>,
}

impl EventBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            pools: FnvHashMap::default(),
        }
    }

    pub fn add_event(&mut self, multiplicity_bin: usize, tracks: Vec<Track>) {
        let pool = self.pools.entry(multiplicity_bin).or_default();
        pool.push_back(tracks);
        while pool.len() > self.capacity {
            pool.pop_front();
        }
    }

    /// Buffered track lists of a bin, oldest first.
    pub fn events_in_bin(&self, multiplicity_bin: usize) -> impl Iterator<Item = &[Track]> + '_ {
        self.pools
            .get(&multiplicity_bin)
            .into_iter()
            .flat_map(|pool| pool.iter().map(Vec::as_slice))
    }

    pub fn len_in_bin(&self, multiplicity_bin: usize) -> usize {
        self.pools.get(&multiplicity_bin).map_or(0, VecDeque::len)
    }

    /// Moves the history of one bin into a buffer of its own.
    pub fn split_bin(&mut self, multiplicity_bin: usize) -> Self {
        let mut split = Self::new(self.capacity);
        if let Some(pool) = self.pools.remove(&multiplicity_bin) {
            split.pools.insert(multiplicity_bin, pool);
        }
        split
    }

    /// Takes back the bins of a buffer produced by `split_bin`.
    pub fn absorb(&mut self, other: Self) {
        self.pools.extend(other.pools);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(id: i64) -> Vec<Track> {
        vec![Track::new(0.0, 0.0, 1.0, 1, id)]
    }

    fn ids(buffer: &EventBuffer, bin: usize) -> Vec<i64> {
        buffer.events_in_bin(bin).map(|tracks| tracks[0].id).collect()
    }

    #[test]
    fn test_fifo_eviction() {
        let mut buffer = EventBuffer::new(3);
        for id in 0..4 {
            buffer.add_event(0, event(id));
        }
        assert_eq!(buffer.len_in_bin(0), 3);
        assert_eq!(ids(&buffer, 0), vec![1, 2, 3]);
    }

    #[test]
    fn test_bins_are_independent() {
        let mut buffer = EventBuffer::new(2);
        buffer.add_event(0, event(10));
        buffer.add_event(1, event(20));
        buffer.add_event(0, event(11));
        buffer.add_event(0, event(12));
        assert_eq!(ids(&buffer, 0), vec![11, 12]);
        assert_eq!(ids(&buffer, 1), vec![20]);
        assert_eq!(buffer.events_in_bin(5).count(), 0);
    }

    #[test]
    fn test_zero_capacity_keeps_nothing() {
        let mut buffer = EventBuffer::new(0);
        buffer.add_event(0, event(1));
        assert_eq!(buffer.len_in_bin(0), 0);
    }

    #[test]
    fn test_never_exceeds_capacity() {
        let mut buffer = EventBuffer::new(5);
        for id in 0..50 {
            buffer.add_event((id % 3) as usize, event(id));
            for bin in 0..3 {
                assert!(buffer.len_in_bin(bin) <= 5);
            }
        }
        assert_eq!(ids(&buffer, 0), vec![36, 39, 42, 45, 48]);
    }

    #[test]
    fn test_split_and_absorb() {
        let mut buffer = EventBuffer::new(2);
        buffer.add_event(0, event(1));
        buffer.add_event(1, event(2));
        let mut split = buffer.split_bin(1);
        assert_eq!(buffer.len_in_bin(1), 0);
        split.add_event(1, event(3));
        split.add_event(1, event(4));
        buffer.absorb(split);
        assert_eq!(ids(&buffer, 0), vec![1]);
        assert_eq!(ids(&buffer, 1), vec![3, 4]);
    }
}
