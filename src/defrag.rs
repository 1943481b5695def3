use std::collections::{BTreeMap, HashMap, VecDeque};
use std::net::IpAddr;

use tracing::trace;

use crate::decode::DecodeError;

pub const DEFAULT_MAX_TRACKERS: usize = 4096;

/// Largest datagram a reassembly may produce.
pub const MAX_DATAGRAM: usize = 65535;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FragmentKey {
    pub src: IpAddr,
    pub dst: IpAddr,
    pub id: u32,
    pub protocol: u8,
}

#[derive(Debug, PartialEq, Eq)]
pub enum FragmentOutcome {
    Pending,
    Complete(Vec<u8>),
}

#[derive(Debug, Default)]
struct Tracker {
    pieces: BTreeMap<usize, Vec<u8>>,
    end: Option<usize>,
    /// Matches the `order` entry pushed when this tracker was created.
    generation: u64,
}

impl Tracker {
    fn overlaps(&self, start: usize, end: usize) -> bool {
        self.pieces
            .range(..end)
            .next_back()
            .is_some_and(|(&offset, bytes)| offset + bytes.len() > start)
    }

    fn is_complete(&self) -> bool {
        let Some(end) = self.end else {
            return false;
        };
        let mut cursor = 0;
        for (&offset, bytes) in &self.pieces {
            if offset != cursor {
                return false;
            }
            cursor += bytes.len();
        }
        cursor == end
    }

    fn assemble(self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.end.unwrap_or_default());
        for bytes in self.pieces.into_values() {
            out.extend_from_slice(&bytes);
        }
        out
    }
}

/// Reassembly tracker: partial datagrams survive across decode calls until
/// every byte up to the final fragment has arrived.
#[derive(Debug)]
pub struct DefragTracker {
    trackers: HashMap<FragmentKey, Tracker>,
    /// Creation order. Entries whose generation no longer matches a live
    /// tracker are stale and get skipped.
    order: VecDeque<(FragmentKey, u64)>,
    next_generation: u64,
    max_trackers: usize,
    completed: u64,
    evicted: u64,
}

impl DefragTracker {
    pub fn new(max_trackers: usize) -> Self {
        Self {
            trackers: HashMap::new(),
            order: VecDeque::new(),
            next_generation: 0,
            max_trackers,
            completed: 0,
            evicted: 0,
        }
    }

    /// Adds one fragment. Overlapping or inconsistent fragments discard the
    /// whole partial datagram.
    pub fn insert(
        &mut self,
        key: FragmentKey,
        offset: usize,
        more_fragments: bool,
        payload: &[u8],
    ) -> Result<FragmentOutcome, DecodeError> {
        let end = offset + payload.len();
        if end > MAX_DATAGRAM {
            return Err(DecodeError::FragmentTooLarge { max: MAX_DATAGRAM });
        }

        if !self.trackers.contains_key(&key) {
            self.make_room();
            let generation = self.next_generation;
            self.next_generation += 1;
            self.order.push_back((key, generation));
            self.trackers.insert(
                key,
                Tracker {
                    generation,
                    ..Tracker::default()
                },
            );
        }
        let tracker = self.trackers.entry(key).or_default();

        if !payload.is_empty() && tracker.overlaps(offset, end) {
            self.forget(&key);
            return Err(DecodeError::FragmentOverlap);
        }

        let beyond_end = match tracker.end {
            Some(final_end) => end > final_end || (!more_fragments && end != final_end),
            None => {
                !more_fragments
                    && tracker
                        .pieces
                        .last_key_value()
                        .is_some_and(|(&o, bytes)| o + bytes.len() > end)
            }
        };
        if beyond_end {
            self.forget(&key);
            return Err(DecodeError::FragmentLength);
        }

        if !more_fragments {
            tracker.end = Some(end);
        }
        if !payload.is_empty() {
            tracker.pieces.insert(offset, payload.to_vec());
        }

        if !tracker.is_complete() {
            trace!(?key, offset, more_fragments, "fragment queued");
            return Ok(FragmentOutcome::Pending);
        }

        let datagram = self
            .forget(&key)
            .map(Tracker::assemble)
            .unwrap_or_default();
        self.completed += 1;
        trace!(?key, len = datagram.len(), "datagram reassembled");
        Ok(FragmentOutcome::Complete(datagram))
    }

    fn make_room(&mut self) {
        if self.trackers.len() < self.max_trackers {
            return;
        }
        while let Some((oldest, generation)) = self.order.pop_front() {
            if self.is_live(&oldest, generation) {
                self.forget(&oldest);
                self.evicted += 1;
                trace!(key = ?oldest, "evicted oldest partial datagram");
                return;
            }
        }
    }

    fn is_live(&self, key: &FragmentKey, generation: u64) -> bool {
        self.trackers
            .get(key)
            .is_some_and(|tracker| tracker.generation == generation)
    }

    /// Drops a tracker and any `order` entries it leaves stale, so `order`
    /// never holds more than twice the live trackers.
    fn forget(&mut self, key: &FragmentKey) -> Option<Tracker> {
        let removed = self.trackers.remove(key);
        while let Some(&(front, generation)) = self.order.front()
            && !self.is_live(&front, generation)
        {
            self.order.pop_front();
        }
        if self.order.len() > 2 * self.trackers.len() {
            let trackers = &self.trackers;
            self.order.retain(|(key, generation)| {
                trackers
                    .get(key)
                    .is_some_and(|tracker| tracker.generation == *generation)
            });
        }
        removed
    }

    /// Partial datagrams currently held.
    pub fn len(&self) -> usize {
        self.trackers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trackers.is_empty()
    }

    pub fn completed(&self) -> u64 {
        self.completed
    }

    pub fn evicted(&self) -> u64 {
        self.evicted
    }
}

#[cfg(test)]
#[path = "defrag_tests.rs"]
mod tests;
