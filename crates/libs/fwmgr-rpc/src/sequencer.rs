/// Per-session transaction ids.
///
/// Ids start at 1 and grow by exactly one per outbound envelope until
/// [`TransactionSequencer::clear`] is called. Mutation needs `&mut self`, so a
/// sequencer shared across threads has to sit behind the caller's own lock.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransactionSequencer {
    last: Option<u64>,
}

impl TransactionSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> u64 {
        let next = self.last.map_or(1, |last| last.saturating_add(1));
        self.last = Some(next);
        next
    }

    pub fn last_id(&self) -> Option<u64> {
        self.last
    }

    pub fn clear(&mut self) {
        self.last = None;
    }
}
