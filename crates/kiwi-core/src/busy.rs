// ── In-flight operation counter ──
//
// Backs the `is_loading` flags. A guard per operation keeps the count
// right even when the future is dropped mid-flight.

use tokio::sync::watch;

pub(crate) struct Busy {
    count: watch::Sender<usize>,
}

impl Busy {
    pub(crate) fn new() -> Self {
        let (count, _) = watch::channel(0);
        Self { count }
    }

    pub(crate) fn enter(&self) -> BusyGuard<'_> {
        self.count.send_modify(|n| *n += 1);
        BusyGuard { busy: self }
    }

    pub(crate) fn is_busy(&self) -> bool {
        *self.count.borrow() > 0
    }
}

pub(crate) struct BusyGuard<'a> {
    busy: &'a Busy,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.busy.count.send_modify(|n| *n = n.saturating_sub(1));
    }
}
