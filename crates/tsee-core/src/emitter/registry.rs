use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use indexmap::IndexMap;

use super::listener::AnyListener;
use crate::channel::ChannelName;

/// One `on`/`once` call.
pub(crate) struct Registration {
    pub(crate) listener: AnyListener,
    pub(crate) once: bool,
    fired: AtomicBool,
}

impl Registration {
    pub(crate) fn new(listener: AnyListener, once: bool) -> Arc<Self> {
        Arc::new(Self {
            listener,
            once,
            fired: AtomicBool::new(false),
        })
    }

    /// True if this registration may run now. A once registration answers
    /// true exactly one time.
    pub(crate) fn claim(&self) -> bool {
        !self.once || !self.fired.swap(true, Ordering::AcqRel)
    }
}

#[derive(Default)]
struct Slot {
    listeners: VecDeque<Arc<Registration>>,
    warned: bool,
}

/// Per-emitter listener table (channel -> ordered registrations).
///
/// Channels keep the order in which they first received a listener. A
/// channel whose last listener goes away is dropped from the table.
pub(crate) struct Registry {
    channels: IndexMap<ChannelName, Slot>,
    max_listeners: usize,
}

impl Registry {
    pub(crate) fn new(max_listeners: usize) -> Self {
        Self {
            channels: IndexMap::new(),
            max_listeners,
        }
    }

    pub(crate) fn max_listeners(&self) -> usize {
        self.max_listeners
    }

    pub(crate) fn set_max_listeners(&mut self, n: usize) {
        self.max_listeners = n;
    }

    /// Insert a registration. Returns the new listener count the first time
    /// the channel crosses the leak threshold.
    pub(crate) fn insert(
        &mut self,
        channel: ChannelName,
        registration: Arc<Registration>,
        prepend: bool,
    ) -> Option<usize> {
        let max = self.max_listeners;
        let slot = self.channels.entry(channel).or_default();
        if prepend {
            slot.listeners.push_front(registration);
        } else {
            slot.listeners.push_back(registration);
        }

        let count = slot.listeners.len();
        if max > 0 && count > max && !slot.warned {
            slot.warned = true;
            return Some(count);
        }
        None
    }

    /// Remove the first registration of `listener` on `channel`.
    pub(crate) fn remove_first(
        &mut self,
        channel: &ChannelName,
        listener: &AnyListener,
    ) -> Option<Arc<Registration>> {
        let slot = self.channels.get_mut(channel)?;
        let idx = slot
            .listeners
            .iter()
            .position(|r| r.listener.ptr_eq(listener))?;
        let removed = slot.listeners.remove(idx);
        self.prune(channel);
        removed
    }

    /// Remove this exact registration. False if it is already gone.
    pub(crate) fn remove_registration(
        &mut self,
        channel: &ChannelName,
        registration: &Arc<Registration>,
    ) -> bool {
        let Some(slot) = self.channels.get_mut(channel) else {
            return false;
        };
        let before = slot.listeners.len();
        slot.listeners.retain(|r| !Arc::ptr_eq(r, registration));
        let removed = slot.listeners.len() != before;
        self.prune(channel);
        removed
    }

    /// Detach every registration of one channel, in list order.
    pub(crate) fn take(&mut self, channel: &ChannelName) -> Vec<Arc<Registration>> {
        self.channels
            .shift_remove(channel)
            .map(|slot| slot.listeners.into())
            .unwrap_or_default()
    }

    pub(crate) fn snapshot(&self, channel: &ChannelName) -> Vec<Arc<Registration>> {
        self.channels
            .get(channel)
            .map(|slot| slot.listeners.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub(crate) fn count(&self, channel: &ChannelName) -> usize {
        self.channels.get(channel).map_or(0, |slot| slot.listeners.len())
    }

    pub(crate) fn names(&self) -> Vec<ChannelName> {
        self.channels.keys().cloned().collect()
    }

    fn prune(&mut self, channel: &ChannelName) {
        if self
            .channels
            .get(channel)
            .is_some_and(|slot| slot.listeners.is_empty())
        {
            self.channels.shift_remove(channel);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn listener() -> AnyListener {
        AnyListener::new(|_| Ok(()))
    }

    #[test]
    fn prepend_goes_to_the_front() {
        let mut reg = Registry::new(10);
        let a = listener();
        let b = listener();
        reg.insert("tick".into(), Registration::new(a.clone(), false), false);
        reg.insert("tick".into(), Registration::new(b.clone(), false), true);

        let snap = reg.snapshot(&"tick".into());
        assert!(snap[0].listener.ptr_eq(&b));
        assert!(snap[1].listener.ptr_eq(&a));
    }

    #[test]
    fn remove_first_takes_earliest_match_only() {
        let mut reg = Registry::new(10);
        let a = listener();
        reg.insert("tick".into(), Registration::new(a.clone(), true), false);
        reg.insert("tick".into(), Registration::new(a.clone(), false), false);

        let removed = reg.remove_first(&"tick".into(), &a).unwrap();
        assert!(removed.once);
        assert_eq!(reg.count(&"tick".into()), 1);
    }

    #[test]
    fn empty_channels_are_dropped() {
        let mut reg = Registry::new(10);
        let a = listener();
        reg.insert("a".into(), Registration::new(a.clone(), false), false);
        reg.insert("b".into(), Registration::new(listener(), false), false);
        assert_eq!(reg.names(), vec![ChannelName::from("a"), ChannelName::from("b")]);

        reg.remove_first(&"a".into(), &a);
        assert_eq!(reg.names(), vec![ChannelName::from("b")]);
        assert!(reg.remove_first(&"a".into(), &a).is_none());
    }

    #[test]
    fn once_registration_claims_a_single_time() {
        let once = Registration::new(listener(), true);
        assert!(once.claim());
        assert!(!once.claim());

        let plain = Registration::new(listener(), false);
        assert!(plain.claim());
        assert!(plain.claim());
    }

    #[rstest]
    #[case::below_limit(3, 3, None)]
    #[case::crosses_limit(3, 4, Some(4))]
    #[case::unlimited(0, 50, None)]
    fn leak_threshold(#[case] max: usize, #[case] adds: usize, #[case] expected: Option<usize>) {
        let mut reg = Registry::new(max);
        let mut warned = None;
        for _ in 0..adds {
            if let Some(n) = reg.insert("tick".into(), Registration::new(listener(), false), false) {
                assert!(warned.is_none(), "warned twice");
                warned = Some(n);
            }
        }
        assert_eq!(warned, expected);
    }

    #[test]
    fn take_detaches_whole_channel() {
        let mut reg = Registry::new(10);
        reg.insert("tick".into(), Registration::new(listener(), false), false);
        reg.insert("tick".into(), Registration::new(listener(), true), false);
        assert_eq!(reg.take(&"tick".into()).len(), 2);
        assert_eq!(reg.count(&"tick".into()), 0);
        assert!(reg.take(&"tick".into()).is_empty());
    }
}
