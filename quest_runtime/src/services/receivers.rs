//! Weakly-held quest receivers.
//!
//! The registry never keeps a receiver alive. Registrations whose receiver
//! has been dropped are pruned during the next broadcast that reaches them.

use std::rc::{Rc, Weak};

use quest_graph::QuestAssetId;

use super::{QuestEventType, QuestTag};

/// Listener for quest telemetry. Both callbacks default to no-ops.
pub trait QuestReceiver {
    fn on_quest_event(&self, _quest: QuestAssetId, _event: QuestEventType) {}

    fn on_quest_tag(&self, _quest: QuestAssetId, _tag: &QuestTag) {}
}

/// Event and tag receiver lists.
#[derive(Default)]
pub struct ReceiverRegistry {
    events: Vec<Weak<dyn QuestReceiver>>,
    tags: Vec<Weak<dyn QuestReceiver>>,
}

fn same_receiver(a: &Weak<dyn QuestReceiver>, b: &Weak<dyn QuestReceiver>) -> bool {
    a.as_ptr() as *const () == b.as_ptr() as *const ()
}

fn add_unique(list: &mut Vec<Weak<dyn QuestReceiver>>, weak: Weak<dyn QuestReceiver>) -> bool {
    if list.iter().any(|w| same_receiver(w, &weak)) {
        return false;
    }
    list.push(weak);
    true
}

fn remove(list: &mut Vec<Weak<dyn QuestReceiver>>, weak: &Weak<dyn QuestReceiver>) -> bool {
    let before = list.len();
    list.retain(|w| !same_receiver(w, weak));
    before != list.len()
}

/// Visit live receivers newest-first, swap-removing dead ones in place.
fn for_each_live(list: &mut Vec<Weak<dyn QuestReceiver>>, mut f: impl FnMut(&dyn QuestReceiver)) -> usize {
    let mut delivered = 0;
    let mut i = list.len();
    while i > 0 {
        i -= 1;
        match list[i].upgrade() {
            Some(receiver) => {
                f(receiver.as_ref());
                delivered += 1;
            }
            None => {
                list.swap_remove(i);
            }
        }
    }
    delivered
}

fn erase<R: QuestReceiver + 'static>(receiver: &Rc<R>) -> Weak<dyn QuestReceiver> {
    let weak: Weak<R> = Rc::downgrade(receiver);
    weak
}

impl ReceiverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the receiver was already registered.
    pub fn register_event<R: QuestReceiver + 'static>(&mut self, receiver: &Rc<R>) -> bool {
        let weak = erase(receiver);
        add_unique(&mut self.events, weak)
    }

    pub fn unregister_event<R: QuestReceiver + 'static>(&mut self, receiver: &Rc<R>) -> bool {
        let weak = erase(receiver);
        remove(&mut self.events, &weak)
    }

    /// Returns false if the receiver was already registered.
    pub fn register_tag<R: QuestReceiver + 'static>(&mut self, receiver: &Rc<R>) -> bool {
        let weak = erase(receiver);
        add_unique(&mut self.tags, weak)
    }

    pub fn unregister_tag<R: QuestReceiver + 'static>(&mut self, receiver: &Rc<R>) -> bool {
        let weak = erase(receiver);
        remove(&mut self.tags, &weak)
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    pub fn clear_tags(&mut self) {
        self.tags.clear();
    }

    pub fn clear(&mut self) {
        self.clear_events();
        self.clear_tags();
    }

    /// Registrations currently held, dead ones included until the next broadcast.
    pub fn event_receiver_count(&self) -> usize {
        self.events.len()
    }

    pub fn tag_receiver_count(&self) -> usize {
        self.tags.len()
    }

    /// Deliver an event to every live receiver. Returns the number reached.
    pub fn broadcast_event(&mut self, quest: QuestAssetId, event: QuestEventType) -> usize {
        for_each_live(&mut self.events, |r| r.on_quest_event(quest, event))
    }

    /// Deliver a tag to every live receiver. Returns the number reached.
    pub fn broadcast_tag(&mut self, quest: QuestAssetId, tag: &QuestTag) -> usize {
        for_each_live(&mut self.tags, |r| r.on_quest_tag(quest, tag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        events: RefCell<Vec<QuestEventType>>,
        tags: RefCell<Vec<String>>,
    }

    impl QuestReceiver for Recorder {
        fn on_quest_event(&self, _quest: QuestAssetId, event: QuestEventType) {
            self.events.borrow_mut().push(event);
        }

        fn on_quest_tag(&self, _quest: QuestAssetId, tag: &QuestTag) {
            self.tags.borrow_mut().push(tag.to_string());
        }
    }

    #[test]
    fn test_register_is_unique() {
        let mut registry = ReceiverRegistry::new();
        let receiver = Rc::new(Recorder::default());

        assert!(registry.register_event(&receiver));
        assert!(!registry.register_event(&receiver));

        registry.broadcast_event(QuestAssetId::new(), QuestEventType::QuestStarted);
        assert_eq!(receiver.events.borrow().len(), 1);
    }

    #[test]
    fn test_dead_receivers_pruned() {
        let mut registry = ReceiverRegistry::new();
        let alive = Rc::new(Recorder::default());
        let dead = Rc::new(Recorder::default());
        registry.register_event(&alive);
        registry.register_event(&dead);
        drop(dead);

        assert_eq!(registry.event_receiver_count(), 2);
        let reached = registry.broadcast_event(QuestAssetId::new(), QuestEventType::QuestCompleted);
        assert_eq!(reached, 1);
        assert_eq!(registry.event_receiver_count(), 1);
        assert_eq!(*alive.events.borrow(), vec![QuestEventType::QuestCompleted]);
    }

    #[test]
    fn test_unregister() {
        let mut registry = ReceiverRegistry::new();
        let receiver = Rc::new(Recorder::default());
        registry.register_tag(&receiver);

        assert!(registry.unregister_tag(&receiver));
        assert!(!registry.unregister_tag(&receiver));
        assert_eq!(registry.broadcast_tag(QuestAssetId::new(), &QuestTag::new("Quest.Any")), 0);
        assert!(receiver.tags.borrow().is_empty());
    }

    #[test]
    fn test_event_and_tag_lists_are_separate() {
        let mut registry = ReceiverRegistry::new();
        let receiver = Rc::new(Recorder::default());
        registry.register_tag(&receiver);

        registry.broadcast_event(QuestAssetId::new(), QuestEventType::QuestStarted);
        registry.broadcast_tag(QuestAssetId::new(), &QuestTag::new("Quest.Door"));

        assert!(receiver.events.borrow().is_empty());
        assert_eq!(*receiver.tags.borrow(), vec!["Quest.Door".to_string()]);
    }
}
