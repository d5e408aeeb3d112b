//! Change notification for date consumers.

use std::fmt;

/// Handle returned by [`ChangeNotifier::attach`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// Callbacks run after every propagation pass.
///
/// Observers receive no payload: they re-read whatever derived data they
/// display.
#[derive(Default)]
pub struct ChangeNotifier {
    observers: Vec<(ObserverId, Box<dyn FnMut()>)>,
    next_id: u64,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a callback until [`detach`](Self::detach) is called.
    pub fn attach(&mut self, observer: impl FnMut() + 'static) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Removes a callback. Returns whether it was registered.
    pub fn detach(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(o, _)| *o != id);
        self.observers.len() != before
    }

    /// Runs every callback in attach order.
    pub fn notify_all(&mut self) {
        for (_, observer) in &mut self.observers {
            observer();
        }
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("observers", &self.observers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_notify_in_attach_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut n = ChangeNotifier::new();
        let l1 = Rc::clone(&log);
        n.attach(move || l1.borrow_mut().push(1));
        let l2 = Rc::clone(&log);
        n.attach(move || l2.borrow_mut().push(2));
        n.notify_all();
        assert_eq!(*log.borrow(), vec![1, 2]);
    }

    #[test]
    fn test_detach() {
        let count = Rc::new(RefCell::new(0));
        let mut n = ChangeNotifier::new();
        let c = Rc::clone(&count);
        let id = n.attach(move || *c.borrow_mut() += 1);
        n.notify_all();
        assert!(n.detach(id));
        assert!(!n.detach(id));
        n.notify_all();
        assert_eq!(*count.borrow(), 1);
        assert!(n.is_empty());
    }
}
