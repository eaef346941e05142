use crate::messaging::NotificationEvent;

/// Session-scoped notification list, newest first.
///
/// Events are only mutated by marking them read and only removed by
/// [`clear`](Self::clear). Nothing is persisted.
#[derive(Debug, Clone, Default)]
pub struct NotificationStore {
    events: Vec<NotificationEvent>,
}

impl NotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepends an event
    pub fn append(&mut self, event: NotificationEvent) {
        self.events.insert(0, event);
    }

    /// Marks one event read. Returns `false` if the id is unknown.
    pub fn mark_read(&mut self, id: &str) -> bool {
        match self.events.iter_mut().find(|event| event.id == id) {
            Some(event) => {
                event.read = true;
                true
            }
            None => false,
        }
    }

    pub fn mark_all_read(&mut self) {
        for event in self.events.iter_mut() {
            event.read = true;
        }
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn unread_count(&self) -> usize {
        self.events.iter().filter(|event| !event.read).count()
    }

    pub fn events(&self) -> &[NotificationEvent] {
        &self.events
    }

    pub fn get(&self, id: &str) -> Option<&NotificationEvent> {
        self.events.iter().find(|event| event.id == id)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::NotificationKind;

    fn event(title: &str) -> NotificationEvent {
        NotificationEvent::new(title, "body", NotificationKind::Info)
    }

    #[test]
    fn test_append_is_newest_first() {
        let mut store = NotificationStore::new();
        store.append(event("first"));
        store.append(event("second"));

        let titles: Vec<_> = store.events().iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["second", "first"]);
        assert_eq!(store.unread_count(), 2);
    }

    #[test]
    fn test_mark_read() {
        let mut store = NotificationStore::new();
        let first = event("first");
        let id = first.id.clone();
        store.append(first);
        store.append(event("second"));

        assert!(store.mark_read(&id));
        assert!(store.get(&id).unwrap().read);
        assert_eq!(store.unread_count(), 1);

        assert!(!store.mark_read("missing"));
        assert_eq!(store.unread_count(), 1);
    }

    #[test]
    fn test_mark_all_read_then_clear() {
        let mut store = NotificationStore::new();
        store.append(event("a"));
        store.append(event("b"));

        store.mark_all_read();
        assert_eq!(store.unread_count(), 0);
        assert_eq!(store.len(), 2);

        store.clear();
        assert!(store.is_empty());
    }
}
