//! Typed UI events and store commands.
//!
//! # Responsibility
//! - Carry view requests (open an editor, define a relationship) between
//!   components through an explicit, injected dispatcher.
//! - Describe store mutations as values so adapters can queue or replay them.
//!
//! # Invariants
//! - Handlers run synchronously in subscription order.
//! - A `SubscriptionId` is never reused by the same dispatcher.

use crate::model::person::{PersonDraft, PersonId, PersonPatch};
use crate::model::relationship::RelationshipKind;
use log::debug;
use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};

/// Requests raised by views for other views to act on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UiEvent {
    PersonCreateRequested,
    PersonEditRequested(PersonId),
    /// Open the relationship manager for one person.
    RelationshipManageRequested(PersonId),
    /// A drag between two nodes asks which relationship to create.
    RelationshipDefineRequested { source: PersonId, target: PersonId },
    /// Re-root the tree layout on one person.
    FocusRequested(PersonId),
}

impl UiEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::PersonCreateRequested => "person_create_requested",
            Self::PersonEditRequested(_) => "person_edit_requested",
            Self::RelationshipManageRequested(_) => "relationship_manage_requested",
            Self::RelationshipDefineRequested { .. } => "relationship_define_requested",
            Self::FocusRequested(_) => "focus_requested",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

type Handler = Box<dyn FnMut(&UiEvent)>;

/// Synchronous fan-out of `UiEvent`s to registered handlers.
#[derive(Default)]
pub struct EventDispatcher {
    handlers: BTreeMap<SubscriptionId, Handler>,
    next_id: u64,
}

impl Debug for EventDispatcher {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("handlers", &self.handlers.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, handler: impl FnMut(&UiEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.handlers.insert(id, Box::new(handler));
        id
    }

    /// Returns `false` when `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.handlers.remove(&id).is_some()
    }

    /// Delivers `event` to every handler; returns how many ran.
    pub fn dispatch(&mut self, event: &UiEvent) -> usize {
        for handler in self.handlers.values_mut() {
            handler(event);
        }
        debug!(
            "event=ui_dispatch module=events status=ok kind={} handlers={}",
            event.name(),
            self.handlers.len()
        );
        self.handlers.len()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// One store mutation, as accepted by `FamilyService::execute`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FamilyCommand {
    AddPerson(PersonDraft),
    UpdatePerson { id: PersonId, patch: PersonPatch },
    DeletePerson(PersonId),
    /// `a` is the `kind` of `b`.
    AddRelationship {
        a: PersonId,
        b: PersonId,
        kind: RelationshipKind,
    },
    RemoveRelationship { a: PersonId, b: PersonId },
    SetCollapsed { id: PersonId, collapsed: bool },
    ToggleCollapsed(PersonId),
}

impl FamilyCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddPerson(_) => "add_person",
            Self::UpdatePerson { .. } => "update_person",
            Self::DeletePerson(_) => "delete_person",
            Self::AddRelationship { .. } => "add_relationship",
            Self::RemoveRelationship { .. } => "remove_relationship",
            Self::SetCollapsed { .. } => "set_collapsed",
            Self::ToggleCollapsed(_) => "toggle_collapsed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{EventDispatcher, UiEvent};
    use std::cell::RefCell;
    use crate::model::person::PersonId;
    use std::rc::Rc;

    #[test]
    fn dispatch_reaches_handlers_in_subscription_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut dispatcher = EventDispatcher::new();

        let first = Rc::clone(&seen);
        dispatcher.subscribe(move |event| first.borrow_mut().push(("first", event.clone())));
        let second = Rc::clone(&seen);
        dispatcher.subscribe(move |event| second.borrow_mut().push(("second", event.clone())));

        let delivered = dispatcher.dispatch(&UiEvent::PersonCreateRequested);
        assert_eq!(delivered, 2);
        assert_eq!(
            *seen.borrow(),
            vec![
                ("first", UiEvent::PersonCreateRequested),
                ("second", UiEvent::PersonCreateRequested),
            ]
        );
    }

    #[test]
    fn unsubscribed_handler_stops_receiving() {
        let count = Rc::new(RefCell::new(0));
        let mut dispatcher = EventDispatcher::new();
        let counter = Rc::clone(&count);
        let id = dispatcher.subscribe(move |_| *counter.borrow_mut() += 1);

        dispatcher.dispatch(&UiEvent::PersonEditRequested(PersonId::generate()));
        assert!(dispatcher.unsubscribe(id));
        assert!(!dispatcher.unsubscribe(id));
        assert_eq!(dispatcher.dispatch(&UiEvent::PersonCreateRequested), 0);
        assert_eq!(*count.borrow(), 1);
        assert!(dispatcher.is_empty());
    }

    #[test]
    fn subscription_ids_are_not_reused() {
        let mut dispatcher = EventDispatcher::new();
        let first = dispatcher.subscribe(|_| {});
        dispatcher.unsubscribe(first);
        let second = dispatcher.subscribe(|_| {});
        assert_ne!(first, second);
    }
}
