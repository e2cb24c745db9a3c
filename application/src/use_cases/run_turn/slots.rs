//! Exclusive ownership of conversation contexts.
//!
//! Each known conversation id maps to a slot that is either idle (holding
//! its context) or busy (a turn has taken the context out). A turn holds
//! a [`ConversationLease`] while it runs; committing the lease puts the
//! updated context back, dropping it restores the context as it was when
//! the turn began. A cancelled turn therefore never leaves partial
//! output behind.

use roundtable_domain::{ConversationContext, ConversationId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

enum Slot {
    Idle(ConversationContext),
    Busy,
}

/// Result of trying to take a conversation.
pub(crate) enum Acquire {
    /// The context was idle in memory and is now leased.
    Leased(ConversationLease, ConversationContext),
    /// Unknown in memory; leased empty, the caller should load history.
    Vacant(ConversationLease),
    /// Another turn owns this conversation.
    Busy,
}

#[derive(Default)]
pub(crate) struct ConversationSlots {
    inner: Mutex<HashMap<ConversationId, Slot>>,
}

impl ConversationSlots {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn acquire(self: &Arc<Self>, id: &ConversationId) -> Acquire {
        let mut slots = self.lock();
        match slots.insert(id.clone(), Slot::Busy) {
            Some(Slot::Busy) => Acquire::Busy,
            Some(Slot::Idle(context)) => {
                let lease = ConversationLease::new(self.clone(), id.clone(), Some(context.clone()));
                Acquire::Leased(lease, context)
            }
            None => Acquire::Vacant(ConversationLease::new(self.clone(), id.clone(), None)),
        }
    }

    /// Copy of an idle context.
    pub(crate) fn snapshot(&self, id: &ConversationId) -> Option<ConversationContext> {
        match self.lock().get(id) {
            Some(Slot::Idle(context)) => Some(context.clone()),
            _ => None,
        }
    }

    fn release(&self, id: &ConversationId, context: Option<ConversationContext>) {
        let mut slots = self.lock();
        match context {
            Some(context) => {
                slots.insert(id.clone(), Slot::Idle(context));
            }
            None => {
                slots.remove(id);
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<ConversationId, Slot>> {
        // A panic while holding the lock cannot leave the map half-updated
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Exclusive right to one conversation for the duration of a turn.
pub(crate) struct ConversationLease {
    slots: Arc<ConversationSlots>,
    id: ConversationId,
    original: Option<ConversationContext>,
    released: bool,
}

impl ConversationLease {
    fn new(
        slots: Arc<ConversationSlots>,
        id: ConversationId,
        original: Option<ConversationContext>,
    ) -> Self {
        Self {
            slots,
            id,
            original,
            released: false,
        }
    }

    pub(crate) fn id(&self) -> &ConversationId {
        &self.id
    }

    /// Store the updated context and release the conversation.
    pub(crate) fn commit(mut self, context: ConversationContext) {
        self.released = true;
        self.slots.release(&self.id, Some(context));
    }
}

impl Drop for ConversationLease {
    fn drop(&mut self) {
        if !self.released {
            self.slots.release(&self.id, self.original.take());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_is_busy_until_release() {
        let slots = ConversationSlots::new();
        let id = ConversationId::new("c-1");

        let Acquire::Vacant(lease) = slots.acquire(&id) else {
            panic!("expected vacant slot");
        };
        assert!(matches!(slots.acquire(&id), Acquire::Busy));

        let mut context = ConversationContext::new(Some(id.clone()));
        context.append_exchange("q", "a");
        lease.commit(context.clone());

        assert_eq!(slots.snapshot(&id), Some(context.clone()));
        match slots.acquire(&id) {
            Acquire::Leased(_, leased) => assert_eq!(leased, context),
            _ => panic!("expected leased context"),
        }
    }

    #[test]
    fn test_dropped_lease_restores_original() {
        let slots = ConversationSlots::new();
        let id = ConversationId::new("c-1");
        let mut original = ConversationContext::new(Some(id.clone()));
        original.append_exchange("q1", "a1");

        let Acquire::Vacant(lease) = slots.acquire(&id) else {
            panic!("expected vacant slot");
        };
        lease.commit(original.clone());

        let Acquire::Leased(lease, mut working) = slots.acquire(&id) else {
            panic!("expected leased context");
        };
        working.append_exchange("q2", "partial");
        drop(working);
        drop(lease);

        assert_eq!(slots.snapshot(&id), Some(original));
    }

    #[test]
    fn test_dropped_vacant_lease_forgets_conversation() {
        let slots = ConversationSlots::new();
        let id = ConversationId::new("c-1");
        let lease = slots.acquire(&id);
        drop(lease);
        assert!(matches!(slots.acquire(&id), Acquire::Vacant(_)));
    }
}
