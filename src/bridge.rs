//! The round bridge: the only way in and out of a round machine.
//!
//! Collaborators see two capabilities. [`TriggerSender`] feeds triggers in,
//! [`NotificationSource`] hands notifications out to exactly one handler per
//! [`NotificationKind`]. A handler answers with the next trigger, or defers
//! and sends it later itself.

use crate::protocol::{Notification, NotificationKind, Trigger};
use crate::round::{Outcome, RoundError, RoundMachine, RoundProperties, State};
use crate::settings::RoundSettings;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, warn};

/// A handler's answer to a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// Send this trigger next.
    Trigger(Trigger),
    /// The answer will arrive through a later [`TriggerSender::send_trigger`].
    Deferred,
}

pub type Handler<'h> = Box<dyn FnMut(&Notification) -> Result<Reply, RoundError> + 'h>;

pub trait TriggerSender {
    fn send_trigger(&mut self, trigger: Trigger) -> Result<(), RoundError>;
}

pub trait NotificationSource<'h> {
    fn subscribe(&mut self, kind: NotificationKind, handler: Handler<'h>)
        -> Result<(), RoundError>;
}

/// Owns the machine of the current round and its subscriptions.
///
/// ```
/// use binokel::bridge::{Reply, RoundBridge, TriggerSender, NotificationSource};
/// use binokel::protocol::{NotificationKind, Trigger};
/// use binokel::settings::RoundSettings;
///
/// let mut bridge = RoundBridge::new();
/// bridge.prepare_new_game(&RoundSettings::default(), 0).unwrap();
/// bridge
///     .subscribe(NotificationKind::DealingStarted, Box::new(|_| Ok(Reply::Deferred)))
///     .unwrap();
/// bridge.send_trigger(Trigger::GameStarted).unwrap();
/// assert_eq!(bridge.awaiting().map(|n| n.kind()), Some(NotificationKind::DealingStarted));
/// ```
#[derive(Default)]
pub struct RoundBridge<'h> {
    machine: Option<RoundMachine>,
    handlers: HashMap<NotificationKind, Handler<'h>>,
    awaiting: Option<Notification>,
}

impl fmt::Debug for RoundBridge<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.handlers.keys().collect();
        kinds.sort_by_key(|k| format!("{k:?}"));
        f.debug_struct("RoundBridge")
            .field("state", &self.machine.as_ref().map(RoundMachine::state))
            .field("subscribed", &kinds)
            .field("awaiting", &self.awaiting)
            .finish()
    }
}

impl<'h> RoundBridge<'h> {
    pub fn new() -> Self {
        Self { machine: None, handlers: HashMap::new(), awaiting: None }
    }

    /// Start a fresh round: new machine, no subscriptions.
    pub fn prepare_new_game(
        &mut self,
        settings: &RoundSettings,
        dealer: usize,
    ) -> Result<(), RoundError> {
        let machine = RoundMachine::new(settings, dealer)?;
        self.machine = Some(machine);
        self.handlers.clear();
        self.awaiting = None;
        debug!(players = settings.player_count, dealer, "round prepared");
        Ok(())
    }

    pub fn is_prepared(&self) -> bool {
        self.machine.is_some()
    }

    pub fn state(&self) -> Option<State> {
        self.machine.as_ref().map(RoundMachine::state)
    }

    pub fn properties(&self) -> Option<&RoundProperties> {
        self.machine.as_ref().map(RoundMachine::properties)
    }

    pub fn machine(&self) -> Option<&RoundMachine> {
        self.machine.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.machine.as_ref().is_some_and(RoundMachine::is_finished)
    }

    /// The last notification that has not been answered yet.
    pub fn awaiting(&self) -> Option<Notification> {
        self.awaiting
    }

    pub fn is_subscribed(&self, kind: NotificationKind) -> bool {
        self.handlers.contains_key(&kind)
    }
}

impl TriggerSender for RoundBridge<'_> {
    fn send_trigger(&mut self, trigger: Trigger) -> Result<(), RoundError> {
        let mut trigger = trigger;
        // Set while the trigger being fired came from a handler's reply.
        let mut answering: Option<NotificationKind> = None;
        loop {
            let machine = self.machine.as_mut().ok_or(RoundError::NotPrepared)?;
            let notification = match machine.fire(trigger)? {
                Outcome::Ignored => {
                    if let Some(kind) = answering {
                        warn!(?kind, ?trigger, "handler answered with an illegal trigger");
                        return Err(RoundError::Unanswered { kind });
                    }
                    return Ok(());
                }
                Outcome::Finished => {
                    self.awaiting = None;
                    return Ok(());
                }
                Outcome::Waiting(n) => n,
            };
            self.awaiting = Some(notification);
            let kind = notification.kind();
            let Some(handler) = self.handlers.get_mut(&kind) else {
                return Err(RoundError::Unconnected { kind, state: machine.state() });
            };
            match handler(&notification)? {
                Reply::Trigger(next) => {
                    trigger = next;
                    answering = Some(kind);
                }
                Reply::Deferred => return Ok(()),
            }
        }
    }
}

impl<'h> NotificationSource<'h> for RoundBridge<'h> {
    fn subscribe(
        &mut self,
        kind: NotificationKind,
        handler: Handler<'h>,
    ) -> Result<(), RoundError> {
        if self.machine.is_none() {
            return Err(RoundError::NotPrepared);
        }
        if self.handlers.contains_key(&kind) {
            return Err(RoundError::AlreadySubscribed(kind));
        }
        self.handlers.insert(kind, handler);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn prepared() -> RoundBridge<'static> {
        let mut b = RoundBridge::new();
        b.prepare_new_game(&RoundSettings::default(), 0).unwrap();
        b
    }

    #[test]
    fn send_before_prepare_fails() {
        let mut b = RoundBridge::new();
        assert!(!b.is_prepared());
        assert_eq!(b.send_trigger(Trigger::GameStarted), Err(RoundError::NotPrepared));
        let err = b.subscribe(NotificationKind::MeldingStarted, Box::new(|_| Ok(Reply::Deferred)));
        assert_eq!(err, Err(RoundError::NotPrepared));
    }

    #[test]
    fn missing_handler_is_unconnected() {
        let mut b = prepared();
        assert_eq!(
            b.send_trigger(Trigger::GameStarted),
            Err(RoundError::Unconnected {
                kind: NotificationKind::DealingStarted,
                state: State::Dealing,
            })
        );
    }

    #[test]
    fn second_subscription_is_rejected() {
        let mut b = prepared();
        let kind = NotificationKind::WaitingForCard;
        b.subscribe(kind, Box::new(|_| Ok(Reply::Deferred))).unwrap();
        let again = b.subscribe(kind, Box::new(|_| Ok(Reply::Deferred)));
        assert_eq!(again, Err(RoundError::AlreadySubscribed(kind)));
    }

    #[test]
    fn replies_chain_until_deferred() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut b = RoundBridge::new();
        b.prepare_new_game(&RoundSettings::default(), 0).unwrap();
        let log = Rc::clone(&seen);
        b.subscribe(
            NotificationKind::DealingStarted,
            Box::new(move |n| {
                log.borrow_mut().push(*n);
                Ok(Reply::Trigger(Trigger::DealingFinished))
            }),
        )
        .unwrap();
        let log = Rc::clone(&seen);
        b.subscribe(
            NotificationKind::WaitingForFirstBid,
            Box::new(move |n| {
                log.borrow_mut().push(*n);
                Ok(Reply::Deferred)
            }),
        )
        .unwrap();
        b.send_trigger(Trigger::GameStarted).unwrap();
        assert_eq!(
            *seen.borrow(),
            vec![
                Notification::DealingStarted { dealer: 0 },
                Notification::WaitingForFirstBid { seat: 1 },
            ]
        );
        assert_eq!(b.awaiting(), Some(Notification::WaitingForFirstBid { seat: 1 }));
    }

    #[test]
    fn illegal_reply_is_unanswered() {
        let mut b = prepared();
        b.subscribe(
            NotificationKind::DealingStarted,
            Box::new(|_| Ok(Reply::Trigger(Trigger::CardPlaced))),
        )
        .unwrap();
        assert_eq!(
            b.send_trigger(Trigger::GameStarted),
            Err(RoundError::Unanswered { kind: NotificationKind::DealingStarted })
        );
        assert_eq!(b.state(), Some(State::Dealing));
    }

    #[test]
    fn prepare_drops_subscriptions() {
        let mut b = prepared();
        b.subscribe(NotificationKind::DealingStarted, Box::new(|_| Ok(Reply::Deferred))).unwrap();
        b.send_trigger(Trigger::GameStarted).unwrap();
        b.prepare_new_game(&RoundSettings::default().with_players(3), 2).unwrap();
        assert!(!b.is_subscribed(NotificationKind::DealingStarted));
        assert_eq!(b.state(), Some(State::Initial));
        assert_eq!(b.awaiting(), None);
        assert_eq!(b.properties().map(RoundProperties::dealer), Some(2));
    }
}
