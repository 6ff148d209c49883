//! State observation.
//!
//! A [`StateSubject`] holds a store's latest snapshot and notifies
//! subscribers on every publish. [`on_next_terminal_state`] builds a one-shot
//! watcher on top of it.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use super::store::StoreState;

type Observer<S> = Arc<dyn Fn(&S) + Send + Sync>;

/// A state variant after which no further transition of interest occurs,
/// e.g. the success or failure of an operation.
pub trait Terminal {
    fn is_terminal(&self) -> bool;
}

struct SubjectInner<S> {
    current: S,
    observers: Vec<(u64, Observer<S>)>,
}

/// Latest-value state holder with synchronous subscribers.
pub struct StateSubject<S> {
    inner: Arc<Mutex<SubjectInner<S>>>,
    next_id: AtomicU64,
}

impl<S: StoreState> StateSubject<S> {
    pub fn new(initial: S) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SubjectInner {
                current: initial,
                observers: Vec::new(),
            })),
            next_id: AtomicU64::new(0),
        }
    }

    /// Clone of the current snapshot.
    pub fn get(&self) -> S {
        self.inner.lock().current.clone()
    }

    /// Replace the snapshot and notify every subscriber.
    ///
    /// Observers run after the lock is released, so they may read the
    /// subject, subscribe or unsubscribe.
    pub fn publish(&self, state: S) {
        let observers: Vec<Observer<S>> = {
            let mut inner = self.inner.lock();
            inner.current = state.clone();
            inner
                .observers
                .iter()
                .map(|(_, observer)| Arc::clone(observer))
                .collect()
        };
        for observer in observers {
            observer(&state);
        }
    }

    /// Register `observer` for future publishes. The current snapshot is not
    /// replayed.
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&S) + Send + Sync + 'static,
    {
        self.subscribe_seeded(|_| observer)
    }

    /// Register an observer built from the current snapshot.
    ///
    /// The snapshot read and the registration happen under one lock, so every
    /// publish is either visible to `build` or delivered to the observer.
    /// `build` runs with the subject locked and must not call back into it.
    pub fn subscribe_seeded<F, B>(&self, build: B) -> Subscription
    where
        F: Fn(&S) + Send + Sync + 'static,
        B: FnOnce(&S) -> F,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        {
            let mut inner = self.inner.lock();
            let observer: Observer<S> = Arc::new(build(&inner.current));
            inner.observers.push((id, observer));
        }

        let weak: Weak<Mutex<SubjectInner<S>>> = Arc::downgrade(&self.inner);
        Subscription {
            detach: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.lock().observers.retain(|(other, _)| *other != id);
                }
            })),
        }
    }

    /// Number of attached subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().observers.len()
    }
}

impl<S: StoreState> Default for StateSubject<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

impl<S> fmt::Debug for StateSubject<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateSubject")
            .field("subscribers", &self.inner.lock().observers.len())
            .finish()
    }
}

/// Handle to an attached observer. Dropping it detaches the observer.
#[must_use = "dropping a Subscription detaches the observer immediately"]
pub struct Subscription {
    detach: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        self.detach_now();
    }

    fn detach_now(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("attached", &self.detach.is_some())
            .finish()
    }
}

/// Fire `callback` once, the next time the field picked by `extract`
/// changes into a terminal value.
///
/// The value at subscription time is the baseline and never fires, even if
/// it is already terminal. After firing, the watcher detaches itself; the
/// returned [`Subscription`] can also be dropped early to cancel it.
pub fn on_next_terminal_state<S, T, E, C>(
    subject: &StateSubject<S>,
    extract: E,
    callback: C,
) -> Subscription
where
    S: StoreState,
    T: Terminal + PartialEq + Send + 'static,
    E: Fn(&S) -> T + Send + Sync + 'static,
    C: FnOnce(T) + Send + 'static,
{
    struct Watch<T, C> {
        last: Option<T>,
        callback: Option<C>,
    }

    let watch = Arc::new(Mutex::new(Watch {
        last: None,
        callback: Some(callback),
    }));
    let self_detach: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

    let watch_for_observer = Arc::clone(&watch);
    let detach_for_observer = Arc::clone(&self_detach);
    let subscription = subject.subscribe_seeded(|current| {
        watch_for_observer.lock().last = Some(extract(current));
        move |state: &S| {
            let value = extract(state);
            let fire = {
                let mut watch = watch_for_observer.lock();
                if watch.last.as_ref() == Some(&value) {
                    return;
                }
                let fire = if value.is_terminal() {
                    watch.callback.take()
                } else {
                    None
                };
                if fire.is_none() {
                    watch.last = Some(value);
                    return;
                }
                fire
            };
            if let Some(callback) = fire {
                if let Some(subscription) = detach_for_observer.lock().take() {
                    subscription.unsubscribe();
                }
                callback(value);
            }
        }
    });

    // One half lets the watcher remove itself after firing, the other lets
    // the caller cancel early.
    let (owned, returned) = subscription.split();
    *self_detach.lock() = Some(owned);

    // A publish racing the registration may have fired before the owned half
    // was installed; the watcher then could not detach itself.
    let fired = watch.lock().callback.is_none();
    if fired {
        let owned = self_detach.lock().take();
        if let Some(owned) = owned {
            owned.unsubscribe();
        }
    }
    returned
}

impl Subscription {
    /// Split into two handles that both detach the same observer; whichever
    /// runs first wins.
    fn split(mut self) -> (Subscription, Subscription) {
        let detach = self.detach.take();
        let shared: Arc<Mutex<Option<Box<dyn FnOnce() + Send + Sync>>>> =
            Arc::new(Mutex::new(detach));
        let twin = Arc::clone(&shared);
        let first = Subscription {
            detach: Some(Box::new(move || {
                if let Some(detach) = shared.lock().take() {
                    detach();
                }
            })),
        };
        let second = Subscription {
            detach: Some(Box::new(move || {
                if let Some(detach) = twin.lock().take() {
                    detach();
                }
            })),
        };
        (first, second)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Default)]
    enum Phase {
        #[default]
        Idle,
        Running,
        Done,
        Failed,
    }

    impl Terminal for Phase {
        fn is_terminal(&self) -> bool {
            matches!(self, Phase::Done | Phase::Failed)
        }
    }

    #[derive(Debug, Clone, PartialEq, Default)]
    struct JobState {
        phase: Phase,
        progress: u8,
    }

    impl StoreState for JobState {}

    fn at(phase: Phase, progress: u8) -> JobState {
        JobState { phase, progress }
    }

    #[test]
    fn publish_notifies_subscribers() {
        let subject = StateSubject::<JobState>::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = subject.subscribe(move |state: &JobState| sink.lock().push(state.progress));

        subject.publish(at(Phase::Running, 10));
        subject.publish(at(Phase::Running, 20));

        assert_eq!(*seen.lock(), vec![10, 20]);
        assert_eq!(subject.get(), at(Phase::Running, 20));
    }

    #[test]
    fn dropping_subscription_detaches() {
        let subject = StateSubject::<JobState>::default();
        assert_eq!(subject.get().phase, Phase::Idle);
        let sub = subject.subscribe(|_: &JobState| {});
        assert_eq!(subject.subscriber_count(), 1);
        drop(sub);
        assert_eq!(subject.subscriber_count(), 0);
    }

    #[test]
    fn terminal_watch_fires_once_and_detaches() {
        let subject = StateSubject::<JobState>::default();
        let fired = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&fired);
        let _watch = on_next_terminal_state(
            &subject,
            |state: &JobState| state.phase,
            move |phase| sink.lock().push(phase),
        );

        subject.publish(at(Phase::Running, 50));
        assert!(fired.lock().is_empty());

        subject.publish(at(Phase::Done, 100));
        subject.publish(at(Phase::Failed, 100));

        assert_eq!(*fired.lock(), vec![Phase::Done]);
        assert_eq!(subject.subscriber_count(), 0);
    }

    #[test]
    fn terminal_baseline_does_not_fire() {
        let subject = StateSubject::new(at(Phase::Done, 100));
        let fired = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&fired);
        let _watch = on_next_terminal_state(
            &subject,
            |state: &JobState| state.phase,
            move |_| *sink.lock() += 1,
        );

        // Same field value with other fields changing is not a transition.
        subject.publish(at(Phase::Done, 99));
        assert_eq!(*fired.lock(), 0);

        subject.publish(at(Phase::Running, 0));
        subject.publish(at(Phase::Failed, 0));
        assert_eq!(*fired.lock(), 1);
    }

    #[test]
    fn dropping_watch_cancels_it() {
        let subject = StateSubject::<JobState>::default();
        let fired = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&fired);
        let watch = on_next_terminal_state(
            &subject,
            |state: &JobState| state.phase,
            move |_| *sink.lock() += 1,
        );
        drop(watch);

        subject.publish(at(Phase::Done, 100));
        assert_eq!(*fired.lock(), 0);
        assert_eq!(subject.subscriber_count(), 0);
    }

    #[test]
    fn transition_racing_the_watch_registration_is_never_lost() {
        for _ in 0..200 {
            let subject = Arc::new(StateSubject::new(at(Phase::Running, 50)));
            let extracted = Arc::new(Mutex::new(Vec::new()));
            let fired = Arc::new(Mutex::new(Vec::new()));
            let barrier = Arc::new(std::sync::Barrier::new(2));

            let publisher = {
                let subject = Arc::clone(&subject);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    subject.publish(at(Phase::Done, 100));
                })
            };

            barrier.wait();
            let seen = Arc::clone(&extracted);
            let sink = Arc::clone(&fired);
            let _watch = on_next_terminal_state(
                &*subject,
                move |state: &JobState| {
                    seen.lock().push(state.phase);
                    state.phase
                },
                move |phase| sink.lock().push(phase),
            );
            publisher.join().unwrap();

            // The first extraction is the baseline.
            let baseline = extracted.lock()[0];
            if baseline == Phase::Running {
                assert_eq!(*fired.lock(), vec![Phase::Done]);
                assert_eq!(subject.subscriber_count(), 0);
            } else {
                assert_eq!(baseline, Phase::Done);
                assert!(fired.lock().is_empty());
                assert_eq!(subject.subscriber_count(), 1);
            }
        }
    }

    #[test]
    fn seeded_subscription_sees_current_snapshot() {
        let subject = StateSubject::new(at(Phase::Running, 7));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = subject.subscribe_seeded(|current: &JobState| {
            let start = current.progress;
            move |state: &JobState| sink.lock().push(state.progress - start)
        });

        subject.publish(at(Phase::Running, 10));

        assert_eq!(*seen.lock(), vec![3]);
    }
}
