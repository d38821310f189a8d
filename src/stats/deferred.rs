//! A value that becomes available later, with work queued until it does
//!
//! The background worker has to accept events before its stats snapshot has
//! loaded. Handlers run through `Deferred::run`: while loading they queue, and
//! `resolve` replays them in arrival order.

use std::cell::RefCell;
use std::rc::Rc;

type Job<T> = Box<dyn FnOnce(Result<&T, &str>)>;

enum State<T> {
    Pending(Vec<Job<T>>),
    Ready(Rc<T>),
    Failed(String),
}

pub struct Deferred<T> {
    state: RefCell<State<T>>,
}

impl<T: 'static> Default for Deferred<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> Deferred<T> {
    pub fn new() -> Self {
        Self {
            state: RefCell::new(State::Pending(Vec::new())),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(*self.state.borrow(), State::Pending(_))
    }

    /// Run `job` now if settled, otherwise once `resolve` is called
    pub fn run(&self, job: impl FnOnce(Result<&T, &str>) + 'static) {
        self.dispatch(Box::new(job));
    }

    /// Settle and replay queued jobs. Returns how many were replayed; a
    /// second call is ignored and returns 0.
    pub fn resolve(&self, outcome: Result<T, String>) -> usize {
        let queue = {
            let mut state = self.state.borrow_mut();
            if !matches!(*state, State::Pending(_)) {
                return 0;
            }
            let settled = match outcome {
                Ok(value) => State::Ready(Rc::new(value)),
                Err(e) => State::Failed(e),
            };
            match std::mem::replace(&mut *state, settled) {
                State::Pending(queue) => queue,
                _ => Vec::new(),
            }
        };

        let replayed = queue.len();
        for job in queue {
            self.dispatch(job);
        }
        replayed
    }

    fn dispatch(&self, job: Job<T>) {
        // The borrow is released before the job runs; jobs may call `run`
        let settled = match &mut *self.state.borrow_mut() {
            State::Pending(queue) => {
                queue.push(job);
                return;
            }
            State::Ready(value) => Ok(value.clone()),
            State::Failed(e) => Err(e.clone()),
        };
        match &settled {
            Ok(value) => job(Ok(value.as_ref())),
            Err(e) => job(Err(e.as_str())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{MemoryStore, Relay, Request, Response};

    #[test]
    fn test_events_before_load_are_replayed_in_order() {
        let relay: Rc<Deferred<Relay<MemoryStore>>> = Rc::new(Deferred::new());
        let answers = Rc::new(RefCell::new(Vec::new()));

        for _ in 0..3 {
            let answers = answers.clone();
            relay.run(move |relay| {
                let response = relay.unwrap().handle(Request::IncrementCorrections);
                answers.borrow_mut().push(response);
            });
        }
        assert!(relay.is_pending());
        assert!(answers.borrow().is_empty());

        assert_eq!(relay.resolve(Ok(Relay::new(MemoryStore::new()))), 3);
        let totals: Vec<Response> = answers.borrow().clone();
        assert_eq!(
            totals,
            vec![
                Response::Incremented { success: true, total: 1 },
                Response::Incremented { success: true, total: 2 },
                Response::Incremented { success: true, total: 3 },
            ]
        );
    }

    #[test]
    fn test_run_after_load_is_immediate() {
        let deferred = Deferred::new();
        deferred.resolve(Ok(7u32));
        let seen = Rc::new(RefCell::new(None));
        let sink = seen.clone();
        deferred.run(move |value| *sink.borrow_mut() = value.ok().copied());
        assert_eq!(*seen.borrow(), Some(7));
    }

    #[test]
    fn test_failed_load_reaches_queued_and_later_jobs() {
        let deferred: Deferred<u32> = Deferred::new();
        let errors = Rc::new(RefCell::new(Vec::new()));

        let sink = errors.clone();
        deferred.run(move |value| sink.borrow_mut().push(value.err().map(str::to_string)));
        assert_eq!(deferred.resolve(Err("storage unavailable".into())), 1);

        let sink = errors.clone();
        deferred.run(move |value| sink.borrow_mut().push(value.err().map(str::to_string)));
        assert_eq!(
            *errors.borrow(),
            vec![Some("storage unavailable".to_string()), Some("storage unavailable".to_string())]
        );
    }

    #[test]
    fn test_second_resolve_is_ignored() {
        let deferred = Deferred::new();
        deferred.resolve(Ok(1u32));
        assert_eq!(deferred.resolve(Ok(2u32)), 0);

        let seen = Rc::new(RefCell::new(0));
        let sink = seen.clone();
        deferred.run(move |value| *sink.borrow_mut() = *value.unwrap());
        assert_eq!(*seen.borrow(), 1);
    }

    #[test]
    fn test_job_may_queue_more_work() {
        let deferred: Rc<Deferred<u32>> = Rc::new(Deferred::new());
        let count = Rc::new(RefCell::new(0));

        let inner = deferred.clone();
        let sink = count.clone();
        deferred.run(move |_| {
            *sink.borrow_mut() += 1;
            let sink = sink.clone();
            inner.run(move |_| *sink.borrow_mut() += 1);
        });
        deferred.resolve(Ok(0));
        assert_eq!(*count.borrow(), 2);
    }
}
