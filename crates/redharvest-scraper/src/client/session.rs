//! Rotating pool of request identities.
//!
//! A session is a browser-like identity (currently just its `User-Agent`).
//! Sessions are retired after a fixed number of requests, or as soon as one
//! receives a blocking response, and the pool refills itself lazily.

use parking_lot::Mutex;
use rand::seq::IndexedRandom;
use rand::Rng;

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14.7; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36 Edg/131.0.0.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:132.0) Gecko/20100101 Firefox/132.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36 Edg/130.0.0.0",
];

/// The identity a single request is made under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLease {
    pub id: u64,
    pub user_agent: &'static str,
}

#[derive(Debug)]
struct Session {
    id: u64,
    user_agent: &'static str,
    usage: u32,
}

#[derive(Debug, Default)]
struct PoolState {
    sessions: Vec<Session>,
    next_id: u64,
    retired: u64,
}

#[derive(Debug)]
pub struct SessionPool {
    state: Mutex<PoolState>,
    size: usize,
    max_usage: u32,
}

impl SessionPool {
    /// Creates an empty pool holding at most `size` live sessions, each
    /// serving at most `max_usage` requests.
    #[must_use]
    pub fn new(size: usize, max_usage: u32) -> Self {
        Self {
            state: Mutex::new(PoolState::default()),
            size: size.max(1),
            max_usage: max_usage.max(1),
        }
    }

    /// Picks a session for one request, opening a new one while the pool is
    /// below its size. A session that reaches its usage limit is retired
    /// after this lease.
    pub fn acquire(&self) -> SessionLease {
        let mut state = self.state.lock();
        let mut rng = rand::rng();

        let index = if state.sessions.len() < self.size {
            let id = state.next_id;
            state.next_id += 1;
            let user_agent = USER_AGENTS.choose(&mut rng).copied().unwrap_or(USER_AGENTS[0]);
            state.sessions.push(Session {
                id,
                user_agent,
                usage: 0,
            });
            state.sessions.len() - 1
        } else {
            rng.random_range(0..state.sessions.len())
        };

        let session = &mut state.sessions[index];
        session.usage += 1;
        let lease = SessionLease {
            id: session.id,
            user_agent: session.user_agent,
        };
        if session.usage >= self.max_usage {
            state.sessions.swap_remove(index);
            state.retired += 1;
        }
        lease
    }

    /// Retires the session behind `lease` so no further request uses it.
    pub fn mark_bad(&self, lease: &SessionLease) {
        let mut state = self.state.lock();
        if let Some(pos) = state.sessions.iter().position(|s| s.id == lease.id) {
            state.sessions.swap_remove(pos);
            state.retired += 1;
            tracing::debug!(session = lease.id, "session retired after blocking response");
        }
    }

    /// Number of live sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sessions retired so far, by usage or by a blocking response.
    #[must_use]
    pub fn retired(&self) -> u64 {
        self.state.lock().retired
    }
}
