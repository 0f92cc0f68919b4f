//! Ordered, rotatable set of interchangeable upload endpoints.
//!
//! The pool owns a single cursor. Rotation is the only mutation and requires
//! `&mut self`, so one job at a time can move it; callers that share a pool
//! across threads wrap it in a `Mutex` and hold the lock across
//! `candidates()` + `rotate()`.

use std::collections::HashSet;

use crate::error::PoolError;
use crate::server::Endpoint;

#[derive(Debug, Clone)]
pub struct DestinationPool {
    endpoints: Vec<Endpoint>,
    cursor: usize,
}

impl DestinationPool {
    /// Builds a pool with the cursor on the first endpoint. Rejects fewer
    /// than two endpoints and duplicates.
    pub fn new(endpoints: Vec<Endpoint>) -> Result<Self, PoolError> {
        if endpoints.len() < 2 {
            return Err(PoolError::TooFewEndpoints(endpoints.len()));
        }
        let mut seen = HashSet::new();
        for ep in &endpoints {
            if !seen.insert(ep) {
                return Err(PoolError::DuplicateEndpoint(ep.clone()));
            }
        }
        Ok(Self { endpoints, cursor: 0 })
    }

    pub fn current(&self) -> Result<&Endpoint, PoolError> {
        self.endpoints.get(self.cursor).ok_or(PoolError::Empty)
    }

    /// Every endpoint once, starting at the cursor and wrapping around.
    pub fn candidates(&self) -> Candidates<'_> {
        Candidates { pool: self, offset: 0 }
    }

    pub fn rotate(&mut self, n: usize) {
        if self.endpoints.is_empty() {
            return;
        }
        self.cursor = (self.cursor + n % self.endpoints.len()) % self.endpoints.len();
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }
}

pub struct Candidates<'a> {
    pool: &'a DestinationPool,
    offset: usize,
}

impl<'a> Iterator for Candidates<'a> {
    type Item = &'a Endpoint;

    fn next(&mut self) -> Option<Self::Item> {
        let len = self.pool.endpoints.len();
        if self.offset >= len {
            return None;
        }
        let idx = (self.pool.cursor + self.offset) % len;
        self.offset += 1;
        self.pool.endpoints.get(idx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rem = self.pool.endpoints.len().saturating_sub(self.offset);
        (rem, Some(rem))
    }
}

impl ExactSizeIterator for Candidates<'_> {}
