//! Customer friendship graph
//!
//! Undirected adjacency over customer identifiers. Both directions of an edge
//! are always written and removed together.

use crate::{CustomerId, EngineError};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Undirected friendship graph
#[derive(Debug, Clone, Default)]
pub struct SocialGraph {
    adjacency: HashMap<CustomerId, HashSet<CustomerId>>,
}

impl SocialGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a friendship. Adding an existing friendship is a no-op, as is a
    /// customer befriending themselves.
    ///
    /// Returns `true` if the edge is new.
    pub fn add_edge(&mut self, customer: &str, friend: &str) -> bool {
        if customer == friend {
            return false;
        }

        let inserted = self
            .adjacency
            .entry(customer.to_string())
            .or_default()
            .insert(friend.to_string());
        self.adjacency
            .entry(friend.to_string())
            .or_default()
            .insert(customer.to_string());

        inserted
    }

    /// Remove a friendship.
    ///
    /// Fails with [`EngineError::EdgeNotFound`] if either direction is absent;
    /// the graph is left untouched in that case.
    pub fn remove_edge(&mut self, customer: &str, friend: &str) -> Result<(), EngineError> {
        if !self.contains_edge(customer, friend) || !self.contains_edge(friend, customer) {
            return Err(EngineError::EdgeNotFound {
                customer: customer.to_string(),
                friend: friend.to_string(),
            });
        }

        if let Some(friends) = self.adjacency.get_mut(customer) {
            friends.remove(friend);
        }
        if let Some(friends) = self.adjacency.get_mut(friend) {
            friends.remove(customer);
        }

        Ok(())
    }

    /// Directly connected customers, never including `customer` itself
    pub fn neighbors<'a>(&'a self, customer: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.adjacency
            .get(customer)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    /// Whether `customer` lists `friend` as a neighbor
    pub fn contains_edge(&self, customer: &str, friend: &str) -> bool {
        self.adjacency
            .get(customer)
            .is_some_and(|friends| friends.contains(friend))
    }

    /// Number of direct friends
    pub fn degree_of(&self, customer: &str) -> usize {
        self.adjacency.get(customer).map_or(0, HashSet::len)
    }

    /// Get graph statistics
    pub fn get_stats(&self) -> GraphStats {
        let endpoints: usize = self.adjacency.values().map(HashSet::len).sum();

        GraphStats {
            node_count: self.adjacency.len(),
            edge_count: endpoints / 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    /// Customers ever referenced by a friendship event
    pub node_count: usize,
    /// Current undirected friendships
    pub edge_count: usize,
}
