//! Degree-bounded social network traversal

use crate::social_graph::SocialGraph;
use std::collections::{HashSet, VecDeque};

/// Customers within `degree` hops of `start`, excluding `start` itself.
///
/// Breadth-first: a customer is accepted the first time it is reached, and
/// only customers accepted below `degree` hops are expanded further, so the
/// walk never leaves the `degree`-hop ball.
pub fn within_degree<'a>(graph: &'a SocialGraph, start: &'a str, degree: usize) -> HashSet<&'a str> {
    let mut visited: HashSet<&str> = HashSet::from([start]);
    let mut network = HashSet::new();
    let mut queue = VecDeque::from([(start, 0usize)]);

    while let Some((customer, depth)) = queue.pop_front() {
        if depth > 0 {
            network.insert(customer);
        }
        if depth == degree {
            continue;
        }

        for friend in graph.neighbors(customer) {
            if visited.insert(friend) {
                queue.push_back((friend, depth + 1));
            }
        }
    }

    network
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_graph(len: usize) -> SocialGraph {
        let mut graph = SocialGraph::new();
        for i in 1..len {
            graph.add_edge(&(i - 1).to_string(), &i.to_string());
        }
        graph
    }

    fn sorted(set: HashSet<&str>) -> Vec<String> {
        let mut ids: Vec<String> = set.into_iter().map(str::to_string).collect();
        ids.sort();
        ids
    }

    #[test]
    fn test_degree_zero_is_empty() {
        let graph = line_graph(4);
        assert!(within_degree(&graph, "0", 0).is_empty());
    }

    #[test]
    fn test_hops_are_bounded() {
        let graph = line_graph(6);
        assert_eq!(sorted(within_degree(&graph, "0", 1)), vec!["1"]);
        assert_eq!(sorted(within_degree(&graph, "0", 2)), vec!["1", "2"]);
        assert_eq!(sorted(within_degree(&graph, "2", 2)), vec!["0", "1", "3", "4"]);
    }

    #[test]
    fn test_never_includes_start_even_in_cycles() {
        let mut graph = SocialGraph::new();
        graph.add_edge("A", "B");
        graph.add_edge("B", "C");
        graph.add_edge("C", "A");

        let network = within_degree(&graph, "A", 5);
        assert!(!network.contains("A"));
        assert_eq!(sorted(network), vec!["B", "C"]);
    }

    #[test]
    fn test_large_degree_covers_component() {
        let mut graph = line_graph(5);
        graph.add_edge("X", "Y");

        let network = within_degree(&graph, "4", usize::MAX);
        assert_eq!(sorted(network), vec!["0", "1", "2", "3"]);
    }

    #[test]
    fn test_shortest_path_wins_over_longer_route() {
        // A-B-C-D plus shortcut A-D: D is one hop away
        let mut graph = line_graph(0);
        graph.add_edge("A", "B");
        graph.add_edge("B", "C");
        graph.add_edge("C", "D");
        graph.add_edge("A", "D");

        assert_eq!(sorted(within_degree(&graph, "A", 1)), vec!["B", "D"]);
    }

    #[test]
    fn test_unknown_start() {
        let graph = line_graph(3);
        assert!(within_degree(&graph, "missing", 3).is_empty());
    }
}
