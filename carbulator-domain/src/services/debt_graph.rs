//! Cycle cancellation over the debt graph.
//!
//! A debt matrix is read as a weighted directed graph: every nonzero cell
//! `(debtor, creditor)` is an edge. Cancelling the smallest weight around a
//! directed cycle removes at least one edge and changes every node's inflow
//! and outflow by the same amount, so net balances never move.

use crate::services::DebtMatrix;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    Unvisited,
    OnPath,
    Done,
}

impl DebtMatrix {
    /// First simple directed cycle in depth-first order, as member indices.
    ///
    /// Roots are tried in ascending index order and successors are visited in
    /// ascending index order, so the same matrix always yields the same cycle.
    pub fn find_cycle(&self) -> Option<Vec<usize>> {
        let size = self.size();
        let mut visits = vec![Visit::Unvisited; size];

        for root in 0..size {
            if visits[root] != Visit::Unvisited {
                continue;
            }

            visits[root] = Visit::OnPath;
            let mut path = vec![root];
            // Next creditor index to examine for each node on the path.
            let mut cursors = vec![0_usize];

            while let Some(&node) = path.last() {
                let depth = path.len() - 1;
                let next = (cursors[depth]..size).find(|&c| !self.get(node, c).is_zero());

                let Some(successor) = next else {
                    visits[node] = Visit::Done;
                    path.pop();
                    cursors.pop();
                    continue;
                };
                cursors[depth] = successor + 1;

                match visits[successor] {
                    Visit::OnPath => {
                        let start = path.iter().position(|&v| v == successor)?;
                        return Some(path[start..].to_vec());
                    }
                    Visit::Unvisited => {
                        visits[successor] = Visit::OnPath;
                        path.push(successor);
                        cursors.push(0);
                    }
                    Visit::Done => {}
                }
            }
        }

        None
    }

    pub fn is_acyclic(&self) -> bool {
        self.find_cycle().is_none()
    }
}

/// Removes circular debt by repeated cycle cancellation.
///
/// The result is acyclic and settlement-equivalent to the input. It is not
/// guaranteed to use the fewest possible transfers.
pub struct DebtGraphSimplifier;

impl DebtGraphSimplifier {
    pub fn simplify(&self, mut matrix: DebtMatrix) -> DebtMatrix {
        let initial_edges = matrix.edge_count();
        let mut cancelled_cycles = 0_usize;

        while let Some(cycle) = matrix.find_cycle() {
            let edges: Vec<(usize, usize)> = cycle
                .iter()
                .enumerate()
                .map(|(pos, &debtor)| (debtor, cycle[(pos + 1) % cycle.len()]))
                .collect();
            let Some(min_weight) = edges
                .iter()
                .map(|&(debtor, creditor)| matrix.get(debtor, creditor))
                .min()
            else {
                break;
            };

            for &(debtor, creditor) in &edges {
                matrix.add(debtor, creditor, -min_weight);
            }
            cancelled_cycles += 1;

            tracing::trace!(
                cycle = ?cycle.iter().map(|&idx| matrix.member_at(idx).0).collect::<Vec<_>>(),
                cycle_len = cycle.len(),
                min_weight = %min_weight,
                "Debt cycle cancelled"
            );
        }

        tracing::debug!(
            member_count = matrix.size(),
            initial_edges,
            remaining_edges = matrix.edge_count(),
            cancelled_cycles,
            "Debt graph simplified"
        );

        matrix
    }
}
