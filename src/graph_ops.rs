use std::collections::VecDeque;

use petgraph::graph::NodeIndex;

use crate::mol::Mol;

/// All-pairs topological distances (number of bonds on the shortest path).
/// Unreachable pairs hold `usize::MAX`.
pub fn distance_matrix<A, B>(mol: &Mol<A, B>) -> Vec<Vec<usize>> {
    let n = mol.atom_count();
    let mut dist = vec![vec![usize::MAX; n]; n];
    for start in mol.atoms() {
        let si = start.index();
        dist[si][si] = 0;
        let mut queue = VecDeque::new();
        queue.push_back(start);
        while let Some(current) = queue.pop_front() {
            let d = dist[si][current.index()];
            for neighbor in mol.neighbors(current) {
                if dist[si][neighbor.index()] == usize::MAX {
                    dist[si][neighbor.index()] = d + 1;
                    queue.push_back(neighbor);
                }
            }
        }
    }
    dist
}

pub fn shortest_path<A, B>(
    mol: &Mol<A, B>,
    from: NodeIndex,
    to: NodeIndex,
) -> Option<Vec<NodeIndex>> {
    shortest_path_within(mol, from, to, |_| true)
}

/// Breadth-first shortest path that only steps onto atoms accepted by
/// `allowed`. The endpoints are always allowed. Ties are broken towards
/// lower atom indices.
pub fn shortest_path_within<A, B>(
    mol: &Mol<A, B>,
    from: NodeIndex,
    to: NodeIndex,
    allowed: impl Fn(NodeIndex) -> bool,
) -> Option<Vec<NodeIndex>> {
    if from == to {
        return Some(vec![from]);
    }
    let n = mol.atom_count();
    let mut pred = vec![None; n];
    let mut visited = vec![false; n];
    visited[from.index()] = true;
    let mut queue = VecDeque::new();
    queue.push_back(from);
    while let Some(current) = queue.pop_front() {
        let mut neighbors: Vec<NodeIndex> = mol.neighbors(current).collect();
        neighbors.sort();
        for neighbor in neighbors {
            if visited[neighbor.index()] || (neighbor != to && !allowed(neighbor)) {
                continue;
            }
            visited[neighbor.index()] = true;
            pred[neighbor.index()] = Some(current);
            if neighbor == to {
                let mut path = vec![to];
                let mut node = to;
                while let Some(p) = pred[node.index()] {
                    path.push(p);
                    node = p;
                }
                path.reverse();
                return Some(path);
            }
            queue.push_back(neighbor);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(n: usize) -> Mol<(), ()> {
        let mut mol = Mol::new();
        let atoms: Vec<_> = (0..n).map(|_| mol.add_atom(())).collect();
        for w in atoms.windows(2) {
            mol.add_bond(w[0], w[1], ());
        }
        mol
    }

    #[test]
    fn distance_matrix_of_chain_is_index_difference() {
        let mol = chain(5);
        let d = distance_matrix(&mol);
        for i in 0..5 {
            for j in 0..5 {
                assert_eq!(d[i][j], i.abs_diff(j));
            }
        }
    }

    #[test]
    fn disconnected_atoms_are_unreachable() {
        let mut mol = chain(3);
        let lone = mol.add_atom(());
        let d = distance_matrix(&mol);
        assert_eq!(d[0][lone.index()], usize::MAX);
        assert!(shortest_path(&mol, NodeIndex::new(0), lone).is_none());
    }

    #[test]
    fn ring_closure_shortens_paths() {
        let mut mol = chain(6);
        assert_eq!(distance_matrix(&mol)[0][5], 5);
        mol.add_bond(NodeIndex::new(0), NodeIndex::new(5), ());
        assert_eq!(distance_matrix(&mol)[0][5], 1);
        assert_eq!(distance_matrix(&mol)[1][4], 3);
    }

    #[test]
    fn restricted_path_avoids_forbidden_atoms() {
        // square 0-1-2-3-0: the short way round from 0 to 2 goes through 1
        let mut mol = chain(4);
        mol.add_bond(NodeIndex::new(3), NodeIndex::new(0), ());
        let from = NodeIndex::new(0);
        let to = NodeIndex::new(2);
        let p = shortest_path(&mol, from, to).unwrap();
        assert_eq!(p, vec![from, NodeIndex::new(1), to]);
        let p = shortest_path_within(&mol, from, to, |a| a.index() != 1).unwrap();
        assert_eq!(p, vec![from, NodeIndex::new(3), to]);
        assert!(shortest_path_within(&mol, from, to, |_| false).is_none());
    }
}
