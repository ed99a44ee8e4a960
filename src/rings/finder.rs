//! Torsion-space search for ring-closing conformations of a chain.
//!
//! The chain is given as points `[h2, h1, .., t1, t2]`: `h1` and `t1` are
//! the atoms that would carry the ring-closing bond, `h2` and `t2` are the
//! attractors bonded to them. Bond `k` joins points `k` and `k + 1`.

use nalgebra::Point3;
use tracing::{debug, trace, warn};

use super::error::{RingClosureError, Result};
use super::geometry::{angle, dihedral, rotate_about_bond, wrap_degrees, ClosureConditions};
use super::params::{check_search_step, RingClosureParams};

/// Result of a torsion search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FinderOutcome {
    pub closable: bool,
    /// One torsion per chain bond for every closing combination found.
    pub conformations: Vec<Vec<f64>>,
    /// The chain was too flexible to search and was assumed closable.
    pub assumed: bool,
}

#[derive(Debug, Clone)]
pub struct RingClosureFinder {
    max_rot_bonds: usize,
    linearity_limit: f64,
    tolerance_factor: f64,
    max_dot: f64,
    step: f64,
    exhaustive: bool,
}

impl RingClosureFinder {
    pub fn new(params: &RingClosureParams) -> Self {
        Self {
            max_rot_bonds: params.max_rot_bonds,
            linearity_limit: params.linearity_limit,
            tolerance_factor: params.distance_tolerance * params.extra_distance_tolerance,
            max_dot: params.max_dot,
            step: params.conf_search_step,
            exhaustive: params.exhaustive_conf_search,
        }
    }

    pub fn with_step(mut self, step: f64) -> Self {
        self.step = step;
        self
    }

    pub fn exhaustive(mut self, exhaustive: bool) -> Self {
        self.exhaustive = exhaustive;
        self
    }

    /// Scans the torsions of the rotatable bonds of the chain.
    ///
    /// `dihedral_refs[k]` holds the four points defining the torsion of bond
    /// `k + 1`; the first and last bonds have no torsion reference.
    pub fn search(
        &self,
        points: &[Point3<f64>],
        rotatable: &[bool],
        dihedral_refs: &[[Point3<f64>; 4]],
    ) -> Result<FinderOutcome> {
        check_search_step(self.step)?;
        let n = points.len();
        if n < 3 {
            return Err(RingClosureError::InconsistentPath(format!(
                "a closable chain needs at least 3 points, got {n}"
            )));
        }
        let bonds = n - 1;
        if rotatable.len() != bonds || dihedral_refs.len() != bonds - 2 {
            return Err(RingClosureError::InconsistentPath(format!(
                "{n} points with {} rotatability flags and {} torsion references",
                rotatable.len(),
                dihedral_refs.len()
            )));
        }

        if n > self.max_rot_bonds + 2 {
            warn!(
                points = n,
                max_rot_bonds = self.max_rot_bonds,
                "chain too long for conformational search; assuming it is closable"
            );
            return Ok(FinderOutcome {
                closable: true,
                conformations: Vec::new(),
                assumed: true,
            });
        }

        let mut rotatable = rotatable.to_vec();
        for i in 2..n {
            if angle(&points[i - 2], &points[i - 1], &points[i]) >= self.linearity_limit {
                trace!(bond = i - 1, "near-linear triplet; bond treated as fixed");
                rotatable[i - 1] = false;
            }
        }

        let mut base = vec![0.0; bonds];
        for (k, r) in dihedral_refs.iter().enumerate() {
            base[k + 1] = dihedral(&r[0], &r[1], &r[2], &r[3]);
        }

        let conditions = ClosureConditions::from_ends(
            &points[0],
            &points[1],
            &points[n - 2],
            &points[n - 1],
            self.tolerance_factor,
            self.max_dot,
        );

        let mut scan = Scan {
            points: points.to_vec(),
            rotatable: &rotatable,
            increments: vec![0.0; bonds],
            base: &base,
            conditions,
            step: self.step,
            exhaustive: self.exhaustive,
            found: Vec::new(),
        };
        scan.visit(0);

        debug!(
            points = n,
            rotatable = rotatable.iter().filter(|&&r| r).count(),
            step = self.step,
            found = scan.found.len(),
            "conformational search done"
        );
        Ok(FinderOutcome {
            closable: !scan.found.is_empty(),
            conformations: scan.found,
            assumed: false,
        })
    }
}

struct Scan<'a> {
    points: Vec<Point3<f64>>,
    rotatable: &'a [bool],
    increments: Vec<f64>,
    base: &'a [f64],
    conditions: ClosureConditions,
    step: f64,
    exhaustive: bool,
    found: Vec<Vec<f64>>,
}

impl Scan<'_> {
    /// Returns true when the search must stop.
    fn visit(&mut self, level: usize) -> bool {
        let n = self.points.len();
        if level == n - 1 {
            let p = &self.points;
            if self.conditions.is_satisfied(&p[0], &p[1], &p[n - 2], &p[n - 1]) {
                let conformation = self
                    .base
                    .iter()
                    .zip(&self.increments)
                    .map(|(b, i)| wrap_degrees(b + i))
                    .collect();
                self.found.push(conformation);
                return !self.exhaustive;
            }
            return false;
        }

        let steps = if self.rotatable[level] {
            (360.0 / self.step).round().max(1.0) as usize
        } else {
            1
        };
        let mut applied = 0usize;
        let mut stop = false;
        for i in 0..steps {
            if i > 0 {
                rotate_about_bond(&mut self.points, level, level + 1, level + 2, self.step);
                self.increments[level] += self.step;
                applied += 1;
            }
            if self.visit(level + 1) {
                stop = true;
                break;
            }
        }
        if applied > 0 {
            let back = self.step * applied as f64;
            rotate_about_bond(&mut self.points, level, level + 1, level + 2, -back);
            self.increments[level] -= back;
        }
        stop
    }
}
