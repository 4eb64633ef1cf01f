//! Group-based collision filtering
//!
//! Every owner may belong to a numbered collision group. A symmetric boolean
//! matrix says which pairs of groups are tested against each other. Owners
//! without a group collide with everything.

use crate::config::ConfigError;
use serde::{Deserialize, Serialize};

/// Symmetric group-vs-group collision matrix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollisionMatrix {
    rows: Vec<Vec<bool>>,
}

impl Default for CollisionMatrix {
    /// A single group that collides with itself
    fn default() -> Self {
        Self { rows: vec![vec![true]] }
    }
}

impl CollisionMatrix {
    /// Matrix of `groups` groups where every pair collides
    pub fn all(groups: usize) -> Self {
        Self { rows: vec![vec![true; groups]; groups] }
    }

    /// Matrix of `groups` groups where no pair collides
    pub fn none(groups: usize) -> Self {
        Self { rows: vec![vec![false; groups]; groups] }
    }

    /// Build from explicit rows; call [`validate`](Self::validate) before use
    pub fn from_rows(rows: Vec<Vec<bool>>) -> Self {
        Self { rows }
    }

    /// Number of groups covered by the matrix
    pub fn group_count(&self) -> usize {
        self.rows.len()
    }

    /// Allow or forbid collisions between two groups (both directions)
    ///
    /// The matrix grows as needed; new cells default to `true`.
    pub fn allow(&mut self, a: usize, b: usize, collide: bool) {
        let needed = a.max(b) + 1;
        if needed > self.rows.len() {
            for row in &mut self.rows {
                row.resize(needed, true);
            }
            self.rows.resize(needed, vec![true; needed]);
        }
        self.rows[a][b] = collide;
        self.rows[b][a] = collide;
    }

    /// Check if two owners should be tested based on their groups
    ///
    /// Owners without a group, or with a group outside the matrix, collide
    /// with everything.
    pub fn should_collide(&self, group_a: Option<usize>, group_b: Option<usize>) -> bool {
        let (Some(a), Some(b)) = (group_a, group_b) else {
            return true;
        };
        self.rows
            .get(a)
            .and_then(|row| row.get(b))
            .copied()
            .unwrap_or(true)
    }

    /// Reject non-square or asymmetric matrices
    pub fn validate(&self) -> Result<(), ConfigError> {
        let n = self.rows.len();
        if let Some((i, row)) = self.rows.iter().enumerate().find(|(_, row)| row.len() != n) {
            return Err(ConfigError::Invalid(format!(
                "collision matrix row {i} has {} entries, expected {n}",
                row.len()
            )));
        }
        for i in 0..n {
            for j in (i + 1)..n {
                if self.rows[i][j] != self.rows[j][i] {
                    return Err(ConfigError::Invalid(format!(
                        "collision matrix is not symmetric at ({i}, {j})"
                    )));
                }
            }
        }
        Ok(())
    }
}
