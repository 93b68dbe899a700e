//! Solution verification.
//!
//! A placement is correct when every chosen box lies inside the container,
//! no two chosen boxes share interior volume, item ids are unique, and the
//! volume the solver reports equals the volume of the boxes it chose.
//! [`verify`] runs all four checks to completion and returns every defect it
//! finds, not just the first one.

use crate::error::Result;
use crate::geometry::Aabb;
use crate::model::Instance;
use crate::placement::Placement;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// A single broken invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationFailure {
    /// A chosen item sticks out of the container or has a negative coordinate.
    OutOfBounds {
        id: u32,
        dimensions: [u32; 3],
        position: [i32; 3],
    },
    /// Two chosen items share interior volume.
    Overlap { id: u32, other: u32 },
    /// More than one item carries this id.
    DuplicateId { id: u32 },
    /// The reported packed volume differs from the chosen items' volume.
    VolumeMismatch { reported: u64, computed: u64 },
}

impl fmt::Display for VerificationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerificationFailure::OutOfBounds {
                id,
                dimensions: [dx, dy, dz],
                position: [x, y, z],
            } => write!(f, "badplace item {} [{},{},{}] {},{},{}", id, dx, dy, dz, x, y, z),
            VerificationFailure::Overlap { id, other } => {
                write!(f, "overlap items {},{}", id, other)
            }
            VerificationFailure::DuplicateId { id } => write!(f, "duplicated item {}", id),
            VerificationFailure::VolumeMismatch { reported, computed } => {
                write!(f, "incorrect objective {} {}", reported, computed)
            }
        }
    }
}

/// All defects found in one verification pass. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violations {
    failures: Vec<VerificationFailure>,
}

impl Violations {
    /// The failures, in check order.
    pub fn failures(&self) -> &[VerificationFailure] {
        &self.failures
    }

    /// Number of failures.
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// Returns true if there are no failures.
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Returns true if any failure satisfies the predicate.
    pub fn any(&self, pred: impl Fn(&VerificationFailure) -> bool) -> bool {
        self.failures.iter().any(pred)
    }

    pub fn into_failures(self) -> Vec<VerificationFailure> {
        self.failures
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.failures.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", failure)?;
        }
        Ok(())
    }
}

impl std::error::Error for Violations {}

/// Checks the placement state stored in `instance` against the solver's
/// reported packed volume.
pub fn verify(instance: &Instance, reported_volume: u64) -> std::result::Result<(), Violations> {
    let mut failures = Vec::new();

    check_bounds(instance, &mut failures);
    check_overlaps(instance, &mut failures);
    check_unique_ids(instance, &mut failures);

    let computed = instance.chosen_volume();
    if computed != reported_volume {
        failures.push(VerificationFailure::VolumeMismatch {
            reported: reported_volume,
            computed,
        });
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(Violations { failures })
    }
}

/// Applies `placement` to a copy of `instance` and verifies the result.
pub fn verify_placement(instance: &Instance, placement: &Placement) -> Result<()> {
    let mut placed = instance.clone();
    placed.apply(placement)?;
    verify(&placed, placement.total_volume)?;
    Ok(())
}

fn check_bounds(instance: &Instance, failures: &mut Vec<VerificationFailure>) {
    let container = instance.container.aabb();
    for item in instance.items.iter().filter(|i| i.chosen) {
        if !item.aabb().is_within(&container) {
            failures.push(VerificationFailure::OutOfBounds {
                id: item.id,
                dimensions: item.dimensions(),
                position: item.position(),
            });
        }
    }
}

/// Sort-and-sweep along x: once a box starts at or beyond the current box's
/// end, no later box can overlap it.
fn check_overlaps(instance: &Instance, failures: &mut Vec<VerificationFailure>) {
    let mut boxes: Vec<(usize, Aabb)> = instance
        .items
        .iter()
        .enumerate()
        .filter(|(_, item)| item.chosen)
        .map(|(idx, item)| (idx, item.aabb()))
        .collect();
    boxes.sort_by_key(|(idx, b)| (b.min[0], *idx));

    let mut pairs = Vec::new();
    for (pos, (a_idx, a)) in boxes.iter().enumerate() {
        for (b_idx, b) in &boxes[pos + 1..] {
            if b.min[0] >= a.max[0] {
                break;
            }
            if a.intersects(b) {
                pairs.push(((*a_idx).min(*b_idx), (*a_idx).max(*b_idx)));
            }
        }
    }
    pairs.sort_unstable();

    failures.extend(pairs.into_iter().map(|(i, j)| VerificationFailure::Overlap {
        id: instance.items[i].id,
        other: instance.items[j].id,
    }));
}

fn check_unique_ids(instance: &Instance, failures: &mut Vec<VerificationFailure>) {
    let mut seen = HashSet::with_capacity(instance.items.len());
    let mut reported = HashSet::new();
    for item in &instance.items {
        if !seen.insert(item.id) && reported.insert(item.id) {
            failures.push(VerificationFailure::DuplicateId { id: item.id });
        }
    }
}
