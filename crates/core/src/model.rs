//! Items, containers and instances.

use crate::error::{Error, Result};
use crate::geometry::Aabb;
use crate::placement::Placement;
use serde::{Deserialize, Serialize};

/// Default container width.
pub const DEFAULT_WIDTH: u32 = 230;
/// Default container height.
pub const DEFAULT_HEIGHT: u32 = 230;
/// Default container depth.
pub const DEFAULT_DEPTH: u32 = 590;

/// A box shape that can be shared by several items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemType {
    pub dx: u32,
    pub dy: u32,
    pub dz: u32,
}

impl ItemType {
    /// Creates a new box type.
    pub fn new(dx: u32, dy: u32, dz: u32) -> Self {
        Self { dx, dy, dz }
    }

    /// Box volume.
    pub fn volume(&self) -> u64 {
        u64::from(self.dx) * u64::from(self.dy) * u64::from(self.dz)
    }

    /// Box volume, or `None` if it does not fit in a `u64`.
    pub fn checked_volume(&self) -> Option<u64> {
        checked_product([self.dx, self.dy, self.dz])
    }

    /// Edge lengths as an array.
    pub fn dimensions(&self) -> [u32; 3] {
        [self.dx, self.dy, self.dz]
    }
}

/// A box of an instance together with its placement state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Item number, unique within an instance
    pub id: u32,
    pub dx: u32,
    pub dy: u32,
    pub dz: u32,
    /// Position, meaningful only when `chosen`
    pub x: i32,
    pub y: i32,
    pub z: i32,
    /// Whether the solver packed this item
    pub chosen: bool,
}

impl Item {
    /// Creates an unchosen item of the given type at the origin.
    pub fn from_type(id: u32, item_type: ItemType) -> Self {
        Self {
            id,
            dx: item_type.dx,
            dy: item_type.dy,
            dz: item_type.dz,
            x: 0,
            y: 0,
            z: 0,
            chosen: false,
        }
    }

    /// Creates a chosen item at the given position.
    pub fn placed(id: u32, dims: [u32; 3], position: [i32; 3]) -> Self {
        Self {
            id,
            dx: dims[0],
            dy: dims[1],
            dz: dims[2],
            x: position[0],
            y: position[1],
            z: position[2],
            chosen: true,
        }
    }

    /// Item volume.
    pub fn volume(&self) -> u64 {
        self.item_type().volume()
    }

    /// The shape of this item.
    pub fn item_type(&self) -> ItemType {
        ItemType::new(self.dx, self.dy, self.dz)
    }

    /// Edge lengths as an array.
    pub fn dimensions(&self) -> [u32; 3] {
        [self.dx, self.dy, self.dz]
    }

    /// Position as an array.
    pub fn position(&self) -> [i32; 3] {
        [self.x, self.y, self.z]
    }

    /// The region occupied by this item at its current position.
    pub fn aabb(&self) -> Aabb {
        Aabb::from_position_and_size(self.position(), self.dimensions())
    }

    /// Clears the placement state.
    pub fn reset(&mut self) {
        self.x = 0;
        self.y = 0;
        self.z = 0;
        self.chosen = false;
    }
}

/// The container that items are loaded into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
}

impl Container {
    /// Creates a container with the given dimensions.
    pub fn new(width: u32, height: u32, depth: u32) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }

    /// Container volume.
    pub fn volume(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height) * u64::from(self.depth)
    }

    /// Container volume, or `None` if it does not fit in a `u64`.
    pub fn checked_volume(&self) -> Option<u64> {
        checked_product([self.width, self.height, self.depth])
    }

    /// The region `[0, W) x [0, H) x [0, D)`.
    pub fn aabb(&self) -> Aabb {
        Aabb::from_position_and_size([0, 0, 0], [self.width, self.height, self.depth])
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT, DEFAULT_DEPTH)
    }
}

/// One container-loading problem: a container and its candidate boxes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    pub container: Container,
    pub items: Vec<Item>,
}

impl Instance {
    /// Creates an instance.
    pub fn new(container: Container, items: Vec<Item>) -> Self {
        Self { container, items }
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the instance has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total volume of all items.
    pub fn total_item_volume(&self) -> u64 {
        self.items.iter().map(Item::volume).sum()
    }

    /// Total volume of the chosen items.
    pub fn chosen_volume(&self) -> u64 {
        self.items
            .iter()
            .filter(|i| i.chosen)
            .map(Item::volume)
            .sum()
    }

    /// Number of items the solver did not choose.
    pub fn miss_count(&self) -> usize {
        self.items.iter().filter(|i| !i.chosen).count()
    }

    /// Fraction of the container volume occupied by chosen items.
    pub fn fill_ratio(&self) -> f64 {
        let cvol = self.container.volume();
        if cvol == 0 {
            return 0.0;
        }
        self.chosen_volume() as f64 / cvol as f64
    }

    /// Copies a solver placement back onto the items and returns the miss count.
    ///
    /// Fails with [`Error::Solver`] if the placement does not cover exactly the
    /// items of this instance, or if a reported box is not a rotation of the
    /// item it belongs to. On failure the instance is left unchanged.
    pub fn apply(&mut self, placement: &Placement) -> Result<usize> {
        if placement.items.len() != self.items.len() {
            return Err(Error::Solver(format!(
                "placement covers {} items, instance has {}",
                placement.items.len(),
                self.items.len()
            )));
        }

        for (item, entry) in self.items.iter().zip(&placement.items) {
            if let Some(dims) = entry.dimensions {
                if !is_rotation_of(dims, item.dimensions()) {
                    return Err(Error::Solver(format!(
                        "item {} reported as {:?}, which is not a rotation of {:?}",
                        item.id,
                        dims,
                        item.dimensions()
                    )));
                }
            }
        }

        let mut miss = 0;
        for (item, entry) in self.items.iter_mut().zip(&placement.items) {
            if let Some([dx, dy, dz]) = entry.dimensions {
                item.dx = dx;
                item.dy = dy;
                item.dz = dz;
            }
            [item.x, item.y, item.z] = entry.position;
            item.chosen = entry.chosen;
            if !entry.chosen {
                miss += 1;
            }
        }

        Ok(miss)
    }
}

fn checked_product(edges: [u32; 3]) -> Option<u64> {
    edges
        .iter()
        .try_fold(1u64, |acc, &e| acc.checked_mul(u64::from(e)))
}

fn is_rotation_of(a: [u32; 3], b: [u32; 3]) -> bool {
    let mut a = a;
    let mut b = b;
    a.sort_unstable();
    b.sort_unstable();
    a == b
}
