//! Solver output representation.

use crate::model::Instance;
use serde::{Deserialize, Serialize};

/// Placement decision for a single item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ItemPlacement {
    /// Whether the item is packed.
    pub chosen: bool,
    /// Corner position (x, y, z), meaningful only when chosen.
    #[serde(default)]
    pub position: [i32; 3],
    /// Edge lengths after rotation, if the solver turned the box.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<[u32; 3]>,
}

impl ItemPlacement {
    /// An item left out of the container.
    pub fn unchosen() -> Self {
        Self::default()
    }

    /// An item packed at `position` in its original orientation.
    pub fn chosen_at(position: [i32; 3]) -> Self {
        Self {
            chosen: true,
            position,
            dimensions: None,
        }
    }

    /// Sets the rotated edge lengths.
    pub fn with_dimensions(mut self, dimensions: [u32; 3]) -> Self {
        self.dimensions = Some(dimensions);
        self
    }
}

/// A complete answer from a solver: one entry per item, in instance order,
/// plus the total packed volume the solver claims.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Placement {
    pub items: Vec<ItemPlacement>,
    pub total_volume: u64,
}

impl Placement {
    /// Creates a placement.
    pub fn new(items: Vec<ItemPlacement>, total_volume: u64) -> Self {
        Self {
            items,
            total_volume,
        }
    }

    /// A placement of `n` items that packs nothing.
    pub fn none(n: usize) -> Self {
        Self::new(vec![ItemPlacement::unchosen(); n], 0)
    }

    /// Reads the current placement state back out of an instance.
    pub fn from_instance(instance: &Instance) -> Self {
        let items = instance
            .items
            .iter()
            .map(|item| ItemPlacement {
                chosen: item.chosen,
                position: item.position(),
                dimensions: None,
            })
            .collect();
        Self::new(items, instance.chosen_volume())
    }

    /// Number of chosen items.
    pub fn placed_count(&self) -> usize {
        self.items.iter().filter(|p| p.chosen).count()
    }

    /// Number of items left out.
    pub fn miss_count(&self) -> usize {
        self.items.len() - self.placed_count()
    }

    /// Returns true if every item was packed.
    pub fn all_placed(&self) -> bool {
        self.items.iter().all(|p| p.chosen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Container, Item, ItemType};

    #[test]
    fn test_none() {
        let p = Placement::none(4);
        assert_eq!(p.items.len(), 4);
        assert_eq!(p.placed_count(), 0);
        assert_eq!(p.miss_count(), 4);
        assert_eq!(p.total_volume, 0);
        assert!(!p.all_placed());
    }

    #[test]
    fn test_from_instance() {
        let instance = Instance::new(
            Container::default(),
            vec![
                Item::placed(1, [2, 2, 2], [0, 0, 0]),
                Item::from_type(2, ItemType::new(3, 3, 3)),
            ],
        );

        let p = Placement::from_instance(&instance);
        assert_eq!(p.placed_count(), 1);
        assert_eq!(p.total_volume, 8);
        assert_eq!(p.items[0], ItemPlacement::chosen_at([0, 0, 0]));
    }

    #[test]
    fn test_json_wire_format() {
        let json = r#"{
            "items": [
                {"chosen": true, "position": [0, 0, 0]},
                {"chosen": true, "position": [5, 0, 0], "dimensions": [2, 1, 3]},
                {"chosen": false}
            ],
            "total_volume": 31
        }"#;

        let p: Placement = serde_json::from_str(json).unwrap();
        assert_eq!(p.items.len(), 3);
        assert_eq!(p.items[1].dimensions, Some([2, 1, 3]));
        assert_eq!(p.items[2], ItemPlacement::unchosen());
        assert_eq!(p.total_volume, 31);
    }
}
