//! Random instance generation.
//!
//! Follows the knapsack container-loading test set of Pisinger (1999): boxes
//! with edges uniform in `[min_dim, max_dim]` are generated until their total
//! volume passes `fill_percent` of the container, optionally drawing every box
//! from a small catalog of pre-generated types.

use contload_core::{Container, Error, Instance, Item, ItemType, Lrand48, Result};
use serde::{Deserialize, Serialize};

/// Default upper bound on the number of items in one instance.
pub const DEFAULT_MAX_ITEMS: usize = 1000;

/// Parameters of the instance generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Minimum box edge length.
    pub min_dim: u32,
    /// Maximum box edge length.
    pub max_dim: u32,
    /// Target fill of the container volume, in percent (0-100).
    pub fill_percent: u32,
    /// Number of distinct box types (0 = every box is a new random type).
    pub max_types: u32,
    /// Maximum number of items per instance.
    pub max_items: usize,
    /// Container the boxes are generated for.
    pub container: Container,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            min_dim: 50,
            max_dim: 100,
            fill_percent: 90,
            max_types: 0,
            container: Container::default(),
            max_items: DEFAULT_MAX_ITEMS,
        }
    }
}

impl GeneratorConfig {
    /// Creates a configuration from the four classic inputs.
    pub fn new(min_dim: u32, max_dim: u32, fill_percent: u32, max_types: u32) -> Self {
        Self {
            min_dim,
            max_dim,
            fill_percent,
            max_types,
            ..Default::default()
        }
    }

    /// Sets the container.
    pub fn with_container(mut self, container: Container) -> Self {
        self.container = container;
        self
    }

    /// Sets the item limit.
    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items;
        self
    }

    /// Checks the parameters before any instance is generated.
    pub fn validate(&self) -> Result<()> {
        if self.min_dim == 0 {
            return Err(Error::Configuration(
                "min_dim must be positive".to_string(),
            ));
        }
        if self.min_dim > self.max_dim {
            return Err(Error::Configuration(format!(
                "min_dim {} exceeds max_dim {}",
                self.min_dim, self.max_dim
            )));
        }
        if self.max_dim == u32::MAX {
            return Err(Error::Configuration(format!(
                "max_dim must be below {}",
                u32::MAX
            )));
        }
        if self.fill_percent > 100 {
            return Err(Error::Configuration(format!(
                "fill_percent {} is not in 0..=100",
                self.fill_percent
            )));
        }
        if self.max_items == 0 {
            return Err(Error::Configuration(
                "max_items must be positive".to_string(),
            ));
        }
        let c = &self.container;
        let container_volume = c.checked_volume().ok_or_else(|| {
            Error::Configuration(format!(
                "container {}x{}x{} volume overflows u64",
                c.width, c.height, c.depth
            ))
        })?;
        if container_volume == 0 {
            return Err(Error::Configuration(format!(
                "container {}x{}x{} has no volume",
                c.width, c.height, c.depth
            )));
        }
        let item_volume = ItemType::new(self.max_dim, self.max_dim, self.max_dim)
            .checked_volume()
            .ok_or_else(|| {
                Error::Configuration(format!(
                    "box volume {}^3 overflows u64",
                    self.max_dim
                ))
            })?;
        // the generated total stays below target + one box
        if container_volume.checked_add(item_volume).is_none() {
            return Err(Error::Configuration(format!(
                "container volume {} plus box volume {} overflows u64",
                container_volume, item_volume
            )));
        }
        Ok(())
    }

    /// Volume the generated boxes must exceed: `floor(fill% * container / 100)`.
    pub fn target_volume(&self) -> u64 {
        (u128::from(self.fill_percent) * u128::from(self.container.volume()) / 100) as u64
    }

    /// Volume of the largest box this configuration can produce.
    pub fn max_item_volume(&self) -> u64 {
        ItemType::new(self.max_dim, self.max_dim, self.max_dim).volume()
    }
}

/// Builds reproducible instances from a [`Lrand48`] stream.
#[derive(Debug, Clone)]
pub struct InstanceGenerator {
    config: GeneratorConfig,
}

impl InstanceGenerator {
    /// Creates a generator, validating the configuration.
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The configuration in use.
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Draws one random box type.
    pub fn random_type(&self, rng: &mut Lrand48) -> ItemType {
        let dx = rng.range_inclusive(self.config.min_dim, self.config.max_dim);
        let dy = rng.range_inclusive(self.config.min_dim, self.config.max_dim);
        let dz = rng.range_inclusive(self.config.min_dim, self.config.max_dim);
        ItemType::new(dx, dy, dz)
    }

    /// Draws the catalog of `max_types` box types.
    ///
    /// This is the first thing [`generate`](Self::generate) does with the
    /// stream, so calling it on a freshly seeded generator yields the catalog
    /// the instance for that seed is built from.
    pub fn catalog(&self, rng: &mut Lrand48) -> Vec<ItemType> {
        (0..self.config.max_types)
            .map(|_| self.random_type(rng))
            .collect()
    }

    /// Generates one instance.
    ///
    /// Items are produced until the remaining fill budget goes negative; the
    /// item that crosses the target is kept. Fails with
    /// [`Error::CapacityExceeded`] if more than `max_items` items are needed.
    pub fn generate(&self, rng: &mut Lrand48) -> Result<Instance> {
        let catalog = self.catalog(rng);
        let mut remaining = self.config.target_volume() as i128;
        let mut items = Vec::new();

        loop {
            if items.len() == self.config.max_items {
                log::warn!(
                    "instance needs more than {} items (remaining volume {})",
                    self.config.max_items,
                    remaining
                );
                return Err(Error::CapacityExceeded {
                    limit: self.config.max_items,
                });
            }

            let item_type = if catalog.is_empty() {
                self.random_type(rng)
            } else {
                catalog[rng.uniform(self.config.max_types) as usize]
            };
            let id = items.len() as u32 + 1;
            items.push(Item::from_type(id, item_type));

            remaining -= i128::from(item_type.volume());
            if remaining < 0 {
                break;
            }
        }

        log::debug!("generated {} boxes", items.len());
        Ok(Instance::new(self.config.container, items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator(min: u32, max: u32, fill: u32, types: u32) -> InstanceGenerator {
        InstanceGenerator::new(GeneratorConfig::new(min, max, fill, types)).unwrap()
    }

    #[test]
    fn test_generate_without_catalog() {
        let gen = generator(50, 100, 50, 0);
        let instance = gen.generate(&mut Lrand48::new(1)).unwrap();

        assert_eq!(instance.len(), 37);
        assert_eq!(instance.items[0].dimensions(), [84, 93, 91]);
        assert_eq!(instance.items[1].dimensions(), [66, 90, 65]);
        assert_eq!(instance.items[2].dimensions(), [91, 66, 97]);
        assert_eq!(instance.total_item_volume(), 15_793_907);
        assert_eq!(instance.container, Container::new(230, 230, 590));
    }

    #[test]
    fn test_generate_with_catalog() {
        let gen = generator(30, 120, 90, 5);
        let catalog = gen.catalog(&mut Lrand48::new(1));
        assert_eq!(
            catalog,
            vec![
                ItemType::new(112, 83, 117),
                ItemType::new(95, 111, 109),
                ItemType::new(98, 114, 99),
                ItemType::new(79, 89, 65),
                ItemType::new(62, 100, 62),
            ]
        );

        let instance = gen.generate(&mut Lrand48::new(1)).unwrap();
        assert_eq!(instance.len(), 34);
        assert_eq!(instance.items[0].item_type(), catalog[4]);
        assert_eq!(instance.items[2].item_type(), catalog[0]);
        assert_eq!(instance.total_item_volume(), 28_526_723);
        for item in &instance.items {
            assert!(catalog.contains(&item.item_type()));
        }
    }

    #[test]
    fn test_items_are_fresh() {
        let instance = generator(25, 50, 30, 4)
            .generate(&mut Lrand48::new(1))
            .unwrap();

        assert_eq!(instance.len(), 190);
        for (idx, item) in instance.items.iter().enumerate() {
            assert_eq!(item.id, idx as u32 + 1);
            assert!(!item.chosen);
            assert_eq!(item.position(), [0, 0, 0]);
        }
    }

    #[test]
    fn test_crossing_item_is_kept() {
        let gen = generator(50, 100, 50, 0);
        let instance = gen.generate(&mut Lrand48::new(2)).unwrap();
        let target = gen.config().target_volume();

        let total = instance.total_item_volume();
        let last = instance.items.last().unwrap().volume();
        assert_eq!(instance.len(), 36);
        assert!(total > target);
        assert!(total - last <= target);
    }

    #[test]
    fn test_zero_fill_yields_one_item() {
        let instance = generator(1, 10, 0, 0)
            .generate(&mut Lrand48::new(9))
            .unwrap();
        assert_eq!(instance.len(), 1);
    }

    #[test]
    fn test_capacity_exceeded() {
        let gen = generator(1, 5, 50, 3);
        let err = gen.generate(&mut Lrand48::new(1)).unwrap_err();
        assert!(matches!(err, Error::CapacityExceeded { limit: 1000 }));
    }

    #[test]
    fn test_item_limit_is_inclusive() {
        let config = GeneratorConfig::new(50, 100, 50, 0).with_max_items(37);
        let gen = InstanceGenerator::new(config.clone()).unwrap();
        assert_eq!(gen.generate(&mut Lrand48::new(1)).unwrap().len(), 37);

        let gen = InstanceGenerator::new(config.with_max_items(36)).unwrap();
        assert!(matches!(
            gen.generate(&mut Lrand48::new(1)),
            Err(Error::CapacityExceeded { limit: 36 })
        ));
    }

    #[test]
    fn test_custom_container() {
        let config =
            GeneratorConfig::new(1, 1, 100, 0).with_container(Container::new(2, 3, 4));
        let instance = InstanceGenerator::new(config)
            .unwrap()
            .generate(&mut Lrand48::new(1))
            .unwrap();
        // 24 unit cubes reach the target, the 25th crosses it
        assert_eq!(instance.len(), 25);
        assert_eq!(instance.container, Container::new(2, 3, 4));
    }

    #[test]
    fn test_validate() {
        assert!(GeneratorConfig::new(1, 5, 50, 3).validate().is_ok());
        assert!(GeneratorConfig::new(7, 7, 100, 0).validate().is_ok());
        assert!(GeneratorConfig::new(1, 2_000_000, 50, 0).validate().is_ok());

        for bad in [
            GeneratorConfig::new(0, 5, 50, 3),
            GeneratorConfig::new(6, 5, 50, 3),
            GeneratorConfig::new(1, 5, 101, 3),
            GeneratorConfig::new(1, 5, 50, 3).with_max_items(0),
            GeneratorConfig::new(1, 5, 50, 3).with_container(Container::new(0, 10, 10)),
            GeneratorConfig::new(1, 10_000_000, 50, 0),
            GeneratorConfig::new(1, 5, 50, 3)
                .with_container(Container::new(u32::MAX, u32::MAX, u32::MAX)),
            GeneratorConfig::new(1, 2_000_000, 50, 0)
                .with_container(Container::new(u32::MAX, u32::MAX, 1)),
        ] {
            assert!(matches!(
                InstanceGenerator::new(bad),
                Err(Error::Configuration(_))
            ));
        }
    }

    #[test]
    fn test_oversized_boxes_rejected() {
        let err = InstanceGenerator::new(GeneratorConfig::new(1, 10_000_000, 50, 0)).unwrap_err();
        assert!(matches!(err, Error::Configuration(ref msg) if msg.contains("overflows")));
    }

    #[test]
    fn test_target_volume() {
        let config = GeneratorConfig::new(1, 5, 50, 3);
        assert_eq!(config.target_volume(), 15_605_500);
        assert_eq!(config.max_item_volume(), 125);

        let config = GeneratorConfig::new(1, 5, 33, 3).with_container(Container::new(1, 1, 10));
        // floor(3.3)
        assert_eq!(config.target_volume(), 3);
    }

    #[test]
    fn test_deterministic_generation() {
        let gen = generator(10, 60, 70, 0);
        let a = gen.generate(&mut Lrand48::new(12345)).unwrap();
        let b = gen.generate(&mut Lrand48::new(12345)).unwrap();
        assert_eq!(a, b);

        let c = gen.generate(&mut Lrand48::new(12346)).unwrap();
        assert_ne!(a, c);
    }
}
