//! # Core Domain Entities
//!
//! The organism snapshot that migrates between peers, and the references it
//! carries to its species and code package.
//!
//! ## Clusters
//!
//! - **Geometry**: [`Point`]
//! - **Species**: [`SpeciesKind`], [`SpeciesRef`], [`PackageName`]
//! - **State**: [`EntitySnapshot`]

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{PackageNameError, SnapshotError};

// =============================================================================
// GEOMETRY
// =============================================================================

/// A position in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

// =============================================================================
// SPECIES & PACKAGES
// =============================================================================

/// Whether a species moves and attacks, or grows in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpeciesKind {
    Animal,
    Plant,
}

/// Upper bound on a package's full name.
pub const MAX_PACKAGE_NAME_LEN: usize = 512;

/// Fully qualified name of the code package that implements a species.
///
/// The full form is `Short, Version=1.0.0.0, ...`. Only the short name is
/// used to derive file names, and it is restricted to a safe character set so
/// a peer cannot steer a cache write outside the cache directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PackageName(String);

impl PackageName {
    /// Parse and validate a package name.
    pub fn new(full_name: impl Into<String>) -> Result<Self, PackageNameError> {
        let full_name = full_name.into().trim().to_string();
        if full_name.is_empty() {
            return Err(PackageNameError::Empty);
        }
        if full_name.len() > MAX_PACKAGE_NAME_LEN {
            return Err(PackageNameError::TooLong {
                len: full_name.len(),
                max: MAX_PACKAGE_NAME_LEN,
            });
        }

        let short = short_segment(&full_name);
        if short.is_empty() {
            return Err(PackageNameError::Empty);
        }
        let legal = short
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
        if !legal || short.starts_with('.') {
            return Err(PackageNameError::IllegalCharacters(short.to_string()));
        }

        Ok(Self(full_name))
    }

    /// The full name as declared by the sender.
    pub fn full(&self) -> &str {
        &self.0
    }

    /// Lowercased short name, used as the cache key.
    pub fn short_name(&self) -> String {
        short_segment(&self.0).to_ascii_lowercase()
    }

    /// File name under which the package is stored in a cache directory.
    pub fn file_name(&self) -> String {
        format!("{}.pkg", self.short_name())
    }
}

fn short_segment(full_name: &str) -> &str {
    full_name.split(',').next().unwrap_or_default().trim()
}

impl TryFrom<String> for PackageName {
    type Error = PackageNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PackageName> for String {
    fn from(value: PackageName) -> Self {
        value.0
    }
}

impl std::fmt::Display for PackageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reference from a snapshot to the species it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpeciesRef {
    pub name: String,
    pub package: PackageName,
    pub kind: SpeciesKind,
}

// =============================================================================
// ENTITY SNAPSHOT
// =============================================================================

/// Point-in-time state of one organism.
///
/// Snapshots start writable. [`seal`](Self::seal) freezes them before they
/// are placed in a migration message; after that every setter returns
/// [`SnapshotError::Sealed`]. The seal is not part of the serialized form:
/// decoders re-seal what they produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    id: Uuid,
    species: SpeciesRef,
    position: Point,
    radius: u32,
    stored_energy: f64,
    food_chunks: u32,
    generation: u32,
    tick_age: u64,
    is_alive: bool,
    #[serde(skip)]
    sealed: bool,
}

impl EntitySnapshot {
    /// Create a live, unsealed snapshot.
    pub fn new(id: Uuid, species: SpeciesRef, position: Point) -> Self {
        Self {
            id,
            species,
            position,
            radius: 1,
            stored_energy: 0.0,
            food_chunks: 0,
            generation: 0,
            tick_age: 0,
            is_alive: true,
            sealed: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn species(&self) -> &SpeciesRef {
        &self.species
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn radius(&self) -> u32 {
        self.radius
    }

    pub fn stored_energy(&self) -> f64 {
        self.stored_energy
    }

    pub fn food_chunks(&self) -> u32 {
        self.food_chunks
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn tick_age(&self) -> u64 {
        self.tick_age
    }

    pub fn is_alive(&self) -> bool {
        self.is_alive
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Freeze the snapshot. Idempotent.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    /// Consuming variant of [`seal`](Self::seal).
    #[must_use]
    pub fn sealed(mut self) -> Self {
        self.sealed = true;
        self
    }

    fn check_writable(&self, field: &'static str) -> Result<(), SnapshotError> {
        if self.sealed {
            return Err(SnapshotError::Sealed { id: self.id, field });
        }
        Ok(())
    }

    pub fn set_position(&mut self, position: Point) -> Result<(), SnapshotError> {
        self.check_writable("position")?;
        self.position = position;
        Ok(())
    }

    pub fn set_radius(&mut self, radius: u32) -> Result<(), SnapshotError> {
        self.check_writable("radius")?;
        self.radius = radius;
        Ok(())
    }

    pub fn set_stored_energy(&mut self, energy: f64) -> Result<(), SnapshotError> {
        self.check_writable("stored_energy")?;
        self.stored_energy = energy;
        Ok(())
    }

    pub fn set_food_chunks(&mut self, chunks: u32) -> Result<(), SnapshotError> {
        self.check_writable("food_chunks")?;
        self.food_chunks = chunks;
        Ok(())
    }

    pub fn set_generation(&mut self, generation: u32) -> Result<(), SnapshotError> {
        self.check_writable("generation")?;
        self.generation = generation;
        Ok(())
    }

    pub fn set_tick_age(&mut self, tick_age: u64) -> Result<(), SnapshotError> {
        self.check_writable("tick_age")?;
        self.tick_age = tick_age;
        Ok(())
    }

    pub fn set_alive(&mut self, alive: bool) -> Result<(), SnapshotError> {
        self.check_writable("is_alive")?;
        self.is_alive = alive;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_species() -> SpeciesRef {
        SpeciesRef {
            name: "Grazer".into(),
            package: PackageName::new("Grazer, Version=1.0.0.0, Culture=neutral").unwrap(),
            kind: SpeciesKind::Animal,
        }
    }

    #[test]
    fn test_sealed_snapshot_rejects_writes() {
        let mut snapshot = EntitySnapshot::new(Uuid::new_v4(), make_species(), Point::new(3, 4));
        snapshot.set_stored_energy(12.5).unwrap();
        snapshot.seal();

        let err = snapshot.set_position(Point::new(9, 9)).unwrap_err();
        assert!(matches!(err, SnapshotError::Sealed { field: "position", .. }));
        assert_eq!(snapshot.position(), Point::new(3, 4));
        assert_eq!(snapshot.stored_energy(), 12.5);
    }

    #[test]
    fn test_seal_is_not_serialized() {
        let snapshot =
            EntitySnapshot::new(Uuid::new_v4(), make_species(), Point::new(1, 2)).sealed();
        let bytes = bincode::serialize(&snapshot).unwrap();
        let decoded: EntitySnapshot = bincode::deserialize(&bytes).unwrap();

        assert!(!decoded.is_sealed());
        assert_eq!(decoded.id(), snapshot.id());
        assert_eq!(decoded.species(), snapshot.species());
    }

    #[test]
    fn test_package_short_name_and_file_name() {
        let name = PackageName::new("Grazer.Herd, Version=2.1.0.0, PublicKeyToken=null").unwrap();
        assert_eq!(name.short_name(), "grazer.herd");
        assert_eq!(name.file_name(), "grazer.herd.pkg");
        assert_eq!(name.full(), "Grazer.Herd, Version=2.1.0.0, PublicKeyToken=null");
    }

    #[test]
    fn test_package_name_rejects_path_traversal() {
        assert!(matches!(
            PackageName::new("../../etc/passwd"),
            Err(PackageNameError::IllegalCharacters(_))
        ));
        assert!(matches!(
            PackageName::new("..hidden"),
            Err(PackageNameError::IllegalCharacters(_))
        ));
        assert_eq!(PackageName::new("  "), Err(PackageNameError::Empty));
        assert_eq!(PackageName::new(", Version=1"), Err(PackageNameError::Empty));
    }

    #[test]
    fn test_package_name_deserialize_validates() {
        let ok: PackageName = serde_json::from_str("\"Thorn, Version=1.0\"").unwrap();
        assert_eq!(ok.short_name(), "thorn");

        let bad: Result<PackageName, _> = serde_json::from_str("\"a/b\"");
        assert!(bad.is_err());
    }
}
