//! Canonical serialization for deterministic hashing.
//!
//! Used to prove that a history step round-trip restores the committed
//! scene exactly: two scenes with equal fingerprints hold the same
//! entities, indices and committed selection.
//!
//! ## Determinism Guarantees
//!
//! - Stable field order: struct fields serialize in declaration order
//! - Stable collection order: every hashed map or set is a `BTreeMap`/`BTreeSet`
//! - Stable float format: `f64` coordinates serialize through `serde_json`
//! - Derived caches that are not part of committed state (bounds trackers,
//!   temporary selection) are skipped

use serde::Serialize;
use xxhash_rust::xxh64::xxh64;

use crate::store::Scene;

/// Serialize a value to canonical JSON bytes for hashing.
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> Vec<u8> {
    serde_json::to_vec(value).expect("Canonical serialization failed")
}

/// Compute canonical hash of a serializable value.
pub fn canonical_hash<T: Serialize>(value: &T) -> u64 {
    let bytes = to_canonical_bytes(value);
    xxh64(&bytes, 0)
}

/// Compute canonical hash and return as hex string.
pub fn canonical_hash_hex<T: Serialize>(value: &T) -> String {
    format!("{:016x}", canonical_hash(value))
}

/// Fingerprint of the committed scene state.
pub fn scene_fingerprint(scene: &Scene) -> u64 {
    canonical_hash(&scene.snapshot())
}

/// [`scene_fingerprint`] as a hex string.
pub fn scene_fingerprint_hex(scene: &Scene) -> String {
    format!("{:016x}", scene_fingerprint(scene))
}
