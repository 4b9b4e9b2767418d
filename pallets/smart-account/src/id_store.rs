//! Per-cast scratch space that carries settled amounts from one spell to the
//! next.
//!
//! A store is created empty for every cast and dropped when the cast ends.
//! It never reaches storage, so nothing survives a reverted or a committed
//! cast. Id `RESERVED_ID` is never stored: reading it means "use the literal
//! argument" and writing it is a no-op.

use alloc::collections::BTreeMap;
use primitives::{IdKey, RESERVED_ID};

/// A non-reserved id was read before any spell of the cast set it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct UnsetId(pub IdKey);

#[derive(Clone, Debug, Default)]
pub struct IdStore<Balance> {
  slots: BTreeMap<IdKey, Balance>,
}

impl<Balance: Copy> IdStore<Balance> {
  pub fn new() -> Self {
    Self {
      slots: BTreeMap::new(),
    }
  }

  /// Value stored under `id`. Always `None` for the reserved id.
  pub fn get(&self, id: IdKey) -> Option<Balance> {
    if id == RESERVED_ID {
      return None;
    }
    self.slots.get(&id).copied()
  }

  /// Amount a spell should use: `literal` when `id` is reserved, otherwise
  /// the value an earlier spell stored under `id`.
  pub fn amount_or(&self, id: IdKey, literal: Balance) -> Result<Balance, UnsetId> {
    if id == RESERVED_ID {
      return Ok(literal);
    }
    self.get(id).ok_or(UnsetId(id))
  }

  pub fn set(&mut self, id: IdKey, value: Balance) {
    if id != RESERVED_ID {
      self.slots.insert(id, value);
    }
  }

  pub fn len(&self) -> usize {
    self.slots.len()
  }

  pub fn is_empty(&self) -> bool {
    self.slots.is_empty()
  }
}
