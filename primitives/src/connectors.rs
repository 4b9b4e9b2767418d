//! Connector vocabulary shared between the registry and the smart-account engine.

use codec::{Decode, DecodeWithMemTracking, Encode, MaxEncodedLen};
use scale_info::TypeInfo;

/// Runtime-assigned identifier of a connector implementation.
///
/// Registry entries point at a handle; the runtime's connector set binds each
/// handle to exactly one adapter implementation.
pub type ConnectorHandle = u32;

/// Key into the per-cast id store.
pub type IdKey = u32;

/// Id that is never stored or read back: "use the literal amount".
pub const RESERVED_ID: IdKey = 0;

/// Upper bound for a registered connector name, in bytes.
pub const MAX_CONNECTOR_NAME_LEN: u32 = 32;

/// Upper bound for a spell method name, in bytes.
pub const MAX_METHOD_NAME_LEN: u32 = 16;

/// Registry record for one connector name.
#[derive(
  Clone,
  Copy,
  Debug,
  Decode,
  DecodeWithMemTracking,
  Encode,
  Eq,
  MaxEncodedLen,
  PartialEq,
  TypeInfo,
)]
pub struct ConnectorInfo {
  pub handle: ConnectorHandle,
  pub enabled: bool,
}

impl ConnectorInfo {
  pub fn new(handle: ConnectorHandle) -> Self {
    Self {
      handle,
      enabled: true,
    }
  }

  /// Handle to dispatch to, if the entry may be resolved.
  pub fn resolvable(&self) -> Option<ConnectorHandle> {
    self.enabled.then_some(self.handle)
  }
}

/// Read side of the connector registry, as consumed by the cast engine.
pub trait ConnectorLookup {
  /// Handle bound to `name`, or `None` when the name is absent or disabled.
  fn resolve(name: &[u8]) -> Option<ConnectorHandle>;

  fn is_enabled(name: &[u8]) -> bool {
    Self::resolve(name).is_some()
  }
}

/// Empty registry: nothing resolves.
impl ConnectorLookup for () {
  fn resolve(_: &[u8]) -> Option<ConnectorHandle> {
    None
  }
}
