//! Ecosystem constants for spell-casting smart accounts.
//!
//! Pallet ids and default bounds shared by runtime configurations and test
//! runtimes.

/// Balance type alias for consistency across the workspace
pub type Balance = u128;

/// Pallet identifiers for deriving pallet-owned accounts.
///
/// Used with `PalletId::into_sub_account_truncating()` to derive one sovereign
/// account per smart account.
pub mod pallet_ids {
  /// Smart account pallet ID (sovereign accounts of built smart accounts)
  pub const SMART_ACCOUNT_PALLET_ID: &[u8; 8] = b"py/smact";
}

/// Default bounds for runtime configurations.
pub mod params {
  /// Maximum spells in one cast.
  pub const MAX_SPELLS: u32 = 16;

  /// Maximum encoded argument length of a single spell, in bytes.
  pub const MAX_SPELL_ARGS_LEN: u32 = 256;

  /// Maximum accounts allowed to cast on behalf of a smart account, owner excluded.
  pub const MAX_AUTHORITIES: u32 = 8;

  /// Maximum smart accounts built by a single owner.
  pub const MAX_ACCOUNTS_PER_OWNER: u32 = 32;
}
