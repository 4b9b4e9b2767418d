//! Adapter traits for the smart-account pallet
//!
//! `AssetOps` and `DexOps` abstract the runtime's asset layer and exchange
//! venue. `Connector` is the capability every spell target implements, and
//! `ConnectorSet` binds registry handles to concrete connectors.

use crate::id_store::{IdStore, UnsetId};
use crate::resolver::{BuyArgs, ConnectorCall, DepositArgs, SellArgs, WithdrawArgs};
use alloc::{vec, vec::Vec};
use frame::prelude::*;
use primitives::{ConnectorHandle, IdKey};

/// Asset movements and queries.
pub trait AssetOps<AccountId, AssetId, Balance> {
  fn transfer(
    from: &AccountId,
    to: &AccountId,
    asset: AssetId,
    amount: Balance,
  ) -> Result<(), DispatchError>;

  fn balance(who: &AccountId, asset: AssetId) -> Balance;
}

/// Exchange venue operations: swaps and pooled liquidity.
///
/// Limits passed in are the venue's own guards; connectors enforce the
/// spell's limits on the settled amounts.
pub trait DexOps<AccountId, AssetId, Balance> {
  /// Sell exactly `amount_in`, returns the amount of `asset_out` received.
  fn swap_exact_in(
    who: &AccountId,
    asset_in: AssetId,
    asset_out: AssetId,
    amount_in: Balance,
    min_out: Balance,
  ) -> Result<Balance, DispatchError>;

  /// Buy exactly `amount_out`, returns the amount of `asset_in` paid.
  fn swap_exact_out(
    who: &AccountId,
    asset_in: AssetId,
    asset_out: AssetId,
    amount_out: Balance,
    max_in: Balance,
  ) -> Result<Balance, DispatchError>;

  /// Returns `(used_a, used_b, lp_minted)`.
  fn add_liquidity(
    who: &AccountId,
    asset_a: AssetId,
    asset_b: AssetId,
    amount_a: Balance,
    amount_b: Balance,
  ) -> Result<(Balance, Balance, Balance), DispatchError>;

  /// Burns `lp_amount` of the `(asset_a, asset_b)` pool share, returns the
  /// amounts of `asset_a` and `asset_b` released.
  fn remove_liquidity(
    who: &AccountId,
    asset_a: AssetId,
    asset_b: AssetId,
    lp_amount: Balance,
  ) -> Result<(Balance, Balance), DispatchError>;

  /// Reserves ordered as `(asset_a, asset_b)`.
  fn get_pool_reserves(asset_a: AssetId, asset_b: AssetId) -> Option<(Balance, Balance)>;
}

/// No-op `AssetOps` for configurations without an asset layer.
impl<AccountId, AssetId, Balance: Default> AssetOps<AccountId, AssetId, Balance> for () {
  fn transfer(_: &AccountId, _: &AccountId, _: AssetId, _: Balance) -> Result<(), DispatchError> {
    Ok(())
  }

  fn balance(_: &AccountId, _: AssetId) -> Balance {
    Balance::default()
  }
}

/// No-op `DexOps` for configurations where DEX is not used.
impl<AccountId, AssetId, Balance: Default> DexOps<AccountId, AssetId, Balance> for () {
  fn swap_exact_in(
    _: &AccountId,
    _: AssetId,
    _: AssetId,
    _: Balance,
    _: Balance,
  ) -> Result<Balance, DispatchError> {
    Err(DispatchError::Other("DexOps not configured"))
  }

  fn swap_exact_out(
    _: &AccountId,
    _: AssetId,
    _: AssetId,
    _: Balance,
    _: Balance,
  ) -> Result<Balance, DispatchError> {
    Err(DispatchError::Other("DexOps not configured"))
  }

  fn add_liquidity(
    _: &AccountId,
    _: AssetId,
    _: AssetId,
    _: Balance,
    _: Balance,
  ) -> Result<(Balance, Balance, Balance), DispatchError> {
    Err(DispatchError::Other("DexOps not configured"))
  }

  fn remove_liquidity(
    _: &AccountId,
    _: AssetId,
    _: AssetId,
    _: Balance,
  ) -> Result<(Balance, Balance), DispatchError> {
    Err(DispatchError::Other("DexOps not configured"))
  }

  fn get_pool_reserves(_: AssetId, _: AssetId) -> Option<(Balance, Balance)> {
    None
  }
}

/// Why a connector refused or failed an operation.
#[derive(Clone, Debug, Decode, Encode, Eq, PartialEq, TypeInfo)]
pub enum ConnectorError {
  /// The settled amounts would breach the spell's limit.
  SlippageExceeded,
  /// `get_id` names an id no earlier spell has set.
  UnsetId(IdKey),
  /// The connector does not implement this method.
  Unsupported,
  /// The underlying venue or asset layer failed.
  Venue(DispatchError),
}

impl From<UnsetId> for ConnectorError {
  fn from(err: UnsetId) -> Self {
    ConnectorError::UnsetId(err.0)
  }
}

impl From<DispatchError> for ConnectorError {
  fn from(err: DispatchError) -> Self {
    ConnectorError::Venue(err)
  }
}

/// Amounts a connector actually settled.
///
/// `outputs` line up with the call's set ids, one output per id; the engine
/// stores each output under its id. Any other length fails the spell with
/// `AdapterFailure`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Settlement<Balance> {
  pub actual_amount: Balance,
  pub outputs: Vec<Balance>,
}

impl<Balance: Copy> Settlement<Balance> {
  /// One settled amount, stored under the call's only set id.
  pub fn single(amount: Balance) -> Self {
    Self {
      actual_amount: amount,
      outputs: vec![amount],
    }
  }
}

pub type ConnectorResult<Balance> = Result<Settlement<Balance>, ConnectorError>;

/// The operations a spell can invoke on a connector.
///
/// Every operation moves funds of `who` only and reads earlier results through
/// `ids`. Operations a connector does not offer fail with `Unsupported`.
pub trait Connector<AccountId, AssetId, Balance> {
  /// Handle the registry uses to point at this connector.
  fn handle() -> ConnectorHandle;

  fn deposit(
    _who: &AccountId,
    _args: &DepositArgs<AssetId, Balance>,
    _ids: &IdStore<Balance>,
  ) -> ConnectorResult<Balance> {
    Err(ConnectorError::Unsupported)
  }

  fn withdraw(
    _who: &AccountId,
    _args: &WithdrawArgs<AssetId, Balance>,
    _ids: &IdStore<Balance>,
  ) -> ConnectorResult<Balance> {
    Err(ConnectorError::Unsupported)
  }

  fn buy(
    _who: &AccountId,
    _args: &BuyArgs<AssetId, Balance>,
    _ids: &IdStore<Balance>,
  ) -> ConnectorResult<Balance> {
    Err(ConnectorError::Unsupported)
  }

  fn sell(
    _who: &AccountId,
    _args: &SellArgs<AssetId, Balance>,
    _ids: &IdStore<Balance>,
  ) -> ConnectorResult<Balance> {
    Err(ConnectorError::Unsupported)
  }

  fn invoke(
    who: &AccountId,
    call: &ConnectorCall<AssetId, Balance>,
    ids: &IdStore<Balance>,
  ) -> ConnectorResult<Balance> {
    match call {
      ConnectorCall::Deposit(args) => Self::deposit(who, args, ids),
      ConnectorCall::Withdraw(args) => Self::withdraw(who, args, ids),
      ConnectorCall::Buy(args) => Self::buy(who, args, ids),
      ConnectorCall::Sell(args) => Self::sell(who, args, ids),
    }
  }
}

/// Connectors compiled into the runtime, addressed by handle.
///
/// Implemented for tuples of `Connector`s. The first member whose handle
/// matches serves the call.
pub trait ConnectorSet<AccountId, AssetId, Balance> {
  fn serves(handle: ConnectorHandle) -> bool;

  /// `None` when no member serves `handle`.
  fn invoke(
    handle: ConnectorHandle,
    who: &AccountId,
    call: &ConnectorCall<AssetId, Balance>,
    ids: &IdStore<Balance>,
  ) -> Option<ConnectorResult<Balance>>;
}

impl<AccountId, AssetId, Balance> ConnectorSet<AccountId, AssetId, Balance> for () {
  fn serves(_: ConnectorHandle) -> bool {
    false
  }

  fn invoke(
    _: ConnectorHandle,
    _: &AccountId,
    _: &ConnectorCall<AssetId, Balance>,
    _: &IdStore<Balance>,
  ) -> Option<ConnectorResult<Balance>> {
    None
  }
}

macro_rules! impl_connector_set_for_tuples {
  ($($member:ident),+) => {
    impl<AccountId, AssetId, Balance, $($member: Connector<AccountId, AssetId, Balance>),+>
      ConnectorSet<AccountId, AssetId, Balance> for ($($member,)+)
    {
      fn serves(handle: ConnectorHandle) -> bool {
        $(if <$member as Connector<AccountId, AssetId, Balance>>::handle() == handle {
          return true;
        })+
        false
      }

      fn invoke(
        handle: ConnectorHandle,
        who: &AccountId,
        call: &ConnectorCall<AssetId, Balance>,
        ids: &IdStore<Balance>,
      ) -> Option<ConnectorResult<Balance>> {
        $(if <$member as Connector<AccountId, AssetId, Balance>>::handle() == handle {
          return Some(<$member as Connector<AccountId, AssetId, Balance>>::invoke(who, call, ids));
        })+
        None
      }
    }
  };
}

impl_connector_set_for_tuples!(A);
impl_connector_set_for_tuples!(A, B);
impl_connector_set_for_tuples!(A, B, C);
impl_connector_set_for_tuples!(A, B, C, D);
impl_connector_set_for_tuples!(A, B, C, D, E);
impl_connector_set_for_tuples!(A, B, C, D, E, F);
impl_connector_set_for_tuples!(A, B, C, D, E, F, G);
impl_connector_set_for_tuples!(A, B, C, D, E, F, G, H);
