//! Spell resolution: connector name to handle, method name to operation,
//! argument bytes to a typed argument record.
//!
//! Resolution only reads the registry. Nothing is invoked here.

use codec::DecodeAll;
use frame::prelude::*;
use primitives::{ConnectorHandle, ConnectorLookup, IdKey};

/// Operations of the connector capability.
#[derive(
  Clone,
  Copy,
  Debug,
  Decode,
  DecodeWithMemTracking,
  Encode,
  Eq,
  PartialEq,
  TypeInfo,
  MaxEncodedLen,
)]
pub enum ConnectorMethod {
  Deposit,
  Withdraw,
  Buy,
  Sell,
}

impl ConnectorMethod {
  pub fn from_name(name: &[u8]) -> Option<Self> {
    match name {
      b"deposit" => Some(Self::Deposit),
      b"withdraw" => Some(Self::Withdraw),
      b"buy" => Some(Self::Buy),
      b"sell" => Some(Self::Sell),
      _ => None,
    }
  }

  pub fn name(&self) -> &'static [u8] {
    match self {
      Self::Deposit => b"deposit",
      Self::Withdraw => b"withdraw",
      Self::Buy => b"buy",
      Self::Sell => b"sell",
    }
  }
}

/// Add `amount_a` of `asset_a` to the `(asset_a, asset_b)` pool, pairing at
/// most `max_amount_b` of `asset_b`.
#[derive(Clone, Debug, Decode, Encode, Eq, PartialEq, TypeInfo)]
pub struct DepositArgs<AssetId, Balance> {
  pub asset_a: AssetId,
  pub asset_b: AssetId,
  pub amount_a: Balance,
  pub max_amount_b: Balance,
  pub get_id: IdKey,
  pub set_id: IdKey,
}

/// Burn `lp_amount` of the pool share, receiving at least the minimums.
#[derive(Clone, Debug, Decode, Encode, Eq, PartialEq, TypeInfo)]
pub struct WithdrawArgs<AssetId, Balance> {
  pub asset_a: AssetId,
  pub asset_b: AssetId,
  pub lp_amount: Balance,
  pub min_amount_a: Balance,
  pub min_amount_b: Balance,
  pub get_id: IdKey,
  /// Ids receiving the released `asset_a` and `asset_b` amounts.
  pub set_ids: [IdKey; 2],
}

/// Buy exactly `buy_amount`, paying at most `max_sell_amount`.
#[derive(Clone, Debug, Decode, Encode, Eq, PartialEq, TypeInfo)]
pub struct BuyArgs<AssetId, Balance> {
  pub buy_asset: AssetId,
  pub sell_asset: AssetId,
  pub buy_amount: Balance,
  pub max_sell_amount: Balance,
  pub get_id: IdKey,
  pub set_id: IdKey,
}

/// Sell exactly `sell_amount`, receiving at least `min_buy_amount`.
#[derive(Clone, Debug, Decode, Encode, Eq, PartialEq, TypeInfo)]
pub struct SellArgs<AssetId, Balance> {
  pub buy_asset: AssetId,
  pub sell_asset: AssetId,
  pub sell_amount: Balance,
  pub min_buy_amount: Balance,
  pub get_id: IdKey,
  pub set_id: IdKey,
}

/// A method together with its decoded arguments.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ConnectorCall<AssetId, Balance> {
  Deposit(DepositArgs<AssetId, Balance>),
  Withdraw(WithdrawArgs<AssetId, Balance>),
  Buy(BuyArgs<AssetId, Balance>),
  Sell(SellArgs<AssetId, Balance>),
}

impl<AssetId: Decode, Balance: Decode> ConnectorCall<AssetId, Balance> {
  /// Arguments must decode exactly; trailing bytes are rejected.
  pub fn decode_for(method: ConnectorMethod, args: &[u8]) -> Result<Self, codec::Error> {
    let input = &mut &args[..];
    Ok(match method {
      ConnectorMethod::Deposit => Self::Deposit(DepositArgs::decode_all(input)?),
      ConnectorMethod::Withdraw => Self::Withdraw(WithdrawArgs::decode_all(input)?),
      ConnectorMethod::Buy => Self::Buy(BuyArgs::decode_all(input)?),
      ConnectorMethod::Sell => Self::Sell(SellArgs::decode_all(input)?),
    })
  }
}

impl<AssetId, Balance> ConnectorCall<AssetId, Balance> {
  pub fn method(&self) -> ConnectorMethod {
    match self {
      Self::Deposit(_) => ConnectorMethod::Deposit,
      Self::Withdraw(_) => ConnectorMethod::Withdraw,
      Self::Buy(_) => ConnectorMethod::Buy,
      Self::Sell(_) => ConnectorMethod::Sell,
    }
  }

  /// Ids the settled outputs are written to, in output order.
  pub fn set_ids(&self) -> &[IdKey] {
    match self {
      Self::Deposit(args) => core::slice::from_ref(&args.set_id),
      Self::Withdraw(args) => &args.set_ids,
      Self::Buy(args) => core::slice::from_ref(&args.set_id),
      Self::Sell(args) => core::slice::from_ref(&args.set_id),
    }
  }
}

/// A spell ready to be handed to the connector set.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Invocation<AssetId, Balance> {
  pub handle: ConnectorHandle,
  pub call: ConnectorCall<AssetId, Balance>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ResolveError {
  /// Name is not registered, or registered but disabled.
  ConnectorNotFound,
  /// Method is not one of the connector capability's operations.
  UnknownMethod,
  /// Arguments do not decode exactly as the method's argument record.
  MalformedArguments,
}

/// Resolve one spell against the registry `L`.
pub fn resolve<L, AssetId, Balance>(
  connector: &[u8],
  method: &[u8],
  args: &[u8],
) -> Result<Invocation<AssetId, Balance>, ResolveError>
where
  L: ConnectorLookup,
  AssetId: Decode,
  Balance: Decode,
{
  let handle = L::resolve(connector).ok_or(ResolveError::ConnectorNotFound)?;
  let method = ConnectorMethod::from_name(method).ok_or(ResolveError::UnknownMethod)?;
  let call =
    ConnectorCall::decode_for(method, args).map_err(|_| ResolveError::MalformedArguments)?;
  Ok(Invocation { handle, call })
}
