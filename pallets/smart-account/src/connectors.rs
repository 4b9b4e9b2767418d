//! Connectors shipped with the pallet.

use crate::adapters::{Connector, ConnectorError, ConnectorResult, DexOps, Settlement};
use crate::id_store::IdStore;
use crate::resolver::{BuyArgs, DepositArgs, SellArgs, WithdrawArgs};
use alloc::vec;
use core::marker::PhantomData;
use frame::prelude::*;
use polkadot_sdk::sp_runtime::{
  ArithmeticError,
  traits::{Bounded, CheckedAdd, CheckedMul, One, Zero},
};
use primitives::ConnectorHandle;

/// Constant-product exchange connector over any `DexOps` venue.
///
/// `deposit` adds pooled liquidity, `withdraw` removes it, `buy` swaps for an
/// exact output and `sell` swaps an exact input. Spell limits are checked
/// against the settled amounts; a breach fails the spell with
/// `SlippageExceeded` and the cast reverts whatever the venue moved.
pub struct DexConnector<D, H>(PhantomData<(D, H)>);

impl<AccountId, AssetId, Balance, D, H> Connector<AccountId, AssetId, Balance>
  for DexConnector<D, H>
where
  AssetId: Copy,
  Balance: AtLeast32BitUnsigned + Copy,
  D: DexOps<AccountId, AssetId, Balance>,
  H: Get<ConnectorHandle>,
{
  fn handle() -> ConnectorHandle {
    H::get()
  }

  fn deposit(
    who: &AccountId,
    args: &DepositArgs<AssetId, Balance>,
    ids: &IdStore<Balance>,
  ) -> ConnectorResult<Balance> {
    let amount_a = ids.amount_or(args.get_id, args.amount_a)?;
    // Empty or missing pool: the caller sets the price with both amounts
    let amount_b = match D::get_pool_reserves(args.asset_a, args.asset_b) {
      Some((reserve_a, reserve_b)) if !reserve_a.is_zero() => {
        pair_amount(amount_a, reserve_a, reserve_b)?
      }
      _ => args.max_amount_b,
    };
    if amount_b > args.max_amount_b {
      return Err(ConnectorError::SlippageExceeded);
    }
    let (_, used_b, lp_minted) =
      D::add_liquidity(who, args.asset_a, args.asset_b, amount_a, amount_b)?;
    if used_b > args.max_amount_b {
      return Err(ConnectorError::SlippageExceeded);
    }
    Ok(Settlement::single(lp_minted))
  }

  fn withdraw(
    who: &AccountId,
    args: &WithdrawArgs<AssetId, Balance>,
    ids: &IdStore<Balance>,
  ) -> ConnectorResult<Balance> {
    let lp_amount = ids.amount_or(args.get_id, args.lp_amount)?;
    let (amount_a, amount_b) = D::remove_liquidity(who, args.asset_a, args.asset_b, lp_amount)?;
    if amount_a < args.min_amount_a || amount_b < args.min_amount_b {
      return Err(ConnectorError::SlippageExceeded);
    }
    Ok(Settlement {
      actual_amount: lp_amount,
      outputs: vec![amount_a, amount_b],
    })
  }

  fn buy(
    who: &AccountId,
    args: &BuyArgs<AssetId, Balance>,
    ids: &IdStore<Balance>,
  ) -> ConnectorResult<Balance> {
    let buy_amount = ids.amount_or(args.get_id, args.buy_amount)?;
    let paid = D::swap_exact_out(
      who,
      args.sell_asset,
      args.buy_asset,
      buy_amount,
      Balance::max_value(),
    )?;
    if paid > args.max_sell_amount {
      return Err(ConnectorError::SlippageExceeded);
    }
    Ok(Settlement::single(paid))
  }

  fn sell(
    who: &AccountId,
    args: &SellArgs<AssetId, Balance>,
    ids: &IdStore<Balance>,
  ) -> ConnectorResult<Balance> {
    let sell_amount = ids.amount_or(args.get_id, args.sell_amount)?;
    let received = D::swap_exact_in(
      who,
      args.sell_asset,
      args.buy_asset,
      sell_amount,
      Zero::zero(),
    )?;
    if received < args.min_buy_amount {
      return Err(ConnectorError::SlippageExceeded);
    }
    Ok(Settlement::single(received))
  }
}

/// `amount_a * reserve_b / reserve_a`, rounded up so the pool ratio never
/// moves against existing providers.
fn pair_amount<Balance: AtLeast32BitUnsigned + Copy>(
  amount_a: Balance,
  reserve_a: Balance,
  reserve_b: Balance,
) -> Result<Balance, ConnectorError> {
  let overflow = ConnectorError::Venue(DispatchError::Arithmetic(ArithmeticError::Overflow));
  let numerator = amount_a.checked_mul(&reserve_b).ok_or(overflow.clone())?;
  let quotient = numerator / reserve_a;
  if (numerator % reserve_a).is_zero() {
    Ok(quotient)
  } else {
    quotient.checked_add(&One::one()).ok_or(overflow)
  }
}
