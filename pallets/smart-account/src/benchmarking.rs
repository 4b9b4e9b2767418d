use crate::*;
use alloc::vec::Vec;
use polkadot_sdk::{frame_benchmarking::v2::*, frame_system::RawOrigin};

/// Build an account for `owner` and return its id and sovereign.
fn create_account<T: Config>(owner: &T::AccountId) -> (SmartAccountId, T::AccountId) {
  let id = NextAccountId::<T>::get();
  assert!(Pallet::<T>::build(RawOrigin::Signed(owner.clone()).into()).is_ok());
  let sovereign = Accounts::<T>::get(id)
    .map(|info| info.sovereign)
    .unwrap_or_else(|| panic!("account {id} just built"));
  (id, sovereign)
}

#[benchmarks]
mod benches {
  use super::*;

  #[benchmark]
  fn build() {
    let caller: T::AccountId = whitelisted_caller();
    let id = NextAccountId::<T>::get();

    #[extrinsic_call]
    _(RawOrigin::Signed(caller.clone()));

    assert_eq!(Accounts::<T>::get(id).map(|info| info.owner), Some(caller));
  }

  #[benchmark]
  fn fund() {
    let caller: T::AccountId = whitelisted_caller();
    let (id, _) = create_account::<T>(&caller);
    let (asset, amount) = T::BenchmarkHelper::funded_asset(&caller);
    let before = Pallet::<T>::balance_of(id, asset).unwrap_or_default();

    #[extrinsic_call]
    _(RawOrigin::Signed(caller), id, asset, amount);

    assert_eq!(Pallet::<T>::balance_of(id, asset), Some(before + amount));
  }

  #[benchmark]
  fn cast(s: Linear<1, { T::MaxSpells::get() }>) -> Result<(), BenchmarkError> {
    let caller: T::AccountId = whitelisted_caller();
    let (id, sovereign) = create_account::<T>(&caller);
    let (connector, method, args) = T::BenchmarkHelper::repeatable_spell(&sovereign, s);
    let spell = Spell {
      connector: connector.try_into().map_err(|_| BenchmarkError::Weightless)?,
      method: method.try_into().map_err(|_| BenchmarkError::Weightless)?,
      args: args.try_into().map_err(|_| BenchmarkError::Weightless)?,
    };
    let spells: SpellsOf<T> = (0..s)
      .map(|_| spell.clone())
      .collect::<Vec<_>>()
      .try_into()
      .map_err(|_| BenchmarkError::Weightless)?;

    #[extrinsic_call]
    _(RawOrigin::Signed(caller.clone()), id, spells, caller);

    assert!(!ActiveCasts::<T>::contains_key(id));
    Ok(())
  }

  #[benchmark]
  fn add_authority() {
    let caller: T::AccountId = whitelisted_caller();
    let (id, _) = create_account::<T>(&caller);
    let authority: T::AccountId = account("authority", 0, 0);

    #[extrinsic_call]
    _(RawOrigin::Signed(caller), id, authority.clone());

    assert!(
      Accounts::<T>::get(id)
        .map(|info| info.authorities.contains(&authority))
        .unwrap_or(false)
    );
  }

  #[benchmark]
  fn remove_authority() {
    let caller: T::AccountId = whitelisted_caller();
    let (id, _) = create_account::<T>(&caller);
    let authority: T::AccountId = account("authority", 0, 0);
    assert!(
      Pallet::<T>::add_authority(
        RawOrigin::Signed(caller.clone()).into(),
        id,
        authority.clone()
      )
      .is_ok()
    );

    #[extrinsic_call]
    _(RawOrigin::Signed(caller), id, authority.clone());

    assert!(
      Accounts::<T>::get(id)
        .map(|info| !info.authorities.contains(&authority))
        .unwrap_or(false)
    );
  }

  #[cfg(test)]
  use crate::mock::{Test, new_test_ext};
  #[cfg(test)]
  impl_benchmark_test_suite!(Pallet, new_test_ext(), Test);
}
