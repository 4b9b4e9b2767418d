use crate::*;
use frame::deps::frame_support::traits::EnsureOrigin;
use polkadot_sdk::frame_benchmarking::v2::*;
use primitives::ConnectorInfo;

fn bench_name(tag: u8) -> ConnectorName {
  let mut raw = b"bench-connector-".to_vec();
  raw.push(b'a' + (tag % 26));
  raw.try_into().unwrap_or_default()
}

fn seed_connector<T: Config>(name: &ConnectorName) {
  Connectors::<T>::insert(
    name,
    ConnectorInfo::new(<T as Config>::BenchmarkHelper::connector_handle()),
  );
}

#[benchmarks]
mod benches {
  use super::*;

  #[benchmark]
  fn register_connector() -> Result<(), BenchmarkError> {
    let origin =
      T::GovernanceOrigin::try_successful_origin().map_err(|_| BenchmarkError::Weightless)?;
    let name = bench_name(0);
    let handle = <T as Config>::BenchmarkHelper::connector_handle();

    #[extrinsic_call]
    _(origin as T::RuntimeOrigin, name.clone(), handle);

    assert!(Connectors::<T>::contains_key(&name));
    Ok(())
  }

  #[benchmark]
  fn deregister_connector() -> Result<(), BenchmarkError> {
    let origin =
      T::GovernanceOrigin::try_successful_origin().map_err(|_| BenchmarkError::Weightless)?;
    let name = bench_name(1);
    seed_connector::<T>(&name);

    #[extrinsic_call]
    _(origin as T::RuntimeOrigin, name.clone());

    assert!(!Connectors::<T>::contains_key(&name));
    Ok(())
  }

  #[benchmark]
  fn set_connector_enabled() -> Result<(), BenchmarkError> {
    let origin =
      T::GovernanceOrigin::try_successful_origin().map_err(|_| BenchmarkError::Weightless)?;
    let name = bench_name(2);
    seed_connector::<T>(&name);

    #[extrinsic_call]
    _(origin as T::RuntimeOrigin, name.clone(), false);

    assert_eq!(Connectors::<T>::get(&name).map(|info| info.enabled), Some(false));
    Ok(())
  }

  #[benchmark]
  fn update_connector() -> Result<(), BenchmarkError> {
    let origin =
      T::GovernanceOrigin::try_successful_origin().map_err(|_| BenchmarkError::Weightless)?;
    let name = bench_name(3);
    seed_connector::<T>(&name);
    let handle = <T as Config>::BenchmarkHelper::connector_handle();

    #[extrinsic_call]
    _(origin as T::RuntimeOrigin, name.clone(), handle);

    assert!(Connectors::<T>::contains_key(&name));
    Ok(())
  }

  #[cfg(test)]
  use crate::mock::{Test, new_test_ext};
  #[cfg(test)]
  impl_benchmark_test_suite!(Pallet, new_test_ext(), Test);
}
