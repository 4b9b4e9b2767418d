//! Connector Registry Pallet
//!
//! Maps connector names to the runtime handles of adapter implementations.
//! Only the governance origin may mutate the registry; every mutation is a
//! single storage write and is visible to the next lookup.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub use pallet::*;

pub mod weights;
pub use weights::WeightInfo;


#[cfg(feature = "runtime-benchmarks")]
mod benchmarking;

#[cfg(feature = "runtime-benchmarks")]
pub trait BenchmarkHelper {
  /// A handle the runtime's connector set serves.
  fn connector_handle() -> primitives::ConnectorHandle;
}

const LOG_TARGET: &str = "runtime::connectors";

#[frame::pallet]
pub mod pallet {
  use crate::{LOG_TARGET, weights::WeightInfo as _};
  use alloc::vec::Vec;
  use frame::deps::{
    frame_support::traits::{Contains, EnsureOrigin},
    sp_runtime::DispatchResult,
  };
  use frame::prelude::*;
  use primitives::{ConnectorHandle, ConnectorInfo, ConnectorLookup, MAX_CONNECTOR_NAME_LEN};

  pub type ConnectorName = BoundedVec<u8, ConstU32<MAX_CONNECTOR_NAME_LEN>>;

  #[pallet::config]
  pub trait Config: frame_system::Config {
    /// Origin that can register, update, remove and toggle connectors (e.g. Governance or Root)
    type GovernanceOrigin: EnsureOrigin<Self::RuntimeOrigin>;

    /// Handles the runtime can dispatch spells to.
    type ConnectorSet: Contains<ConnectorHandle>;

    type WeightInfo: crate::weights::WeightInfo;

    #[cfg(feature = "runtime-benchmarks")]
    type BenchmarkHelper: crate::BenchmarkHelper;
  }

  #[pallet::pallet]
  pub struct Pallet<T>(_);

  /// Connector name -> handle and enabled flag.
  #[pallet::storage]
  #[pallet::getter(fn connector)]
  pub type Connectors<T: Config> =
    StorageMap<_, Blake2_128Concat, ConnectorName, ConnectorInfo, OptionQuery>;

  #[pallet::event]
  #[pallet::generate_deposit(pub(super) fn deposit_event)]
  pub enum Event<T: Config> {
    /// A connector name was bound to a handle and enabled.
    ConnectorRegistered {
      name: ConnectorName,
      handle: ConnectorHandle,
    },
    /// An existing connector name was re-pointed to another handle.
    ConnectorUpdated {
      name: ConnectorName,
      old_handle: ConnectorHandle,
      new_handle: ConnectorHandle,
    },
    /// A connector name was removed.
    ConnectorDeregistered { name: ConnectorName },
    /// A connector was enabled or disabled.
    ConnectorToggled { name: ConnectorName, enabled: bool },
  }

  #[pallet::error]
  pub enum Error<T> {
    /// Caller is not the governance origin.
    Unauthorized,
    /// A connector with this name is already registered.
    DuplicateName,
    /// No connector with this name is registered.
    UnknownName,
    /// Connector names must not be empty.
    EmptyName,
    /// The runtime does not serve this handle.
    InvalidHandle,
  }

  #[pallet::genesis_config]
  #[derive(frame::prelude::DefaultNoBound)]
  pub struct GenesisConfig<T: Config> {
    /// Connectors enabled from block zero.
    pub connectors: Vec<(Vec<u8>, ConnectorHandle)>,
    #[serde(skip)]
    pub _marker: core::marker::PhantomData<T>,
  }

  #[pallet::genesis_build]
  impl<T: Config> BuildGenesisConfig for GenesisConfig<T> {
    fn build(&self) {
      for (name, handle) in self.connectors.iter() {
        let name: ConnectorName = name
          .clone()
          .try_into()
          .expect("Genesis connector name exceeds MAX_CONNECTOR_NAME_LEN");
        assert!(!name.is_empty(), "Genesis connector name is empty");
        assert!(
          T::ConnectorSet::contains(handle),
          "Genesis connector handle is not served by the runtime"
        );
        assert!(
          !Connectors::<T>::contains_key(&name),
          "Duplicate genesis connector name"
        );
        Connectors::<T>::insert(name, ConnectorInfo::new(*handle));
      }
    }
  }

  #[pallet::call]
  impl<T: Config> Pallet<T> {
    /// Register a connector under a new name. The entry starts enabled.
    ///
    /// - `origin`: Must match `GovernanceOrigin`.
    /// - `name`: Unique, non-empty connector name spells refer to.
    /// - `handle`: Adapter implementation the name dispatches to.
    #[pallet::call_index(0)]
    #[pallet::weight(T::WeightInfo::register_connector())]
    pub fn register_connector(
      origin: OriginFor<T>,
      name: ConnectorName,
      handle: ConnectorHandle,
    ) -> DispatchResult {
      Self::ensure_governance(origin)?;
      ensure!(!name.is_empty(), Error::<T>::EmptyName);
      ensure!(T::ConnectorSet::contains(&handle), Error::<T>::InvalidHandle);
      ensure!(
        !Connectors::<T>::contains_key(&name),
        Error::<T>::DuplicateName
      );
      Connectors::<T>::insert(&name, ConnectorInfo::new(handle));
      log::debug!(target: LOG_TARGET, "registered connector {:?} -> {}", name, handle);
      Self::deposit_event(Event::ConnectorRegistered { name, handle });
      Ok(())
    }

    /// Remove a connector. Spells naming it stop resolving immediately.
    #[pallet::call_index(1)]
    #[pallet::weight(T::WeightInfo::deregister_connector())]
    pub fn deregister_connector(origin: OriginFor<T>, name: ConnectorName) -> DispatchResult {
      Self::ensure_governance(origin)?;
      Connectors::<T>::take(&name).ok_or(Error::<T>::UnknownName)?;
      log::debug!(target: LOG_TARGET, "deregistered connector {:?}", name);
      Self::deposit_event(Event::ConnectorDeregistered { name });
      Ok(())
    }

    /// Enable or disable a connector without forgetting its handle.
    #[pallet::call_index(2)]
    #[pallet::weight(T::WeightInfo::set_connector_enabled())]
    pub fn set_connector_enabled(
      origin: OriginFor<T>,
      name: ConnectorName,
      enabled: bool,
    ) -> DispatchResult {
      Self::ensure_governance(origin)?;
      Connectors::<T>::try_mutate(&name, |maybe| -> DispatchResult {
        let info = maybe.as_mut().ok_or(Error::<T>::UnknownName)?;
        info.enabled = enabled;
        Ok(())
      })?;
      Self::deposit_event(Event::ConnectorToggled { name, enabled });
      Ok(())
    }

    /// Re-point an existing connector name at another implementation.
    ///
    /// The enabled flag is preserved.
    #[pallet::call_index(3)]
    #[pallet::weight(T::WeightInfo::update_connector())]
    pub fn update_connector(
      origin: OriginFor<T>,
      name: ConnectorName,
      handle: ConnectorHandle,
    ) -> DispatchResult {
      Self::ensure_governance(origin)?;
      ensure!(T::ConnectorSet::contains(&handle), Error::<T>::InvalidHandle);
      let old_handle = Connectors::<T>::try_mutate(&name, |maybe| {
        let info = maybe.as_mut().ok_or(Error::<T>::UnknownName)?;
        let old = info.handle;
        info.handle = handle;
        Ok::<_, Error<T>>(old)
      })?;
      Self::deposit_event(Event::ConnectorUpdated {
        name,
        old_handle,
        new_handle: handle,
      });
      Ok(())
    }
  }

  impl<T: Config> Pallet<T> {
    fn ensure_governance(origin: OriginFor<T>) -> DispatchResult {
      T::GovernanceOrigin::ensure_origin(origin).map_err(|_| Error::<T>::Unauthorized)?;
      Ok(())
    }
  }

  /// Read side used by the smart-account engine. Names longer than the bound
  /// can never have been registered, so they resolve to nothing.
  impl<T: Config> ConnectorLookup for Pallet<T> {
    fn resolve(name: &[u8]) -> Option<ConnectorHandle> {
      let key = ConnectorName::try_from(name.to_vec()).ok()?;
      Connectors::<T>::get(&key)?.resolvable()
    }
  }
}
