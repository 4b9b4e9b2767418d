//! Smart Account Pallet
//!
//! Smart accounts hold funds in a sovereign account derived from the pallet id
//! and cast ordered batches of spells against connectors registered by name.
//! A cast is all-or-nothing: the first failing spell reverts every fund
//! movement, id store write and event of the cast.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub use pallet::*;

pub mod adapters;
pub use adapters::{
  AssetOps, Connector, ConnectorError, ConnectorResult, ConnectorSet, DexOps, Settlement,
};

pub mod connectors;
pub use connectors::DexConnector;

pub mod id_store;
pub use id_store::IdStore;

pub mod resolver;
pub use resolver::{
  BuyArgs, ConnectorCall, ConnectorMethod, DepositArgs, Invocation, SellArgs, WithdrawArgs,
};

pub mod weights;
pub use weights::WeightInfo;

#[cfg(test)]
mod mock;

#[cfg(feature = "runtime-benchmarks")]
mod benchmarking;

#[cfg(feature = "runtime-benchmarks")]
pub trait BenchmarkHelper<AccountId, AssetId, Balance> {
  /// Asset and amount `who` is able to move with `fund`.
  fn funded_asset(who: &AccountId) -> (AssetId, Balance);

  /// Connector name, method and encoded arguments of a spell `sovereign` can
  /// cast `repeat` times in a row. The connector must be registered and
  /// enabled.
  fn repeatable_spell(
    sovereign: &AccountId,
    repeat: u32,
  ) -> (alloc::vec::Vec<u8>, alloc::vec::Vec<u8>, alloc::vec::Vec<u8>);
}

const LOG_TARGET: &str = "runtime::smart-account";

/// Handles served by the runtime's connector set, for the registry's
/// `ConnectorSet` check.
pub struct ServedHandles<T>(core::marker::PhantomData<T>);

impl<T: Config> frame::traits::Contains<primitives::ConnectorHandle> for ServedHandles<T> {
  fn contains(handle: &primitives::ConnectorHandle) -> bool {
    T::ConnectorSet::serves(*handle)
  }
}

#[frame::pallet]
pub mod pallet {
  use super::{
    AssetOps, ConnectorError, ConnectorMethod, ConnectorSet, IdStore, LOG_TARGET, WeightInfo,
    resolver::{self, ResolveError},
  };
  use alloc::vec::Vec;
  use frame::prelude::*;
  use polkadot_sdk::{
    frame_support::{
      PalletError, PalletId,
      storage::{TransactionOutcome, with_transaction},
    },
    sp_runtime::traits::{AccountIdConversion, Zero},
  };
  use primitives::{ConnectorLookup, MAX_CONNECTOR_NAME_LEN, MAX_METHOD_NAME_LEN};

  pub type SmartAccountId = u64;

  pub type ConnectorName = BoundedVec<u8, ConstU32<MAX_CONNECTOR_NAME_LEN>>;
  pub type MethodName = BoundedVec<u8, ConstU32<MAX_METHOD_NAME_LEN>>;

  /// One operation of a cast: connector name, method name, SCALE-encoded
  /// argument record of the method.
  #[derive(Decode, DecodeWithMemTracking, Encode, TypeInfo, MaxEncodedLen)]
  #[scale_info(skip_type_params(MaxArgsLen))]
  pub struct Spell<MaxArgsLen: Get<u32>> {
    pub connector: ConnectorName,
    pub method: MethodName,
    pub args: BoundedVec<u8, MaxArgsLen>,
  }

  impl<MaxArgsLen: Get<u32>> Clone for Spell<MaxArgsLen> {
    fn clone(&self) -> Self {
      Self {
        connector: self.connector.clone(),
        method: self.method.clone(),
        args: self.args.clone(),
      }
    }
  }

  impl<MaxArgsLen: Get<u32>> core::fmt::Debug for Spell<MaxArgsLen> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
      f.debug_struct("Spell")
        .field("connector", &self.connector)
        .field("method", &self.method)
        .field("args", &self.args)
        .finish()
    }
  }

  impl<MaxArgsLen: Get<u32>> PartialEq for Spell<MaxArgsLen> {
    fn eq(&self, other: &Self) -> bool {
      self.connector == other.connector && self.method == other.method && self.args == other.args
    }
  }

  impl<MaxArgsLen: Get<u32>> Eq for Spell<MaxArgsLen> {}

  #[derive(
    Clone, Debug, Decode, DecodeWithMemTracking, Encode, Eq, PartialEq, TypeInfo, MaxEncodedLen,
  )]
  #[scale_info(skip_type_params(MaxAuthorities))]
  pub struct SmartAccount<AccountId, BlockNumber, MaxAuthorities: Get<u32>> {
    pub owner: AccountId,
    pub sovereign: AccountId,
    /// Accounts other than the owner allowed to cast.
    pub authorities: BoundedVec<AccountId, MaxAuthorities>,
    pub created_at: BlockNumber,
  }

  impl<AccountId: PartialEq, BlockNumber, MaxAuthorities: Get<u32>>
    SmartAccount<AccountId, BlockNumber, MaxAuthorities>
  {
    pub fn can_cast(&self, who: &AccountId) -> bool {
      self.owner == *who || self.authorities.contains(who)
    }
  }

  /// Reason a spell failed.
  #[derive(Clone, Debug, Decode, Encode, Eq, PartialEq, TypeInfo)]
  pub enum CastError {
    ConnectorNotFound,
    UnknownMethod,
    MalformedArguments,
    UnsetId(primitives::IdKey),
    SlippageExceeded,
    AdapterFailure(DispatchError),
  }

  impl From<ResolveError> for CastError {
    fn from(err: ResolveError) -> Self {
      match err {
        ResolveError::ConnectorNotFound => CastError::ConnectorNotFound,
        ResolveError::UnknownMethod => CastError::UnknownMethod,
        ResolveError::MalformedArguments => CastError::MalformedArguments,
      }
    }
  }

  impl From<ConnectorError> for CastError {
    fn from(err: ConnectorError) -> Self {
      match err {
        ConnectorError::SlippageExceeded => CastError::SlippageExceeded,
        ConnectorError::UnsetId(id) => CastError::UnsetId(id),
        // The connector is registered but does not offer the method
        ConnectorError::Unsupported => CastError::UnknownMethod,
        ConnectorError::Venue(reason) => CastError::AdapterFailure(reason),
      }
    }
  }

  /// What went wrong with a spell, as reported by the `cast` extrinsic.
  #[derive(
    Clone,
    Copy,
    Debug,
    Decode,
    DecodeWithMemTracking,
    Encode,
    Eq,
    PartialEq,
    PalletError,
    TypeInfo,
    MaxEncodedLen,
  )]
  pub enum SpellErrorKind {
    /// Connector name is not registered or is disabled.
    ConnectorNotFound,
    /// Method is not an operation of the connector.
    UnknownMethod,
    /// Spell arguments do not decode as the method's argument record.
    MalformedArguments,
    /// A spell read an id no earlier spell of the cast had set.
    UnsetId,
    /// A settled amount breached the spell's limit.
    SlippageExceeded,
    /// The connector or its venue failed.
    AdapterFailure,
  }

  impl From<&CastError> for SpellErrorKind {
    fn from(err: &CastError) -> Self {
      match err {
        CastError::ConnectorNotFound => SpellErrorKind::ConnectorNotFound,
        CastError::UnknownMethod => SpellErrorKind::UnknownMethod,
        CastError::MalformedArguments => SpellErrorKind::MalformedArguments,
        CastError::UnsetId(_) => SpellErrorKind::UnsetId,
        CastError::SlippageExceeded => SpellErrorKind::SlippageExceeded,
        CastError::AdapterFailure(_) => SpellErrorKind::AdapterFailure,
      }
    }
  }

  /// The failing spell of a reverted cast.
  #[derive(Clone, Debug, Decode, Encode, Eq, PartialEq, TypeInfo)]
  pub struct SpellFailure {
    pub index: u32,
    pub connector: ConnectorName,
    pub method: MethodName,
    pub error: CastError,
  }

  #[derive(Clone, Debug, Eq, PartialEq)]
  pub enum CastFailure {
    /// Refused before any spell ran.
    Rejected(DispatchError),
    /// A spell failed; every earlier spell was reverted with it.
    Spell(SpellFailure),
  }

  impl From<DispatchError> for CastFailure {
    fn from(err: DispatchError) -> Self {
      CastFailure::Rejected(err)
    }
  }

  impl<T: Config> From<Error<T>> for CastFailure {
    fn from(err: Error<T>) -> Self {
      CastFailure::Rejected(err.into())
    }
  }

  impl CastFailure {
    pub fn into_dispatch_error<T: Config>(self) -> DispatchError {
      match self {
        CastFailure::Rejected(err) => err,
        CastFailure::Spell(failure) => Error::<T>::SpellFailed {
          index: u8::try_from(failure.index).unwrap_or(u8::MAX),
          kind: SpellErrorKind::from(&failure.error),
        }
        .into(),
      }
    }
  }

  #[derive(Clone, Debug, Decode, Encode, Eq, PartialEq, TypeInfo)]
  pub struct SpellResult<Balance> {
    pub connector: ConnectorName,
    pub method: ConnectorMethod,
    pub actual_amount: Balance,
  }

  /// What a committed cast settled, spell by spell.
  #[derive(Clone, Debug, Decode, Encode, Eq, PartialEq, TypeInfo)]
  pub struct CastReceipt<AccountId, Balance> {
    pub account: SmartAccountId,
    pub origin: AccountId,
    pub results: Vec<SpellResult<Balance>>,
  }

  #[pallet::config]
  pub trait Config: frame_system::Config {
    type AssetId: Parameter + Member + Copy + MaxEncodedLen;

    type Balance: Parameter + Member + AtLeast32BitUnsigned + Default + Copy + MaxEncodedLen;

    type AssetOps: AssetOps<Self::AccountId, Self::AssetId, Self::Balance>;

    /// Registry spells are resolved against.
    type Connectors: ConnectorLookup;

    /// Connector implementations, addressed by the handles the registry stores.
    type ConnectorSet: ConnectorSet<Self::AccountId, Self::AssetId, Self::Balance>;

    #[pallet::constant]
    type PalletId: Get<PalletId>;

    #[pallet::constant]
    type MaxSpells: Get<u32>;
    #[pallet::constant]
    type MaxArgsLen: Get<u32>;
    #[pallet::constant]
    type MaxAuthorities: Get<u32>;
    #[pallet::constant]
    type MaxAccountsPerOwner: Get<u32>;

    type WeightInfo: WeightInfo;

    #[cfg(feature = "runtime-benchmarks")]
    type BenchmarkHelper: crate::BenchmarkHelper<Self::AccountId, Self::AssetId, Self::Balance>;
  }

  pub type BalanceOf<T> = <T as Config>::Balance;
  pub type SpellOf<T> = Spell<<T as Config>::MaxArgsLen>;
  pub type SpellsOf<T> = BoundedVec<SpellOf<T>, <T as Config>::MaxSpells>;
  pub type SmartAccountOf<T> = SmartAccount<
    <T as frame_system::Config>::AccountId,
    BlockNumberFor<T>,
    <T as Config>::MaxAuthorities,
  >;
  pub type CastReceiptOf<T> = CastReceipt<<T as frame_system::Config>::AccountId, BalanceOf<T>>;

  #[pallet::pallet]
  pub struct Pallet<T>(_);

  #[pallet::storage]
  #[pallet::getter(fn next_account_id)]
  pub type NextAccountId<T> = StorageValue<_, SmartAccountId, ValueQuery>;

  #[pallet::storage]
  #[pallet::getter(fn accounts)]
  pub type Accounts<T: Config> =
    StorageMap<_, Blake2_128Concat, SmartAccountId, SmartAccountOf<T>, OptionQuery>;

  #[pallet::storage]
  #[pallet::getter(fn owner_index)]
  pub type OwnerIndex<T: Config> = StorageMap<
    _,
    Blake2_128Concat,
    T::AccountId,
    BoundedVec<SmartAccountId, T::MaxAccountsPerOwner>,
    ValueQuery,
  >;

  #[pallet::storage]
  #[pallet::getter(fn sovereign_index)]
  pub type SovereignIndex<T: Config> =
    StorageMap<_, Blake2_128Concat, T::AccountId, SmartAccountId, OptionQuery>;

  /// Accounts with a cast in progress.
  #[pallet::storage]
  pub type ActiveCasts<T> = StorageMap<_, Blake2_128Concat, SmartAccountId, (), OptionQuery>;

  #[pallet::event]
  #[pallet::generate_deposit(pub(super) fn deposit_event)]
  pub enum Event<T: Config> {
    SmartAccountCreated {
      account: SmartAccountId,
      owner: T::AccountId,
      sovereign: T::AccountId,
    },
    AccountFunded {
      account: SmartAccountId,
      from: T::AccountId,
      asset: T::AssetId,
      amount: BalanceOf<T>,
    },
    AuthorityAdded {
      account: SmartAccountId,
      authority: T::AccountId,
    },
    AuthorityRemoved {
      account: SmartAccountId,
      authority: T::AccountId,
    },
    /// One spell settled. Reverted together with the rest of the cast.
    SpellCast {
      account: SmartAccountId,
      index: u32,
      connector: ConnectorName,
      method: ConnectorMethod,
      actual_amount: BalanceOf<T>,
    },
    /// Every spell of the cast settled and the cast committed.
    CastExecuted {
      account: SmartAccountId,
      origin: T::AccountId,
      spell_count: u32,
    },
  }

  #[pallet::error]
  pub enum Error<T> {
    /// Spell `index` of the cast failed and the whole cast was reverted.
    /// Connector and method are those of `spells[index]`.
    SpellFailed { index: u8, kind: SpellErrorKind },
    /// Caller is neither the owner nor an authority of the account.
    Unauthorized,
    /// The account already has a cast in progress.
    CastInProgress,
    /// A cast needs at least one spell.
    EmptyCast,
    AccountNotFound,
    AccountIdOverflow,
    OwnerIndexFull,
    SovereignAccountCollision,
    TooManyAuthorities,
    AlreadyAuthority,
    NotAuthority,
    AmountZero,
  }

  #[pallet::call]
  impl<T: Config> Pallet<T> {
    /// Create a smart account owned by the caller.
    #[pallet::call_index(0)]
    #[pallet::weight(T::WeightInfo::build())]
    pub fn build(origin: OriginFor<T>) -> DispatchResult {
      let owner = ensure_signed(origin)?;
      let account = NextAccountId::<T>::get();
      let next_id = account
        .checked_add(1)
        .ok_or(Error::<T>::AccountIdOverflow)?;
      let sovereign = Self::sovereign_account_id(account);
      ensure!(
        !SovereignIndex::<T>::contains_key(&sovereign),
        Error::<T>::SovereignAccountCollision
      );
      OwnerIndex::<T>::try_mutate(&owner, |owned| {
        owned
          .try_push(account)
          .map_err(|_| Error::<T>::OwnerIndexFull)
      })?;
      SovereignIndex::<T>::insert(&sovereign, account);
      Accounts::<T>::insert(
        account,
        SmartAccount {
          owner: owner.clone(),
          sovereign: sovereign.clone(),
          authorities: BoundedVec::default(),
          created_at: frame_system::Pallet::<T>::block_number(),
        },
      );
      NextAccountId::<T>::put(next_id);
      Self::deposit_event(Event::SmartAccountCreated {
        account,
        owner,
        sovereign,
      });
      Ok(())
    }

    /// Move `amount` of `asset` from the caller into the account's sovereign.
    #[pallet::call_index(1)]
    #[pallet::weight(T::WeightInfo::fund())]
    pub fn fund(
      origin: OriginFor<T>,
      account: SmartAccountId,
      asset: T::AssetId,
      amount: BalanceOf<T>,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      ensure!(!amount.is_zero(), Error::<T>::AmountZero);
      let info = Accounts::<T>::get(account).ok_or(Error::<T>::AccountNotFound)?;
      T::AssetOps::transfer(&who, &info.sovereign, asset, amount)?;
      Self::deposit_event(Event::AccountFunded {
        account,
        from: who,
        asset,
        amount,
      });
      Ok(())
    }

    /// Execute `spells` in order on behalf of `account`.
    ///
    /// - `origin`: Owner or authority of the account.
    /// - `cast_origin`: Recorded in the `CastExecuted` event for attribution only.
    ///
    /// Fails with the error of the first failing spell; nothing the cast did
    /// persists in that case.
    #[pallet::call_index(2)]
    #[pallet::weight(T::WeightInfo::cast(spells.len() as u32))]
    pub fn cast(
      origin: OriginFor<T>,
      account: SmartAccountId,
      spells: SpellsOf<T>,
      cast_origin: T::AccountId,
    ) -> DispatchResult {
      let caster = ensure_signed(origin)?;
      Self::do_cast(account, &caster, &spells, cast_origin)
        .map(|_| ())
        .map_err(|failure| failure.into_dispatch_error::<T>())
    }

    /// Allow `authority` to cast for the account. Owner only.
    #[pallet::call_index(3)]
    #[pallet::weight(T::WeightInfo::add_authority())]
    pub fn add_authority(
      origin: OriginFor<T>,
      account: SmartAccountId,
      authority: T::AccountId,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Accounts::<T>::try_mutate(account, |maybe| -> DispatchResult {
        let info = maybe.as_mut().ok_or(Error::<T>::AccountNotFound)?;
        ensure!(info.owner == who, Error::<T>::Unauthorized);
        ensure!(
          !info.can_cast(&authority),
          Error::<T>::AlreadyAuthority
        );
        info
          .authorities
          .try_push(authority.clone())
          .map_err(|_| Error::<T>::TooManyAuthorities)?;
        Ok(())
      })?;
      Self::deposit_event(Event::AuthorityAdded { account, authority });
      Ok(())
    }

    /// Revoke the cast right of `authority`. Owner only.
    #[pallet::call_index(4)]
    #[pallet::weight(T::WeightInfo::remove_authority())]
    pub fn remove_authority(
      origin: OriginFor<T>,
      account: SmartAccountId,
      authority: T::AccountId,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Accounts::<T>::try_mutate(account, |maybe| -> DispatchResult {
        let info = maybe.as_mut().ok_or(Error::<T>::AccountNotFound)?;
        ensure!(info.owner == who, Error::<T>::Unauthorized);
        let position = info
          .authorities
          .iter()
          .position(|a| *a == authority)
          .ok_or(Error::<T>::NotAuthority)?;
        info.authorities.remove(position);
        Ok(())
      })?;
      Self::deposit_event(Event::AuthorityRemoved { account, authority });
      Ok(())
    }
  }

  impl<T: Config> Pallet<T> {
    pub fn sovereign_account_id(account: SmartAccountId) -> T::AccountId {
      let mut seed_input = account.encode();
      seed_input.extend_from_slice(b"smact");
      let seed = frame::hashing::blake2_256(&seed_input);
      // Short AccountId types truncate the sub-account payload, so the seed is
      // folded into the pallet id itself
      let mut id_bytes = T::PalletId::get().0;
      for (i, b) in seed.iter().enumerate() {
        id_bytes[i % 8] ^= b;
      }
      PalletId(id_bytes).into_sub_account_truncating(account)
    }

    /// Balance of `asset` held by the account's sovereign.
    pub fn balance_of(account: SmartAccountId, asset: T::AssetId) -> Option<BalanceOf<T>> {
      Accounts::<T>::get(account).map(|info| T::AssetOps::balance(&info.sovereign, asset))
    }

    /// Run a cast as one unit.
    ///
    /// `caster` must be the owner or an authority. Spells execute in order
    /// against a fresh id store inside a storage transaction that commits only
    /// if every spell settles.
    pub fn do_cast(
      account: SmartAccountId,
      caster: &T::AccountId,
      spells: &[SpellOf<T>],
      cast_origin: T::AccountId,
    ) -> Result<CastReceiptOf<T>, CastFailure> {
      let info = Accounts::<T>::get(account).ok_or(Error::<T>::AccountNotFound)?;
      ensure!(info.can_cast(caster), Error::<T>::Unauthorized);
      ensure!(!spells.is_empty(), Error::<T>::EmptyCast);
      ensure!(
        !ActiveCasts::<T>::contains_key(account),
        Error::<T>::CastInProgress
      );

      ActiveCasts::<T>::insert(account, ());
      let outcome = with_transaction(|| {
        match Self::execute_spells(account, &info.sovereign, spells) {
          Ok(results) => TransactionOutcome::Commit(Ok(results)),
          Err(failure) => TransactionOutcome::Rollback(Err(CastFailure::Spell(failure))),
        }
      });
      ActiveCasts::<T>::remove(account);

      match outcome {
        Ok(results) => {
          Self::deposit_event(Event::CastExecuted {
            account,
            origin: cast_origin.clone(),
            spell_count: results.len() as u32,
          });
          Ok(CastReceipt {
            account,
            origin: cast_origin,
            results,
          })
        }
        Err(failure) => {
          if let CastFailure::Spell(ref spell) = failure {
            log::warn!(
              target: LOG_TARGET,
              "cast on account {} by {:?} reverted at spell {} ({}.{}): {:?}",
              account,
              cast_origin,
              spell.index,
              core::str::from_utf8(&spell.connector).unwrap_or("<non-utf8>"),
              core::str::from_utf8(&spell.method).unwrap_or("<non-utf8>"),
              spell.error,
            );
          }
          Err(failure)
        }
      }
    }

    fn execute_spells(
      account: SmartAccountId,
      sovereign: &T::AccountId,
      spells: &[SpellOf<T>],
    ) -> Result<Vec<SpellResult<BalanceOf<T>>>, SpellFailure> {
      let mut ids = IdStore::<BalanceOf<T>>::new();
      let mut results = Vec::with_capacity(spells.len());
      for (index, spell) in spells.iter().enumerate() {
        let index = index as u32;
        let settle = || -> Result<_, CastError> {
          let invocation = resolver::resolve::<T::Connectors, T::AssetId, BalanceOf<T>>(
            &spell.connector,
            &spell.method,
            &spell.args,
          )?;
          // A handle the runtime no longer serves resolves to nothing
          let settlement =
            T::ConnectorSet::invoke(invocation.handle, sovereign, &invocation.call, &ids)
              .ok_or(CastError::ConnectorNotFound)??;
          // Every set id needs a settled output
          ensure!(
            settlement.outputs.len() == invocation.call.set_ids().len(),
            CastError::AdapterFailure(DispatchError::Other("SettlementOutputMismatch"))
          );
          Ok((invocation.call, settlement))
        };
        let (call, settlement) = settle().map_err(|error| SpellFailure {
          index,
          connector: spell.connector.clone(),
          method: spell.method.clone(),
          error,
        })?;

        for (id, value) in call.set_ids().iter().zip(settlement.outputs.iter()) {
          ids.set(*id, *value);
        }
        let method = call.method();
        Self::deposit_event(Event::SpellCast {
          account,
          index,
          connector: spell.connector.clone(),
          method,
          actual_amount: settlement.actual_amount,
        });
        results.push(SpellResult {
          connector: spell.connector.clone(),
          method,
          actual_amount: settlement.actual_amount,
        });
      }
      log::debug!(
        target: LOG_TARGET,
        "cast on account {} settled {} spell(s), {} id(s) written",
        account,
        results.len(),
        ids.len(),
      );
      Ok(results)
    }
  }
}
