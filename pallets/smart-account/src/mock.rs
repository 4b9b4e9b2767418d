use crate as pallet_smart_account;
use frame::prelude::*;
use polkadot_sdk::{
  frame_support::{
    PalletId, construct_runtime,
    storage::unhashed,
    traits::{ConstU32, ConstU128, Get},
  },
  frame_system::EnsureRoot,
  sp_runtime::{
    BuildStorage, TokenError,
    traits::{BlakeTwo256, IdentityLookup},
  },
};
use primitives::{ConnectorHandle, params, pallet_ids::SMART_ACCOUNT_PALLET_ID};

use alloc::vec;
use core::cell::RefCell;

use crate::{
  AssetOps, BuyArgs, Connector, ConnectorError, ConnectorResult, DepositArgs, DexConnector,
  DexOps, IdStore, Settlement, WithdrawArgs,
};

type Block = polkadot_sdk::frame_system::mocking::MockBlock<Test>;
pub type AccountId = u64;
pub type Balance = primitives::Balance;

pub const ALICE: AccountId = 1;
pub const BOB: AccountId = 2;
pub const CHARLIE: AccountId = 3;
/// Holds every pool's reserves.
pub const POOL: AccountId = 7_777;
/// Receives what the probe connector moves.
pub const SINK: AccountId = 8_888;

pub const USDC: TestAsset = TestAsset::Local(1);
pub const DAI: TestAsset = TestAsset::Local(2);

pub const QUICKSWAP: &[u8] = b"Quickswap-v1.1";
pub const QUICKSWAP_HANDLE: ConnectorHandle = 1;
pub const PROBE: &[u8] = b"Probe";
pub const PROBE_HANDLE: ConnectorHandle = 2;
pub const SHORT: &[u8] = b"Short";
pub const SHORT_HANDLE: ConnectorHandle = 3;

#[derive(
  Clone,
  Copy,
  Debug,
  Default,
  Decode,
  DecodeWithMemTracking,
  Encode,
  Eq,
  Ord,
  PartialEq,
  PartialOrd,
  TypeInfo,
  MaxEncodedLen,
)]
pub enum TestAsset {
  #[default]
  Native,
  Local(u32),
}

construct_runtime!(
  pub enum Test {
    System: polkadot_sdk::frame_system,
    Balances: polkadot_sdk::pallet_balances,
    Connectors: pallet_connectors,
    SmartAccount: pallet_smart_account,
  }
);

impl polkadot_sdk::frame_system::Config for Test {
  type BaseCallFilter = polkadot_sdk::frame_support::traits::Everything;
  type BlockWeights = ();
  type BlockLength = ();
  type DbWeight = ();
  type RuntimeOrigin = RuntimeOrigin;
  type RuntimeCall = RuntimeCall;
  type Nonce = u64;
  type Hash = polkadot_sdk::sp_core::H256;
  type Hashing = BlakeTwo256;
  type AccountId = AccountId;
  type Lookup = IdentityLookup<Self::AccountId>;
  type Block = Block;
  type RuntimeEvent = RuntimeEvent;
  type BlockHashCount = polkadot_sdk::frame_support::traits::ConstU64<250>;
  type Version = ();
  type PalletInfo = PalletInfo;
  type AccountData = polkadot_sdk::pallet_balances::AccountData<Balance>;
  type OnNewAccount = ();
  type OnKilledAccount = ();
  type SystemWeightInfo = ();
  type SS58Prefix = ();
  type OnSetCode = ();
  type MaxConsumers = ConstU32<16>;
  type RuntimeTask = ();
  type ExtensionsWeightInfo = ();
  type SingleBlockMigrations = ();
  type MultiBlockMigrator = ();
  type PreInherents = ();
  type PostInherents = ();
  type PostTransactions = ();
}

impl polkadot_sdk::pallet_balances::Config for Test {
  type MaxLocks = ConstU32<50>;
  type MaxReserves = ();
  type ReserveIdentifier = [u8; 8];
  type Balance = Balance;
  type RuntimeEvent = RuntimeEvent;
  type DustRemoval = ();
  type ExistentialDeposit = ConstU128<1>;
  type AccountStore = System;
  type WeightInfo = ();
  type FreezeIdentifier = ();
  type MaxFreezes = ();
  type RuntimeHoldReason = RuntimeHoldReason;
  type RuntimeFreezeReason = RuntimeFreezeReason;
  type DoneSlashHandler = ();
}

#[cfg(feature = "runtime-benchmarks")]
pub struct MockRegistryBenchmarkHelper;

#[cfg(feature = "runtime-benchmarks")]
impl pallet_connectors::BenchmarkHelper for MockRegistryBenchmarkHelper {
  fn connector_handle() -> ConnectorHandle {
    PROBE_HANDLE
  }
}

impl pallet_connectors::Config for Test {
  type GovernanceOrigin = EnsureRoot<AccountId>;
  type ConnectorSet = pallet_smart_account::ServedHandles<Test>;
  type WeightInfo = ();
  #[cfg(feature = "runtime-benchmarks")]
  type BenchmarkHelper = MockRegistryBenchmarkHelper;
}

// Non-native balances, pools and LP shares live in unhashed storage so that a
// reverted cast rolls them back like any other storage write.

fn asset_key(who: AccountId, asset: TestAsset) -> vec::Vec<u8> {
  (b"mock:asset", who, asset).encode()
}

fn pool_key(asset_a: TestAsset, asset_b: TestAsset) -> (TestAsset, TestAsset) {
  if asset_a <= asset_b {
    (asset_a, asset_b)
  } else {
    (asset_b, asset_a)
  }
}

fn reserves_key(pool: (TestAsset, TestAsset)) -> vec::Vec<u8> {
  (b"mock:reserves", pool).encode()
}

fn total_lp_key(pool: (TestAsset, TestAsset)) -> vec::Vec<u8> {
  (b"mock:total-lp", pool).encode()
}

fn lp_key(who: AccountId, pool: (TestAsset, TestAsset)) -> vec::Vec<u8> {
  (b"mock:lp", who, pool).encode()
}

pub fn set_asset_balance(who: AccountId, asset: TestAsset, amount: Balance) {
  match asset {
    TestAsset::Native => {
      use polkadot_sdk::frame_support::traits::Currency;
      <Balances as Currency<AccountId>>::make_free_balance_be(&who, amount);
    }
    _ => unhashed::put(&asset_key(who, asset), &amount),
  }
}

pub fn asset_balance(who: AccountId, asset: TestAsset) -> Balance {
  MockAssetOps::balance(&who, asset)
}

pub fn lp_balance(who: AccountId, asset_a: TestAsset, asset_b: TestAsset) -> Balance {
  unhashed::get_or_default(&lp_key(who, pool_key(asset_a, asset_b)))
}

/// Reserves ordered as `(asset_a, asset_b)`.
pub fn pool_reserves(asset_a: TestAsset, asset_b: TestAsset) -> Option<(Balance, Balance)> {
  MockDex::get_pool_reserves(asset_a, asset_b)
}

/// Open a pool owned by `POOL` itself.
pub fn seed_pool(asset_a: TestAsset, asset_b: TestAsset, reserve_a: Balance, reserve_b: Balance) {
  set_asset_balance(POOL, asset_a, reserve_a);
  set_asset_balance(POOL, asset_b, reserve_b);
  write_reserves(asset_a, asset_b, reserve_a, reserve_b);
  let pool = pool_key(asset_a, asset_b);
  let lp = integer_sqrt(reserve_a.saturating_mul(reserve_b));
  unhashed::put(&total_lp_key(pool), &lp);
  unhashed::put(&lp_key(POOL, pool), &lp);
}

fn write_reserves(asset_a: TestAsset, asset_b: TestAsset, reserve_a: Balance, reserve_b: Balance) {
  let value = if asset_a <= asset_b {
    (reserve_a, reserve_b)
  } else {
    (reserve_b, reserve_a)
  };
  unhashed::put(&reserves_key(pool_key(asset_a, asset_b)), &value);
}

fn funds_unavailable() -> DispatchError {
  DispatchError::Token(TokenError::FundsUnavailable)
}

pub struct MockAssetOps;

impl AssetOps<AccountId, TestAsset, Balance> for MockAssetOps {
  fn transfer(
    from: &AccountId,
    to: &AccountId,
    asset: TestAsset,
    amount: Balance,
  ) -> Result<(), DispatchError> {
    match asset {
      TestAsset::Native => {
        use polkadot_sdk::frame_support::traits::Currency;
        <Balances as Currency<AccountId>>::transfer(
          from,
          to,
          amount,
          polkadot_sdk::frame_support::traits::ExistenceRequirement::AllowDeath,
        )
      }
      _ => {
        let src = Self::balance(from, asset);
        if src < amount {
          return Err(funds_unavailable());
        }
        set_asset_balance(*from, asset, src - amount);
        let dst = Self::balance(to, asset);
        set_asset_balance(*to, asset, dst + amount);
        Ok(())
      }
    }
  }

  fn balance(who: &AccountId, asset: TestAsset) -> Balance {
    match asset {
      TestAsset::Native => {
        use polkadot_sdk::frame_support::traits::Currency;
        <Balances as Currency<AccountId>>::free_balance(who)
      }
      _ => unhashed::get_or_default(&asset_key(*who, asset)),
    }
  }
}

/// Constant-product venue without fees.
pub struct MockDex;

impl DexOps<AccountId, TestAsset, Balance> for MockDex {
  fn swap_exact_in(
    who: &AccountId,
    asset_in: TestAsset,
    asset_out: TestAsset,
    amount_in: Balance,
    min_out: Balance,
  ) -> Result<Balance, DispatchError> {
    let (ri, ro) = Self::get_reserves(asset_in, asset_out)?;
    let amount_out = amount_in.saturating_mul(ro) / (ri.saturating_add(amount_in));
    if amount_out < min_out {
      return Err(DispatchError::Other("SlippageExceeded"));
    }
    MockAssetOps::transfer(who, &POOL, asset_in, amount_in)?;
    MockAssetOps::transfer(&POOL, who, asset_out, amount_out)?;
    write_reserves(asset_in, asset_out, ri + amount_in, ro - amount_out);
    Ok(amount_out)
  }

  fn swap_exact_out(
    who: &AccountId,
    asset_in: TestAsset,
    asset_out: TestAsset,
    amount_out: Balance,
    max_in: Balance,
  ) -> Result<Balance, DispatchError> {
    let (ri, ro) = Self::get_reserves(asset_in, asset_out)?;
    if amount_out >= ro {
      return Err(DispatchError::Other("InsufficientLiquidity"));
    }
    let amount_in = ri
      .saturating_mul(amount_out)
      .checked_div(ro.saturating_sub(amount_out))
      .unwrap_or(Balance::MAX)
      .saturating_add(1);
    if amount_in > max_in {
      return Err(DispatchError::Other("SlippageExceeded"));
    }
    MockAssetOps::transfer(who, &POOL, asset_in, amount_in)?;
    MockAssetOps::transfer(&POOL, who, asset_out, amount_out)?;
    write_reserves(asset_in, asset_out, ri + amount_in, ro - amount_out);
    Ok(amount_in)
  }

  fn add_liquidity(
    who: &AccountId,
    asset_a: TestAsset,
    asset_b: TestAsset,
    amount_a: Balance,
    amount_b: Balance,
  ) -> Result<(Balance, Balance, Balance), DispatchError> {
    let pool = pool_key(asset_a, asset_b);
    let (ra, rb) = Self::get_pool_reserves(asset_a, asset_b).unwrap_or((0, 0));
    let total: Balance = unhashed::get_or_default(&total_lp_key(pool));
    let lp_minted = if total == 0 {
      integer_sqrt(amount_a.saturating_mul(amount_b))
    } else {
      (amount_a.saturating_mul(total) / ra).min(amount_b.saturating_mul(total) / rb)
    };
    if lp_minted == 0 {
      return Err(DispatchError::Other("InsufficientLiquidityMinted"));
    }
    MockAssetOps::transfer(who, &POOL, asset_a, amount_a)?;
    MockAssetOps::transfer(who, &POOL, asset_b, amount_b)?;
    write_reserves(asset_a, asset_b, ra + amount_a, rb + amount_b);
    unhashed::put(&total_lp_key(pool), &(total + lp_minted));
    unhashed::put(&lp_key(*who, pool), &(lp_balance(*who, asset_a, asset_b) + lp_minted));
    Ok((amount_a, amount_b, lp_minted))
  }

  fn remove_liquidity(
    who: &AccountId,
    asset_a: TestAsset,
    asset_b: TestAsset,
    lp_amount: Balance,
  ) -> Result<(Balance, Balance), DispatchError> {
    let pool = pool_key(asset_a, asset_b);
    let held = lp_balance(*who, asset_a, asset_b);
    if lp_amount == 0 || lp_amount > held {
      return Err(funds_unavailable());
    }
    let (ra, rb) = Self::get_reserves(asset_a, asset_b)?;
    let total: Balance = unhashed::get_or_default(&total_lp_key(pool));
    let out_a = lp_amount.saturating_mul(ra) / total;
    let out_b = lp_amount.saturating_mul(rb) / total;
    MockAssetOps::transfer(&POOL, who, asset_a, out_a)?;
    MockAssetOps::transfer(&POOL, who, asset_b, out_b)?;
    write_reserves(asset_a, asset_b, ra - out_a, rb - out_b);
    unhashed::put(&total_lp_key(pool), &(total - lp_amount));
    unhashed::put(&lp_key(*who, pool), &(held - lp_amount));
    Ok((out_a, out_b))
  }

  fn get_pool_reserves(asset_a: TestAsset, asset_b: TestAsset) -> Option<(Balance, Balance)> {
    let (r_lo, r_hi): (Balance, Balance) =
      unhashed::get(&reserves_key(pool_key(asset_a, asset_b)))?;
    if asset_a <= asset_b {
      Some((r_lo, r_hi))
    } else {
      Some((r_hi, r_lo))
    }
  }
}

impl MockDex {
  fn get_reserves(
    asset_in: TestAsset,
    asset_out: TestAsset,
  ) -> Result<(Balance, Balance), DispatchError> {
    Self::get_pool_reserves(asset_in, asset_out).ok_or(DispatchError::Other("NoPool"))
  }
}

fn integer_sqrt(n: u128) -> u128 {
  if n == 0 {
    return 0;
  }
  let mut x = n;
  let mut y = x.div_ceil(2);
  while y < x {
    x = y;
    y = (x + n / x) / 2;
  }
  x
}

pub struct QuickswapHandle;
impl Get<ConnectorHandle> for QuickswapHandle {
  fn get() -> ConnectorHandle {
    QUICKSWAP_HANDLE
  }
}

pub type Quickswap = DexConnector<MockDex, QuickswapHandle>;

thread_local! {
  static PROBE_CALLS: RefCell<u32> = const { RefCell::new(0) };
}

/// Invocations of the probe connector, reverted casts included.
pub fn probe_calls() -> u32 {
  PROBE_CALLS.with(|c| *c.borrow())
}

/// Test connector.
///
/// - `deposit`: moves the resolved `amount_a` of `asset_a` to `SINK` and
///   settles that amount.
/// - `withdraw`: always fails in the venue.
/// - `buy`: casts again on the same account from inside the running cast.
/// - `sell`: not offered.
pub struct ProbeConnector;

impl ProbeConnector {
  fn record() {
    PROBE_CALLS.with(|c| *c.borrow_mut() += 1);
  }
}

impl Connector<AccountId, TestAsset, Balance> for ProbeConnector {
  fn handle() -> ConnectorHandle {
    PROBE_HANDLE
  }

  fn deposit(
    who: &AccountId,
    args: &DepositArgs<TestAsset, Balance>,
    ids: &IdStore<Balance>,
  ) -> ConnectorResult<Balance> {
    Self::record();
    let amount = ids.amount_or(args.get_id, args.amount_a)?;
    MockAssetOps::transfer(who, &SINK, args.asset_a, amount)?;
    Ok(Settlement::single(amount))
  }

  fn withdraw(
    _who: &AccountId,
    _args: &WithdrawArgs<TestAsset, Balance>,
    _ids: &IdStore<Balance>,
  ) -> ConnectorResult<Balance> {
    Self::record();
    Err(ConnectorError::Venue(DispatchError::Other("ProbeFailure")))
  }

  fn buy(
    who: &AccountId,
    args: &BuyArgs<TestAsset, Balance>,
    _ids: &IdStore<Balance>,
  ) -> ConnectorResult<Balance> {
    Self::record();
    let not_found = ConnectorError::Venue(DispatchError::CannotLookup);
    let account = SmartAccount::sovereign_index(who).ok_or(not_found.clone())?;
    let owner = SmartAccount::accounts(account)
      .map(|info| info.owner)
      .ok_or(not_found)?;
    let nested = probe_deposit(args.buy_asset, args.buy_amount, 0, 0);
    SmartAccount::do_cast(account, &owner, &[nested], owner)
      .map_err(|failure| ConnectorError::Venue(failure.into_dispatch_error::<Test>()))?;
    Ok(Settlement::single(args.buy_amount))
  }
}

/// Settles one output for every method, so `withdraw` leaves its second set id
/// without a value.
pub struct ShortConnector;

impl Connector<AccountId, TestAsset, Balance> for ShortConnector {
  fn handle() -> ConnectorHandle {
    SHORT_HANDLE
  }

  fn withdraw(
    _who: &AccountId,
    args: &WithdrawArgs<TestAsset, Balance>,
    ids: &IdStore<Balance>,
  ) -> ConnectorResult<Balance> {
    let amount = ids.amount_or(args.get_id, args.lp_amount)?;
    Ok(Settlement::single(amount))
  }
}

pub type TestConnectorSet = (Quickswap, ProbeConnector, ShortConnector);

pub struct SmartAccountPalletId;
impl Get<PalletId> for SmartAccountPalletId {
  fn get() -> PalletId {
    PalletId(*SMART_ACCOUNT_PALLET_ID)
  }
}

#[cfg(feature = "runtime-benchmarks")]
pub struct MockBenchmarkHelper;

#[cfg(feature = "runtime-benchmarks")]
impl crate::BenchmarkHelper<AccountId, TestAsset, Balance> for MockBenchmarkHelper {
  fn funded_asset(who: &AccountId) -> (TestAsset, Balance) {
    set_asset_balance(*who, USDC, 1_000_000);
    (USDC, 1_000)
  }

  fn repeatable_spell(
    sovereign: &AccountId,
    repeat: u32,
  ) -> (vec::Vec<u8>, vec::Vec<u8>, vec::Vec<u8>) {
    set_asset_balance(*sovereign, USDC, 100 * Balance::from(repeat));
    let args = DepositArgs {
      asset_a: USDC,
      asset_b: DAI,
      amount_a: 100u128,
      max_amount_b: 0,
      get_id: 0,
      set_id: 0,
    };
    (PROBE.to_vec(), b"deposit".to_vec(), args.encode())
  }
}

impl pallet_smart_account::Config for Test {
  type AssetId = TestAsset;
  type Balance = Balance;
  type AssetOps = MockAssetOps;
  type Connectors = Connectors;
  type ConnectorSet = TestConnectorSet;
  type PalletId = SmartAccountPalletId;
  type MaxSpells = ConstU32<{ params::MAX_SPELLS }>;
  type MaxArgsLen = ConstU32<{ params::MAX_SPELL_ARGS_LEN }>;
  type MaxAuthorities = ConstU32<{ params::MAX_AUTHORITIES }>;
  type MaxAccountsPerOwner = ConstU32<{ params::MAX_ACCOUNTS_PER_OWNER }>;
  type WeightInfo = ();
  #[cfg(feature = "runtime-benchmarks")]
  type BenchmarkHelper = MockBenchmarkHelper;
}

pub fn spell(connector: &[u8], method: &[u8], args: vec::Vec<u8>) -> crate::SpellOf<Test> {
  crate::Spell {
    connector: connector.to_vec().try_into().unwrap(),
    method: method.to_vec().try_into().unwrap(),
    args: args.try_into().unwrap(),
  }
}

pub fn probe_deposit(
  asset: TestAsset,
  amount: Balance,
  get_id: u32,
  set_id: u32,
) -> crate::SpellOf<Test> {
  let args = DepositArgs {
    asset_a: asset,
    asset_b: asset,
    amount_a: amount,
    max_amount_b: 0,
    get_id,
    set_id,
  };
  spell(PROBE, b"deposit", args.encode())
}

pub const TEST_INITIAL_BALANCE: Balance = 10_000_000_000_000;

pub fn new_test_ext() -> polkadot_sdk::sp_io::TestExternalities {
  let mut t = polkadot_sdk::frame_system::GenesisConfig::<Test>::default()
    .build_storage()
    .unwrap();

  polkadot_sdk::pallet_balances::GenesisConfig::<Test> {
    balances: vec![
      (ALICE, TEST_INITIAL_BALANCE),
      (BOB, TEST_INITIAL_BALANCE),
      (CHARLIE, TEST_INITIAL_BALANCE),
    ],
    dev_accounts: None,
  }
  .assimilate_storage(&mut t)
  .unwrap();

  pallet_connectors::GenesisConfig::<Test> {
    connectors: vec![
      (QUICKSWAP.to_vec(), QUICKSWAP_HANDLE),
      (PROBE.to_vec(), PROBE_HANDLE),
      (SHORT.to_vec(), SHORT_HANDLE),
    ],
    _marker: Default::default(),
  }
  .assimilate_storage(&mut t)
  .unwrap();

  let mut ext = polkadot_sdk::sp_io::TestExternalities::new(t);
  ext.execute_with(|| {
    PROBE_CALLS.with(|c| *c.borrow_mut() = 0);
    System::set_block_number(1);
  });
  ext
}
