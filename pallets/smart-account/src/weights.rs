#![cfg_attr(rustfmt, rustfmt_skip)]
#![allow(unused_parens)]
#![allow(unused_imports)]
#![allow(missing_docs)]

use core::marker::PhantomData;
use polkadot_sdk::frame_support::{
  traits::Get,
  weights::{constants::RocksDbWeight, Weight},
};

pub trait WeightInfo {
  fn build() -> Weight;
  fn fund() -> Weight;
  fn cast(s: u32) -> Weight;
  fn add_authority() -> Weight;
  fn remove_authority() -> Weight;
}

pub struct SubstrateWeight<T>(PhantomData<T>);
impl<T: polkadot_sdk::frame_system::Config + crate::Config> WeightInfo for SubstrateWeight<T> {
  fn build() -> Weight {
    Weight::from_parts(25_000_000, 2000)
      .saturating_add(T::DbWeight::get().reads(3))
      .saturating_add(T::DbWeight::get().writes(4))
  }

  fn fund() -> Weight {
    Weight::from_parts(20_000_000, 1800)
      .saturating_add(T::DbWeight::get().reads(2))
      .saturating_add(T::DbWeight::get().writes(2))
  }

  // Per spell: registry read plus a constant-product venue call
  fn cast(s: u32) -> Weight {
    let spells = u64::from(s.min(T::MaxSpells::get()));
    Weight::from_parts(
      20_000_000u64.saturating_add(spells.saturating_mul(70_000_000)),
      2000u64.saturating_add(spells.saturating_mul(2600)),
    )
    .saturating_add(T::DbWeight::get().reads_writes(2, 2))
    .saturating_add(T::DbWeight::get().reads_writes(
      spells.saturating_mul(11),
      spells.saturating_mul(10),
    ))
  }

  fn add_authority() -> Weight {
    Weight::from_parts(14_000_000, 1200)
      .saturating_add(T::DbWeight::get().reads(1))
      .saturating_add(T::DbWeight::get().writes(1))
  }

  fn remove_authority() -> Weight {
    Weight::from_parts(14_000_000, 1200)
      .saturating_add(T::DbWeight::get().reads(1))
      .saturating_add(T::DbWeight::get().writes(1))
  }
}

impl WeightInfo for () {
  fn build() -> Weight {
    Weight::from_parts(25_000_000, 2000)
      .saturating_add(RocksDbWeight::get().reads_writes(3, 4))
  }
  fn fund() -> Weight {
    Weight::from_parts(20_000_000, 1800)
      .saturating_add(RocksDbWeight::get().reads_writes(2, 2))
  }
  fn cast(s: u32) -> Weight {
    let spells = u64::from(s);
    Weight::from_parts(20_000_000u64.saturating_add(spells.saturating_mul(70_000_000)), 2000)
      .saturating_add(RocksDbWeight::get().reads_writes(
        2u64.saturating_add(spells.saturating_mul(11)),
        2u64.saturating_add(spells.saturating_mul(10)),
      ))
  }
  fn add_authority() -> Weight {
    Weight::from_parts(14_000_000, 1200)
      .saturating_add(RocksDbWeight::get().reads_writes(1, 1))
  }
  fn remove_authority() -> Weight {
    Weight::from_parts(14_000_000, 1200)
      .saturating_add(RocksDbWeight::get().reads_writes(1, 1))
  }
}
