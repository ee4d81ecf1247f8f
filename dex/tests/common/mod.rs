//! Shared setup for the end-to-end tests: an in-memory ledger pair, funded
//! accounts, and a pool factory.

#![allow(dead_code)]

use amm_dex::dto::{AddLiquidityDto, CreatePoolDto};
use amm_dex::ledger::{InMemoryLedger, InMemoryTokenLedger};
use amm_dex::operations::create_pool::create_pool;
use amm_dex::operations::liquidity::{add_liquidity, LiquidityResult};
use amm_dex::pool::TokenKey;
use amm_math::UDecimal;

pub const ALICE: &str = "client|alice";
pub const BOB: &str = "client|bob";
pub const ADMIN: &str = "client|admin";

pub fn u(s: &str) -> UDecimal {
    UDecimal::new(s).unwrap()
}

pub fn s(v: &str) -> amm_math::SDecimal {
    amm_math::SDecimal::new(v).unwrap()
}

pub fn gala() -> TokenKey {
    TokenKey("GALA".into())
}

pub fn usdc() -> TokenKey {
    TokenKey("USDC".into())
}

pub fn eth() -> TokenKey {
    TokenKey("ETH".into())
}

pub struct Harness {
    pub ledger: InMemoryLedger,
    pub tokens: InMemoryTokenLedger,
}

impl Harness {
    /// Fresh ledgers with generous balances for the test actors.
    pub fn new() -> Self {
        let mut tokens = InMemoryTokenLedger::new();
        for owner in [ALICE, BOB, ADMIN, "client|user123"] {
            for token in [gala(), usdc(), eth()] {
                tokens.mint(owner, &token, &u("1000000"));
            }
        }
        Harness {
            ledger: InMemoryLedger::new(),
            tokens,
        }
    }

    /// Creates a pool at sqrt price 1 for the given pair and fee tier.
    pub fn create_pool_at_one(&mut self, token0: TokenKey, token1: TokenKey, fee: u32) {
        let dto = CreatePoolDto {
            token0,
            token1,
            fee,
            initial_sqrt_price: u("1"),
            is_private: false,
            whitelist: vec![],
            unique_key: format!("create-{fee}"),
        };
        create_pool(&mut self.ledger, ALICE, &dto).unwrap();
    }

    /// Mints liquidity for `owner` with zero minimums.
    pub fn mint(
        &mut self,
        owner: &str,
        token0: TokenKey,
        token1: TokenKey,
        fee: u32,
        tick_lower: i32,
        tick_upper: i32,
        amount0_desired: &str,
        amount1_desired: &str,
        unique_key: &str,
    ) -> LiquidityResult {
        let dto = AddLiquidityDto {
            token0,
            token1,
            fee,
            tick_lower,
            tick_upper,
            amount0_desired: u(amount0_desired),
            amount1_desired: u(amount1_desired),
            amount0_min: UDecimal::zero(),
            amount1_min: UDecimal::zero(),
            position_id: None,
            unique_key: unique_key.into(),
        };
        add_liquidity(&mut self.ledger, &mut self.tokens, owner, &dto).unwrap()
    }
}
