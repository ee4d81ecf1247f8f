//! The `Swap` operation: engine run plus slippage enforcement, writeback and
//! settlement.

use amm_math::SDecimal;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::dto::SwapDto;
use crate::errors::{DexError, DexResult};
use crate::ledger::{Ledger, TokenLedger};
use crate::swap::{execute_swap, SwapOutcome, SwapParams, TickDataSource};
use crate::tick::TickData;

use super::{deposit_amount, load_pool, load_tick, payout_amount, save_pool, save_tick};

/// Read-through tick source over the ledger.
struct LedgerTicks<'a> {
    ledger: &'a dyn Ledger,
}

impl TickDataSource for LedgerTicks<'_> {
    fn tick_data(&mut self, pool_hash: &str, tick: i32) -> DexResult<Option<TickData>> {
        load_tick(self.ledger, pool_hash, tick)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapResult {
    /// Signed flows from the trader's perspective: positive amounts were paid
    /// into the pool, negative ones received from it.
    pub amount0: SDecimal,
    pub amount1: SDecimal,
    pub new_sqrt_price: amm_math::UDecimal,
}

fn enforce_slippage(dto: &SwapDto, outcome: &SwapOutcome) -> DexResult<()> {
    let (input, output) = if dto.zero_for_one {
        (&outcome.amount0, &outcome.amount1)
    } else {
        (&outcome.amount1, &outcome.amount0)
    };
    if let Some(max_in) = &dto.amount_in_maximum {
        if input.abs() > *max_in {
            return Err(DexError::Slippage(format!(
                "input {} exceeds amountInMaximum {max_in}",
                input.abs()
            )));
        }
    }
    if let Some(min_out) = &dto.amount_out_minimum {
        if output.abs() < *min_out {
            return Err(DexError::Slippage(format!(
                "output {} below amountOutMinimum {min_out}",
                output.abs()
            )));
        }
    }
    Ok(())
}

/// Executes a swap against live pool state and settles both transfer legs.
pub fn swap(
    ledger: &mut dyn Ledger,
    tokens: &mut dyn TokenLedger,
    caller: &str,
    dto: &SwapDto,
) -> DexResult<SwapResult> {
    dto.validate()?;
    let mut pool = load_pool(ledger, &dto.token0, &dto.token1, dto.fee)?;

    let params = SwapParams {
        zero_for_one: dto.zero_for_one,
        amount_specified: dto.amount.clone(),
        sqrt_price_limit: dto.sqrt_price_limit.clone(),
    };
    let outcome = {
        let mut ticks = LedgerTicks { ledger: &*ledger };
        execute_swap(&pool, &mut ticks, &params)?
    };
    enforce_slippage(dto, &outcome)?;

    // Terminal writeback: price, active liquidity, accumulators, and every
    // tick whose checkpoints flipped.
    pool.sqrt_price = outcome.sqrt_price.clone();
    pool.tick = outcome.tick;
    pool.liquidity = outcome.liquidity.clone();
    pool.fee_growth_global0 = outcome.fee_growth_global0.clone();
    pool.fee_growth_global1 = outcome.fee_growth_global1.clone();
    pool.protocol_fees_token0 = outcome.protocol_fees_token0.clone();
    pool.protocol_fees_token1 = outcome.protocol_fees_token1.clone();
    for tick in &outcome.crossed_ticks {
        save_tick(ledger, tick)?;
    }
    save_pool(ledger, &pool)?;

    // Settlement. The recipient of the output leg may differ from the payer.
    let pool_account = pool.pool_alias();
    let recipient = dto.recipient.as_deref().unwrap_or(caller);
    for (token, amount) in [(&pool.token0, &outcome.amount0), (&pool.token1, &outcome.amount1)] {
        if amount.is_negative() {
            let pay = payout_amount(&amount.abs());
            if !pay.is_zero() {
                tokens.transfer_token(&pool_account, recipient, token, &pay)?;
            }
        } else {
            let pay = deposit_amount(&amount.abs());
            if !pay.is_zero() {
                tokens.transfer_token(caller, &pool_account, token, &pay)?;
            }
        }
    }

    debug!(
        "swap by {caller}: amount0 {}, amount1 {}, price now {}",
        outcome.amount0, outcome.amount1, outcome.sqrt_price
    );
    Ok(SwapResult {
        amount0: outcome.amount0,
        amount1: outcome.amount1,
        new_sqrt_price: outcome.sqrt_price,
    })
}
