/// Minimum-return and authorization planning
use crate::config::{NetworkConfig, SwapConfig};
use crate::errors::{SwapError, SwapResult};
use crate::units::{BaseUnitAmount, DecimalAmount};
use num_bigint::BigUint;

use super::types::{EffectiveRate, Quote};

const BPS_DENOMINATOR: u32 = 10_000;

#[derive(Debug, Clone)]
pub struct SwapPlanner {
    slippage_bps: u16,
    native_token_address: String,
}

impl SwapPlanner {
    pub fn new(slippage_bps: u16, native_token_address: &str) -> SwapResult<Self> {
        if u32::from(slippage_bps) > BPS_DENOMINATOR {
            return Err(SwapError::configuration_error(format!(
                "slippage of {} bps exceeds 10000",
                slippage_bps
            )));
        }
        Ok(Self {
            slippage_bps,
            native_token_address: native_token_address.trim().to_string(),
        })
    }

    pub fn from_config(swap: &SwapConfig, network: &NetworkConfig) -> SwapResult<Self> {
        Self::new(swap.slippage_bps, &network.native_token_address)
    }

    pub fn slippage_bps(&self) -> u16 {
        self.slippage_bps
    }

    /// `amount * rate * (1 - slippage)`; `None` until both inputs exist
    pub fn plan_minimum_return(
        &self,
        source_amount: Option<&DecimalAmount>,
        rate: Option<&EffectiveRate>,
    ) -> Option<DecimalAmount> {
        let (amount, rate) = (source_amount?, rate?);
        Some(amount.mul(rate.value()).apply_bps_discount(self.slippage_bps))
    }

    /// Destination base units handed to the build endpoint, rounded down
    pub fn minimum_destination_units(&self, quote: &Quote) -> BaseUnitAmount {
        let keep = BigUint::from(BPS_DENOMINATOR - u32::from(self.slippage_bps));
        let scaled = quote.destination_amount.as_biguint() * keep;
        BaseUnitAmount::new(scaled / BigUint::from(BPS_DENOMINATOR))
    }

    /// Everything except the native asset needs a spender allowance
    pub fn needs_authorization(&self, token_address: &str) -> bool {
        !self
            .native_token_address
            .eq_ignore_ascii_case(token_address.trim())
    }
}
