//! Position inputs and lending-pool readouts.

use super::decimal::{ArithmeticError, Decimal};
use super::primitives::{Asset, BaseUnits};
use serde::{Deserialize, Serialize};

/// 1e18, the fixed-point unit of a health factor.
const WAD_DECIMALS: u8 = 18;

/// Parameters of one leveraged entry. Built per request, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeverageParameters {
    /// Collateral the user brings, in collateral base units.
    pub principal_amount: BaseUnits,
    /// Extra exposure on top of the principal (36000 = 3.6x).
    pub leverage_bps: u32,
    pub loan_to_value_bps: u32,
    pub borrow_asset: Asset,
    pub collateral_asset: Asset,
}

/// `getUserAccountData` readout, ETH-denominated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionSnapshot {
    pub total_collateral_eth: Decimal,
    pub total_debt_eth: Decimal,
    /// Collateral-weighted average liquidation threshold.
    pub current_liquidation_threshold_bps: u32,
    pub health_factor_wad: Decimal,
}

impl PositionSnapshot {
    /// Health factor as a plain ratio; 1.0 is the solvency boundary.
    pub fn health_factor(&self) -> Result<Decimal, ArithmeticError> {
        let wad = Decimal::from_base_units(BaseUnits::new(1), WAD_DECIMALS)?;
        self.health_factor_wad.checked_mul(wad)
    }

    /// Health factor after removing `withdrawn_threshold_eth` of
    /// threshold-weighted collateral and repaying `repaid_eth` of debt.
    ///
    /// Returns `None` when no debt remains.
    pub fn projected_health_factor(
        &self,
        withdrawn_threshold_eth: Decimal,
        repaid_eth: Decimal,
    ) -> Result<Option<Decimal>, ArithmeticError> {
        let remaining_debt = self.total_debt_eth.checked_sub(repaid_eth)?;
        if !remaining_debt.is_positive() {
            return Ok(None);
        }
        let threshold = Decimal::from_bps(self.current_liquidation_threshold_bps);
        let weighted = self
            .total_collateral_eth
            .checked_mul(threshold)?
            .checked_sub(withdrawn_threshold_eth)?;
        weighted.checked_div(remaining_debt).map(Some)
    }
}

/// `getReserveConfigurationData` subset used for sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReserveConfiguration {
    pub ltv_bps: u32,
    pub liquidation_threshold_bps: u32,
}

/// A deleveraging request against one collateral reserve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawalRequest {
    pub repay_amount: BaseUnits,
    pub collateral_amount_held: BaseUnits,
    pub collateral_asset: Asset,
    pub borrow_asset: Asset,
    pub asset_liquidation_threshold_bps: u32,
}
