//! Leveraged entry sizing: borrow amount, swap input and min-out bounds.

use crate::domain::{
    ArithmeticError, Asset, BaseUnits, Decimal, LeverageParameters, BPS_DENOMINATOR, MAX_SCALE,
};
use crate::oracle::{OracleError, PriceSnapshot};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SizingError {
    #[error("principal amount must be greater than zero")]
    ZeroPrincipal,
    #[error("position snapshot reports negative collateral or debt")]
    NegativeWithdrawal,
    #[error("{name} of {bps} bps is out of range")]
    RatioOutOfRange { name: &'static str, bps: u32 },
    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),
    #[error(transparent)]
    Oracle(#[from] OracleError),
}

/// Reject ratios that must stay strictly below 100%.
pub(crate) fn fraction_below_one(name: &'static str, bps: u32) -> Result<Decimal, SizingError> {
    if bps >= BPS_DENOMINATOR {
        return Err(SizingError::RatioOutOfRange { name, bps });
    }
    Ok(Decimal::from_bps(bps))
}

/// Reject ratios above 100%.
pub(crate) fn fraction_at_most_one(name: &'static str, bps: u32) -> Result<Decimal, SizingError> {
    if bps > BPS_DENOMINATOR {
        return Err(SizingError::RatioOutOfRange { name, bps });
    }
    Ok(Decimal::from_bps(bps))
}

/// Sizes leveraged entries against one price snapshot.
#[derive(Debug, Clone, Copy)]
pub struct PositionSizer<'a> {
    prices: &'a PriceSnapshot,
}

impl<'a> PositionSizer<'a> {
    pub fn new(prices: &'a PriceSnapshot) -> Self {
        Self { prices }
    }

    /// Debt the pool can extend against `principal × (1 + leverage)` of
    /// collateral at the configured LTV, in borrow-asset base units.
    pub fn calc_total_borrow_amount(
        &self,
        params: &LeverageParameters,
    ) -> Result<BaseUnits, SizingError> {
        if params.principal_amount.is_zero() {
            return Err(SizingError::ZeroPrincipal);
        }
        let ltv = fraction_at_most_one("loan-to-value", params.loan_to_value_bps)?;
        let collateral_price = self.prices.price_of(&params.collateral_asset)?;
        let borrow_price = self.prices.price_of(&params.borrow_asset)?;

        let principal = Decimal::from_base_units(
            params.principal_amount,
            params.collateral_asset.decimals,
        )?;
        let gross_bps = params
            .leverage_bps
            .checked_add(BPS_DENOMINATOR)
            .ok_or(ArithmeticError::Overflow)?;
        let exposure = principal.mul_floor(Decimal::from_bps(gross_bps))?;
        let borrowable_eth = exposure
            .mul_floor(collateral_price.eth())?
            .mul_floor(ltv)?;

        let decimals = params.borrow_asset.decimals;
        let amount = borrowable_eth.div_floor(borrow_price.eth(), u32::from(decimals))?;
        Ok(amount.to_base_units(decimals)?)
    }

    /// Borrow-asset amount to swap so that, after the flashloan fee and swap
    /// loss encoded in `flashloan_fee_bps`, the swap still buys
    /// `principal × leverage` of collateral.
    pub fn calc_swap_in_amount(
        &self,
        principal: BaseUnits,
        leverage_bps: u32,
        collateral_asset: &Asset,
        borrow_asset: &Asset,
        flashloan_fee_bps: u32,
    ) -> Result<BaseUnits, SizingError> {
        if principal.is_zero() {
            return Err(SizingError::ZeroPrincipal);
        }
        let fee = fraction_below_one("flashloan fee", flashloan_fee_bps)?;
        let collateral_price = self.prices.price_of(collateral_asset)?;
        let borrow_price = self.prices.price_of(borrow_asset)?;

        let principal = Decimal::from_base_units(principal, collateral_asset.decimals)?;
        let levered_eth = principal
            .mul_floor(Decimal::from_bps(leverage_bps))?
            .mul_floor(collateral_price.eth())?;
        let net_of_fee = Decimal::one().checked_sub(fee)?;

        // Dividing twice keeps each step a floor; a rounded product divisor would not.
        let decimals = borrow_asset.decimals;
        let amount = levered_eth
            .div_floor(borrow_price.eth(), MAX_SCALE)?
            .div_floor(net_of_fee, u32::from(decimals))?;
        Ok(amount.to_base_units(decimals)?)
    }

    /// Oracle-implied output of swapping `in_amount` of `from` into `to`,
    /// in human units of `to`, unrounded.
    pub fn expected_amount_out(
        &self,
        in_amount: BaseUnits,
        from: &Asset,
        to: &Asset,
    ) -> Result<Decimal, SizingError> {
        let from_price = self.prices.price_of(from)?;
        let to_price = self.prices.price_of(to)?;
        let amount = Decimal::from_base_units(in_amount, from.decimals)?;
        Ok(amount
            .checked_mul(from_price.eth())?
            .checked_div(to_price.eth())?)
    }

    /// Floor for the router: oracle-implied output less `slippage_bps`,
    /// rounded down.
    pub fn calc_min_amount_out(
        &self,
        in_amount: BaseUnits,
        from: &Asset,
        to: &Asset,
        slippage_bps: u32,
    ) -> Result<BaseUnits, SizingError> {
        let keep = Decimal::one().checked_sub(fraction_below_one("slippage", slippage_bps)?)?;
        let from_price = self.prices.price_of(from)?;
        let to_price = self.prices.price_of(to)?;

        let amount = Decimal::from_base_units(in_amount, from.decimals)?;
        let discounted_eth = amount.mul_floor(from_price.eth())?.mul_floor(keep)?;
        let min_out = discounted_eth.div_floor(to_price.eth(), u32::from(to.decimals))?;
        Ok(min_out.to_base_units(to.decimals)?)
    }

    /// Same floor, starting from an output simulated by an external quoter.
    pub fn calc_min_amount_out_from_quote(
        quoted_out: BaseUnits,
        to: &Asset,
        slippage_bps: u32,
    ) -> Result<BaseUnits, SizingError> {
        let keep = Decimal::one().checked_sub(fraction_below_one("slippage", slippage_bps)?)?;
        let quoted = Decimal::from_base_units(quoted_out, to.decimals)?;
        Ok(quoted.mul_floor(keep)?.to_base_units(to.decimals)?)
    }
}
