//! Deleverage sizing: how much collateral can leave without breaching the
//! liquidation threshold.

use super::sizing::{fraction_at_most_one, SizingError};
use crate::domain::{
    BaseUnits, Decimal, PositionSnapshot, RoundingMode, WithdrawalRequest, MAX_SCALE,
};
use crate::oracle::PriceSnapshot;

/// ETH-space intermediates are floored at wei precision.
const ETH_SCALE: u32 = 18;

#[derive(Debug, Clone, Copy)]
pub struct WithdrawalSizer<'a> {
    prices: &'a PriceSnapshot,
}

impl<'a> WithdrawalSizer<'a> {
    pub fn new(prices: &'a PriceSnapshot) -> Self {
        Self { prices }
    }

    /// Largest collateral withdrawal that keeps the health factor at or
    /// above 1.0 once `request.repay_amount` has been repaid, capped at what
    /// the user holds.
    ///
    /// Rounds down twice: once in ETH space, once into collateral base
    /// units. A position already below its threshold yields zero.
    pub fn calc_withdrawal_amount(
        &self,
        snapshot: &PositionSnapshot,
        request: &WithdrawalRequest,
    ) -> Result<BaseUnits, SizingError> {
        if snapshot.total_collateral_eth.is_negative() || snapshot.total_debt_eth.is_negative() {
            return Err(SizingError::NegativeWithdrawal);
        }
        let current_threshold = fraction_at_most_one(
            "current liquidation threshold",
            snapshot.current_liquidation_threshold_bps,
        )?;
        let asset_threshold = fraction_at_most_one(
            "asset liquidation threshold",
            request.asset_liquidation_threshold_bps,
        )?;

        let free_eth = self.free_collateral_eth(snapshot, current_threshold, request)?;
        if !free_eth.is_positive() {
            return Ok(BaseUnits::zero());
        }

        let collateral_price = self.prices.price_of(&request.collateral_asset)?;
        let decimals = request.collateral_asset.decimals;
        let amount = free_eth
            .div_floor(collateral_price.eth(), MAX_SCALE)?
            .div_floor(asset_threshold, u32::from(decimals))?
            .to_base_units(decimals)?;

        Ok(amount.min(request.collateral_amount_held))
    }

    /// `collateral × threshold − debt + repaid`, floored at wei precision.
    fn free_collateral_eth(
        &self,
        snapshot: &PositionSnapshot,
        current_threshold: Decimal,
        request: &WithdrawalRequest,
    ) -> Result<Decimal, SizingError> {
        let repay_eth = if request.repay_amount.is_zero() {
            Decimal::zero()
        } else {
            let borrow_price = self.prices.price_of(&request.borrow_asset)?;
            Decimal::from_base_units(request.repay_amount, request.borrow_asset.decimals)?
                .mul_floor(borrow_price.eth())?
        };

        let free = snapshot
            .total_collateral_eth
            .mul_floor(current_threshold)?
            .checked_sub(snapshot.total_debt_eth)?
            .checked_add(repay_eth)?;
        Ok(free.to_fixed(ETH_SCALE, RoundingMode::Down)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Address, ArithmeticError, Asset, Price, Symbol};

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    fn asset(addr: &str, symbol: &str, decimals: u8) -> Asset {
        Asset::new(
            Address::new(addr.to_string()),
            Symbol::new(symbol.to_string()),
            decimals,
        )
    }

    fn units(human: &str, decimals: u8) -> BaseUnits {
        d(human).to_base_units(decimals).unwrap()
    }

    fn snapshot(collateral: &str, debt: &str) -> PositionSnapshot {
        PositionSnapshot {
            total_collateral_eth: d(collateral),
            total_debt_eth: d(debt),
            current_liquidation_threshold_bps: 8000,
            health_factor_wad: Decimal::zero(),
        }
    }

    fn request(repay: BaseUnits, held: BaseUnits, threshold_bps: u32) -> WithdrawalRequest {
        WithdrawalRequest {
            repay_amount: repay,
            collateral_amount_held: held,
            collateral_asset: asset("0x1", "LP", 18),
            borrow_asset: asset("0x2", "USDC", 6),
            asset_liquidation_threshold_bps: threshold_bps,
        }
    }

    fn prices(collateral: &str, borrow: &str) -> PriceSnapshot {
        PriceSnapshot::new()
            .with_price(&asset("0x1", "LP", 18), Price::from_eth(d(collateral)))
            .with_price(&asset("0x2", "USDC", 6), Price::from_eth(d(borrow)))
    }

    #[test]
    fn test_zero_repay_uses_existing_slack() {
        let prices = prices("2", "1");
        // 100 * 0.8 - 60 = 20 ETH free, / (2 * 0.8) = 12.5 LP
        let amount = WithdrawalSizer::new(&prices)
            .calc_withdrawal_amount(
                &snapshot("100", "60"),
                &request(BaseUnits::zero(), units("1000", 18), 8000),
            )
            .unwrap();
        assert_eq!(amount, units("12.5", 18));
    }

    #[test]
    fn test_position_at_threshold_yields_zero() {
        let prices = prices("1", "1");
        let amount = WithdrawalSizer::new(&prices)
            .calc_withdrawal_amount(
                &snapshot("100", "80"),
                &request(BaseUnits::zero(), units("100", 18), 8000),
            )
            .unwrap();
        assert_eq!(amount, BaseUnits::zero());
    }

    #[test]
    fn test_underwater_position_floors_to_zero() {
        let prices = prices("1", "1");
        // 80 - 95 + 5 = -10
        let amount = WithdrawalSizer::new(&prices)
            .calc_withdrawal_amount(
                &snapshot("100", "95"),
                &request(units("5", 6), units("100", 18), 8000),
            )
            .unwrap();
        assert_eq!(amount, BaseUnits::zero());
    }

    #[test]
    fn test_negative_snapshot_rejected() {
        let prices = prices("1", "1");
        let result = WithdrawalSizer::new(&prices).calc_withdrawal_amount(
            &snapshot("-1", "0"),
            &request(BaseUnits::zero(), units("1", 18), 8000),
        );
        assert_eq!(result, Err(SizingError::NegativeWithdrawal));
    }

    #[test]
    fn test_zero_asset_threshold_is_division_by_zero() {
        let prices = prices("1", "1");
        let result = WithdrawalSizer::new(&prices).calc_withdrawal_amount(
            &snapshot("100", "10"),
            &request(BaseUnits::zero(), units("1", 18), 0),
        );
        assert_eq!(
            result,
            Err(SizingError::Arithmetic(ArithmeticError::DivisionByZero))
        );
    }

    #[test]
    fn test_withdrawal_keeps_health_factor_at_one() {
        let prices = prices("1.3", "0.9");
        let snap = snapshot("100", "50");
        let req = request(units("7", 6), units("1000", 18), 7500);
        let amount = WithdrawalSizer::new(&prices)
            .calc_withdrawal_amount(&snap, &req)
            .unwrap();

        let withdrawn = Decimal::from_base_units(amount, 18).unwrap();
        let withdrawn_threshold_eth = withdrawn
            .checked_mul(d("1.3"))
            .unwrap()
            .checked_mul(d("0.75"))
            .unwrap();
        let hf = snap
            .projected_health_factor(withdrawn_threshold_eth, d("6.3"))
            .unwrap()
            .unwrap();
        assert!(hf >= Decimal::one());
    }
}
