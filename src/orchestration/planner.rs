use crate::datasource::{CollaboratorError, SwapQuoter};
use crate::domain::{
    Address, ArithmeticError, Asset, BaseUnits, Decimal, LeverageParameters, PositionSnapshot,
    RejectionReason, Symbol, WithdrawalRequest,
};
use crate::engine::{
    PositionSizer, RoutingError, SizingError, SwapBundle, SwapRoute, WithdrawalSizer,
};
use crate::market::{ContextError, MarketContext};
use crate::oracle::{OracleError, PriceSnapshot};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanningError {
    #[error("leverage of {requested} bps exceeds the maximum of {max} bps")]
    LeverageTooHigh { requested: u32, max: u32 },
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    Sizing(#[from] SizingError),
    #[error(transparent)]
    Routing(#[from] RoutingError),
    #[error(transparent)]
    Oracle(#[from] OracleError),
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),
}

impl PlanningError {
    /// Revert reason reported by the lending system, however deeply wrapped.
    pub fn rejection(&self) -> Option<&RejectionReason> {
        let collaborator = match self {
            PlanningError::Collaborator(e) => e,
            PlanningError::Oracle(OracleError::Collaborator(e)) => e,
            PlanningError::Sizing(SizingError::Oracle(OracleError::Collaborator(e))) => e,
            _ => return None,
        };
        match collaborator {
            CollaboratorError::Rejected(reason) => Some(reason),
            _ => None,
        }
    }
}

/// Tunables applied to every plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannerSettings {
    pub default_slippage_bps: u32,
    /// Flashloan fee plus extra swap loss reserved when sizing swap input.
    pub swap_in_buffer_bps: u32,
    pub swap_in_buffer_overrides: HashMap<Symbol, u32>,
    pub max_leverage_bps: u32,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            default_slippage_bps: 60,
            swap_in_buffer_bps: 60,
            swap_in_buffer_overrides: HashMap::new(),
            max_leverage_bps: 100_000,
        }
    }
}

impl PlannerSettings {
    pub fn swap_in_buffer_for(&self, collateral: &Asset) -> u32 {
        self.swap_in_buffer_overrides
            .get(&collateral.symbol)
            .copied()
            .unwrap_or(self.swap_in_buffer_bps)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenRequest {
    pub user: Address,
    pub collateral: String,
    pub borrow: String,
    pub principal: BaseUnits,
    pub leverage_bps: u32,
    pub slippage_bps: Option<u32>,
}

/// Everything needed to submit a leveraged entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenPlan {
    pub user: Address,
    pub collateral: Asset,
    pub borrow: Asset,
    pub principal: BaseUnits,
    pub leverage_bps: u32,
    pub loan_to_value_bps: u32,
    pub total_borrow_amount: BaseUnits,
    pub swap_in_amount: BaseUnits,
    pub swap_in_buffer_bps: u32,
    pub expected_amount_out: BaseUnits,
    pub min_amount_out: BaseUnits,
    pub slippage_bps: u32,
    pub quoted: bool,
    pub swap: SwapBundle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseRequest {
    pub user: Address,
    pub collateral: String,
    pub borrow: String,
    pub repay_amount: BaseUnits,
    pub collateral_held: BaseUnits,
    pub slippage_bps: Option<u32>,
}

/// Everything needed to submit a deleverage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosePlan {
    pub user: Address,
    pub collateral: Asset,
    pub borrow: Asset,
    pub repay_amount: BaseUnits,
    pub collateral_held: BaseUnits,
    pub withdraw_amount: BaseUnits,
    pub min_amount_out: BaseUnits,
    pub slippage_bps: u32,
    pub health_factor: Decimal,
    /// `None` once the position carries no debt.
    pub projected_health_factor: Option<Decimal>,
    /// `None` when nothing can be withdrawn.
    pub swap: Option<SwapBundle>,
}

/// Sequences collaborator reads and sizing for one user action.
#[derive(Debug, Clone)]
pub struct LeveragePlanner {
    context: Arc<MarketContext>,
    settings: PlannerSettings,
}

impl LeveragePlanner {
    pub fn new(context: Arc<MarketContext>, settings: PlannerSettings) -> Self {
        Self { context, settings }
    }

    pub fn context(&self) -> &MarketContext {
        &self.context
    }

    pub fn settings(&self) -> &PlannerSettings {
        &self.settings
    }

    pub async fn plan_open(&self, request: OpenRequest) -> Result<OpenPlan, PlanningError> {
        if request.leverage_bps > self.settings.max_leverage_bps {
            return Err(PlanningError::LeverageTooHigh {
                requested: request.leverage_bps,
                max: self.settings.max_leverage_bps,
            });
        }
        let collateral = self.context.asset(&request.collateral)?.clone();
        let borrow = self.context.asset(&request.borrow)?.clone();
        let route = self.context.route(&borrow, &collateral)?;
        let slippage_bps = request
            .slippage_bps
            .unwrap_or(self.settings.default_slippage_bps);
        let buffer_bps = self.settings.swap_in_buffer_for(&collateral);

        let pool = self.context.lending_pool();
        pool.check_leverage_access(&request.user, &collateral).await?;
        let reserve = pool.get_reserve_configuration_data(&collateral).await?;
        let prices = self
            .context
            .oracle_adapter()
            .snapshot(&[collateral.clone(), borrow.clone()])
            .await?;

        let sizer = PositionSizer::new(&prices);
        let params = LeverageParameters {
            principal_amount: request.principal,
            leverage_bps: request.leverage_bps,
            loan_to_value_bps: reserve.ltv_bps,
            borrow_asset: borrow.clone(),
            collateral_asset: collateral.clone(),
        };
        let total_borrow_amount = sizer.calc_total_borrow_amount(&params)?;
        let swap_in_amount = sizer.calc_swap_in_amount(
            request.principal,
            request.leverage_bps,
            &collateral,
            &borrow,
            buffer_bps,
        )?;
        tracing::debug!(
            "Sized open for {}: borrow {} swap-in {} (ltv {} bps, buffer {} bps)",
            request.user,
            total_borrow_amount,
            swap_in_amount,
            reserve.ltv_bps,
            buffer_bps
        );

        let expected_amount_out = sizer
            .expected_amount_out(swap_in_amount, &borrow, &collateral)?
            .to_base_units(collateral.decimals)?;
        let (min_amount_out, quoted) = self
            .min_amount_out(
                &sizer,
                &route,
                swap_in_amount,
                &borrow,
                &collateral,
                slippage_bps,
            )
            .await?;
        let swap = SwapBundle::single(route.to_path(swap_in_amount, min_amount_out)?);

        tracing::info!(
            "Planned open for {}: {} {} at {} bps leverage, borrowing {} {}",
            request.user,
            request.principal,
            collateral.symbol,
            request.leverage_bps,
            total_borrow_amount,
            borrow.symbol
        );

        Ok(OpenPlan {
            user: request.user,
            collateral,
            borrow,
            principal: request.principal,
            leverage_bps: request.leverage_bps,
            loan_to_value_bps: reserve.ltv_bps,
            total_borrow_amount,
            swap_in_amount,
            swap_in_buffer_bps: buffer_bps,
            expected_amount_out,
            min_amount_out,
            slippage_bps,
            quoted,
            swap,
        })
    }

    pub async fn plan_close(&self, request: CloseRequest) -> Result<ClosePlan, PlanningError> {
        let collateral = self.context.asset(&request.collateral)?.clone();
        let borrow = self.context.asset(&request.borrow)?.clone();
        let route = self.context.route(&collateral, &borrow)?;
        let slippage_bps = request
            .slippage_bps
            .unwrap_or(self.settings.default_slippage_bps);

        let pool = self.context.lending_pool();
        pool.check_leverage_access(&request.user, &collateral).await?;
        let (snapshot, reserve) = futures::try_join!(
            pool.get_user_account_data(&request.user),
            pool.get_reserve_configuration_data(&collateral),
        )?;
        let prices = self
            .context
            .oracle_adapter()
            .snapshot(&[collateral.clone(), borrow.clone()])
            .await?;

        let withdrawal = WithdrawalRequest {
            repay_amount: request.repay_amount,
            collateral_amount_held: request.collateral_held,
            collateral_asset: collateral.clone(),
            borrow_asset: borrow.clone(),
            asset_liquidation_threshold_bps: reserve.liquidation_threshold_bps,
        };
        let withdraw_amount =
            WithdrawalSizer::new(&prices).calc_withdrawal_amount(&snapshot, &withdrawal)?;
        let projected_health_factor =
            projected_health_factor(&prices, &snapshot, &withdrawal, withdraw_amount)?;
        tracing::debug!(
            "Sized close for {}: withdraw {} of {} held (threshold {} bps)",
            request.user,
            withdraw_amount,
            request.collateral_held,
            reserve.liquidation_threshold_bps
        );

        let (swap, min_amount_out) = if withdraw_amount.is_zero() {
            tracing::warn!(
                "No free collateral for {} on {}; close plan carries no swap",
                request.user,
                collateral.symbol
            );
            (None, BaseUnits::zero())
        } else {
            let sizer = PositionSizer::new(&prices);
            let (min_out, _) = self
                .min_amount_out(
                    &sizer,
                    &route,
                    withdraw_amount,
                    &collateral,
                    &borrow,
                    slippage_bps,
                )
                .await?;
            let path = route.to_path(withdraw_amount, min_out)?;
            (Some(SwapBundle::single(path)), min_out)
        };

        tracing::info!(
            "Planned close for {}: withdraw {} {}, min {} {} out",
            request.user,
            withdraw_amount,
            collateral.symbol,
            min_amount_out,
            borrow.symbol
        );

        Ok(ClosePlan {
            user: request.user,
            collateral,
            borrow,
            repay_amount: request.repay_amount,
            collateral_held: request.collateral_held,
            withdraw_amount,
            min_amount_out,
            slippage_bps,
            health_factor: snapshot.health_factor()?,
            projected_health_factor,
            swap,
        })
    }

    /// Quoter output less slippage when a quoter is wired, oracle ratio otherwise.
    async fn min_amount_out(
        &self,
        sizer: &PositionSizer<'_>,
        route: &SwapRoute,
        in_amount: BaseUnits,
        from: &Asset,
        to: &Asset,
        slippage_bps: u32,
    ) -> Result<(BaseUnits, bool), PlanningError> {
        match self.context.quoter() {
            Some(quoter) => {
                let quoted = quote(quoter, route, in_amount).await?;
                let min_out =
                    PositionSizer::calc_min_amount_out_from_quote(quoted, to, slippage_bps)?;
                Ok((min_out, true))
            }
            None => Ok((
                sizer.calc_min_amount_out(in_amount, from, to, slippage_bps)?,
                false,
            )),
        }
    }
}

async fn quote(
    quoter: &dyn SwapQuoter,
    route: &SwapRoute,
    in_amount: BaseUnits,
) -> Result<BaseUnits, PlanningError> {
    let unbounded = route.to_path(in_amount, BaseUnits::zero())?;
    let quoted = quoter.quote(&unbounded).await?;
    tracing::debug!("Quoter returned {} for {} in", quoted, in_amount);
    Ok(quoted)
}

fn projected_health_factor(
    prices: &PriceSnapshot,
    snapshot: &PositionSnapshot,
    request: &WithdrawalRequest,
    withdraw_amount: BaseUnits,
) -> Result<Option<Decimal>, PlanningError> {
    let collateral_price = prices.price_of(&request.collateral_asset)?;
    let borrow_price = prices.price_of(&request.borrow_asset)?;
    let withdrawn_threshold_eth =
        Decimal::from_base_units(withdraw_amount, request.collateral_asset.decimals)?
            .checked_mul(collateral_price.eth())?
            .checked_mul(Decimal::from_bps(request.asset_liquidation_threshold_bps))?;
    let repaid_eth = Decimal::from_base_units(request.repay_amount, request.borrow_asset.decimals)?
        .checked_mul(borrow_price.eth())?;
    Ok(snapshot.projected_health_factor(withdrawn_threshold_eth, repaid_eth)?)
}
