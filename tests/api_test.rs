use axum::http::{Request, StatusCode};
use levplan::api::{self, AppState};
use levplan::domain::{PositionSnapshot, ReserveConfiguration};
use levplan::engine::{SwapHop, SwapOp};
use levplan::{
    Address, Asset, Decimal, LeveragePlanner, MarketContext, MockMarket, PlannerSettings, Price,
    SwapRoute, Symbol,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt;

const ALICE: &str = "0x00000000000000000000000000000000000a11ce";
const BOB: &str = "0x0000000000000000000000000000000000000b0b";

fn d(s: &str) -> Decimal {
    Decimal::from_str_canonical(s).unwrap()
}

fn usdc() -> Asset {
    Asset::new(
        Address::new("0xa0b8".to_string()),
        Symbol::new("USDC".to_string()),
        6,
    )
}

fn fraxbp() -> Asset {
    Asset::new(
        Address::new("0x3175".to_string()),
        Symbol::new("FRAXBP".to_string()),
        18,
    )
}

fn setup_test_app() -> axum::Router {
    let alice = Address::new(ALICE.to_string());
    let market = Arc::new(
        MockMarket::new()
            .with_price(&usdc(), Price::from_eth(d("0.0005")))
            .with_price(&fraxbp(), Price::from_eth(d("0.0005")))
            .with_reserve(
                &fraxbp(),
                ReserveConfiguration {
                    ltv_bps: 8000,
                    liquidation_threshold_bps: 8000,
                },
            )
            .with_account(
                &alice,
                PositionSnapshot {
                    total_collateral_eth: d("0.05"),
                    total_debt_eth: d("0.035"),
                    current_liquidation_threshold_bps: 8000,
                    health_factor_wad: d("1142857142857142857"),
                },
            )
            .with_whitelisted(&alice),
    );
    let route = SwapRoute::new(vec![SwapHop {
        source_token: usdc().address,
        pool: Address::new("0xdcef".to_string()),
        dest_token: fraxbp().address,
        op: SwapOp::AddLiquidity,
        token_index_from: 1,
        token_index_to: 0,
    }])
    .unwrap();
    let context = MarketContext::builder()
        .with_asset(usdc())
        .unwrap()
        .with_asset(fraxbp())
        .unwrap()
        .with_route(route)
        .with_oracle(market.clone())
        .with_lending_pool(market)
        .build()
        .unwrap();
    let planner = LeveragePlanner::new(Arc::new(context), PlannerSettings::default());
    api::create_router(AppState::new(Arc::new(planner)))
}

async fn send(
    app: axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(axum::body::Body::from(body.to_string()))
            .unwrap(),
        None => request.body(axum::body::Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_health_endpoint() {
    let (status, body) = send(setup_test_app(), "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_ready_endpoint() {
    let (status, body) = send(setup_test_app(), "GET", "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
    assert_eq!(body["assets"], 2);
}

#[tokio::test]
async fn test_open_plan_endpoint() {
    let (status, body) = send(
        setup_test_app(),
        "POST",
        "/v1/plans/open",
        Some(json!({
            "user": ALICE,
            "collateral": "FRAXBP",
            "borrow": "USDC",
            "principal": "1000000000000000000000",
            "leverageBps": 36000
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalBorrowAmount"], "3680000000");
    assert_eq!(body["swapInAmount"], "3621730382");
    assert_eq!(body["minAmountOut"], "3599999999708000000000");
    assert_eq!(body["swap"]["pathLength"], 1);
    assert_eq!(body["swap"]["paths"][0]["hops"][0]["op"], "add_liquidity");
    assert_eq!(body["swap"]["paths"][1]["hops"][0]["op"], "noop");
    assert!(body["quoteId"].as_str().is_some());
    assert!(body["quotedAtMs"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn test_close_plan_endpoint() {
    let (status, body) = send(
        setup_test_app(),
        "POST",
        "/v1/plans/close",
        Some(json!({
            "user": ALICE,
            "collateral": "FRAXBP",
            "borrow": "USDC",
            "repayAmount": "10000000",
            "collateralHeld": "20000000000000000000",
            "slippageBps": 100
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["withdrawAmount"], "20000000000000000000");
    assert_eq!(body["minAmountOut"], "19800000");
    assert_eq!(
        body["swap"]["paths"][0]["hops"][0]["op"],
        "remove_liquidity_one_coin"
    );
}

#[tokio::test]
async fn test_not_whitelisted_is_forbidden() {
    let (status, body) = send(
        setup_test_app(),
        "POST",
        "/v1/plans/open",
        Some(json!({
            "user": BOB,
            "collateral": "FRAXBP",
            "borrow": "USDC",
            "principal": "1000",
            "leverageBps": 10000
        })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].as_str().unwrap().contains("118"));
}

#[tokio::test]
async fn test_bad_requests() {
    let (status, _) = send(
        setup_test_app(),
        "POST",
        "/v1/plans/open",
        Some(json!({
            "user": "0x1234",
            "collateral": "FRAXBP",
            "borrow": "USDC",
            "principal": "1000",
            "leverageBps": 10000
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        setup_test_app(),
        "POST",
        "/v1/plans/open",
        Some(json!({
            "user": ALICE,
            "collateral": "CRV",
            "borrow": "USDC",
            "principal": "1000",
            "leverageBps": 10000
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("CRV"));

    let (status, _) = send(
        setup_test_app(),
        "POST",
        "/v1/plans/open",
        Some(json!({
            "user": ALICE,
            "collateral": "FRAXBP",
            "borrow": "USDC",
            "principal": "0",
            "leverageBps": 10000
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
