use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use signalbot::execution::{
    AccountQuery, BinanceTradeFeed, ExecutionAdapter, MemoryTradeLog, PositionState,
    SessionConfig, SessionStats, BINANCE_TESTNET_STREAM_BASE,
};
use signalbot::*;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// Exchange stand-in that fills orders at scripted prices, in order
struct ScriptedExchange {
    fills: Mutex<VecDeque<Decimal>>,
    orders: Mutex<Vec<(TradeSide, Decimal)>>,
    delay: Option<Duration>,
}

impl ScriptedExchange {
    fn new(fills: &[Decimal]) -> Self {
        Self {
            fills: Mutex::new(fills.iter().copied().collect()),
            orders: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new(&[dec!(100)])
        }
    }

    async fn fill(&self, side: TradeSide, quantity: Decimal) -> Result<OrderReport, ExecutionError> {
        self.orders.lock().unwrap().push((side, quantity));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let price = self
            .fills
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(ExecutionError::NoFills)?;

        Ok(OrderReport {
            fills: vec![Fill { price, quantity }],
        })
    }
}

#[async_trait]
impl ExecutionAdapter for ScriptedExchange {
    async fn buy(&self, _symbol: &str, quantity: Decimal) -> Result<OrderReport, ExecutionError> {
        self.fill(TradeSide::Buy, quantity).await
    }

    async fn sell(&self, _symbol: &str, quantity: Decimal) -> Result<OrderReport, ExecutionError> {
        self.fill(TradeSide::Sell, quantity).await
    }
}

#[async_trait]
impl AccountQuery for ScriptedExchange {
    async fn get_balance(&self, asset: &str) -> anyhow::Result<Decimal> {
        match asset {
            "USDT" => Ok(dec!(1000)),
            other => anyhow::bail!("No balance for {}", other),
        }
    }
}

fn session_config() -> SessionConfig {
    SessionConfig {
        symbol: "BTCUSDT".to_string(),
        risk_fraction: dec!(0.1),
        execution_timeout: Duration::from_secs(5),
        window_capacity: 100,
    }
}

fn trade_message(i: usize, price: Decimal) -> String {
    format!(
        r#"{{"e":"trade","E":{ts},"s":"BTCUSDT","t":{i},"p":"{price}","q":"0.01","T":{ts},"m":false}}"#,
        ts = 1_700_000_000_000u64 + i as u64 * 1000,
        i = i,
        price = price
    )
}

/// Steady climb, a pullback that triggers a buy at 100, a further dip,
/// then a rebound that triggers a sell at 106
fn round_trip_prices() -> Vec<Decimal> {
    let mut prices: Vec<Decimal> = (0..30).map(|i| Decimal::from(68 + 2 * i)).collect();
    prices.extend([dec!(118), dec!(110), dec!(104), dec!(100)]);
    prices.extend([dec!(94), dec!(90), dec!(98), dec!(106)]);
    prices
}

#[tokio::test]
async fn test_e2e_round_trip() {
    let _ = tracing_subscriber::fmt::try_init();

    println!("=== Starting E2E Test ===\n");

    let exchange = Arc::new(ScriptedExchange::new(&[dec!(100), dec!(106)]));
    let trade_log = Arc::new(MemoryTradeLog::new());

    // 1. Seed the session from the account balance
    println!("1. Starting session...");
    let mut session = TradingSession::start(
        session_config(),
        MomentumStrategy::default(),
        exchange.as_ref(),
        "USDT",
        exchange.clone(),
        trade_log.clone(),
    )
    .await
    .expect("session should start");
    assert_eq!(session.position().starting_balance(), dec!(1000));
    println!("   ✓ Starting balance: {}", session.position().starting_balance());

    // 2. Stream ticks through the channel, with noise mixed in
    println!("\n2. Streaming trades...");
    let (tx, rx) = mpsc::channel(16);
    let producer = tokio::spawn(async move {
        tx.send(r#"{"result":null,"id":1}"#.to_string()).await.unwrap();
        for (i, price) in round_trip_prices().into_iter().enumerate() {
            tx.send(trade_message(i, price)).await.unwrap();
            if i == 10 {
                tx.send(r#"{"e":"trade","p":"oops"}"#.to_string()).await.unwrap();
            }
        }
    });

    let stats = session.run(rx).await;
    producer.await.unwrap();

    assert_eq!(
        stats,
        SessionStats {
            messages: 40,
            ticks: 38,
            malformed: 1,
            trades: 2,
            failed_orders: 0,
        }
    );
    println!("   ✓ Stats: {:?}", stats);

    // 3. One buy sized from cash, one sell of the whole holding
    println!("\n3. Checking orders...");
    assert_eq!(
        exchange.orders.lock().unwrap().as_slice(),
        &[(TradeSide::Buy, dec!(1.0)), (TradeSide::Sell, dec!(1.0))]
    );

    let records = trade_log.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].side, TradeSide::Buy);
    assert_eq!(records[0].price, dec!(100));
    assert_eq!(records[1].side, TradeSide::Sell);
    assert_eq!(records[1].price, dec!(106));
    assert_eq!(records[1].quantity, dec!(1.0));
    println!("   ✓ Trades logged: {}", records.len());

    // 4. Back to flat with the profit in cash
    println!("\n4. Checking position...");
    let position = session.position();
    assert_eq!(position.state(), PositionState::Flat);
    assert_eq!(position.cash_balance(), dec!(1006));
    assert_eq!(position.roi_pct(), Some(dec!(0.6)));
    println!(
        "   ✓ Cash: {}, ROI: {}%",
        position.cash_balance(),
        position.roi_pct().unwrap()
    );

    println!("\n=== E2E Test Completed Successfully ===");
}

#[tokio::test]
async fn test_e2e_sell_outcome_reports_roi() {
    let exchange = Arc::new(ScriptedExchange::new(&[dec!(100), dec!(106)]));
    let mut session = TradingSession::new(
        session_config(),
        MomentumStrategy::default(),
        dec!(1000),
        exchange,
        Arc::new(MemoryTradeLog::new()),
    );

    let mut outcomes = Vec::new();
    for (i, price) in round_trip_prices().into_iter().enumerate() {
        outcomes.push(session.on_message(&trade_message(i, price)).await);
    }

    let sold = outcomes
        .iter()
        .filter_map(|o| match o {
            TickOutcome::Sold { record, roi_pct } => Some((record, *roi_pct)),
            _ => None,
        })
        .collect::<Vec<_>>();

    assert_eq!(sold.len(), 1);
    assert_eq!(sold[0].0.price, dec!(106));
    assert_eq!(sold[0].1, Some(dec!(0.6)));
    assert!(matches!(outcomes.last(), Some(TickOutcome::Sold { .. })));
}

#[tokio::test(start_paused = true)]
async fn test_e2e_slow_exchange_times_out() {
    let exchange = Arc::new(ScriptedExchange::slow(Duration::from_secs(30)));
    let trade_log = Arc::new(MemoryTradeLog::new());
    let mut session = TradingSession::new(
        session_config(),
        MomentumStrategy::default(),
        dec!(1000),
        exchange.clone(),
        trade_log.clone(),
    );

    let prices = round_trip_prices();
    let mut last = TickOutcome::Ignored;
    for (i, price) in prices[..34].iter().enumerate() {
        last = session.on_message(&trade_message(i, *price)).await;
    }

    assert!(matches!(
        last,
        TickOutcome::ExecutionFailed {
            side: TradeSide::Buy,
            error: ExecutionError::Timeout(_)
        }
    ));
    assert_eq!(exchange.orders.lock().unwrap().len(), 1);
    assert_eq!(session.position().state(), PositionState::Flat);
    assert_eq!(session.position().cash_balance(), dec!(1000));
    assert!(trade_log.records().is_empty());
}

#[tokio::test]
async fn test_e2e_missing_quote_balance_fails_start() {
    let exchange = Arc::new(ScriptedExchange::new(&[]));
    let result = TradingSession::start(
        session_config(),
        MomentumStrategy::default(),
        exchange.as_ref(),
        "BUSD",
        exchange.clone(),
        Arc::new(MemoryTradeLog::new()),
    )
    .await;

    assert!(result.is_err());
}

#[tokio::test]
#[ignore] // Requires network access to the Binance testnet
async fn test_e2e_live_trade_stream() {
    let _ = tracing_subscriber::fmt::try_init();

    let feed = BinanceTradeFeed::new(BINANCE_TESTNET_STREAM_BASE, "BTCUSDT");
    let (mut rx, reader) = feed.connect(16).await.expect("stream should connect");

    let raw = tokio::time::timeout(Duration::from_secs(60), rx.recv())
        .await
        .expect("no trade within 60s")
        .expect("stream closed");

    let tick = Tick::parse(&raw).expect("valid trade message");
    println!("✓ Received: {:?}", tick);
    assert!(tick.map(|t| t.price > Decimal::ZERO).unwrap_or(true));

    reader.abort();
}
