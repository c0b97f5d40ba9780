use anyhow::Result;
use deribitx::core::kernel::TungsteniteTransport;
use deribitx::{
    DeribitSession, DeribitSessionBuilder, JsonlTradeStore, OrderType, SessionConfig, SessionError,
};
use std::io::{self, Write};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = load_config()?;
    let session = DeribitSessionBuilder::new()
        .with_config(config)
        .with_store(Box::new(JsonlTradeStore::new("trades.jsonl")))
        .build();

    session.connect().await?;
    session.authenticate().await?;
    println!("Authenticated successfully.");

    loop {
        print_menu();
        let choice = prompt("Enter your choice: ")?;

        let outcome = match choice.as_str() {
            "1" => show_order_book(&session).await,
            "2" => place_order(&session, Side::Buy).await,
            "3" => place_order(&session, Side::Sell).await,
            "4" => cancel_open_order(&session).await,
            "q" | "Q" => break,
            _ => {
                println!("Invalid choice, try again.");
                Ok(())
            }
        };

        if let Err(e) = outcome {
            match e {
                SessionError::Transport(_) | SessionError::Protocol(_) => {
                    eprintln!("Fatal session error: {}", e);
                    break;
                }
                other => println!("Error: {}", other),
            }
        }
    }

    session.close().await?;
    println!("Connections closed.");
    Ok(())
}

enum Side {
    Buy,
    Sell,
}

fn load_config() -> Result<SessionConfig> {
    #[cfg(feature = "env-file")]
    let from_env = SessionConfig::from_env_file();
    #[cfg(not(feature = "env-file"))]
    let from_env = SessionConfig::from_env();

    match from_env {
        Ok(config) => Ok(config),
        Err(_) => {
            println!("Deribit Trading Client (testnet)");
            let client_id = prompt("Enter your Deribit client ID: ")?;
            let client_secret = prompt("Enter your Deribit client secret: ")?;
            Ok(SessionConfig::new(client_id, client_secret).testnet(true))
        }
    }
}

fn print_menu() {
    println!();
    println!("1: GET ORDER BOOK");
    println!("2: PLACE BUY ORDER");
    println!("3: PLACE SELL ORDER");
    println!("4: CANCEL AN OPEN LIMIT ORDER");
    println!("Q: EXIT/QUIT");
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

async fn show_order_book(
    session: &DeribitSession<TungsteniteTransport>,
) -> Result<(), SessionError> {
    let instrument = prompt_or_validation("Enter symbol (e.g., BTC-PERPETUAL): ")?.to_uppercase();
    let book = session.order_book(&instrument).await?;

    println!("\n=== {} order book ===", book.instrument);
    println!("{:>14} | {:<14}", "BID", "ASK");
    let depth = book.bids.len().max(book.asks.len()).min(10);
    for i in 0..depth {
        let bid = book
            .bids
            .get(i)
            .map_or_else(String::new, |l| format!("{} @ {}", l.amount, l.price));
        let ask = book
            .asks
            .get(i)
            .map_or_else(String::new, |l| format!("{} @ {}", l.price, l.amount));
        println!("{:>14} | {:<14}", bid, ask);
    }
    Ok(())
}

async fn place_order(
    session: &DeribitSession<TungsteniteTransport>,
    side: Side,
) -> Result<(), SessionError> {
    let instrument = prompt_or_validation("Symbol (e.g., BTC-PERPETUAL): ")?.to_uppercase();
    let amount = prompt_or_validation("Amount: ")?;
    let order_type = OrderType::parse(&prompt_or_validation("Type (market/limit): ")?)?;
    let price = match order_type {
        OrderType::Limit => Some(prompt_or_validation("Limit price: ")?),
        OrderType::Market => None,
    };

    let record = match side {
        Side::Buy => {
            session
                .buy(&instrument, &amount, order_type, price.as_deref())
                .await?
        }
        Side::Sell => {
            session
                .sell(&instrument, &amount, order_type, price.as_deref())
                .await?
        }
    };

    println!(
        "Order {}: {} {} {} @ {} ({})",
        record.order_id, record.side, record.amount, record.instrument_name, record.price,
        record.status
    );
    Ok(())
}

async fn cancel_open_order(
    session: &DeribitSession<TungsteniteTransport>,
) -> Result<(), SessionError> {
    let currency = prompt_or_validation("Currency (e.g., BTC): ")?.to_uppercase();
    let orders = session.open_limit_orders(&currency).await?;

    if orders.is_empty() {
        println!("No open limit orders found.");
        return Ok(());
    }

    println!("\n=== Open limit orders ===");
    for (i, order) in orders.iter().enumerate() {
        println!(
            "{}. ID: {}, Symbol: {}, Price: {}, Amount: {}",
            i + 1,
            order.order_id,
            order.instrument,
            order.price,
            order.amount
        );
    }

    let index: usize = prompt_or_validation("\nEnter order number to cancel: ")?
        .parse()
        .map_err(|_| SessionError::Validation("not a number".to_string()))?;

    let Some(order) = index.checked_sub(1).and_then(|i| orders.get(i)) else {
        println!("Invalid selection.");
        return Ok(());
    };

    let cancelled = session.cancel_order(&order.order_id).await?;
    println!("Cancelled {} ({})", cancelled.order_id, cancelled.status);
    Ok(())
}

fn prompt_or_validation(label: &str) -> Result<String, SessionError> {
    prompt(label).map_err(|e| SessionError::Validation(format!("failed to read input: {}", e)))
}
