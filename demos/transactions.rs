//! Transactions - acknowledge inside a transaction, abort, then commit.
//!
//! This example demonstrates:
//! - Connecting and subscribing with client acknowledgment
//! - Acking messages inside a transaction
//! - Aborting a transaction so the messages are redelivered
//! - Committing a second transaction
//!
//! # Running
//!
//! Start a broker with STOMP on port 61613 (for example ActiveMQ), then:
//!
//! ```text
//! RUST_LOG=debug cargo run --example transactions -- tcp://localhost:61613
//! ```

use stomp_wire_client::{Connection, ConnectionConfig, Headers};

const QUEUE: &str = "/queue/transactions";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let uri = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "tcp://localhost:61613".to_string());

    let config = ConnectionConfig::default().with_prefetch_size(1);
    let mut conn = Connection::from_uri(&uri, config)?;
    conn.connect("", "", "1.0,1.1,1.2").await?;
    conn.set_read_timeout(1, 0);

    conn.subscribe(QUEUE, &Headers::from([("ack", "client")]), None)
        .await?;

    for i in 1..4 {
        conn.send(QUEUE, i.to_string(), &Headers::new(), None).await?;
    }

    conn.begin(Some("tx1"), None).await?;
    println!("Beginning transaction 'tx1'");
    for _ in 1..3 {
        let Some(message) = conn.read_frame().await? else {
            break;
        };
        println!("Received message with body '{}'", message.frame().body_text());
        conn.ack(&message, Some("tx1")).await?;
    }
    println!("Aborting transaction 'tx1'");
    conn.abort(Some("tx1"), None).await?;

    conn.begin(Some("tx2"), None).await?;
    println!("Beginning transaction 'tx2'");
    for _ in 1..4 {
        let Some(message) = conn.read_frame().await? else {
            break;
        };
        println!("Received message with body '{}'", message.frame().body_text());
        conn.ack(&message, Some("tx2")).await?;
    }
    conn.commit(Some("tx2"), None).await?;
    println!("Committing transaction 'tx2'");

    match conn.read_frame().await? {
        None => println!("No more messages in the queue"),
        Some(message) => println!(
            "Warning: some messages still in the queue: {}",
            message.frame().body_text()
        ),
    }

    conn.disconnect().await;
    Ok(())
}
