//! Basic ledger usage example

use banking_core::utils::MemoryStorage;
use banking_core::{checksum, Ledger, TransferError};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Banking Core - Basic Ledger Example\n");

    // Create a new ledger with in-memory storage
    let mut ledger = Ledger::open(MemoryStorage::new()).await?;

    // 1. Issue two cards
    println!("Issuing cards...");
    let alice = ledger.create_account().await?;
    let bob = ledger.create_account().await?;
    for account in [&alice, &bob] {
        println!(
            "  Card {} (PIN {}), checksum valid: {}",
            account.number,
            account.pin,
            checksum::is_valid(&account.number)
        );
    }
    println!();

    // 2. Log in and add income
    let alice = ledger.authenticate(&alice.number, &alice.pin).await?;
    let alice = ledger.deposit(&alice, 100).await?;
    println!("Alice added income, balance: {}", alice.balance);

    // 3. Transfer
    let receipt = ledger.transfer(&alice.number, &bob.number, 40).await?;
    println!(
        "Transferred {} from {} to {}",
        receipt.amount, receipt.sender, receipt.recipient
    );
    println!("  Alice: {}", ledger.balance(&alice.number).await?);
    println!("  Bob:   {}", ledger.balance(&bob.number).await?);
    println!();

    // 4. Rejected transfers
    println!("Attempting invalid transfers...");
    let mut corrupted = bob.number.clone();
    let last = corrupted.pop().unwrap_or('0');
    corrupted.push(if last == '9' { '0' } else { char::from(last as u8 + 1) });

    for (recipient, amount) in [
        (alice.number.as_str(), 10),
        (corrupted.as_str(), 10),
        (bob.number.as_str(), 1_000),
    ] {
        match ledger.transfer(&alice.number, recipient, amount).await {
            Ok(_) => println!("  unexpected success"),
            Err(err) => {
                let reason = err.transfer_reason().unwrap_or(TransferError::TransferFailed);
                println!("  {recipient} / {amount}: {reason}");
            }
        }
    }
    println!();

    // 5. Close the account
    ledger.close_account(&alice).await?;
    let still_there = ledger.authenticate(&alice.number, &alice.pin).await.is_ok();
    println!("Alice's card closed, can still log in: {still_there}");

    Ok(())
}
