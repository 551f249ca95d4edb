//! Interactive menu over a [`Ledger`]

use std::io::{self, BufRead, Write};

use banking_core::utils::validation::parse_amount;
use banking_core::{Account, ErrorKind, Ledger, LedgerError, LedgerStorage, TransferError};
use rand::Rng;
use tracing::error;

const MAIN_MENU: &str = "1. Create an account\n2. Log into account\n0. Exit";
const ACCOUNT_MENU: &str =
    "1. Balance\n2. Add income\n3. Do transfer\n4. Close account\n5. Log out\n0. Exit";

const GOODBYE: &str = "Bye!";
const WRONG_OPTION: &str = "Wrong option!";
const WRONG_CREDENTIALS: &str = "Wrong card number or PIN";

/// What the account menu asks the main loop to do next
enum Flow {
    LogOut,
    Exit,
}

/// Line-oriented session: logged out at the main menu, logged in at the
/// account menu
pub struct Shell<'a, S, R, I, O>
where
    S: LedgerStorage + Clone,
    R: Rng + Send,
{
    ledger: &'a mut Ledger<S, R>,
    input: I,
    output: O,
}

impl<'a, S, R, I, O> Shell<'a, S, R, I, O>
where
    S: LedgerStorage + Clone,
    R: Rng + Send,
    I: BufRead,
    O: Write,
{
    pub fn new(ledger: &'a mut Ledger<S, R>, input: I, output: O) -> Self {
        Self {
            ledger,
            input,
            output,
        }
    }

    /// Run until the user exits or input ends
    pub async fn run(&mut self) -> io::Result<()> {
        loop {
            writeln!(self.output, "{MAIN_MENU}")?;
            let Some(choice) = self.read_line()? else {
                break;
            };

            match choice.as_str() {
                "1" => self.create_account().await?,
                "2" => {
                    if let Some(account) = self.login().await? {
                        if let Flow::Exit = self.account_menu(account).await? {
                            break;
                        }
                    }
                }
                "0" => break,
                _ => writeln!(self.output, "\n{WRONG_OPTION}")?,
            }
        }

        writeln!(self.output, "\n{GOODBYE}")?;
        self.output.flush()
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    async fn create_account(&mut self) -> io::Result<()> {
        match self.ledger.create_account().await {
            Ok(account) => {
                writeln!(self.output, "\nYour card has been created")?;
                writeln!(self.output, "Your card number:\n{}", account.number)?;
                writeln!(self.output, "Your card PIN:\n{}\n", account.pin)?;
            }
            Err(err) => error!(error = %err, "cannot create card"),
        }
        Ok(())
    }

    async fn login(&mut self) -> io::Result<Option<Account>> {
        writeln!(self.output, "\nEnter your card number:")?;
        let number = self.read_line()?.unwrap_or_default();
        writeln!(self.output, "Enter your PIN:")?;
        let pin = self.read_line()?.unwrap_or_default();

        match self.ledger.authenticate(&number, &pin).await {
            Ok(account) => {
                writeln!(self.output, "\nYou have successfully logged in!")?;
                Ok(Some(account))
            }
            Err(err) => {
                if err.kind() == ErrorKind::Storage {
                    error!(error = %err, "cannot look up card");
                }
                writeln!(self.output, "\n{WRONG_CREDENTIALS}")?;
                Ok(None)
            }
        }
    }

    async fn account_menu(&mut self, account: Account) -> io::Result<Flow> {
        loop {
            writeln!(self.output, "\n{ACCOUNT_MENU}")?;
            let Some(choice) = self.read_line()? else {
                return Ok(Flow::Exit);
            };

            match choice.as_str() {
                "1" => self.show_balance(&account).await?,
                "2" => self.add_income(&account).await?,
                "3" => self.do_transfer(&account).await?,
                "4" => {
                    if self.close_account(&account).await? {
                        return Ok(Flow::LogOut);
                    }
                }
                "5" => {
                    writeln!(self.output, "\nYou have successfully logged out!")?;
                    return Ok(Flow::LogOut);
                }
                "0" => return Ok(Flow::Exit),
                _ => writeln!(self.output, "\n{WRONG_OPTION}")?,
            }
        }
    }

    async fn show_balance(&mut self, account: &Account) -> io::Result<()> {
        match self.ledger.balance(&account.number).await {
            Ok(balance) => writeln!(self.output, "\nBalance: {balance}"),
            Err(err) => {
                error!(error = %err, "cannot read balance");
                writeln!(self.output, "\nCannot read balance: {err}")
            }
        }
    }

    async fn add_income(&mut self, account: &Account) -> io::Result<()> {
        writeln!(self.output, "\nEnter income:")?;
        let input = self.read_line()?.unwrap_or_default();

        let amount = match parse_amount(&input) {
            Ok(amount) => amount,
            Err(_) => return writeln!(self.output, "Income must be a positive whole number."),
        };

        match self.ledger.deposit(account, amount).await {
            Ok(_) => writeln!(self.output, "Income was added!"),
            Err(err) => {
                error!(error = %err, "cannot update balance");
                writeln!(self.output, "Income could not be added.")
            }
        }
    }

    async fn do_transfer(&mut self, account: &Account) -> io::Result<()> {
        writeln!(self.output, "\nTransfer\nEnter card number:")?;
        let recipient = self.read_line()?.unwrap_or_default();

        if let Err(err) = self.ledger.check_recipient(&account.number, &recipient).await {
            return self.report_transfer_error(err);
        }

        writeln!(self.output, "Enter how much money you want to transfer:")?;
        let input = self.read_line()?.unwrap_or_default();
        // Anything that is not a positive whole number cannot be covered
        let amount = parse_amount(&input).unwrap_or(0);

        match self
            .ledger
            .transfer(&account.number, &recipient, amount)
            .await
        {
            Ok(_) => writeln!(self.output, "Transfer successful!"),
            Err(err) => self.report_transfer_error(err),
        }
    }

    fn report_transfer_error(&mut self, err: LedgerError) -> io::Result<()> {
        let reason = err.transfer_reason().unwrap_or_else(|| {
            error!(error = %err, "transfer aborted");
            TransferError::TransferFailed
        });
        writeln!(self.output, "{reason}")
    }

    async fn close_account(&mut self, account: &Account) -> io::Result<bool> {
        match self.ledger.close_account(account).await {
            Ok(()) => {
                writeln!(self.output, "\nThe account has been closed!")?;
                Ok(true)
            }
            Err(err) => {
                error!(error = %err, "cannot delete card");
                writeln!(self.output, "\nThe account could not be closed.")?;
                Ok(false)
            }
        }
    }
}
