//! Function-name dispatcher.
//!
//! Routes a named function with ordered string arguments to the token
//! ledger, the settlement engine or the registry. Arguments are parsed and
//! counted here; the operations themselves only see typed values.

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use tokensettle_common::{AccountId, Amount, Currency, ExchangeRate, LedgerError, OrgId, Result};
use tokensettle_ledger::{AuthorizationGate, IdentitySource, LedgerStore, RolePolicy, TokenLedger};

use crate::engine::SettlementEngine;
use crate::registry::Registry;

/// Invocable functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    Mint,
    Burn,
    Transfer,
    QueryBalance,
    SettleDomestic,
    SettleCrossBorder,
    RegisterOrg,
    QueryOrg,
}

/// Argument count a function accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
}

impl Arity {
    fn accepts(&self, count: usize) -> bool {
        match self {
            Arity::Exact(n) => count == *n,
            Arity::AtLeast(n) => count >= *n,
        }
    }
}

impl Function {
    pub const ALL: [Function; 8] = [
        Function::Mint,
        Function::Burn,
        Function::Transfer,
        Function::QueryBalance,
        Function::SettleDomestic,
        Function::SettleCrossBorder,
        Function::RegisterOrg,
        Function::QueryOrg,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Function::Mint => "Mint",
            Function::Burn => "Burn",
            Function::Transfer => "Transfer",
            Function::QueryBalance => "QueryBalance",
            Function::SettleDomestic => "SettleDomestic",
            Function::SettleCrossBorder => "SettleCrossBorder",
            Function::RegisterOrg => "RegisterOrg",
            Function::QueryOrg => "QueryOrg",
        }
    }

    /// Argument names in call order.
    pub fn params(&self) -> &'static [&'static str] {
        match self {
            Function::Mint | Function::Burn => &["currency", "accountID", "amount"],
            Function::Transfer | Function::SettleDomestic => {
                &["currency", "sender", "receiver", "amount"]
            }
            Function::QueryBalance => &["currency", "accountID"],
            Function::SettleCrossBorder => &[
                "fromCurrency",
                "toCurrency",
                "sender",
                "receiver",
                "amount",
                "exchangeRate",
            ],
            Function::RegisterOrg => &["orgID", "orgName"],
            Function::QueryOrg => &["orgID"],
        }
    }

    pub fn arity(&self) -> Arity {
        match self {
            // Extra registration attributes are accepted and ignored.
            Function::RegisterOrg => Arity::AtLeast(2),
            other => Arity::Exact(other.params().len()),
        }
    }

    fn check_args(&self, args: &[String]) -> Result<()> {
        let arity = self.arity();
        if arity.accepts(args.len()) {
            return Ok(());
        }
        let (qualifier, n) = match arity {
            Arity::Exact(n) => ("", n),
            Arity::AtLeast(n) => ("at least ", n),
        };
        Err(LedgerError::invalid(format!(
            "{} requires {}{} arguments: {}",
            self.name(),
            qualifier,
            n,
            self.params().join(", ")
        )))
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Function {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        Function::ALL
            .iter()
            .copied()
            .find(|f| f.name() == s)
            .ok_or_else(|| LedgerError::invalid(format!("Invalid function name: {}", s)))
    }
}

/// Routes invocations to ledger, settlement and registry operations.
#[derive(Debug, Clone, Default)]
pub struct Dispatcher<G = RolePolicy> {
    tokens: TokenLedger<G>,
    settlement: SettlementEngine,
    registry: Registry,
}

impl<G: AuthorizationGate> Dispatcher<G> {
    pub fn new(gate: G) -> Self {
        Self {
            tokens: TokenLedger::new(gate),
            settlement: SettlementEngine::new(),
            registry: Registry::new(),
        }
    }

    /// Run one function within the caller's invocation.
    pub fn invoke<C>(&self, ctx: &mut C, function: &str, args: &[String]) -> Result<String>
    where
        C: LedgerStore + IdentitySource + ?Sized,
    {
        let function: Function = function.parse()?;
        function.check_args(args)?;
        debug!(function = %function, args = args.len(), "Dispatching invocation");

        match function {
            Function::Mint => {
                let (currency, account, amount) =
                    (currency(&args[0])?, account(&args[1])?, amount(&args[2])?);
                self.tokens.mint(ctx, &currency, &account, amount)
            }
            Function::Burn => {
                let (currency, account, amount) =
                    (currency(&args[0])?, account(&args[1])?, amount(&args[2])?);
                self.tokens.burn(ctx, &currency, &account, amount)
            }
            Function::Transfer => {
                let currency = currency(&args[0])?;
                let (sender, receiver) = (account(&args[1])?, account(&args[2])?);
                let amount = amount(&args[3])?;
                self.tokens.transfer(ctx, &currency, &sender, &receiver, amount)
            }
            Function::QueryBalance => {
                let (currency, account) = (currency(&args[0])?, account(&args[1])?);
                self.tokens
                    .query_balance(ctx, &currency, &account)
                    .map(|amount| amount.to_string())
            }
            Function::SettleDomestic => {
                let currency = currency(&args[0])?;
                let (sender, receiver) = (account(&args[1])?, account(&args[2])?);
                let amount = amount(&args[3])?;
                self.settlement
                    .settle_domestic(ctx, &currency, &sender, &receiver, amount)
                    .map(|receipt| receipt.message())
            }
            Function::SettleCrossBorder => {
                let (from_currency, to_currency) = (currency(&args[0])?, currency(&args[1])?);
                let (sender, receiver) = (account(&args[2])?, account(&args[3])?);
                let amount = amount(&args[4])?;
                let rate = ExchangeRate::parse(&args[5])?;
                self.settlement
                    .settle_cross_border(
                        ctx,
                        &from_currency,
                        &to_currency,
                        &sender,
                        &receiver,
                        amount,
                        rate,
                    )
                    .map(|receipt| receipt.message())
            }
            Function::RegisterOrg => {
                let org_id = OrgId::new(args[0].as_str())?;
                self.registry.register_org(ctx, &org_id, &args[1])
            }
            Function::QueryOrg => {
                let org_id = OrgId::new(args[0].as_str())?;
                let record = self.registry.query_org(ctx, &org_id)?;
                serde_json::to_string(&record).map_err(|e| {
                    LedgerError::StoreFailure(format!("Failed to marshal org info: {}", e))
                })
            }
        }
    }
}

fn currency(value: &str) -> Result<Currency> {
    Currency::new(value)
}

fn account(value: &str) -> Result<AccountId> {
    AccountId::new(value)
}

fn amount(value: &str) -> Result<Amount> {
    Amount::parse("amount", value)
}
