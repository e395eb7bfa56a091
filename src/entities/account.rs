// 💳 Account Entity - one row of the `contas` feed
//
// Relationship: owner_tax_id → Client.tax_id (many accounts per client)
//
// The account type is free text in the feed. `AccountType` classifies it
// for aggregate counts, but the stored text is never rewritten.

use crate::decoder::{FeedKind, FeedRecord, RawRow};
use crate::locale::parse_currency;
use serde::{Deserialize, Serialize};

pub const COL_ID: &str = "id";
pub const COL_OWNER_TAX_ID: &str = "cpfCnpjCliente";
pub const COL_KIND: &str = "tipo";
pub const COL_BALANCE: &str = "saldo";
pub const COL_CREDIT_LIMIT: &str = "limiteCredito";
pub const COL_AVAILABLE_CREDIT: &str = "creditoDisponivel";

// ============================================================================
// ACCOUNT TYPE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountType {
    /// Conta corrente
    Checking,

    /// Conta poupança
    Savings,

    /// Anything else the feed happens to contain
    Other,
}

impl AccountType {
    /// Classify the feed's free-text type ("corrente", "Poupança", …)
    pub fn classify(label: &str) -> Self {
        let normalized: String = label
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| match c {
                'ç' => 'c',
                'ã' | 'á' | 'â' | 'à' => 'a',
                other => other,
            })
            .collect();

        match normalized.as_str() {
            "corrente" | "conta corrente" | "checking" => AccountType::Checking,
            "poupanca" | "conta poupanca" | "savings" => AccountType::Savings,
            _ => AccountType::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Checking => "Checking",
            AccountType::Savings => "Savings",
            AccountType::Other => "Other",
        }
    }
}

// ============================================================================
// ACCOUNT ENTITY
// ============================================================================

/// Account - bank account owned by a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,

    /// Owner's CPF/CNPJ, verbatim (punctuation included)
    pub owner_tax_id: String,

    /// Account type as written in the feed
    pub kind: Option<String>,

    pub balance: f64,
    pub credit_limit: f64,
    pub available_credit: f64,
}

impl Account {
    pub fn account_type(&self) -> AccountType {
        self.kind
            .as_deref()
            .map_or(AccountType::Other, AccountType::classify)
    }

    /// Part of the credit limit already in use
    pub fn used_credit(&self) -> f64 {
        self.credit_limit - self.available_credit
    }

    pub fn is_overdrawn(&self) -> bool {
        self.balance < 0.0
    }
}

impl FeedRecord for Account {
    const KIND: FeedKind = FeedKind::Accounts;

    fn required_columns() -> &'static [&'static [&'static str]] {
        &[&[COL_ID], &[COL_OWNER_TAX_ID]]
    }

    fn from_row(row: &RawRow) -> Self {
        Account {
            id: row.text(COL_ID).unwrap_or_default(),
            owner_tax_id: row.text(COL_OWNER_TAX_ID).unwrap_or_default(),
            kind: row.text(COL_KIND),
            balance: parse_currency(row.get(COL_BALANCE)).unwrap_or(0.0),
            credit_limit: parse_currency(row.get(COL_CREDIT_LIMIT)).unwrap_or(0.0),
            available_credit: parse_currency(row.get(COL_AVAILABLE_CREDIT)).unwrap_or(0.0),
        }
    }
}
