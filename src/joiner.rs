// 🔗 Entity Joiner
// Resolves a client's accounts and branch agency from the three decoded
// collections.
//
// Matching is exact: tax ids compare byte-for-byte as decoded, so
// "123.456.789-00" and "12345678900" are different owners. Duplicate
// agency codes resolve to the first row in feed order.

use crate::entities::{Account, Agency, Client};
use serde::Serialize;

/// How a client is looked up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientKey<'a> {
    /// The feed's opaque `id`
    Id(&'a str),
    /// CPF/CNPJ, verbatim
    TaxId(&'a str),
}

/// First client matching `key`, or `None`
pub fn find_client<'c>(clients: &'c [Client], key: ClientKey<'_>) -> Option<&'c Client> {
    clients.iter().find(|client| match key {
        ClientKey::Id(id) => client.id == id,
        ClientKey::TaxId(tax_id) => client.tax_id.as_deref() == Some(tax_id),
    })
}

/// Every account whose owner tax id equals the client's, in feed order.
///
/// A client without a tax id owns no accounts; an empty owner cell never
/// matches anyone.
pub fn accounts_of<'a>(accounts: &'a [Account], client: &Client) -> Vec<&'a Account> {
    match client.tax_id.as_deref() {
        Some(tax_id) if !tax_id.is_empty() => accounts
            .iter()
            .filter(|account| account.owner_tax_id == tax_id)
            .collect(),
        _ => Vec::new(),
    }
}

/// The client's agency: first agency whose code equals the client's
pub fn agency_of<'a>(agencies: &'a [Agency], client: &Client) -> Option<&'a Agency> {
    agencies
        .iter()
        .find(|agency| agency.code == client.agency_code)
}

/// A client joined with its accounts and agency
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientDetail {
    pub client: Client,
    pub accounts: Vec<Account>,
    pub agency: Option<Agency>,
}

impl ClientDetail {
    pub fn total_balance(&self) -> f64 {
        self.accounts.iter().map(|a| a.balance).sum()
    }

    pub fn total_available_credit(&self) -> f64 {
        self.accounts.iter().map(|a| a.available_credit).sum()
    }
}

/// Look up a client and join it with its accounts and agency
pub fn resolve_detail(
    clients: &[Client],
    accounts: &[Account],
    agencies: &[Agency],
    key: ClientKey<'_>,
) -> Option<ClientDetail> {
    let client = find_client(clients, key)?;

    Some(ClientDetail {
        client: client.clone(),
        accounts: accounts_of(accounts, client).into_iter().cloned().collect(),
        agency: agency_of(agencies, client).cloned(),
    })
}
