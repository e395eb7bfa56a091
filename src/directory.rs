// 🗂️ Client Directory - the interface the presentation layer talks to
//
// - list_clients: needs only the clients feed
// - get_client_detail: needs all three feeds; any failure is fatal
// - summary: clients required, accounts optional
//
// Feeds are fetched concurrently and each load produces fresh, immutable
// collections; nothing is cached between calls.

use crate::config::AppConfig;
use crate::entities::{Account, AccountType, Agency, Client};
use crate::error::FeedResult;
use crate::feed::{FeedFetcher, FeedLoader, HttpFetcher};
use crate::joiner::{resolve_detail, ClientDetail, ClientKey};
use crate::listing::{ClientPage, ListingEngine, SessionStore};
use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;

/// Result of loading all three feeds; each feed succeeds or fails alone
#[derive(Debug)]
pub struct FeedBatch {
    pub clients: FeedResult<Vec<Client>>,
    pub accounts: FeedResult<Vec<Account>>,
    pub agencies: FeedResult<Vec<Agency>>,
}

impl FeedBatch {
    /// All three collections, or the first failure (clients, accounts,
    /// agencies order)
    pub fn require_all(self) -> FeedResult<(Vec<Client>, Vec<Account>, Vec<Agency>)> {
        Ok((self.clients?, self.accounts?, self.agencies?))
    }

    /// Whatever loaded; failed feeds count as empty
    pub fn degraded(self) -> (Vec<Client>, Vec<Account>, Vec<Agency>) {
        (
            or_empty(self.clients),
            or_empty(self.accounts),
            or_empty(self.agencies),
        )
    }
}

/// A failed optional feed counts as empty
fn or_empty<T>(result: FeedResult<Vec<T>>) -> Vec<T> {
    result.unwrap_or_else(|e| {
        log::warn!("Continuing without {} feed: {}", e.feed(), e);
        Vec::new()
    })
}

/// Ticker numbers: client count and account counts by type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_clients: usize,
    pub checking_accounts: usize,
    pub savings_accounts: usize,
}

impl DashboardSummary {
    pub fn from_collections(clients: &[Client], accounts: &[Account]) -> Self {
        let count = |kind: AccountType| {
            accounts
                .iter()
                .filter(|account| account.account_type() == kind)
                .count()
        };

        DashboardSummary {
            total_clients: clients.len(),
            checking_accounts: count(AccountType::Checking),
            savings_accounts: count(AccountType::Savings),
        }
    }
}

/// Build a listing page from an already loaded roster.
///
/// Kept synchronous so callers holding a locked session store never hold
/// it across a fetch.
pub fn list_loaded(
    clients: Vec<Client>,
    store: &mut dyn SessionStore,
    search_text: Option<&str>,
    page: Option<i64>,
) -> ClientPage {
    let mut engine = ListingEngine::mount(clients, store);
    let result = engine.request(search_text, page);
    engine.unmount();
    result
}

pub struct ClientDirectory {
    clients: FeedLoader<Client>,
    accounts: FeedLoader<Account>,
    agencies: FeedLoader<Agency>,
}

impl ClientDirectory {
    pub fn new(
        clients_url: &str,
        accounts_url: &str,
        agencies_url: &str,
        fetcher: Arc<dyn FeedFetcher>,
    ) -> Self {
        ClientDirectory {
            clients: FeedLoader::new(clients_url, Arc::clone(&fetcher)),
            accounts: FeedLoader::new(accounts_url, Arc::clone(&fetcher)),
            agencies: FeedLoader::new(agencies_url, fetcher),
        }
    }

    /// HTTP-backed directory for the configured feeds
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let fetcher = HttpFetcher::new(config.request_timeout())?;
        Ok(Self::new(
            &config.clients_url,
            &config.accounts_url,
            &config.agencies_url,
            Arc::new(fetcher),
        ))
    }

    pub async fn load_clients(&self) -> FeedResult<Vec<Client>> {
        self.clients.load().await
    }

    /// Fetch all three feeds concurrently, tolerating partial failure
    pub async fn load_all(&self) -> FeedBatch {
        let (clients, accounts, agencies) = tokio::join!(
            self.clients.load(),
            self.accounts.load(),
            self.agencies.load()
        );

        FeedBatch {
            clients,
            accounts,
            agencies,
        }
    }

    /// One page of the roster. Only the clients feed is required.
    pub async fn list_clients(
        &self,
        store: &mut dyn SessionStore,
        search_text: Option<&str>,
        page: Option<i64>,
    ) -> FeedResult<ClientPage> {
        let clients = self.load_clients().await?;
        Ok(list_loaded(clients, store, search_text, page))
    }

    /// A client with its accounts and agency; `None` when the id is
    /// unknown. Every feed is required.
    pub async fn get_client_detail(&self, client_id: &str) -> FeedResult<Option<ClientDetail>> {
        let (clients, accounts, agencies) = self.load_all().await.require_all()?;
        Ok(resolve_detail(
            &clients,
            &accounts,
            &agencies,
            ClientKey::Id(client_id),
        ))
    }

    /// Client and account counts. The clients feed is required; a failed
    /// accounts feed degrades to zero account counts.
    pub async fn summary(&self) -> FeedResult<DashboardSummary> {
        let (clients, accounts) = tokio::join!(self.clients.load(), self.accounts.load());
        let clients = clients?;
        let accounts = or_empty(accounts);
        Ok(DashboardSummary::from_collections(&clients, &accounts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::FeedKind;
    use crate::error::FeedError;
    use crate::feed::MemoryFetcher;
    use crate::listing::{EmptyState, MemorySessionStore};

    const CLIENTS: &str = "mem://clientes";
    const ACCOUNTS: &str = "mem://contas";
    const AGENCIES: &str = "mem://agencias";

    const CLIENTS_CSV: &str = "\
id,cpfCnpj,rg,nome,nomeSocial,dataNascimento,estadoCivil,rendaAnual,patrimonio,codigoAgencia,email,endereco
1,123.456.789-00,,bruno,,1990-01-01,Solteiro,\"R$ 50.000,00\",10000,10,bruno@example.com,Rua A
2,987.654.321-00,,Ana,Aninha,1985-07-23,Casada,120000,\"R$ 1.500.000,00\",20,,Rua B
";

    const ACCOUNTS_CSV: &str = "\
id,cpfCnpjCliente,tipo,saldo,limiteCredito,creditoDisponivel
a1,123.456.789-00,corrente,\"R$ 1.234,56\",\"5.000,00\",\"4.000,00\"
a2,999,poupanca,10,0,0
a3,123.456.789-00,poupança,200,0,0
";

    const AGENCIES_CSV: &str = "\
id,codigo,nome,endereco
ag1,10,Centro,Av. Principal 1
ag2,10,Centro Duplicada,Outro lugar
ag3,20,Praia,Av. Beira Mar 2
";

    fn full_fetcher() -> MemoryFetcher {
        MemoryFetcher::new()
            .with_body(CLIENTS, CLIENTS_CSV)
            .with_body(ACCOUNTS, ACCOUNTS_CSV)
            .with_body(AGENCIES, AGENCIES_CSV)
    }

    fn directory(fetcher: MemoryFetcher) -> ClientDirectory {
        ClientDirectory::new(CLIENTS, ACCOUNTS, AGENCIES, Arc::new(fetcher))
    }

    #[tokio::test]
    async fn test_list_clients_sorted() {
        let dir = directory(full_fetcher());
        let mut store = MemorySessionStore::new();

        let page = dir.list_clients(&mut store, None, None).await.unwrap();
        let names: Vec<&str> = page.items.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Ana", "bruno"]);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.current_page, 1);
    }

    #[tokio::test]
    async fn test_list_clients_persists_search() {
        let dir = directory(full_fetcher());
        let mut store = MemorySessionStore::new();

        dir.list_clients(&mut store, Some("BRU"), None).await.unwrap();
        let page = dir.list_clients(&mut store, None, None).await.unwrap();

        assert_eq!(page.search_text, "BRU");
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, "1");
    }

    #[tokio::test]
    async fn test_list_clients_only_needs_clients_feed() {
        let fetcher = MemoryFetcher::new()
            .with_body(CLIENTS, CLIENTS_CSV)
            .with_failure(ACCOUNTS, "503")
            .with_failure(AGENCIES, "503");
        let dir = directory(fetcher);
        let mut store = MemorySessionStore::new();

        let page = dir.list_clients(&mut store, None, None).await.unwrap();
        assert_eq!(page.total_count, 2);
    }

    #[tokio::test]
    async fn test_list_clients_fails_without_clients_feed() {
        let fetcher = full_fetcher().with_failure(CLIENTS, "timeout");
        let dir = directory(fetcher);
        let mut store = MemorySessionStore::new();

        let err = dir.list_clients(&mut store, None, None).await.unwrap_err();
        assert_eq!(err.feed(), FeedKind::Clients);
    }

    #[tokio::test]
    async fn test_list_clients_empty_feed_reports_no_data() {
        let fetcher = full_fetcher().with_body(CLIENTS, "id,cpfCnpj,nome\n");
        let dir = directory(fetcher);
        let mut store = MemorySessionStore::new();

        let page = dir.list_clients(&mut store, None, None).await.unwrap();
        assert_eq!(page.empty_state, Some(EmptyState::NoData));
    }

    #[tokio::test]
    async fn test_get_client_detail_joins_all_feeds() {
        let dir = directory(full_fetcher());

        let detail = dir.get_client_detail("1").await.unwrap().unwrap();
        assert_eq!(detail.client.name, "bruno");
        assert_eq!(detail.client.annual_income, 50_000.0);

        let account_ids: Vec<&str> = detail.accounts.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(account_ids, vec!["a1", "a3"]);
        assert_eq!(detail.accounts[0].balance, 1234.56);

        let agency = detail.agency.unwrap();
        assert_eq!(agency.id, "ag1");
    }

    #[tokio::test]
    async fn test_get_client_detail_client_without_accounts() {
        let dir = directory(full_fetcher());

        let detail = dir.get_client_detail("2").await.unwrap().unwrap();
        assert!(detail.accounts.is_empty());
        assert_eq!(detail.client.net_worth, 1_500_000.0);
        assert_eq!(detail.agency.unwrap().name.as_deref(), Some("Praia"));
    }

    #[tokio::test]
    async fn test_get_client_detail_not_found() {
        let dir = directory(full_fetcher());
        assert!(dir.get_client_detail("42").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_client_detail_requires_every_feed() {
        let fetcher = full_fetcher().with_failure(AGENCIES, "connection refused");
        let dir = directory(fetcher);

        let err = dir.get_client_detail("1").await.unwrap_err();
        assert!(matches!(
            err,
            FeedError::Transport {
                feed: FeedKind::Agencies,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_get_client_detail_schema_failure_is_fatal() {
        let fetcher = full_fetcher().with_body(ACCOUNTS, "id,tipo\na1,corrente\n");
        let dir = directory(fetcher);

        let err = dir.get_client_detail("1").await.unwrap_err();
        assert!(err.is_schema_failure());
    }

    #[tokio::test]
    async fn test_load_all_tolerates_partial_failure() {
        let fetcher = full_fetcher().with_failure(ACCOUNTS, "503");
        let dir = directory(fetcher);

        let batch = dir.load_all().await;
        assert!(batch.clients.is_ok());
        assert!(batch.accounts.is_err());
        assert!(batch.agencies.is_ok());

        let (clients, accounts, agencies) = batch.degraded();
        assert_eq!(clients.len(), 2);
        assert!(accounts.is_empty());
        assert_eq!(agencies.len(), 3);
    }

    #[tokio::test]
    async fn test_summary_counts_account_types() {
        let dir = directory(full_fetcher());

        let summary = dir.summary().await.unwrap();
        assert_eq!(
            summary,
            DashboardSummary {
                total_clients: 2,
                checking_accounts: 1,
                savings_accounts: 2,
            }
        );
    }

    #[tokio::test]
    async fn test_summary_survives_accounts_failure() {
        let fetcher = full_fetcher().with_failure(ACCOUNTS, "503");
        let dir = directory(fetcher);

        let summary = dir.summary().await.unwrap();
        assert_eq!(summary.total_clients, 2);
        assert_eq!(summary.checking_accounts, 0);
        assert_eq!(summary.savings_accounts, 0);
    }

    #[tokio::test]
    async fn test_summary_requires_clients_feed() {
        let fetcher = full_fetcher().with_failure(CLIENTS, "503");
        let dir = directory(fetcher);

        let err = dir.summary().await.unwrap_err();
        assert_eq!(err.feed(), FeedKind::Clients);
    }
}
