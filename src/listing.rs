// 📋 Listing Engine - search, ordering and pagination over the client roster
//
// State: search text + current page (1-based), persisted through an
// injected `SessionStore` so they survive leaving and re-entering the
// list. Every change recomputes the filtered view:
//   1. clients sorted by name, case-insensitive, stable (feed order on ties)
//   2. filtered by case-insensitive substring on name or tax id
//   3. cut into pages of PAGE_SIZE
//
// Rules:
// - a new search always restarts at page 1
// - requested pages are clamped to [1, max(1, total_pages)]
// - a persisted page that no longer exists is clamped down on mount

use crate::entities::Client;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Clients per page
pub const PAGE_SIZE: usize = 10;

// ============================================================================
// PERSISTED STATE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingState {
    pub search_text: String,
    pub current_page: usize,
}

impl Default for ListingState {
    fn default() -> Self {
        ListingState {
            search_text: String::new(),
            current_page: 1,
        }
    }
}

impl ListingState {
    /// Pages below 1 (e.g. a hand-edited session file) restore as 1
    fn sanitized(mut self) -> Self {
        self.current_page = self.current_page.max(1);
        self
    }
}

/// SessionStore - where listing state lives between visits
///
/// The session boundary is owned by whoever creates the store; the engine
/// only loads on mount and saves on every change.
pub trait SessionStore: Send {
    fn load(&self) -> Result<Option<ListingState>>;
    fn save(&mut self, state: &ListingState) -> Result<()>;
    fn clear(&mut self) -> Result<()>;
}

/// Process-local store (server, tests)
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    state: Option<ListingState>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<ListingState>> {
        Ok(self.state.clone())
    }

    fn save(&mut self, state: &ListingState) -> Result<()> {
        self.state = Some(state.clone());
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.state = None;
        Ok(())
    }
}

/// JSON file store, so CLI invocations share one session
#[derive(Debug, Clone)]
pub struct JsonFileSessionStore {
    path: PathBuf,
}

impl JsonFileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileSessionStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for JsonFileSessionStore {
    fn load(&self) -> Result<Option<ListingState>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read session file: {}", self.path.display()))?;
        let state = serde_json::from_str(&text)
            .with_context(|| format!("Invalid session file: {}", self.path.display()))?;
        Ok(Some(state))
    }

    fn save(&mut self, state: &ListingState) -> Result<()> {
        let text = serde_json::to_string_pretty(state)?;
        fs::write(&self.path, text)
            .with_context(|| format!("Failed to write session file: {}", self.path.display()))
    }

    fn clear(&mut self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path).with_context(|| {
                format!("Failed to remove session file: {}", self.path.display())
            })?;
        }
        Ok(())
    }
}

// ============================================================================
// VIEW
// ============================================================================

/// Why a page has no items
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EmptyState {
    /// The feed itself has no clients
    NoData,
    /// Clients exist, but none match the search
    NoMatches { query: String },
}

/// One page of the roster
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientPage {
    pub items: Vec<Client>,
    pub total_pages: usize,
    pub current_page: usize,
    pub filtered_count: usize,
    pub total_count: usize,
    pub search_text: String,
    pub empty_state: Option<EmptyState>,
}

// ============================================================================
// ENGINE
// ============================================================================

pub struct ListingEngine<'s> {
    /// Sorted by name
    clients: Vec<Client>,
    /// Indices into `clients` matching the search
    filtered: Vec<usize>,
    state: ListingState,
    store: &'s mut dyn SessionStore,
}

impl<'s> ListingEngine<'s> {
    /// Take over a freshly loaded roster and restore the persisted state
    pub fn mount(clients: Vec<Client>, store: &'s mut dyn SessionStore) -> Self {
        let state = match store.load() {
            Ok(Some(state)) => state.sanitized(),
            Ok(None) => ListingState::default(),
            Err(e) => {
                log::warn!("Ignoring unreadable listing state: {:#}", e);
                ListingState::default()
            }
        };

        let mut engine = ListingEngine {
            clients: sort_by_name(clients),
            filtered: Vec::new(),
            state,
            store,
        };
        engine.recompute();
        engine
    }

    /// Persist the final state and hand it back
    pub fn unmount(mut self) -> ListingState {
        self.persist();
        self.state
    }

    pub fn state(&self) -> &ListingState {
        &self.state
    }

    pub fn set_search_text(&mut self, text: &str) {
        self.state.search_text = text.to_string();
        self.state.current_page = 1;
        self.recompute();
        self.persist();
    }

    /// Move to page `page`, clamped to the pages that exist
    pub fn set_page(&mut self, page: i64) {
        let max_page = self.total_pages().max(1);
        self.state.current_page = page.clamp(1, max_page as i64) as usize;
        self.persist();
    }

    /// Apply a consumer request. A changed search wins over the page
    /// number, since a new search always restarts at page 1.
    pub fn request(&mut self, search_text: Option<&str>, page: Option<i64>) -> ClientPage {
        match (search_text, page) {
            (Some(text), _) if text != self.state.search_text => self.set_search_text(text),
            (_, Some(page)) => self.set_page(page),
            _ => {}
        }
        self.page()
    }

    pub fn total_count(&self) -> usize {
        self.clients.len()
    }

    pub fn filtered_count(&self) -> usize {
        self.filtered.len()
    }

    pub fn total_pages(&self) -> usize {
        self.filtered.len().div_ceil(PAGE_SIZE)
    }

    /// Filtered clients in display order
    pub fn filtered(&self) -> impl Iterator<Item = &Client> + '_ {
        let clients = &self.clients;
        self.filtered.iter().map(move |&i| &clients[i])
    }

    /// The page actually shown. A restored page is kept in the state while
    /// the roster is empty, but the window never points past the last page.
    pub fn visible_page(&self) -> usize {
        self.state.current_page.clamp(1, self.total_pages().max(1))
    }

    /// The current page window
    pub fn page(&self) -> ClientPage {
        let current_page = self.visible_page();
        let start = (current_page - 1).saturating_mul(PAGE_SIZE);
        let items: Vec<Client> = self
            .filtered()
            .skip(start)
            .take(PAGE_SIZE)
            .cloned()
            .collect();

        let empty_state = if self.clients.is_empty() {
            Some(EmptyState::NoData)
        } else if self.filtered.is_empty() {
            Some(EmptyState::NoMatches {
                query: self.state.search_text.clone(),
            })
        } else {
            None
        };

        ClientPage {
            items,
            total_pages: self.total_pages(),
            current_page,
            filtered_count: self.filtered_count(),
            total_count: self.total_count(),
            search_text: self.state.search_text.clone(),
            empty_state,
        }
    }

    fn recompute(&mut self) {
        let needle = self.state.search_text.to_lowercase();
        self.filtered = self
            .clients
            .iter()
            .enumerate()
            .filter(|(_, client)| matches_search(client, &needle))
            .map(|(i, _)| i)
            .collect();

        // An empty roster means nothing was loaded; keep the persisted page
        if self.clients.is_empty() {
            return;
        }

        let max_page = self.total_pages().max(1);
        if self.state.current_page > max_page {
            log::debug!(
                "Listing page {} no longer exists, clamping to {}",
                self.state.current_page,
                max_page
            );
            self.state.current_page = max_page;
            self.persist();
        }
    }

    fn persist(&mut self) {
        // Write failures only cost the user their place in the list
        if let Err(e) = self.store.save(&self.state) {
            log::warn!("Failed to persist listing state: {:#}", e);
        }
    }
}

/// Stable, case-insensitive sort by legal name
pub fn sort_by_name(mut clients: Vec<Client>) -> Vec<Client> {
    clients.sort_by_cached_key(|client| client.name.to_lowercase());
    clients
}

/// Case-insensitive substring match on name or tax id; `needle` must
/// already be lowercase. An empty needle matches everyone.
pub fn matches_search(client: &Client, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }

    client.name.to_lowercase().contains(needle)
        || client
            .tax_id
            .as_deref()
            .is_some_and(|tax_id| tax_id.to_lowercase().contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::{FeedRecord, RawRow};

    fn client(id: &str, name: &str, tax_id: &str) -> Client {
        Client::from_row(
            &RawRow::new(2)
                .with("id", id)
                .with("nome", name)
                .with("cpfCnpj", tax_id),
        )
    }

    fn roster(count: usize) -> Vec<Client> {
        (0..count)
            .map(|i| client(&i.to_string(), &format!("Cliente {:02}", i), &format!("{:011}", i)))
            .collect()
    }

    fn names(page: &ClientPage) -> Vec<&str> {
        page.items.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_sorted_case_insensitively() {
        let mut store = MemorySessionStore::new();
        let clients = vec![client("1", "bruno", "2"), client("2", "Ana", "1")];
        let engine = ListingEngine::mount(clients, &mut store);

        assert_eq!(names(&engine.page()), vec!["Ana", "bruno"]);
    }

    #[test]
    fn test_sort_is_stable_on_equal_names() {
        let clients = vec![
            client("first", "ana", "1"),
            client("x", "Carla", "2"),
            client("second", "ANA", "3"),
        ];
        let sorted = sort_by_name(clients);
        let ids: Vec<&str> = sorted.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "x"]);
    }

    #[test]
    fn test_missing_names_sort_first() {
        let clients = vec![client("1", "Bia", "1"), client("2", "", "2")];
        let sorted = sort_by_name(clients);
        assert_eq!(sorted[0].id, "2");
    }

    #[test]
    fn test_search_by_name_substring_case_insensitive() {
        let mut store = MemorySessionStore::new();
        let clients = vec![
            client("1", "Ana Souza", "111"),
            client("2", "Bruno Lima", "222"),
            client("3", "Mariana", "333"),
        ];
        let mut engine = ListingEngine::mount(clients, &mut store);

        engine.set_search_text("ANA");
        assert_eq!(names(&engine.page()), vec!["Ana Souza", "Mariana"]);
    }

    #[test]
    fn test_search_by_tax_id_substring() {
        let mut store = MemorySessionStore::new();
        let clients = vec![
            client("1", "Ana", "123.456.789-00"),
            client("2", "Bruno", "987.654.321-00"),
        ];
        let mut engine = ListingEngine::mount(clients, &mut store);

        engine.set_search_text("456.789");
        assert_eq!(names(&engine.page()), vec!["Ana"]);

        // substring, not prefix
        engine.set_search_text("321-00");
        assert_eq!(names(&engine.page()), vec!["Bruno"]);
    }

    #[test]
    fn test_pagination_windows() {
        let mut store = MemorySessionStore::new();
        let mut engine = ListingEngine::mount(roster(25), &mut store);

        assert_eq!(engine.total_pages(), 3);
        assert_eq!(engine.page().items.len(), 10);

        engine.set_page(3);
        let page = engine.page();
        assert_eq!(page.items.len(), 5);
        assert_eq!(page.items[0].name, "Cliente 20");
    }

    #[test]
    fn test_set_page_clamps() {
        let mut store = MemorySessionStore::new();
        let mut engine = ListingEngine::mount(roster(25), &mut store);

        engine.set_page(5);
        assert_eq!(engine.state().current_page, 3);

        engine.set_page(0);
        assert_eq!(engine.state().current_page, 1);

        engine.set_page(-4);
        assert_eq!(engine.state().current_page, 1);
    }

    #[test]
    fn test_set_page_is_idempotent() {
        let mut store = MemorySessionStore::new();
        let mut engine = ListingEngine::mount(roster(25), &mut store);

        for n in [-1, 0, 1, 2, 3, 4, 100] {
            engine.set_page(n);
            let once = engine.state().clone();
            engine.set_page(once.current_page as i64);
            assert_eq!(engine.state(), &once);
        }
    }

    #[test]
    fn test_search_resets_page() {
        let mut store = MemorySessionStore::new();
        let mut engine = ListingEngine::mount(roster(25), &mut store);

        engine.set_page(3);
        engine.set_search_text("Cliente");
        assert_eq!(engine.state().current_page, 1);

        engine.set_page(2);
        engine.set_search_text("Cliente");
        assert_eq!(engine.state().current_page, 1);
    }

    #[test]
    fn test_state_survives_remount() {
        let mut store = MemorySessionStore::new();
        {
            let mut engine = ListingEngine::mount(roster(25), &mut store);
            engine.set_search_text("cliente");
            engine.set_page(2);
            engine.unmount();
        }

        let engine = ListingEngine::mount(roster(25), &mut store);
        assert_eq!(engine.state().search_text, "cliente");
        assert_eq!(engine.state().current_page, 2);
    }

    #[test]
    fn test_persisted_page_clamped_down_when_roster_shrinks() {
        let mut store = MemorySessionStore::new();
        store
            .save(&ListingState {
                search_text: String::new(),
                current_page: 3,
            })
            .unwrap();

        let engine = ListingEngine::mount(roster(15), &mut store);
        assert_eq!(engine.state().current_page, 2);
        assert_eq!(store.load().unwrap().unwrap().current_page, 2);
    }

    #[test]
    fn test_persisted_page_kept_while_roster_empty() {
        let mut store = MemorySessionStore::new();
        store
            .save(&ListingState {
                search_text: String::new(),
                current_page: 3,
            })
            .unwrap();

        let engine = ListingEngine::mount(Vec::new(), &mut store);
        assert_eq!(engine.state().current_page, 3);

        let page = engine.page();
        assert!(page.items.is_empty());
        assert_eq!(page.current_page, 1);
        assert_eq!(page.total_pages, 0);
    }

    #[test]
    fn test_huge_persisted_page_on_empty_roster() {
        let mut store = MemorySessionStore::new();
        store
            .save(&ListingState {
                search_text: String::new(),
                current_page: usize::MAX,
            })
            .unwrap();

        let mut engine = ListingEngine::mount(Vec::new(), &mut store);
        let page = engine.request(None, None);
        assert!(page.items.is_empty());
        assert_eq!(page.current_page, 1);
        assert_eq!(page.empty_state, Some(EmptyState::NoData));
        assert_eq!(engine.state().current_page, usize::MAX);
    }

    #[test]
    fn test_filtered_follows_display_order() {
        let mut store = MemorySessionStore::new();
        let mut engine = ListingEngine::mount(roster(12), &mut store);
        engine.set_search_text("cliente 1");

        let ids: Vec<&str> = engine.filtered().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["10", "11"]);
    }

    #[test]
    fn test_persisted_page_zero_restores_as_one() {
        let mut store = MemorySessionStore::new();
        store
            .save(&ListingState {
                search_text: "x".to_string(),
                current_page: 0,
            })
            .unwrap();

        let engine = ListingEngine::mount(roster(5), &mut store);
        assert_eq!(engine.state().current_page, 1);
    }

    #[test]
    fn test_empty_states_are_distinct() {
        let mut store = MemorySessionStore::new();
        let engine = ListingEngine::mount(Vec::new(), &mut store);
        assert_eq!(engine.page().empty_state, Some(EmptyState::NoData));
        drop(engine);

        let mut engine = ListingEngine::mount(roster(3), &mut store);
        engine.set_search_text("zzz");
        assert_eq!(
            engine.page().empty_state,
            Some(EmptyState::NoMatches {
                query: "zzz".to_string()
            })
        );

        engine.set_search_text("");
        assert_eq!(engine.page().empty_state, None);
    }

    #[test]
    fn test_request_search_wins_over_page() {
        let mut store = MemorySessionStore::new();
        let mut engine = ListingEngine::mount(roster(25), &mut store);

        let page = engine.request(None, Some(2));
        assert_eq!(page.current_page, 2);

        let page = engine.request(Some("Cliente 1"), Some(3));
        assert_eq!(page.current_page, 1);
        assert_eq!(page.filtered_count, 10);

        // Same search again: the page request applies
        let page = engine.request(Some("Cliente"), Some(3));
        assert_eq!(page.current_page, 1);
        let page = engine.request(Some("Cliente"), Some(3));
        assert_eq!(page.current_page, 3);
    }

    #[test]
    fn test_json_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileSessionStore::new(dir.path().join("session.json"));

        assert_eq!(store.load().unwrap(), None);

        let state = ListingState {
            search_text: "ana".to_string(),
            current_page: 4,
        };
        store.save(&state).unwrap();
        assert_eq!(store.load().unwrap(), Some(state));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
        assert!(!store.path().exists());
    }

    #[test]
    fn test_unreadable_session_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "not json").unwrap();

        let mut store = JsonFileSessionStore::new(&path);
        assert!(store.load().is_err());

        let engine = ListingEngine::mount(roster(3), &mut store);
        assert_eq!(engine.state(), &ListingState::default());
    }
}
