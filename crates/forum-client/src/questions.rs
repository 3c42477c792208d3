//! Controller behind the home view: a page of questions, a local search box,
//! and prev/next navigation.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;
use tracing::{debug, warn};

use forum_types::models::Question;

use crate::error::ApiError;
use crate::pagination::{PageWindow, group_pairs};
use crate::session::Session;

/// Case-insensitive substring match on title or description. An empty query
/// keeps everything.
pub fn filter_questions(items: &[Question], query: &str) -> Vec<Question> {
    let query = query.trim().to_lowercase();
    items
        .iter()
        .filter(|q| {
            query.is_empty()
                || q.title.to_lowercase().contains(&query)
                || q.description.to_lowercase().contains(&query)
        })
        .cloned()
        .collect()
}

/// Whether a finished fetch was applied or dropped because a newer one started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    Superseded,
}

/// Render-ready snapshot of the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListView {
    pub rows: Vec<Vec<Question>>,
    pub page: u32,
    pub total_pages: u32,
    pub has_prev: bool,
    pub has_next: bool,
    pub loading: bool,
    pub error: Option<String>,
    /// Nothing to show: render "No Questions Found".
    pub is_empty: bool,
}

#[derive(Debug, Clone)]
struct ListState {
    items: Vec<Question>,
    server: PageWindow,
    query: String,
    filter_page: u32,
    loading: bool,
    error: Option<String>,
}

#[derive(Clone)]
pub struct QuestionList {
    inner: Arc<ListInner>,
}

struct ListInner {
    session: Session,
    latest: AtomicU64,
    state: RwLock<ListState>,
}

impl QuestionList {
    pub fn new(session: Session, page_size: u32) -> Self {
        Self {
            inner: Arc::new(ListInner {
                session,
                latest: AtomicU64::new(0),
                state: RwLock::new(ListState {
                    items: Vec::new(),
                    server: PageWindow::new(page_size),
                    query: String::new(),
                    filter_page: 1,
                    loading: false,
                    error: None,
                }),
            }),
        }
    }

    /// Fetch one backend page. If another load starts before this one
    /// finishes, this one's result is dropped. The previous items survive a
    /// failure; only the error message changes. A page past the end lands on
    /// the last page.
    pub async fn load(&self, page: u32) -> Result<LoadOutcome, ApiError> {
        let seq = self.inner.latest.fetch_add(1, Ordering::SeqCst) + 1;
        let size = {
            let mut state = self.inner.state.write().await;
            state.loading = true;
            state.server.size()
        };

        let api = self.inner.session.api();
        let mut page = page;
        let mut result = api.list_questions(page, size).await;
        // The last page can vanish between requests; show the new last page
        // rather than an empty one.
        let past_end = match &result {
            Ok(resp) if resp.total_pages >= 1 && page > resp.total_pages => Some(resp.total_pages),
            _ => None,
        };
        if let Some(last) = past_end {
            debug!("Page {} is past the last page {}, reloading", page, last);
            page = last;
            result = api.list_questions(page, size).await;
        }

        let mut state = self.inner.state.write().await;
        if self.inner.latest.load(Ordering::SeqCst) != seq {
            debug!("Dropping superseded question page {}", page);
            return Ok(LoadOutcome::Superseded);
        }
        state.loading = false;

        match result {
            Ok(resp) => {
                state.server.set_total_pages(resp.total_pages);
                state.server.set_page(page);
                state.items = resp.data;
                state.error = None;
                state.filter_page = 1;
                Ok(LoadOutcome::Applied)
            }
            Err(e) => {
                warn!("Error fetching questions: {}", e);
                state.error = Some(e.user_message());
                drop(state);
                self.inner.session.absorb(&e).await;
                Err(e)
            }
        }
    }

    pub async fn refresh(&self) -> Result<LoadOutcome, ApiError> {
        let page = self.inner.state.read().await.server.page();
        self.load(page).await
    }

    /// Change the search text. Always returns to the first page, since the
    /// filtered set may have fewer pages than the one being viewed.
    pub async fn set_query(&self, query: &str) {
        let mut state = self.inner.state.write().await;
        if state.query != query {
            state.query = query.to_string();
            state.filter_page = 1;
        }
    }

    /// Move forward one page. Returns `Ok(false)` at the last page.
    pub async fn next(&self) -> Result<bool, ApiError> {
        self.step(true).await
    }

    /// Move back one page. Returns `Ok(false)` at the first page.
    pub async fn prev(&self) -> Result<bool, ApiError> {
        self.step(false).await
    }

    async fn step(&self, forward: bool) -> Result<bool, ApiError> {
        let target = {
            let mut state = self.inner.state.write().await;
            if state.query.trim().is_empty() {
                let window = state.server;
                if forward { window.next_page() } else { window.prev_page() }
            } else {
                // Searching pages locally over what is loaded.
                let mut window = filtered_window(&state);
                let moved = if forward { window.next() } else { window.prev() };
                state.filter_page = window.page();
                return Ok(moved);
            }
        };

        match target {
            Some(page) => self.load(page).await.map(|_| true),
            None => Ok(false),
        }
    }

    pub async fn view(&self) -> ListView {
        let state = self.inner.state.read().await;

        let (visible, window) = if state.query.trim().is_empty() {
            (state.items.clone(), state.server)
        } else {
            let filtered = filter_questions(&state.items, &state.query);
            let window = filtered_window(&state);
            (window.slice(&filtered).to_vec(), window)
        };

        ListView {
            rows: group_pairs(&visible).into_iter().map(<[Question]>::to_vec).collect(),
            page: window.page(),
            total_pages: window.total_pages(),
            has_prev: window.has_prev(),
            has_next: window.has_next(),
            loading: state.loading,
            error: state.error.clone(),
            is_empty: visible.is_empty(),
        }
    }
}

fn filtered_window(state: &ListState) -> PageWindow {
    let count = filter_questions(&state.items, &state.query).len();
    let mut window = PageWindow::for_count(count, state.server.size());
    window.set_page(state.filter_page);
    window
}
