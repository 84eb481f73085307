//! Sibling listing, counting and pagination

use crate::error::StorageError;
use crate::model::ContentModel;
use crate::store::{Filter, Query, Row, Storage};
use crate::structure::StructureDescriptor;
use crate::types::{Context, ParentPointer};
use serde::Serialize;
use tracing::warn;

/// Default number of page links shown around the current page
pub const DEFAULT_PAGER_WINDOW: u32 = 10;

/// Derived page window of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ListingWindow {
    pub page_number: u32,
    pub page_size: u32,
    pub total_count: u64,
}

impl ListingWindow {
    pub fn page_count(&self) -> u32 {
        if self.page_size == 0 {
            return 0;
        }
        let pages = self.total_count.div_ceil(u64::from(self.page_size));
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    /// Whether the requested page lies past the last page of a non-empty listing
    pub fn is_out_of_range(&self) -> bool {
        self.total_count > 0 && self.page_number > self.page_count()
    }

    pub fn offset(&self) -> usize {
        self.page_number.saturating_sub(1) as usize * self.page_size as usize
    }
}

/// Link to one page of a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageLink {
    pub number: u32,
    pub link: String,
    pub current: bool,
}

/// Page links of a listing plus previous/next arrows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pager {
    pub pages: Vec<PageLink>,
    pub prev: Option<PageLink>,
    pub next: Option<PageLink>,
    pub total: u64,
    pub current: u32,
}

impl Pager {
    /// Compute the pager for `window`; `None` when the requested page is out of range.
    ///
    /// `base_query` is the request's query string without the page parameter; links append
    /// `param=<n>` to it.
    pub fn compute(
        window: ListingWindow,
        base_query: &str,
        param: &str,
        visible: u32,
    ) -> Option<Self> {
        if window.is_out_of_range() {
            return None;
        }
        let current = window.page_number.max(1);
        let last = window.page_count();
        let link = |number: u32| PageLink {
            number,
            link: page_link(base_query, param, number),
            current: number == current,
        };

        let visible = visible.max(1);
        let (first_shown, last_shown) = if last <= visible {
            (1, last)
        } else {
            let start = current
                .saturating_sub(visible / 2)
                .clamp(1, last - visible + 1);
            (start, start + visible - 1)
        };
        let pages = (first_shown..=last_shown).map(link).collect();
        let prev = (current > 1).then(|| link(current - 1));
        let next = (current < last).then(|| link(current + 1));

        Some(Self {
            pages,
            prev,
            next,
            total: window.total_count,
            current,
        })
    }
}

fn page_link(base_query: &str, param: &str, number: u32) -> String {
    if base_query.is_empty() {
        format!("?{}={}", param, number)
    } else {
        format!("?{}&{}={}", base_query, param, number)
    }
}

/// Listing queries over one structure's table
pub struct ListQuery<'a> {
    storage: &'a dyn Storage,
    descriptor: &'a StructureDescriptor,
    context: Context,
}

impl<'a> ListQuery<'a> {
    pub fn new(
        storage: &'a dyn Storage,
        descriptor: &'a StructureDescriptor,
        context: Context,
    ) -> Self {
        Self {
            storage,
            descriptor,
            context,
        }
    }

    /// Page size for the calling context
    pub fn page_size(&self) -> u32 {
        self.descriptor.params.page_size(self.context)
    }

    fn filter(pointer: Option<ParentPointer>, extra: Option<&Filter>) -> Filter {
        let base = pointer.map(Filter::parent).unwrap_or(Filter::All);
        match extra {
            Some(extra) => base.and(extra.clone()),
            None => base,
        }
    }

    /// Rows under `pointer`, in the structure's sort order; one page of them when `page`
    /// is given (page 0 counts as page 1)
    pub fn list(
        &self,
        pointer: Option<ParentPointer>,
        extra: Option<&Filter>,
        page: Option<u32>,
    ) -> Result<Vec<Row>, StorageError> {
        let mut query = Query::new(Self::filter(pointer, extra))
            .order_by(self.descriptor.params.order_by());
        if let Some(page) = page {
            let window = ListingWindow {
                page_number: page.max(1),
                page_size: self.page_size(),
                total_count: 0,
            };
            query = query.offset(window.offset()).limit(window.page_size as usize);
        }
        self.storage.query_rows(&self.descriptor.table, &query)
    }

    /// Number of rows under `pointer`, ignoring pagination
    pub fn count(
        &self,
        pointer: Option<ParentPointer>,
        extra: Option<&Filter>,
    ) -> Result<u64, StorageError> {
        self.storage
            .count(&self.descriptor.table, &Self::filter(pointer, extra))
    }

    /// Pager for the rows under `pointer`; `None` when `requested_page` is out of range
    pub fn paginate(
        &self,
        pointer: Option<ParentPointer>,
        extra: Option<&Filter>,
        page_size: u32,
        requested_page: u32,
        base_query: &str,
        param: &str,
        visible: u32,
    ) -> Result<Option<Pager>, StorageError> {
        let window = ListingWindow {
            page_number: requested_page.max(1),
            page_size,
            total_count: self.count(pointer, extra)?,
        };
        Ok(Pager::compute(window, base_query, param, visible))
    }
}

impl ContentModel {
    fn list_query<'s>(&'s self, storage: &'s dyn Storage) -> ListQuery<'s> {
        ListQuery::new(storage, self.descriptor(), self.context())
    }

    /// Children of this model, scoped by its parent pointer
    pub fn list(
        &self,
        storage: &dyn Storage,
        extra: Option<&Filter>,
        page: Option<u32>,
    ) -> Result<Vec<Row>, StorageError> {
        self.list_query(storage)
            .list(self.parent_pointer(), extra, page)
    }

    pub fn list_count(
        &self,
        storage: &dyn Storage,
        extra: Option<&Filter>,
    ) -> Result<u64, StorageError> {
        self.list_query(storage).count(self.parent_pointer(), extra)
    }

    /// Pager for this model's listing at `requested_page`.
    ///
    /// An out-of-range page flags the model as not found and yields `None`.
    pub fn pager(
        &mut self,
        storage: &dyn Storage,
        requested_page: u32,
        base_query: &str,
        param: &str,
        visible: u32,
    ) -> Result<Option<Pager>, StorageError> {
        let query = self.list_query(storage);
        let pager = query.paginate(
            self.parent_pointer(),
            None,
            query.page_size(),
            requested_page,
            base_query,
            param,
            visible,
        )?;
        if pager.is_none() {
            warn!(
                structure = %self.descriptor().name,
                page = requested_page,
                "Requested page is out of range"
            );
            self.mark_not_found();
        }
        Ok(pager)
    }
}
