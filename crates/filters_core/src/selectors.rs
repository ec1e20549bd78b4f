use std::time::Duration;

use scraper::Selector;

use crate::CoreError;

/// Quiet period applied to form input before a render is requested.
pub const SUBMIT_DEBOUNCE: Duration = Duration::from_millis(300);

/// CSS selectors for the regions the server-rendered page exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selectors {
    pub form_filters: &'static str,
    pub form_sort: &'static str,
    pub active_filters_container: &'static str,
    pub filter_item: &'static str,
    pub remove_filter_link: &'static str,
    pub products_container: &'static str,
}

pub const SELECTORS: Selectors = Selectors {
    form_filters: "form#collection-filters",
    form_sort: "form#collection-sort",
    active_filters_container: ".js-active-filters-container",
    filter_item: ".js-filter-item",
    remove_filter_link: ".js-remove-filter",
    products_container: ".js-products-container",
};

/// Parsed form of [`Selectors`], built once per page.
#[derive(Debug)]
pub struct CompiledSelectors {
    pub form_filters: Selector,
    pub form_sort: Selector,
    pub active_filters_container: Selector,
    pub filter_item: Selector,
    pub remove_filter_link: Selector,
    pub products_container: Selector,
    pub link: Selector,
}

impl CompiledSelectors {
    pub fn compile(table: &Selectors) -> Result<Self, CoreError> {
        Ok(Self {
            form_filters: parse(table.form_filters)?,
            form_sort: parse(table.form_sort)?,
            active_filters_container: parse(table.active_filters_container)?,
            filter_item: parse(table.filter_item)?,
            remove_filter_link: parse(table.remove_filter_link)?,
            products_container: parse(table.products_container)?,
            link: parse("a[href]")?,
        })
    }
}

fn parse(source: &str) -> Result<Selector, CoreError> {
    Selector::parse(source).map_err(|err| CoreError::InvalidSelector {
        selector: source.to_string(),
        message: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::{CompiledSelectors, Selectors, SELECTORS};
    use crate::CoreError;

    #[test]
    fn default_table_compiles() {
        assert!(CompiledSelectors::compile(&SELECTORS).is_ok());
    }

    #[test]
    fn broken_selector_is_reported() {
        let table = Selectors {
            filter_item: "..broken",
            ..SELECTORS
        };
        match CompiledSelectors::compile(&table) {
            Err(CoreError::InvalidSelector { selector, .. }) => assert_eq!(selector, "..broken"),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
