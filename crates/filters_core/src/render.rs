use ego_tree::NodeId;
use filters_logging::filters_trace;
use scraper::Selector;

use crate::dom::{Fragment, LiveDocument};

/// Replaces the live element matching `selector` with the fragment's copy of it.
///
/// Returns `false` without touching the document when either side is missing.
pub fn render_element(
    document: &mut LiveDocument,
    fragment: Option<&Fragment>,
    selector: &Selector,
) -> bool {
    let Some(fragment) = fragment else {
        return false;
    };
    let (Some(target), Some(content)) = (
        document.query_selector(selector),
        fragment.select_first(selector),
    ) else {
        return false;
    };
    document.replace_children(target, content);
    true
}

/// Re-renders every filter item of the fragment except the one the user is
/// interacting with, matched by DOM id. Returns the number of items swapped.
pub fn render_filters(
    document: &mut LiveDocument,
    fragment: Option<&Fragment>,
    filter_item: &Selector,
    trigger: Option<NodeId>,
) -> usize {
    let Some(fragment) = fragment else {
        return 0;
    };
    let active_id: Option<String> = trigger
        .and_then(|target| document.closest(target, filter_item))
        .map(|item| document.dom_id(item).unwrap_or_default().to_string());

    let mut rendered = 0;
    for item in fragment.select_all(filter_item) {
        let id = item.value().id().unwrap_or_default();
        if active_id.as_deref() == Some(id) {
            filters_trace!("keeping filter item {id:?} the user is interacting with");
            continue;
        }
        if let Some(target) = document.get_element_by_id(id) {
            document.replace_children(target, item);
            rendered += 1;
        }
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::{render_element, render_filters};
    use crate::dom::{Fragment, LiveDocument};
    use scraper::Selector;

    fn sel(s: &str) -> Selector {
        Selector::parse(s).unwrap()
    }

    #[test]
    fn missing_side_leaves_document_unchanged() {
        let mut doc = LiveDocument::parse(r#"<div class="a">old</div>"#);
        let before = doc.html();

        let fragment = Fragment::parse(r#"<div class="b">new</div>"#);
        assert!(!render_element(&mut doc, Some(&fragment), &sel(".a")));
        assert!(!render_element(&mut doc, Some(&fragment), &sel(".b")));
        assert!(!render_element(&mut doc, None, &sel(".a")));
        assert_eq!(doc.html(), before);
    }

    #[test]
    fn present_on_both_sides_copies_inner_content() {
        let mut doc = LiveDocument::parse(r#"<div class="a" data-x="1">old</div>"#);
        let fragment = Fragment::parse(r#"<div class="a" data-x="2"><b>new</b></div>"#);
        assert!(render_element(&mut doc, Some(&fragment), &sel(".a")));
        let node = doc.query_selector(&sel(".a")).unwrap();
        assert_eq!(doc.inner_html(node).unwrap(), "<b>new</b>");
        assert_eq!(doc.attr(node, "data-x"), Some("1"));
    }

    #[test]
    fn filters_without_trigger_render_all_known_items() {
        let mut doc = LiveDocument::parse(
            r#"<div class="f" id="a">a0</div><div class="f" id="b">b0</div>"#,
        );
        let fragment = Fragment::parse(
            r#"<div class="f" id="a">a1</div><div class="f" id="b">b1</div><div class="f" id="c">c1</div>"#,
        );
        assert_eq!(render_filters(&mut doc, Some(&fragment), &sel(".f"), None), 2);
        assert_eq!(doc.inner_html(doc.get_element_by_id("a").unwrap()).unwrap(), "a1");
        assert_eq!(doc.inner_html(doc.get_element_by_id("b").unwrap()).unwrap(), "b1");
        assert!(doc.get_element_by_id("c").is_none());
    }
}
