//! Type identifier utilities
//!
//! Item types are strings of the form `<namespace>/<subpath>`; link types join two item
//! types with `::`. Parsing here never rejects malformed input — downstream lookup
//! surfaces a "provider not found" error instead (see [`crate::error::Error`]).

/// Returns the namespace segment of an item type: the substring before the first `/`.
///
/// If `item_type` contains no `/`, the whole string is returned as the namespace.
#[must_use]
pub fn extract_namespace(item_type: &str) -> &str {
    match item_type.split_once('/') {
        Some((namespace, _rest)) => namespace,
        None => item_type,
    }
}

/// Splits a link type `"<typeA>::<typeB>"` into its ordered pair of item types.
///
/// Splits on the first `::`. If no `::` is present, `type_b` is empty — callers that need
/// to reject malformed link types should do so themselves; this function only parses.
#[must_use]
pub fn split_link_type(link_type: &str) -> (&str, &str) {
    match link_type.split_once("::") {
        Some((type_a, type_b)) => (type_a, type_b),
        None => (link_type, ""),
    }
}

/// Builds the canonical `linkId` string `"<typeA>::<typeB>"` for an ordered resource type
/// pair. This key is order-sensitive: `link_id("A", "B") != link_id("B", "A")`.
#[must_use]
pub fn link_id(type_a: &str, type_b: &str) -> String {
    format!("{type_a}::{type_b}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_namespace_from_simple_item_type() {
        assert_eq!(extract_namespace("aws/s3_bucket"), "aws");
    }

    #[test]
    fn extracts_namespace_from_nested_path() {
        assert_eq!(extract_namespace("foo/bar/baz"), "foo");
    }

    #[test]
    fn extract_namespace_without_separator_returns_whole_string() {
        assert_eq!(extract_namespace("noslash"), "noslash");
    }

    #[test]
    fn splits_link_type_on_first_double_colon() {
        assert_eq!(
            split_link_type("aws/lambda::aws/sqs_queue"),
            ("aws/lambda", "aws/sqs_queue")
        );
    }

    #[test]
    fn split_link_type_without_separator_yields_empty_b() {
        assert_eq!(split_link_type("aws/lambda"), ("aws/lambda", ""));
    }

    #[test]
    fn link_id_is_order_sensitive() {
        assert_eq!(link_id("A", "B"), "A::B");
        assert_ne!(link_id("A", "B"), link_id("B", "A"));
    }
}
