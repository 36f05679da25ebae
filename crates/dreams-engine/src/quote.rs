use std::borrow::Cow;

/// Delimiter around a quoted message.
pub const QUOTE_FENCE: &str = "\"\"\"";

/// One level of quote nesting.
pub const QUOTE_INDENT: &str = "    ";

/// Body of a share: the sharer's text, then the source wrapped in fences.
/// A source that is itself a share has its quoted part pushed one level deeper.
pub fn compose_share(extra: &str, source_body: &str, source_was_shared: bool) -> String {
    let quoted = if source_was_shared {
        Cow::Owned(indent_nested(source_body))
    } else {
        Cow::Borrowed(source_body)
    };
    format!("{extra}\n\n{QUOTE_FENCE}\n{quoted}\n{QUOTE_FENCE}")
}

/// Indent every line break from two characters before the first fence onwards,
/// which is the blank separator line a share puts ahead of its quote. Without a
/// fence (an edited share) the whole body is indented.
pub fn indent_nested(body: &str) -> String {
    let fence = body.find(QUOTE_FENCE).unwrap_or(0);
    let mut split = fence.saturating_sub(2);
    while !body.is_char_boundary(split) {
        split += 1;
    }
    let (head, tail) = body.split_at(split);
    let indented = tail.replace('\n', &format!("\n{QUOTE_INDENT}"));
    format!("{head}{indented}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_source_is_quoted_verbatim() {
        assert_eq!(compose_share("X", "Hello", false), "X\n\n\"\"\"\nHello\n\"\"\"");
    }

    #[test]
    fn shared_source_nests_one_level() {
        let first = compose_share("X", "Hello", false);
        assert_eq!(
            compose_share("Y", &first, true),
            "Y\n\n\"\"\"\nX\n    \n    \"\"\"\n    Hello\n    \"\"\"\n\"\"\""
        );
    }

    #[test]
    fn three_levels_deep() {
        let first = compose_share("Shared Message 1", "Hello", false);
        let second = compose_share("Shared Message 2", &first, true);
        let third = compose_share("Shared Message 3", &second, true);
        assert_eq!(
            third,
            "Shared Message 3\n\n\"\"\"\nShared Message 2\n    \n    \"\"\"\n    Shared Message 1\n        \n        \"\"\"\n        Hello\n        \"\"\"\n    \"\"\"\n\"\"\""
        );
    }

    #[test]
    fn empty_extra_text_nests_from_the_start() {
        let first = compose_share("", "Hello", false);
        assert_eq!(first, "\n\n\"\"\"\nHello\n\"\"\"");
        let second = compose_share("", &first, true);
        assert_eq!(second, "\n\n\"\"\"\n\n    \n    \"\"\"\n    Hello\n    \"\"\"\n\"\"\"");
        let third = compose_share("Hi", &second, true);
        assert_eq!(
            third,
            "Hi\n\n\"\"\"\n\n    \n    \"\"\"\n    \n        \n        \"\"\"\n        Hello\n        \"\"\"\n    \"\"\"\n\"\"\""
        );
    }

    #[test]
    fn fenceless_body_is_indented_throughout() {
        assert_eq!(indent_nested("a\nb"), "a\n    b");
    }
}
