use std::sync::LazyLock;

use ammonia::Builder;

static PLAIN_TEXT: LazyLock<Builder<'static>> = LazyLock::new(Builder::empty);

/// Clean a bio shown on the public page.
///
/// Safe inline tags survive; `<script>`, `<iframe>` and event-handler
/// attributes are stripped.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

/// Link titles render as plain text, so every tag goes.
pub fn clean_text(input: &str) -> String {
    PLAIN_TEXT.clean(input).to_string()
}
