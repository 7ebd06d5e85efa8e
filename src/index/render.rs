use std::collections::BTreeSet;

use super::IndexEntry;

/// Page skeleton; `{body}` is replaced by one anchor line per entry.
pub const HTML_TEMPLATE: &str = "<!DOCTYPE html>\n<html>\n<body>\n{body}\n</body>\n</html>\n";

/// Renders entries as a PEP 503 page.
///
/// Entries are sorted and deduplicated here, so the output depends only on
/// the set of entries and never on the order they were collected in.
pub fn render_page<'a>(entries: impl IntoIterator<Item = &'a IndexEntry>) -> String {
    let entries: BTreeSet<&IndexEntry> = entries.into_iter().collect();
    let body = entries
        .into_iter()
        .map(render_line)
        .collect::<Vec<_>>()
        .join("\n");
    HTML_TEMPLATE.replace("{body}", &body)
}

fn render_line(entry: &IndexEntry) -> String {
    format!("<a href='{}'>{}</a><br>", entry.href(), entry.name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_package_listing() {
        let entries = [IndexEntry::directory("zlib"), IndexEntry::directory("abseil")];

        assert_eq!(
            render_page(&entries),
            "<!DOCTYPE html>\n<html>\n<body>\n\
             <a href='abseil/'>abseil</a><br>\n\
             <a href='zlib/'>zlib</a><br>\n\
             </body>\n</html>\n"
        );
    }

    #[test]
    fn test_render_wheel_links() {
        let entries = [IndexEntry::link(
            "mypkg-1.0+cu128.torch27-py3-none-any.whl",
            "https://x/mypkg.whl#sha256=abc",
        )];

        let html = render_page(&entries);
        assert!(html.contains(
            "<a href='https://x/mypkg.whl#sha256=abc'>mypkg-1.0+cu128.torch27-py3-none-any.whl</a><br>"
        ));
    }

    #[test]
    fn test_render_deduplicates() {
        let entry = IndexEntry::link("a.whl", "https://x/a.whl");
        let entries = [entry.clone(), entry.clone(), entry];

        let html = render_page(&entries);
        assert_eq!(html.matches("<a href=").count(), 1);
    }

    #[test]
    fn test_render_is_order_independent() {
        let forward = [
            IndexEntry::link("a.whl", "https://x/1"),
            IndexEntry::link("b.whl", "https://x/2"),
            IndexEntry::directory("c"),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();

        assert_eq!(render_page(&forward), render_page(&reversed));
    }

    #[test]
    fn test_render_empty_page() {
        let entries: [IndexEntry; 0] = [];
        assert_eq!(
            render_page(&entries),
            "<!DOCTYPE html>\n<html>\n<body>\n\n</body>\n</html>\n"
        );
    }
}
