//! Filesystem-safe name handling.

/// Sanitizes a spider name into a module-safe directory name.
///
/// Non-alphanumeric characters become underscores; a leading digit gets an
/// underscore prefix.
pub fn sanitize_spider_name(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    if out.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_separators() {
        assert_eq!(sanitize_spider_name("quotes-spider"), "quotes_spider");
        assert_eq!(sanitize_spider_name("shop.de"), "shop_de");
        assert_eq!(sanitize_spider_name("my spider"), "my_spider");
    }

    #[test]
    fn prefixes_leading_digit() {
        assert_eq!(sanitize_spider_name("7days"), "_7days");
    }

    #[test]
    fn clean_names_pass_through() {
        assert_eq!(sanitize_spider_name("quotes"), "quotes");
    }
}
