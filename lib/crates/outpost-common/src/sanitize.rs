//! Scrubbing for externally supplied image references.

/// Remove the shell chaining characters `;`, `&` and `|` by deletion.
///
/// Inputs without any of the three come back unchanged. Escaping is not
/// attempted; the executor side never routes arguments through a shell,
/// this keeps the characters out of the argv entirely.
#[must_use]
pub fn sanitize_image_ref(image: &str) -> String {
    image
        .chars()
        .filter(|c| !matches!(c, ';' | '&' | '|'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_references_pass_through() {
        let reference = "registry.example.com:5000/team/app:1.2.3";
        assert_eq!(sanitize_image_ref(reference), reference);
    }

    #[test]
    fn chaining_characters_are_deleted_not_escaped() {
        assert_eq!(sanitize_image_ref("bad;rm -rf /"), "badrm -rf /");
        assert_eq!(sanitize_image_ref("a&&b"), "ab");
        assert_eq!(sanitize_image_ref("a|tee /tmp/x"), "atee /tmp/x");
    }

    #[test]
    fn empty_input_stays_empty() {
        assert_eq!(sanitize_image_ref(""), "");
    }
}
