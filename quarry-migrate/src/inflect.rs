//! Table-name inflection.

/// Pluralize an English noun.
///
/// Only the last `_`-separated word is inflected, so `line_item` becomes
/// `line_items`.
///
/// ```rust
/// use quarry_migrate::inflect::pluralize;
///
/// assert_eq!(pluralize("user"), "users");
/// assert_eq!(pluralize("category"), "categories");
/// assert_eq!(pluralize("address"), "addresses");
/// assert_eq!(pluralize("person"), "people");
/// ```
pub fn pluralize(word: &str) -> String {
    let (prefix, last) = match word.rfind('_') {
        Some(i) => word.split_at(i + 1),
        None => ("", word),
    };
    if last.is_empty() {
        return word.to_string();
    }
    format!("{}{}", prefix, pluralizer::pluralize(last, 2, false))
}

/// Convert a CamelCase constant name to snake_case.
///
/// ```rust
/// use quarry_migrate::inflect::snake_case;
///
/// assert_eq!(snake_case("AdminUser"), "admin_user");
/// assert_eq!(snake_case("HTTPRequest"), "http_request");
/// ```
pub fn snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c == ':' {
            continue;
        }
        if c.is_ascii_uppercase() {
            let prev_lower = i > 0 && (chars[i - 1].is_ascii_lowercase() || chars[i - 1].is_ascii_digit());
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            let prev_upper = i > 0 && chars[i - 1].is_ascii_uppercase();
            if !out.is_empty() && !out.ends_with('_') && (prev_lower || (prev_upper && next_lower)) {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Table name for a model constant: pluralized snake_case.
///
/// Namespaced constants (`Admin::User`) use their last segment.
pub fn tableize(model: &str) -> String {
    let last = model.rsplit("::").next().unwrap_or(model);
    pluralize(&snake_case(last))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pluralize_rules() {
        assert_eq!(pluralize("post"), "posts");
        assert_eq!(pluralize("day"), "days");
        assert_eq!(pluralize("box"), "boxes");
        assert_eq!(pluralize("match"), "matches");
        assert_eq!(pluralize("knife"), "knives");
        assert_eq!(pluralize("leaf"), "leaves");
        assert_eq!(pluralize("sheep"), "sheep");
        assert_eq!(pluralize("line_item"), "line_items");
        assert_eq!(pluralize("sales_person"), "sales_people");
    }

    #[test]
    fn test_tableize() {
        assert_eq!(tableize("User"), "users");
        assert_eq!(tableize("AdminUser"), "admin_users");
        assert_eq!(tableize("Blog::Category"), "categories");
    }
}
