use std::borrow::Cow;

/// Make a single path component safe on common file systems.
#[must_use]
pub fn filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let trimmed = replaced.trim().trim_end_matches('.');
    match trimmed {
        "" | "." | ".." => "_".to_string(),
        s => s.to_string(),
    }
}

/// XML name usable as an `id` attribute. The label is kept verbatim elsewhere.
#[must_use]
pub fn svg_id(label: &str) -> String {
    let mut id: String = label
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if !id.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
        id.insert(0, '_');
    }
    id
}

/// Label text for a DXF `999` comment, which must stay on one line.
#[must_use]
pub fn dxf_comment(label: &str) -> String {
    label
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

#[must_use]
pub fn xml_escape(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folder_names_lose_path_separators() {
        assert_eq!(filename("Plywood 18mm - 2440 x 1220"), "Plywood 18mm - 2440 x 1220");
        assert_eq!(filename("MDF 3/4\" - 8' x 4'"), "MDF 3_4_ - 8' x 4'");
        assert_eq!(filename("  a:b*c?  "), "a_b_c_");
        assert_eq!(filename("..."), "_");
    }

    #[test]
    fn ids_keep_only_name_characters() {
        assert_eq!(svg_id("Leg A/B"), "Leg_A_B");
        assert_eq!(svg_id("12"), "_12");
        assert_eq!(svg_id("x = 1.5"), "x___1.5");
        assert_eq!(svg_id(""), "_");
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(xml_escape("Leg A/B"), "Leg A/B");
        assert_eq!(xml_escape("a<b & \"c\""), "a&lt;b &amp; &quot;c&quot;");
    }

    #[test]
    fn comments_stay_on_one_line() {
        assert_eq!(dxf_comment("a\nb\r\nc"), "a b  c");
    }
}
