/// Characters dropped outright instead of becoming a separator.
const STRIPPED: &[char] = &['*', '+', '~', '.', '(', ')', '\'', '"', '!', ':', '@'];

/// URL-friendly slug: lowercase ASCII letters and digits joined by single dashes.
///
/// `&` reads as "and", accented letters are transliterated and any other ASCII
/// punctuation is removed without leaving a separator behind.
pub fn generate_slug(text: &str) -> String {
    let mut spelled = String::with_capacity(text.len());

    for c in text.chars().filter(|c| !STRIPPED.contains(c)) {
        match c {
            '&' => spelled.push_str("and"),
            '-' => spelled.push(' '),
            c if c.is_ascii_alphanumeric() || c.is_whitespace() || !c.is_ascii() => {
                spelled.push(c)
            }
            _ => {}
        }
    }

    slug::slugify(spelled)
}
