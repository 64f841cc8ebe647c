use ammonia;

/// Clean user-supplied content using the ammonia library.
///
/// Whitelist-based sanitization: safe tags (like <b>, <p>) survive,
/// dangerous tags (<script>, <iframe>) and attributes (onclick) are
/// stripped. Applied once at write time to post and comment content.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
