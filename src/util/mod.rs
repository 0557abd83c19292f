pub(crate) fn now_ms() -> i64 {
    js_sys::Date::now().round() as i64
}

/// Footer label under the editor, e.g. "12 palavras · 87 caracteres".
pub(crate) fn count_label(words: usize, chars: usize) -> String {
    let word_label = if words == 1 { "palavra" } else { "palavras" };
    let char_label = if chars == 1 { "caractere" } else { "caracteres" };
    format!("{} {} · {} {}", words, word_label, chars, char_label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_label_pluralizes() {
        assert_eq!(count_label(1, 1), "1 palavra · 1 caractere");
        assert_eq!(count_label(2, 10), "2 palavras · 10 caracteres");
    }
}
