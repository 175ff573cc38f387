//! Code fence language aliases
//!
//! Maps the token after `language-` on a code block to a grammar name in the
//! [`GrammarRegistry`](super::GrammarRegistry).

/// Normalized alias -> grammar name
const ALIASES: &[(&str, &str)] = &[
    // Rust
    ("rs", "rust"),
    // Python
    ("py", "python"),
    ("python3", "python"),
    ("py3", "python"),
    ("gyp", "python"),
    // JavaScript
    ("js", "javascript"),
    ("jsx", "javascript"),
    ("mjs", "javascript"),
    ("cjs", "javascript"),
    ("node", "javascript"),
    ("ecmascript", "javascript"),
    // Go
    ("golang", "go"),
    // C / C++
    ("h", "c"),
    ("cpp", "cpp"),
    ("cc", "cpp"),
    ("cxx", "cpp"),
    ("hpp", "cpp"),
    ("hh", "cpp"),
    ("hxx", "cpp"),
    ("cplusplus", "cpp"),
    // Java
    ("jsp", "java"),
    // PHP
    ("php3", "php"),
    ("php4", "php"),
    ("php5", "php"),
    ("php7", "php"),
    ("php8", "php"),
    // Shell
    ("sh", "bash"),
    ("shell", "bash"),
    ("shellsession", "bash"),
    ("zsh", "bash"),
    ("console", "bash"),
    // Lisps
    ("racket", "scheme"),
    ("rkt", "scheme"),
    ("scm", "scheme"),
    // INI
    ("toml", "ini"),
    ("cfg", "ini"),
    ("conf", "ini"),
    ("properties", "ini"),
    // XML
    ("xhtml", "xml"),
    ("htm", "xml"),
    ("svg", "xml"),
    ("rss", "xml"),
    ("atom", "xml"),
    ("plist", "xml"),
    ("xsl", "xml"),
];

/// Canonical form of a fence token.
///
/// Lowercased and trimmed, the first `++` becomes `pp`, every `#` becomes
/// `sharp`, and `-`, `_` and whitespace are removed: `C++` -> `cpp`,
/// `F#` -> `fsharp`, `Objective-C` -> `objectivec`.
pub fn normalize_alias(token: &str) -> String {
    token
        .trim()
        .to_lowercase()
        .replacen("++", "pp", 1)
        .replace('#', "sharp")
        .chars()
        .filter(|c| !matches!(c, '-' | '_') && !c.is_whitespace())
        .collect()
}

/// Grammar name for a fence token.
///
/// Unknown aliases resolve to themselves; the registry decides whether such a
/// grammar exists. Empty tokens resolve to nothing.
pub fn resolve_grammar(token: &str) -> Option<String> {
    let key = normalize_alias(token);
    if key.is_empty() {
        return None;
    }

    if let Some((_, grammar)) = ALIASES.iter().find(|(alias, _)| *alias == key) {
        return Some((*grammar).to_string());
    }
    if key == "html" {
        return Some("xml".to_string());
    }
    Some(key)
}

/// Language token from a class list (`language-<token>`)
pub fn language_token<'a>(classes: &'a [String]) -> Option<&'a str> {
    classes
        .iter()
        .find_map(|class| class.strip_prefix("language-"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_alias() {
        assert_eq!(normalize_alias("  C++ "), "cpp");
        assert_eq!(normalize_alias("F#"), "fsharp");
        assert_eq!(normalize_alias("C#"), "csharp");
        assert_eq!(normalize_alias("Objective-C"), "objectivec");
        assert_eq!(normalize_alias("shell_session"), "shellsession");
        assert_eq!(normalize_alias("x++y++"), "xppy++");
    }

    #[test]
    fn test_resolve_grammar() {
        assert_eq!(resolve_grammar("rs").as_deref(), Some("rust"));
        assert_eq!(resolve_grammar("C++").as_deref(), Some("cpp"));
        assert_eq!(resolve_grammar("Shell").as_deref(), Some("bash"));
        assert_eq!(resolve_grammar("HTML").as_deref(), Some("xml"));
        assert_eq!(resolve_grammar("brainfuck").as_deref(), Some("brainfuck"));
        assert_eq!(resolve_grammar("  "), None);
        assert_eq!(resolve_grammar(""), None);
    }

    #[test]
    fn test_language_token_uses_first_language_class() {
        let classes = vec![
            "hljs".to_string(),
            "language-py".to_string(),
            "language-rs".to_string(),
        ];
        assert_eq!(language_token(&classes), Some("py"));
        assert_eq!(language_token(&["plain".to_string()]), None);
    }
}
