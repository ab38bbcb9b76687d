use regex::Regex;

/// Compiles a bypass-list wildcard into an anchored regex. `*` matches any
/// substring, every other character is literal.
pub fn compile_wildcard(pattern: &str) -> Result<Regex, regex::Error> {
    compile(pattern, false)
}

/// Same as [`compile_wildcard`], but `?` additionally matches exactly one
/// character, as in the PAC `shExpMatch` function.
pub fn compile_shell_expr(pattern: &str) -> Result<Regex, regex::Error> {
    compile(pattern, true)
}

fn compile(pattern: &str, single_char: bool) -> Result<Regex, regex::Error> {
    let mut expr = String::with_capacity(pattern.len() * 2 + 2);
    expr.push('^');
    let mut literal = String::new();
    for ch in pattern.chars() {
        match ch {
            '*' => {
                expr.push_str(&regex::escape(&literal));
                literal.clear();
                expr.push_str(".*");
            }
            '?' if single_char => {
                expr.push_str(&regex::escape(&literal));
                literal.clear();
                expr.push('.');
            }
            c => literal.push(c),
        }
    }
    expr.push_str(&regex::escape(&literal));
    expr.push('$');
    Regex::new(&expr)
}

#[test]
fn test_wildcard() {
    let re = compile_wildcard("no_proxy*").unwrap();
    assert!(re.is_match("no_proxy.unit-test.invalid"));
    assert!(re.is_match("no_proxy"));
    assert!(!re.is_match("other.invalid"));
    // full match only
    assert!(!re.is_match("a.no_proxy"));

    let re = compile_wildcard("*.unit-test.invalid").unwrap();
    assert!(re.is_match("no_proxy.unit-test.invalid"));
    assert!(!re.is_match("unit-test.invalid"));
    assert!(!re.is_match("test.no-host.invalid"));

    // regex metacharacters stay literal
    let re = compile_wildcard("a+b.(c)").unwrap();
    assert!(re.is_match("a+b.(c)"));
    assert!(!re.is_match("aab.(c)"));
    assert!(!re.is_match("a+bx(c)"));

    let re = compile_wildcard("a?b").unwrap();
    assert!(re.is_match("a?b"));
    assert!(!re.is_match("axb"));
}

#[test]
fn test_shell_expr() {
    let re = compile_shell_expr("*.example.???").unwrap();
    assert!(re.is_match("www.example.com"));
    assert!(!re.is_match("www.example.co"));
    let re = compile_shell_expr("http://*/index.html").unwrap();
    assert!(re.is_match("http://host/index.html"));
    assert!(!re.is_match("https://host/index.html"));
}
