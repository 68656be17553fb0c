/// Returns the first balanced `{...}` or `[...]` substring of `text`.
///
/// Brackets inside JSON string literals are skipped, so a reply like
/// `Sure! {"action": "request_info", "parameter": "a}b"}` still yields the
/// whole object. Unbalanced text yields `None`.
pub fn first_json_fragment(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let mut search_from = 0;

    while let Some(offset) = text[search_from..].find(['{', '[']) {
        let start = search_from + offset;
        if let Some(end) = balanced_end(bytes, start) {
            return Some(&text[start..=end]);
        }
        search_from = start + 1;
    }
    None
}

fn balanced_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut stack: Vec<u8> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => stack.push(b'}'),
            b'[' => stack.push(b']'),
            b'}' | b']' => {
                if stack.pop() != Some(b) {
                    return None;
                }
                if stack.is_empty() {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}
