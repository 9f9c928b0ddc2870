/// Форматирует число с разделителями тысяч (точками): `1234567` → `1.234.567`
pub fn format_number(n: usize) -> String {
    let digits = n.to_string();
    let head = digits.len() % 3;

    let mut groups: Vec<&str> = Vec::new();
    if head > 0 {
        groups.push(&digits[..head]);
    }
    let mut start = head;
    while start < digits.len() {
        groups.push(&digits[start..start + 3]);
        start += 3;
    }
    groups.join(".")
}
