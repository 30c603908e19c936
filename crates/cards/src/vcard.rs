//! vCard 3.0 (RFC 2426) rendering of a business card.
//!
//! Only the properties a card carries are written: `FN`, `N`, `TEL`, `EMAIL`,
//! `ORG` and `TITLE`. Text values are escaped, and content lines longer than
//! 75 octets are folded with CRLF followed by a space.

use crate::Card;

const MAX_LINE_OCTETS: usize = 75;

/// Render `card` as a complete `BEGIN:VCARD` .. `END:VCARD` object.
pub fn render(card: &Card) -> String {
    let display_name = card.display_name.trim();
    let mut lines = vec![
        "BEGIN:VCARD".to_string(),
        "VERSION:3.0".to_string(),
        format!("FN:{}", escape(display_name)),
        format!("N:{}", structured_name(display_name)),
    ];
    if !card.phone.is_empty() {
        lines.push(format!("TEL;TYPE=WORK:{}", escape(&card.phone)));
    }
    if !card.mobile.is_empty() {
        lines.push(format!("TEL;TYPE=CELL:{}", escape(&card.mobile)));
    }
    if !card.email.is_empty() {
        lines.push(format!("EMAIL:{}", escape(&card.email)));
    }
    lines.push(format!(
        "ORG:{};{}",
        escape(&card.company.name),
        escape(&card.department.name)
    ));
    if !card.position.name.is_empty() {
        lines.push(format!("TITLE:{}", escape(&card.position.name)));
    }
    lines.push("END:VCARD".to_string());

    let mut out = String::new();
    for line in &lines {
        fold_into(&mut out, line);
    }
    out
}

/// `N` is `family;given;additional;prefix;suffix`.
///
/// "Given Family" and "Prefix Given Family" are split; any other shape keeps
/// the whole name as the family name.
fn structured_name(display_name: &str) -> String {
    let parts: Vec<&str> = display_name.split_whitespace().collect();
    match parts.as_slice() {
        [given, family] => format!("{};{};;;", escape(family), escape(given)),
        [prefix, given, family] => {
            format!("{};{};;{};", escape(family), escape(given), escape(prefix))
        }
        _ => format!("{};;;;", escape(display_name)),
    }
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            _ => out.push(c),
        }
    }
    out
}

fn fold_into(out: &mut String, line: &str) {
    let mut width = 0;
    for c in line.chars() {
        if width + c.len_utf8() > MAX_LINE_OCTETS {
            out.push_str("\r\n ");
            // The leading space counts towards the continuation line.
            width = 1;
        }
        out.push(c);
        width += c.len_utf8();
    }
    out.push_str("\r\n");
}
