//! Minimal HTML extraction for the session table, replay links and result icons.
//!
//! All tag searches run on an ASCII-lowercased copy of the page, which keeps
//! byte offsets identical to the page text so slices can be taken from either.

/// Cells of every row of the first `<table>` on the page, header row included
pub fn first_table_rows(html: &str) -> Vec<Vec<String>> {
    let lower = html.to_ascii_lowercase();
    let Some(start) = lower.find("<table") else {
        return Vec::new();
    };
    let end = find_from(&lower, "</table>", start).unwrap_or(html.len());

    let mut rows = Vec::new();
    let mut pos = start;
    while let Some(tr) = find_from(&lower, "<tr", pos).filter(|&i| i < end) {
        let close = find_from(&lower, "</tr>", tr).filter(|&i| i < end).unwrap_or(end);
        // An unclosed row ends where the next one starts
        let row_end = find_from(&lower, "<tr", tr + 3).filter(|&i| i < close).unwrap_or(close);
        rows.push(row_cells(&html[tr..row_end], &lower[tr..row_end]));
        pos = row_end;
    }
    rows
}

fn row_cells(row: &str, row_lower: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut pos = 0;
    while let Some(td) = find_from(row_lower, "<td", pos) {
        let Some(open_end) = find_from(row_lower, ">", td) else {
            break;
        };
        let content_start = open_end + 1;
        let close = find_from(row_lower, "</td>", content_start).unwrap_or(row.len());
        let content_end = find_from(row_lower, "<td", content_start)
            .filter(|&i| i < close)
            .unwrap_or(close);
        cells.push(cell_text(&row[content_start..content_end]));
        pos = content_end;
    }
    cells
}

/// Visible text of a fragment: tags dropped, common entities decoded,
/// whitespace collapsed
pub fn cell_text(fragment: &str) -> String {
    let mut text = String::with_capacity(fragment.len());
    let mut in_tag = false;
    for c in fragment.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    let decoded = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `href` targets of every anchor on the page, in document order
pub fn anchor_hrefs(html: &str) -> Vec<String> {
    tag_attributes(html, "a", "href")
}

/// `src` of every image on the page, in document order
pub fn img_srcs(html: &str) -> Vec<String> {
    tag_attributes(html, "img", "src")
}

fn tag_attributes(html: &str, tag: &str, name: &str) -> Vec<String> {
    let lower = html.to_ascii_lowercase();
    let open = format!("<{}", tag);
    let mut values = Vec::new();
    let mut pos = 0;
    while let Some(start) = find_from(&lower, &open, pos) {
        let tag_end = find_from(&lower, ">", start).unwrap_or(html.len());
        pos = tag_end;
        // Skip <abbr>, <article> and friends
        if !lower[start + open.len()..].starts_with(|c: char| c.is_ascii_whitespace()) {
            continue;
        }
        if let Some(value) = attribute_value(&html[start..tag_end], &lower[start..tag_end], name) {
            values.push(value);
        }
    }
    values
}

fn attribute_value(tag: &str, tag_lower: &str, name: &str) -> Option<String> {
    let needle = format!("{}=", name);
    let at = tag_lower.find(&needle)?;
    let rest = &tag[at + needle.len()..];
    let value = match rest.chars().next()? {
        quote @ ('"' | '\'') => {
            let inner = &rest[1..];
            &inner[..inner.find(quote)?]
        }
        _ => rest
            .split(|c: char| c.is_ascii_whitespace() || c == '>')
            .next()
            .unwrap_or(""),
    };
    let value = value.replace("&amp;", "&");
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn find_from(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    haystack.get(from..)?.find(needle).map(|i| i + from)
}
