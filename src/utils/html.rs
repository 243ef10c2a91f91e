use std::fmt::Display;

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE HTML>\n<html>\n\t<head>\n\t\t<meta charset=\"UTF-8\" />\n\t\t<title>{}</title>\n\t\t<link rel=\"stylesheet\" type=\"text/css\" href=\"style/screen.css\" />\n\t</head>\n\t<body>\n{}\t</body>\n</html>\n",
        escape(title),
        body
    )
}

pub fn header_row(out: &mut String, columns: &[(&str, &str)]) {
    out.push_str("\t\t\t<tr>\n");
    for (title, label) in columns {
        out.push_str(&format!("\t\t\t\t<th title=\"{}\">{}</th>\n", escape(title), escape(label)));
    }
    out.push_str("\t\t\t</tr>\n");
}

pub fn cell(out: &mut String, value: impl Display) {
    out.push_str(&format!("\t\t\t\t<td>{}</td>\n", escape(&value.to_string())));
}

pub fn classed_cell(out: &mut String, class: &str, value: impl Display) {
    out.push_str(&format!(
        "\t\t\t\t<td class=\"{}\">{}</td>\n",
        escape(class),
        escape(&value.to_string())
    ));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(escape("<a href='x'>&\"</a>"), "&lt;a href=&#039;x&#039;&gt;&amp;&quot;&lt;/a&gt;");
    }

    #[test]
    fn cells_are_escaped() {
        let mut out = String::new();
        cell(&mut out, "<script>");
        classed_cell(&mut out, "player_winner", 3);
        assert!(out.contains("<td>&lt;script&gt;</td>"));
        assert!(out.contains("<td class=\"player_winner\">3</td>"));
    }
}
