//! Small helpers for the few HTML pages the service renders

/// Escape text for use inside element content or a quoted attribute
pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Branded standalone page. `content` is inserted as-is; escape dynamic parts first.
pub fn render_page(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="zh-TW">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>{title} - Campus Nerds</title>
  <style>
    body {{
      font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
      background: linear-gradient(135deg, #1a1a2e 0%, #16213e 100%);
      color: #e0e0e0;
      min-height: 100vh;
      margin: 0;
      padding: 20px;
      display: flex;
      justify-content: center;
      align-items: center;
    }}
    .container {{
      background: rgba(255, 255, 255, 0.05);
      border-radius: 16px;
      padding: 40px;
      max-width: 500px;
      width: 100%;
      box-shadow: 0 8px 32px rgba(0, 0, 0, 0.3);
      border: 1px solid rgba(255, 255, 255, 0.1);
    }}
    h1 {{ color: #fff; margin-top: 0; font-size: 24px; }}
    .logo {{ font-size: 32px; margin-bottom: 20px; }}
    .content {{ line-height: 1.8; color: #b0b0b0; }}
  </style>
</head>
<body>
  <div class="container">
    <div class="logo">📚 Campus Nerds</div>
    <h1>{title}</h1>
    <div class="content">{content}</div>
  </div>
</body>
</html>"#,
        title = escape_html(title),
        content = content
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
        );
        assert_eq!(escape_html("確認碼 CN_1"), "確認碼 CN_1");
    }

    #[test]
    fn test_render_page_escapes_title_only() {
        let page = render_page("<T>", "<br>");
        assert!(page.contains("<h1>&lt;T&gt;</h1>"));
        assert!(page.contains(r#"<div class="content"><br></div>"#));
    }
}
