//! HTML rendering for the tracker pages.
//!
//! Every value interpolated into markup goes through [`escape_html`].

use salvo::http::StatusCode;

use crate::tracker::IndexView;

pub const COLOR_CHOICES: [&str; 10] = [
    "red", "orange", "yellow", "olive", "green", "teal", "blue", "violet", "purple", "pink",
];

const STYLESHEET: &str = "/static/styles/main.css";

pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn layout(title: &str, head_extra: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<link rel="stylesheet" href="{STYLESHEET}">
{head_extra}</head>
<body>
{body}
</body>
</html>
"#,
        title = escape_html(title),
    )
}

pub fn index_page(view: &IndexView) -> String {
    let color = escape_html(&view.current.color);
    let style = format!(
        "<style>\n.visited [data-code] {{ fill: {color}; background-color: {color}; }}\n</style>\n"
    );

    let codes = view
        .countries
        .iter()
        .map(|code| escape_html(code))
        .collect::<Vec<_>>()
        .join(",");

    let mut visited = String::new();
    for code in &view.countries {
        let code = escape_html(code);
        visited.push_str(&format!(
            "    <li class=\"country\" data-code=\"{code}\">{code}</li>\n"
        ));
    }

    let mut tabs = String::new();
    for user in &view.users {
        let class = if user.id == view.current.id {
            "tab current"
        } else {
            "tab"
        };
        tabs.push_str(&format!(
            "    <button type=\"submit\" name=\"user\" value=\"{id}\" class=\"{class}\" style=\"background-color: {color}\">{name}</button>\n",
            id = user.id,
            color = escape_html(&user.color),
            name = escape_html(&user.name),
        ));
    }

    let body = format!(
        r#"<main>
<section class="map" data-countries="{codes}" data-color="{color}">
  <ul class="visited">
{visited}  </ul>
</section>
<h2 class="total-count">Total Countries: {total}</h2>
<form class="tabs" action="/user" method="post">
{tabs}    <button type="submit" name="add" value="new" id="tab">Add Family Member</button>
</form>
<form class="add-country" action="/add" method="post">
  <input type="text" name="country" placeholder="Enter country name" autofocus>
  <button type="submit">Add</button>
</form>
</main>"#,
        total = view.total,
    );

    layout("Family Travel Tracker", &style, &body)
}

pub fn new_user_page() -> String {
    let mut colors = String::new();
    for color in COLOR_CHOICES {
        colors.push_str(&format!(
            "    <input type=\"radio\" name=\"color\" id=\"{color}\" value=\"{color}\" required>\n    <label for=\"{color}\" style=\"background-color: {color}\"></label>\n"
        ));
    }

    let body = format!(
        r#"<main>
<h1>Add a new family member</h1>
<form class="new-user" action="/new" method="post">
  <input type="text" name="name" placeholder="Enter your name" maxlength="64" required autofocus>
  <div class="colors">
{colors}  </div>
  <button type="submit">Add</button>
</form>
</main>"#
    );

    layout("Add Family Member", "", &body)
}

pub fn error_page(status: StatusCode, message: &str) -> String {
    let heading = format!(
        "{} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Error")
    );
    let body = format!(
        r#"<main class="error">
<h1>{heading}</h1>
<p>{message}</p>
<a href="/">Back to the map</a>
</main>"#,
        heading = escape_html(&heading),
        message = escape_html(message),
    );

    layout(&heading, "", &body)
}
