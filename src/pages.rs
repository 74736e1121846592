// -------------------------
// HTML pages
// -------------------------

use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};

use crate::pipeline::{SearchOutcome, SearchQuery};
use crate::relevance::is_web_url;

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!doctype html>
<html lang="fr" class="dark">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>{title}</title>
  <script src="https://cdn.tailwindcss.com"></script>
</head>
<body class="bg-slate-900 text-slate-100 antialiased">
  <main class="max-w-5xl mx-auto p-6 flex flex-col gap-6">
{body}
  </main>
</body>
</html>
"#,
        title = text(title),
    )
}

pub fn index_page() -> String {
    let body = r#"
    <h1 class="text-3xl font-bold tracking-tight">pawnBot</h1>
    <form method="post" action="/shop"
          class="bg-slate-800 shadow-sm ring-1 ring-slate-700 rounded-xl p-4 grid grid-cols-1 md:grid-cols-4 gap-3 items-center">
      <label for="pn" class="text-sm font-medium text-slate-300">Product</label>
      <input id="pn" name="pn" type="text" placeholder="canape"
             class="md:col-span-3 rounded-lg bg-slate-900 px-2 py-1.5 text-sm">

      <label for="c" class="text-sm font-medium text-slate-300">City</label>
      <input id="c" name="c" type="text" placeholder="rabat"
             class="md:col-span-3 rounded-lg bg-slate-900 px-2 py-1.5 text-sm">

      <label for="mp" class="text-sm font-medium text-slate-300">Max price (DH)</label>
      <input id="mp" name="mp" type="number" min="1" placeholder="1000"
             class="md:col-span-3 rounded-lg bg-slate-900 px-2 py-1.5 text-sm">

      <label for="desc" class="text-sm font-medium text-slate-300">What are you looking for?</label>
      <textarea id="desc" name="desc" rows="4"
                class="md:col-span-3 rounded-lg bg-slate-900 px-2 py-1.5 text-sm"></textarea>

      <div class="md:col-span-4 flex justify-end">
        <button type="submit"
                class="px-3 py-1.5 text-sm rounded-md bg-indigo-600 text-white font-medium hover:bg-indigo-700">Search</button>
      </div>
    </form>"#;
    layout("pawnBot", body)
}

pub fn error_page(message: &str) -> String {
    let body = format!(
        r#"
    <h1 class="text-3xl font-bold tracking-tight">Something went wrong</h1>
    <p class="bg-red-900/40 ring-1 ring-red-700 rounded-xl p-4 text-sm">{}</p>
    <a class="text-indigo-400 hover:underline" href="/">Back</a>"#,
        text(message)
    );
    layout("pawnBot - error", &body)
}

pub fn listings_page(query: &SearchQuery, outcome: &SearchOutcome) -> String {
    let mut rows = String::new();
    for l in &outcome.listings {
        let image = match &l.image {
            Some(src) => format!(
                r#"<img class="h-20 w-28 object-cover rounded-md" src="{}" alt="">"#,
                attr(src)
            ),
            None => r#"<span class="text-slate-500">none</span>"#.to_string(),
        };
        // Only web urls become links; anything else shows as plain text.
        let link = if is_web_url(&l.url) {
            format!(
                r#"<a class="text-indigo-400 hover:underline" href="{}" target="_blank" rel="noopener noreferrer">open</a>"#,
                attr(&l.url)
            )
        } else {
            format!(r#"<span class="text-slate-500">{}</span>"#, text(&l.url))
        };
        rows.push_str(&format!(
            r#"
          <tr class="border-t border-slate-700 hover:bg-slate-700/50">
            <td class="px-3 py-2">{image}</td>
            <td class="px-3 py-2">{title}</td>
            <td class="px-3 py-2 tabular-nums">{price}</td>
            <td class="px-3 py-2">{link}</td>
          </tr>"#,
            title = text(&l.title),
            price = text(&l.price),
        ));
    }

    let summary = format!(
        "{} match(es) for \"{}\" in {} under {} DH, from {} listing(s) across {} page(s).",
        outcome.listings.len(),
        query.product,
        query.city,
        query.max_price,
        outcome.scanned,
        outcome.pages
    );

    let body = format!(
        r#"
    <h1 class="text-3xl font-bold tracking-tight">Listings</h1>
    <p class="text-sm text-slate-300">{summary}</p>
    <div class="bg-slate-800 shadow-sm ring-1 ring-slate-700 rounded-xl p-4">
      <table class="min-w-full text-sm">
        <thead class="bg-slate-700">
          <tr class="text-left text-slate-100">
            <th class="px-3 py-2 font-medium">Image</th>
            <th class="px-3 py-2 font-medium">Title</th>
            <th class="px-3 py-2 font-medium">Price</th>
            <th class="px-3 py-2 font-medium">URL</th>
          </tr>
        </thead>
        <tbody>{rows}
        </tbody>
      </table>
    </div>
    <a class="text-indigo-400 hover:underline" href="/">New search</a>"#,
        summary = text(&summary),
    );
    layout("pawnBot - listings", &body)
}
