//! Server-rendered HTML pages.
//!
//! Every page is built from the same document the JSON encoding serves, so
//! both encodings always agree.

use serde_json::Value;

use features_protocol::{
    Collection, CollectionList, ConformanceClasses, Feature, FeatureCollection, LandingPage, Link,
};

const STYLE: &str = "body{font-family:sans-serif;margin:2em auto;max-width:960px;padding:0 1em;color:#222}\
table{border-collapse:collapse;width:100%;margin:1em 0}\
th,td{border:1px solid #ccc;padding:.3em .6em;text-align:left;vertical-align:top}\
th{background:#f3f3f3}code,pre{background:#f6f6f6;padding:.1em .3em}\
pre{white-space:pre-wrap;padding:.6em}nav a{margin-right:1em}";

/// Escape text for use in element content and quoted attributes.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, nav: &[(&str, &str)], body: &str) -> String {
    let nav_html: String = nav
        .iter()
        .map(|(href, label)| format!("<a href=\"{}\">{}</a>", escape(href), escape(label)))
        .collect();
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n\
         <nav>{nav_html}</nav>\n<h1>{title}</h1>\n{body}\n</body>\n</html>\n",
        title = escape(title),
    )
}

fn links_table(links: &[Link]) -> String {
    let rows: String = links
        .iter()
        .map(|link| {
            format!(
                "<tr><td>{}</td><td><a href=\"{}\">{}</a></td><td>{}</td></tr>",
                escape(&link.rel),
                escape(&link.href),
                escape(link.title.as_deref().unwrap_or(&link.href)),
                escape(link.type_.as_deref().unwrap_or("")),
            )
        })
        .collect();
    format!(
        "<h2>Links</h2>\n<table><tr><th>Relation</th><th>Link</th><th>Type</th></tr>{}</table>",
        rows
    )
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Href of the first link with `rel`.
fn href_of<'a>(links: &'a [Link], rel: &str) -> Option<&'a str> {
    links.iter().find(|l| l.rel == rel).map(|l| l.href.as_str())
}

/// Landing page.
pub fn landing(page: &LandingPage, api_base: &str) -> String {
    let mut body = String::new();
    if let Some(description) = &page.description {
        body.push_str(&format!("<p>{}</p>\n", escape(description)));
    }
    body.push_str(&links_table(&page.links));
    layout(&page.title, &nav(api_base), &body)
}

/// Conformance declaration.
pub fn conformance(classes: &ConformanceClasses, api_base: &str) -> String {
    let items: String = classes
        .conforms_to
        .iter()
        .map(|c| format!("<li><a href=\"{0}\">{0}</a></li>", escape(c)))
        .collect();
    layout(
        "Conformance",
        &nav(api_base),
        &format!("<p>This server implements:</p>\n<ul>{}</ul>", items),
    )
}

/// List of collections.
pub fn collections(list: &CollectionList, api_base: &str) -> String {
    let base = api_base.trim_end_matches('/');
    let rows: String = list
        .collections
        .iter()
        .map(|c| {
            format!(
                "<tr><td><a href=\"{base}/collections/{id}?f=html\">{title}</a></td><td>{desc}</td>\
                 <td><a href=\"{base}/collections/{id}/items?f=html\">Items</a></td></tr>",
                base = escape(base),
                id = escape(&c.id),
                title = escape(c.title.as_deref().unwrap_or(&c.id)),
                desc = escape(c.description.as_deref().unwrap_or("")),
            )
        })
        .collect();

    let crs: String = list
        .crs
        .iter()
        .map(|c| format!("<li><code>{}</code></li>", escape(c)))
        .collect();

    let body = format!(
        "<table><tr><th>Collection</th><th>Description</th><th></th></tr>{}</table>\n\
         <h2>Supported by every collection</h2>\n<ul>{}</ul>",
        rows, crs
    );
    layout("Collections", &nav(api_base), &body)
}

/// One collection's metadata.
pub fn collection(c: &Collection, api_base: &str) -> String {
    let mut body = String::new();
    if let Some(description) = &c.description {
        body.push_str(&format!("<p>{}</p>\n", escape(description)));
    }

    body.push_str("<table>");
    body.push_str(&format!("<tr><th>Id</th><td>{}</td></tr>", escape(&c.id)));
    if let Some(storage) = &c.storage_crs {
        body.push_str(&format!("<tr><th>Storage CRS</th><td><code>{}</code></td></tr>", escape(storage)));
    }
    if let Some(epoch) = c.storage_crs_coordinate_epoch {
        body.push_str(&format!("<tr><th>Coordinate epoch</th><td>{}</td></tr>", epoch));
    }
    if let Some(spatial) = c.extent.as_ref().and_then(|e| e.spatial.as_ref()) {
        let boxes: Vec<String> = spatial
            .bbox
            .iter()
            .map(|b| b.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", "))
            .collect();
        body.push_str(&format!(
            "<tr><th>Bounding box</th><td>{}</td></tr>",
            escape(&boxes.join(" / "))
        ));
    }
    if let Some(temporal) = c.extent.as_ref().and_then(|e| e.temporal.as_ref()) {
        for [start, end] in &temporal.interval {
            body.push_str(&format!(
                "<tr><th>Time interval</th><td>{} / {}</td></tr>",
                escape(start.as_deref().unwrap_or("..")),
                escape(end.as_deref().unwrap_or("..")),
            ));
        }
    }
    let crs: String = c.crs.iter().map(|v| format!("<code>{}</code><br>", escape(v))).collect();
    body.push_str(&format!("<tr><th>CRS</th><td>{}</td></tr></table>\n", crs));

    body.push_str(&links_table(&c.links));
    layout(c.title.as_deref().unwrap_or(&c.id), &nav(api_base), &body)
}

/// A page of features. `items_href` is the items URL without query.
pub fn items(
    collection_title: &str,
    collection_id: &str,
    items_href: &str,
    page: &FeatureCollection,
    api_base: &str,
) -> String {
    let mut columns: Vec<&str> = Vec::new();
    for feature in &page.features {
        for key in feature.properties.keys() {
            if !columns.contains(&key.as_str()) {
                columns.push(key);
            }
        }
    }

    let header: String = columns.iter().map(|c| format!("<th>{}</th>", escape(c))).collect();
    let rows: String = page
        .features
        .iter()
        .map(|feature| {
            let id = feature.id.as_ref().map(value_text).unwrap_or_default();
            let cells: String = columns
                .iter()
                .map(|c| {
                    let text = feature.properties.get(*c).map(value_text).unwrap_or_default();
                    format!("<td>{}</td>", escape(&text))
                })
                .collect();
            format!(
                "<tr><td><a href=\"{}/{}?f=html\">{}</a></td>{}</tr>",
                escape(items_href),
                escape(&id),
                escape(&id),
                cells
            )
        })
        .collect();

    let mut pager = String::new();
    if let Some(prev) = href_of(&page.links, "prev") {
        pager.push_str(&format!("<a href=\"{}\">Previous</a> ", escape(prev)));
    }
    if let Some(next) = href_of(&page.links, "next") {
        pager.push_str(&format!("<a href=\"{}\">Next</a>", escape(next)));
    }

    let body = format!(
        "<p>Showing {} of {} matching features.</p>\n\
         <table><tr><th>Id</th>{}</tr>{}</table>\n<p>{}</p>",
        page.number_returned, page.number_matched, header, rows, pager
    );

    let collection_href = format!("{}/collections/{}?f=html", api_base.trim_end_matches('/'), collection_id);
    let mut nav = nav(api_base);
    nav.push((collection_href.as_str(), collection_title));
    layout(&format!("{} - Items", collection_title), &nav, &body)
}

/// A single feature. `crs_wkt` is shown below the geometry when known.
pub fn feature(
    collection_title: &str,
    collection_id: &str,
    feature: &Feature,
    crs: &str,
    crs_wkt: Option<&str>,
    api_base: &str,
) -> String {
    let id = feature.id.as_ref().map(value_text).unwrap_or_default();
    let rows: String = feature
        .properties
        .iter()
        .map(|(k, v)| format!("<tr><th>{}</th><td>{}</td></tr>", escape(k), escape(&value_text(v))))
        .collect();

    let geometry = match &feature.geometry {
        Some(g) => serde_json::to_string_pretty(g).unwrap_or_default(),
        None => "null".to_string(),
    };

    let mut body = format!(
        "<table>{}</table>\n<h2>Geometry</h2>\n<p>CRS: <code>{}</code></p>\n<pre>{}</pre>",
        rows,
        escape(crs),
        escape(&geometry)
    );
    if let Some(wkt) = crs_wkt {
        body.push_str(&format!("\n<details><summary>CRS definition</summary><pre>{}</pre></details>", escape(wkt)));
    }

    let items_href = format!(
        "{}/collections/{}/items?f=html",
        api_base.trim_end_matches('/'),
        collection_id
    );
    let mut nav = nav(api_base);
    nav.push((items_href.as_str(), collection_title));
    layout(&format!("{} - {}", collection_title, id), &nav, &body)
}

fn nav(api_base: &str) -> Vec<(&str, &str)> {
    vec![(api_base, "Home")]
}
