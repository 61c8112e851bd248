use super::zones::Zone;
use scraper::{ElementRef, Html, Selector};

/// Marker text of the per-zone "add record" link on the zone listing page
const ADD_MARKER: [&str; 3] = ["[", "add", "]"];

/// Prefix of the add-record link; the zone id follows it
const ZONE_LINK_PREFIX: &str = "/subdomain/edit.php?edit_domain_id=";

/// Substring of the `<title>` FreeDNS renders when a save fails validation
const PROBLEMS_MARKER: &str = "Problems";

/// One row of a zone's record listing.
///
/// `name` is the composite display name, which may be truncated by FreeDNS,
/// so it is only good enough to pick candidates.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordRow {
    pub id: String,
    pub name: String,
    pub record_type: String,
}

/// Fields read back from a record's edit form
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EditForm {
    pub wildcard: bool,
    pub ttl: Option<u32>,
    pub address: String,
    pub subdomain: String,
}

/// Turns FreeDNS control panel pages into typed values.
///
/// FreeDNS has no API, so every method here depends on undocumented markup.
/// Anything that does not look like the expected structure is skipped rather
/// than reported, so callers see "nothing found" instead of an error.
pub trait PageParser {
    /// Zones from the `/subdomain/` listing page
    fn zones(&self, html: &str) -> Vec<Zone>;

    /// Record rows from the `/subdomain/?limit=<zone id>` page
    fn record_rows(&self, html: &str) -> Vec<RecordRow>;

    /// Edit form from `/subdomain/edit.php?data_id=<record id>`
    fn edit_form(&self, html: &str) -> Option<EditForm>;

    /// Whether a save response signals a validation failure
    fn submission_rejected(&self, html: &str) -> bool;
}

/// `PageParser` over the FreeDNS HTML templates as currently served
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlPages;

fn selector(css: &'static str) -> Selector {
    Selector::parse(css).expect("static selector must parse")
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Extract the numeric zone id from an add-record href.
fn zone_id_from_href(href: &str) -> Option<String> {
    let rest = href.trim().strip_prefix(ZONE_LINK_PREFIX)?;
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        None
    } else {
        Some(digits)
    }
}

/// Walk from the add link up to its cell, then back to the previous cell
/// which carries the zone name.
fn zone_name_cell(link: ElementRef<'_>) -> Option<ElementRef<'_>> {
    let cell = link
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "td")?;

    cell.prev_siblings()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "td")
}

fn is_add_marker(link: ElementRef<'_>) -> bool {
    let text = link.text().collect::<String>();
    text.split_whitespace().eq(ADD_MARKER.iter().copied())
}

fn field_value(form: ElementRef<'_>, name: &str) -> Option<String> {
    let input = Selector::parse(&format!("input[name=\"{}\"]", name)).ok()?;
    if let Some(el) = form.select(&input).next() {
        return Some(el.value().attr("value").unwrap_or_default().to_string());
    }

    // Long TXT content is sometimes rendered as a textarea
    let textarea = Selector::parse(&format!("textarea[name=\"{}\"]", name)).ok()?;
    form.select(&textarea)
        .next()
        .map(|el| el.text().collect::<String>())
}

fn wildcard_flag(form: ElementRef<'_>) -> bool {
    let wildcard = selector("input[name=\"wildcard\"]");
    match form.select(&wildcard).next() {
        Some(el) if el.value().attr("type") == Some("checkbox") => {
            el.value().attr("checked").is_some()
        }
        Some(el) => matches!(el.value().attr("value"), Some(v) if !v.is_empty() && v != "0"),
        None => false,
    }
}

/// Remove one pair of wrapping double quotes, as FreeDNS stores TXT data quoted.
pub fn strip_quotes(data: &str) -> &str {
    data.strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(data)
}

impl PageParser for HtmlPages {
    fn zones(&self, html: &str) -> Vec<Zone> {
        let document = Html::parse_document(html);
        let anchors = selector("a[href]");

        let mut zones = Vec::new();
        for link in document.select(&anchors).filter(|a| is_add_marker(*a)) {
            let Some(id) = link.value().attr("href").and_then(zone_id_from_href) else {
                log::debug!("Skipping add link with unexpected href");
                continue;
            };
            let Some(name) = zone_name_cell(link).map(text_of) else {
                log::debug!("Skipping zone {}: no name cell", id);
                continue;
            };
            if name.is_empty() {
                continue;
            }
            zones.push(Zone { id, name });
        }
        zones
    }

    fn record_rows(&self, html: &str) -> Vec<RecordRow> {
        let document = Html::parse_document(html);
        let form = selector("form[action$=\"delete2.php\"]");
        let table_sel = selector("table");
        let row = selector("tr");
        let cell = selector("td");
        let input = selector("input");
        let anchor = selector("a");

        let Some(table) = document
            .select(&form)
            .next()
            .and_then(|f| f.select(&table_sel).next())
        else {
            log::debug!("No record table found on listing page");
            return Vec::new();
        };

        let mut rows = Vec::new();
        for tr in table.select(&row) {
            let cells: Vec<ElementRef<'_>> = tr.select(&cell).collect();
            if cells.len() != 4 {
                continue;
            }
            let Some(id) = cells[0]
                .select(&input)
                .next()
                .and_then(|i| i.value().attr("value"))
            else {
                continue;
            };
            let Some(name) = cells[1].select(&anchor).next().map(text_of) else {
                continue;
            };
            rows.push(RecordRow {
                id: id.trim().to_string(),
                name,
                record_type: text_of(cells[2]),
            });
        }
        rows
    }

    fn edit_form(&self, html: &str) -> Option<EditForm> {
        let document = Html::parse_document(html);
        let save_form = selector("form[action=\"save.php?step=2\"]");
        let form = document.select(&save_form).next()?;

        let address = field_value(form, "address")?;
        let subdomain = field_value(form, "subdomain")?;
        let ttl = field_value(form, "ttl").and_then(|v| v.trim().parse().ok());

        Some(EditForm {
            wildcard: wildcard_flag(form),
            ttl,
            address,
            subdomain: subdomain.trim().to_string(),
        })
    }

    fn submission_rejected(&self, html: &str) -> bool {
        let document = Html::parse_document(html);
        let title = selector("title");
        document
            .select(&title)
            .next()
            .map(|t| t.text().collect::<String>().contains(PROBLEMS_MARKER))
            .unwrap_or(false)
    }
}
