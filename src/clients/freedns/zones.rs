use super::pages::RecordRow;
use std::collections::HashMap;

/// A domain registered under the FreeDNS account
#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    pub id: String,
    pub name: String,
}

/// A hydrated record: listing row plus the fields from its edit form
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: String,
    pub zone_id: String,
    pub wildcard: bool,
    pub ttl: Option<u32>,
    /// Content with the wrapping quotes removed
    pub data: String,
    /// Record name relative to the zone
    pub subdomain: String,
    pub record_type: String,
}

/// Cached view of one zone's record listing
#[derive(Debug, Default)]
pub struct ZoneRecords {
    pub rows: Vec<RecordRow>,
    /// Hydrated candidates, in the order they were read
    pub records: Vec<Record>,
}

impl ZoneRecords {
    pub fn new(rows: Vec<RecordRow>) -> Self {
        Self {
            rows,
            records: Vec::new(),
        }
    }

    pub fn is_hydrated(&self, record_id: &str) -> bool {
        self.records.iter().any(|r| r.id == record_id)
    }
}

/// Zone map and per-zone record cache owned by one client instance.
///
/// Nothing expires; a mutation drops the affected zone's records so the next
/// lookup re-reads the listing.
#[derive(Debug, Default)]
pub struct ZoneCache {
    domains: Option<HashMap<String, Zone>>,
    records: HashMap<String, ZoneRecords>,
}

impl ZoneCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_domains(&self) -> bool {
        self.domains.is_some()
    }

    pub fn set_domains(&mut self, zones: Vec<Zone>) {
        let map = zones.into_iter().map(|z| (z.name.clone(), z)).collect();
        self.domains = Some(map);
    }

    /// Find the zone owning `domain`.
    ///
    /// An exact name match wins. Otherwise the longest zone name that is a
    /// label-aligned suffix of `domain` is chosen, so `foo.example.com` beats
    /// `example.com` for `_acme-challenge.foo.example.com`.
    pub fn resolve(&self, domain: &str) -> Option<&Zone> {
        let domains = self.domains.as_ref()?;
        let domain = normalize(domain);

        if let Some(zone) = domains.get(domain) {
            return Some(zone);
        }

        domains
            .values()
            .filter(|zone| is_label_suffix(domain, &zone.name))
            .max_by(|a, b| a.name.len().cmp(&b.name.len()).then_with(|| b.name.cmp(&a.name)))
    }

    pub fn zone_records(&self, zone_id: &str) -> Option<&ZoneRecords> {
        self.records.get(zone_id)
    }

    pub fn zone_records_mut(&mut self, zone_id: &str) -> Option<&mut ZoneRecords> {
        self.records.get_mut(zone_id)
    }

    pub fn store_rows(&mut self, zone_id: &str, rows: Vec<RecordRow>) {
        self.records.insert(zone_id.to_string(), ZoneRecords::new(rows));
    }

    pub fn invalidate(&mut self, zone_id: &str) {
        if self.records.remove(zone_id).is_some() {
            log::debug!("Dropped cached records for zone {}", zone_id);
        }
    }
}

fn normalize(name: &str) -> &str {
    name.trim().trim_end_matches('.')
}

fn is_label_suffix(domain: &str, zone: &str) -> bool {
    domain
        .strip_suffix(zone)
        .map(|prefix| prefix.ends_with('.'))
        .unwrap_or(false)
}

/// Name of `fqdn` relative to `zone`, e.g. `_acme-challenge` for
/// `_acme-challenge.example.com` in `example.com`. The zone apex maps to "".
pub fn relative_name(fqdn: &str, zone: &str) -> String {
    let fqdn = normalize(fqdn);
    if fqdn == zone {
        return String::new();
    }
    match fqdn.strip_suffix(zone).and_then(|p| p.strip_suffix('.')) {
        Some(prefix) => prefix.to_string(),
        None => {
            log::warn!("{} is not inside zone {}, using it unchanged", fqdn, zone);
            fqdn.to_string()
        }
    }
}
