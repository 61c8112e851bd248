//! FreeDNS (freedns.afraid.org) TXT record management.
//!
//! FreeDNS offers no API for editing records, so this client drives the web
//! control panel like a browser: it logs in, scrapes the zone and record
//! listings, reads each candidate's edit form and submits the same forms a
//! user would.

mod pages;
mod session;
mod zones;

use crate::clients::DnsAuthenticator;
use crate::config::Config;
use crate::error::{Error, Result};
use pages::{strip_quotes, HtmlPages, PageParser};
use session::SessionManager;
use zones::{relative_name, Record, Zone, ZoneCache};

pub const DEFAULT_SERVER: &str = "https://freedns.afraid.org";

/// TTL used for every TXT record this client writes
pub const TXT_TTL: u32 = 60;

/// What `present` has to do about an existing record
#[derive(Debug, Clone, PartialEq)]
pub enum Reconcile {
    Insert,
    Keep(String),
    Update(String),
}

impl Reconcile {
    pub fn plan(existing: Option<&Record>, content: &str) -> Self {
        match existing {
            None => Reconcile::Insert,
            Some(record) if record.data == content => Reconcile::Keep(record.id.clone()),
            Some(record) => Reconcile::Update(record.id.clone()),
        }
    }
}

pub struct FreednsClient {
    session: SessionManager,
    cache: ZoneCache,
    pages: Box<dyn PageParser>,
    dry_run: bool,
}

impl FreednsClient {
    /// Create a FreeDNS client from the given configuration.
    ///
    /// Both `username` and `password` are required. `server` defaults to
    /// `https://freedns.afraid.org`. No network traffic happens until the
    /// first `present` or `cleanup`.
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_parser(config, Box::new(HtmlPages))
    }

    /// Like `new`, with a different page parser (e.g. a hardened or
    /// versioned one) in place of the stock HTML scraper.
    pub fn with_parser(config: &Config, pages: Box<dyn PageParser>) -> Result<Self> {
        let username = config
            .username
            .as_ref()
            .ok_or_else(|| Error::config("username is required for FreeDNS"))?
            .clone();
        let password = config
            .password
            .as_ref()
            .ok_or_else(|| Error::config("password is required for FreeDNS"))?
            .clone();
        let server = config
            .server
            .clone()
            .unwrap_or_else(|| DEFAULT_SERVER.to_string());

        Ok(FreednsClient {
            session: SessionManager::new(server, username, password),
            cache: ZoneCache::new(),
            pages,
            dry_run: config.dry_run,
        })
    }

    fn load_zones(&mut self) -> Result<()> {
        if self.cache.has_domains() {
            return Ok(());
        }

        let page = self.session.post("/subdomain/")?.require_ok("listing zones")?;
        let zones = self.pages.zones(&page.body);
        log::debug!("Found {} zones in account", zones.len());
        if zones.is_empty() {
            log::warn!("FreeDNS listed no zones; check username and password");
        }
        self.cache.set_domains(zones);
        Ok(())
    }

    /// Map a domain to the zone that owns it.
    pub fn resolve_zone(&mut self, domain: &str) -> Result<Zone> {
        self.load_zones()?;
        let zone = self
            .cache
            .resolve(domain)
            .cloned()
            .ok_or_else(|| Error::DomainNotManaged(domain.to_string()))?;
        log::debug!("Domain {} belongs to zone {} (id {})", domain, zone.name, zone.id);
        Ok(zone)
    }

    fn load_rows(&mut self, zone_id: &str) -> Result<()> {
        if self.cache.zone_records(zone_id).is_some() {
            return Ok(());
        }

        let path = format!("/subdomain/?limit={}", urlencoding::encode(zone_id));
        let page = self.session.post(&path)?.require_ok("listing records")?;
        let rows = self.pages.record_rows(&page.body);
        log::debug!("Zone {} lists {} records", zone_id, rows.len());
        self.cache.store_rows(zone_id, rows);
        Ok(())
    }

    /// Read one record's edit form. `None` when the page is not usable.
    fn hydrate(
        &mut self,
        zone_id: &str,
        record_id: &str,
        record_type: &str,
    ) -> Result<Option<Record>> {
        let path = format!("/subdomain/edit.php?data_id={}", urlencoding::encode(record_id));
        let page = self.session.get(&path)?;
        if !page.is_ok() {
            log::debug!("Edit page for record {} answered HTTP {}", record_id, page.status);
            return Ok(None);
        }

        let Some(form) = self.pages.edit_form(&page.body) else {
            log::debug!("No edit form for record {}", record_id);
            return Ok(None);
        };

        let record = Record {
            id: record_id.to_string(),
            zone_id: zone_id.to_string(),
            wildcard: form.wildcard,
            ttl: form.ttl,
            data: strip_quotes(&form.address).to_string(),
            subdomain: form.subdomain,
            record_type: record_type.to_string(),
        };
        log::debug!(
            "Record {}: {} {} ttl={:?} wildcard={}",
            record.id,
            record.subdomain,
            record.record_type,
            record.ttl,
            record.wildcard
        );
        Ok(Some(record))
    }

    /// Find the TXT record named `name` (relative to the zone) holding exactly
    /// `content`.
    ///
    /// The listing only shows a composite, possibly truncated name, so rows
    /// whose name contains `name` are hydrated from their edit pages and
    /// matched exactly afterwards.
    pub fn find_existing_txt(
        &mut self,
        zone_id: &str,
        name: &str,
        content: &str,
    ) -> Result<Record> {
        self.load_rows(zone_id)?;

        let candidates: Vec<(String, String)> = self
            .cache
            .zone_records(zone_id)
            .map(|zr| {
                zr.rows
                    .iter()
                    .filter(|row| row.name.contains(name) && !zr.is_hydrated(&row.id))
                    .map(|row| (row.id.clone(), row.record_type.clone()))
                    .collect()
            })
            .unwrap_or_default();

        for (record_id, record_type) in candidates {
            if let Some(record) = self.hydrate(zone_id, &record_id, &record_type)? {
                if let Some(zr) = self.cache.zone_records_mut(zone_id) {
                    zr.records.push(record);
                }
            }
        }

        self.cache
            .zone_records(zone_id)
            .and_then(|zr| {
                zr.records
                    .iter()
                    .find(|r| r.subdomain == name && r.record_type == "TXT" && r.data == content)
            })
            .cloned()
            .ok_or_else(|| Error::RecordNotFound(name.to_string()))
    }

    /// Create (`record_id` = `None`) or overwrite a TXT record.
    pub fn upsert(
        &mut self,
        zone_id: &str,
        record_id: Option<&str>,
        name: &str,
        content: &str,
        ttl: Option<u32>,
    ) -> Result<()> {
        let mut form = vec![
            ("type", "TXT".to_string()),
            ("subdomain", name.to_string()),
            ("domain_id", zone_id.to_string()),
            ("address", format!("\"{}\"", content)),
            ("send", "Save!".to_string()),
        ];
        if let Some(id) = record_id {
            form.push(("data_id", id.to_string()));
        }
        if let Some(ttl) = ttl {
            form.push(("ttl", ttl.to_string()));
        }

        let page = self
            .session
            .post_form("/subdomain/save.php?step=2", &form)?
            .require_ok("saving record")?;
        // The cached listing no longer reflects the zone
        self.cache.invalidate(zone_id);

        if self.pages.submission_rejected(&page.body) {
            return Err(Error::SubmissionRejected(format!(
                "TXT {} in zone {}",
                name, zone_id
            )));
        }
        Ok(())
    }

    pub fn delete(&mut self, zone_id: &str, record_id: &str) -> Result<()> {
        let path = format!(
            "/subdomain/delete2.php?data_id%5B%5D={}&submit=delete+selected",
            urlencoding::encode(record_id)
        );
        self.session.post(&path)?.require_ok("deleting record")?;
        self.cache.invalidate(zone_id);
        Ok(())
    }

    /// Log in, resolve the zone and derive the relative record name.
    fn prepare(&mut self, domain: &str, validation_name: &str) -> Result<(Zone, String)> {
        if !self.session.ensure_logged_in()? {
            log::warn!("FreeDNS login did not answer HTTP 200; continuing");
        }
        let zone = self.resolve_zone(domain)?;
        let name = relative_name(validation_name, &zone.name);
        log::debug!("Using record name '{}' for {}", name, validation_name);
        Ok((zone, name))
    }

    fn locate(&mut self, zone_id: &str, name: &str, content: &str) -> Result<Option<Record>> {
        match self.find_existing_txt(zone_id, name, content) {
            Ok(record) => Ok(Some(record)),
            Err(Error::RecordNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl DnsAuthenticator for FreednsClient {
    /// The locator only matches identical content, so new content is inserted
    /// alongside any other value and `Reconcile::Update` never arises here.
    fn present(&mut self, domain: &str, validation_name: &str, content: &str) -> Result<()> {
        let (zone, name) = self.prepare(domain, validation_name)?;
        let existing = self.locate(&zone.id, &name, content)?;

        match Reconcile::plan(existing.as_ref(), content) {
            Reconcile::Keep(id) => {
                log::info!("TXT record {} already present (id {})", validation_name, id);
                Ok(())
            }
            _ if self.dry_run => {
                log::info!(
                    "TEST MODE: Would write TXT record {} in zone {}",
                    validation_name,
                    zone.name
                );
                Ok(())
            }
            Reconcile::Update(id) => {
                log::info!("Updating TXT record {} (id {})", validation_name, id);
                self.upsert(&zone.id, Some(id.as_str()), &name, content, Some(TXT_TTL))
            }
            Reconcile::Insert => {
                log::info!("Inserting TXT record {} in zone {}", validation_name, zone.name);
                self.upsert(&zone.id, None, &name, content, Some(TXT_TTL))
            }
        }
    }

    fn cleanup(&mut self, domain: &str, validation_name: &str, content: &str) -> Result<()> {
        let (zone, name) = self.prepare(domain, validation_name)?;

        match self.locate(&zone.id, &name, content)? {
            None => {
                log::info!("No TXT record {} to remove", validation_name);
                Ok(())
            }
            Some(record) if self.dry_run => {
                log::info!(
                    "TEST MODE: Would delete TXT record {} (id {})",
                    validation_name,
                    record.id
                );
                Ok(())
            }
            Some(record) => {
                log::info!("Deleting TXT record {} (id {})", validation_name, record.id);
                self.delete(&zone.id, &record.id)
            }
        }
    }

    fn validate_config(&self) -> Result<()> {
        if self.session.username().is_empty() {
            return Err(Error::config("FreeDNS username cannot be empty"));
        }
        if self.session.password().is_empty() {
            return Err(Error::config("FreeDNS password cannot be empty"));
        }
        let server = self.session.server();
        if !server.starts_with("http://") && !server.starts_with("https://") {
            return Err(Error::config(format!(
                "FreeDNS server must be an http(s) URL: {}",
                server
            )));
        }
        Ok(())
    }

    fn provider_name(&self) -> &str {
        "FreeDNS"
    }
}
