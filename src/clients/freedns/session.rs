use crate::error::{Error, Result};
use reqwest::blocking::Client;

/// Response body plus status, as read by the scraping layer
#[derive(Debug)]
pub struct Page {
    pub status: u16,
    pub body: String,
}

impl Page {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// Fail with a transport error unless the status is 200.
    pub fn require_ok(self, what: &str) -> Result<Self> {
        if self.is_ok() {
            Ok(self)
        } else {
            Err(Error::transport(format!("HTTP {} while {}", self.status, what)))
        }
    }
}

/// One authenticated FreeDNS web session.
///
/// The HTTP client is built on first use and keeps a cookie store, so the
/// login cookie is sent with every later request. There is no logout and
/// no re-login: a failed login only shows up later as empty listings.
pub struct SessionManager {
    server: String,
    username: String,
    password: String,
    session: Option<Session>,
}

struct Session {
    http: Client,
    authenticated: bool,
}

impl SessionManager {
    pub fn new(
        server: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            server: server.into().trim_end_matches('/').to_string(),
            username: username.into(),
            password: password.into(),
            session: None,
        }
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.server, path)
    }

    /// Log in unless a session already exists.
    ///
    /// Returns whether the login page answered 200. That is all FreeDNS
    /// tells us at this point; bad credentials are not distinguishable here.
    pub fn ensure_logged_in(&mut self) -> Result<bool> {
        if let Some(session) = &self.session {
            return Ok(session.authenticated);
        }

        let http = Client::builder()
            .cookie_store(true)
            .user_agent(crate::USER_AGENT)
            .build()?;

        log::debug!("Logging in to {} as {}", self.server, self.username);
        let form = [
            ("action", "auth"),
            ("submit", "Login"),
            ("username", self.username.as_str()),
            ("password", self.password.as_str()),
        ];

        // Keep the session even when login fails, so it is attempted only once
        let response = http.post(self.url("/zc.php?step=2")).form(&form).send();
        let authenticated = match response {
            Ok(resp) => {
                let status = resp.status().as_u16();
                if status == 200 {
                    log::debug!("Login page answered HTTP 200");
                    true
                } else {
                    log::warn!("Login to FreeDNS answered HTTP {}", status);
                    false
                }
            }
            Err(e) => {
                self.session = Some(Session { http, authenticated: false });
                return Err(e.into());
            }
        };

        self.session = Some(Session { http, authenticated });
        Ok(authenticated)
    }

    fn http(&mut self) -> Result<&Client> {
        self.ensure_logged_in()?;
        self.session
            .as_ref()
            .map(|s| &s.http)
            .ok_or_else(|| Error::transport("no session"))
    }

    pub fn get(&mut self, path: &str) -> Result<Page> {
        let url = self.url(path);
        log::debug!("GET {}", path);
        let response = self.http()?.get(url).send()?;
        read_page(response)
    }

    pub fn post(&mut self, path: &str) -> Result<Page> {
        let url = self.url(path);
        log::debug!("POST {}", path);
        let response = self.http()?.post(url).send()?;
        read_page(response)
    }

    pub fn post_form(&mut self, path: &str, form: &[(&str, String)]) -> Result<Page> {
        let url = self.url(path);
        log::debug!("POST {} ({} fields)", path, form.len());
        let response = self.http()?.post(url).form(form).send()?;
        read_page(response)
    }
}

fn read_page(response: reqwest::blocking::Response) -> Result<Page> {
    let status = response.status().as_u16();
    let body = response.text()?;
    Ok(Page { status, body })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[test]
    fn test_login_once_and_reuse_cookie() {
        let mut server = mockito::Server::new();
        let login = server
            .mock("POST", "/zc.php?step=2")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("action".into(), "auth".into()),
                Matcher::UrlEncoded("submit".into(), "Login".into()),
                Matcher::UrlEncoded("username".into(), "alice".into()),
                Matcher::UrlEncoded("password".into(), "s3cret".into()),
            ]))
            .with_status(200)
            .with_header("set-cookie", "dns_cookie=abc123; path=/")
            .with_body("<html><title>Welcome</title></html>")
            .expect(1)
            .create();
        let listing = server
            .mock("POST", "/subdomain/")
            .match_header("cookie", Matcher::Regex("dns_cookie=abc123".into()))
            .with_status(200)
            .with_body("<html></html>")
            .expect(2)
            .create();

        let mut session = SessionManager::new(server.url(), "alice", "s3cret");
        assert!(session.ensure_logged_in().unwrap());
        assert!(session.ensure_logged_in().unwrap());
        assert!(session.post("/subdomain/").unwrap().is_ok());
        assert!(session.post("/subdomain/").unwrap().is_ok());

        login.assert();
        listing.assert();
    }

    #[test]
    fn test_failed_login_is_not_an_error() {
        let mut server = mockito::Server::new();
        let login = server
            .mock("POST", "/zc.php?step=2")
            .with_status(403)
            .expect(1)
            .create();

        let mut session = SessionManager::new(format!("{}/", server.url()), "alice", "wrong");
        assert!(!session.ensure_logged_in().unwrap());
        // Not retried
        assert!(!session.ensure_logged_in().unwrap());
        login.assert();
    }

    #[test]
    fn test_require_ok() {
        let page = Page { status: 200, body: String::new() };
        assert!(page.require_ok("listing zones").is_ok());

        let page = Page { status: 502, body: String::new() };
        let err = page.require_ok("listing zones").unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
        assert!(err.to_string().contains("HTTP 502"));
    }

    #[test]
    fn test_connection_failure_is_transport_error() {
        // Nothing listens on port 9 of the loopback interface
        let mut session = SessionManager::new("http://127.0.0.1:9", "alice", "s3cret");
        let err = session.ensure_logged_in().unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
        assert!(!err.to_string().contains("s3cret"));
    }
}
