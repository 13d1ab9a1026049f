use std::time::Duration;

use log::{debug, info, warn};
use reqwest::blocking::Client;
use serde_json::Value;

use crate::clock::{self, Clock, SystemClock};
use crate::credentials::Credentials;
use crate::error::{ShineError, ShineResult};
use crate::query::Query;
use crate::signing;

pub const BASE_URL: &str = "http://web.shinemonitor.com/public/?sign=";

pub static REQUEST_TIMEOUT_DEFAULT: Duration = Duration::from_secs(10);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum PortalState {
    Unknown,
    Online,
    Offline,
}

/// Per-login state handed out by the portal. Replaced wholesale on every login.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    pub salt: String,
    pub token: String,
    pub secret: String,
}

/// Talks to the ShineMonitor public API, signing every request.
///
/// Every query performs a fresh login first, so a poll of all reports costs
/// two round trips per report.
pub struct SigningClient<C: Clock = SystemClock> {
    credentials: Credentials,
    session: Session,
    base_url: String,
    http: Client,
    clock: C,
    state: PortalState,
}

impl SigningClient<SystemClock> {
    pub fn new(credentials: Credentials) -> ShineResult<Self> {
        Self::with_clock(credentials, SystemClock)
    }
}

impl<C: Clock> SigningClient<C> {
    pub fn with_clock(credentials: Credentials, clock: C) -> ShineResult<Self> {
        Ok(Self {
            credentials,
            session: Session::default(),
            base_url: BASE_URL.to_owned(),
            http: build_http_client(REQUEST_TIMEOUT_DEFAULT)?,
            clock,
            state: PortalState::Unknown,
        })
    }

    /// Points the client at another endpoint. The URL must end right before
    /// the signature value, e.g. `http://host/public/?sign=`.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_owned();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> ShineResult<Self> {
        self.http = build_http_client(timeout)?;
        Ok(self)
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn state(&self) -> PortalState {
        self.state
    }

    fn set_state(&mut self, new_state: PortalState) {
        if self.state != new_state {
            self.state = new_state;
            info!("ShineMonitor portal is {new_state:?}");
        }
    }

    pub fn login(&mut self) -> ShineResult<()> {
        let salt = clock::salt(&self.clock.now());
        let auth_params =
            signing::auth_params(&self.credentials.username, &self.credentials.company_id);
        let sign = signing::login_sign(&salt, &self.credentials.password_hash(), &auth_params);
        let url = format!("{}{sign}&salt={salt}{auth_params}", self.base_url);

        debug!("logging in as {}", self.credentials.username);
        let response = self.get_json(&url)?;

        let dat = response.get("dat");
        let token = dat.and_then(|dat| dat.get("token")).and_then(field_string);
        let secret = dat.and_then(|dat| dat.get("secret")).and_then(field_string);
        match (token, secret) {
            (Some(token), Some(secret)) => {
                self.session = Session {
                    salt,
                    token,
                    secret,
                };
                Ok(())
            }
            _ => {
                let reason = vendor_reason(&response)
                    .unwrap_or_else(|| "response lacks dat.token or dat.secret".to_owned());
                warn!("login as {} rejected: {reason}", self.credentials.username);
                Err(ShineError::AuthenticationFailed(reason))
            }
        }
    }

    /// Logs in and fetches the `value` of one report for yesterday.
    pub fn query(&mut self, query: Query) -> ShineResult<Value> {
        self.login()?;

        let date = clock::report_date(self.clock.now().date_naive());
        let params = query.params(&self.credentials.plant_id, &date);
        let sign = signing::query_sign(
            &self.session.salt,
            &self.session.secret,
            &self.session.token,
            &params,
        );
        let url = format!(
            "{}{sign}&salt={}&token={}{params}",
            self.base_url, self.session.salt, self.session.token
        );

        debug!("querying {query} for {date}");
        let mut response = self.get_json(&url)?;
        if let Some(value) = response.get_mut("value") {
            return Ok(value.take());
        }
        let reason = vendor_reason(&response).unwrap_or_else(|| "no value field".to_owned());
        Err(ShineError::MalformedResponse(format!("{query}: {reason}")))
    }

    pub fn power_day_per_time(&mut self) -> ShineResult<Value> {
        self.query(Query::PowerDayPerTime)
    }

    pub fn power_month_per_day(&mut self) -> ShineResult<Value> {
        self.query(Query::PowerMonthPerDay)
    }

    pub fn power_year_per_month(&mut self) -> ShineResult<Value> {
        self.query(Query::PowerYearPerMonth)
    }

    pub fn power_per_year(&mut self) -> ShineResult<Value> {
        self.query(Query::PowerPerYear)
    }

    pub fn device_status(&mut self) -> ShineResult<Value> {
        self.query(Query::DeviceStatus)
    }

    pub fn plant_current_data(&mut self) -> ShineResult<Value> {
        self.query(Query::PlantCurrentData)
    }

    fn get_json(&mut self, url: &str) -> ShineResult<Value> {
        let response = match self.http.get(url).send().and_then(|r| r.error_for_status()) {
            Ok(response) => response,
            Err(e) => {
                debug!("{e}");
                self.set_state(PortalState::Offline);
                return Err(e.into());
            }
        };
        let body = response.text()?;
        self.set_state(PortalState::Online);

        serde_json::from_str(&body).map_err(|e| ShineError::MalformedResponse(e.to_string()))
    }
}

fn build_http_client(timeout: Duration) -> ShineResult<Client> {
    Ok(Client::builder().timeout(timeout).build()?)
}

// Tokens have been seen as JSON numbers, too.
fn field_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn vendor_reason(response: &Value) -> Option<String> {
    let desc = response.get("desc").and_then(Value::as_str)?;
    match response.get("err") {
        Some(err) => Some(format!("portal error {err}: {desc}")),
        None => Some(desc.to_owned()),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::query::PLANT_INFO;
    use chrono::{DateTime, Local, TimeZone};
    use mockito::{Matcher, Server};
    use serde_json::json;

    pub(crate) struct FixedClock(pub DateTime<Local>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Local> {
            self.0
        }
    }

    pub(crate) fn late_evening() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 2, 23, 59, 0).unwrap()
    }

    pub(crate) fn test_client(server: &Server) -> SigningClient<FixedClock> {
        let credentials = Credentials::new("solar", "abc", "acme", "1234");
        SigningClient::with_clock(credentials, FixedClock(late_evening()))
            .unwrap()
            .with_base_url(&format!("{}/public/?sign=", server.url()))
    }

    fn param(key: &str, value: &str) -> Matcher {
        Matcher::UrlEncoded(key.to_owned(), value.to_owned())
    }

    pub(crate) fn login_body() -> String {
        json!({
            "err": 0,
            "desc": "ERR_NONE",
            "dat": { "token": "tok", "secret": "sec", "expire": 604800 }
        })
        .to_string()
    }

    #[test]
    fn login_sends_signed_auth_request() {
        let mut server = Server::new();
        let salt = clock::salt(&late_evening());
        let sign = signing::login_sign(
            &salt,
            "a9993e364706816aba3e25717850c26c9cd0d89d",
            "&action=auth&usr=solar&company-key=acme",
        );
        let mock = server
            .mock("GET", "/public/")
            .match_query(Matcher::AllOf(vec![
                param("sign", &sign),
                param("salt", &salt),
                param("action", "auth"),
                param("usr", "solar"),
                param("company-key", "acme"),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(login_body())
            .create();

        let mut client = test_client(&server);
        client.login().unwrap();

        mock.assert();
        assert_eq!(
            client.session(),
            &Session {
                salt,
                token: "tok".to_owned(),
                secret: "sec".to_owned(),
            }
        );
        assert_eq!(client.state(), PortalState::Online);
    }

    #[test]
    fn login_without_token_fails_before_querying() {
        let mut server = Server::new();
        let login = server
            .mock("GET", "/public/")
            .match_query(param("action", "auth"))
            .with_status(200)
            .with_body(json!({ "err": 1, "desc": "ERR_PASSWORD" }).to_string())
            .create();
        let query = server
            .mock("GET", "/public/")
            .match_query(param("action", "queryPlantDeviceStatus"))
            .with_status(200)
            .with_body(json!({ "value": 1 }).to_string())
            .expect(0)
            .create();

        let mut client = test_client(&server);
        let result = client.device_status();

        match result {
            Err(ShineError::AuthenticationFailed(reason)) => {
                assert!(reason.contains("ERR_PASSWORD"), "{reason}");
            }
            other => panic!("expected authentication failure, got {other:?}"),
        }
        login.assert();
        query.assert();
        assert_eq!(client.session(), &Session::default());
    }

    #[test]
    fn login_with_empty_token_is_rejected() {
        let mut server = Server::new();
        let login = server
            .mock("GET", "/public/")
            .match_query(param("action", "auth"))
            .with_status(200)
            .with_body(json!({ "dat": { "token": "", "secret": "sec" } }).to_string())
            .create();

        let mut client = test_client(&server);
        assert!(matches!(
            client.login(),
            Err(ShineError::AuthenticationFailed(_))
        ));
        login.assert();
    }

    #[test]
    fn current_data_query_is_signed_with_session() {
        let mut server = Server::new();
        let salt = clock::salt(&late_evening());
        let params = Query::PlantCurrentData.params("1234", "2024-03-01");
        let sign = signing::query_sign(&salt, "sec", "tok", &params);

        server
            .mock("GET", "/public/")
            .match_query(param("action", "auth"))
            .with_status(200)
            .with_body(login_body())
            .create();
        let query = server
            .mock("GET", "/public/")
            .match_query(Matcher::AllOf(vec![
                param("sign", &sign),
                param("salt", &salt),
                param("token", "tok"),
                param("action", "queryPlantCurrentData"),
                param("plantid", "1234"),
                param("date", "2024-03-01"),
                param("i18n", "pt_BR"),
                param("lang", "pt_BR"),
                param("par", PLANT_INFO.trim_start_matches("&par=")),
            ]))
            .with_status(200)
            .with_body(json!({ "err": 0, "value": { "ENERGY_TODAY": "12.3" } }).to_string())
            .create();

        let mut client = test_client(&server);
        let value = client.plant_current_data().unwrap();

        query.assert();
        assert_eq!(value, json!({ "ENERGY_TODAY": "12.3" }));
    }

    #[test]
    fn every_query_logs_in_again() {
        let mut server = Server::new();
        let login = server
            .mock("GET", "/public/")
            .match_query(param("action", "auth"))
            .with_status(200)
            .with_body(login_body())
            .expect(2)
            .create();
        server
            .mock("GET", "/public/")
            .match_query(param("token", "tok"))
            .with_status(200)
            .with_body(json!({ "value": 7 }).to_string())
            .expect(2)
            .create();

        let mut client = test_client(&server);
        assert_eq!(client.power_per_year().unwrap(), json!(7));
        assert_eq!(client.power_month_per_day().unwrap(), json!(7));
        login.assert();
    }

    #[test]
    fn missing_value_is_malformed() {
        let mut server = Server::new();
        server
            .mock("GET", "/public/")
            .match_query(param("action", "auth"))
            .with_status(200)
            .with_body(login_body())
            .create();
        server
            .mock("GET", "/public/")
            .match_query(param("token", "tok"))
            .with_status(200)
            .with_body(json!({ "err": 12, "desc": "ERR_NO_RECORD" }).to_string())
            .create();

        let mut client = test_client(&server);
        match client.power_year_per_month() {
            Err(ShineError::MalformedResponse(reason)) => {
                assert!(reason.contains("queryPlantEnergyYearPerMonth"), "{reason}");
                assert!(reason.contains("ERR_NO_RECORD"), "{reason}");
            }
            other => panic!("expected malformed response, got {other:?}"),
        }
    }

    #[test]
    fn non_json_body_is_malformed() {
        let mut server = Server::new();
        let login = server
            .mock("GET", "/public/")
            .match_query(param("action", "auth"))
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create();

        let mut client = test_client(&server);
        assert!(matches!(
            client.login(),
            Err(ShineError::MalformedResponse(_))
        ));
        login.assert();
    }

    #[test]
    fn http_errors_are_network_errors() {
        let mut server = Server::new();
        let login = server
            .mock("GET", "/public/")
            .match_query(param("action", "auth"))
            .with_status(503)
            .create();

        let mut client = test_client(&server);
        match client.login() {
            Err(ShineError::NetworkError(e)) => {
                assert_eq!(e.status().map(|status| status.as_u16()), Some(503));
            }
            other => panic!("expected network error, got {other:?}"),
        }
        login.assert();
        assert_eq!(client.state(), PortalState::Offline);
    }

    #[test]
    fn unreachable_portal_is_a_network_error() {
        let credentials = Credentials::new("solar", "abc", "acme", "1234");
        let mut client = SigningClient::with_clock(credentials, FixedClock(late_evening()))
            .unwrap()
            .with_base_url("http://127.0.0.1:1/public/?sign=")
            .with_timeout(Duration::from_secs(2))
            .unwrap();

        assert!(matches!(client.login(), Err(ShineError::NetworkError(_))));
    }

    #[test]
    fn numeric_token_is_accepted() {
        let mut server = Server::new();
        let login = server
            .mock("GET", "/public/")
            .match_query(param("action", "auth"))
            .with_status(200)
            .with_body(json!({ "dat": { "token": 123, "secret": "sec" } }).to_string())
            .create();

        let mut client = test_client(&server);
        client.login().unwrap();
        assert_eq!(client.session().token, "123");
        login.assert();
    }
}
