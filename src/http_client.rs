use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{ACCEPT, USER_AGENT};
use serde::Serialize;

use crate::identity::{IDENTITY_HEADER, SessionIdentity};

static CLIENT: OnceCell<Client> = OnceCell::new();

/// Shared client. The timeout of the first caller wins.
pub fn http_client(timeout: Duration) -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build http client")
    })
}

pub fn get_text(
    client: &Client,
    url: &str,
    identity: Option<&SessionIdentity>,
    query: &[(&str, &str)],
) -> Result<String> {
    let mut req = client.get(url);
    if !query.is_empty() {
        req = req.query(query);
    }
    send(req, identity)
}

pub fn post_json<T: Serialize + ?Sized>(
    client: &Client,
    url: &str,
    identity: &SessionIdentity,
    body: &T,
) -> Result<String> {
    send(client.post(url).json(body), Some(identity))
}

fn send(req: RequestBuilder, identity: Option<&SessionIdentity>) -> Result<String> {
    let mut req = req
        .header(USER_AGENT, concat!("ff_lineup_terminal/", env!("CARGO_PKG_VERSION")))
        .header(ACCEPT, "application/json");
    if let Some(identity) = identity {
        req = req.header(IDENTITY_HEADER, identity.as_str());
    }

    let resp = req.send().context("request failed")?;
    let status = resp.status();
    let body = resp.text().context("failed reading body")?;
    if !status.is_success() {
        return Err(anyhow::anyhow!("http {}: {}", status, body.trim()));
    }
    Ok(body)
}
