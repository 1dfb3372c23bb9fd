use crate::error::{Error, Result};

/**
 * @brief Learn the server's externally reachable address.
 * @param endpoint Well-known echo endpoint, e.g. https://ifconfig.me/ip.
 * @return Trimmed response body.
 */
pub fn public_ip(endpoint: &str) -> Result<String> {
    let response =
        reqwest::blocking::get(endpoint).map_err(|e| Error::RequestFailure(e.to_string()))?;
    if !response.status().is_success() {
        return Err(Error::RequestFailure(format!(
            "{} returned {}",
            endpoint,
            response.status()
        )));
    }
    let body = response
        .text()
        .map_err(|e| Error::RequestFailure(e.to_string()))?;
    Ok(body.trim().to_string())
}
