use std::time::Duration;

use reqwest::Client;

use crate::{CollaboratorRequest, Error, MAX_STDERR_CHARS, Result};

pub async fn invoke(
	cfg: &notes_config::Collaborator,
	request: &CollaboratorRequest,
) -> Result<String> {
	let client = Client::builder()
		.timeout(Duration::from_millis(cfg.timeout_ms))
		.build()
		.map_err(|err| Error::Unavailable { message: err.to_string() })?;
	let headers = crate::auth_headers(cfg.api_key.as_deref(), &cfg.default_headers)?;
	let res = client
		.post(&cfg.url)
		.headers(headers)
		.json(request)
		.send()
		.await
		.map_err(|err| map_send_error(cfg, err))?;
	let status = res.status();
	let body = res.text().await.map_err(|err| map_send_error(cfg, err))?;

	if !status.is_success() {
		return Err(Error::NonZeroExit {
			code: i32::from(status.as_u16()),
			stderr: crate::truncate_chars(&body, MAX_STDERR_CHARS),
		});
	}

	Ok(body)
}

fn map_send_error(cfg: &notes_config::Collaborator, err: reqwest::Error) -> Error {
	if err.is_timeout() {
		return Error::TimedOut { timeout_ms: cfg.timeout_ms };
	}

	Error::Unavailable { message: err.without_url().to_string() }
}
