use std::{io::ErrorKind, process::Stdio, time::Duration};

use tokio::{io::AsyncWriteExt, process::Command, time};

use crate::{CollaboratorRequest, Error, MAX_STDERR_CHARS, Result};

/// Runs the collaborator program once: the request goes to stdin, the reply is read from
/// stdout.
///
/// The child is killed when the timeout elapses.
pub async fn invoke(
	cfg: &notes_config::Collaborator,
	request: &CollaboratorRequest,
) -> Result<String> {
	let body = serde_json::to_vec(request)?;
	let mut child = Command::new(&cfg.program)
		.args(&cfg.args)
		.stdin(Stdio::piped())
		.stdout(Stdio::piped())
		.stderr(Stdio::piped())
		.kill_on_drop(true)
		.spawn()
		.map_err(|err| Error::Unavailable {
			message: format!("Failed to start {}: {err}.", cfg.program),
		})?;
	let mut stdin = child.stdin.take().ok_or_else(|| Error::Unavailable {
		message: "Collaborator stdin was not captured.".to_string(),
	})?;
	let writer = tokio::spawn(async move {
		let result = stdin.write_all(&body).await;

		drop(stdin);

		result
	});
	let output = time::timeout(Duration::from_millis(cfg.timeout_ms), child.wait_with_output())
		.await
		.map_err(|_| Error::TimedOut { timeout_ms: cfg.timeout_ms })?
		.map_err(|err| Error::Unavailable {
			message: format!("Failed to collect collaborator output: {err}."),
		})?;

	match writer.await {
		Ok(Ok(())) => {},
		// A collaborator may exit without draining stdin; its exit status decides the outcome.
		Ok(Err(err)) if err.kind() == ErrorKind::BrokenPipe => {},
		Ok(Err(err)) => {
			tracing::warn!(error = %err, "Failed to write collaborator request.");
		},
		Err(err) => {
			tracing::warn!(error = %err, "Collaborator request writer panicked.");
		},
	}

	if !output.status.success() {
		let stderr = String::from_utf8_lossy(&output.stderr);

		return Err(Error::NonZeroExit {
			code: output.status.code().unwrap_or(-1),
			stderr: crate::truncate_chars(&stderr, MAX_STDERR_CHARS),
		});
	}

	Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
