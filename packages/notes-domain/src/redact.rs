use regex::Regex;

const REDACTED: &str = "[REDACTED]";

/// Pattern and replacement pairs, applied in order.
const SECRET_PATTERNS: [(&str, &str); 4] = [
	(r"(?i)-----BEGIN (RSA |OPENSSH |EC |DSA )?PRIVATE KEY-----", REDACTED),
	(r"(?i)\b(bearer)\s+\S+", "${1} [REDACTED]"),
	(r"(?i)\b(api[_-]?key|password|secret|token)(\s*[:=]\s*)\S+", "${1}${2}[REDACTED]"),
	(r"(?i)\bsk-[a-z0-9]{20,}", REDACTED),
];

/// Masks bearer tokens and `key: value` secrets, then truncates to `max_chars`.
pub fn sanitize_error_text(text: &str, max_chars: usize) -> String {
	let mut out = text.trim().to_string();

	for (pattern, replacement) in SECRET_PATTERNS {
		if let Ok(re) = Regex::new(pattern) {
			out = re.replace_all(&out, replacement).into_owned();
		}
	}

	if out.chars().count() > max_chars {
		out = out.chars().take(max_chars).collect();
		out.push_str("...");
	}

	out
}
