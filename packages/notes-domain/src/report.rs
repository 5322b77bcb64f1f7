pub const DEFAULT_QUIZ_TITLE: &str = "Quiz";
pub const DEFAULT_NOTE_TITLE: &str = "Untitled Notes";

/// `round(score / total * 100)`, half away from zero. An empty quiz reports zero.
pub fn percentage(score: u32, total: u32) -> u32 {
	if total == 0 {
		return 0;
	}

	(f64::from(score) / f64::from(total) * 100.0).round() as u32
}

pub fn display_title<'a>(title: Option<&'a str>, fallback: &'a str) -> &'a str {
	title.map(str::trim).filter(|title| !title.is_empty()).unwrap_or(fallback)
}
