pub fn render_schema() -> String {
	let init = include_str!("../../../sql/init.sql");

	expand_includes(init)
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let trimmed = line.trim();

		if let Some(path) = trimmed.strip_prefix("\\ir ") {
			match path.trim() {
				"tables/001_notes.sql" =>
					out.push_str(include_str!("../../../sql/tables/001_notes.sql")),
				"tables/002_extracted_content.sql" =>
					out.push_str(include_str!("../../../sql/tables/002_extracted_content.sql")),
				"tables/003_summaries.sql" =>
					out.push_str(include_str!("../../../sql/tables/003_summaries.sql")),
				"tables/004_quizzes.sql" =>
					out.push_str(include_str!("../../../sql/tables/004_quizzes.sql")),
				"tables/005_quiz_attempts.sql" =>
					out.push_str(include_str!("../../../sql/tables/005_quiz_attempts.sql")),
				"tables/006_conversations.sql" =>
					out.push_str(include_str!("../../../sql/tables/006_conversations.sql")),
				"tables/007_messages.sql" =>
					out.push_str(include_str!("../../../sql/tables/007_messages.sql")),
				"tables/008_generation_jobs.sql" =>
					out.push_str(include_str!("../../../sql/tables/008_generation_jobs.sql")),
				_ => out.push_str(line),
			}
		} else {
			out.push_str(line);
		}

		out.push('\n');
	}

	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn every_include_is_expanded() {
		let sql = render_schema();

		assert!(!sql.contains("\\ir "));
		assert!(sql.contains("CREATE TABLE IF NOT EXISTS generation_jobs"));
	}
}
