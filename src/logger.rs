use std::io::Write;

use env_logger::Target;
use log::LevelFilter;
use serde::Serialize;

pub fn init(level: LevelFilter, json: bool) {
    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(level)
        .target(Target::Stdout)
        .parse_default_env();

    if json {
        builder.format(|buf, record| {
            let entry = LogEntry {
                level: record.level().to_string(),
                target: record.target().to_string(),
                message: format!("{}", record.args()),
            };
            let content = serde_json::to_string(&entry)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
            writeln!(buf, "{}", content)
        });
    }

    builder.init();
}

#[derive(Serialize)]
struct LogEntry {
    level: String,
    target: String,
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_entry_shape() {
        let entry = LogEntry {
            level: "INFO".to_string(),
            target: "scan2sphere::pipeline".to_string(),
            message: "found 2 projects".to_string(),
        };

        assert_eq!(
            serde_json::to_string(&entry).unwrap(),
            r#"{"level":"INFO","target":"scan2sphere::pipeline","message":"found 2 projects"}"#
        );
    }
}
